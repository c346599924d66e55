pub mod models;
pub mod party;
pub mod draft;
pub mod validation;
pub mod cart;
pub mod revalidation;

pub use models::{BookingDraft, BookingRequest, DraftAction, Party};
pub use party::{can_increment_adults, can_increment_children, initial_party, PartyError, PartyNotice, PartyRules};
pub use draft::{DraftContext, DraftError, DraftUpdate, Reconciliation};
pub use validation::{validate_continue, ContinueError};
pub use cart::{
    validate_slot, CartLine, CartReview, CheckoutError, IncompleteItem, ItemStatus, RawCartItem, ReviewedItem,
    SlotValidation,
};
pub use revalidation::CartValidator;
