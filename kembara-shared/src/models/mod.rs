pub mod slot;
pub mod events;
