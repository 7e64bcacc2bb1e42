pub mod core;
pub mod definition;
pub mod error;
pub mod events;
