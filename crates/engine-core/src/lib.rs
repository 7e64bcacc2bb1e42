pub mod error;
pub mod event_bus;
pub mod initializer;
pub mod materializer;
pub mod probe;
pub mod queue;
pub mod retry;
pub mod settings;
pub mod waiter;
