pub mod document;
pub mod error;
pub mod report;
pub mod validated;
pub mod validation;
