pub mod column_type;
pub mod identifiers;
pub mod referential;
