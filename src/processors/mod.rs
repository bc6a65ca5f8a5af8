//! Built-in processor specs, one module per semantic type family.

pub mod binary;
pub mod markup;
pub mod script;
pub mod style;
pub mod vector;
