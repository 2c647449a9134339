pub mod document;
pub mod value;

pub use document::{DocId, Document, ID_FIELD};
pub use value::Value;
