pub mod data;

pub use data::{FieldValue, Fields, Record, Stage};
