mod classify;
mod engine;

pub use classify::{AddressCategory, AddressClassifier};
pub use engine::SchemaMapper;
