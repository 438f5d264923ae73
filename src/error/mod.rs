mod store;

pub use simplified_schema::SchemaError;
pub use store::StoreError;
