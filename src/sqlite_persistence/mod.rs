mod gateway;
mod versioned_schema;

pub use gateway::{Gateway, Row};
pub use versioned_schema::{
    Column, SqlType, Table, VersionedSchema, BASE_DB_VERSION, DEFAULT_TIMESTAMP,
};
