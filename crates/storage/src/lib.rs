#![forbid(unsafe_code)]

pub mod defaults;
pub mod kv;
pub mod repository;
pub mod sqlite;

pub use repository::{DataBlob, KeyValueStore, Storage, StorageError};
