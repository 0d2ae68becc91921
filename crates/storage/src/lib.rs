#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{InMemoryMasteryStore, MasteryStore, StorageError};
pub use sqlite::{SqliteInitError, SqliteMasteryStore};
