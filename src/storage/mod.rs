mod file_storage;

pub use file_storage::{
    get_json, set_json, FileStorage, LocalStore, MemoryStorage, Result, StorageError,
};
