pub mod catalog;
pub mod config;
pub mod context;
pub mod flashcards;
pub mod session;
pub mod stats;
pub mod storage;
pub mod sync;

pub use config::AppConfig;
pub use context::{StudyContext, StudyError};
