pub mod account;
pub mod config;
pub mod export;
pub mod queue;
pub mod sets;
pub mod stats;
pub mod study;
pub mod sync;
