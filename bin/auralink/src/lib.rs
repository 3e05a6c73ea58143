pub mod alert;
pub mod broadcast;
pub mod config;
pub mod ingest;
pub mod publisher;
pub mod quote;
pub mod storage;
pub mod triage;

mod web_service;
pub use web_service::{router, AppState};

mod error;
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type ErasedError = Box<dyn std::error::Error + Send + Sync + 'static>;
