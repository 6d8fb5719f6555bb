pub mod cli;
pub mod config;
mod db;
pub mod engine;
pub mod error;
pub mod hamming;
pub mod hash;
mod metrics;
pub mod presenter;
pub mod server;
pub mod store;
pub mod types;
pub mod utils;

pub use config::Opts;
pub use engine::{EngineBuilder, RetrievalEngine};
pub use error::RetrievalError;
pub use hash::{HashAlgorithm, HashVector, compute_hash};
pub use store::{MemoryStore, SimilarityStore, SqliteStore};
pub use types::{ImageRecord, InsertMode, Match, Page, Query, QueryResult};
