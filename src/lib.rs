pub mod aggregate;
pub mod batch;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod index;
mod metrics;
pub mod query;
pub mod server;
pub mod source;
pub mod tagdb;
mod utils;

pub use config::Opts;
pub use tagdb::{IngestReport, TagDB, TagDBBuilder};
