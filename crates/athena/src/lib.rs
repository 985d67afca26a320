pub mod client;
pub mod config;
pub mod result;

pub use client::{AthenaClient, AthenaError};
pub use config::AthenaConfig;
pub use result::{QueryColumn, QueryMetadata, QueryResult};
