pub use client::RaftStoreClient;
pub use config::{ClientConfig, Credentials, FieldCase, UploadMode};
pub use error::ClientError;
pub use models::{Command, Envelope, GetType, RangeQuery, Reply, Result};

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod upload;
