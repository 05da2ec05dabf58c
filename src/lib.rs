pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod rpc;
pub mod service;
pub mod store;

pub use error::{ErrorKind, Result, StatusError, StoreError};
pub use service::StatusService;
