// dbquery-core/src/domain/task/mod.rs

pub mod configuration;
pub use configuration::{ConnectionSettings, Endpoint, SslMode, TaskConfig};
