// dbquery-core/src/ports/mod.rs

pub mod connector;
pub mod replay;

pub use connector::{Connector, ConnectorFactory};
pub use replay::ReplayStore;
