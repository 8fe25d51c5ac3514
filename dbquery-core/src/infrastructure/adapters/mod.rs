// dbquery-core/src/infrastructure/adapters/mod.rs

pub mod command_tag;
#[cfg(feature = "impala")]
pub mod impala;
pub mod postgres;

use crate::domain::engine::Engine;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::connector::ConnectorFactory;

/// Capability check, done once at startup: returns the factory for `engine`,
/// or `DriverUnavailable` when its driver was not compiled in.
pub fn connector_factory(engine: Engine) -> Result<Box<dyn ConnectorFactory>, InfrastructureError> {
    match engine {
        Engine::Postgres => Ok(Box::new(postgres::PostgresFactory)),
        #[cfg(feature = "impala")]
        Engine::Impala => Ok(Box::new(impala::ImpalaFactory)),
        #[cfg(not(feature = "impala"))]
        Engine::Impala => Err(InfrastructureError::DriverUnavailable {
            engine: engine.to_string(),
        }),
    }
}
