// dbquery-core/src/domain/arguments.rs

use serde_json::{Map, Value};
use std::fmt;

use crate::domain::error::DomainError;

/// Values bound to every statement of a run.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryArguments {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl QueryArguments {
    /// Builds the argument set, rejecting a request that carries both forms.
    pub fn from_parts(
        positional: Option<Vec<Value>>,
        named: Option<Map<String, Value>>,
    ) -> Result<Self, DomainError> {
        match (positional, named) {
            (Some(_), Some(_)) => Err(DomainError::ConfigurationConflict),
            (Some(values), None) => Ok(Self::Positional(values)),
            (None, Some(values)) => Ok(Self::Named(values)),
            (None, None) => Ok(Self::None),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for QueryArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Positional(values) => write!(f, "{}", Value::Array(values.clone())),
            Self::Named(values) => write!(f, "{}", Value::Object(values.clone())),
        }
    }
}
