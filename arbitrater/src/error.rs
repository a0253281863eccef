//! Error types raised while synthesizing instances.

use std::fmt;

use crate::config::ConfigError;

/// Result alias used throughout the synthesis engine
pub type ArbitraterResult<T> = Result<T, ArbitraterError>;

/// Everything that can go wrong while building an arbitrary instance
#[derive(Debug, Clone, PartialEq)]
pub enum ArbitraterError {
    /// `with_value` named a parameter the canonical constructor does not have
    UnknownParameter {
        parameter: String,
        type_name: String,
    },

    /// No synthesis rule applies to the type
    UnsupportedType { type_name: String, reason: String },

    /// An abstract type, hierarchy or enum has nothing to choose from
    EmptyCandidateSet { type_name: String },

    /// A constructor argument could not be downcast to the parameter's type
    ArgumentMismatch {
        parameter: String,
        expected: &'static str,
    },

    /// A constructor asked for an argument that was never supplied
    MissingArgument { parameter: String },

    /// The opt-in recursion guard fired
    RecursionLimit { type_name: String, max_depth: usize },

    /// Invalid settings
    Config(ConfigError),

    /// Top-level wrapper naming the type that was originally requested
    InstanceCreation {
        type_name: String,
        source: Box<ArbitraterError>,
    },
}

impl fmt::Display for ArbitraterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbitraterError::UnknownParameter {
                parameter,
                type_name,
            } => write!(
                f,
                "Parameter named {} not found in canonical constructor of {}",
                parameter, type_name
            ),
            ArbitraterError::UnsupportedType { type_name, reason } => {
                write!(f, "Unsupported type [{}]: {}", type_name, reason)
            }
            ArbitraterError::EmptyCandidateSet { type_name } => {
                write!(f, "No concrete candidates found for [{}]", type_name)
            }
            ArbitraterError::ArgumentMismatch {
                parameter,
                expected,
            } => write!(
                f,
                "Argument for parameter {} is not a value of type {}",
                parameter, expected
            ),
            ArbitraterError::MissingArgument { parameter } => {
                write!(f, "No argument supplied for parameter {}", parameter)
            }
            ArbitraterError::RecursionLimit {
                type_name,
                max_depth,
            } => write!(
                f,
                "Recursion limit of {} exceeded while building [{}]",
                max_depth, type_name
            ),
            ArbitraterError::Config(error) => write!(f, "Configuration error: {}", error),
            ArbitraterError::InstanceCreation { type_name, .. } => {
                write!(f, "Could not generate random value for type [{}]", type_name)
            }
        }
    }
}

impl std::error::Error for ArbitraterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArbitraterError::InstanceCreation { source, .. } => Some(source.as_ref()),
            ArbitraterError::Config(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigError> for ArbitraterError {
    fn from(error: ConfigError) -> Self {
        ArbitraterError::Config(error)
    }
}

/// Helper functions for creating ArbitraterError instances
impl ArbitraterError {
    /// Create an unknown parameter error
    pub fn unknown_parameter(parameter: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnknownParameter {
            parameter: parameter.into(),
            type_name: type_name.into(),
        }
    }

    /// Create an unsupported type error
    pub fn unsupported_type(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an empty candidate set error
    pub fn empty_candidate_set(type_name: impl Into<String>) -> Self {
        Self::EmptyCandidateSet {
            type_name: type_name.into(),
        }
    }

    /// Create an argument mismatch error
    pub fn argument_mismatch(parameter: impl Into<String>, expected: &'static str) -> Self {
        Self::ArgumentMismatch {
            parameter: parameter.into(),
            expected,
        }
    }

    /// Create a missing argument error
    pub fn missing_argument(parameter: impl Into<String>) -> Self {
        Self::MissingArgument {
            parameter: parameter.into(),
        }
    }

    /// Create a recursion limit error
    pub fn recursion_limit(type_name: impl Into<String>, max_depth: usize) -> Self {
        Self::RecursionLimit {
            type_name: type_name.into(),
            max_depth,
        }
    }

    /// Wrap a failure against the type that was being built
    pub fn instance_creation(type_name: impl Into<String>, source: ArbitraterError) -> Self {
        Self::InstanceCreation {
            type_name: type_name.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, skipping any `InstanceCreation` wrappers
    pub fn root_cause(&self) -> &ArbitraterError {
        match self {
            ArbitraterError::InstanceCreation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
