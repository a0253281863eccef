//! Settings controlling how instances are synthesized.

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Null probability outside `[0, 1]`
    InvalidNullProbability(f64),
    /// Invalid max depth (must be > 0)
    InvalidMaxDepth(usize),
    /// The process-wide type universe can only be installed once
    UniverseAlreadyInstalled,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidNullProbability(p) => {
                write!(f, "Invalid null probability: {} (must be within 0..=1)", p)
            }
            ConfigError::InvalidMaxDepth(n) => {
                write!(f, "Invalid max depth: {} (must be > 0)", n)
            }
            ConfigError::UniverseAlreadyInstalled => {
                write!(f, "The global type universe has already been installed")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for a single [`InstanceCreator`](crate::InstanceCreator)
///
/// Settings are plain values. The `with_*` methods return modified copies and
/// never touch the receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    /// Leave parameters with a declared default to the constructor
    pub use_default_values: bool,
    /// Allow `Option` parameters to come out as `None`
    pub generate_nulls: bool,
    /// Chance of `None` for a nullable value when `generate_nulls` is set
    pub null_probability: f64,
    /// Number of elements synthesized for sequences and sets
    pub collection_size: usize,
    /// Number of key/value pairs synthesized for maps
    pub map_size: usize,
    /// Optional seed for reproducible instances
    pub seed: Option<u64>,
    /// Optional bound on constructor nesting
    pub max_depth: Option<usize>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            use_default_values: true,
            generate_nulls: false,
            null_probability: 0.5,
            collection_size: 2,
            map_size: 10,
            seed: None,
            max_depth: None,
        }
    }
}

impl GeneratorSettings {
    pub fn with_use_default_values(&self, enabled: bool) -> Self {
        Self {
            use_default_values: enabled,
            ..self.clone()
        }
    }

    pub fn with_generate_nulls(&self, enabled: bool) -> Self {
        Self {
            generate_nulls: enabled,
            ..self.clone()
        }
    }

    pub fn with_null_probability(&self, probability: f64) -> Self {
        Self {
            null_probability: probability,
            ..self.clone()
        }
    }

    pub fn with_collection_size(&self, size: usize) -> Self {
        Self {
            collection_size: size,
            ..self.clone()
        }
    }

    pub fn with_map_size(&self, size: usize) -> Self {
        Self {
            map_size: size,
            ..self.clone()
        }
    }

    pub fn with_seed(&self, seed: Option<u64>) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    pub fn with_max_depth(&self, max_depth: Option<usize>) -> Self {
        Self {
            max_depth,
            ..self.clone()
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.null_probability) {
            return Err(ConfigError::InvalidNullProbability(self.null_probability));
        }
        if self.max_depth == Some(0) {
            return Err(ConfigError::InvalidMaxDepth(0));
        }
        Ok(())
    }
}
