//! Configuration of an offline run.

use crate::error::{PipelineError, Result};
use crate::features::DEFAULT_TOP_ENTRIES;
use crate::similarity::Precision;

/// Default vocabulary cap
pub const DEFAULT_MAX_FEATURES: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum number of vocabulary columns
    pub max_features: usize,
    /// Storage precision of the similarity matrix
    pub precision: Precision,
    /// Genres/keywords/cast members taken per movie
    pub top_entries: usize,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_features must be at least 1".to_string(),
            ));
        }
        if self.top_entries == 0 {
            return Err(PipelineError::InvalidConfig(
                "top_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            precision: Precision::default(),
            top_entries: DEFAULT_TOP_ENTRIES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_features, 5000);
        assert_eq!(config.precision, Precision::Single);
    }

    #[test]
    fn test_zero_cap_is_rejected() {
        let config = PipelineConfig {
            max_features: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
    }
}
