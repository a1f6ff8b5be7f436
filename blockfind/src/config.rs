use serde::{Deserialize, Serialize};

/// Tuning knobs of the block finder. Validated as a whole before any
/// parallel work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct FinderConfig {
    /// K-mer size of the junction graph; odd, at most 31.
    pub k: usize,
    /// Minimum length of a reported (trimmed) block.
    pub min_block_size: i64,
    /// Largest bubble span tolerated between equivalent junctions.
    pub max_branch_size: i64,
    /// Largest unmatched flank before an instance stops extending.
    pub max_flanking_size: i64,
    /// Step budget of the next-vertex scan, independent of
    /// `max_branch_size`.
    pub looking_depth: i64,
    /// Accepted for compatibility; the extension algorithm does not
    /// consult it.
    pub sample_size: i64,
    /// Worker parallelism.
    pub threads: usize,
    /// Seed of the schedule shuffle; single-threaded runs with the same
    /// seed are reproducible.
    pub seed: u64,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            k: 25,
            min_block_size: 50,
            max_branch_size: 125,
            max_flanking_size: 20,
            looking_depth: 25,
            sample_size: 8,
            threads: 1,
            seed: 0,
        }
    }
}

impl FinderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k < 1 || self.k > 31 || self.k % 2 == 0 {
            return Err(ConfigError::KmerSize { k: self.k });
        }
        for (name, value) in [
            ("min_block_size", self.min_block_size),
            ("looking_depth", self.looking_depth),
        ] {
            if value < 1 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        for (name, value) in [
            ("max_branch_size", self.max_branch_size),
            ("max_flanking_size", self.max_flanking_size),
            ("sample_size", self.sample_size),
        ] {
            if value < 0 {
                return Err(ConfigError::Negative { name, value });
            }
        }
        if self.min_block_size <= 2 * self.max_flanking_size {
            return Err(ConfigError::FlankDominatesBlock {
                min_block_size: self.min_block_size,
                max_flanking_size: self.max_flanking_size,
            });
        }
        if self.threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        Ok(())
    }

    /// Smallest matched span an instance must reach to count as good.
    pub fn min_chain_size(&self) -> i64 {
        self.min_block_size - 2 * self.max_flanking_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("k must be odd and in 1..=31, got {k}")]
    KmerSize { k: usize },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: i64 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: i64 },
    #[error(
        "min_block_size ({min_block_size}) must exceed twice max_flanking_size ({max_flanking_size})"
    )]
    FlankDominatesBlock {
        min_block_size: i64,
        max_flanking_size: i64,
    },
    #[error("threads must be at least 1")]
    NoThreads,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        FinderConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_even_k() {
        let config = FinderConfig {
            k: 24,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::KmerSize { k: 24 }));
    }

    #[test]
    fn rejects_dominating_flanks() {
        let config = FinderConfig {
            min_block_size: 20,
            max_flanking_size: 10,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FlankDominatesBlock { .. })
        ));
    }

    #[test]
    fn min_chain_size() {
        let config = FinderConfig {
            min_block_size: 20,
            max_flanking_size: 2,
            ..Default::default()
        };
        assert_eq!(config.min_chain_size(), 16);
    }
}
