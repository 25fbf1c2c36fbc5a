//! Parallelism settings for the batch tool.

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_batch_size() -> usize {
    64
}

fn default_batch_size_option() -> Option<usize> {
    Some(default_batch_size())
}

/// Controls how many documents are migrated at once.
///
/// Each document's steps always run sequentially; only independent files
/// are spread across rayon's pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParallelConfig {
    /// Process files concurrently (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Worker threads; all available cores when unset
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Files handed to the pool per chunk (default: 64)
    #[serde(default = "default_batch_size_option")]
    pub batch_size: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_concurrency: None,
            batch_size: default_batch_size_option(),
        }
    }
}

impl ParallelConfig {
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Configured `max_concurrency`, or the number of available cores.
    pub fn effective_concurrency(&self) -> usize {
        if !self.enabled {
            return 1;
        }
        self.max_concurrency
            .filter(|&n| n > 0)
            .unwrap_or_else(available_cores)
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size
            .filter(|&n| n > 0)
            .unwrap_or_else(default_batch_size)
    }
}

fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_config_default() {
        let config = ParallelConfig::default();
        assert!(config.enabled);
        assert!(config.max_concurrency.is_none());
        assert_eq!(config.effective_batch_size(), 64);
        assert!(config.effective_concurrency() >= 1);
    }

    #[test]
    fn test_sequential_runs_one_worker() {
        let config = ParallelConfig {
            max_concurrency: Some(8),
            ..ParallelConfig::sequential()
        };
        assert_eq!(config.effective_concurrency(), 1);
    }

    #[test]
    fn test_zero_values_fall_back() {
        let config = ParallelConfig {
            enabled: true,
            max_concurrency: Some(0),
            batch_size: Some(0),
        };
        assert!(config.effective_concurrency() >= 1);
        assert_eq!(config.effective_batch_size(), 64);
    }
}
