use std::num::NonZeroU64;
use std::time::Duration;

use envconfig::Envconfig;

use crate::error::ConfigError;

#[derive(Envconfig, Clone, Debug)]
pub struct PostProcessConfig {
    /// Instances tolerated per shard before another shard is created.
    #[envconfig(from = "COUNT_SHARDING_THRESHOLD", default = "10000")]
    pub sharding_threshold: u64,
    /// Upper bound on waiting for a type's shard lock. Unset waits until the
    /// lock service hands the lock over.
    #[envconfig(from = "COUNT_LOCK_TIMEOUT_MS")]
    pub lock_timeout_ms: Option<u64>,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            sharding_threshold: 10000,
            lock_timeout_ms: None,
        }
    }
}

impl PostProcessConfig {
    pub fn with_threshold(threshold: u64) -> Self {
        Self {
            sharding_threshold: threshold,
            ..Default::default()
        }
    }

    pub fn threshold(&self) -> Result<NonZeroU64, ConfigError> {
        NonZeroU64::new(self.sharding_threshold)
            .ok_or(ConfigError::InvalidThreshold(self.sharding_threshold))
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.threshold()?;
        if self.lock_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidLockTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_from_empty_env() {
        let conf =
            PostProcessConfig::init_from_hashmap(&HashMap::new()).unwrap();
        assert_eq!(conf.sharding_threshold, 10000);
        assert_eq!(conf.lock_timeout(), None);
        conf.validate().unwrap();
    }

    #[test]
    fn reads_overrides() {
        let env = HashMap::from([
            ("COUNT_SHARDING_THRESHOLD".to_string(), "100".to_string()),
            ("COUNT_LOCK_TIMEOUT_MS".to_string(), "2500".to_string()),
        ]);
        let conf = PostProcessConfig::init_from_hashmap(&env).unwrap();
        assert_eq!(conf.threshold().unwrap().get(), 100);
        assert_eq!(conf.lock_timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let conf = PostProcessConfig::with_threshold(0);
        assert!(matches!(
            conf.validate(),
            Err(ConfigError::InvalidThreshold(0))
        ));
    }

    #[test]
    fn zero_lock_timeout_is_rejected() {
        let conf = PostProcessConfig {
            lock_timeout_ms: Some(0),
            ..PostProcessConfig::with_threshold(5)
        };
        assert!(matches!(
            conf.validate(),
            Err(ConfigError::InvalidLockTimeout)
        ));
    }
}
