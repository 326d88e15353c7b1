//! Timing for autosave, periodic backup, and recovery.

use std::time::Duration;

use fueltrack_storage::default_window;

/// Autosave timing.
#[derive(Debug, Clone, Copy)]
pub struct AutosaveConfig {
    /// Quiet time after the last edit before the voyage is written
    pub debounce: Duration,
    /// Period of the backup snapshot while editing
    pub backup_interval: Duration,
    /// How old a backup may be and still be offered for recovery
    pub recovery_window: chrono::Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            backup_interval: Duration::from_secs(30),
            recovery_window: default_window(),
        }
    }
}

impl AutosaveConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce delay.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// Set the backup period.
    pub fn with_backup_interval(mut self, period: Duration) -> Self {
        self.backup_interval = period;
        self
    }

    /// Set the recovery window.
    pub fn with_recovery_window(mut self, window: chrono::Duration) -> Self {
        self.recovery_window = window;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AutosaveConfig::default();
        assert_eq!(config.debounce, Duration::from_secs(1));
        assert_eq!(config.backup_interval, Duration::from_secs(30));
        assert_eq!(config.recovery_window, chrono::Duration::hours(1));
    }

    #[test]
    fn test_builders() {
        let config = AutosaveConfig::new()
            .with_debounce(Duration::from_millis(250))
            .with_backup_interval(Duration::from_secs(5))
            .with_recovery_window(chrono::Duration::minutes(10));
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.backup_interval, Duration::from_secs(5));
        assert_eq!(config.recovery_window, chrono::Duration::minutes(10));
    }
}
