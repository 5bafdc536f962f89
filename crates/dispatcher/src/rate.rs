//! RateConfig - fixed window rate limit

use std::num::NonZeroU32;
use std::time::Duration;

use contracts::RateSettings;

use crate::error::DispatcherError;

/// Immutable `(window, max_per_window)` pair
///
/// At most `max_per_window` dispatch attempts are started per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateConfig {
    window: Duration,
    max_per_window: NonZeroU32,
}

impl RateConfig {
    /// Validate and build a rate configuration
    ///
    /// # Errors
    /// `InvalidConfiguration` when `max_per_window < 1`, when it does not fit
    /// in a `u32`, or when `window` is zero.
    pub fn new(window: Duration, max_per_window: i64) -> Result<Self, DispatcherError> {
        if window.is_zero() {
            return Err(DispatcherError::invalid_configuration(
                "window duration must be greater than zero",
            ));
        }

        let max_per_window = u32::try_from(max_per_window)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| {
                DispatcherError::invalid_configuration(format!(
                    "request limit must be between 1 and {}, got {}",
                    u32::MAX,
                    max_per_window
                ))
            })?;

        Ok(Self {
            window,
            max_per_window,
        })
    }

    /// Build from config file settings
    pub fn from_settings(settings: &RateSettings) -> Result<Self, DispatcherError> {
        Self::new(settings.window(), settings.max_per_window)
    }

    /// Window length
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Maximum dispatch attempts per window
    pub fn max_per_window(&self) -> usize {
        self.max_per_window.get() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_negative_limits() {
        for limit in [0, -1, -100, i64::MIN] {
            let result = RateConfig::new(Duration::from_secs(1), limit);
            assert!(
                matches!(result, Err(DispatcherError::InvalidConfiguration { .. })),
                "limit {limit} should be rejected"
            );
        }
    }

    #[test]
    fn test_accepts_positive_limits() {
        for limit in [1, 2, 10, u32::MAX as i64] {
            let config = RateConfig::new(Duration::from_secs(1), limit).unwrap();
            assert_eq!(config.max_per_window(), limit as usize);
        }
    }

    #[test]
    fn test_rejects_oversized_limit() {
        let result = RateConfig::new(Duration::from_secs(1), u32::MAX as i64 + 1);
        assert!(result.unwrap_err().is_invalid_configuration());
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = RateConfig::new(Duration::ZERO, 5).unwrap_err();
        assert!(err.to_string().contains("window duration"));
    }

    #[test]
    fn test_from_settings() {
        let settings = RateSettings {
            window_ms: 250,
            max_per_window: 4,
        };
        let config = RateConfig::from_settings(&settings).unwrap();
        assert_eq!(config.window(), Duration::from_millis(250));
        assert_eq!(config.max_per_window(), 4);
    }
}
