use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default sample rate. 8 kHz covers the voice band up to ~4 kHz.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 8000;

/// Default block size. At 8 kHz one block spans 750 ms.
pub const DEFAULT_BLOCK_SIZE_SAMPLES: usize = 6000;

/// Configuration for a capture session.
///
/// Immutable for the lifetime of a session. Missing fields fall back to
/// their defaults when deserialized, so a partial JSON document such as
/// `{"sample_rate_hz": 16000}` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Input sample rate in Hz (default: 8000).
    pub sample_rate_hz: u32,

    /// Samples per analysed block (default: 6000).
    pub block_size_samples: usize,

    /// Multiplier applied to the device's minimum buffer size (default: 2).
    pub buffer_headroom: usize,

    /// Total time allowed for the device to report readiness (default: 200 ms).
    pub readiness_budget_ms: u64,

    /// Poll step while waiting for readiness (default: 50 ms).
    pub readiness_step_ms: u64,

    /// Lower bound for the pacing wait after each block (default: 5 ms).
    pub min_pace_ms: u64,
}

impl CaptureConfig {
    pub fn new(sample_rate_hz: u32, block_size_samples: usize) -> Self {
        Self {
            sample_rate_hz,
            block_size_samples,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate_hz == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.block_size_samples == 0 {
            return Err("block size must be positive".into());
        }
        if self.buffer_headroom == 0 {
            return Err("buffer headroom must be at least 1".into());
        }
        if self.readiness_step_ms == 0 {
            return Err("readiness step must be positive".into());
        }
        if self.readiness_step_ms > self.readiness_budget_ms {
            return Err(format!(
                "readiness step ({} ms) exceeds readiness budget ({} ms)",
                self.readiness_step_ms, self.readiness_budget_ms
            ));
        }
        Ok(())
    }

    /// Real-time duration of one block: `1000 * block / rate` milliseconds.
    pub fn pace_interval_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        (1000 * self.block_size_samples as u64) / u64::from(self.sample_rate_hz)
    }

    pub fn pace_interval(&self) -> Duration {
        Duration::from_millis(self.pace_interval_ms())
    }

    pub fn pace_floor(&self) -> Duration {
        Duration::from_millis(self.min_pace_ms)
    }

    pub fn readiness_budget(&self) -> Duration {
        Duration::from_millis(self.readiness_budget_ms)
    }

    pub fn readiness_step(&self) -> Duration {
        Duration::from_millis(self.readiness_step_ms)
    }

    /// Device buffer request derived from the driver's minimum recommendation.
    pub fn device_buffer_size(&self, minimum: usize) -> usize {
        minimum.max(1).saturating_mul(self.buffer_headroom)
    }

    /// Samples that arrive in real time while the capture loop sits in its
    /// longest pacing wait.
    pub fn samples_per_pace_wait(&self) -> usize {
        let wait_ms = self.pace_interval_ms().max(self.min_pace_ms);
        let samples = u64::from(self.sample_rate_hz).saturating_mul(wait_ms).div_ceil(1000);
        usize::try_from(samples).unwrap_or(usize::MAX)
    }

    /// Backlog a backend must hold between reads without dropping samples:
    /// one device buffer, one block in progress, and one pacing wait.
    pub fn queue_capacity(&self, device_buffer: usize) -> usize {
        device_buffer
            .saturating_add(self.block_size_samples)
            .saturating_add(self.samples_per_pace_wait())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            block_size_samples: DEFAULT_BLOCK_SIZE_SAMPLES,
            buffer_headroom: 2,
            readiness_budget_ms: 200,
            readiness_step_ms: 50,
            min_pace_ms: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pace_interval_is_750ms() {
        let config = CaptureConfig::default();
        assert_eq!(config.sample_rate_hz, 8000);
        assert_eq!(config.block_size_samples, 6000);
        assert_eq!(config.pace_interval_ms(), 750);
        assert_eq!(config.pace_interval(), Duration::from_millis(750));
    }

    #[test]
    fn pace_interval_follows_rate_and_block() {
        assert_eq!(CaptureConfig::new(16000, 1600).pace_interval_ms(), 100);
        assert_eq!(CaptureConfig::new(44100, 4410).pace_interval_ms(), 100);
        assert_eq!(CaptureConfig::new(48000, 480).pace_interval_ms(), 10);
        // Sub-millisecond blocks truncate to zero; the pacing floor takes over.
        assert_eq!(CaptureConfig::new(48000, 16).pace_interval_ms(), 0);
    }

    #[test]
    fn validate_rejects_zero_values() {
        assert!(CaptureConfig::new(0, 6000).validate().is_err());
        assert!(CaptureConfig::new(8000, 0).validate().is_err());
        let config = CaptureConfig {
            buffer_headroom: 0,
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());
        let config = CaptureConfig {
            readiness_step_ms: 0,
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_step_larger_than_budget() {
        let config = CaptureConfig {
            readiness_budget_ms: 40,
            readiness_step_ms: 50,
            ..CaptureConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("exceeds"));
    }

    #[test]
    fn device_buffer_applies_headroom() {
        let config = CaptureConfig::default();
        assert_eq!(config.device_buffer_size(640), 1280);
        assert_eq!(config.device_buffer_size(0), 2);
    }

    #[test]
    fn queue_covers_a_block_and_a_pacing_wait() {
        let config = CaptureConfig::default();
        assert_eq!(config.samples_per_pace_wait(), 6000);
        assert_eq!(config.queue_capacity(1600), 1600 + 6000 + 6000);

        // The floor, not the truncated interval, bounds the wait.
        let config = CaptureConfig {
            sample_rate_hz: 48000,
            block_size_samples: 16,
            min_pace_ms: 20,
            ..CaptureConfig::default()
        };
        assert_eq!(config.samples_per_pace_wait(), 960);
        assert_eq!(config.queue_capacity(32), 32 + 16 + 960);

        // 44.1 kHz over 1 ms is fractional; round up.
        let config = CaptureConfig {
            sample_rate_hz: 44100,
            block_size_samples: 16,
            min_pace_ms: 1,
            ..CaptureConfig::default()
        };
        assert_eq!(config.samples_per_pace_wait(), 45);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: CaptureConfig = serde_json::from_str(r#"{"sample_rate_hz": 16000}"#).unwrap();
        assert_eq!(config.sample_rate_hz, 16000);
        assert_eq!(config.block_size_samples, DEFAULT_BLOCK_SIZE_SAMPLES);
        assert_eq!(config.readiness_step_ms, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn serializes_all_fields() {
        let json = serde_json::to_value(CaptureConfig::default()).unwrap();
        assert_eq!(json["block_size_samples"], 6000);
        assert_eq!(json["min_pace_ms"], 5);
    }
}
