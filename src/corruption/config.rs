// Severity configuration
// Ratios and magnitude bands that control how hard each corruption stage hits

use serde::{Deserialize, Serialize};

use super::CorruptionError;

/// Severity settings shared by every performance in a build run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    /// Overall error budget
    /// Scales the deletion, insertion and offset counts (not noise)
    pub error_ratio: f64,

    /// Share of the error budget spent on deleting beats
    pub delete_ratio: f64,

    /// Share of the error budget spent on inserting midpoint beats
    pub insert_ratio: f64,

    /// Share of the error budget spent on large timing offsets
    pub offset_ratio: f64,

    /// Fraction of beats that receive small jitter
    /// Applied directly to the sequence length, independent of `error_ratio`
    pub noise_ratio: f64,

    /// Highest tempo a pair of consecutive beats may imply
    /// Cleanup removes beats closer together than `60 / max_bpm` seconds
    pub max_bpm: f64,

    /// Smallest offset magnitude in seconds
    pub offset_min: f64,

    /// Width of the offset magnitude band in seconds
    /// Magnitudes are drawn from [offset_min, offset_min + offset_span)
    pub offset_span: f64,

    /// Half-width of the noise band in seconds
    /// Noise is drawn from [-noise_amplitude, noise_amplitude)
    pub noise_amplitude: f64,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        SeverityConfig {
            error_ratio: 0.3,
            delete_ratio: 0.3,
            insert_ratio: 0.4,
            offset_ratio: 0.3,
            noise_ratio: 0.4,
            max_bpm: 1000.0,
            offset_min: 0.07,
            offset_span: 0.2,
            noise_amplitude: 0.07,
        }
    }
}

impl SeverityConfig {
    /// A config that leaves the sequence untouched apart from sorting
    pub fn disabled() -> Self {
        SeverityConfig {
            error_ratio: 0.0,
            delete_ratio: 0.0,
            insert_ratio: 0.0,
            offset_ratio: 0.0,
            noise_ratio: 0.0,
            ..SeverityConfig::default()
        }
    }

    /// Minimum legal gap between consecutive beats in seconds
    pub fn min_interval(&self) -> f64 {
        60.0 / self.max_bpm
    }

    /// Number of beats to delete from a sequence of `len` beats
    pub fn delete_count(&self, len: usize) -> usize {
        scaled_count(len, self.error_ratio, self.delete_ratio)
    }

    /// Number of midpoint beats to insert into a sequence of `len` beats
    pub fn insert_count(&self, len: usize) -> usize {
        scaled_count(len, self.error_ratio, self.insert_ratio)
    }

    /// Number of beats to shift by a large offset
    pub fn offset_count(&self, len: usize) -> usize {
        scaled_count(len, self.error_ratio, self.offset_ratio)
    }

    /// Number of beats to jitter
    pub fn noise_count(&self, len: usize) -> usize {
        (len as f64 * self.noise_ratio).floor() as usize
    }

    /// Reject ratios and bands that cannot describe a corruption
    pub fn validate(&self) -> Result<(), CorruptionError> {
        let fields = [
            ("error_ratio", self.error_ratio),
            ("delete_ratio", self.delete_ratio),
            ("insert_ratio", self.insert_ratio),
            ("offset_ratio", self.offset_ratio),
            ("noise_ratio", self.noise_ratio),
            ("offset_min", self.offset_min),
            ("offset_span", self.offset_span),
            ("noise_amplitude", self.noise_amplitude),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(CorruptionError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        if !self.max_bpm.is_finite() || self.max_bpm <= 0.0 {
            return Err(CorruptionError::InvalidConfig(format!(
                "max_bpm must be finite and positive, got {}",
                self.max_bpm
            )));
        }

        Ok(())
    }
}

/// floor(len * budget * share), multiplied left to right
fn scaled_count(len: usize, budget: f64, share: f64) -> usize {
    (len as f64 * budget * share).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_min_interval() {
        let config = SeverityConfig::default();
        assert!((config.min_interval() - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_stage_counts_use_floor() {
        let config = SeverityConfig::default();

        // 100 * 0.3 * 0.3 = 9.0
        assert_eq!(config.delete_count(100), 9);
        // 91 * 0.3 * 0.4 = 10.92
        assert_eq!(config.insert_count(91), 10);
        // 101 * 0.3 * 0.3 = 9.09
        assert_eq!(config.offset_count(101), 9);
        // 101 * 0.4 = 40.4
        assert_eq!(config.noise_count(101), 40);
    }

    #[test]
    fn test_noise_ignores_error_budget() {
        let config = SeverityConfig {
            error_ratio: 0.0,
            noise_ratio: 0.5,
            ..SeverityConfig::default()
        };

        assert_eq!(config.delete_count(100), 0);
        assert_eq!(config.insert_count(100), 0);
        assert_eq!(config.offset_count(100), 0);
        assert_eq!(config.noise_count(100), 50);
    }

    #[test]
    fn test_validate_rejects_negative_ratio() {
        let config = SeverityConfig {
            insert_ratio: -0.1,
            ..SeverityConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CorruptionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_bpm() {
        let config = SeverityConfig {
            max_bpm: 0.0,
            ..SeverityConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(SeverityConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SeverityConfig = serde_json::from_str(r#"{"error_ratio": 0.5}"#).unwrap();
        assert_eq!(config.error_ratio, 0.5);
        assert_eq!(config.noise_ratio, 0.4);
        assert_eq!(config.max_bpm, 1000.0);
    }
}
