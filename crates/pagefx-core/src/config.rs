#![forbid(unsafe_code)]

//! Policy-as-data configuration for the page controllers.
//!
//! Every presentation constant (thresholds, speeds, debounce windows,
//! breakpoints) lives in [`PageConfig`] instead of being a literal inside the
//! component that uses it.
//!
//! # Loading
//!
//! ```toml
//! [ticker]
//! px_per_sec = 60.0
//! min_duration_ms = 6000
//!
//! [dropdown]
//! accordion_breakpoint_px = 900.0
//! ```
//!
//! ```rust,ignore
//! let config = PageConfig::from_toml_str(toml)?;
//! let config = PageConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `PageConfig::default()` reproduces the tuned page constants, so a page
//! without a config document behaves exactly as designed.

use core::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for every page component.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct PageConfig {
    /// Header solidify threshold.
    pub header: HeaderConfig,
    /// Hero video replay gate.
    pub video: VideoConfig,
    /// Marquee loop parameters.
    pub ticker: TickerConfig,
    /// Reveal-on-scroll intersection parameters.
    pub reveal: RevealConfig,
    /// Dropdown responsive mode.
    pub dropdown: DropdownConfig,
    /// Slogan rotation timing.
    pub slogan: SloganConfig,
    /// Persisted preference location.
    pub preference: PreferenceConfig,
}

/// Header solidify threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct HeaderConfig {
    /// The header turns solid once `scrollY > heroHeight - solid_offset_px`.
    pub solid_offset_px: f64,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            solid_offset_px: 80.0,
        }
    }
}

/// Hero video replay gate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct VideoConfig {
    /// Replay fires when the scroll offset drops below this value.
    pub replay_top_px: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            replay_top_px: 120.0,
        }
    }
}

/// Marquee loop parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TickerConfig {
    /// Reference speed shared by all tracks.
    pub px_per_sec: f64,
    /// Lower bound on one loop cycle.
    pub min_duration_ms: u64,
    /// Hard cap on duplication passes per fill.
    pub max_fill_passes: u32,
    /// Quiet period before a resize triggers a refill.
    pub resize_debounce_ms: u64,
}

impl TickerConfig {
    /// Minimum loop duration.
    #[must_use]
    pub const fn min_duration(&self) -> Duration {
        Duration::from_millis(self.min_duration_ms)
    }

    /// Resize debounce window.
    #[must_use]
    pub const fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            px_per_sec: 80.0,
            min_duration_ms: 4000,
            max_fill_passes: 60,
            resize_debounce_ms: 140,
        }
    }
}

/// Reveal-on-scroll intersection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RevealConfig {
    /// The bottom edge of the trigger area is pulled up by this share of the
    /// viewport height, in percent.
    pub bottom_margin_pct: f64,
    /// Minimum visible share of the element, in `[0, 1]`.
    pub threshold: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            bottom_margin_pct: 10.0,
            threshold: 0.08,
        }
    }
}

/// Dropdown responsive mode.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct DropdownConfig {
    /// Below this viewport width the dropdown behaves as an accordion.
    pub accordion_breakpoint_px: f64,
}

impl Default for DropdownConfig {
    fn default() -> Self {
        Self {
            accordion_breakpoint_px: 768.0,
        }
    }
}

/// Slogan rotation timing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SloganConfig {
    /// Time each slogan stays fully visible.
    pub display_ms: u64,
    /// CSS transition time between slogans.
    pub transition_ms: u64,
}

impl SloganConfig {
    /// Full rotation interval (display plus transition).
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.display_ms).saturating_add(Duration::from_millis(self.transition_ms))
    }
}

impl Default for SloganConfig {
    fn default() -> Self {
        Self {
            display_ms: 1800,
            transition_ms: 420,
        }
    }
}

/// Persisted preference location.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct PreferenceConfig {
    /// Storage key of the implementation-variant preference.
    pub key: String,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        Self {
            key: "implVariant".to_string(),
        }
    }
}

impl PageConfig {
    /// Load from a JSON string and validate.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML string and validate.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter is within its usable range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ticker.px_per_sec.is_finite() && self.ticker.px_per_sec > 0.0) {
            return Err(ConfigError::Invalid {
                field: "ticker.px_per_sec",
                reason: "must be positive",
            });
        }
        if self.ticker.max_fill_passes == 0 {
            return Err(ConfigError::Invalid {
                field: "ticker.max_fill_passes",
                reason: "must be at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.reveal.threshold) {
            return Err(ConfigError::Invalid {
                field: "reveal.threshold",
                reason: "must be in [0, 1]",
            });
        }
        if !(0.0..100.0).contains(&self.reveal.bottom_margin_pct) {
            return Err(ConfigError::Invalid {
                field: "reveal.bottom_margin_pct",
                reason: "must be in [0, 100)",
            });
        }
        if !self.header.solid_offset_px.is_finite() {
            return Err(ConfigError::Invalid {
                field: "header.solid_offset_px",
                reason: "must be finite",
            });
        }
        if !self.video.replay_top_px.is_finite() {
            return Err(ConfigError::Invalid {
                field: "video.replay_top_px",
                reason: "must be finite",
            });
        }
        if self.slogan.interval().is_zero() {
            return Err(ConfigError::Invalid {
                field: "slogan.display_ms",
                reason: "interval must be non-zero",
            });
        }
        if self.preference.key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "preference.key",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_page_constants() {
        let config = PageConfig::default();
        assert_eq!(config.header.solid_offset_px, 80.0);
        assert_eq!(config.video.replay_top_px, 120.0);
        assert_eq!(config.ticker.px_per_sec, 80.0);
        assert_eq!(config.ticker.min_duration(), Duration::from_millis(4000));
        assert_eq!(config.ticker.max_fill_passes, 60);
        assert_eq!(config.ticker.resize_debounce(), Duration::from_millis(140));
        assert_eq!(config.reveal.bottom_margin_pct, 10.0);
        assert_eq!(config.reveal.threshold, 0.08);
        assert_eq!(config.slogan.interval(), Duration::from_millis(2220));
        assert_eq!(config.preference.key, "implVariant");
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(PageConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_speed_is_rejected() {
        let mut config = PageConfig::default();
        config.ticker.px_per_sec = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "ticker.px_per_sec",
                reason: "must be positive",
            })
        );
    }

    #[test]
    fn huge_slogan_timings_do_not_overflow() {
        let config = SloganConfig {
            display_ms: u64::MAX,
            transition_ms: u64::MAX,
        };
        assert!(config.interval() >= Duration::from_millis(u64::MAX));
    }

    #[test]
    fn nan_speed_is_rejected() {
        let mut config = PageConfig::default();
        config.ticker.px_per_sec = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let mut config = PageConfig::default();
        config.reveal.threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_fill_cap_is_rejected() {
        let mut config = PageConfig::default();
        config.ticker.max_fill_passes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_preference_key_is_rejected() {
        let mut config = PageConfig::default();
        config.preference.key.clear();
        assert!(config.validate().is_err());
    }
}
