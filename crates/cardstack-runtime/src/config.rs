#![forbid(unsafe_code)]

//! Presentation timing and interaction policy.
//!
//! [`PresentationConfig`] carries every tunable the coordinator reads. With the
//! `policy-config` feature it can be loaded from TOML or JSON using kebab-case
//! keys:
//!
//! ```toml
//! transition-duration = 0.75
//! busy-indicator-fade = 0.25
//! restore-duration = 0.15
//! allows-swipe-interaction = true
//! reduced-motion = false
//! ```
//!
//! Durations are given in seconds. Missing keys take their defaults.
//!
//! # Failure Modes
//!
//! - Negative, non-finite, or absurdly long durations are rejected with
//!   [`ConfigError::InvalidDuration`].
//! - Malformed documents are rejected with [`ConfigError::Parse`].

use std::time::Duration;

/// Upper bound accepted for any configured duration.
pub const MAX_DURATION: Duration = Duration::from_secs(10);

/// Errors from configuration validation and loading.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A duration was negative, non-finite, or above [`MAX_DURATION`].
    InvalidDuration { field: &'static str, seconds: f64 },
    /// A configuration document could not be parsed.
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDuration { field, seconds } => {
                write!(f, "invalid duration for '{field}': {seconds}s")
            }
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Timing and interaction policy for one presentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationConfig {
    /// Total duration of the three-phase content swap.
    pub transition_duration: Duration,
    /// Fade duration for showing or hiding the busy indicator.
    pub busy_indicator_fade: Duration,
    /// Duration of the snap-back after a cancelled drag.
    pub restore_duration: Duration,
    /// Whether the interactive dismiss gesture is wired at all.
    pub allows_swipe_interaction: bool,
    /// Collapse every transition to the instant path.
    pub reduced_motion: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            transition_duration: Duration::from_millis(750),
            busy_indicator_fade: Duration::from_millis(250),
            restore_duration: Duration::from_millis(150),
            allows_swipe_interaction: true,
            reduced_motion: false,
        }
    }
}

impl PresentationConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn transition_duration(mut self, duration: Duration) -> Self {
        self.transition_duration = duration;
        self
    }

    #[must_use]
    pub fn busy_indicator_fade(mut self, duration: Duration) -> Self {
        self.busy_indicator_fade = duration;
        self
    }

    #[must_use]
    pub fn restore_duration(mut self, duration: Duration) -> Self {
        self.restore_duration = duration;
        self
    }

    #[must_use]
    pub fn allows_swipe_interaction(mut self, allowed: bool) -> Self {
        self.allows_swipe_interaction = allowed;
        self
    }

    #[must_use]
    pub fn reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }

    /// Duration of a content swap, honouring `reduced_motion`.
    #[must_use]
    pub fn effective_transition_duration(&self) -> Duration {
        self.effective(self.transition_duration)
    }

    /// Busy indicator fade, honouring `reduced_motion`.
    #[must_use]
    pub fn effective_busy_indicator_fade(&self) -> Duration {
        self.effective(self.busy_indicator_fade)
    }

    /// Drag restore duration, honouring `reduced_motion`.
    #[must_use]
    pub fn effective_restore_duration(&self) -> Duration {
        self.effective(self.restore_duration)
    }

    fn effective(&self, duration: Duration) -> Duration {
        if self.reduced_motion {
            Duration::ZERO
        } else {
            duration
        }
    }

    /// Check every duration against [`MAX_DURATION`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("transition-duration", self.transition_duration),
            ("busy-indicator-fade", self.busy_indicator_fade),
            ("restore-duration", self.restore_duration),
        ] {
            if value > MAX_DURATION {
                return Err(ConfigError::InvalidDuration {
                    field,
                    seconds: value.as_secs_f64(),
                });
            }
        }
        Ok(())
    }
}

/// Convert a seconds value from a document into a [`Duration`].
pub fn duration_from_secs(field: &'static str, seconds: f64) -> Result<Duration, ConfigError> {
    let invalid = ConfigError::InvalidDuration { field, seconds };
    let duration = Duration::try_from_secs_f64(seconds).map_err(|_| invalid.clone())?;
    if duration > MAX_DURATION {
        return Err(invalid);
    }
    Ok(duration)
}

// ---------------------------------------------------------------------------
// Document loading
// ---------------------------------------------------------------------------

#[cfg(feature = "policy-config")]
mod document {
    use super::{ConfigError, PresentationConfig, duration_from_secs};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
    struct RawConfig {
        transition_duration: f64,
        busy_indicator_fade: f64,
        restore_duration: f64,
        allows_swipe_interaction: bool,
        reduced_motion: bool,
    }

    impl Default for RawConfig {
        fn default() -> Self {
            let defaults = PresentationConfig::default();
            Self {
                transition_duration: defaults.transition_duration.as_secs_f64(),
                busy_indicator_fade: defaults.busy_indicator_fade.as_secs_f64(),
                restore_duration: defaults.restore_duration.as_secs_f64(),
                allows_swipe_interaction: defaults.allows_swipe_interaction,
                reduced_motion: defaults.reduced_motion,
            }
        }
    }

    impl TryFrom<RawConfig> for PresentationConfig {
        type Error = ConfigError;

        fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
            let config = Self {
                transition_duration: duration_from_secs(
                    "transition-duration",
                    raw.transition_duration,
                )?,
                busy_indicator_fade: duration_from_secs(
                    "busy-indicator-fade",
                    raw.busy_indicator_fade,
                )?,
                restore_duration: duration_from_secs("restore-duration", raw.restore_duration)?,
                allows_swipe_interaction: raw.allows_swipe_interaction,
                reduced_motion: raw.reduced_motion,
            };
            config.validate()?;
            Ok(config)
        }
    }

    impl PresentationConfig {
        /// Load a configuration from a TOML document.
        pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
            let raw: RawConfig =
                toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
            raw.try_into()
        }

        /// Load a configuration from a JSON document.
        pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
            let raw: RawConfig =
                serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
            raw.try_into()
        }
    }
}
