//! Continuous-time decay of access probability.
//!
//! Timeline for a record of age `a` minutes:
//!
//! ```text
//! probability
//!   1.0 ┤━━━━━━━━━━━━┓
//!       │            ┃╲
//!       │            ┃  ╲
//!   0.0 ┤            ┃    ╲━━━━━━━━━━━ (expired)
//!       └────────────┸─────┸──────────▶ age
//!                  full   zero
//! ```
//!
//! Everything here is a pure function of `(time_created, now, DecayConfig)`
//! except [`should_admit`], which consumes one sample from an injected
//! [`AdmissionDraw`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::models::DecayStatus;
use crate::traits::AdmissionDraw;

/// Per-store decay policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Age (minutes) at or below which probability is 1.0.
    pub full_probability_minutes: f64,
    /// Age (minutes) at or above which probability is 0.0 and media is expired.
    pub zero_probability_minutes: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            full_probability_minutes: defaults::DECAY_FULL_PROBABILITY_MINUTES,
            zero_probability_minutes: defaults::DECAY_ZERO_PROBABILITY_MINUTES,
        }
    }
}

impl DecayConfig {
    /// Create a validated config (`zero > full >= 0`, both finite).
    pub fn new(full_probability_minutes: f64, zero_probability_minutes: f64) -> Result<Self> {
        let config = Self {
            full_probability_minutes,
            zero_probability_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the config invariant.
    pub fn validate(&self) -> Result<()> {
        if !self.full_probability_minutes.is_finite() || !self.zero_probability_minutes.is_finite()
        {
            return Err(Error::Config("decay thresholds must be finite".into()));
        }
        if self.full_probability_minutes < 0.0 {
            return Err(Error::Config(
                "full_probability_minutes must be non-negative".into(),
            ));
        }
        if self.zero_probability_minutes <= self.full_probability_minutes {
            return Err(Error::Config(
                "zero_probability_minutes must be greater than full_probability_minutes".into(),
            ));
        }
        Ok(())
    }

    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LETHE_DECAY_FULL_MINUTES` | `35` | Age with full access probability |
    /// | `LETHE_DECAY_ZERO_MINUTES` | `90` | Age at which media expires |
    ///
    /// Unparseable values fall back to defaults; a combination that violates
    /// the invariant falls back to [`DecayConfig::default`] entirely.
    pub fn from_env() -> Self {
        let read = |name: &str, fallback: f64| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(fallback)
        };

        let config = Self {
            full_probability_minutes: read(
                defaults::ENV_DECAY_FULL_MINUTES,
                defaults::DECAY_FULL_PROBABILITY_MINUTES,
            ),
            zero_probability_minutes: read(
                defaults::ENV_DECAY_ZERO_MINUTES,
                defaults::DECAY_ZERO_PROBABILITY_MINUTES,
            ),
        };

        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid decay config from environment, using defaults");
                Self::default()
            }
        }
    }

    /// Length of the linear decay window in minutes.
    pub fn decay_window_minutes(&self) -> f64 {
        self.zero_probability_minutes - self.full_probability_minutes
    }
}

/// Minutes elapsed between `created` and `now`, clamped at zero for clock skew.
pub fn age_minutes(created: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - created).num_milliseconds();
    (millis as f64 / 60_000.0).max(0.0)
}

/// Access probability for a record of the given age.
///
/// A degenerate config with `full == zero` acts as a step: 1.0 up to and
/// including the boundary age, 0.0 after it.
pub fn probability(age_minutes: f64, config: &DecayConfig) -> f64 {
    if age_minutes <= config.full_probability_minutes {
        return 1.0;
    }
    if age_minutes >= config.zero_probability_minutes {
        return 0.0;
    }
    let window = config.decay_window_minutes();
    if window <= 0.0 {
        return 0.0;
    }
    let elapsed_in_window = age_minutes - config.full_probability_minutes;
    (1.0 - elapsed_in_window / window).clamp(0.0, 1.0)
}

/// Whether a record of the given age has passed the zero-probability threshold.
pub fn is_expired(age_minutes: f64, config: &DecayConfig) -> bool {
    age_minutes >= config.zero_probability_minutes
}

/// Probabilistic admission: one uniform draw in `[0, 1)` compared against
/// [`probability`].
///
/// Not deterministic: two calls at the same age may disagree. Every call
/// draws again, so retrying is not blocked.
pub fn should_admit(age_minutes: f64, config: &DecayConfig, draw: &dyn AdmissionDraw) -> bool {
    let p = probability(age_minutes, config);
    if p <= 0.0 {
        return false;
    }
    draw.sample() < p
}

/// Evaluate age, probability and expiry in one go.
pub fn status(created: DateTime<Utc>, now: DateTime<Utc>, config: &DecayConfig) -> DecayStatus {
    let age = age_minutes(created, now);
    DecayStatus {
        age_minutes: age,
        probability: probability(age, config),
        expired: is_expired(age, config),
    }
}
