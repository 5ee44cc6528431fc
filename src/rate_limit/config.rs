// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Rate limiter settings.
//!
//! | Setting | Environment variable | Default |
//! |---------|----------------------|---------|
//! | requests per second | `MOON_PHASE_RATE_LIMIT` | `1.0` |
//! | burst size | `MOON_PHASE_BURST_SIZE` | `1` |
//!
//! A rate of `0` (or a burst of `0`) turns limiting off.

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const RATE_LIMIT_ENV: &str = "MOON_PHASE_RATE_LIMIT";
pub const BURST_SIZE_ENV: &str = "MOON_PHASE_BURST_SIZE";

pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 1.0;
pub const DEFAULT_BURST_SIZE: u32 = 1;

/// Token-bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RateLimitConfig {
    /// Steady-state refill rate in tokens per second.
    #[cfg_attr(feature = "serde", serde(default = "default_rate"))]
    pub requests_per_second: f64,

    /// Bucket capacity.
    #[cfg_attr(feature = "serde", serde(default = "default_burst"))]
    pub burst_size: u32,
}

#[cfg(feature = "serde")]
fn default_rate() -> f64 {
    DEFAULT_REQUESTS_PER_SECOND
}

#[cfg(feature = "serde")]
fn default_burst() -> u32 {
    DEFAULT_BURST_SIZE
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            burst_size: DEFAULT_BURST_SIZE,
        }
    }
}

impl RateLimitConfig {
    pub fn new(requests_per_second: f64, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// A configuration that never throttles.
    pub fn disabled() -> Self {
        Self::new(0.0, DEFAULT_BURST_SIZE)
    }

    pub fn with_rate(mut self, requests_per_second: f64) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    pub fn with_burst(mut self, burst_size: u32) -> Self {
        self.burst_size = burst_size;
        self
    }

    /// `true` when these settings switch limiting off.
    pub fn is_disabled(&self) -> bool {
        self.requests_per_second <= 0.0 || self.burst_size == 0
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Absent keys fall back to the defaults; present but malformed values
    /// are errors.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(RATE_LIMIT_ENV) {
            config.requests_per_second = parse_rate(&raw)?;
        }
        if let Some(raw) = lookup(BURST_SIZE_ENV) {
            config.burst_size = parse_burst(&raw)?;
        }
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.requests_per_second.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::NonFiniteRate(self.requests_per_second))
        }
    }
}

fn parse_rate(raw: &str) -> Result<f64, ConfigError> {
    let rate: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::UnparseableRate(raw.to_string()))?;
    if !rate.is_finite() {
        return Err(ConfigError::NonFiniteRate(rate));
    }
    Ok(rate)
}

fn parse_burst(raw: &str) -> Result<u32, ConfigError> {
    let burst: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::UnparseableBurst(raw.to_string()))?;
    if burst < 0 {
        return Err(ConfigError::NegativeBurst(burst));
    }
    u32::try_from(burst).map_err(|_| ConfigError::UnparseableBurst(raw.to_string()))
}
