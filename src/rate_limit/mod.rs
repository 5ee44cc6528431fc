// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Token-bucket request throttle.
//!
//! The bucket holds up to `capacity` tokens and refills continuously at
//! `refill_rate` tokens per second. Each permitted operation spends one
//! token, so at most `capacity` operations pass back to back and the long-run
//! rate converges to `refill_rate`.
//!
//! ```
//! use moonphase::{RateLimiter, RateLimitConfig};
//!
//! let limiter = RateLimiter::from_config(&RateLimitConfig::new(2.0, 3)).unwrap();
//! assert!(limiter.try_acquire());
//! assert!(limiter.try_acquire());
//! assert!(limiter.try_acquire());
//! assert!(!limiter.try_acquire());
//! ```
//!
//! A limiter is `Send + Sync`; share one instance behind an `Arc`. The token
//! balance lives behind a [`Mutex`]. [`RateLimiter::acquire`] releases the
//! lock while it sleeps and re-checks the balance on wake, so no token is
//! handed out twice and a sleeping caller never blocks
//! [`try_acquire`](RateLimiter::try_acquire) or
//! [`snapshot`](RateLimiter::snapshot). Waiters are not served in any
//! particular order.

mod clock;
mod config;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    RateLimitConfig, BURST_SIZE_ENV, DEFAULT_BURST_SIZE, DEFAULT_REQUESTS_PER_SECOND,
    RATE_LIMIT_ENV,
};

use crate::error::ConfigError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Slack for float drift when the refilled balance lands a hair under 1.0.
const TOKEN_EPSILON: f64 = 1e-9;

/// Point-in-time view of a limiter, for monitoring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum LimiterSnapshot {
    /// Limiting is off; every call passes.
    Disabled,
    Limited {
        refill_rate: f64,
        capacity: u32,
        /// Whole tokens currently in the bucket.
        available_tokens: u32,
    },
}

impl LimiterSnapshot {
    pub fn is_disabled(&self) -> bool {
        matches!(self, LimiterSnapshot::Disabled)
    }

    /// Whole tokens available, or `None` when limiting is off.
    pub fn available_tokens(&self) -> Option<u32> {
        match self {
            LimiterSnapshot::Disabled => None,
            LimiterSnapshot::Limited {
                available_tokens, ..
            } => Some(*available_tokens),
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Duration,
}

#[derive(Debug)]
struct Bucket {
    refill_rate: f64,
    capacity: u32,
    clock: Arc<dyn Clock>,
    state: Mutex<BucketState>,
}

impl Bucket {
    fn lock(&self) -> MutexGuard<'_, BucketState> {
        // The state is two plain numbers; a panicking holder cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refill(&self, state: &mut BucketState) {
        let now = self.clock.now();
        let elapsed = now.saturating_sub(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity as f64);
        state.last_refill = now;
    }

    /// Spend one token if available, otherwise report how long until one is.
    fn take(&self) -> Result<(), Duration> {
        let mut state = self.lock();
        self.refill(&mut state);
        if state.tokens + TOKEN_EPSILON >= 1.0 {
            state.tokens = (state.tokens - 1.0).max(0.0);
            return Ok(());
        }
        let wait = (1.0 - state.tokens) / self.refill_rate;
        Err(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX))
    }
}

#[derive(Debug)]
enum Mode {
    Disabled,
    Limited(Bucket),
}

/// Thread-safe token bucket.
#[derive(Debug)]
pub struct RateLimiter {
    mode: Mode,
}

impl RateLimiter {
    /// Limiter refilling `refill_rate` tokens per second up to `capacity`.
    ///
    /// A non-positive rate or a zero capacity yields a disabled limiter.
    pub fn new(refill_rate: f64, capacity: u32) -> Result<Self, ConfigError> {
        Self::from_config(&RateLimitConfig::new(refill_rate, capacity))
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Build from `MOON_PHASE_RATE_LIMIT` / `MOON_PHASE_BURST_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_config(&RateLimitConfig::from_env()?)
    }

    /// Build with an explicit time source.
    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.is_disabled() {
            log::debug!("rate limiting disabled");
            return Ok(Self::disabled());
        }

        log::debug!(
            "rate limiting at {} req/s, burst {}",
            config.requests_per_second,
            config.burst_size
        );
        let last_refill = clock.now();
        Ok(Self {
            mode: Mode::Limited(Bucket {
                refill_rate: config.requests_per_second,
                capacity: config.burst_size,
                clock,
                state: Mutex::new(BucketState {
                    tokens: config.burst_size as f64,
                    last_refill,
                }),
            }),
        })
    }

    /// A limiter that lets everything through.
    pub fn disabled() -> Self {
        Self {
            mode: Mode::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, Mode::Limited(_))
    }

    /// Block until a token is available, then spend it.
    pub fn acquire(&self) {
        let Mode::Limited(bucket) = &self.mode else {
            return;
        };
        while let Err(wait) = bucket.take() {
            log::trace!("rate limited, waiting {:?}", wait);
            bucket.clock.sleep(wait);
        }
    }

    /// Spend a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        match &self.mode {
            Mode::Disabled => true,
            Mode::Limited(bucket) => bucket.take().is_ok(),
        }
    }

    /// Current configuration and balance. Refills but never spends.
    pub fn snapshot(&self) -> LimiterSnapshot {
        match &self.mode {
            Mode::Disabled => LimiterSnapshot::Disabled,
            Mode::Limited(bucket) => {
                let mut state = bucket.lock();
                bucket.refill(&mut state);
                LimiterSnapshot::Limited {
                    refill_rate: bucket.refill_rate,
                    capacity: bucket.capacity,
                    available_tokens: state.tokens.floor() as u32,
                }
            }
        }
    }
}
