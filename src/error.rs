// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Error types.
//!
//! | Error | Raised by | When |
//! |-------|-----------|------|
//! | [`ConfigError`] | [`RateLimiter`](crate::RateLimiter) construction | unparseable or out-of-range settings |
//! | [`EventError`] | [`MajorPhaseEvent`](crate::MajorPhaseEvent) constructors | kind/origin mismatch |
//! | [`RecordError`] | [`PhaseRecord`](crate::PhaseRecord) conversion | malformed raw record |
//! | [`CalculatorError`] | [`AnalyticPhaseCalculator::with_reference`](crate::AnalyticPhaseCalculator::with_reference) | unusable cycle length |
//! | [`FetchError`] | [`PhaseSource`](crate::PhaseSource) implementations | transport or remote-service failure |
//! | [`TrackerError`] | [`Tracker`](crate::Tracker) queries | invalid request or fetch failure |
//!
//! The interpolation engine has no error type: it cannot fail.

use crate::phase::{EventOrigin, PhaseKind};

/// Invalid rate-limiter settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("rate limit must be a number, got {0:?}")]
    UnparseableRate(String),

    #[error("rate limit must be finite, got {0}")]
    NonFiniteRate(f64),

    #[error("burst size must be an integer, got {0:?}")]
    UnparseableBurst(String),

    #[error("burst size must not be negative, got {0}")]
    NegativeBurst(i64),
}

/// A [`MajorPhaseEvent`](crate::MajorPhaseEvent) was built with a kind its
/// origin does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} cannot carry origin {origin:?}")]
pub struct EventError {
    pub kind: PhaseKind,
    pub origin: EventOrigin,
}

/// A raw phase record could not be turned into an observed event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("unknown phase name {0:?}")]
    UnknownPhase(String),

    #[error("{0} is not a major phase")]
    NotMajor(PhaseKind),

    #[error("invalid calendar date {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("invalid time of day {0:?}, expected HH:MM")]
    InvalidTime(String),
}

/// Calculator parameters that would make every reading NaN.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CalculatorError {
    #[error("synodic month must be a positive finite number of days, got {0}")]
    InvalidSynodicMonth(f64),

    #[error("reference new moon must be finite, got {0}")]
    NonFiniteReference(f64),
}

/// Failure reported by the external phase source.
///
/// Propagated to the caller unchanged; nothing in this crate retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Timeout, connection refused, DNS failure and the like.
    #[error("network failure: {0}")]
    Network(String),

    /// The remote service answered with an error or an undecodable body.
    #[error("service failure: {0}")]
    Service(String),
}

/// Errors surfaced by [`Tracker`](crate::Tracker) queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_is_transparent_through_tracker_error() {
        let err: TrackerError = FetchError::Network("timed out".into()).into();
        assert_eq!(err.to_string(), "network failure: timed out");
    }

    #[test]
    fn record_error_formats_dates_zero_padded() {
        let err = RecordError::InvalidDate {
            year: 2025,
            month: 2,
            day: 30,
        };
        assert_eq!(err.to_string(), "invalid calendar date 2025-02-30");
    }
}
