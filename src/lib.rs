// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Lunar phase calendar.
//!
//! This crate turns the four observed major phases of the Moon into the full
//! eight-point calendar, and throttles the requests that fetch them.
//!
//! # Core types
//!
//! - [`MajorPhaseEvent`] — a classified phase occurrence with its
//!   [`PhaseTimestamp`] and [`EventOrigin`].
//! - [`PhaseInterpolationEngine`] — derives the intermediate phases lying
//!   between adjacent major phases.
//! - [`RateLimiter`] — thread-safe token bucket gating upstream requests.
//! - [`PhaseSource`] — the seam to whatever service publishes major phases.
//! - [`Tracker`] — year / month / from-date queries over a source.
//! - [`AnalyticPhaseCalculator`] — closed-form phase and illumination for any
//!   instant, no source needed.
//! - [`JulianDay`] — continuous day count used by the calculator.
//!
//! # The eight phases
//!
//! | Phase | Major | Derived between |
//! |-------|-------|-----------------|
//! | New Moon | ✓ | |
//! | Waxing Crescent | | New Moon → First Quarter |
//! | First Quarter | ✓ | |
//! | Waxing Gibbous | | First Quarter → Full Moon |
//! | Full Moon | ✓ | |
//! | Waning Gibbous | | Full Moon → Last Quarter |
//! | Last Quarter | ✓ | |
//! | Waning Crescent | | Last Quarter → New Moon |
//!
//! # Example
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime};
//! use moonphase::{MajorPhaseEvent, PhaseInterpolationEngine, PhaseKind, PhaseTimestamp};
//!
//! let at = |d, h, m| {
//!     PhaseTimestamp::at(
//!         NaiveDate::from_ymd_opt(2025, 8, d).unwrap(),
//!         NaiveTime::from_hms_opt(h, m, 0).unwrap(),
//!     )
//! };
//! let majors = [
//!     MajorPhaseEvent::observed(PhaseKind::NewMoon, at(4, 11, 13)).unwrap(),
//!     MajorPhaseEvent::observed(PhaseKind::FirstQuarter, at(12, 15, 19)).unwrap(),
//! ];
//!
//! let all = PhaseInterpolationEngine::new()
//!     .with_cycle_extension(false)
//!     .expand(&majors);
//! assert_eq!(all[1].kind(), PhaseKind::WaxingCrescent);
//! assert_eq!(all[1].timestamp(), at(8, 13, 16));
//! ```
//!
//! # Logging
//!
//! Diagnostics go through the [`log`] facade; install any logger to see them.

mod calculator;
mod error;
mod interpolation;
mod julian;
mod phase;
pub mod rate_limit;
mod report;
mod source;
mod tracker;

// ── Re-exports ────────────────────────────────────────────────────────────

pub use calculator::{
    classify, illumination_at_position, AnalyticPhaseCalculator, PhaseReading,
    REFERENCE_NEW_MOON,
};
pub use error::{
    CalculatorError, ConfigError, EventError, FetchError, RecordError, TrackerError,
};
pub use interpolation::{PhaseInterpolationEngine, MAX_PAIR_GAP, QUARTER_INTERVAL, SYNODIC_MONTH};
pub use julian::{JulianDay, ToJulianDay};
pub use phase::{
    EventOrigin, MajorPhaseEvent, PhaseKind, PhaseRecord, PhaseTimestamp, DEFAULT_TIME_OF_DAY,
};
pub use rate_limit::{LimiterSnapshot, RateLimitConfig, RateLimiter};
pub use report::{month_name, PhaseReport};
pub use source::{events_from_records, PhaseRequest, PhaseSource};
pub use tracker::{Tracker, MAX_PHASES_PER_REQUEST, MAX_YEARS_AHEAD, MIN_YEAR};
