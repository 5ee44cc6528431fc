// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Intermediate phase interpolation.
//!
//! [`PhaseInterpolationEngine::expand`] turns a run of major phase events
//! into the 8-point lunar calendar by placing each crescent/gibbous phase at
//! the temporal midpoint of the two major phases that bracket it.
//!
//! ```text
//!  NewMoon ── WaxingCrescent ── FirstQuarter ── WaxingGibbous ── FullMoon
//!     ╰──────────── ½ ─────────────╯
//! ```
//!
//! A pair `(a, b)` of consecutive events is interpolated only when
//!
//! 1. `a → b` is one of the four canonical transitions
//!    (see [`PhaseKind::between`]), and
//! 2. `b` falls strictly after `a` and no more than [`MAX_PAIR_GAP`]
//!    (1.5 quarter cycles ≈ 11.07 d) later, counted in calendar days.
//!
//! Every other pair is skipped without error. After the last observed event
//! the engine estimates the next New Moon one quarter cycle ahead and
//! interpolates towards it, so a month ending in Last Quarter still gets its
//! Waning Crescent. The estimate itself is dropped from the output unless
//! [`with_estimates`](PhaseInterpolationEngine::with_estimates) asks for it.

use crate::phase::{MajorPhaseEvent, PhaseKind, PhaseTimestamp};
use chrono::{DateTime, TimeDelta, Timelike, Utc};
use qtty::Days;

/// Mean synodic month.
pub const SYNODIC_MONTH: Days = Days::new(29.530_588_853);

/// Nominal spacing of consecutive major phases (¼ synodic month ≈ 7.38 d).
pub const QUARTER_INTERVAL: Days = Days::new(SYNODIC_MONTH.value() / 4.0);

/// Longest calendar-day gap across which two major phases are interpolated.
pub const MAX_PAIR_GAP: Days = Days::new(QUARTER_INTERVAL.value() * 1.5);

/// Fraction of the `a → b` span at which the intermediate phase is placed.
const MIDPOINT_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum InterpolationError {
    #[error("span between the two events overflows")]
    SpanOverflow,

    #[error("derived instant is outside the representable calendar")]
    OutOfRange,
}

/// Derives intermediate phase events from major ones.
///
/// The engine holds only its options; [`expand`](Self::expand) is a pure
/// function of its input and may be called from any number of threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInterpolationEngine {
    extend_cycle: bool,
    include_estimates: bool,
}

impl Default for PhaseInterpolationEngine {
    fn default() -> Self {
        Self {
            extend_cycle: true,
            include_estimates: false,
        }
    }
}

impl PhaseInterpolationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to interpolate past the last event towards an estimated next
    /// New Moon. On by default.
    pub fn with_cycle_extension(mut self, enabled: bool) -> Self {
        self.extend_cycle = enabled;
        self
    }

    /// Whether to return the estimated New Moon placeholder alongside the
    /// result. Off by default.
    pub fn with_estimates(mut self, enabled: bool) -> Self {
        self.include_estimates = enabled;
        self
    }

    /// Interleave `events` with every intermediate phase that can be derived
    /// from them, sorted by timestamp.
    ///
    /// The input is re-sorted (stably) before pairing, so callers need not
    /// guarantee order. For `N` input events the output holds between `N`
    /// and `2N` events (`2N + 1` with estimates enabled).
    pub fn expand(&self, events: &[MajorPhaseEvent]) -> Vec<MajorPhaseEvent> {
        let mut majors = events.to_vec();
        majors.sort_by_key(MajorPhaseEvent::timestamp);

        let mut expanded = Vec::with_capacity(majors.len() * 2 + 1);
        expanded.extend_from_slice(&majors);

        expanded.extend(
            majors
                .windows(2)
                .filter_map(|pair| self.interpolate(&pair[0], &pair[1])),
        );

        if self.extend_cycle && majors.len() >= 2 {
            if let Some(last) = majors.last() {
                if let Some(estimate) = self.estimate_next_cycle(last) {
                    expanded.extend(self.interpolate(last, &estimate));
                    if self.include_estimates {
                        expanded.push(estimate);
                    }
                }
            }
        }

        expanded.sort_by_key(MajorPhaseEvent::timestamp);
        log::trace!(
            "expanded {} phase events into {}",
            majors.len(),
            expanded.len()
        );
        expanded
    }

    /// The intermediate event between `a` and `b`, if the pair qualifies.
    pub fn interpolate(&self, a: &MajorPhaseEvent, b: &MajorPhaseEvent) -> Option<MajorPhaseEvent> {
        let kind = PhaseKind::between(a.kind(), b.kind())?;
        if !within_pair_gap(a.timestamp(), b.timestamp()) {
            log::trace!("{} and {} are too far apart to interpolate", a, b);
            return None;
        }
        match midpoint(a.timestamp(), b.timestamp()) {
            Ok(timestamp) => Some(MajorPhaseEvent::interpolated(kind, timestamp)),
            Err(err) => {
                log::debug!("no {} between {} and {}: {}", kind, a, b, err);
                None
            }
        }
    }

    /// A synthetic New Moon one quarter cycle (in whole days) after `last`,
    /// keeping `last`'s time of day, or noon when it has none.
    pub fn estimate_next_cycle(&self, last: &MajorPhaseEvent) -> Option<MajorPhaseEvent> {
        match estimated_next_timestamp(last.timestamp()) {
            Ok(timestamp) => Some(MajorPhaseEvent::estimated(PhaseKind::NewMoon, timestamp)),
            Err(err) => {
                log::debug!("cannot estimate the cycle after {}: {}", last, err);
                None
            }
        }
    }
}

// ── helpers ───────────────────────────────────────────────────────────────

/// Whole calendar days from `a` to `b`.
fn calendar_days(a: PhaseTimestamp, b: PhaseTimestamp) -> Days {
    Days::new(b.date().signed_duration_since(a.date()).num_days() as f64)
}

fn within_pair_gap(a: PhaseTimestamp, b: PhaseTimestamp) -> bool {
    let gap = calendar_days(a, b);
    gap > Days::new(0.0) && gap <= MAX_PAIR_GAP
}

/// Midpoint of `a → b`, anchored at `a`'s effective instant.
///
/// The span is the calendar-day difference plus, only when both ends carry a
/// time of day, the time-of-day difference.
fn midpoint(a: PhaseTimestamp, b: PhaseTimestamp) -> Result<PhaseTimestamp, InterpolationError> {
    let mut span = b.date().signed_duration_since(a.date());
    if let (Some(from), Some(to)) = (a.time(), b.time()) {
        span = span
            .checked_add(&to.signed_duration_since(from))
            .ok_or(InterpolationError::SpanOverflow)?;
    }

    let offset_ms = span.num_milliseconds() as f64 * MIDPOINT_RATIO;
    let offset = TimeDelta::try_milliseconds(offset_ms as i64)
        .ok_or(InterpolationError::SpanOverflow)?;

    let instant = a
        .effective()
        .checked_add_signed(offset)
        .ok_or(InterpolationError::OutOfRange)?;
    truncate_to_minute(instant).map(PhaseTimestamp::from)
}

fn truncate_to_minute(instant: DateTime<Utc>) -> Result<DateTime<Utc>, InterpolationError> {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .ok_or(InterpolationError::OutOfRange)
}

fn estimated_next_timestamp(last: PhaseTimestamp) -> Result<PhaseTimestamp, InterpolationError> {
    let whole_days = QUARTER_INTERVAL.value().floor() as i64;
    let date = TimeDelta::try_days(whole_days)
        .and_then(|step| last.date().checked_add_signed(step))
        .ok_or(InterpolationError::OutOfRange)?;
    Ok(PhaseTimestamp::at(date, last.time_or_default()))
}
