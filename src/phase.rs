// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Phase events and their classification.
//!
//! - [`PhaseKind`] — the eight named phases, with display names, identifiers
//!   and moon symbols.
//! - [`EventOrigin`] — where an event came from (observed, interpolated,
//!   estimated).
//! - [`PhaseTimestamp`] — a UTC calendar date with an optional time of day.
//! - [`MajorPhaseEvent`] — a classified phase occurrence.
//! - [`PhaseRecord`] — the raw `{phase, year, month, day, time}` record a
//!   remote phase service emits.

use crate::error::{EventError, RecordError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// PhaseKind
// ═══════════════════════════════════════════════════════════════════════════

/// One of the eight named lunar phases, in cycle order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PhaseKind {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl PhaseKind {
    /// All kinds in cycle order, starting at New Moon.
    pub const ALL: [PhaseKind; 8] = [
        PhaseKind::NewMoon,
        PhaseKind::WaxingCrescent,
        PhaseKind::FirstQuarter,
        PhaseKind::WaxingGibbous,
        PhaseKind::FullMoon,
        PhaseKind::WaningGibbous,
        PhaseKind::LastQuarter,
        PhaseKind::WaningCrescent,
    ];

    /// The four primary phases.
    pub const MAJOR: [PhaseKind; 4] = [
        PhaseKind::NewMoon,
        PhaseKind::FirstQuarter,
        PhaseKind::FullMoon,
        PhaseKind::LastQuarter,
    ];

    /// Human-readable name, as used by the remote phase service.
    pub const fn name(self) -> &'static str {
        match self {
            PhaseKind::NewMoon => "New Moon",
            PhaseKind::WaxingCrescent => "Waxing Crescent",
            PhaseKind::FirstQuarter => "First Quarter",
            PhaseKind::WaxingGibbous => "Waxing Gibbous",
            PhaseKind::FullMoon => "Full Moon",
            PhaseKind::WaningGibbous => "Waning Gibbous",
            PhaseKind::LastQuarter => "Last Quarter",
            PhaseKind::WaningCrescent => "Waning Crescent",
        }
    }

    /// `snake_case` identifier.
    pub const fn identifier(self) -> &'static str {
        match self {
            PhaseKind::NewMoon => "new_moon",
            PhaseKind::WaxingCrescent => "waxing_crescent",
            PhaseKind::FirstQuarter => "first_quarter",
            PhaseKind::WaxingGibbous => "waxing_gibbous",
            PhaseKind::FullMoon => "full_moon",
            PhaseKind::WaningGibbous => "waning_gibbous",
            PhaseKind::LastQuarter => "last_quarter",
            PhaseKind::WaningCrescent => "waning_crescent",
        }
    }

    /// Moon phase emoji.
    pub const fn symbol(self) -> &'static str {
        match self {
            PhaseKind::NewMoon => "🌑",
            PhaseKind::WaxingCrescent => "🌒",
            PhaseKind::FirstQuarter => "🌓",
            PhaseKind::WaxingGibbous => "🌔",
            PhaseKind::FullMoon => "🌕",
            PhaseKind::WaningGibbous => "🌖",
            PhaseKind::LastQuarter => "🌗",
            PhaseKind::WaningCrescent => "🌘",
        }
    }

    /// `true` for New Moon, First Quarter, Full Moon and Last Quarter.
    #[inline]
    pub const fn is_major(self) -> bool {
        matches!(
            self,
            PhaseKind::NewMoon
                | PhaseKind::FirstQuarter
                | PhaseKind::FullMoon
                | PhaseKind::LastQuarter
        )
    }

    /// `true` for the four crescent/gibbous phases.
    #[inline]
    pub const fn is_intermediate(self) -> bool {
        !self.is_major()
    }

    /// The intermediate phase lying between two consecutive major phases.
    ///
    /// Only the four canonical transitions qualify; every other ordered pair
    /// (including repeats and reversed pairs) yields `None`.
    pub const fn between(from: PhaseKind, to: PhaseKind) -> Option<PhaseKind> {
        match (from, to) {
            (PhaseKind::NewMoon, PhaseKind::FirstQuarter) => Some(PhaseKind::WaxingCrescent),
            (PhaseKind::FirstQuarter, PhaseKind::FullMoon) => Some(PhaseKind::WaxingGibbous),
            (PhaseKind::FullMoon, PhaseKind::LastQuarter) => Some(PhaseKind::WaningGibbous),
            (PhaseKind::LastQuarter, PhaseKind::NewMoon) => Some(PhaseKind::WaningCrescent),
            _ => None,
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PhaseKind {
    type Err = RecordError;

    /// Accepts the display name (`"Full Moon"`) or the identifier
    /// (`"full_moon"`), ignoring surrounding whitespace and ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        PhaseKind::ALL
            .into_iter()
            .find(|kind| {
                kind.name().eq_ignore_ascii_case(needle)
                    || kind.identifier().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| RecordError::UnknownPhase(s.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// EventOrigin
// ═══════════════════════════════════════════════════════════════════════════

/// Provenance of a [`MajorPhaseEvent`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventOrigin {
    /// Reported by the external phase source. Always a major kind.
    Observed,
    /// Derived as the midpoint of two major events. Always an intermediate kind.
    Interpolated,
    /// Synthetic placeholder used to close the last cycle.
    Estimated,
}

impl EventOrigin {
    /// Whether `kind` may carry this origin.
    pub const fn admits(self, kind: PhaseKind) -> bool {
        match self {
            EventOrigin::Observed => kind.is_major(),
            EventOrigin::Interpolated => kind.is_intermediate(),
            EventOrigin::Estimated => true,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PhaseTimestamp
// ═══════════════════════════════════════════════════════════════════════════

/// Time of day assumed when an event carries only a date.
pub const DEFAULT_TIME_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(12, 0, 0) {
    Some(noon) => noon,
    None => NaiveTime::MIN,
};

/// A UTC calendar date with an optional time of day.
///
/// Ordering and equality use the *effective* moment: a missing time of day
/// is folded to noon UTC, so `2025-08-04` and `2025-08-04 12:00` compare
/// equal.
#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseTimestamp {
    date: NaiveDate,
    time: Option<NaiveTime>,
}

impl PhaseTimestamp {
    pub const fn new(date: NaiveDate, time: Option<NaiveTime>) -> Self {
        Self { date, time }
    }

    /// Date with an explicit time of day.
    pub const fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self::new(date, Some(time))
    }

    /// Date with an unknown time of day.
    pub const fn on(date: NaiveDate) -> Self {
        Self::new(date, None)
    }

    #[inline]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[inline]
    pub const fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    /// Time of day, or noon when unknown.
    #[inline]
    pub fn time_or_default(&self) -> NaiveTime {
        self.time.unwrap_or(DEFAULT_TIME_OF_DAY)
    }

    /// The instant used for ordering and duration arithmetic.
    pub fn effective(&self) -> DateTime<Utc> {
        self.date.and_time(self.time_or_default()).and_utc()
    }
}

impl From<DateTime<Utc>> for PhaseTimestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::at(datetime.date_naive(), datetime.time())
    }
}

impl PartialEq for PhaseTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PhaseTimestamp {}

impl PartialOrd for PhaseTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PhaseTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.time_or_default().cmp(&other.time_or_default()))
    }
}

impl fmt::Display for PhaseTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(time) => write!(f, "{} at {}", self.date.format("%Y-%m-%d"), time.format("%H:%M")),
            None => write!(f, "{} at unknown time", self.date.format("%Y-%m-%d")),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MajorPhaseEvent
// ═══════════════════════════════════════════════════════════════════════════

/// A classified phase occurrence.
///
/// Despite the name this also carries the derived intermediate phases; the
/// [`origin`](Self::origin) tells them apart.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "EventFields"))]
pub struct MajorPhaseEvent {
    kind: PhaseKind,
    timestamp: PhaseTimestamp,
    origin: EventOrigin,
}

impl MajorPhaseEvent {
    /// Build an event, checking that `origin` admits `kind`.
    pub fn new(
        kind: PhaseKind,
        timestamp: PhaseTimestamp,
        origin: EventOrigin,
    ) -> Result<Self, EventError> {
        if !origin.admits(kind) {
            return Err(EventError { kind, origin });
        }
        Ok(Self {
            kind,
            timestamp,
            origin,
        })
    }

    /// An event reported by the phase source. `kind` must be major.
    pub fn observed(kind: PhaseKind, timestamp: PhaseTimestamp) -> Result<Self, EventError> {
        Self::new(kind, timestamp, EventOrigin::Observed)
    }

    pub(crate) const fn interpolated(kind: PhaseKind, timestamp: PhaseTimestamp) -> Self {
        Self {
            kind,
            timestamp,
            origin: EventOrigin::Interpolated,
        }
    }

    pub(crate) const fn estimated(kind: PhaseKind, timestamp: PhaseTimestamp) -> Self {
        Self {
            kind,
            timestamp,
            origin: EventOrigin::Estimated,
        }
    }

    #[inline]
    pub const fn kind(&self) -> PhaseKind {
        self.kind
    }

    #[inline]
    pub const fn timestamp(&self) -> PhaseTimestamp {
        self.timestamp
    }

    #[inline]
    pub const fn origin(&self) -> EventOrigin {
        self.origin
    }

    #[inline]
    pub const fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    #[inline]
    pub const fn time(&self) -> Option<NaiveTime> {
        self.timestamp.time()
    }

    /// `true` unless the event came from the phase source.
    #[inline]
    pub fn is_derived(&self) -> bool {
        self.origin != EventOrigin::Observed
    }

    pub fn in_year(&self, year: i32) -> bool {
        self.date().year() == year
    }

    pub fn in_month(&self, year: i32, month: u32) -> bool {
        self.in_year(year) && self.date().month() == month
    }
}

impl fmt::Display for MajorPhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} - {}", self.kind.symbol(), self.kind, self.timestamp)
    }
}

/// Unchecked wire shape; deserialisation goes through [`MajorPhaseEvent::new`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct EventFields {
    kind: PhaseKind,
    timestamp: PhaseTimestamp,
    origin: EventOrigin,
}

#[cfg(feature = "serde")]
impl TryFrom<EventFields> for MajorPhaseEvent {
    type Error = EventError;

    fn try_from(fields: EventFields) -> Result<Self, Self::Error> {
        Self::new(fields.kind, fields.timestamp, fields.origin)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PhaseRecord
// ═══════════════════════════════════════════════════════════════════════════

/// Raw phase entry as published by the remote phase service
/// (`{"phase": "Full Moon", "year": 2025, "month": 8, "day": 9, "time": "07:55"}`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseRecord {
    pub phase: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub time: Option<String>,
}

impl PhaseRecord {
    pub fn new(phase: impl Into<String>, year: i32, month: u32, day: u32) -> Self {
        Self {
            phase: phase.into(),
            year,
            month,
            day,
            time: None,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

impl TryFrom<&PhaseRecord> for MajorPhaseEvent {
    type Error = RecordError;

    fn try_from(record: &PhaseRecord) -> Result<Self, Self::Error> {
        let kind: PhaseKind = record.phase.parse()?;
        if !kind.is_major() {
            return Err(RecordError::NotMajor(kind));
        }
        let date = NaiveDate::from_ymd_opt(record.year, record.month, record.day).ok_or(
            RecordError::InvalidDate {
                year: record.year,
                month: record.month,
                day: record.day,
            },
        )?;
        let time = record
            .time
            .as_deref()
            .map(|raw| {
                NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                    .map_err(|_| RecordError::InvalidTime(raw.to_string()))
            })
            .transpose()?;

        Ok(Self {
            kind,
            timestamp: PhaseTimestamp::new(date, time),
            origin: EventOrigin::Observed,
        })
    }
}

impl TryFrom<PhaseRecord> for MajorPhaseEvent {
    type Error = RecordError;

    fn try_from(record: PhaseRecord) -> Result<Self, Self::Error> {
        MajorPhaseEvent::try_from(&record)
    }
}
