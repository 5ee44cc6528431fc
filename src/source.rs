// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! The upstream phase data seam.
//!
//! A [`PhaseSource`] answers [`PhaseRequest`]s with observed major phases. No
//! transport ships with this crate; callers wrap their own HTTP client, file
//! reader or fixture. Sources that receive raw [`PhaseRecord`]s can use
//! [`events_from_records`] for the conversion.

use crate::error::FetchError;
use crate::phase::{MajorPhaseEvent, PhaseRecord};
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;

/// What to ask the phase source for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseRequest {
    /// `count` consecutive major phases starting on `start`.
    FromDate { start: NaiveDate, count: u32 },
    /// Every major phase of a calendar year.
    Year(i32),
}

impl fmt::Display for PhaseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseRequest::FromDate { start, count } => {
                write!(f, "{} phase(s) from {}", count, start.format("%Y-%m-%d"))
            }
            PhaseRequest::Year(year) => write!(f, "phases of {}", year),
        }
    }
}

/// Producer of observed major phases.
///
/// Implementations return events in any order; callers sort. Failures are
/// reported as [`FetchError`] and are not retried by this crate.
pub trait PhaseSource {
    fn fetch_major_phases(&self, request: &PhaseRequest)
        -> Result<Vec<MajorPhaseEvent>, FetchError>;
}

impl<S: PhaseSource + ?Sized> PhaseSource for &S {
    fn fetch_major_phases(
        &self,
        request: &PhaseRequest,
    ) -> Result<Vec<MajorPhaseEvent>, FetchError> {
        (**self).fetch_major_phases(request)
    }
}

impl<S: PhaseSource + ?Sized> PhaseSource for Box<S> {
    fn fetch_major_phases(
        &self,
        request: &PhaseRequest,
    ) -> Result<Vec<MajorPhaseEvent>, FetchError> {
        (**self).fetch_major_phases(request)
    }
}

impl<S: PhaseSource + ?Sized> PhaseSource for Arc<S> {
    fn fetch_major_phases(
        &self,
        request: &PhaseRequest,
    ) -> Result<Vec<MajorPhaseEvent>, FetchError> {
        (**self).fetch_major_phases(request)
    }
}

/// Convert raw records, dropping (and logging) the ones that don't parse.
pub fn events_from_records<'a, I>(records: I) -> Vec<MajorPhaseEvent>
where
    I: IntoIterator<Item = &'a PhaseRecord>,
{
    records
        .into_iter()
        .filter_map(|record| match MajorPhaseEvent::try_from(record) {
            Ok(event) => Some(event),
            Err(err) => {
                log::warn!("skipping phase record {:?}: {}", record, err);
                None
            }
        })
        .collect()
}
