// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Phase queries: rate limiter → source → interpolation.
//!
//! | Query | Fetches | Returns |
//! |-------|---------|---------|
//! | [`phases_for_year`](Tracker::phases_for_year) | `Year(y)` | observed phases of `y` |
//! | [`phases_for_month`](Tracker::phases_for_month) | `Year(y)` | observed phases of `y-m` |
//! | [`phases_from_date`](Tracker::phases_from_date) | `FromDate` | `count` observed phases |
//! | [`next_phase_from`](Tracker::next_phase_from) | `FromDate`, count 1 | the first phase on or after a date |
//! | [`all_phases_for_year`](Tracker::all_phases_for_year) | `Year(y)` | expanded phases |
//! | [`all_phases_for_month`](Tracker::all_phases_for_month) | `Year(y)` | `y-m` majors expanded, then cut to `y-m` |
//! | [`all_phases_from_date`](Tracker::all_phases_from_date) | `FromDate`, `4 × cycles` | expanded phases |
//!
//! [`next_phase`](Tracker::next_phase),
//! [`current_month_phases`](Tracker::current_month_phases) and
//! [`current_year_phases`](Tracker::current_year_phases) run the same
//! queries for today's UTC date.
//!
//! Every query makes exactly one source call, and every source call first
//! waits on the shared [`RateLimiter`].

use crate::error::{ConfigError, TrackerError};
use crate::interpolation::PhaseInterpolationEngine;
use crate::phase::MajorPhaseEvent;
use crate::rate_limit::RateLimiter;
use crate::source::{PhaseRequest, PhaseSource};
use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;

/// Earliest year the tracker will ask about.
pub const MIN_YEAR: i32 = 1700;

/// How far past the current year queries may reach.
pub const MAX_YEARS_AHEAD: i32 = 10;

/// Largest number of phases one `FromDate` request may ask for.
pub const MAX_PHASES_PER_REQUEST: u32 = 99;

/// Major phases per synodic month.
const PHASES_PER_CYCLE: u32 = 4;

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Query front end over a [`PhaseSource`].
#[derive(Debug)]
pub struct Tracker<S> {
    source: S,
    limiter: Arc<RateLimiter>,
    engine: PhaseInterpolationEngine,
}

impl<S: PhaseSource> Tracker<S> {
    /// Tracker sharing `limiter` with whoever else holds it.
    pub fn new(source: S, limiter: Arc<RateLimiter>) -> Self {
        Self {
            source,
            limiter,
            engine: PhaseInterpolationEngine::default(),
        }
    }

    /// Tracker with a limiter configured from the environment.
    pub fn from_env(source: S) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(source, Arc::new(RateLimiter::from_env()?)))
    }

    /// Replace the interpolation settings used by the `all_*` queries.
    pub fn with_engine(mut self, engine: PhaseInterpolationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn engine(&self) -> &PhaseInterpolationEngine {
        &self.engine
    }

    pub fn phases_for_year(&self, year: i32) -> Result<Vec<MajorPhaseEvent>> {
        validate_year(year)?;
        self.fetch(PhaseRequest::Year(year))
    }

    pub fn phases_for_month(&self, year: i32, month: u32) -> Result<Vec<MajorPhaseEvent>> {
        validate_month(month)?;
        let mut events = self.phases_for_year(year)?;
        events.retain(|event| event.in_month(year, month));
        Ok(events)
    }

    pub fn phases_from_date(&self, start: NaiveDate, count: u32) -> Result<Vec<MajorPhaseEvent>> {
        validate_year(start.year())?;
        validate_count(count)?;
        self.fetch(PhaseRequest::FromDate { start, count })
    }

    /// The first observed phase on or after `date`.
    pub fn next_phase_from(&self, date: NaiveDate) -> Result<Option<MajorPhaseEvent>> {
        Ok(self.phases_from_date(date, 1)?.into_iter().next())
    }

    /// The first observed phase from today (UTC) on.
    pub fn next_phase(&self) -> Result<Option<MajorPhaseEvent>> {
        self.next_phase_from(today())
    }

    pub fn current_month_phases(&self) -> Result<Vec<MajorPhaseEvent>> {
        let today = today();
        self.phases_for_month(today.year(), today.month())
    }

    pub fn current_year_phases(&self) -> Result<Vec<MajorPhaseEvent>> {
        self.phases_for_year(today().year())
    }

    pub fn all_phases_for_year(&self, year: i32) -> Result<Vec<MajorPhaseEvent>> {
        let majors = self.phases_for_year(year)?;
        Ok(self.engine.expand(&majors))
    }

    /// Expanded phases falling in `year-month`.
    ///
    /// Only the month's own major phases are expanded. The cycle extension
    /// supplies the closing Waning Crescent; nothing is derived from the
    /// previous month's majors.
    pub fn all_phases_for_month(&self, year: i32, month: u32) -> Result<Vec<MajorPhaseEvent>> {
        let majors = self.phases_for_month(year, month)?;
        let mut events = self.engine.expand(&majors);
        events.retain(|event| event.in_month(year, month));
        Ok(events)
    }

    /// Expanded phases covering `cycles` synodic months from `start`.
    pub fn all_phases_from_date(
        &self,
        start: NaiveDate,
        cycles: u32,
    ) -> Result<Vec<MajorPhaseEvent>> {
        let count = cycles.checked_mul(PHASES_PER_CYCLE).ok_or_else(|| {
            TrackerError::InvalidRequest(format!("{} cycles is too many", cycles))
        })?;
        let majors = self.phases_from_date(start, count)?;
        Ok(self.engine.expand(&majors))
    }

    fn fetch(&self, request: PhaseRequest) -> Result<Vec<MajorPhaseEvent>> {
        self.limiter.acquire();
        log::debug!("fetching {}", request);
        let mut events = self
            .source
            .fetch_major_phases(&request)
            .inspect_err(|err| log::debug!("fetch of {} failed: {}", request, err))?;
        events.sort_by_key(MajorPhaseEvent::timestamp);
        Ok(events)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn validate_year(year: i32) -> Result<()> {
    let max = Utc::now().year().saturating_add(MAX_YEARS_AHEAD);
    if (MIN_YEAR..=max).contains(&year) {
        Ok(())
    } else {
        Err(TrackerError::InvalidRequest(format!(
            "year must be between {} and {}, got {}",
            MIN_YEAR, max, year
        )))
    }
}

fn validate_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(TrackerError::InvalidRequest(format!(
            "month must be between 1 and 12, got {}",
            month
        )))
    }
}

fn validate_count(count: u32) -> Result<()> {
    if (1..=MAX_PHASES_PER_REQUEST).contains(&count) {
        Ok(())
    } else {
        Err(TrackerError::InvalidRequest(format!(
            "number of phases must be between 1 and {}, got {}",
            MAX_PHASES_PER_REQUEST, count
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::phase::{EventOrigin, PhaseKind, PhaseTimestamp};
    use crate::rate_limit::{Clock, ManualClock, RateLimitConfig};
    use chrono::NaiveTime;
    use std::sync::Mutex;
    use std::time::Duration;

    fn event(kind: PhaseKind, m: u32, d: u32, h: u32, min: u32) -> MajorPhaseEvent {
        MajorPhaseEvent::observed(
            kind,
            PhaseTimestamp::at(
                NaiveDate::from_ymd_opt(2025, m, d).unwrap(),
                NaiveTime::from_hms_opt(h, min, 0).unwrap(),
            ),
        )
        .unwrap()
    }

    fn summer_2025() -> Vec<MajorPhaseEvent> {
        // Deliberately out of order.
        vec![
            event(PhaseKind::FullMoon, 8, 19, 18, 26),
            event(PhaseKind::NewMoon, 8, 4, 11, 13),
            event(PhaseKind::LastQuarter, 8, 26, 9, 26),
            event(PhaseKind::FirstQuarter, 8, 12, 15, 19),
            event(PhaseKind::LastQuarter, 7, 30, 2, 0),
        ]
    }

    #[derive(Debug, Default)]
    struct FixtureSource {
        events: Vec<MajorPhaseEvent>,
        failure: Option<FetchError>,
        requests: Mutex<Vec<PhaseRequest>>,
    }

    impl FixtureSource {
        fn with_events(events: Vec<MajorPhaseEvent>) -> Self {
            Self {
                events,
                ..Self::default()
            }
        }

        fn failing(err: FetchError) -> Self {
            Self {
                failure: Some(err),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<PhaseRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl PhaseSource for FixtureSource {
        fn fetch_major_phases(
            &self,
            request: &PhaseRequest,
        ) -> std::result::Result<Vec<MajorPhaseEvent>, FetchError> {
            self.requests.lock().unwrap().push(*request);
            if let Some(err) = &self.failure {
                return Err(err.clone());
            }
            Ok(match *request {
                PhaseRequest::Year(year) => self
                    .events
                    .iter()
                    .filter(|e| e.in_year(year))
                    .copied()
                    .collect(),
                PhaseRequest::FromDate { start, count } => {
                    let mut sorted = self.events.clone();
                    sorted.sort_by_key(MajorPhaseEvent::timestamp);
                    sorted
                        .into_iter()
                        .filter(|e| e.date() >= start)
                        .take(count as usize)
                        .collect()
                }
            })
        }
    }

    fn unlimited(source: FixtureSource) -> Tracker<FixtureSource> {
        Tracker::new(source, Arc::new(RateLimiter::disabled()))
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn year_query_returns_sorted_observed_phases() {
        let tracker = unlimited(FixtureSource::with_events(summer_2025()));
        let phases = tracker.phases_for_year(2025).unwrap();

        assert_eq!(phases.len(), 5);
        assert!(phases.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
        assert!(phases.iter().all(|e| e.origin() == EventOrigin::Observed));
        assert_eq!(tracker.source().requests(), vec![PhaseRequest::Year(2025)]);
    }

    #[test]
    fn month_query_filters_the_year() {
        let tracker = unlimited(FixtureSource::with_events(summer_2025()));
        let august = tracker.phases_for_month(2025, 8).unwrap();
        assert_eq!(august.len(), 4);
        assert_eq!(august[0].kind(), PhaseKind::NewMoon);
        assert!(tracker.phases_for_month(2025, 3).unwrap().is_empty());
    }

    #[test]
    fn from_date_query_passes_count_through() {
        let tracker = unlimited(FixtureSource::with_events(summer_2025()));
        let phases = tracker.phases_from_date(date(8, 1), 2).unwrap();

        assert_eq!(
            phases.iter().map(MajorPhaseEvent::kind).collect::<Vec<_>>(),
            vec![PhaseKind::NewMoon, PhaseKind::FirstQuarter]
        );
        assert_eq!(
            tracker.source().requests(),
            vec![PhaseRequest::FromDate {
                start: date(8, 1),
                count: 2
            }]
        );
    }

    #[test]
    fn next_phase_is_the_first_on_or_after_the_date() {
        let tracker = unlimited(FixtureSource::with_events(summer_2025()));
        let next = tracker.next_phase_from(date(8, 13)).unwrap().unwrap();
        assert_eq!(next.kind(), PhaseKind::FullMoon);
        assert_eq!(tracker.next_phase_from(date(12, 1)).unwrap(), None);
    }

    #[test]
    fn current_queries_ask_about_today() {
        let tracker = unlimited(FixtureSource::default());
        let today = Utc::now().date_naive();

        tracker.next_phase().unwrap();
        tracker.current_month_phases().unwrap();
        tracker.current_year_phases().unwrap();

        assert_eq!(
            tracker.source().requests(),
            vec![
                PhaseRequest::FromDate {
                    start: today,
                    count: 1
                },
                PhaseRequest::Year(today.year()),
                PhaseRequest::Year(today.year()),
            ]
        );
    }

    #[test]
    fn all_phases_for_month_expands_only_that_months_majors() {
        let tracker = unlimited(FixtureSource::with_events(summer_2025()));
        let august = tracker.all_phases_for_month(2025, 8).unwrap();

        let mut august_majors: Vec<_> = summer_2025()
            .into_iter()
            .filter(|e| e.in_month(2025, 8))
            .collect();
        august_majors.sort_by_key(MajorPhaseEvent::timestamp);
        let mut expected = PhaseInterpolationEngine::default().expand(&august_majors);
        expected.retain(|e| e.in_month(2025, 8));
        assert_eq!(august, expected);

        // July's Last Quarter is not paired with August's New Moon.
        let kinds: Vec<_> = august.iter().map(MajorPhaseEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                PhaseKind::NewMoon,
                PhaseKind::WaxingCrescent,
                PhaseKind::FirstQuarter,
                PhaseKind::WaxingGibbous,
                PhaseKind::FullMoon,
                PhaseKind::WaningGibbous,
                PhaseKind::LastQuarter,
                PhaseKind::WaningCrescent,
            ]
        );
        assert_eq!(august.iter().filter(|e| e.is_derived()).count(), 4);
        assert!(august.iter().all(|e| e.date() > date(8, 1)));
    }

    #[test]
    fn all_phases_from_date_requests_four_per_cycle() {
        let tracker = unlimited(FixtureSource::with_events(summer_2025()));
        let phases = tracker.all_phases_from_date(date(8, 1), 1).unwrap();

        assert_eq!(
            tracker.source().requests(),
            vec![PhaseRequest::FromDate {
                start: date(8, 1),
                count: 4
            }]
        );
        assert_eq!(phases.len(), 8);
    }

    #[test]
    fn estimates_can_be_switched_on() {
        let tracker = unlimited(FixtureSource::with_events(summer_2025()))
            .with_engine(PhaseInterpolationEngine::new().with_estimates(true));
        let phases = tracker.all_phases_from_date(date(8, 1), 1).unwrap();
        let last = phases.last().unwrap();
        assert_eq!(last.origin(), EventOrigin::Estimated);
        assert_eq!(last.kind(), PhaseKind::NewMoon);
    }

    #[test]
    fn invalid_requests_never_reach_the_source() {
        let tracker = unlimited(FixtureSource::with_events(summer_2025()));

        for result in [
            tracker.phases_for_month(2025, 0),
            tracker.phases_for_month(2025, 13),
            tracker.phases_for_year(1699),
            tracker.phases_for_year(Utc::now().year() + 11),
            tracker.phases_from_date(date(8, 1), 0),
            tracker.phases_from_date(date(8, 1), 100),
            tracker.all_phases_from_date(date(8, 1), 25),
            tracker.all_phases_from_date(date(8, 1), u32::MAX),
        ] {
            assert!(matches!(result, Err(TrackerError::InvalidRequest(_))));
        }
        assert!(tracker.source().requests().is_empty());

        assert!(tracker.phases_from_date(date(8, 1), 99).is_ok());
        assert!(tracker.all_phases_from_date(date(8, 1), 24).is_ok());
    }

    #[test]
    fn fetch_errors_propagate_unchanged() {
        let tracker = unlimited(FixtureSource::failing(FetchError::Network(
            "connection refused".into(),
        )));
        assert_eq!(
            tracker.all_phases_for_year(2025),
            Err(TrackerError::Fetch(FetchError::Network(
                "connection refused".into()
            )))
        );
        assert_eq!(tracker.source().requests().len(), 1);
    }

    #[test]
    fn every_fetch_waits_on_the_limiter() {
        let clock = ManualClock::new();
        let limiter =
            RateLimiter::with_clock(&RateLimitConfig::new(1.0, 1), Arc::new(clock.clone()))
                .unwrap();
        let tracker = Tracker::new(FixtureSource::with_events(summer_2025()), Arc::new(limiter));

        tracker.phases_for_year(2025).unwrap();
        assert_eq!(clock.now(), Duration::ZERO);
        tracker.phases_for_month(2025, 8).unwrap();
        tracker.all_phases_for_year(2025).unwrap();

        assert!((clock.now().as_secs_f64() - 2.0).abs() < 1e-6);
        assert_eq!(tracker.limiter().snapshot().available_tokens(), Some(0));
    }

    #[test]
    fn invalid_requests_do_not_spend_tokens() {
        let clock = ManualClock::new();
        let limiter =
            RateLimiter::with_clock(&RateLimitConfig::new(1.0, 1), Arc::new(clock.clone()))
                .unwrap();
        let tracker = Tracker::new(FixtureSource::default(), Arc::new(limiter));

        assert!(tracker.phases_for_month(2025, 13).is_err());
        assert_eq!(tracker.limiter().snapshot().available_tokens(), Some(1));
    }
}
