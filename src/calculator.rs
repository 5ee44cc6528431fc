// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Closed-form lunar phase and illumination.
//!
//! The Moon's age is measured from a documented new moon,
//! JD 2 451 550.26 (2000-01-06 18:14 UTC), modulo the mean synodic month:
//!
//! ```text
//! age            = (JD − JD₀) mod P
//! cycle position = age / P                     ∈ [0, 1)
//! illumination   = (1 − cos 2π·position) / 2   ∈ [0, 1]
//! ```
//!
//! This ignores the Moon's orbital eccentricity, so phase instants can be off
//! by up to roughly half a day. It needs no network access and is suitable
//! for labelling an arbitrary instant.

use crate::error::CalculatorError;
use crate::interpolation::SYNODIC_MONTH;
use crate::julian::{JulianDay, ToJulianDay};
use crate::phase::PhaseKind;
use qtty::Days;
use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A documented new moon: 2000-01-06 18:14 UTC.
pub const REFERENCE_NEW_MOON: JulianDay = JulianDay::new(2_451_550.26);

/// Lower bound of each named phase, in ascending cycle position.
const PHASE_BOUNDARIES: [(f64, PhaseKind); 8] = [
    (0.0, PhaseKind::NewMoon),
    (0.0625, PhaseKind::WaxingCrescent),
    (0.1875, PhaseKind::FirstQuarter),
    (0.3125, PhaseKind::WaxingGibbous),
    (0.4375, PhaseKind::FullMoon),
    (0.5625, PhaseKind::WaningGibbous),
    (0.6875, PhaseKind::LastQuarter),
    (0.8125, PhaseKind::WaningCrescent),
];

/// The Moon's state at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseReading {
    pub julian_day: JulianDay,
    pub kind: PhaseKind,
    /// Fraction of the synodic month elapsed, in `[0, 1)`.
    pub cycle_position: f64,
    /// Days since the last (mean) new moon.
    #[cfg_attr(feature = "serde", serde(with = "days_as_f64"))]
    pub lunar_age: Days,
    /// Illuminated fraction of the disc in percent, two decimals.
    pub illumination: f64,
}

/// Stateless phase calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticPhaseCalculator {
    reference_new_moon: JulianDay,
    synodic_month: Days,
}

impl Default for AnalyticPhaseCalculator {
    fn default() -> Self {
        Self {
            reference_new_moon: REFERENCE_NEW_MOON,
            synodic_month: SYNODIC_MONTH,
        }
    }
}

impl AnalyticPhaseCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different new-moon epoch and cycle length.
    ///
    /// The cycle length must be positive and finite, the epoch finite.
    pub fn with_reference(
        reference_new_moon: JulianDay,
        synodic_month: Days,
    ) -> Result<Self, CalculatorError> {
        if !reference_new_moon.value().is_finite() {
            return Err(CalculatorError::NonFiniteReference(
                reference_new_moon.value(),
            ));
        }
        let period = synodic_month.value();
        if !period.is_finite() || period <= 0.0 {
            return Err(CalculatorError::InvalidSynodicMonth(period));
        }
        Ok(Self {
            reference_new_moon,
            synodic_month,
        })
    }

    /// Days elapsed since the most recent mean new moon, in `[0, P)`.
    pub fn lunar_age<T: ToJulianDay>(&self, at: T) -> Days {
        let since = (at.to_julian_day() - self.reference_new_moon).value();
        let period = self.synodic_month.value();
        let age = since.rem_euclid(period);
        // rem_euclid may round up to exactly `period`
        Days::new(if age >= period { 0.0 } else { age })
    }

    /// Fraction of the synodic month elapsed at `at`, in `[0, 1)`.
    pub fn cycle_position<T: ToJulianDay>(&self, at: T) -> f64 {
        let position = self.lunar_age(at).value() / self.synodic_month.value();
        if position >= 1.0 {
            0.0
        } else {
            position
        }
    }

    /// Illuminated percentage of the disc at `at`.
    pub fn illumination<T: ToJulianDay>(&self, at: T) -> f64 {
        illumination_at_position(self.cycle_position(at))
    }

    /// Full reading for `at`.
    pub fn phase_at<T: ToJulianDay>(&self, at: T) -> PhaseReading {
        let julian_day = at.to_julian_day();
        let lunar_age = self.lunar_age(julian_day);
        let cycle_position = self.cycle_position(julian_day);
        PhaseReading {
            julian_day,
            kind: classify(cycle_position),
            cycle_position,
            lunar_age,
            illumination: illumination_at_position(cycle_position),
        }
    }
}

/// Name the phase for a cycle position.
///
/// Picks the highest boundary not above `cycle_position`; boundaries are
/// inclusive on their lower edge, so `0.0625` is already Waxing Crescent.
pub fn classify(cycle_position: f64) -> PhaseKind {
    PHASE_BOUNDARIES
        .iter()
        .rev()
        .find(|(threshold, _)| cycle_position >= *threshold)
        .map(|&(_, kind)| kind)
        .unwrap_or(PHASE_BOUNDARIES[0].1)
}

/// Illuminated percentage for a cycle position, rounded to two decimals.
pub fn illumination_at_position(cycle_position: f64) -> f64 {
    let fraction = (1.0 - (TAU * cycle_position).cos()) / 2.0;
    (fraction * 100.0 * 100.0).round() / 100.0
}

#[cfg(feature = "serde")]
mod days_as_f64 {
    use qtty::Days;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(days: &Days, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(days.value())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Days, D::Error> {
        f64::deserialize(deserializer).map(Days::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn boundaries_are_lower_inclusive() {
        assert_eq!(classify(0.0625), PhaseKind::WaxingCrescent);
        assert_eq!(classify(0.062_499_99), PhaseKind::NewMoon);
        assert_eq!(classify(0.0), PhaseKind::NewMoon);
        assert_eq!(classify(0.999_999), PhaseKind::WaningCrescent);
        for (threshold, kind) in PHASE_BOUNDARIES {
            assert_eq!(classify(threshold), kind);
        }
    }

    #[test]
    fn classify_falls_back_to_new_moon_below_zero() {
        assert_eq!(classify(-0.1), PhaseKind::NewMoon);
    }

    #[test]
    fn illumination_tracks_the_cosine_curve() {
        assert_eq!(illumination_at_position(0.0), 0.0);
        assert!((illumination_at_position(0.5) - 100.0).abs() < 1e-9);
        assert!((illumination_at_position(0.25) - 50.0).abs() < 1e-9);
        assert!((illumination_at_position(0.75) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn new_moon_shortly_after_the_epoch() {
        let calc = AnalyticPhaseCalculator::new();
        let reading = calc.phase_at(Utc.with_ymd_and_hms(2000, 1, 7, 6, 0, 0).unwrap());

        assert_eq!(reading.kind, PhaseKind::NewMoon);
        assert!(reading.illumination < 2.0);
        assert!((reading.lunar_age.value() - 0.5).abs() < 1.0);
    }

    #[test]
    fn full_moon_of_june_2025() {
        let calc = AnalyticPhaseCalculator::new();
        let at = Utc.with_ymd_and_hms(2025, 6, 11, 7, 44, 0).unwrap();
        let reading = calc.phase_at(at);

        assert_eq!(reading.kind, PhaseKind::FullMoon);
        assert!((reading.illumination - 100.0).abs() < 5.0);
        assert!((reading.lunar_age.value() - SYNODIC_MONTH.value() / 2.0).abs() < 1.5);
        assert_eq!(calc.illumination(at), reading.illumination);
    }

    #[test]
    fn first_quarter_is_about_half_lit() {
        let calc = AnalyticPhaseCalculator::new();
        let illumination = calc.illumination(Utc.with_ymd_and_hms(2025, 6, 3, 3, 41, 0).unwrap());
        assert!((illumination - 50.0).abs() < 10.0);
    }

    #[test]
    fn calendar_dates_are_read_at_noon() {
        let calc = AnalyticPhaseCalculator::new();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let noon = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(calc.cycle_position(date), calc.cycle_position(noon));
    }

    #[test]
    fn readings_stay_in_range_across_centuries() {
        let calc = AnalyticPhaseCalculator::new();
        let mut jd = JulianDay::new(2_378_496.5); // 1800-01-01
        let end = JulianDay::new(2_488_069.5); // 2100-01-01
        while jd < end {
            let reading = calc.phase_at(jd);
            assert!((0.0..1.0).contains(&reading.cycle_position));
            assert!((0.0..=100.0).contains(&reading.illumination));
            assert!(reading.lunar_age >= Days::new(0.0));
            assert!(reading.lunar_age < SYNODIC_MONTH);
            jd += Days::new(3.7);
        }
    }

    #[test]
    fn custom_reference_epoch() {
        let calc =
            AnalyticPhaseCalculator::with_reference(JulianDay::J2000, Days::new(30.0)).unwrap();
        assert_eq!(calc.lunar_age(JulianDay::J2000), Days::new(0.0));
        assert!((calc.cycle_position(JulianDay::J2000 + Days::new(45.0)) - 0.5).abs() < 1e-12);
        assert!((calc.lunar_age(JulianDay::J2000 - Days::new(1.0)).value() - 29.0).abs() < 1e-9);
    }

    #[test]
    fn unusable_cycle_lengths_are_rejected() {
        for period in [0.0, -29.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    AnalyticPhaseCalculator::with_reference(JulianDay::J2000, Days::new(period)),
                    Err(CalculatorError::InvalidSynodicMonth(_))
                ),
                "period {period}"
            );
        }
        assert!(matches!(
            AnalyticPhaseCalculator::with_reference(JulianDay::new(f64::NAN), SYNODIC_MONTH),
            Err(CalculatorError::NonFiniteReference(_))
        ));
    }

    #[test]
    fn accepted_references_keep_readings_in_range() {
        let calc =
            AnalyticPhaseCalculator::with_reference(JulianDay::J2000, Days::new(1e-3)).unwrap();
        let reading = calc.phase_at(Utc.with_ymd_and_hms(2025, 8, 9, 7, 55, 0).unwrap());
        assert!((0.0..1.0).contains(&reading.cycle_position));
        assert!((0.0..=100.0).contains(&reading.illumination));
    }
}
