// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Continuous Julian Day instants.
//!
//! [`JulianDay`] stores a single [`Days`] quantity counted from the Julian
//! Period epoch (−4712-01-01T12:00 on the proleptic Julian calendar). It is
//! the time axis of the [`AnalyticPhaseCalculator`](crate::AnalyticPhaseCalculator).
//!
//! Values live on the **UT** axis: a civil UTC timestamp converts by a pure
//! epoch offset, with no ΔT correction. The lunar reference epoch used by the
//! calculator is tabulated in UT as well, so both ends of every subtraction
//! share the same axis.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use qtty::*;
use std::ops::{Add, AddAssign, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// JD of the Unix epoch, 1970-01-01T00:00:00 UTC.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// A point on the continuous Julian Day count (UT).
///
/// `Copy` and layout-identical to a single `f64`.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct JulianDay {
    quantity: Days,
}

impl JulianDay {
    /// J2000.0 epoch: 2000-01-01T12:00:00 (JD 2 451 545.0).
    pub const J2000: Self = Self::new(2_451_545.0);

    /// Create from a raw Julian Day number.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self {
            quantity: Days::new(value),
        }
    }

    /// Create from a [`Days`] quantity.
    #[inline]
    pub const fn from_days(days: Days) -> Self {
        Self { quantity: days }
    }

    /// The underlying quantity in days.
    #[inline]
    pub const fn quantity(&self) -> Days {
        self.quantity
    }

    /// The underlying scalar value in days.
    #[inline]
    pub const fn value(&self) -> f64 {
        self.quantity.value()
    }

    /// Build an instant from a `chrono::DateTime<Utc>`.
    pub fn from_utc(datetime: DateTime<Utc>) -> Self {
        let seconds_since_epoch = Seconds::new(datetime.timestamp() as f64);
        let nanos = Seconds::new(datetime.timestamp_subsec_nanos() as f64 / 1e9);
        Self::from_days(Days::new(UNIX_EPOCH_JD) + (seconds_since_epoch + nanos).to::<Day>())
    }

    /// Convert to a `chrono::DateTime<Utc>`.
    ///
    /// Returns `None` if the value falls outside chrono's representable range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let since_epoch: Seconds = (self.quantity - Days::new(UNIX_EPOCH_JD)).to::<Second>();
        if !since_epoch.value().is_finite() {
            return None;
        }
        let whole = Seconds::new(since_epoch.value().floor());
        let subsec: Nanoseconds = (since_epoch - whole).to::<Nanosecond>();
        let nanos = (subsec.value() as u32).min(999_999_999);
        DateTime::<Utc>::from_timestamp(whole.value() as i64, nanos)
    }
}

impl std::fmt::Display for JulianDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Julian Day: {}", self.quantity)
    }
}

#[cfg(feature = "serde")]
impl Serialize for JulianDay {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: Serializer,
    {
        serializer.serialize_f64(self.value())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for JulianDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = f64::deserialize(deserializer)?;
        Ok(Self::new(v))
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────────

impl Add<Days> for JulianDay {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Days) -> Self::Output {
        Self::from_days(self.quantity + rhs)
    }
}

impl AddAssign<Days> for JulianDay {
    #[inline]
    fn add_assign(&mut self, rhs: Days) {
        self.quantity += rhs;
    }
}

impl Sub<Days> for JulianDay {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Days) -> Self::Output {
        Self::from_days(self.quantity - rhs)
    }
}

impl SubAssign<Days> for JulianDay {
    #[inline]
    fn sub_assign(&mut self, rhs: Days) {
        self.quantity -= rhs;
    }
}

impl Sub for JulianDay {
    type Output = Days;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.quantity - rhs.quantity
    }
}

impl From<Days> for JulianDay {
    #[inline]
    fn from(days: Days) -> Self {
        Self::from_days(days)
    }
}

impl From<JulianDay> for Days {
    #[inline]
    fn from(jd: JulianDay) -> Self {
        jd.quantity
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ToJulianDay
// ═══════════════════════════════════════════════════════════════════════════

/// Anything that names a single instant in UTC.
///
/// Calendar dates without a time of day resolve to **noon UTC**, the same
/// default the phase events use.
pub trait ToJulianDay {
    fn to_julian_day(&self) -> JulianDay;
}

impl ToJulianDay for JulianDay {
    #[inline]
    fn to_julian_day(&self) -> JulianDay {
        *self
    }
}

impl ToJulianDay for DateTime<Utc> {
    #[inline]
    fn to_julian_day(&self) -> JulianDay {
        JulianDay::from_utc(*self)
    }
}

impl ToJulianDay for NaiveDateTime {
    #[inline]
    fn to_julian_day(&self) -> JulianDay {
        JulianDay::from_utc(self.and_utc())
    }
}

impl ToJulianDay for NaiveDate {
    #[inline]
    fn to_julian_day(&self) -> JulianDay {
        self.and_time(NaiveTime::MIN).to_julian_day() + Days::new(0.5)
    }
}

impl<T: ToJulianDay + ?Sized> ToJulianDay for &T {
    #[inline]
    fn to_julian_day(&self) -> JulianDay {
        (**self).to_julian_day()
    }
}
