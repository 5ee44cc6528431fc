// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Plain-text phase listings.

use crate::phase::MajorPhaseEvent;
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// English name of `month` (1-based).
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    MONTH_NAMES.get(index).copied()
}

/// A titled listing of phase events.
///
/// ```text
/// August 2025
/// ===========
///
///  🌑 New Moon - 2025-08-04 at 11:13
/// ~🌒 Waxing Crescent - 2025-08-08 at 13:16
///
/// Total: 2 phase(s) (1 major, 1 interpolated)
/// ~ indicates interpolated phases
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PhaseReport<'a> {
    events: &'a [MajorPhaseEvent],
    title: Option<&'a str>,
}

impl<'a> PhaseReport<'a> {
    pub fn new(events: &'a [MajorPhaseEvent]) -> Self {
        Self {
            events,
            title: None,
        }
    }

    pub fn with_title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }
}

impl fmt::Display for PhaseReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.events.is_empty() {
            return f.write_str("No phases found.");
        }

        if let Some(title) = self.title {
            writeln!(f, "{}", title)?;
            writeln!(f, "{}", "=".repeat(title.chars().count()))?;
            writeln!(f)?;
        }

        for event in self.events {
            let marker = if event.is_derived() { '~' } else { ' ' };
            writeln!(f, "{}{}", marker, event)?;
        }
        writeln!(f)?;

        let derived = self.events.iter().filter(|e| e.is_derived()).count();
        let total = self.events.len();
        if derived == 0 {
            write!(f, "Total: {} phase(s)", total)
        } else {
            writeln!(
                f,
                "Total: {} phase(s) ({} major, {} interpolated)",
                total,
                total - derived,
                derived
            )?;
            f.write_str("~ indicates interpolated phases")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{PhaseKind, PhaseTimestamp};
    use chrono::{NaiveDate, NaiveTime};

    fn at(d: u32, h: u32, m: u32) -> PhaseTimestamp {
        PhaseTimestamp::at(
            NaiveDate::from_ymd_opt(2025, 8, d).unwrap(),
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        )
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn empty_listing() {
        assert_eq!(
            PhaseReport::new(&[]).with_title("Nothing").to_string(),
            "No phases found."
        );
    }

    #[test]
    fn observed_only_listing() {
        let events = [MajorPhaseEvent::observed(PhaseKind::FullMoon, at(9, 7, 55)).unwrap()];
        let text = PhaseReport::new(&events).to_string();
        assert_eq!(text, format!(" {}\n\nTotal: 1 phase(s)", events[0]));
    }

    #[test]
    fn mixed_listing_marks_derived_events() {
        let events = [
            MajorPhaseEvent::observed(PhaseKind::NewMoon, at(4, 11, 13)).unwrap(),
            MajorPhaseEvent::interpolated(PhaseKind::WaxingCrescent, at(8, 13, 16)),
        ];
        let text = PhaseReport::new(&events).with_title("August 2025").to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "August 2025");
        assert_eq!(lines[1], "===========");
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with(' '));
        assert!(lines[4].starts_with('~'));
        assert!(lines[4].contains("Waxing Crescent"));
        assert_eq!(lines[6], "Total: 2 phase(s) (1 major, 1 interpolated)");
        assert_eq!(lines[7], "~ indicates interpolated phases");
    }
}
