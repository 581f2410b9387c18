// src/services/streak.rs

//! Consecutive-day visit tracking.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitUpdate {
    pub last_visit_date: NaiveDate,
    pub current_streak: i32,
    /// `false` when this is a repeat visit on the same day.
    pub changed: bool,
}

/// Records a visit on `today`.
///
/// Same day: nothing changes. Day after the last visit: streak + 1.
/// Anything else, including no previous visit: streak restarts at 1.
pub fn touch_visit(last_visit: Option<NaiveDate>, streak: i32, today: NaiveDate) -> VisitUpdate {
    let gap = last_visit.map(|last| today.signed_duration_since(last).num_days());

    match gap {
        Some(0) => VisitUpdate {
            last_visit_date: today,
            current_streak: streak,
            changed: false,
        },
        Some(1) => VisitUpdate {
            last_visit_date: today,
            current_streak: streak.saturating_add(1),
            changed: true,
        },
        _ => VisitUpdate {
            last_visit_date: today,
            current_streak: 1,
            changed: true,
        },
    }
}
