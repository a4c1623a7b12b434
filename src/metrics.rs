//! Pure derived metrics. Nothing here caches or mutates; callers recompute
//! from the current collections on every render.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::{Course, Task};

/// Per-course completion percentage. A course with no tasks reports 0
/// rather than dividing by zero.
pub fn course_progress(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}

/// Completion percentage across all courses, from the denormalized
/// counters. Courses with no tasks contribute nothing to either sum.
pub fn aggregate_progress(courses: &[Course]) -> u32 {
    let total: u32 = courses.iter().map(|c| c.task_count).sum();
    let completed: u32 = courses.iter().map(|c| c.completed_tasks).sum();
    course_progress(completed, total)
}

/// Detail-view progress from the live task list, not the counters.
pub fn tasks_progress(tasks: &[Task]) -> u32 {
    let completed = tasks.iter().filter(|t| t.completed).count() as u32;
    course_progress(completed, tasks.len() as u32)
}

/// Time left until a deadline, for display. Past deadlines are the literal
/// state `Overdue`, never a negative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Overdue,
    Remaining { days: i64, hours: i64, minutes: i64 },
}

impl Countdown {
    pub fn until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let left = deadline - now;
        if left < TimeDelta::zero() {
            return Countdown::Overdue;
        }
        let days = left.num_days();
        let hours = left.num_hours() - days * 24;
        let minutes = left.num_minutes() - left.num_hours() * 60;
        Countdown::Remaining {
            days,
            hours,
            minutes,
        }
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, Countdown::Overdue)
    }
}

/// The largest two non-zero units among days, hours and minutes.
impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Overdue => f.write_str("Overdue"),
            Countdown::Remaining {
                days,
                hours,
                minutes,
            } => {
                if *days > 0 {
                    write!(f, "{}d {}h", days, hours)
                } else if *hours > 0 {
                    write!(f, "{}h {}m", hours, minutes)
                } else {
                    write!(f, "{}m", minutes)
                }
            }
        }
    }
}

/// One chart row per course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSlice {
    pub name: String,
    pub completed: u32,
    pub total: u32,
    pub progress: u32,
}

pub fn chart_slices(courses: &[Course]) -> Vec<ChartSlice> {
    courses
        .iter()
        .map(|c| ChartSlice {
            name: truncate_name(c.display_title()),
            completed: c.completed_tasks,
            total: c.task_count,
            progress: course_progress(c.completed_tasks, c.task_count),
        })
        .collect()
}

fn truncate_name(title: &str) -> String {
    if title.chars().count() > 15 {
        let head: String = title.chars().take(15).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn course(task_count: u32, completed_tasks: u32) -> Course {
        Course {
            id: format!("c-{}-{}", task_count, completed_tasks),
            title: "Course".to_string(),
            description: String::new(),
            task_count,
            completed_tasks,
        }
    }

    #[test]
    fn empty_course_reports_zero_progress() {
        assert_eq!(course_progress(0, 0), 0);
    }

    #[test]
    fn progress_stays_within_bounds() {
        for total in 0..=10u32 {
            for completed in 0..=total {
                let p = course_progress(completed, total);
                assert!(p <= 100);
                if total > 0 {
                    assert_eq!(p == 100, completed == total);
                }
            }
        }
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        assert_eq!(course_progress(1, 3), 33);
        assert_eq!(course_progress(2, 3), 67);
        assert_eq!(course_progress(1, 2), 50);
    }

    #[test]
    fn aggregate_of_no_courses_is_zero() {
        assert_eq!(aggregate_progress(&[]), 0);
    }

    #[test]
    fn empty_course_does_not_drag_the_aggregate() {
        let courses = vec![course(4, 2), course(0, 0)];
        assert_eq!(aggregate_progress(&courses), 50);
    }

    #[test]
    fn ninety_minutes_out_reads_one_hour_thirty() {
        let now = Utc::now();
        let countdown = Countdown::until(now + TimeDelta::minutes(90), now);
        assert_eq!(countdown.to_string(), "1h 30m");
    }

    #[test]
    fn past_deadline_reads_overdue() {
        let now = Utc::now();
        let countdown = Countdown::until(now - TimeDelta::minutes(10), now);
        assert_eq!(countdown, Countdown::Overdue);
        assert_eq!(countdown.to_string(), "Overdue");
    }

    #[test]
    fn multi_day_countdown_drops_minutes() {
        let now = Utc::now();
        let countdown = Countdown::until(now + TimeDelta::minutes(3 * 24 * 60 + 125), now);
        assert_eq!(countdown.to_string(), "3d 2h");
    }

    #[test]
    fn sub_hour_countdown_shows_minutes_only() {
        let now = Utc::now();
        let countdown = Countdown::until(now + TimeDelta::minutes(45), now);
        assert_eq!(countdown.to_string(), "45m");
    }

    #[test]
    fn chart_truncates_long_titles() {
        let mut c = course(4, 2);
        c.title = "Advanced Multivariable Calculus".to_string();
        let slices = chart_slices(&[c]);
        assert_eq!(slices[0].name, "Advanced Multiv...");
        assert_eq!(slices[0].progress, 50);
    }

    #[test]
    fn chart_labels_untitled_courses() {
        let mut c = course(0, 0);
        c.title = String::new();
        let slices = chart_slices(&[c]);
        assert_eq!(slices[0].name, "Untitled");
        assert_eq!(slices[0].progress, 0);
    }
}
