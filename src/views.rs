//! Text rendering of cached state. Pure string builders so they can be
//! exercised without a terminal; `main` owns the actual I/O.

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use chrono::{DateTime, Utc};

use crate::metrics::{Countdown, aggregate_progress, chart_slices, tasks_progress};
use crate::models::{Course, Task};

const BAR_WIDTH: u32 = 20;

fn bar(progress: u32) -> String {
    let filled = (progress.min(100) * BAR_WIDTH / 100) as usize;
    let mut s = String::with_capacity(BAR_WIDTH as usize);
    s.extend(std::iter::repeat_n('#', filled));
    s.extend(std::iter::repeat_n('.', BAR_WIDTH as usize - filled));
    s
}

/// Aggregate chart plus the course list, recomputed from the cache contents
/// on every call.
pub fn render_dashboard(courses: &[Course]) -> String {
    let mut out = String::new();

    let total: u32 = courses.iter().map(|c| c.task_count).sum();
    let completed: u32 = courses.iter().map(|c| c.completed_tasks).sum();
    let overall = aggregate_progress(courses);
    let _ = writeln!(
        out,
        "Study Progress: {}%  ({}/{} tasks)",
        overall, completed, total
    );

    if courses.is_empty() {
        let _ = writeln!(
            out,
            "No courses yet. Create your first course to get started!"
        );
        return out;
    }

    for slice in chart_slices(courses) {
        let _ = writeln!(
            out,
            "  {:<18} [{}] {:>3}%  {}/{}",
            slice.name,
            bar(slice.progress),
            slice.progress,
            slice.completed,
            slice.total
        );
    }

    let _ = writeln!(out);
    for course in courses {
        let _ = writeln!(
            out,
            "{}  {}  ({} of {} done)",
            course.id,
            course.display_title(),
            course.completed_tasks,
            course.task_count
        );
        if !course.description.is_empty() {
            let _ = writeln!(out, "    {}", course.description);
        }
    }

    out
}

/// One course with its live task list. Progress here comes from the tasks
/// themselves, not the denormalized dashboard counters.
pub fn render_course(course: &Course, tasks: &[Task], now: DateTime<Utc>) -> String {
    let mut out = String::new();

    let done = tasks.iter().filter(|t| t.completed).count();
    let progress = tasks_progress(tasks);
    let _ = writeln!(out, "{}", course.display_title());
    if !course.description.is_empty() {
        let _ = writeln!(out, "{}", course.description);
    }
    let _ = writeln!(
        out,
        "Overall Progress: {}%  ({} of {} tasks completed)",
        progress,
        done,
        tasks.len()
    );
    let _ = writeln!(out);

    if tasks.is_empty() {
        let _ = writeln!(out, "No tasks yet. Add your first task to get started!");
        return out;
    }

    for task in tasks {
        if task.completed {
            let _ = writeln!(out, "  [x] {}  {}", task.id, task.goal);
        } else {
            let countdown = Countdown::until(task.deadline, now);
            let _ = writeln!(
                out,
                "  [ ] {}  {}  ({})  due {}",
                task.id,
                task.goal,
                countdown,
                task.deadline.format("%Y-%m-%d %H:%M")
            );
        }
    }

    out
}

/// Blocking y/N prompt. Destructive calls must not reach the gateway
/// without this returning true.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}: ", prompt);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().lock().read_line(&mut value)?;
    Ok(value.trim_end_matches(['\r', '\n']).to_string())
}
