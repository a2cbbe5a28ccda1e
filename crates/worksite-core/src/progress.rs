use crate::{Phase, Site, SiteStatus, Step, WorkStatus};
use chrono::{DateTime, Utc};

/// Clamps a caller-supplied progress value into `[0, 100]`.
///
/// Out-of-range input is clamped, never rejected. This mirrors the observed
/// behavior of the production system and is intentional; do not turn it into
/// a validation error.
pub fn clamp_progress(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

/// Rounded average of the step progresses, or `None` for an empty step list.
///
/// An empty list means the phase is a leaf: its own progress value stands and
/// no aggregation applies.
pub fn aggregate_phase_progress(steps: &[Step]) -> Option<u8> {
    if steps.is_empty() {
        return None;
    }
    let sum: u32 = steps.iter().map(|s| u32::from(s.progress)).sum();
    Some(round_mean(sum, steps.len()))
}

/// Rounded average of the phase progresses; an empty phase list yields 0.
pub fn aggregate_site_progress(phases: &[Phase]) -> u8 {
    if phases.is_empty() {
        return 0;
    }
    let sum: u32 = phases.iter().map(|p| u32::from(p.progress)).sum();
    round_mean(sum, phases.len())
}

fn round_mean(sum: u32, count: usize) -> u8 {
    (f64::from(sum) / count as f64).round() as u8
}

/// Total over 0..=100: `0` is pending, `100` completed, everything else in
/// progress. No blocked value exists at this level; locking is layered on top
/// by the dependency resolver and never stored.
pub fn work_status(progress: u8) -> WorkStatus {
    match progress {
        0 => WorkStatus::Pending,
        100 => WorkStatus::Completed,
        _ => WorkStatus::InProgress,
    }
}

/// Site-level status. Check order is load-bearing: completion and total
/// inactivity take precedence over the deadline, so a site finishing late is
/// `Completed`, not `Overdue`.
pub fn site_status(phases: &[Phase], planned_end: DateTime<Utc>, now: DateTime<Utc>) -> SiteStatus {
    let global = aggregate_site_progress(phases);
    if global == 100 {
        SiteStatus::Completed
    } else if global == 0 {
        SiteStatus::Awaiting
    } else if now > planned_end {
        SiteStatus::Overdue
    } else {
        SiteStatus::Active
    }
}

/// Re-derives every progress-derived field of the document from the raw leaf
/// values: step statuses, stepped-phase progress, phase statuses, and the
/// site-wide percentage. Returns the new global progress.
///
/// Does not touch `site.status`; that derivation needs a clock and stays with
/// the caller.
pub fn refresh_derived(site: &mut Site) -> u8 {
    for phase in &mut site.phases {
        for step in &mut phase.steps {
            step.status = work_status(step.progress);
        }
        if let Some(derived) = aggregate_phase_progress(&phase.steps) {
            phase.progress = derived;
        }
        phase.status = work_status(phase.progress);
    }
    let global = aggregate_site_progress(&site.phases);
    site.global_progress = global;
    global
}
