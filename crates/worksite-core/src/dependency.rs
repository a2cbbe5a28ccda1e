use crate::{Phase, PhaseId, Site, Step, StepId};
use serde::Serialize;

/// Whether the step at `index` is locked by the sequential rule: every step
/// waits for its immediate predecessor to reach 100%. The first step is never
/// locked.
pub fn step_locked(steps: &[Step], index: usize) -> bool {
    if index == 0 {
        return false;
    }
    steps
        .get(index - 1)
        .is_some_and(|prev| prev.progress < 100)
}

/// Whether the phase at `index` is locked by the category rule.
///
/// Only dependency-bearing phases participate. The gate is the nearest
/// preceding phase of the same dependency-bearing category, in original
/// document order; phases of other categories in between are skipped and are
/// themselves never locked. A dependency-bearing phase with no such
/// predecessor is always unlocked, wherever it sits.
pub fn phase_locked(phases: &[Phase], index: usize) -> bool {
    let Some(phase) = phases.get(index) else {
        return false;
    };
    if !phase.category.is_dependency_bearing() {
        return false;
    }
    phases[..index]
        .iter()
        .rev()
        .find(|prev| prev.category == phase.category)
        .is_some_and(|prev| prev.progress < 100)
}

/// Computed lock signal for one step, for display. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepLockState {
    pub step_id: StepId,
    pub locked: bool,
}

/// Computed lock signal for one phase and its steps, for display. Not
/// persisted; recomputed on demand from current data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseLockState {
    pub phase_id: PhaseId,
    pub locked: bool,
    pub steps: Vec<StepLockState>,
}

/// Lock signals for every phase and step of the site. A step inside a locked
/// phase reports locked even when its own sequential predecessor is done.
pub fn lock_states(site: &Site) -> Vec<PhaseLockState> {
    site.phases
        .iter()
        .enumerate()
        .map(|(phase_index, phase)| {
            let locked = phase_locked(&site.phases, phase_index);
            let steps = phase
                .steps
                .iter()
                .enumerate()
                .map(|(step_index, step)| StepLockState {
                    step_id: step.id,
                    locked: locked || step_locked(&phase.steps, step_index),
                })
                .collect();
            PhaseLockState {
                phase_id: phase.id,
                locked,
                steps,
            }
        })
        .collect()
}
