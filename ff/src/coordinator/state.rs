//! Session state held by the coordinator

use serde::Serialize;

use super::CoordinatorError;
use crate::domain::FloorPlan;

/// Generation sub-flow
///
/// `Idle -> Generating -> {Settled, Failed}`; terminal phases go back to
/// `Idle` on acknowledge or when the next generation starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationPhase {
    #[default]
    Idle,
    Generating,
    Settled,
    Failed,
}

impl GenerationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Failed)
    }
}

impl std::fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Generating => write!(f, "generating"),
            Self::Settled => write!(f, "settled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Load sub-flow: `Idle -> Loading -> {Loaded, LoadFailed}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadFailed,
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::LoadFailed => write!(f, "load-failed"),
        }
    }
}

/// Mutable session state
///
/// `plans` is most-recent-first with unique ids. `current` is always either
/// `None` or a copy of an entry in `plans`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub plans: Vec<FloorPlan>,
    pub current: Option<FloorPlan>,
    pub generation: GenerationPhase,
    pub load: LoadPhase,
    pub last_error: Option<CoordinatorError>,
    pub durability_error: Option<CoordinatorError>,
}

impl SessionState {
    /// Adopt a new collection, dropping later duplicates of an id
    ///
    /// The current plan is kept only if an entry with its id survives, and is
    /// refreshed from that entry.
    pub fn replace_plans(&mut self, plans: Vec<FloorPlan>) {
        let mut seen = std::collections::HashSet::new();
        self.plans = plans.into_iter().filter(|p| seen.insert(p.id.clone())).collect();

        self.current = self
            .current
            .take()
            .and_then(|current| self.plans.iter().find(|p| p.id == current.id).cloned());
    }

    /// Put `plan` at the front, replacing any entry with the same id
    pub fn insert_front(&mut self, plan: FloorPlan) {
        self.plans.retain(|p| p.id != plan.id);
        self.plans.insert(0, plan);
    }

    /// Replace the name of the entry with `id`, returning the updated entry
    pub fn rename(&mut self, id: &str, name: Option<String>) -> Option<FloorPlan> {
        let entry = self.plans.iter_mut().find(|p| p.id == id)?;
        *entry = entry.renamed(name);
        let updated = entry.clone();

        if self.current.as_ref().is_some_and(|c| c.id == id) {
            self.current = Some(updated.clone());
        }
        Some(updated)
    }

    /// Remove the entry with `id`, clearing current if it was that entry
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.plans.len();
        self.plans.retain(|p| p.id != id);
        let removed = self.plans.len() != before;

        if removed && self.current.as_ref().is_some_and(|c| c.id == id) {
            self.current = None;
        }
        removed
    }

    pub fn find(&self, id: &str) -> Option<&FloorPlan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            plans: self.plans.clone(),
            current: self.current.clone(),
            generation: self.generation,
            load: self.load,
            last_error: self.last_error.as_ref().map(ToString::to_string),
            durability_degraded: self.durability_error.is_some(),
        }
    }
}

/// Point-in-time copy of the session, for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub plans: Vec<FloorPlan>,
    pub current: Option<FloorPlan>,
    pub generation: GenerationPhase,
    pub load: LoadPhase,
    pub last_error: Option<String>,
    pub durability_degraded: bool,
}
