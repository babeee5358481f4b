use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleStatus {
    Open,
    InProgress,
    Completed,
    Closed,
}

impl std::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleStatus::Open => write!(f, "open"),
            ModuleStatus::InProgress => write!(f, "in_progress"),
            ModuleStatus::Completed => write!(f, "completed"),
            ModuleStatus::Closed => write!(f, "closed"),
        }
    }
}

impl ModuleStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModuleStatus::Completed | ModuleStatus::Closed)
    }

    /// Whether moving from `self` to `to` is a legal state-machine step.
    ///
    /// `Completed` is only reachable through a passing review and `Open` is
    /// only re-entered when the last assignment is released; the table still
    /// lists both so the workflow paths and the validated update path share
    /// one source of truth.
    pub fn can_transition(&self, to: ModuleStatus) -> bool {
        use ModuleStatus::*;
        match (self, to) {
            (Open, InProgress) | (Open, Completed) | (Open, Closed) => true,
            (InProgress, Open) | (InProgress, Completed) | (InProgress, Closed) => true,
            _ => false,
        }
    }
}

/// A unit of work published by a commander.
///
/// `timed_out` is independent of `status`: the sweeper sets it when the
/// deadline passes and nothing ever clears it automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ModuleStatus,
    pub timed_out: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub bounty: Option<f64>,
    pub created_by: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Module {
    pub fn new(
        title: String,
        description: String,
        created_by: u64,
        deadline: Option<DateTime<Utc>>,
        bounty: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            status: ModuleStatus::Open,
            timed_out: false,
            deadline,
            bounty,
            created_by,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Whether the deadline has elapsed for an unresolved, not-yet-flagged
    /// module. Used by the sweeper's candidate selection and re-checked
    /// before commit.
    pub fn is_timeout_candidate(&self, now: DateTime<Utc>) -> bool {
        !self.timed_out
            && !self.status.is_terminal()
            && self.deadline.is_some_and(|d| d < now)
    }
}

/// Commander-editable fields for the generic update path. `None` leaves the
/// field untouched. A `status` change is validated against the transition
/// table and rejected while assignments are active.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub bounty: Option<f64>,
    pub status: Option<ModuleStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_module_is_open() {
        let module = Module::new("title".into(), "desc".into(), 1, None, None);
        assert_eq!(module.status, ModuleStatus::Open);
        assert!(!module.timed_out);
        assert!(module.updated_at.is_none());
    }

    #[test]
    fn terminal_statuses_accept_no_transition() {
        for from in [ModuleStatus::Completed, ModuleStatus::Closed] {
            for to in [
                ModuleStatus::Open,
                ModuleStatus::InProgress,
                ModuleStatus::Completed,
                ModuleStatus::Closed,
            ] {
                assert!(!from.can_transition(to), "{from} -> {to} should be illegal");
            }
        }
    }

    #[test]
    fn open_and_in_progress_transitions() {
        assert!(ModuleStatus::Open.can_transition(ModuleStatus::InProgress));
        assert!(ModuleStatus::Open.can_transition(ModuleStatus::Closed));
        assert!(ModuleStatus::InProgress.can_transition(ModuleStatus::Open));
        assert!(ModuleStatus::InProgress.can_transition(ModuleStatus::Completed));
        assert!(!ModuleStatus::Open.can_transition(ModuleStatus::Open));
    }

    #[test]
    fn timeout_candidate_selection() {
        let now = Utc::now();
        let past = now - chrono::Duration::hours(1);
        let future = now + chrono::Duration::hours(1);

        let mut module = Module::new("t".into(), "d".into(), 1, Some(past), None);
        assert!(module.is_timeout_candidate(now));

        module.timed_out = true;
        assert!(!module.is_timeout_candidate(now));

        module.timed_out = false;
        module.status = ModuleStatus::Completed;
        assert!(!module.is_timeout_candidate(now));

        module.status = ModuleStatus::Open;
        module.deadline = Some(future);
        assert!(!module.is_timeout_candidate(now));

        module.deadline = None;
        assert!(!module.is_timeout_candidate(now));
    }
}
