//! Per-action check execution and the tri-state verdict reduction.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use permit_behavior::Action;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A collaborator failure: the rule engine raised instead of answering.
/// Never handled locally; the original error fails the test through `?`.
#[derive(Debug, Error, Clone)]
#[error("rule engine failure: {0}")]
pub struct EngineError(Arc<anyhow::Error>);

impl EngineError {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(Arc::new(err.into()))
    }
}

/// Answers one permission question at a time. Implementations are expected
/// to be synchronous, read-only views of authorization configuration.
pub trait RuleEngine {
    /// Is `role` permitted to perform `action` on `controller`?
    fn permits(&self, role: &str, action: Action, controller: &str)
        -> Result<bool, EngineError>;
}

/// What the matcher hands the check runner: one role, one controller, and
/// the two signed action sets.
#[derive(Clone, Debug, Serialize)]
pub struct CheckRequest<'a> {
    pub role: &'a str,
    pub controller: &'a str,
    pub actions: &'a BTreeSet<Action>,
    pub negated: &'a BTreeSet<Action>,
}

/// Raw engine outcomes, keyed by action. `granted` holds the answers for
/// the permitted set, `refused` the answers for the negated set; in both
/// maps `true` means the engine permitted the action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckReport {
    pub granted: BTreeMap<Action, bool>,
    pub refused: BTreeMap<Action, bool>,
}

impl CheckReport {
    /// Reduce the raw outcomes to a verdict. Empty maps are vacuously
    /// satisfied on both sides.
    pub fn verdict(&self) -> Verdict {
        let all_granted = self.granted.values().all(|allowed| *allowed);
        let none_granted = self.granted.values().all(|allowed| !*allowed);
        let all_refused = self.refused.values().all(|allowed| !*allowed);
        let none_refused = self.refused.values().all(|allowed| *allowed);

        if all_granted && all_refused {
            Verdict::Match
        } else if none_granted && none_refused {
            Verdict::Opposite
        } else {
            Verdict::Mixed
        }
    }
}

/// Three-way outcome of an evaluation. `Mixed` (partial permission) fails
/// the assertion in both polarity directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every permitted-set action was allowed and every negated-set action
    /// was denied.
    Match,
    /// The fully opposite outcome.
    Opposite,
    /// Anything in between.
    Mixed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Match => write!(f, "match"),
            Verdict::Opposite => write!(f, "opposite"),
            Verdict::Mixed => write!(f, "mixed"),
        }
    }
}

/// Runs one engine check per requested action against a single
/// controller-like resource. Only the controller's identity is needed.
pub struct ResourceCheck<'a, E: RuleEngine> {
    engine: &'a E,
    controller: &'a str,
}

impl<'a, E: RuleEngine> ResourceCheck<'a, E> {
    pub fn new(engine: &'a E, controller: &'a str) -> Self {
        Self { engine, controller }
    }

    pub fn controller(&self) -> &str {
        self.controller
    }

    pub fn run(&self, request: &CheckRequest<'_>) -> Result<CheckReport, EngineError> {
        let granted = self.query(request.role, request.actions)?;
        let refused = self.query(request.role, request.negated)?;
        Ok(CheckReport { granted, refused })
    }

    fn query(
        &self,
        role: &str,
        actions: &BTreeSet<Action>,
    ) -> Result<BTreeMap<Action, bool>, EngineError> {
        let mut results = BTreeMap::new();
        for action in actions {
            let allowed = self.engine.permits(role, *action, self.controller)?;
            tracing::debug!(
                role,
                action = %action,
                controller = self.controller,
                allowed,
                "permission check"
            );
            results.insert(*action, allowed);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(granted: &[(Action, bool)], refused: &[(Action, bool)]) -> CheckReport {
        CheckReport {
            granted: granted.iter().copied().collect(),
            refused: refused.iter().copied().collect(),
        }
    }

    #[test]
    fn all_permitted_is_a_match() {
        let report = report(&[(Action::Index, true), (Action::Show, true)], &[]);
        assert_eq!(report.verdict(), Verdict::Match);
    }

    #[test]
    fn partial_permission_is_mixed() {
        let report = report(&[(Action::Index, true), (Action::Show, false)], &[]);
        assert_eq!(report.verdict(), Verdict::Mixed);
    }

    #[test]
    fn fully_denied_is_the_opposite() {
        let report = report(&[(Action::Index, false), (Action::Show, false)], &[]);
        assert_eq!(report.verdict(), Verdict::Opposite);
    }

    #[test]
    fn negated_set_must_be_denied_for_a_match() {
        let ok = report(&[(Action::Index, true)], &[(Action::Destroy, false)]);
        assert_eq!(ok.verdict(), Verdict::Match);

        let leaked = report(&[(Action::Index, true)], &[(Action::Destroy, true)]);
        assert_eq!(leaked.verdict(), Verdict::Mixed);
    }

    #[test]
    fn opposite_needs_both_sides_inverted() {
        let report = report(&[(Action::Index, false)], &[(Action::Destroy, true)]);
        assert_eq!(report.verdict(), Verdict::Opposite);
    }
}
