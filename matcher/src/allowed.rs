//! The single-use fluent matcher.

use std::collections::{BTreeMap, BTreeSet};

use permit_behavior::{resolve, Action, ResolvedBehavior, UnknownBehaviorError};

use crate::check::{CheckReport, CheckRequest, EngineError, ResourceCheck, RuleEngine, Verdict};

/// Entry point: build a matcher asserting what `role` may do.
///
/// With no further configuration the matcher checks the `index` action
/// only, the common shorthand for a listing endpoint.
pub fn allowed_to(role: impl Into<String>) -> AllowedTo {
    AllowedTo::new(role)
}

/// Accumulates one assertion's intent across a fluent chain, then reduces
/// the engine's answers to a verdict.
///
/// An instance is single-use: build it fresh for every expectation and do
/// not share it after evaluation. `matches` and `does_not_match` are
/// independent predicates; on a partial-permission outcome both return
/// `Ok(false)`.
#[derive(Debug)]
pub struct AllowedTo {
    role: String,
    actions: BTreeSet<Action>,
    negated: BTreeSet<Action>,
    resolved: Option<ResolvedBehavior>,
    controller: Option<String>,
    report: Option<CheckReport>,
}

impl AllowedTo {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            actions: BTreeSet::from([Action::Index]),
            negated: BTreeSet::new(),
            resolved: None,
            controller: None,
            report: None,
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Focus the assertion on a single action, with no negated set. Last
    /// call wins over any earlier `to` or `with_helper`.
    pub fn to(mut self, action: Action) -> Self {
        self.actions = BTreeSet::from([action]);
        self.negated.clear();
        self.resolved = None;
        self
    }

    /// Expand a helper name such as `only_to_read` into both action sets.
    /// An unrecognized name is a test-authoring bug and surfaces as
    /// [`UnknownBehaviorError`] rather than defaulting to anything.
    pub fn with_helper(mut self, name: &str) -> Result<Self, UnknownBehaviorError> {
        let resolved = resolve(name)?;
        self.actions = resolved.actions().clone();
        self.negated = resolved.negated().clone();
        self.resolved = Some(resolved);
        Ok(self)
    }

    /// True when every permitted-set action was allowed and every
    /// negated-set action was denied.
    pub fn matches<E: RuleEngine>(
        &mut self,
        resource: &ResourceCheck<'_, E>,
    ) -> Result<bool, EngineError> {
        Ok(self.evaluate(resource)? == Verdict::Match)
    }

    /// True only on the fully opposite outcome: every permitted-set action
    /// denied and every negated-set action allowed.
    pub fn does_not_match<E: RuleEngine>(
        &mut self,
        resource: &ResourceCheck<'_, E>,
    ) -> Result<bool, EngineError> {
        Ok(self.evaluate(resource)? == Verdict::Opposite)
    }

    fn evaluate<E: RuleEngine>(
        &mut self,
        resource: &ResourceCheck<'_, E>,
    ) -> Result<Verdict, EngineError> {
        let request = CheckRequest {
            role: &self.role,
            controller: resource.controller(),
            actions: &self.actions,
            negated: &self.negated,
        };
        let report = resource.run(&request)?;
        let verdict = report.verdict();
        self.controller = Some(resource.controller().to_string());
        self.report = Some(report);
        Ok(verdict)
    }

    pub fn description(&self) -> String {
        format!("be allowed {} as role {}", self.subject(), self.role)
    }

    pub fn failure_message(&self) -> String {
        self.render_failure("expected")
    }

    pub fn failure_message_when_negated(&self) -> String {
        self.render_failure("did not expect")
    }

    /// Humanized form of what is being asserted: the helper name when one
    /// was used, otherwise `to <action>`.
    fn subject(&self) -> String {
        match &self.resolved {
            Some(resolved) => resolved.humanized(),
            None => {
                let action = self.actions.iter().next().copied().unwrap_or(Action::Index);
                format!("to {action}")
            }
        }
    }

    fn render_failure(&self, polarity: &str) -> String {
        let controller = self.controller.as_deref().unwrap_or("<unevaluated>");
        let (granted, refused) = match &self.report {
            Some(report) => (render_map(&report.granted), render_map(&report.refused)),
            None => ("{}".to_string(), "{}".to_string()),
        };
        format!(
            "{polarity} role {} to be allowed {} on {}\n  permitted checks: {}\n  negated checks: {}",
            self.role,
            self.subject(),
            controller,
            granted,
            refused,
        )
    }
}

fn render_map(results: &BTreeMap<Action, bool>) -> String {
    serde_json::to_string(results).unwrap_or_else(|_| "{}".to_string())
}
