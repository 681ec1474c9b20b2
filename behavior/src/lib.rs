//! Behavior dictionary and helper-name resolution for RESTful permission
//! assertions.
//!
//! A helper name such as `only_to_read` is parsed into a prefix plus a
//! behavior, then expanded into the action set the assertion should expect
//! to be permitted and the set it should expect to be denied.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised for helper names with no recognized prefix or an unknown
/// behavior segment. Always a test-authoring bug, never a permission
/// outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown permission helper `{0}`")]
pub struct UnknownBehaviorError(pub String);

/// One RESTful controller action.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Index,
    Show,
    New,
    Create,
    Edit,
    Update,
    Destroy,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Index,
        Action::Show,
        Action::New,
        Action::Create,
        Action::Edit,
        Action::Update,
        Action::Destroy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::Show => "show",
            Action::New => "new",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Update => "update",
            Action::Destroy => "destroy",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "index" => Some(Action::Index),
            "show" => Some(Action::Show),
            "new" => Some(Action::New),
            "create" => Some(Action::Create),
            "edit" => Some(Action::Edit),
            "update" => Some(Action::Update),
            "destroy" => Some(Action::Destroy),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named class of RESTful intent, mapped to a fixed action set.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Read,
    Create,
    Update,
    Delete,
    Manage,
}

impl Behavior {
    pub const ALL: [Behavior; 5] = [
        Behavior::Read,
        Behavior::Create,
        Behavior::Update,
        Behavior::Delete,
        Behavior::Manage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Behavior::Read => "read",
            Behavior::Create => "create",
            Behavior::Update => "update",
            Behavior::Delete => "delete",
            Behavior::Manage => "manage",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "read" => Some(Behavior::Read),
            "create" => Some(Behavior::Create),
            "update" => Some(Behavior::Update),
            "delete" => Some(Behavior::Delete),
            "manage" => Some(Behavior::Manage),
            _ => None,
        }
    }

    /// The dictionary row for this behavior. `manage` covers every action
    /// of the other four rows.
    pub fn actions(self) -> &'static [Action] {
        match self {
            Behavior::Read => &[Action::Index, Action::Show],
            Behavior::Create => &[Action::New, Action::Create],
            Behavior::Update => &[Action::Edit, Action::Update],
            Behavior::Delete => &[Action::Destroy],
            Behavior::Manage => &Action::ALL,
        }
    }

    pub fn action_set(self) -> BTreeSet<Action> {
        self.actions().iter().copied().collect()
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full behavior dictionary as a map, for callers that want to iterate
/// rows rather than match on `Behavior`.
pub fn dictionary() -> &'static BTreeMap<Behavior, BTreeSet<Action>> {
    static DICT: Lazy<BTreeMap<Behavior, BTreeSet<Action>>> = Lazy::new(|| {
        Behavior::ALL
            .iter()
            .map(|behavior| (*behavior, behavior.action_set()))
            .collect()
    });
    &DICT
}

/// Helper-name prefix. The focused forms (`only_to`, `except_to`) assert a
/// denied set alongside the permitted one; plain `to` does not.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Prefix {
    To,
    OnlyTo,
    ExceptTo,
}

impl Prefix {
    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::To => "to",
            Prefix::OnlyTo => "only_to",
            Prefix::ExceptTo => "except_to",
        }
    }

    fn split(name: &str) -> Option<(Prefix, &str)> {
        for prefix in [Prefix::ExceptTo, Prefix::OnlyTo, Prefix::To] {
            if let Some(rest) = name
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
            {
                if !rest.is_empty() {
                    return Some((prefix, rest));
                }
            }
        }
        None
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of resolving one helper name. Immutable; the permitted and
/// denied sets are always disjoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedBehavior {
    name: String,
    prefix: Prefix,
    behavior: Behavior,
    actions: BTreeSet<Action>,
    negated: BTreeSet<Action>,
}

impl ResolvedBehavior {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Actions the assertion expects to be permitted.
    pub fn actions(&self) -> &BTreeSet<Action> {
        &self.actions
    }

    /// Actions the assertion expects to be denied.
    pub fn negated(&self) -> &BTreeSet<Action> {
        &self.negated
    }

    /// Display form of the helper name, e.g. `only to read`.
    pub fn humanized(&self) -> String {
        humanize(&self.name)
    }
}

/// Expand a helper name into its permitted and denied action sets.
///
/// `to_x` asserts only that the `x` actions are permitted. `only_to_x`
/// additionally asserts that every `manage` action outside `x` is denied.
/// `except_to_x` is `only_to_x` with the two sets swapped: everything but
/// `x` is permitted and `x` itself is denied.
pub fn resolve(name: &str) -> Result<ResolvedBehavior, UnknownBehaviorError> {
    let (prefix, rest) =
        Prefix::split(name).ok_or_else(|| UnknownBehaviorError(name.to_string()))?;
    let behavior =
        Behavior::from_str(rest).ok_or_else(|| UnknownBehaviorError(name.to_string()))?;

    let base = behavior.action_set();
    let complement: BTreeSet<Action> = Behavior::Manage
        .action_set()
        .difference(&base)
        .copied()
        .collect();

    let (actions, negated) = match prefix {
        Prefix::To => (base, BTreeSet::new()),
        Prefix::OnlyTo => (base, complement),
        Prefix::ExceptTo => (complement, base),
    };

    Ok(ResolvedBehavior {
        name: name.to_string(),
        prefix,
        behavior,
        actions,
        negated,
    })
}

/// Replace underscores with spaces for display. Pure formatting.
pub fn humanize(name: &str) -> String {
    name.replace('_', " ")
}
