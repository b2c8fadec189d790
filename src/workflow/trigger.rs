// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Trigger matching
//!
//! Decides whether an incoming event (kind + branch) should start a run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event kinds that can trigger a workflow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Push,
    PullRequest,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::PullRequest => write!(f, "pull_request"),
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "pull_request" => Ok(Self::PullRequest),
            _ => Err(format!("Unknown event kind: {}", s)),
        }
    }
}

/// An incoming event to match against the workflow triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event kind
    pub kind: EventKind,
    /// Target branch name
    pub branch: String,
}

impl Event {
    pub fn new(kind: EventKind, branch: impl Into<String>) -> Self {
        Self {
            kind,
            branch: branch.into(),
        }
    }
}

/// Branch filter for one event kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRule {
    /// Glob-style branch patterns; an empty list matches every branch
    #[serde(default)]
    pub branches: Vec<String>,
}

impl TriggerRule {
    /// Whether a branch name matches this rule
    pub fn matches(&self, branch: &str) -> bool {
        if self.branches.is_empty() {
            return true;
        }

        self.branches.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(branch))
                .unwrap_or(false)
        })
    }
}

/// The `on:` section of a workflow: event kind -> branch filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerSet {
    rules: HashMap<EventKind, TriggerRule>,
}

impl TriggerSet {
    /// Whether an event should start a run
    ///
    /// An event kind the workflow does not register is a silent skip,
    /// never an error.
    pub fn should_run(&self, event: &Event) -> bool {
        match self.rules.get(&event.kind) {
            Some(rule) => rule.matches(&event.branch),
            None => false,
        }
    }

    /// Whether any trigger is declared
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over the declared rules
    pub fn rules(&self) -> impl Iterator<Item = (&EventKind, &TriggerRule)> {
        self.rules.iter()
    }

    /// Register a rule (used by tests and programmatic construction)
    pub fn insert(&mut self, kind: EventKind, rule: TriggerRule) {
        self.rules.insert(kind, rule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triggers(kind: EventKind, branches: &[&str]) -> TriggerSet {
        let mut set = TriggerSet::default();
        set.insert(
            kind,
            TriggerRule {
                branches: branches.iter().map(|s| s.to_string()).collect(),
            },
        );
        set
    }

    #[test]
    fn test_push_to_master_matches() {
        let set = triggers(EventKind::Push, &["master", "release/*"]);
        assert!(set.should_run(&Event::new(EventKind::Push, "master")));
    }

    #[test]
    fn test_push_to_feature_branch_does_not_match() {
        let set = triggers(EventKind::Push, &["master", "release/*"]);
        assert!(!set.should_run(&Event::new(EventKind::Push, "feature/x")));
    }

    #[test]
    fn test_release_wildcard_matches() {
        let set = triggers(EventKind::Push, &["release/*"]);
        assert!(set.should_run(&Event::new(EventKind::Push, "release/1.5.x")));
        assert!(!set.should_run(&Event::new(EventKind::Push, "hotfix/1.5.x")));
    }

    #[test]
    fn test_unregistered_kind_is_silent_skip() {
        let set = triggers(EventKind::Push, &["master"]);
        assert!(!set.should_run(&Event::new(EventKind::PullRequest, "master")));
    }

    #[test]
    fn test_empty_branch_list_matches_any_branch() {
        let set = triggers(EventKind::PullRequest, &[]);
        assert!(set.should_run(&Event::new(EventKind::PullRequest, "anything/goes")));
    }

    #[test]
    fn test_should_run_is_deterministic() {
        let set = triggers(EventKind::Push, &["master", "release/*"]);
        let event = Event::new(EventKind::Push, "release/2.0");

        let first = set.should_run(&event);
        for _ in 0..10 {
            assert_eq!(set.should_run(&event), first);
        }
    }

    #[test]
    fn test_parse_trigger_section() {
        let yaml = r#"
push:
  branches: [master, "release/*"]
pull_request:
  branches: [master]
"#;

        let set: TriggerSet = serde_yaml::from_str(yaml).unwrap();
        assert!(set.should_run(&Event::new(EventKind::Push, "release/1.0")));
        assert!(set.should_run(&Event::new(EventKind::PullRequest, "master")));
        assert!(!set.should_run(&Event::new(EventKind::PullRequest, "release/1.0")));
    }
}
