//! Priority-slot reconciliation of ingress rules.
//!
//! The planner diffs the provider's current rule set against the desired
//! source ranges and assigns each new rule a free priority slot; the
//! executor replays the resulting plan against the API, deletions first.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::priority::PrioritySet;
use crate::provider::{FirewallApi, FirewallRule, RuleAction};

/// Inclusive priority range this tool treats as its own.
///
/// Only existing rules inside the window are candidates for matching and
/// deletion. Rules outside it are never touched, even when their source
/// range equals a desired one, but their priorities still count as occupied
/// when slots are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityWindow {
    pub base: i64,
    pub max: i64,
}

impl PriorityWindow {
    pub fn new(base: i64, max: i64) -> Self {
        Self { base, max }
    }

    /// Whether `priority` falls inside the window.
    pub fn contains(&self, priority: i64) -> bool {
        self.base <= priority && priority <= self.max
    }
}

/// A rule creation the plan calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRule {
    pub priority: i64,
    pub source_range: String,
}

/// The create/delete diff for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Priorities of windowed rules whose source range left the desired set.
    pub deletions: Vec<i64>,
    /// New rules with their assigned priorities, in desired-input order.
    pub creations: Vec<PlannedRule>,
}

impl ReconcilePlan {
    /// Whether the run would change nothing.
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.creations.is_empty()
    }
}

/// What a run changed, or under dry-run would have changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub created: Vec<FirewallRule>,
    pub deleted: Vec<i64>,
}

/// Compute the create/delete diff between `existing` rules and `desired`
/// source ranges.
///
/// Ranges match by exact string equality. Desired lines that are exactly
/// empty are skipped; everything else is taken verbatim. Windowed rules
/// whose range is not desired become deletions. Desired ranges with no
/// windowed rule become creations, each assigned the lowest free priority
/// at or above the window base, with deleted slots counted as free. The
/// assignment cursor never moves backwards, so creations within one plan
/// keep the input order of their ranges.
///
/// Two windowed rules sharing a source range shadow each other: only the
/// later one (in `existing` order) is matched or deleted.
pub fn plan(existing: &[FirewallRule], desired: &[String], window: PriorityWindow) -> ReconcilePlan {
    let mut used: PrioritySet = existing.iter().map(|rule| rule.priority).collect();

    let mut old_rules: BTreeMap<&str, i64> = BTreeMap::new();
    for rule in existing {
        if window.contains(rule.priority) {
            old_rules.insert(rule.source_range.as_str(), rule.priority);
        }
    }
    debug!(
        "{} existing rules, {} inside the {}..={} window",
        existing.len(),
        old_rules.len(),
        window.base,
        window.max
    );

    let mut new_ranges: Vec<&str> = Vec::new();
    for range in desired {
        if range.is_empty() {
            continue;
        }
        if old_rules.remove(range.as_str()).is_none() {
            new_ranges.push(range);
        }
    }

    let mut deletions = Vec::with_capacity(old_rules.len());
    for (_, priority) in old_rules {
        used.remove(priority);
        deletions.push(priority);
    }

    let mut creations = Vec::with_capacity(new_ranges.len());
    let mut cursor = window.base;
    for range in new_ranges {
        cursor = used.first_free_from(cursor);
        used.insert(cursor);
        if cursor > window.max {
            warn!(
                "priority {} for {} exceeds the window max {}",
                cursor, range, window.max
            );
        }
        creations.push(PlannedRule {
            priority: cursor,
            source_range: range.to_string(),
        });
    }

    debug!(
        "plan: {} deletions, {} creations",
        deletions.len(),
        creations.len()
    );
    ReconcilePlan {
        deletions,
        creations,
    }
}

/// Execute a plan against the provider, reporting each action on stdout
/// before its call.
///
/// Deletions run first so their slots are free for the creations. Under
/// `dryrun` every report carries a marker prefix and no call is made; the
/// returned outcome is the same either way. The first provider error aborts
/// the run and leaves earlier mutations in place.
pub async fn apply(
    api: &dyn FirewallApi,
    apps_id: &str,
    action: RuleAction,
    comment: &str,
    dryrun: bool,
    plan: &ReconcilePlan,
) -> Result<ReconcileOutcome> {
    let prefix = if dryrun { "[DRYRUN] " } else { "" };
    let mut outcome = ReconcileOutcome::default();

    for &priority in &plan.deletions {
        println!("{}Deleting rule of priority: {}", prefix, priority);
        if !dryrun {
            api.delete_ingress_rule(apps_id, priority).await?;
        }
        outcome.deleted.push(priority);
    }

    for planned in &plan.creations {
        println!(
            "{}Creating rule {} {} {} {:?}",
            prefix, planned.priority, action, planned.source_range, comment
        );
        let rule = FirewallRule {
            priority: planned.priority,
            source_range: planned.source_range.clone(),
            action,
            description: comment.to_string(),
        };
        if !dryrun {
            api.create_ingress_rule(apps_id, &rule).await?;
        }
        outcome.created.push(rule);
    }

    Ok(outcome)
}
