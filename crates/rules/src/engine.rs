//! Schedule validation engine.
//!
//! Placement rules decide which slots an entry may occupy; neighbour rules
//! flag forbidden adjacencies. The engine evaluates both against a sequence
//! of entries and returns a [`ValidationVerdict`] for the editor.

use epgedit_core::{ProgramEntry, TimeSlotTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::condition::EvalContext;
use crate::model::{NeighbourOutcome, RuleSet};

/// One reason an entry was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    #[serde(rename = "movieId")]
    pub program_id: String,
    pub reason: String,
    /// The rule that produced this failure.
    #[serde(rename = "ruleId", default)]
    pub rule_id: String,
}

/// The outcome of validating a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    #[serde(rename = "invalidMovies")]
    pub failures: Vec<Failure>,
}

impl ValidationVerdict {
    fn from_failures(failures: Vec<Failure>) -> Self {
        Self {
            valid: failures.is_empty(),
            failures,
        }
    }
}

/// Evaluates a [`RuleSet`] against schedule sequences.
///
/// Stateless between calls: validating the same input twice yields the
/// same verdict.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: RuleSet,
    slots: TimeSlotTable,
}

impl RuleEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            slots: TimeSlotTable::default(),
        }
    }

    /// Use a custom day-part table for entries that carry no slot.
    pub fn with_slots(mut self, slots: TimeSlotTable) -> Self {
        self.slots = slots;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run placement checks, then neighbour checks, over `entries` in order.
    pub fn validate(&self, entries: &[ProgramEntry]) -> ValidationVerdict {
        let entries = self.resolve_slots(entries);
        let mut failures = self.check_placement(&entries);
        failures.extend(self.check_neighbours(&entries));

        let verdict = ValidationVerdict::from_failures(failures);
        info!(
            entries = entries.len(),
            failures = verdict.failures.len(),
            valid = verdict.valid,
            "Schedule validated"
        );
        verdict
    }

    /// Fill in the slot of every entry that has none, from its start time.
    pub fn resolve_slots(&self, entries: &[ProgramEntry]) -> Vec<ProgramEntry> {
        entries
            .iter()
            .map(|entry| {
                let mut entry = entry.clone();
                if entry.assigned_slot().is_none() {
                    entry.slot = self.slots.classify(entry.start.time()).map(str::to_string);
                }
                entry
            })
            .collect()
    }

    /// Placement check: for each entry the first matching rule, highest
    /// precedence first, decides. No matching rule means no constraint.
    pub fn check_placement(&self, entries: &[ProgramEntry]) -> Vec<Failure> {
        let mut failures = Vec::new();

        for entry in entries {
            let slot = entry.assigned_slot().unwrap_or_default();
            let ctx = EvalContext::single(entry);

            let Some(rule) = self
                .rules
                .placement_rules()
                .iter()
                .find(|rule| rule.condition.evaluate(&ctx))
            else {
                debug!(program = %entry.program_id, "No placement rule applies");
                continue;
            };

            if rule.permits(slot) {
                debug!(program = %entry.program_id, rule = %rule.id, slot, "Placement permitted");
            } else {
                info!(program = %entry.program_id, rule = %rule.id, slot, "Placement rejected");
                failures.push(Failure {
                    program_id: entry.program_id.clone(),
                    reason: format!(
                        "Title cannot be placed in {slot} due to rule: {}",
                        rule.description
                    ),
                    rule_id: rule.id.clone(),
                });
            }
        }

        failures
    }

    /// Neighbour check: every invalidating rule is tried at every position
    /// after the first. Each match is reported against the later entry.
    pub fn check_neighbours(&self, entries: &[ProgramEntry]) -> Vec<Failure> {
        let mut failures = Vec::new();

        for index in 1..entries.len() {
            let ctx = EvalContext::window(entries, index);
            for rule in self.rules.neighbour_rules() {
                if rule.outcome != NeighbourOutcome::Invalid || !rule.condition.evaluate(&ctx) {
                    continue;
                }
                info!(
                    program = %ctx.current.program_id,
                    rule = %rule.id,
                    "Neighbour rule violated"
                );
                failures.push(Failure {
                    program_id: ctx.current.program_id.clone(),
                    reason: format!("Neighbour rule violated: {}", rule.description),
                    rule_id: rule.id.clone(),
                });
            }
        }

        failures
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
