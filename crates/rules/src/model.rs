//! Rule data model: placement and neighbour rules as loaded from JSON.

use std::fmt;

use epgedit_core::RuleSources;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::RuleError;
use crate::condition::{ConditionTree, Dialect, compile};

/// Rule identifiers are authored as numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleKey {
    Number(i64),
    Text(String),
}

impl Default for RuleKey {
    fn default() -> Self {
        RuleKey::Text(String::new())
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKey::Number(n) => write!(f, "{n}"),
            RuleKey::Text(s) => f.write_str(s),
        }
    }
}

/// A placement rule exactly as it appears in the rule file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementRuleDef {
    #[serde(rename = "Rule Id", default)]
    pub id: RuleKey,

    #[serde(rename = "Rule Title", default)]
    pub title: String,

    #[serde(rename = "Rule Short Desc", default)]
    pub short_description: String,

    #[serde(rename = "Rule Precedence", default)]
    pub precedence: i64,

    #[serde(rename = "Condition", default)]
    pub condition: serde_json::Value,

    #[serde(rename = "Result", default)]
    pub result: PlacementResultDef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementResultDef {
    /// Permitted slot names. A single string is accepted too.
    #[serde(rename = "End Result", default, deserialize_with = "one_or_many")]
    pub permitted_slots: Vec<String>,
}

/// A neighbour rule exactly as it appears in the rule file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeighbourRuleDef {
    #[serde(rename = "Rule Id", default)]
    pub id: RuleKey,

    #[serde(rename = "Rule Title", default)]
    pub title: String,

    #[serde(rename = "Rule Desc", default)]
    pub description: String,

    #[serde(rename = "Conditions", default)]
    pub conditions: serde_json::Value,

    #[serde(rename = "Result", default)]
    pub result: NeighbourResultDef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeighbourResultDef {
    #[serde(rename = "End Result", default)]
    pub end_result: String,
}

/// A compiled placement rule.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRule {
    pub id: String,
    pub title: String,
    /// Short description quoted in failure reasons.
    pub description: String,
    /// Higher is evaluated first. Zero disables the rule.
    pub precedence: i64,
    pub condition: ConditionTree,
    pub permitted_slots: Vec<String>,
}

impl PlacementRule {
    pub fn is_enabled(&self) -> bool {
        self.precedence != 0
    }

    pub fn permits(&self, slot: &str) -> bool {
        self.permitted_slots.iter().any(|s| s == slot)
    }

    fn compile(def: PlacementRuleDef) -> Result<Self, RuleError> {
        let id = def.id.to_string();
        let condition = compile(&def.condition, Dialect::Placement, &id)?;
        Ok(Self {
            id,
            title: def.title,
            description: def.short_description,
            precedence: def.precedence,
            condition,
            permitted_slots: def.result.permitted_slots,
        })
    }
}

/// What a matching neighbour rule means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeighbourOutcome {
    /// The adjacency is a violation.
    Invalid,
    /// Anything else; matching has no effect.
    Informational,
}

/// A compiled neighbour rule.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighbourRule {
    pub id: String,
    pub title: String,
    pub description: String,
    pub condition: ConditionTree,
    pub outcome: NeighbourOutcome,
}

impl NeighbourRule {
    fn compile(def: NeighbourRuleDef) -> Result<Self, RuleError> {
        let id = def.id.to_string();
        let condition = compile(&def.conditions, Dialect::Neighbour, &id)?;
        let outcome = if def.result.end_result.trim() == "Invalid" {
            NeighbourOutcome::Invalid
        } else {
            NeighbourOutcome::Informational
        };
        Ok(Self {
            id,
            title: def.title,
            description: def.description,
            condition,
            outcome,
        })
    }
}

/// Both rule families, compiled and ready to evaluate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    /// Enabled placement rules, highest precedence first. Ties keep file order.
    placement: Vec<PlacementRule>,
    neighbour: Vec<NeighbourRule>,
    disabled: usize,
}

impl RuleSet {
    pub fn new(placement: Vec<PlacementRule>, neighbour: Vec<NeighbourRule>) -> Self {
        let total = placement.len();
        let mut placement: Vec<PlacementRule> =
            placement.into_iter().filter(PlacementRule::is_enabled).collect();
        // Stable, so equal precedence keeps file order.
        placement.sort_by(|a, b| b.precedence.cmp(&a.precedence));
        let disabled = total - placement.len();
        Self {
            placement,
            neighbour,
            disabled,
        }
    }

    /// Compile both rule documents.
    pub fn from_values(
        placement: &serde_json::Value,
        neighbour: &serde_json::Value,
    ) -> Result<Self, RuleError> {
        let placement = rule_list::<PlacementRuleDef>(placement, "placement")?
            .into_iter()
            .map(PlacementRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let neighbour = rule_list::<NeighbourRuleDef>(neighbour, "neighbour")?
            .into_iter()
            .map(NeighbourRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let set = Self::new(placement, neighbour);
        debug!(
            placement = set.placement.len(),
            disabled = set.disabled,
            neighbour = set.neighbour.len(),
            "Rule set compiled"
        );
        Ok(set)
    }

    pub fn from_sources(sources: &RuleSources) -> Result<Self, RuleError> {
        Self::from_values(&sources.placement, &sources.neighbour)
    }

    pub fn from_json_str(placement: &str, neighbour: &str) -> Result<Self, RuleError> {
        let placement: serde_json::Value = serde_json::from_str(placement)?;
        let neighbour: serde_json::Value = serde_json::from_str(neighbour)?;
        Self::from_values(&placement, &neighbour)
    }

    /// Enabled placement rules in evaluation order.
    pub fn placement_rules(&self) -> &[PlacementRule] {
        &self.placement
    }

    pub fn neighbour_rules(&self) -> &[NeighbourRule] {
        &self.neighbour
    }

    /// Placement rules skipped because their precedence is zero.
    pub fn disabled_count(&self) -> usize {
        self.disabled
    }

    pub fn is_empty(&self) -> bool {
        self.placement.is_empty() && self.neighbour.is_empty()
    }
}

/// A rule document is a JSON array. A missing document is an empty one.
fn rule_list<T: serde::de::DeserializeOwned>(
    json: &serde_json::Value,
    family: &str,
) -> Result<Vec<T>, RuleError> {
    match json {
        serde_json::Value::Null => {
            warn!(family, "No rules found, treating as empty");
            Ok(Vec::new())
        }
        serde_json::Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::deserialize(item).map_err(|e| RuleError::InvalidRule {
                    rule: format!("{family}[{index}]"),
                    reason: e.to_string(),
                })
            })
            .collect(),
        _ => Err(RuleError::InvalidRule {
            rule: family.to_string(),
            reason: "rule document must be a JSON array".into(),
        }),
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::One(slot)) => vec![slot],
        Some(Raw::Many(slots)) => slots,
        None => Vec::new(),
    })
}
