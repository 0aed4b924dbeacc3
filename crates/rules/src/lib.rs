//! Schedule rules: declarative placement and adjacency constraints.
//!
//! Editors author two rule families as JSON:
//!
//! - **Placement rules** map an entry to the slots it may occupy
//!   ("R-rated titles only after 22:00").
//! - **Neighbour rules** forbid combinations of consecutive entries
//!   ("no two Horror titles back to back").
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌──────────────────┐
//! │  Rule JSON  │───▶│   RuleSet    │───▶│    RuleEngine    │
//! │ (store)     │    │  (compiled)  │    │ placement, then  │
//! └─────────────┘    └──────────────┘    │ neighbour checks │
//!                                        └────────┬─────────┘
//!                                           ValidationVerdict
//! ```
//!
//! # Example placement rule
//!
//! ```json
//! {
//!   "Rule Id": 4,
//!   "Rule Title": "Mature content",
//!   "Rule Short Desc": "R-rated late only",
//!   "Rule Precedence": 10,
//!   "Condition": { "AND": [ { "Field": "pc_rating", "Expression": ">=", "Value": "R" } ] },
//!   "Result": { "End Result": ["Late Night", "Mid Night"] }
//! }
//! ```

mod condition;
mod engine;
mod model;

pub use condition::{
    Atom, ConditionTree, Dialect, EvalContext, Field, Op, Operand, Subject, Value, compile,
    rating_ordinal,
};
pub use engine::{Failure, RuleEngine, ValidationVerdict};
pub use model::{
    NeighbourOutcome, NeighbourRule, NeighbourRuleDef, PlacementRule, PlacementRuleDef, RuleKey,
    RuleSet,
};

/// Re-export for convenience.
pub type RuleResult<T> = std::result::Result<T, RuleError>;

/// Errors from loading rule documents.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("rule '{rule}' references unknown field '{field}'")]
    UnknownField { rule: String, field: String },

    #[error("rule file parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RuleError> for epgedit_core::Error {
    fn from(e: RuleError) -> Self {
        epgedit_core::Error::MalformedInput(e.to_string())
    }
}
