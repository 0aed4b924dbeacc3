//! Condition trees and their evaluator.
//!
//! Rule files describe conditions as nested JSON objects:
//!
//! ```text
//! { "AND": [ { "Field": "pc_rating", "Expression": ">=", "Value": "R" },
//!            { "OR": [ ... ] } ] }
//! ```
//!
//! Placement rules compare a field of the entry under test with a literal.
//! Neighbour rules name their operands with a positional prefix:
//!
//! ```text
//! current_movie_<field>     the entry under test
//! previous_movie_<field>    the entry right before it
//! previous_movie1_<field>   the entry two places before it
//! ```
//!
//! Everything is resolved once when the rule file is compiled. Evaluation
//! never fails: a malformed node or an unknown operator is simply false.

use std::cmp::Ordering;

use epgedit_core::{ProgramEntry, format_xmltv_time};
use tracing::{trace, warn};

use crate::RuleError;

/// A compiled condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTree {
    /// Every child must hold. Empty means true.
    All(Vec<ConditionTree>),
    /// Some child must hold. Empty means false.
    Any(Vec<ConditionTree>),
    /// A single comparison.
    Atom(Atom),
    /// A node that could not be understood; always false.
    Invalid(String),
}

impl ConditionTree {
    /// Evaluate this tree against an evaluation window.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            ConditionTree::All(children) => children.iter().all(|c| c.evaluate(ctx)),
            ConditionTree::Any(children) => children.iter().any(|c| c.evaluate(ctx)),
            ConditionTree::Atom(atom) => atom.evaluate(ctx),
            ConditionTree::Invalid(reason) => {
                trace!(reason = %reason, "Invalid condition evaluates false");
                false
            }
        }
    }
}

/// The entries a condition may look at.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub current: &'a ProgramEntry,
    pub previous: Option<&'a ProgramEntry>,
    pub previous_of_previous: Option<&'a ProgramEntry>,
}

impl<'a> EvalContext<'a> {
    /// Context for placement rules: only the entry itself.
    pub fn single(entry: &'a ProgramEntry) -> Self {
        Self {
            current: entry,
            previous: None,
            previous_of_previous: None,
        }
    }

    /// Context for the entry at `index` and up to two predecessors.
    pub fn window(entries: &'a [ProgramEntry], index: usize) -> Self {
        Self {
            current: &entries[index],
            previous: index.checked_sub(1).map(|i| &entries[i]),
            previous_of_previous: index.checked_sub(2).map(|i| &entries[i]),
        }
    }

    fn entry(&self, subject: Subject) -> Option<&'a ProgramEntry> {
        match subject {
            Subject::Current => Some(self.current),
            Subject::Previous => self.previous,
            Subject::PreviousOfPrevious => self.previous_of_previous,
        }
    }
}

/// Which entry of the window an operand reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Current,
    Previous,
    PreviousOfPrevious,
}

impl Subject {
    /// Split a neighbour parameter such as `previous_movie_genres`.
    pub fn split_parameter(param: &str) -> Option<(Subject, &str)> {
        if let Some(field) = param.strip_prefix("current_movie_") {
            Some((Subject::Current, field))
        } else if let Some(field) = param.strip_prefix("previous_movie1_") {
            Some((Subject::PreviousOfPrevious, field))
        } else {
            param
                .strip_prefix("previous_movie_")
                .map(|field| (Subject::Previous, field))
        }
    }
}

/// Entry attributes a rule may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ProgramId,
    ChannelId,
    Title,
    Description,
    Genre,
    Rating,
    Duration,
    Filler,
    RuleAnnotation,
    Start,
    Stop,
    Slot,
}

impl Field {
    /// Look a field up by the name used in rule files.
    pub fn from_name(name: &str) -> Option<Field> {
        let field = match name.trim() {
            "movieId" | "program_id" | "id" => Field::ProgramId,
            "channelId" | "channel_id" | "channel" => Field::ChannelId,
            "title" => Field::Title,
            "desc" | "description" => Field::Description,
            "genres" | "genre" => Field::Genre,
            "pc_rating" | "rating" => Field::Rating,
            "duration" => Field::Duration,
            "adSlateLength" | "ad_slate_length" | "filler" => Field::Filler,
            "applied_rules" | "rule_annotation" => Field::RuleAnnotation,
            "start" => Field::Start,
            "stop" => Field::Stop,
            "timeslot" | "slot" => Field::Slot,
            _ => return None,
        };
        Some(field)
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::ProgramId => "movieId",
            Field::ChannelId => "channelId",
            Field::Title => "title",
            Field::Description => "desc",
            Field::Genre => "genres",
            Field::Rating => "pc_rating",
            Field::Duration => "duration",
            Field::Filler => "adSlateLength",
            Field::RuleAnnotation => "applied_rules",
            Field::Start => "start",
            Field::Stop => "stop",
            Field::Slot => "timeslot",
        }
    }

    fn read(self, entry: &ProgramEntry) -> Value {
        match self {
            Field::ProgramId => Value::text(&entry.program_id),
            Field::ChannelId => Value::text(&entry.channel_id),
            Field::Title => Value::text(&entry.title),
            Field::Description => Value::text(&entry.description),
            Field::Genre => Value::text(&entry.genre),
            Field::Rating => Value::text(&entry.rating),
            Field::Duration => Value::Number(entry.duration_minutes as f64),
            Field::Filler => Value::Number(entry.filler_minutes as f64),
            Field::RuleAnnotation => Value::text(&entry.rule_annotation),
            Field::Start => Value::Text(format_xmltv_time(&entry.start)),
            Field::Stop => Value::Text(format_xmltv_time(&entry.stop)),
            Field::Slot => entry
                .assigned_slot()
                .map(Value::text)
                .unwrap_or(Value::Empty),
        }
    }
}

/// Map a content rating onto its ordinal. Unknown ratings are 0.
pub fn rating_ordinal(rating: &str) -> u8 {
    match rating.trim().to_ascii_uppercase().as_str() {
        "G" => 1,
        "PG" => 2,
        "PG-13" => 3,
        "R" => 4,
        "NC-17" => 5,
        _ => 0,
    }
}

/// A resolved operand value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent entry or absent field.
    Empty,
    Text(String),
    Number(f64),
    List(Vec<Value>),
}

impl Value {
    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    /// Convert a literal from a rule file.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Empty,
            serde_json::Value::Bool(b) => Value::Text(b.to_string()),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Empty),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            other => Value::Text(other.to_string()),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn to_rating(&self) -> Value {
        match self {
            Value::Text(s) => Value::Number(f64::from(rating_ordinal(s))),
            Value::Empty => Value::Number(0.0),
            Value::List(items) => Value::List(items.iter().map(Value::to_rating).collect()),
            Value::Number(n) => Value::Number(*n),
        }
    }

    fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) => true,
            (Value::Empty, Value::Text(s)) | (Value::Text(s), Value::Empty) => s.is_empty(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Number(_), Value::Text(_)) | (Value::Text(_), Value::Number(_)) => {
                match (self.as_number(), other.as_number()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            _ => false,
        }
    }

    fn ordering(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Number(_), Value::Number(_))
            | (Value::Number(_), Value::Text(_))
            | (Value::Text(_), Value::Number(_)) => {
                self.as_number()?.partial_cmp(&other.as_number()?)
            }
            _ => None,
        }
    }

    /// The set view used by `IN`: list items, or comma-separated text.
    fn members(&self) -> Vec<Value> {
        match self {
            Value::List(items) => items.clone(),
            Value::Text(s) => s
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(Value::text)
                .collect(),
            Value::Number(n) => vec![Value::Number(*n)],
            Value::Empty => Vec::new(),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Eq,
    NotEq,
    Lte,
    Gte,
    Lt,
    Gt,
    In,
    /// Kept so the rule loads; always evaluates false.
    Unsupported(String),
}

impl Op {
    fn parse(token: &str, dialect: Dialect) -> Op {
        match token.trim() {
            "==" => Op::Eq,
            "!=" => Op::NotEq,
            "<=" => Op::Lte,
            ">=" => Op::Gte,
            "<" => Op::Lt,
            ">" => Op::Gt,
            "IN" | "in" if dialect == Dialect::Neighbour => Op::In,
            other => Op::Unsupported(other.to_string()),
        }
    }
}

/// Where an operand's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(Subject, Field),
    Literal(Value),
}

impl Operand {
    fn resolve(&self, ctx: &EvalContext<'_>) -> Value {
        match self {
            Operand::Field(subject, field) => ctx
                .entry(*subject)
                .map(|entry| field.read(entry))
                .unwrap_or(Value::Empty),
            Operand::Literal(value) => value.clone(),
        }
    }

    fn is_rating(&self) -> bool {
        matches!(self, Operand::Field(_, Field::Rating))
    }
}

/// A single comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub left: Operand,
    pub op: Op,
    pub right: Operand,
}

impl Atom {
    fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        let mut left = self.left.resolve(ctx);
        let mut right = self.right.resolve(ctx);

        if self.op != Op::In && (self.left.is_rating() || self.right.is_rating()) {
            left = left.to_rating();
            right = right.to_rating();
        }

        let outcome = match &self.op {
            Op::Eq => left.loosely_equals(&right),
            Op::NotEq => !left.loosely_equals(&right),
            Op::Lte => matches!(left.ordering(&right), Some(Ordering::Less | Ordering::Equal)),
            Op::Gte => matches!(left.ordering(&right), Some(Ordering::Greater | Ordering::Equal)),
            Op::Lt => left.ordering(&right) == Some(Ordering::Less),
            Op::Gt => left.ordering(&right) == Some(Ordering::Greater),
            Op::In => right.members().iter().any(|m| left.loosely_equals(m)),
            Op::Unsupported(token) => {
                warn!(operator = %token, "Unsupported operator, condition evaluates false");
                false
            }
        };
        trace!(?left, op = ?self.op, ?right, outcome, "Evaluated condition");
        outcome
    }
}

// ─── Compilation ─────────────────────────────────────────────────────

/// The two rule-file vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `{ "Field", "Expression", "Value" }` against the current entry.
    Placement,
    /// `{ "Left Parameter", "Expression", "Right Parameter" }` across a window.
    Neighbour,
}

/// Compile a rule's condition JSON into a [`ConditionTree`].
///
/// Shape problems produce [`ConditionTree::Invalid`] nodes. Only references
/// to fields that do not exist are rejected, so typos surface when the rule
/// file is loaded rather than as silently failing rules.
pub fn compile(
    json: &serde_json::Value,
    dialect: Dialect,
    rule: &str,
) -> Result<ConditionTree, RuleError> {
    let tree = compile_group(json, dialect, rule)?;
    if let ConditionTree::Invalid(reason) = &tree {
        warn!(rule = %rule, reason = %reason, "Rule condition is malformed and will never match");
    }
    Ok(tree)
}

fn compile_group(
    json: &serde_json::Value,
    dialect: Dialect,
    rule: &str,
) -> Result<ConditionTree, RuleError> {
    let Some(object) = json.as_object() else {
        return Ok(ConditionTree::Invalid("condition is not an object".into()));
    };
    let (children, all) = if let Some(children) = object.get("AND") {
        (children, true)
    } else if let Some(children) = object.get("OR") {
        (children, false)
    } else {
        return Ok(ConditionTree::Invalid("condition has neither AND nor OR".into()));
    };
    let Some(children) = children.as_array() else {
        return Ok(ConditionTree::Invalid("AND/OR value is not a list".into()));
    };

    let compiled = children
        .iter()
        .map(|child| compile_child(child, dialect, rule))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(if all {
        ConditionTree::All(compiled)
    } else {
        ConditionTree::Any(compiled)
    })
}

fn compile_child(
    json: &serde_json::Value,
    dialect: Dialect,
    rule: &str,
) -> Result<ConditionTree, RuleError> {
    match json.as_object() {
        Some(object) if object.contains_key("AND") || object.contains_key("OR") => {
            compile_group(json, dialect, rule)
        }
        Some(object) => match dialect {
            Dialect::Placement => compile_placement_atom(object, rule),
            Dialect::Neighbour => compile_neighbour_atom(object, rule),
        },
        None => {
            warn!(rule = %rule, "Condition entry is not an object");
            Ok(ConditionTree::Invalid("condition entry is not an object".into()))
        }
    }
}

type JsonObject = serde_json::Map<String, serde_json::Value>;

fn expression(object: &JsonObject, dialect: Dialect) -> Op {
    match object.get("Expression").and_then(|e| e.as_str()) {
        Some(token) => Op::parse(token, dialect),
        None => Op::Unsupported(String::new()),
    }
}

fn compile_placement_atom(object: &JsonObject, rule: &str) -> Result<ConditionTree, RuleError> {
    let Some(name) = object.get("Field").and_then(|f| f.as_str()) else {
        return Ok(ConditionTree::Invalid("condition has no Field".into()));
    };
    let field = lookup_field(name, rule)?;
    let right = object.get("Value").map(Value::from_json).unwrap_or(Value::Empty);
    Ok(ConditionTree::Atom(Atom {
        left: Operand::Field(Subject::Current, field),
        op: expression(object, Dialect::Placement),
        right: Operand::Literal(right),
    }))
}

fn compile_neighbour_atom(object: &JsonObject, rule: &str) -> Result<ConditionTree, RuleError> {
    let Some(param) = object.get("Left Parameter").and_then(|p| p.as_str()) else {
        return Ok(ConditionTree::Invalid("condition has no Left Parameter".into()));
    };
    let Some((subject, name)) = Subject::split_parameter(param) else {
        return Ok(ConditionTree::Invalid(format!(
            "left parameter '{param}' names no entry"
        )));
    };
    let left = Operand::Field(subject, lookup_field(name, rule)?);

    let right = match object.get("Right Parameter") {
        Some(serde_json::Value::String(param)) => match Subject::split_parameter(param) {
            Some((subject, name)) => Operand::Field(subject, lookup_field(name, rule)?),
            None => Operand::Literal(Value::Text(param.clone())),
        },
        Some(other) => Operand::Literal(Value::from_json(other)),
        None => Operand::Literal(Value::Empty),
    };

    Ok(ConditionTree::Atom(Atom {
        left,
        op: expression(object, Dialect::Neighbour),
        right,
    }))
}

fn lookup_field(name: &str, rule: &str) -> Result<Field, RuleError> {
    Field::from_name(name).ok_or_else(|| RuleError::UnknownField {
        rule: rule.to_string(),
        field: name.to_string(),
    })
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use epgedit_core::parse_xmltv_time;
    use serde_json::json;

    fn entry(id: &str, genre: &str, rating: &str) -> ProgramEntry {
        ProgramEntry {
            channel_id: "C1".into(),
            program_id: id.into(),
            title: format!("Title {id}"),
            description: String::new(),
            genre: genre.into(),
            rating: rating.into(),
            duration_minutes: 90,
            filler_minutes: 5,
            rule_annotation: String::new(),
            start: parse_xmltv_time("20240301190000").unwrap(),
            stop: parse_xmltv_time("20240301203500").unwrap(),
            slot: Some("Prime Time".into()),
        }
    }

    fn placement(json: serde_json::Value) -> ConditionTree {
        compile(&json, Dialect::Placement, "test").unwrap()
    }

    fn neighbour(json: serde_json::Value) -> ConditionTree {
        compile(&json, Dialect::Neighbour, "test").unwrap()
    }

    #[test]
    fn empty_and_is_true_empty_or_is_false() {
        let e = entry("P1", "Drama", "PG");
        let ctx = EvalContext::single(&e);
        assert!(placement(json!({"AND": []})).evaluate(&ctx));
        assert!(!placement(json!({"OR": []})).evaluate(&ctx));
    }

    #[test]
    fn tree_without_and_or_is_false() {
        let e = entry("P1", "Drama", "PG");
        let ctx = EvalContext::single(&e);
        let tree = placement(json!({"Field": "genres", "Expression": "==", "Value": "Drama"}));
        assert!(matches!(tree, ConditionTree::Invalid(_)));
        assert!(!tree.evaluate(&ctx));
        assert!(!placement(json!([1, 2])).evaluate(&ctx));
    }

    #[test]
    fn rating_compares_by_ordinal() {
        let ratings = ["G", "PG", "PG-13", "R", "NC-17"];
        for (i, lower) in ratings.iter().enumerate() {
            for higher in &ratings[i + 1..] {
                let e = entry("P1", "Drama", higher);
                let ctx = EvalContext::single(&e);
                let tree = placement(json!({"AND": [
                    {"Field": "pc_rating", "Expression": ">", "Value": lower}
                ]}));
                assert!(tree.evaluate(&ctx), "{higher} should outrank {lower}");
            }
        }
        // "NC-17" sorts before "R" as text.
        let e = entry("P1", "Drama", "NC-17");
        let ctx = EvalContext::single(&e);
        assert!(placement(json!({"AND": [{"Field": "pc_rating", "Expression": ">=", "Value": "R"}]}))
            .evaluate(&ctx));
    }

    #[test]
    fn unknown_rating_maps_to_zero() {
        assert_eq!(rating_ordinal("TV-MA"), 0);
        assert_eq!(rating_ordinal(" pg-13 "), 3);
        let e = entry("P1", "Drama", "Unrated");
        let ctx = EvalContext::single(&e);
        assert!(placement(json!({"AND": [{"Field": "pc_rating", "Expression": "<", "Value": "G"}]}))
            .evaluate(&ctx));
    }

    #[test]
    fn numeric_fields_compare_numerically() {
        let e = entry("P1", "Drama", "PG");
        let ctx = EvalContext::single(&e);
        assert!(placement(json!({"AND": [{"Field": "duration", "Expression": ">=", "Value": 90}]}))
            .evaluate(&ctx));
        assert!(placement(json!({"AND": [{"Field": "duration", "Expression": "<", "Value": "120"}]}))
            .evaluate(&ctx));
        assert!(!placement(json!({"AND": [{"Field": "duration", "Expression": ">", "Value": "long"}]}))
            .evaluate(&ctx));
    }

    #[test]
    fn unknown_operator_is_false() {
        let e = entry("P1", "Drama", "PG");
        let ctx = EvalContext::single(&e);
        let tree = placement(json!({"AND": [{"Field": "genres", "Expression": "~=", "Value": "Drama"}]}));
        assert!(!tree.evaluate(&ctx));
    }

    #[test]
    fn in_is_not_a_placement_operator() {
        let e = entry("P1", "Drama", "PG");
        let ctx = EvalContext::single(&e);
        let tree = placement(json!({"AND": [{"Field": "genres", "Expression": "IN", "Value": ["Drama"]}]}));
        assert!(!tree.evaluate(&ctx));
    }

    #[test]
    fn unknown_field_fails_at_compile_time() {
        let err = compile(
            &json!({"AND": [{"Field": "colour", "Expression": "==", "Value": "red"}]}),
            Dialect::Placement,
            "R7",
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::UnknownField { ref field, .. } if field == "colour"));

        assert!(compile(
            &json!({"OR": [{"Left Parameter": "previous_movie_colour", "Expression": "==", "Right Parameter": "x"}]}),
            Dialect::Neighbour,
            "N1",
        )
        .is_err());
    }

    #[test]
    fn nested_groups_evaluate_recursively() {
        let e = entry("P1", "Horror", "R");
        let ctx = EvalContext::single(&e);
        let tree = placement(json!({"AND": [
            {"Field": "pc_rating", "Expression": ">=", "Value": "R"},
            {"OR": [
                {"Field": "genres", "Expression": "==", "Value": "Horror"},
                {"Field": "genres", "Expression": "==", "Value": "Thriller"}
            ]}
        ]}));
        assert!(tree.evaluate(&ctx));
    }

    #[test]
    fn neighbour_parameters_resolve_by_position() {
        let entries = vec![
            entry("P1", "Comedy", "G"),
            entry("P2", "Drama", "PG"),
            entry("P3", "Drama", "PG"),
        ];
        let same_genre = neighbour(json!({"AND": [{
            "Left Parameter": "current_movie_genres",
            "Expression": "==",
            "Right Parameter": "previous_movie_genres"
        }]}));
        assert!(!same_genre.evaluate(&EvalContext::window(&entries, 1)));
        assert!(same_genre.evaluate(&EvalContext::window(&entries, 2)));

        let three_back = neighbour(json!({"AND": [{
            "Left Parameter": "previous_movie1_genres",
            "Expression": "==",
            "Right Parameter": "Comedy"
        }]}));
        assert!(!three_back.evaluate(&EvalContext::window(&entries, 1)));
        assert!(three_back.evaluate(&EvalContext::window(&entries, 2)));
    }

    #[test]
    fn absent_previous_of_previous_is_empty() {
        let entries = vec![entry("P1", "Comedy", "G"), entry("P2", "Drama", "PG")];
        let ctx = EvalContext::window(&entries, 1);
        let tree = neighbour(json!({"AND": [{
            "Left Parameter": "previous_movie1_genres",
            "Expression": "==",
            "Right Parameter": ""
        }]}));
        assert!(tree.evaluate(&ctx));
    }

    #[test]
    fn in_checks_list_and_comma_separated_sets() {
        let entries = vec![entry("P1", "Horror", "R"), entry("P2", "Kids", "G")];
        let ctx = EvalContext::window(&entries, 1);
        let literal_list = neighbour(json!({"AND": [{
            "Left Parameter": "previous_movie_genres",
            "Expression": "IN",
            "Right Parameter": ["Horror", "Thriller"]
        }]}));
        assert!(literal_list.evaluate(&ctx));

        let literal_text = neighbour(json!({"AND": [{
            "Left Parameter": "current_movie_genres",
            "Expression": "IN",
            "Right Parameter": "Kids, Family"
        }]}));
        assert!(literal_text.evaluate(&ctx));

        let miss = neighbour(json!({"AND": [{
            "Left Parameter": "current_movie_genres",
            "Expression": "IN",
            "Right Parameter": ["Horror"]
        }]}));
        assert!(!miss.evaluate(&ctx));
    }

    #[test]
    fn in_resolves_right_parameter_from_neighbour_field() {
        let mut previous = entry("P1", "Horror", "R");
        previous.rule_annotation = "Thriller, Horror,Crime".into();
        let entries = vec![previous, entry("P2", "Horror", "R"), entry("P3", "Kids", "G")];
        let tree = neighbour(json!({"AND": [{
            "Left Parameter": "current_movie_genres",
            "Expression": "IN",
            "Right Parameter": "previous_movie_applied_rules"
        }]}));

        assert!(tree.evaluate(&EvalContext::window(&entries, 1)));
        // P2's annotation is empty, so nothing is a member.
        assert!(!tree.evaluate(&EvalContext::window(&entries, 2)));

        let two_back = neighbour(json!({"AND": [{
            "Left Parameter": "current_movie_genres",
            "Expression": "IN",
            "Right Parameter": "previous_movie1_applied_rules"
        }]}));
        let mut shifted = entries.clone();
        shifted[2].genre = "Crime".into();
        assert!(two_back.evaluate(&EvalContext::window(&shifted, 2)));
        shifted[2].genre = "Kids".into();
        assert!(!two_back.evaluate(&EvalContext::window(&shifted, 2)));
    }

    #[test]
    fn unprefixed_left_parameter_is_invalid_not_fatal() {
        let entries = vec![entry("P1", "Horror", "R"), entry("P2", "Kids", "G")];
        let tree = neighbour(json!({"AND": [{
            "Left Parameter": "genres",
            "Expression": "==",
            "Right Parameter": "Kids"
        }]}));
        assert!(!tree.evaluate(&EvalContext::window(&entries, 1)));
    }

    #[test]
    fn slot_field_reads_assigned_slot() {
        let mut e = entry("P1", "Drama", "PG");
        let tree = placement(json!({"AND": [{"Field": "timeslot", "Expression": "==", "Value": "Prime Time"}]}));
        assert!(tree.evaluate(&EvalContext::single(&e)));
        e.slot = None;
        assert!(!tree.evaluate(&EvalContext::single(&e)));
    }
}
