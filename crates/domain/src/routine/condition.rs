//! Condition — a boolean guard over atoms checked against [`Facts`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::expr::{self, AtomLabel, ConditionExpr};
use crate::error::{ParseError, ValidationError};
use crate::facts::Facts;
use crate::id::{ChannelId, RoleId, UserId};
use crate::time::{DateRange, TimeRange};

/// A leaf comparison against one fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Atom {
    /// The triggering member is this user.
    User { id: UserId },
    /// The triggering voice channel is this one.
    Channel { id: ChannelId },
    /// The triggering member holds this role.
    Role { id: RoleId },
    /// Local time of day falls in the range (wraps past midnight).
    Time { range: TimeRange },
    /// Local date falls in the range (wraps past the new year).
    Date { range: DateRange },
}

impl Atom {
    /// A missing user or channel fact never matches.
    #[must_use]
    pub fn matches(&self, facts: &Facts) -> bool {
        match self {
            Self::User { id } => facts.user_id.as_ref() == Some(id),
            Self::Channel { id } => facts.channel_id.as_ref() == Some(id),
            Self::Role { id } => facts.has_role(id),
            Self::Time { range } => range.contains(facts.time),
            Self::Date { range } => range.contains(facts.date),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User { id } => write!(f, "user={id}"),
            Self::Channel { id } => write!(f, "channel={id}"),
            Self::Role { id } => write!(f, "role={id}"),
            Self::Time { range } => write!(f, "time={range}"),
            Self::Date { range } => write!(f, "date={range}"),
        }
    }
}

/// Ordered atoms addressed by positional label (`C1`, `C2`, …).
///
/// Order is significant and survives persistence untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomTable(Vec<Atom>);

impl AtomTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an atom and return its label. An identical atom keeps the label
    /// it was first given.
    pub fn push(&mut self, atom: Atom) -> AtomLabel {
        if let Some(index) = self.0.iter().position(|a| *a == atom) {
            return AtomLabel::from_index(index);
        }
        self.0.push(atom);
        AtomLabel::from_index(self.0.len() - 1)
    }

    #[must_use]
    pub fn get(&self, label: AtomLabel) -> Option<&Atom> {
        self.0.get(label.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AtomLabel, &Atom)> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, atom)| (AtomLabel::from_index(i), atom))
    }

    fn labels(&self) -> Vec<AtomLabel> {
        (0..self.0.len()).map(AtomLabel::from_index).collect()
    }
}

impl FromIterator<Atom> for AtomTable {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        let mut table = Self::new();
        for atom in iter {
            table.push(atom);
        }
        table
    }
}

/// A routine guard: an atom table plus an expression over its labels.
///
/// Built in simple mode ([`Condition::all`], [`Condition::any`],
/// [`Condition::exactly_one`]) or advanced mode ([`Condition::parse`]).
/// Every label the expression references exists in the table; this holds
/// for deserialized values too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConditionRepr")]
pub struct Condition {
    atoms: AtomTable,
    expr: ConditionExpr,
    #[serde(skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
}

impl Condition {
    /// Combine an expression with its atom table.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyCondition`] for an empty table
    /// - [`ValidationError::UnknownLabel`] if `expr` references a label
    ///   outside the table
    pub fn new(atoms: AtomTable, expr: ConditionExpr) -> Result<Self, ValidationError> {
        if atoms.is_empty() {
            return Err(ValidationError::EmptyCondition);
        }
        if let Some(unknown) = expr.labels().into_iter().find(|l| atoms.get(*l).is_none()) {
            return Err(ValidationError::UnknownLabel(unknown.to_string()));
        }
        Ok(Self {
            atoms,
            expr,
            expression: None,
        })
    }

    /// Every atom must hold.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCondition`] when `atoms` is empty.
    pub fn all(atoms: impl IntoIterator<Item = Atom>) -> Result<Self, ValidationError> {
        Self::simple(atoms, ConditionExpr::and)
    }

    /// At least one atom must hold.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCondition`] when `atoms` is empty.
    pub fn any(atoms: impl IntoIterator<Item = Atom>) -> Result<Self, ValidationError> {
        Self::simple(atoms, ConditionExpr::or)
    }

    /// Exactly one atom must hold.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCondition`] when `atoms` is empty.
    pub fn exactly_one(atoms: impl IntoIterator<Item = Atom>) -> Result<Self, ValidationError> {
        Self::simple(atoms, ConditionExpr::xor)
    }

    fn simple(
        atoms: impl IntoIterator<Item = Atom>,
        combine: fn(Vec<ConditionExpr>) -> ConditionExpr,
    ) -> Result<Self, ValidationError> {
        let atoms: AtomTable = atoms.into_iter().collect();
        if atoms.is_empty() {
            return Err(ValidationError::EmptyCondition);
        }
        let expr = combine(atoms.labels().into_iter().map(ConditionExpr::atom).collect());
        Self::new(atoms, expr)
    }

    /// Parse an advanced expression such as `(C1 AND C2) OR NOT C3`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for malformed text or a label the table does
    /// not define.
    pub fn parse(atoms: AtomTable, text: &str) -> Result<Self, ParseError> {
        let expr = expr::parse(text, atoms.len())?;
        Ok(Self {
            atoms,
            expr,
            expression: Some(text.trim().to_string()),
        })
    }

    #[must_use]
    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    #[must_use]
    pub fn expr(&self) -> &ConditionExpr {
        &self.expr
    }

    /// Source text for conditions written in advanced mode.
    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    #[must_use]
    pub fn evaluate(&self, facts: &Facts) -> bool {
        self.expr.evaluate(&|label: AtomLabel| {
            self.atoms.get(label).is_some_and(|atom| atom.matches(facts))
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        for (label, atom) in self.atoms.iter() {
            write!(f, "; {label}: {atom}")?;
        }
        Ok(())
    }
}

/// Wire form: `expr` wins, then `expression` is parsed, and with neither
/// every atom must hold.
#[derive(Deserialize)]
struct ConditionRepr {
    atoms: AtomTable,
    #[serde(default)]
    expr: Option<ConditionExpr>,
    #[serde(default)]
    expression: Option<String>,
}

impl TryFrom<ConditionRepr> for Condition {
    type Error = ValidationError;

    fn try_from(repr: ConditionRepr) -> Result<Self, Self::Error> {
        match (repr.expr, repr.expression) {
            (Some(expr), expression) => {
                let mut condition = Self::new(repr.atoms, expr)?;
                condition.expression = expression;
                Ok(condition)
            }
            (None, Some(text)) => {
                if repr.atoms.is_empty() {
                    return Err(ValidationError::EmptyCondition);
                }
                Self::parse(repr.atoms, &text).map_err(ValidationError::Expression)
            }
            (None, None) => {
                let expr = ConditionExpr::and(
                    repr.atoms
                        .labels()
                        .into_iter()
                        .map(ConditionExpr::atom)
                        .collect(),
                );
                Self::new(repr.atoms, expr)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn facts(h: u32, m: u32) -> Facts {
        Facts::at(
            NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
        )
    }

    fn user(id: &str) -> Atom {
        Atom::User {
            id: UserId::new(id).unwrap(),
        }
    }

    fn role(id: &str) -> Atom {
        Atom::Role {
            id: RoleId::new(id).unwrap(),
        }
    }

    fn night() -> Atom {
        Atom::Time {
            range: "22:00-02:00".parse().unwrap(),
        }
    }

    #[test]
    fn should_assign_labels_in_first_seen_order_and_reuse_duplicates() {
        let mut table = AtomTable::new();
        assert_eq!(table.push(user("1")).to_string(), "C1");
        assert_eq!(table.push(role("2")).to_string(), "C2");
        assert_eq!(table.push(user("1")).to_string(), "C1");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn should_never_match_user_atom_without_user_fact() {
        assert!(!user("1").matches(&facts(12, 0)));
        let with_user = facts(12, 0).with_user(UserId::new("1").unwrap());
        assert!(user("1").matches(&with_user));
    }

    #[test]
    fn should_match_role_atom_when_member_holds_role() {
        let f = facts(12, 0).with_roles([RoleId::new("9").unwrap()]);
        assert!(role("9").matches(&f));
        assert!(!role("8").matches(&f));
    }

    #[test]
    fn should_require_every_atom_in_all_mode() {
        let condition = Condition::all([user("1"), night()]).unwrap();
        let member = facts(23, 30).with_user(UserId::new("1").unwrap());
        assert!(condition.evaluate(&member));
        assert!(!condition.evaluate(&facts(23, 30)));
    }

    #[test]
    fn should_accept_any_atom_in_any_mode() {
        let condition = Condition::any([user("1"), night()]).unwrap();
        assert!(condition.evaluate(&facts(1, 0)));
        assert!(!condition.evaluate(&facts(12, 0)));
    }

    #[test]
    fn should_require_exactly_one_atom_in_exactly_one_mode() {
        let condition = Condition::exactly_one([user("1"), night()]).unwrap();
        let member_at_night = facts(23, 0).with_user(UserId::new("1").unwrap());
        assert!(!condition.evaluate(&member_at_night));
        assert!(condition.evaluate(&facts(23, 0)));
    }

    #[test]
    fn should_reject_empty_simple_condition() {
        assert_eq!(
            Condition::all(Vec::new()),
            Err(ValidationError::EmptyCondition)
        );
    }

    #[test]
    fn should_evaluate_advanced_expression_against_table() {
        let table: AtomTable = [user("1"), role("2"), night()].into_iter().collect();
        let condition = Condition::parse(table, "(C1 OR C2) AND NOT C3").unwrap();
        let f = facts(12, 0).with_roles([RoleId::new("2").unwrap()]);
        assert!(condition.evaluate(&f));
        assert_eq!(condition.expression(), Some("(C1 OR C2) AND NOT C3"));
    }

    #[test]
    fn should_reject_expression_with_label_outside_table() {
        let table: AtomTable = [user("1")].into_iter().collect();
        let err = Condition::parse(table, "C1 AND C2").unwrap_err();
        assert_eq!(err.token, "C2");
    }

    #[test]
    fn should_reject_unknown_label_when_building_from_parts() {
        let table: AtomTable = [user("1")].into_iter().collect();
        let expr = ConditionExpr::atom(AtomLabel::from_index(4));
        assert_eq!(
            Condition::new(table, expr),
            Err(ValidationError::UnknownLabel("C5".to_string()))
        );
    }

    #[test]
    fn should_keep_labels_positional_through_serde() {
        let table: AtomTable = [user("1"), night()].into_iter().collect();
        let condition = Condition::parse(table, "C2 XOR C1").unwrap();
        let json = serde_json::to_value(&condition).unwrap();
        let back: Condition = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, condition);
        assert_eq!(json["atoms"][1]["range"], "22:00-02:00");
    }

    #[test]
    fn should_reject_unknown_label_on_deserialize() {
        let json = serde_json::json!({
            "atoms": [{"type": "user", "id": "1"}],
            "expr": {"type": "atom", "label": "C3"}
        });
        assert!(serde_json::from_value::<Condition>(json).is_err());
    }

    #[test]
    fn should_parse_expression_text_when_tree_is_absent() {
        let json = serde_json::json!({
            "atoms": [{"type": "user", "id": "1"}, {"type": "role", "id": "2"}],
            "expression": "C1 OR C2"
        });
        let condition: Condition = serde_json::from_value(json).unwrap();
        assert_eq!(condition.expr().to_string(), "C1 OR C2");
    }

    #[test]
    fn should_default_to_all_when_only_atoms_are_given() {
        let json = serde_json::json!({
            "atoms": [{"type": "user", "id": "1"}, {"type": "role", "id": "2"}]
        });
        let condition: Condition = serde_json::from_value(json).unwrap();
        assert_eq!(condition.expr().to_string(), "C1 AND C2");
    }

    #[test]
    fn should_display_expression_and_legend() {
        let condition = Condition::all([user("1"), night()]).unwrap();
        assert_eq!(
            condition.to_string(),
            "C1 AND C2; C1: user=1; C2: time=22:00-02:00"
        );
    }
}
