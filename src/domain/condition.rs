//! Condition tree data model.
//!
//! A condition is a tree of combinator groups:
//! - `Rule`: a single typed comparison of a factor against a value
//! - `Group`: an `ALL`/`ANY` combinator over ordered rules and child groups
//! - `ConditionTree`: the document root, a versioned root group
//!
//! Groups are addressed by a path of child indices descending from the root;
//! the empty path is the root itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::codec::{null_as_default, scalar_text, version_or_default};
use crate::domain::error::ConditionError;

/// Schema version written into every new document.
pub const SCHEMA_VERSION: &str = "1.0";

/// Combinator applied to a group's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Mode {
    /// Logical AND over all members.
    #[default]
    All,
    /// Logical OR over all members.
    Any,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::All => "ALL",
            Mode::Any => "ANY",
        }
    }
}

impl FromStr for Mode {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Mode::All),
            "ANY" => Ok(Mode::Any),
            _ => Err(ConditionError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = ConditionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Operator {
    Gt,
    #[default]
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
    Contains,
    StartsWith,
    EndsWith,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::Eq,
        Operator::Neq,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Gt => "GT",
            Operator::Lt => "LT",
            Operator::Gte => "GTE",
            Operator::Lte => "LTE",
            Operator::Eq => "EQ",
            Operator::Neq => "NEQ",
            Operator::Contains => "CONTAINS",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
        }
    }
}

impl FromStr for Operator {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| ConditionError::InvalidOperator {
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for Operator {
    type Error = ConditionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule's textual value is interpreted downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum ValueType {
    #[default]
    Number,
    String,
    Boolean,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Number => "NUMBER",
            ValueType::String => "STRING",
            ValueType::Boolean => "BOOLEAN",
        }
    }
}

impl FromStr for ValueType {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NUMBER" => Ok(ValueType::Number),
            "STRING" => Ok(ValueType::String),
            "BOOLEAN" => Ok(ValueType::Boolean),
            _ => Err(ConditionError::InvalidValueType {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = ConditionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single comparison of a factor against a textual operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub factor: String,
    pub operator: Operator,
    #[serde(default, deserialize_with = "scalar_text")]
    pub value: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub value_type: ValueType,
    /// A missing factor value satisfies the rule instead of failing it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub nullable: bool,
}

impl Rule {
    pub fn new(
        factor: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        Self {
            factor: factor.into(),
            operator,
            value: value.into(),
            value_type,
            nullable: false,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type {
            ValueType::String => write!(f, "{} {} {:?}", self.factor, self.operator, self.value)?,
            _ => write!(f, "{} {} {}", self.factor, self.operator, self.value)?,
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode: Mode,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<Group>,
}

impl Group {
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Resolve `path` relative to this group.
    pub fn descendant(&self, path: &[usize]) -> Result<&Group, ConditionError> {
        let mut group = self;
        for &index in path {
            group = group
                .groups
                .get(index)
                .ok_or_else(|| ConditionError::path_not_found(path))?;
        }
        Ok(group)
    }

    pub fn descendant_mut(&mut self, path: &[usize]) -> Result<&mut Group, ConditionError> {
        let mut group = self;
        for &index in path {
            group = group
                .groups
                .get_mut(index)
                .ok_or_else(|| ConditionError::path_not_found(path))?;
        }
        Ok(group)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len() + self.groups.iter().map(Group::rule_count).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.groups.iter().map(Group::depth).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.groups.is_empty()
    }

    fn collect_factors<'a>(&'a self, out: &mut Vec<&'a str>) {
        for rule in &self.rules {
            if !out.contains(&rule.factor.as_str()) {
                out.push(&rule.factor);
            }
        }
        for group in &self.groups {
            group.collect_factors(out);
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.mode)?;
        let mut first = true;
        for rule in &self.rules {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{rule}")?;
            first = false;
        }
        for group in &self.groups {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{group}")?;
            first = false;
        }
        f.write_str(")")
    }
}

/// Root of a condition document.
///
/// The root group's fields are flattened into the document alongside
/// `version`, so the wire shape is `{version, mode, rules, groups}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionTree {
    #[serde(default = "default_version", deserialize_with = "version_or_default")]
    pub version: String,
    #[serde(flatten)]
    pub root: Group,
}

pub(crate) fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Default for ConditionTree {
    fn default() -> Self {
        Self {
            version: default_version(),
            root: Group::default(),
        }
    }
}

impl ConditionTree {
    pub fn group(&self, path: &[usize]) -> Result<&Group, ConditionError> {
        self.root.descendant(path)
    }

    pub fn group_mut(&mut self, path: &[usize]) -> Result<&mut Group, ConditionError> {
        self.root.descendant_mut(path)
    }

    /// Total number of rules at every level.
    pub fn rule_count(&self) -> usize {
        self.root.rule_count()
    }

    /// Nesting depth; a root without child groups has depth 1.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Distinct factor keys referenced anywhere in the tree, in depth-first
    /// order with a group's own rules ahead of its children.
    pub fn factors(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.root.collect_factors(&mut out);
        out
    }
}

impl fmt::Display for ConditionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}
