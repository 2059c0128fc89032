//! Rule tree model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A parsed rule document: the format tag plus the default (root) rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDocument {
    /// Rule format (`latest` or `vYYYY-MM-DD`)
    pub rule_format: String,

    /// The default rule; every other rule is nested below it
    pub root: RuleSpec,
}

/// A rule as written in the document, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSpec {
    pub name: String,
    pub is_secure: Option<bool>,
    pub comments: Option<String>,
    pub uuid: Option<String>,
    pub template_uuid: Option<String>,
    pub criteria_must_satisfy: Option<CriteriaMustSatisfy>,
    pub criteria_locked: Option<bool>,
    pub variables: Vec<Variable>,

    /// `behavior { ... }` blocks in declaration order
    pub behaviors: Vec<BlockSpec>,

    /// `criterion { ... }` blocks in declaration order
    pub criteria: Vec<BlockSpec>,

    /// Nested rules in declaration order
    pub children: Vec<RuleSpec>,
}

impl RuleSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Field names present on this rule, in a fixed order.
    ///
    /// These are the names placement constraints are checked against.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.is_secure.is_some() {
            fields.push("is_secure");
        }
        if self.comments.is_some() {
            fields.push("comments");
        }
        if self.uuid.is_some() {
            fields.push("uuid");
        }
        if self.template_uuid.is_some() {
            fields.push("template_uuid");
        }
        if self.criteria_must_satisfy.is_some() {
            fields.push("criteria_must_satisfy");
        }
        if self.criteria_locked.is_some() {
            fields.push("criteria_locked");
        }
        if !self.variables.is_empty() {
            fields.push("variable");
        }
        if !self.behaviors.is_empty() {
            fields.push("behavior");
        }
        if !self.criteria.is_empty() {
            fields.push("criterion");
        }
        fields
    }
}

/// A `behavior` or `criterion` block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSpec {
    pub entries: Vec<Entry>,
}

impl BlockSpec {
    pub fn single(entry: Entry) -> Self {
        Self {
            entries: vec![entry],
        }
    }
}

/// A named behavior or criterion with its options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub options: Map<String, Value>,
}

impl Entry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// User-defined rule variable (root rule only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
    pub description: String,
    pub hidden: bool,
    pub sensitive: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaMustSatisfy {
    All,
    Any,
}

impl FromStr for CriteriaMustSatisfy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(CriteriaMustSatisfy::All),
            "any" => Ok(CriteriaMustSatisfy::Any),
            other => Err(format!("expected 'all' or 'any', got '{}'", other)),
        }
    }
}

impl fmt::Display for CriteriaMustSatisfy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriteriaMustSatisfy::All => write!(f, "all"),
            CriteriaMustSatisfy::Any => write!(f, "any"),
        }
    }
}

/// Options carried on a rule itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_secure: Option<bool>,
}

impl RuleOptions {
    pub fn is_empty(&self) -> bool {
        self.is_secure.is_none()
    }
}

/// A validated rule. Children are owned by their parent, so the tree has no cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleNode {
    pub name: String,

    /// Set on the default (root) rule only
    #[serde(skip)]
    pub is_default: bool,

    pub children: Vec<RuleNode>,
    pub behaviors: Vec<Entry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<Entry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria_must_satisfy: Option<CriteriaMustSatisfy>,

    #[serde(skip_serializing_if = "RuleOptions::is_empty")]
    pub options: RuleOptions,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_uuid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria_locked: Option<bool>,
}

impl RuleNode {
    /// Number of rules in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RuleNode::count).sum::<usize>()
    }
}
