//! Rule tree compiler
//!
//! Walks a [`RuleDocument`] depth-first in declaration order and produces a
//! validated [`RuleTree`]. For each rule it checks block cardinality, then
//! placement constraints, then recurses into children. The first violation
//! aborts the whole compile.

use crate::error::{Result, RuleError};
use crate::model::{
    BlockSpec, Entry, PlacementConstraints, RuleDocument, RuleNode, RuleOptions, RuleSpec,
};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::sync::OnceLock;

/// Rule format used when a document does not pin one
pub const LATEST_RULE_FORMAT: &str = "latest";

fn rule_format_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(latest|v\d{4}-\d{2}-\d{2})$").expect("rule format pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Require exactly one entry per `behavior`/`criterion` block
    pub strict: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// A compiled rule tree together with its format tag
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTree {
    pub rule_format: String,
    pub root: RuleNode,
}

impl RuleTree {
    /// The full document as sent to the property API
    pub fn document(&self) -> Result<Value> {
        Ok(json!({
            "_ruleFormat_": self.rule_format,
            "rules": serde_json::to_value(&self.root)?,
        }))
    }

    /// Pretty-printed document. Output is stable for a given tree.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document()?)?)
    }
}

pub struct RuleTreeCompiler {
    options: CompilerOptions,
    constraints: PlacementConstraints,
}

impl RuleTreeCompiler {
    pub fn new(constraints: PlacementConstraints) -> Self {
        Self {
            options: CompilerOptions::default(),
            constraints,
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn compile(&self, document: &RuleDocument) -> Result<RuleTree> {
        if !rule_format_pattern().is_match(&document.rule_format) {
            return Err(RuleError::InvalidRuleFormat(document.rule_format.clone()));
        }

        let root = self.compile_rule(&document.root, None)?;
        tracing::debug!(
            "Compiled rule tree '{}' ({} rules, format {})",
            root.name,
            root.count(),
            document.rule_format
        );

        Ok(RuleTree {
            rule_format: document.rule_format.clone(),
            root,
        })
    }

    fn compile_rule(&self, spec: &RuleSpec, parent_path: Option<&str>) -> Result<RuleNode> {
        let is_default = parent_path.is_none();
        let path = match parent_path {
            Some(parent) => format!("{}/{}", parent, spec.name),
            None => spec.name.clone(),
        };

        let behaviors = self.flatten_blocks(&spec.behaviors, "behavior", &path)?;
        let criteria = self.flatten_blocks(&spec.criteria, "criterion", &path)?;

        for field in spec.fields() {
            if !self.constraints.allows(field, is_default) {
                return Err(RuleError::IllegalPlacement {
                    field: field.to_string(),
                    path,
                });
            }
        }

        let children = spec
            .children
            .iter()
            .map(|child| self.compile_rule(child, Some(&path)))
            .collect::<Result<Vec<_>>>()?;

        Ok(RuleNode {
            name: spec.name.clone(),
            is_default,
            children,
            behaviors,
            uuid: spec.uuid.clone(),
            criteria,
            criteria_must_satisfy: spec.criteria_must_satisfy,
            options: RuleOptions {
                is_secure: spec.is_secure,
            },
            variables: spec.variables.clone(),
            comments: spec.comments.clone(),
            template_uuid: spec.template_uuid.clone(),
            criteria_locked: spec.criteria_locked,
        })
    }

    fn flatten_blocks(
        &self,
        blocks: &[BlockSpec],
        block: &'static str,
        path: &str,
    ) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for spec in blocks {
            match spec.entries.len() {
                0 => {
                    return Err(RuleError::EmptyBlock {
                        path: path.to_string(),
                        block,
                    });
                }
                got if self.options.strict && got != 1 => {
                    return Err(RuleError::TooManyElements {
                        path: path.to_string(),
                        block,
                        got,
                        want: 1,
                    });
                }
                _ => {
                    for entry in &spec.entries {
                        entries.push(normalize_entry(entry, path)?);
                    }
                }
            }
        }
        Ok(entries)
    }
}

fn normalize_entry(entry: &Entry, path: &str) -> Result<Entry> {
    Ok(Entry {
        name: to_camel_case(&entry.name),
        options: normalize_options(&entry.options, &entry.name, path)?,
    })
}

/// Keys that collapse to the same camelCase name are rejected
fn normalize_options(
    options: &Map<String, Value>,
    entry: &str,
    path: &str,
) -> Result<Map<String, Value>> {
    let mut normalized = Map::new();
    for (key, value) in options {
        let value = match value {
            Value::Object(nested) => Value::Object(normalize_options(nested, entry, path)?),
            other => other.clone(),
        };
        let name = to_camel_case(key);
        if normalized.contains_key(&name) {
            return Err(RuleError::InvalidValue {
                field: entry.to_string(),
                path: path.to_string(),
                message: format!("option '{}' is given more than once", name),
            });
        }
        normalized.insert(name, value);
    }
    Ok(normalized)
}

/// `gzip_response` / `gzip-response` -> `gzipResponse`
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' || c == '-' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
