//! KDL rule document parser
//!
//! A document has a single `rules` node carrying the rule format and the
//! default rule:
//!
//! ```kdl
//! rules "v2023-01-05" {
//!     rule "default" {
//!         is-secure #false
//!         behavior {
//!             origin hostname="origin.example.com"
//!         }
//!         rule "Static Content" { ... }
//!     }
//! }
//! ```

mod rule;

use crate::compiler::LATEST_RULE_FORMAT;
use crate::error::{Result, RuleError};
use crate::model::RuleDocument;
use kdl::KdlDocument;
use std::fs;
use std::path::Path;

pub use rule::parse_rule;

/// Parse a rule document from a file
pub fn parse_rules_file<P: AsRef<Path>>(path: P) -> Result<RuleDocument> {
    parse_rules_file_with_format(path, LATEST_RULE_FORMAT)
}

/// Parse a rule document from a file, using `default_format` when the
/// `rules` node does not name one
pub fn parse_rules_file_with_format<P: AsRef<Path>>(
    path: P,
    default_format: &str,
) -> Result<RuleDocument> {
    let content = fs::read_to_string(path.as_ref())?;
    tracing::debug!("Parsing rule document: {}", path.as_ref().display());
    parse_rules_string_with_format(&content, default_format)
}

/// Parse a rule document from a string
pub fn parse_rules_string(content: &str) -> Result<RuleDocument> {
    parse_rules_string_with_format(content, LATEST_RULE_FORMAT)
}

pub fn parse_rules_string_with_format(content: &str, default_format: &str) -> Result<RuleDocument> {
    let doc: KdlDocument = content.parse()?;

    let mut document = None;

    for node in doc.nodes() {
        match node.name().value() {
            "rules" => {
                if document.is_some() {
                    return Err(RuleError::InvalidDocument(
                        "only one 'rules' node is allowed".to_string(),
                    ));
                }

                let rule_format = node
                    .entries()
                    .first()
                    .filter(|e| e.name().is_none())
                    .and_then(|e| e.value().as_string())
                    .unwrap_or(default_format)
                    .to_string();

                let rules: Vec<_> = node
                    .children()
                    .map(|c| c.nodes().iter().collect())
                    .unwrap_or_default();

                let root = match rules.as_slice() {
                    [single] if single.name().value() == "rule" => parse_rule(single, None)?,
                    [other] => {
                        return Err(RuleError::InvalidDocument(format!(
                            "expected a 'rule' node inside 'rules', got '{}'",
                            other.name().value()
                        )));
                    }
                    _ => {
                        return Err(RuleError::InvalidDocument(format!(
                            "'rules' must contain exactly one default rule, got {}",
                            rules.len()
                        )));
                    }
                };

                document = Some(RuleDocument { rule_format, root });
            }
            other => {
                return Err(RuleError::InvalidDocument(format!(
                    "unexpected top-level node '{}'",
                    other
                )));
            }
        }
    }

    document.ok_or_else(|| RuleError::InvalidDocument("missing 'rules' node".to_string()))
}

#[cfg(test)]
mod tests;
