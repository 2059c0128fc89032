//! `rule` node parsing

use crate::error::{Result, RuleError};
use crate::model::{BlockSpec, Entry, RuleSpec, Variable};
use kdl::{KdlNode, KdlValue};
use serde_json::{Map, Number, Value};

/// Parse a `rule` node and its nested rules
pub fn parse_rule(node: &KdlNode, parent_path: Option<&str>) -> Result<RuleSpec> {
    let name = first_string(node)
        .ok_or(RuleError::MissingName("rule"))?
        .to_string();

    let path = match parent_path {
        Some(parent) => format!("{}/{}", parent, name),
        None => name.clone(),
    };

    let mut rule = RuleSpec::named(name);

    let Some(children) = node.children() else {
        return Ok(rule);
    };

    for child in children.nodes() {
        match child.name().value() {
            "is-secure" | "is_secure" => {
                rule.is_secure = Some(required_bool(child, "is_secure", &path)?);
            }
            "comments" => {
                rule.comments = Some(required_string(child, "comments", &path)?);
            }
            "uuid" => {
                rule.uuid = Some(required_string(child, "uuid", &path)?);
            }
            "template-uuid" | "template_uuid" => {
                rule.template_uuid = Some(required_string(child, "template_uuid", &path)?);
            }
            "criteria-must-satisfy" | "criteria_must_satisfy" => {
                let value = required_string(child, "criteria_must_satisfy", &path)?;
                let parsed = value.parse().map_err(|message| RuleError::InvalidValue {
                    field: "criteria_must_satisfy".to_string(),
                    path: path.clone(),
                    message,
                })?;
                rule.criteria_must_satisfy = Some(parsed);
            }
            "criteria-locked" | "criteria_locked" => {
                rule.criteria_locked = Some(required_bool(child, "criteria_locked", &path)?);
            }
            "variable" => {
                rule.variables.push(parse_variable(child, &path)?);
            }
            "behavior" => {
                rule.behaviors.push(parse_block(child, &path)?);
            }
            "criterion" => {
                rule.criteria.push(parse_block(child, &path)?);
            }
            "rule" => {
                rule.children.push(parse_rule(child, Some(&path))?);
            }
            other => {
                return Err(RuleError::UnknownField {
                    field: other.to_string(),
                    path,
                });
            }
        }
    }

    Ok(rule)
}

/// `variable "NAME" value="..." description="..." hidden=#false sensitive=#false`
fn parse_variable(node: &KdlNode, path: &str) -> Result<Variable> {
    let name = first_string(node)
        .ok_or(RuleError::MissingName("variable"))?
        .to_string();

    let mut variable = Variable::new(name);

    for entry in node.entries() {
        let Some(key) = entry.name() else {
            continue;
        };
        let value = entry.value();
        match key.value() {
            "value" => variable.value = expect_string(value, "variable.value", path)?,
            "description" => {
                variable.description = expect_string(value, "variable.description", path)?
            }
            "hidden" => variable.hidden = expect_bool(value, "variable.hidden", path)?,
            "sensitive" => variable.sensitive = expect_bool(value, "variable.sensitive", path)?,
            other => {
                return Err(RuleError::UnknownField {
                    field: format!("variable.{}", other),
                    path: path.to_string(),
                });
            }
        }
    }

    Ok(variable)
}

/// Parse a `behavior`/`criterion` block; each child node is one entry
fn parse_block(node: &KdlNode, path: &str) -> Result<BlockSpec> {
    if !node.entries().is_empty() {
        return Err(RuleError::InvalidValue {
            field: node.name().value().to_string(),
            path: path.to_string(),
            message: "block takes no arguments".to_string(),
        });
    }

    let mut block = BlockSpec::default();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            block.entries.push(Entry {
                name: child.name().value().to_string(),
                options: parse_options(child, path)?,
            });
        }
    }
    Ok(block)
}

/// Properties become scalar options, child nodes with arguments become
/// arrays and child nodes with properties become nested objects.
fn parse_options(node: &KdlNode, path: &str) -> Result<Map<String, Value>> {
    let mut options = Map::new();

    for entry in node.entries() {
        match entry.name() {
            Some(key) => {
                options.insert(key.value().to_string(), to_json(entry.value()));
            }
            None => {
                return Err(RuleError::InvalidValue {
                    field: node.name().value().to_string(),
                    path: path.to_string(),
                    message: "positional arguments are not allowed; use key=value".to_string(),
                });
            }
        }
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value().to_string();
            let has_args = child.entries().iter().any(|e| e.name().is_none());
            let has_props = child.entries().iter().any(|e| e.name().is_some());
            if has_args && has_props {
                return Err(RuleError::InvalidValue {
                    field: key,
                    path: path.to_string(),
                    message: "cannot mix list values with key=value options".to_string(),
                });
            }
            let value = if has_args {
                Value::Array(
                    child
                        .entries()
                        .iter()
                        .filter(|e| e.name().is_none())
                        .map(|e| to_json(e.value()))
                        .collect(),
                )
            } else {
                Value::Object(parse_options(child, path)?)
            };
            options.insert(key, value);
        }
    }

    Ok(options)
}

fn to_json(value: &KdlValue) -> Value {
    if let Some(s) = value.as_string() {
        Value::String(s.to_string())
    } else if let Some(b) = value.as_bool() {
        Value::Bool(b)
    } else if let Some(i) = value.as_integer() {
        i64::try_from(i)
            .map(|v| Value::Number(v.into()))
            .unwrap_or_else(|_| Value::String(i.to_string()))
    } else if let Some(f) = value.as_float() {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    } else {
        Value::Null
    }
}

fn first_string(node: &KdlNode) -> Option<&str> {
    node.entries()
        .first()
        .filter(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
}

fn required_string(node: &KdlNode, field: &str, path: &str) -> Result<String> {
    let value = first_value(node, field, path)?;
    expect_string(value, field, path)
}

fn required_bool(node: &KdlNode, field: &str, path: &str) -> Result<bool> {
    let value = first_value(node, field, path)?;
    expect_bool(value, field, path)
}

fn first_value<'a>(node: &'a KdlNode, field: &str, path: &str) -> Result<&'a KdlValue> {
    node.entries()
        .first()
        .map(|e| e.value())
        .ok_or_else(|| RuleError::InvalidValue {
            field: field.to_string(),
            path: path.to_string(),
            message: "missing value".to_string(),
        })
}

fn expect_string(value: &KdlValue, field: &str, path: &str) -> Result<String> {
    value
        .as_string()
        .map(str::to_string)
        .ok_or_else(|| RuleError::InvalidValue {
            field: field.to_string(),
            path: path.to_string(),
            message: format!("expected a string, got {}", value),
        })
}

fn expect_bool(value: &KdlValue, field: &str, path: &str) -> Result<bool> {
    value.as_bool().ok_or_else(|| RuleError::InvalidValue {
        field: field.to_string(),
        path: path.to_string(),
        message: format!("expected a boolean, got {}", value),
    })
}
