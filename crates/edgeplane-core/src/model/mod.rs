//! Rule document models
//!
//! `RuleDocument`/`RuleSpec` hold a parsed document before validation,
//! `RuleNode` holds a compiled rule ready for serialization.

mod constraint;
mod rule;

pub use constraint::*;
pub use rule::*;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_spec_fields() {
        let spec = RuleSpec {
            name: "default".to_string(),
            is_secure: Some(false),
            variables: vec![Variable::new("PMUSER_ORIGIN")],
            behaviors: vec![BlockSpec::single(Entry::new("caching"))],
            ..Default::default()
        };

        assert_eq!(spec.fields(), vec!["is_secure", "variable", "behavior"]);
    }

    #[test]
    fn test_rule_spec_fields_empty() {
        let spec = RuleSpec::named("empty");
        assert!(spec.fields().is_empty());
    }

    #[test]
    fn test_rule_node_serialization_skips_empty_fields() {
        let node = RuleNode {
            name: "Static Content".to_string(),
            is_default: false,
            behaviors: vec![Entry::new("caching").with_option("ttl", json!("7d"))],
            ..Default::default()
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Static Content",
                "children": [],
                "behaviors": [{"name": "caching", "options": {"ttl": "7d"}}]
            })
        );
    }

    #[test]
    fn test_criteria_must_satisfy_parse() {
        assert_eq!(
            "all".parse::<CriteriaMustSatisfy>(),
            Ok(CriteriaMustSatisfy::All)
        );
        assert_eq!(
            "any".parse::<CriteriaMustSatisfy>(),
            Ok(CriteriaMustSatisfy::Any)
        );
        assert!("some".parse::<CriteriaMustSatisfy>().is_err());
    }
}
