use super::*;
use crate::compiler::{CompilerOptions, RuleTreeCompiler};
use crate::error::RuleError;
use crate::model::{CriteriaMustSatisfy, PlacementConstraints};
use pretty_assertions::assert_eq;
use serde_json::json;

const RULES: &str = r#"
    rules "v2023-01-05" {
        rule "default" {
            is-secure #false
            comments "The behaviors in the default rule apply to all requests."
            variable "PMUSER_ORIGIN" value="origin.example.com" description="origin host" hidden=#false sensitive=#false
            behavior {
                origin hostname="origin.example.com" forward-host-header="REQUEST_HOST_HEADER" http-port=80
            }
            behavior {
                cp-code {
                    value id=12345
                }
            }
            rule "Content Compression" {
                criteria-must-satisfy "any"
                criterion {
                    content-type match-operator="IS_ONE_OF" match-wildcard=#true {
                        values "text/*" "application/javascript"
                    }
                }
                behavior {
                    gzip-response behavior="ALWAYS"
                }
            }
            rule "Static Content" {
                criterion {
                    file-extension match-operator="IS_ONE_OF" {
                        values "css" "js" "png"
                    }
                }
                behavior {
                    caching behavior="MAX_AGE" must-revalidate=#false ttl="1d"
                }
            }
            rule "Dynamic Content" {
                behavior {
                    downstream-cache behavior="TUNNEL_ORIGIN"
                }
            }
        }
    }
"#;

fn compile(content: &str) -> crate::Result<crate::RuleTree> {
    let doc = parse_rules_string(content)?;
    RuleTreeCompiler::new(PlacementConstraints::default()).compile(&doc)
}

#[test]
fn test_parse_rule_document() {
    let doc = parse_rules_string(RULES).unwrap();

    assert_eq!(doc.rule_format, "v2023-01-05");
    assert_eq!(doc.root.name, "default");
    assert_eq!(doc.root.is_secure, Some(false));
    assert_eq!(doc.root.variables.len(), 1);
    assert_eq!(doc.root.variables[0].value, "origin.example.com");
    assert_eq!(doc.root.behaviors.len(), 2);
    assert_eq!(doc.root.children.len(), 3);

    let compression = &doc.root.children[0];
    assert_eq!(compression.name, "Content Compression");
    assert_eq!(
        compression.criteria_must_satisfy,
        Some(CriteriaMustSatisfy::Any)
    );
    assert_eq!(
        compression.criteria[0].entries[0].options["values"],
        json!(["text/*", "application/javascript"])
    );
}

#[test]
fn test_compile_rule_document() {
    let tree = compile(RULES).unwrap();

    assert_eq!(tree.rule_format, "v2023-01-05");
    assert_eq!(
        tree.document().unwrap(),
        json!({
            "_ruleFormat_": "v2023-01-05",
            "rules": {
                "name": "default",
                "comments": "The behaviors in the default rule apply to all requests.",
                "options": {"is_secure": false},
                "variables": [{
                    "name": "PMUSER_ORIGIN",
                    "value": "origin.example.com",
                    "description": "origin host",
                    "hidden": false,
                    "sensitive": false
                }],
                "behaviors": [
                    {
                        "name": "origin",
                        "options": {
                            "hostname": "origin.example.com",
                            "forwardHostHeader": "REQUEST_HOST_HEADER",
                            "httpPort": 80
                        }
                    },
                    {
                        "name": "cpCode",
                        "options": {"value": {"id": 12345}}
                    }
                ],
                "children": [
                    {
                        "name": "Content Compression",
                        "criteriaMustSatisfy": "any",
                        "criteria": [{
                            "name": "contentType",
                            "options": {
                                "matchOperator": "IS_ONE_OF",
                                "matchWildcard": true,
                                "values": ["text/*", "application/javascript"]
                            }
                        }],
                        "behaviors": [{"name": "gzipResponse", "options": {"behavior": "ALWAYS"}}],
                        "children": []
                    },
                    {
                        "name": "Static Content",
                        "criteria": [{
                            "name": "fileExtension",
                            "options": {
                                "matchOperator": "IS_ONE_OF",
                                "values": ["css", "js", "png"]
                            }
                        }],
                        "behaviors": [{
                            "name": "caching",
                            "options": {"behavior": "MAX_AGE", "mustRevalidate": false, "ttl": "1d"}
                        }],
                        "children": []
                    },
                    {
                        "name": "Dynamic Content",
                        "behaviors": [{"name": "downstreamCache", "options": {"behavior": "TUNNEL_ORIGIN"}}],
                        "children": []
                    }
                ]
            }
        })
    );
}

#[test]
fn test_compile_twice_is_byte_identical() {
    let first = compile(RULES).unwrap().to_json().unwrap();
    let second = compile(RULES).unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_too_many_elements_in_block() {
    let kdl = r#"
        rules "v2023-01-05" {
            rule "default" {
                behavior {
                    caching behavior="NO_STORE"
                    gzip-response behavior="ALWAYS"
                }
            }
        }
    "#;

    let err = compile(kdl).unwrap_err();
    assert!(matches!(
        err,
        RuleError::TooManyElements { got: 2, want: 1, .. }
    ));
    assert!(err.to_string().contains("expected 1 element(s), got 2"));
}

#[test]
fn test_lenient_mode_accepts_multi_entry_block() {
    let kdl = r#"
        rules "latest" {
            rule "default" {
                behavior {
                    caching behavior="NO_STORE"
                    gzip-response behavior="ALWAYS"
                }
            }
        }
    "#;

    let doc = parse_rules_string(kdl).unwrap();
    let tree = RuleTreeCompiler::new(PlacementConstraints::default())
        .with_options(CompilerOptions { strict: false })
        .compile(&doc)
        .unwrap();
    assert_eq!(tree.root.behaviors.len(), 2);
}

#[test]
fn test_is_secure_outside_default() {
    let kdl = r#"
        rules "v2023-01-05" {
            rule "default" {
                rule "Static Content" {
                    is-secure #true
                }
            }
        }
    "#;

    let err = compile(kdl).unwrap_err();
    assert!(
        err.to_string()
            .contains("cannot be used outside 'default' rule: is_secure")
    );
}

#[test]
fn test_variable_outside_default() {
    let kdl = r#"
        rules "v2023-01-05" {
            rule "default" {
                rule "Dynamic Content" {
                    variable "PMUSER_TEST" value="1"
                }
            }
        }
    "#;

    let err = compile(kdl).unwrap_err();
    assert!(
        err.to_string()
            .contains("cannot be used outside 'default' rule: variable")
    );
}

#[test]
fn test_rule_format_defaults_to_latest() {
    let kdl = r#"
        rules {
            rule "default" {}
        }
    "#;

    let doc = parse_rules_string(kdl).unwrap();
    assert_eq!(doc.rule_format, "latest");

    let doc = parse_rules_string_with_format(kdl, "v2023-01-05").unwrap();
    assert_eq!(doc.rule_format, "v2023-01-05");
}

#[test]
fn test_explicit_rule_format_wins_over_default() {
    let kdl = r#"
        rules "v2023-05-30" {
            rule "default" {}
        }
    "#;

    let doc = parse_rules_string_with_format(kdl, "v2023-01-05").unwrap();
    assert_eq!(doc.rule_format, "v2023-05-30");
}

#[test]
fn test_missing_rules_node() {
    let err = parse_rules_string("").unwrap_err();
    assert!(matches!(err, RuleError::InvalidDocument(_)));
}

#[test]
fn test_multiple_default_rules() {
    let kdl = r#"
        rules "latest" {
            rule "default" {}
            rule "other" {}
        }
    "#;

    let err = parse_rules_string(kdl).unwrap_err();
    assert!(matches!(err, RuleError::InvalidDocument(_)));
}

#[test]
fn test_unknown_rule_field() {
    let kdl = r#"
        rules "latest" {
            rule "default" {
                behaviour {
                    caching behavior="NO_STORE"
                }
            }
        }
    "#;

    let err = parse_rules_string(kdl).unwrap_err();
    assert!(matches!(
        err,
        RuleError::UnknownField { ref field, .. } if field == "behaviour"
    ));
}

#[test]
fn test_invalid_criteria_must_satisfy() {
    let kdl = r#"
        rules "latest" {
            rule "default" {
                criteria-must-satisfy "some"
            }
        }
    "#;

    let err = parse_rules_string(kdl).unwrap_err();
    assert!(matches!(err, RuleError::InvalidValue { .. }));
}

#[test]
fn test_positional_argument_in_behavior() {
    let kdl = r#"
        rules "latest" {
            rule "default" {
                behavior {
                    caching "NO_STORE"
                }
            }
        }
    "#;

    let err = parse_rules_string(kdl).unwrap_err();
    assert!(matches!(err, RuleError::InvalidValue { .. }));
}

#[test]
fn test_rule_without_name() {
    let kdl = r#"
        rules "latest" {
            rule {}
        }
    "#;

    let err = parse_rules_string(kdl).unwrap_err();
    assert!(matches!(err, RuleError::MissingName("rule")));
}

#[test]
fn test_parse_rules_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("rules.kdl");
    std::fs::write(&path, RULES).unwrap();

    let doc = parse_rules_file(&path).unwrap();
    assert_eq!(doc.root.children.len(), 3);
}

#[test]
fn test_list_values_mixed_with_options_are_rejected() {
    let kdl = r#"
        rules "latest" {
            rule "default" {
                criterion {
                    file-extension match-operator="IS_ONE_OF" {
                        values "css" "js" case-sensitive=#true
                    }
                }
            }
        }
    "#;

    let err = parse_rules_string(kdl).unwrap_err();
    match err {
        RuleError::InvalidValue { field, path, .. } => {
            assert_eq!(field, "values");
            assert_eq!(path, "default");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_option_spellings_fail_to_compile() {
    let kdl = r#"
        rules "latest" {
            rule "default" {
                behavior {
                    origin gzip_response=#true gzip-response=#false
                }
            }
        }
    "#;

    let err = compile(kdl).unwrap_err();
    assert!(err.to_string().contains("gzipResponse"));
}
