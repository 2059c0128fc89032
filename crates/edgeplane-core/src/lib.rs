//! edgeplane core
//!
//! Parses KDL rule documents and compiles them into the ordered rule tree
//! the property API expects.
//!
//! ```text
//! rules.kdl ──▶ parser ──▶ RuleDocument ──▶ RuleTreeCompiler ──▶ RuleTree
//!                                              │                  (json + rule format)
//!                                              └─ PlacementConstraints
//! ```
//!
//! # Example
//!
//! ```ignore
//! use edgeplane_core::{parse_rules_file, PlacementConstraints, RuleTreeCompiler};
//!
//! let document = parse_rules_file("rules.kdl")?;
//! let tree = RuleTreeCompiler::new(PlacementConstraints::default()).compile(&document)?;
//! println!("{} {}", tree.rule_format, tree.to_json()?);
//! ```

pub mod compiler;
pub mod error;
pub mod model;
pub mod parser;

pub use compiler::{CompilerOptions, RuleTree, RuleTreeCompiler};
pub use error::{Result, RuleError};
pub use model::*;
pub use parser::{
    parse_rules_file, parse_rules_file_with_format, parse_rules_string,
    parse_rules_string_with_format,
};
