//! Placement constraints

use std::collections::BTreeSet;

/// Fields that may only appear in the default (root) rule
pub const DEFAULT_ROOT_ONLY_FIELDS: &[&str] = &["is_secure", "variable"];

/// Maps field names to the "root rule only" requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementConstraints {
    root_only: BTreeSet<String>,
}

impl Default for PlacementConstraints {
    fn default() -> Self {
        Self::empty().with_root_only(DEFAULT_ROOT_ONLY_FIELDS.iter().copied())
    }
}

impl PlacementConstraints {
    /// Constraints that allow every field everywhere
    pub fn empty() -> Self {
        Self {
            root_only: BTreeSet::new(),
        }
    }

    pub fn with_root_only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_only.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn is_root_only(&self, field: &str) -> bool {
        self.root_only.contains(field)
    }

    /// Whether `field` may appear in a rule that is (or is not) the default rule
    pub fn allows(&self, field: &str, is_default: bool) -> bool {
        is_default || !self.is_root_only(field)
    }

    pub fn root_only_fields(&self) -> impl Iterator<Item = &str> {
        self.root_only.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints() {
        let constraints = PlacementConstraints::default();
        assert!(constraints.is_root_only("is_secure"));
        assert!(constraints.is_root_only("variable"));
        assert!(!constraints.is_root_only("behavior"));
    }

    #[test]
    fn test_allows() {
        let constraints = PlacementConstraints::default();
        assert!(constraints.allows("is_secure", true));
        assert!(!constraints.allows("is_secure", false));
        assert!(constraints.allows("comments", false));
    }

    #[test]
    fn test_extend_root_only() {
        let constraints = PlacementConstraints::empty().with_root_only(["comments"]);
        assert!(!constraints.allows("comments", false));
        assert!(constraints.allows("is_secure", false));
        assert_eq!(constraints.root_only_fields().collect::<Vec<_>>(), vec!["comments"]);
    }
}
