//! Visibility filtering
//!
//! Decides which tables become nodes under a display policy.

use std::collections::BTreeSet;
use lineviz_core::{is_qualified, DisplayPolicy};
use crate::roles::TableRoleSet;

/// Tables rendered as nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleSet {
    tables: BTreeSet<String>,
}

impl VisibleSet {
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Visible tables in ascending name order
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.tables
    }
}

impl FromIterator<String> for VisibleSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            tables: iter.into_iter().collect(),
        }
    }
}

/// Intermediates that stay visible under `policy`
pub fn visible_intermediates<'a>(
    roles: &'a TableRoleSet,
    policy: &DisplayPolicy,
) -> impl Iterator<Item = &'a String> {
    let include = policy.include_intermediate_tables;
    let physical_only = policy.filter_physical_only;

    roles
        .intermediates
        .iter()
        .filter(move |t| include && (!physical_only || is_qualified(t)))
}

/// Sources, targets and the intermediates chosen by `policy`
pub fn visible_tables(roles: &TableRoleSet, policy: &DisplayPolicy) -> VisibleSet {
    let visible: VisibleSet = roles
        .sources
        .iter()
        .chain(roles.targets.iter())
        .chain(visible_intermediates(roles, policy))
        .cloned()
        .collect();

    tracing::debug!(
        visible = visible.len(),
        hidden = roles.len() - visible.len(),
        "computed visible tables"
    );

    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> TableRoleSet {
        let set = |items: &[&str]| -> BTreeSet<String> { items.iter().map(|s| s.to_string()).collect() };
        TableRoleSet {
            sources: set(&["db.raw"]),
            targets: set(&["db.final"]),
            intermediates: set(&["db.stage", "recent"]),
        }
    }

    fn policy(include: bool, physical_only: bool) -> DisplayPolicy {
        DisplayPolicy {
            include_intermediate_tables: include,
            filter_physical_only: physical_only,
        }
    }

    fn names(visible: &VisibleSet) -> Vec<&str> {
        visible.iter().map(String::as_str).collect()
    }

    #[test]
    fn physical_only_hides_ctes() {
        let visible = visible_tables(&roles(), &policy(true, true));
        assert_eq!(names(&visible), vec!["db.final", "db.raw", "db.stage"]);
    }

    #[test]
    fn all_intermediates_when_not_filtering() {
        let visible = visible_tables(&roles(), &policy(true, false));
        assert_eq!(names(&visible), vec!["db.final", "db.raw", "db.stage", "recent"]);
    }

    #[test]
    fn excluding_intermediates_ignores_filter_flag() {
        for physical_only in [true, false] {
            let visible = visible_tables(&roles(), &policy(false, physical_only));
            assert_eq!(names(&visible), vec!["db.final", "db.raw"]);
        }
    }

    #[test]
    fn unfiltered_is_superset_of_filtered() {
        let roles = roles();
        let narrow = visible_tables(&roles, &policy(true, true));
        let wide = visible_tables(&roles, &policy(true, false));
        let minimal = visible_tables(&roles, &policy(false, true));

        assert!(narrow.as_set().is_subset(wide.as_set()));
        assert!(minimal.as_set().is_subset(narrow.as_set()));
    }
}
