//! Fact collection
//!
//! Runs the extraction engine over each statement of a script, in order.
//!
//! Unqualified intermediates (CTEs and other relations the engine reports
//! as ephemeral) only live for one statement. When such a name is also
//! mentioned by another statement it is renamed `name#<statement>` so two
//! statements reusing a CTE name do not share a node.

use std::collections::{BTreeSet, HashMap};
use lineviz_core::{is_qualified, split_script, DialectConfig, LineageExtractor, SplitOptions, StatementFacts};
use crate::error::LineageError;

/// Separator between a statement-local relation and its statement index
pub const SCOPE_SEPARATOR: char = '#';

/// Identity of a statement-local relation defined by statement `statement`
pub fn scoped_name(name: &str, statement: usize) -> String {
    format!("{name}{SCOPE_SEPARATOR}{statement}")
}

fn mentioned_tables(facts: &StatementFacts) -> BTreeSet<&str> {
    facts
        .sources
        .iter()
        .chain(&facts.targets)
        .chain(&facts.intermediates)
        .map(String::as_str)
        .chain(facts.paths.iter().flat_map(|p| p.hops().iter().map(|hop| hop.table.as_str())))
        .collect()
}

/// Rename statement-local relations whose name another statement also uses
fn scope_local_relations(bundles: &mut [StatementFacts]) {
    let mut mentions: HashMap<String, usize> = HashMap::new();
    for facts in bundles.iter() {
        for table in mentioned_tables(facts) {
            *mentions.entry(table.to_string()).or_default() += 1;
        }
    }

    for (i, facts) in bundles.iter_mut().enumerate() {
        let local: Vec<String> = facts
            .intermediates
            .iter()
            .filter(|name| !is_qualified(name))
            .filter(|name| !facts.sources.contains(*name) && !facts.targets.contains(*name))
            .filter(|name| mentions.get(name.as_str()).copied().unwrap_or(0) > 1)
            .cloned()
            .collect();

        for name in local {
            let scoped = scoped_name(&name, i + 1);
            tracing::debug!(statement = i + 1, relation = %name, scoped = %scoped, "scoped statement-local relation");

            facts.intermediates.remove(&name);
            facts.intermediates.insert(scoped.clone());
            facts.paths = std::mem::take(&mut facts.paths)
                .into_iter()
                .map(|path| path.rename_table(&name, &scoped))
                .collect();
        }
    }
}

/// Collects per-statement lineage facts from a script
pub struct FactCollector<'e, E: LineageExtractor + ?Sized> {
    extractor: &'e E,
    split: SplitOptions,
}

impl<'e, E: LineageExtractor + ?Sized> FactCollector<'e, E> {
    /// Create a collector splitting on `;` with ANSI quoting
    pub fn new(extractor: &'e E) -> Self {
        Self {
            extractor,
            split: SplitOptions::default(),
        }
    }

    /// Use a different statement delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.split = SplitOptions { delimiter, ..self.split };
        self.split.dollar_quotes &= delimiter != '$';
        self
    }

    /// Honour the string quoting rules of `dialect` when splitting
    pub fn with_dialect(mut self, dialect: DialectConfig) -> Self {
        self.split = SplitOptions::for_dialect(dialect, self.split.delimiter);
        self
    }

    /// Extract facts from every statement of `script`.
    ///
    /// The first statement the engine rejects aborts collection; facts
    /// gathered so far are discarded. Colliding statement-local relations
    /// are scoped to their statement.
    pub fn collect(&self, script: &str) -> Result<Vec<StatementFacts>, LineageError> {
        let statements = split_script(script, self.split);
        let mut bundles = Vec::with_capacity(statements.len());

        for (i, statement) in statements.iter().enumerate() {
            let extraction = self
                .extractor
                .extract(statement)
                .map_err(|source| LineageError::Extraction {
                    statement: i + 1,
                    source,
                })?;

            // Paths may be lazy; drain them before the extraction goes away.
            let facts = extraction.into_facts();

            tracing::debug!(
                statement = i + 1,
                sources = facts.sources.len(),
                targets = facts.targets.len(),
                intermediates = facts.intermediates.len(),
                paths = facts.paths.len(),
                "collected statement facts"
            );

            bundles.push(facts);
        }

        scope_local_relations(&mut bundles);
        Ok(bundles)
    }
}
