//! # Symbols Module
//!
//! Merging of per-table symbol results into the single list stored on a
//! [`Binary`](crate::core::binary::Binary).
//!
//! Each symbol table is read independently and reported as a
//! [`TableOutcome`]. Merging keeps the order the outcomes arrive in (static
//! sources before dynamic and export sources), never deduplicates, and turns
//! failed tables into warnings.

use tracing::warn;

use crate::core::binary::LoadWarning;
use crate::core::symbol::Symbol;
use crate::error::LoaderError;

/// Symbols read from one table, with the problems that did not stop the read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedTable {
    pub table: String,
    pub symbols: Vec<Symbol>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadedTable {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let warning = LoadWarning::new(self.table.clone(), message);
        warn!(table = %warning.table, "{}", warning.message);
        self.warnings.push(warning);
    }
}

/// Result of reading one symbol table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    Loaded(LoadedTable),
    Failed { table: String, error: LoaderError },
}

impl TableOutcome {
    /// Wrap a table read, keeping the error for the merge step.
    pub fn from_result(table: &str, result: Result<LoadedTable, LoaderError>) -> Self {
        match result {
            Ok(loaded) => TableOutcome::Loaded(loaded),
            Err(error) => TableOutcome::Failed {
                table: table.to_string(),
                error,
            },
        }
    }

    pub fn table(&self) -> &str {
        match self {
            TableOutcome::Loaded(loaded) => &loaded.table,
            TableOutcome::Failed { table, .. } => table,
        }
    }
}

/// Merged symbols and the warnings collected along the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedSymbols {
    pub symbols: Vec<Symbol>,
    pub warnings: Vec<LoadWarning>,
}

/// Concatenate table outcomes in the order given.
///
/// Only function symbols are kept. Empty names survive; duplicates across
/// tables are left in place.
pub fn merge(outcomes: Vec<TableOutcome>) -> MergedSymbols {
    let mut merged = MergedSymbols::default();

    for outcome in outcomes {
        match outcome {
            TableOutcome::Loaded(loaded) => {
                merged
                    .symbols
                    .extend(loaded.symbols.into_iter().filter(Symbol::is_function));
                merged.warnings.extend(loaded.warnings);
            }
            TableOutcome::Failed { table, error } => {
                warn!(table = %table, error = %error, "symbol table skipped");
                merged.warnings.push(LoadWarning::from_error(&table, &error));
            }
        }
    }

    merged
}
