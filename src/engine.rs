use crate::table::Table;

/// Transforms a working table into a reconciliation result.
///
/// A result must keep the row count of its input: the session re-attaches
/// row ids to the result by position and rejects a result of another length.
pub trait Engine {
    fn reconcile(&self, table: &Table) -> Table;
}

/// The placeholder engine: hands back an unchanged copy of its input.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityEngine;

impl Engine for IdentityEngine {
    fn reconcile(&self, table: &Table) -> Table {
        table.clone()
    }
}

impl<F> Engine for F
where
    F: Fn(&Table) -> Table,
{
    fn reconcile(&self, table: &Table) -> Table {
        self(table)
    }
}
