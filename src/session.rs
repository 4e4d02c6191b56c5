//! The table review state machine.
//!
//! A [`TableSession`] owns the working table, the id-keyed selection and
//! flag sets, the pagination window and the optional engine result. Every
//! user interaction is an [`Action`]; applying one either succeeds, degrades
//! to a [`Notice`], or is rejected with a [`SessionError`] that leaves the
//! session untouched. Sessions are plain serializable values, so a host that
//! rebuilds its whole view on every interaction can persist the session
//! between actions and replay from it.

use crate::cell::CellValue;
use crate::engine::Engine;
use crate::error::SessionError;
use crate::table::Table;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

/// Name of the transient per-row selection column.
pub const SELECT_COLUMN: &str = "select";

/// Rows shown per page in the paginated variant.
pub const PAGE_SIZE: usize = 10;

/// Which persistent flag column a table carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    Final,
    Fraud,
}

impl FlagKind {
    pub fn column_name(self) -> &'static str {
        match self {
            FlagKind::Final => "final",
            FlagKind::Fraud => "fraud",
        }
    }

    /// Worksheet name used for a workbook export of this flag.
    pub fn sheet_name(self) -> &'static str {
        match self {
            FlagKind::Final => "Finalized Transactions",
            FlagKind::Fraud => "Fraudulent Transactions",
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            FlagKind::Final => "finalized_transactions",
            FlagKind::Fraud => "fraudulent_transactions",
        }
    }
}

impl std::str::FromStr for FlagKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "final" => Ok(FlagKind::Final),
            "fraud" => Ok(FlagKind::Fraud),
            other => Err(format!("unknown flag: {}", other)),
        }
    }
}

/// The two review workflows.
///
/// `Finalize` marks rows `final` on the full working table. `Reconcile`
/// pages the working table, runs the engine and marks rows of the engine
/// result as `fraud`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Finalize,
    Reconcile,
}

impl SessionMode {
    pub fn flag(self) -> FlagKind {
        match self {
            SessionMode::Finalize => FlagKind::Final,
            SessionMode::Reconcile => FlagKind::Fraud,
        }
    }

    pub fn is_paginated(self) -> bool {
        matches!(self, SessionMode::Reconcile)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Finalize => f.write_str("finalize"),
            SessionMode::Reconcile => f.write_str("reconcile"),
        }
    }
}

impl std::str::FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "finalize" | "final" | "1" => Ok(SessionMode::Finalize),
            "reconcile" | "fraud" | "2" => Ok(SessionMode::Reconcile),
            other => Err(format!("unknown session mode: {}", other)),
        }
    }
}

/// What happens to unexported fraud flags when the engine runs again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RerunPolicy {
    /// Keep the flags of result rows whose id survives into the new result.
    #[default]
    Merge,
    /// Start the new result with only the flags carried by the working table.
    Overwrite,
}

impl std::str::FromStr for RerunPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(RerunPolicy::Merge),
            "overwrite" => Ok(RerunPolicy::Overwrite),
            other => Err(format!("unknown engine rerun policy: {}", other)),
        }
    }
}

/// Immutable identity of a row, assigned when its table is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkingRow {
    pub id: RowId,
    pub values: Vec<CellValue>,
}

/// A table under review plus its selection and flag state.
///
/// Selection and flags are keyed by [`RowId`], never by position, so
/// removing rows can't shift a selection onto a different row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkingTable {
    columns: Vec<String>,
    rows: Vec<WorkingRow>,
    flag: FlagKind,
    selected: BTreeSet<RowId>,
    flagged: BTreeSet<RowId>,
}

impl WorkingTable {
    /// Build a working table from a raw table, giving row `i` the id `ids[i]`.
    ///
    /// A `select` column in the input is dropped. A column named after the
    /// flag is lifted out of the data columns into the flag set.
    fn build(table: Table, flag: FlagKind, ids: &[RowId]) -> Self {
        let (columns, rows) = table.into_parts();
        let select_idx = columns.iter().position(|c| c == SELECT_COLUMN);
        let flag_idx = columns.iter().position(|c| c == flag.column_name());

        let keep: Vec<usize> = (0..columns.len())
            .filter(|i| Some(*i) != select_idx && Some(*i) != flag_idx)
            .collect();

        let mut flagged = BTreeSet::new();
        let mut working_rows = Vec::with_capacity(rows.len());
        for (row, id) in rows.into_iter().zip(ids.iter().copied()) {
            if let Some(idx) = flag_idx {
                if row[idx].is_truthy() {
                    flagged.insert(id);
                }
            }
            let values = keep.iter().map(|&i| row[i].clone()).collect();
            working_rows.push(WorkingRow { id, values });
        }

        WorkingTable {
            columns: keep.iter().map(|&i| columns[i].clone()).collect(),
            rows: working_rows,
            flag,
            selected: BTreeSet::new(),
            flagged,
        }
    }

    /// Data column names, without the select and flag columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[WorkingRow] {
        &self.rows
    }

    pub fn flag(&self) -> FlagKind {
        self.flag
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_selected(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|r| self.selected.contains(&r.id))
    }

    pub fn is_flagged(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|r| self.flagged.contains(&r.id))
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged.len()
    }

    fn id_at(&self, row: usize) -> Result<RowId, SessionError> {
        self.rows
            .get(row)
            .map(|r| r.id)
            .ok_or(SessionError::RowOutOfRange {
                row,
                len: self.rows.len(),
            })
    }

    fn ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|r| r.id).collect()
    }

    fn column_position(&self, column: &str) -> Result<usize, SessionError> {
        if column == SELECT_COLUMN || column == self.flag.column_name() {
            return Err(SessionError::ReservedColumn(column.to_string()));
        }
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| SessionError::UnknownColumn(column.to_string()))
    }

    fn set_selected(&mut self, id: RowId, value: bool) {
        if value {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
    }

    /// Drop every selected row and clear the selection. Returns the number removed.
    fn remove_selected(&mut self) -> usize {
        let before = self.rows.len();
        let selected = std::mem::take(&mut self.selected);
        self.rows.retain(|r| !selected.contains(&r.id));
        self.flagged.retain(|id| !selected.contains(id));
        before - self.rows.len()
    }

    /// Flag every selected row and clear the selection. Returns the number newly flagged.
    fn flag_selected(&mut self) -> usize {
        let selected = std::mem::take(&mut self.selected);
        selected
            .into_iter()
            .filter(|id| self.flagged.insert(*id))
            .count()
    }

    /// The data columns only, as a plain table.
    pub fn data_table(&self) -> Table {
        let rows = self.rows.iter().map(|r| r.values.clone()).collect();
        Table::from_rows(self.columns.clone(), rows).unwrap_or_default()
    }

    /// The rows whose flag is set, with select and flag columns stripped.
    pub fn flagged_table(&self) -> Table {
        let rows = self
            .rows
            .iter()
            .filter(|r| self.flagged.contains(&r.id))
            .map(|r| r.values.clone())
            .collect();
        Table::from_rows(self.columns.clone(), rows).unwrap_or_default()
    }

    /// Render the grid as shown to the user: `select` first, then the data
    /// columns, then the flag column.
    pub fn to_table(&self) -> Table {
        let mut columns = Vec::with_capacity(self.columns.len() + 2);
        columns.push(SELECT_COLUMN.to_string());
        columns.extend(self.columns.iter().cloned());
        columns.push(self.flag.column_name().to_string());

        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut values = Vec::with_capacity(r.values.len() + 2);
                values.push(CellValue::Bool(self.selected.contains(&r.id)));
                values.extend(r.values.iter().cloned());
                values.push(CellValue::Bool(self.flagged.contains(&r.id)));
                values
            })
            .collect();
        Table::from_rows(columns, rows).unwrap_or_default()
    }
}

/// A fixed-size page over the working table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationWindow {
    pub page_number: usize,
    pub page_size: usize,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        PaginationWindow {
            page_number: 0,
            page_size: PAGE_SIZE,
        }
    }
}

impl PaginationWindow {
    /// Number of pages for `row_count` rows; an empty table still has one page.
    pub fn page_count(&self, row_count: usize) -> usize {
        row_count.max(1).div_ceil(self.page_size)
    }

    /// Absolute row positions on the current page.
    pub fn range(&self, row_count: usize) -> Range<usize> {
        let start = (self.page_number * self.page_size).min(row_count);
        let end = (start + self.page_size).min(row_count);
        start..end
    }

    pub fn next(&mut self, row_count: usize) -> bool {
        if self.page_number + 1 < self.page_count(row_count) {
            self.page_number += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.page_number > 0 {
            self.page_number -= 1;
            true
        } else {
            false
        }
    }

    /// Pull the page back onto the table after rows were removed.
    pub fn clamp(&mut self, row_count: usize) {
        let last = self.page_count(row_count) - 1;
        if self.page_number > last {
            self.page_number = last;
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    Loaded,
    Paginating,
    EngineRan,
}

/// A user interaction.
///
/// Row positions in `Edit` and `Select` are absolute positions in the
/// working table; in reconcile mode they must be on the current page.
/// `SelectResult` addresses a row of the engine result.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Load(Table),
    Edit {
        row: usize,
        column: String,
        value: CellValue,
    },
    Select {
        row: usize,
        value: bool,
    },
    SelectResult {
        row: usize,
        value: bool,
    },
    /// Add an empty, unselected and unflagged row at the end of the working table.
    AppendRow,
    BulkRemove,
    BulkMarkFinal,
    BulkMarkFraud,
    NextPage,
    PrevPage,
    RunEngine,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Load(_) => "load",
            Action::Edit { .. } => "edit",
            Action::Select { .. } => "select",
            Action::SelectResult { .. } => "select_result",
            Action::AppendRow => "append_row",
            Action::BulkRemove => "remove_selected",
            Action::BulkMarkFinal => "mark_final",
            Action::BulkMarkFraud => "mark_fraud",
            Action::NextPage => "next_page",
            Action::PrevPage => "prev_page",
            Action::RunEngine => "run_engine",
        }
    }
}

/// A non-fatal condition reported to the user instead of a state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    NothingSelected,
    NothingToExport,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NothingSelected => f.write_str("No rows selected."),
            Notice::NothingToExport => f.write_str("No flagged transactions to export."),
        }
    }
}

/// Result of a successfully applied action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// The action was valid but had nothing to do, e.g. paging past the end.
    Unchanged,
    Notice(Notice),
}

/// The review session for one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct TableSession {
    mode: SessionMode,
    rerun_policy: RerunPolicy,
    working: Option<WorkingTable>,
    page: PaginationWindow,
    engine_result: Option<WorkingTable>,
    /// Id handed to the next appended row; never reused within one load.
    next_id: u64,
}

impl TableSession {
    pub fn new(mode: SessionMode) -> Self {
        TableSession {
            mode,
            ..Default::default()
        }
    }

    pub fn with_rerun_policy(mut self, policy: RerunPolicy) -> Self {
        self.rerun_policy = policy;
        self
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn rerun_policy(&self) -> RerunPolicy {
        self.rerun_policy
    }

    pub fn state(&self) -> SessionState {
        match (&self.working, &self.engine_result) {
            (None, _) => SessionState::Empty,
            (Some(_), Some(_)) => SessionState::EngineRan,
            (Some(_), None) if self.mode.is_paginated() => SessionState::Paginating,
            (Some(_), None) => SessionState::Loaded,
        }
    }

    pub fn working(&self) -> Option<&WorkingTable> {
        self.working.as_ref()
    }

    pub fn engine_result(&self) -> Option<&WorkingTable> {
        self.engine_result.as_ref()
    }

    pub fn page(&self) -> PaginationWindow {
        self.page
    }

    /// Absolute positions and rows currently shown in the grid.
    ///
    /// In finalize mode this is the whole table.
    pub fn visible_rows(&self) -> Option<(Range<usize>, &[WorkingRow])> {
        let working = self.working.as_ref()?;
        let range = self.visible_range(working);
        Some((range.clone(), &working.rows[range]))
    }

    fn visible_range(&self, working: &WorkingTable) -> Range<usize> {
        if self.mode.is_paginated() {
            self.page.range(working.len())
        } else {
            0..working.len()
        }
    }

    fn working_ref(&self) -> Result<&WorkingTable, SessionError> {
        self.working.as_ref().ok_or(SessionError::NotLoaded)
    }

    fn require(&self, action: &'static str, mode: SessionMode) -> Result<(), SessionError> {
        if self.mode != mode {
            return Err(SessionError::Unsupported {
                action,
                mode: self.mode,
            });
        }
        Ok(())
    }

    /// Check that `row` may be touched through the grid and return its id.
    fn visible_id(&self, row: usize) -> Result<RowId, SessionError> {
        let working = self.working_ref()?;
        let id = working.id_at(row)?;
        let range = self.visible_range(working);
        if !range.contains(&row) {
            return Err(SessionError::RowNotVisible {
                row,
                start: range.start,
                end: range.end,
            });
        }
        Ok(id)
    }

    /// Apply one action in place.
    ///
    /// Every precondition is checked before anything is modified, so an
    /// `Err` leaves the session exactly as it was.
    pub fn apply(&mut self, action: Action, engine: &dyn Engine) -> Result<Outcome, SessionError> {
        let name = action.name();
        let outcome = match action {
            Action::Load(table) => {
                self.load(table);
                Ok(Outcome::Applied)
            }
            Action::Edit { row, column, value } => self.edit(row, &column, value),
            Action::Select { row, value } => self.select(row, value),
            Action::SelectResult { row, value } => self.select_result(row, value),
            Action::AppendRow => self.append_row(),
            Action::BulkRemove => self.bulk_remove(),
            Action::BulkMarkFinal => self.bulk_mark_final(),
            Action::BulkMarkFraud => self.bulk_mark_fraud(),
            Action::NextPage => self.next_page(),
            Action::PrevPage => self.prev_page(),
            Action::RunEngine => self.run_engine(engine),
        };

        match &outcome {
            Ok(Outcome::Notice(notice)) => warn!("{}: {}", name, notice),
            Ok(o) => debug!("{}: {:?}", name, o),
            Err(e) => warn!("{} rejected: {}", name, e),
        }
        outcome
    }

    /// Replace all session state with a freshly loaded table.
    pub fn load(&mut self, table: Table) {
        let ids: Vec<RowId> = (0..table.row_count() as u64).map(RowId).collect();
        let working = WorkingTable::build(table, self.mode.flag(), &ids);
        info!(
            "loaded {} rows x {} columns ({} pre-flagged {})",
            working.len(),
            working.columns().len(),
            working.flagged_count(),
            working.flag().column_name()
        );
        self.working = Some(working);
        self.engine_result = None;
        self.page = PaginationWindow::default();
        self.next_id = ids.len() as u64;
    }

    /// Write a value into one cell. No type check is made against the column.
    pub fn edit(
        &mut self,
        row: usize,
        column: &str,
        value: CellValue,
    ) -> Result<Outcome, SessionError> {
        self.visible_id(row)?;
        let working = self.working.as_mut().ok_or(SessionError::NotLoaded)?;
        let col = working.column_position(column)?;
        working.rows[row].values[col] = value;
        Ok(Outcome::Applied)
    }

    pub fn select(&mut self, row: usize, value: bool) -> Result<Outcome, SessionError> {
        let id = self.visible_id(row)?;
        let working = self.working.as_mut().ok_or(SessionError::NotLoaded)?;
        working.set_selected(id, value);
        Ok(Outcome::Applied)
    }

    pub fn select_result(&mut self, row: usize, value: bool) -> Result<Outcome, SessionError> {
        self.require("select_result", SessionMode::Reconcile)?;
        self.working_ref()?;
        let result = self
            .engine_result
            .as_mut()
            .ok_or(SessionError::EngineNotRun)?;
        let id = result.id_at(row)?;
        result.set_selected(id, value);
        Ok(Outcome::Applied)
    }

    /// Add an empty row at the end of the working table.
    ///
    /// In reconcile mode the page moves to the last page so the new row is
    /// visible and editable.
    pub fn append_row(&mut self) -> Result<Outcome, SessionError> {
        let id = RowId(self.next_id);
        let working = self.working.as_mut().ok_or(SessionError::NotLoaded)?;
        let values = vec![CellValue::Empty; working.columns.len()];
        working.rows.push(WorkingRow { id, values });
        let len = working.len();

        self.next_id += 1;
        if self.mode.is_paginated() {
            self.page.page_number = self.page.page_count(len) - 1;
        }
        info!("appended row {}, {} rows", id, len);
        Ok(Outcome::Applied)
    }

    /// Remove the selected rows from the working table.
    pub fn bulk_remove(&mut self) -> Result<Outcome, SessionError> {
        let working = self.working.as_mut().ok_or(SessionError::NotLoaded)?;
        if working.selected.is_empty() {
            return Ok(Outcome::Notice(Notice::NothingSelected));
        }
        let removed = working.remove_selected();
        let remaining = working.len();
        self.page.clamp(remaining);
        info!("removed {} rows, {} remain", removed, remaining);
        Ok(Outcome::Applied)
    }

    pub fn bulk_mark_final(&mut self) -> Result<Outcome, SessionError> {
        self.require("mark_final", SessionMode::Finalize)?;
        let working = self.working.as_mut().ok_or(SessionError::NotLoaded)?;
        Ok(mark_selected(working))
    }

    pub fn bulk_mark_fraud(&mut self) -> Result<Outcome, SessionError> {
        self.require("mark_fraud", SessionMode::Reconcile)?;
        self.working_ref()?;
        let result = self
            .engine_result
            .as_mut()
            .ok_or(SessionError::EngineNotRun)?;
        Ok(mark_selected(result))
    }

    pub fn next_page(&mut self) -> Result<Outcome, SessionError> {
        self.require("next_page", SessionMode::Reconcile)?;
        let len = self.working_ref()?.len();
        if self.page.next(len) {
            Ok(Outcome::Applied)
        } else {
            Ok(Outcome::Unchanged)
        }
    }

    pub fn prev_page(&mut self) -> Result<Outcome, SessionError> {
        self.require("prev_page", SessionMode::Reconcile)?;
        self.working_ref()?;
        if self.page.prev() {
            Ok(Outcome::Applied)
        } else {
            Ok(Outcome::Unchanged)
        }
    }

    /// Run the engine over the working table and replace the engine result.
    pub fn run_engine(&mut self, engine: &dyn Engine) -> Result<Outcome, SessionError> {
        self.require("run_engine", SessionMode::Reconcile)?;
        let working = self.working_ref()?;

        let input = working.data_table();
        let output = engine.reconcile(&input);
        if output.row_count() != input.row_count() {
            return Err(SessionError::EngineContract {
                expected: input.row_count(),
                found: output.row_count(),
            });
        }

        let ids = working.ids();
        let mut result = WorkingTable::build(output, FlagKind::Fraud, &ids);
        result.flagged.extend(working.flagged.iter().copied());

        if let (RerunPolicy::Merge, Some(prior)) = (self.rerun_policy, &self.engine_result) {
            let live: BTreeSet<RowId> = ids.iter().copied().collect();
            result
                .flagged
                .extend(prior.flagged.intersection(&live).copied());
        }

        info!(
            "engine produced {} rows ({} flagged fraud)",
            result.len(),
            result.flagged_count()
        );
        self.engine_result = Some(result);
        Ok(Outcome::Applied)
    }

    /// Rows marked `final`, ready for download. `None` when nothing is flagged.
    pub fn export_final(&self) -> Result<Option<Table>, SessionError> {
        self.require("export_final", SessionMode::Finalize)?;
        Ok(non_empty(self.working_ref()?.flagged_table()))
    }

    /// Rows of the engine result marked `fraud`. `None` when nothing is flagged.
    pub fn export_fraud(&self) -> Result<Option<Table>, SessionError> {
        self.require("export_fraud", SessionMode::Reconcile)?;
        self.working_ref()?;
        let result = self
            .engine_result
            .as_ref()
            .ok_or(SessionError::EngineNotRun)?;
        Ok(non_empty(result.flagged_table()))
    }

    pub fn export(&self, flag: FlagKind) -> Result<Option<Table>, SessionError> {
        match flag {
            FlagKind::Final => self.export_final(),
            FlagKind::Fraud => self.export_fraud(),
        }
    }
}

/// The pure form of [`TableSession::apply`]: returns the next state and
/// leaves `state` as it was.
pub fn transition(
    state: &TableSession,
    action: Action,
    engine: &dyn Engine,
) -> Result<(TableSession, Outcome), SessionError> {
    let mut next = state.clone();
    let outcome = next.apply(action, engine)?;
    Ok((next, outcome))
}

fn mark_selected(table: &mut WorkingTable) -> Outcome {
    if table.selected.is_empty() {
        return Outcome::Notice(Notice::NothingSelected);
    }
    let newly = table.flag_selected();
    info!(
        "marked {} rows {} ({} total)",
        newly,
        table.flag.column_name(),
        table.flagged_count()
    );
    Outcome::Applied
}

fn non_empty(table: Table) -> Option<Table> {
    if table.is_empty() { None } else { Some(table) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_of_empty_table_is_one() {
        let window = PaginationWindow::default();
        assert_eq!(window.page_count(0), 1);
        assert_eq!(window.page_count(10), 1);
        assert_eq!(window.page_count(11), 2);
    }

    #[test]
    fn last_page_is_partial() {
        let window = PaginationWindow {
            page_number: 2,
            page_size: 10,
        };
        assert_eq!(window.range(25), 20..25);
    }

    #[test]
    fn clamp_pulls_page_back() {
        let mut window = PaginationWindow {
            page_number: 2,
            page_size: 10,
        };
        window.clamp(15);
        assert_eq!(window.page_number, 1);
        window.clamp(0);
        assert_eq!(window.page_number, 0);
    }

    #[test]
    fn prev_at_zero_is_noop() {
        let mut window = PaginationWindow::default();
        assert!(!window.prev());
        assert_eq!(window.page_number, 0);
    }

    #[test]
    fn build_lifts_flag_column_and_drops_select() {
        let table = Table::from_rows(
            ["select", "id", "final"],
            vec![
                vec![CellValue::Bool(true), CellValue::Int(1), CellValue::Bool(true)],
                vec![CellValue::Bool(false), CellValue::Int(2), CellValue::Int(0)],
            ],
        )
        .unwrap();
        let working = WorkingTable::build(table, FlagKind::Final, &[RowId(0), RowId(1)]);
        assert_eq!(working.columns(), ["id"]);
        assert!(working.is_flagged(0));
        assert!(!working.is_flagged(1));
        assert_eq!(working.selected_count(), 0);
    }
}
