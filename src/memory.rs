//! In-memory source and destination for unit tests.

use crate::destination::Destination;
use crate::error::SyncError;
use crate::insert::InsertBatch;
use crate::normalize::Row;
use crate::source::Source;
use crate::sql_value::SqlValue;
use crate::table::Table;
use serde_json::Value;
use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

#[derive(Default)]
pub struct MemoryState {
    pub tables: BTreeMap<String, Vec<Row>>,
    pub fail_delete: HashSet<String>,
    pub fail_commit: HashSet<String>,
    pub snapshot: Option<(String, Vec<Row>)>,
    pub fetches: Vec<String>,
    pub deletes: Vec<String>,
    pub inserts: Vec<(String, usize)>,
    pub bound_text: Vec<String>,
    pub begins: usize,
    pub commits: usize,
    pub sequence_resets: Vec<String>,
    pub rollbacks: usize,
    pub closes: usize,
}

/// A shared handle; clones see the same tables and counters.
#[derive(Clone, Default)]
pub struct MemoryDb(Rc<RefCell<MemoryState>>);

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|v| v.as_object().cloned().expect("rows are objects"))
            .collect();
        self.0.borrow_mut().tables.insert(name.to_string(), rows);
        self
    }

    pub fn failing_delete(self, name: &str) -> Self {
        self.0.borrow_mut().fail_delete.insert(name.to_string());
        self
    }

    pub fn failing_commit(self, name: &str) -> Self {
        self.0.borrow_mut().fail_commit.insert(name.to_string());
        self
    }

    pub fn rows(&self, name: &str) -> Vec<Row> {
        self.0.borrow().tables.get(name).cloned().unwrap_or_default()
    }

    pub fn state(&self) -> Ref<'_, MemoryState> {
        self.0.borrow()
    }

    fn restore_snapshot(state: &mut MemoryState) {
        if let Some((name, rows)) = state.snapshot.take() {
            state.tables.insert(name, rows);
        }
    }
}

fn to_json(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Bool(*b),
        SqlValue::Number(n) => Value::Number(n.clone()),
        SqlValue::Text(s) => Value::String(s.clone()),
    }
}

impl Source for MemoryDb {
    fn fetch_rows(&mut self, table: &Table) -> Result<Vec<Row>, SyncError> {
        let mut state = self.0.borrow_mut();
        state.fetches.push(table.name.clone());
        state
            .tables
            .get(&table.name)
            .cloned()
            .ok_or_else(|| SyncError::fetch(table, format!("relation \"{table}\" does not exist")))
    }

    fn close(&mut self) {
        self.0.borrow_mut().closes += 1;
    }
}

impl Destination for MemoryDb {
    fn begin(&mut self, table: &Table) -> Result<(), SyncError> {
        let mut state = self.0.borrow_mut();
        state.begins += 1;
        let rows = state.tables.get(&table.name).cloned().unwrap_or_default();
        state.snapshot = Some((table.name.clone(), rows));
        Ok(())
    }

    fn delete_all(&mut self, table: &Table) -> Result<u64, SyncError> {
        let mut state = self.0.borrow_mut();
        if state.fail_delete.contains(&table.name) {
            return Err(SyncError::delete(table, "permission denied"));
        }
        state.deletes.push(table.name.clone());
        let removed = state
            .tables
            .insert(table.name.clone(), Vec::new())
            .map(|rows| rows.len())
            .unwrap_or(0);
        Ok(removed as u64)
    }

    fn insert(&mut self, batch: &InsertBatch) -> Result<u64, SyncError> {
        let mut state = self.0.borrow_mut();
        state.bound_text.extend(
            batch
                .rows
                .iter()
                .flatten()
                .filter_map(|v| match v {
                    SqlValue::Text(s) => Some(s.clone()),
                    _ => None,
                }),
        );
        let rejected = batch.columns.iter().position(|c| c == "reject").is_some_and(|i| {
            batch.rows.iter().any(|row| row[i] == SqlValue::Bool(true))
        });
        if rejected {
            return Err(SyncError::insert(&batch.table, "check constraint violated"));
        }
        state.inserts.push((batch.table.name.clone(), batch.len()));
        let rows: Vec<Row> = batch
            .rows
            .iter()
            .map(|values| {
                batch
                    .columns
                    .iter()
                    .cloned()
                    .zip(values.iter().map(to_json))
                    .collect()
            })
            .collect();
        state
            .tables
            .entry(batch.table.name.clone())
            .or_default()
            .extend(rows);
        Ok(batch.len() as u64)
    }

    fn commit(&mut self, table: &Table) -> Result<(), SyncError> {
        let mut state = self.0.borrow_mut();
        if state.fail_commit.contains(&table.name) {
            Self::restore_snapshot(&mut state);
            return Err(SyncError::commit(table, "connection reset"));
        }
        state.commits += 1;
        state.snapshot = None;
        Ok(())
    }

    fn reset_sequences(&mut self, table: &Table) -> Result<(), SyncError> {
        let mut state = self.0.borrow_mut();
        if state.snapshot.is_some() {
            return Err(SyncError::sequence(table, "transaction still open"));
        }
        state.sequence_resets.push(table.name.clone());
        Ok(())
    }

    fn rollback(&mut self, _table: &Table) -> Result<(), SyncError> {
        let mut state = self.0.borrow_mut();
        state.rollbacks += 1;
        Self::restore_snapshot(&mut state);
        Ok(())
    }

    fn close(&mut self) {
        self.0.borrow_mut().closes += 1;
    }
}
