#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use simplified::db::{Database, ExecResult, Row, Statement};
use simplified::{ContentStore, Registry, StoreError, TableNaming, TableSchema};
use tokio::sync::oneshot;

const METADATA_MARKER: &str = "table_structure`";

/// In-memory backend: records every statement, keeps schema records like the metadata
/// table would, and serves scripted rows for every other read.
#[derive(Clone, Default)]
pub struct MemoryDb {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    log: Vec<Statement>,
    records: BTreeMap<String, String>,
    scripted: VecDeque<Vec<Row>>,
    failures: Vec<String>,
    rows_affected: Option<u64>,
    next_id: u64,
    holds: Vec<Hold>,
}

struct Hold {
    fragment: String,
    reached: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// A read parked by [`MemoryDb::hold_read`].
pub struct HeldRead {
    reached: Option<oneshot::Receiver<()>>,
    release: oneshot::Sender<()>,
}

impl HeldRead {
    /// Resolves once the read has taken its answer and parked.
    pub async fn reached(&mut self) {
        if let Some(reached) = self.reached.take() {
            reached.await.expect("held read never ran");
        }
    }

    pub fn release(self) {
        let _ = self.release.send(());
    }
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement seen so far, SQL text only.
    pub fn sql(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.state.lock().unwrap().log.clone()
    }

    /// DDL against managed tables (metadata table excluded).
    pub fn ddl(&self) -> Vec<String> {
        self.sql()
            .into_iter()
            .filter(|sql| {
                (sql.starts_with("CREATE") || sql.starts_with("ALTER") || sql.starts_with("DROP"))
                    && !sql.contains(METADATA_MARKER)
            })
            .collect()
    }

    /// Statements that are neither DDL nor metadata bookkeeping.
    pub fn data_statements(&self) -> Vec<Statement> {
        self.statements()
            .into_iter()
            .filter(|s| {
                !s.sql.contains(METADATA_MARKER)
                    && !(s.sql.starts_with("CREATE")
                        || s.sql.starts_with("ALTER")
                        || s.sql.starts_with("DROP"))
            })
            .collect()
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().log.clear();
    }

    /// Queues the rows returned by the next non-metadata read.
    pub fn push_rows(&self, rows: Value) {
        let rows = rows
            .as_array()
            .expect("rows must be an array")
            .iter()
            .map(|r| r.as_object().expect("row must be an object").clone())
            .collect();
        self.state.lock().unwrap().scripted.push_back(rows);
    }

    /// The next statement whose SQL contains `fragment` fails with a backend error.
    pub fn fail_once(&self, fragment: &str) {
        self.state.lock().unwrap().failures.push(fragment.to_string());
    }

    /// The next read whose SQL contains `fragment` takes its answer from the current state,
    /// then waits for [`HeldRead::release`] before returning it.
    pub fn hold_read(&self, fragment: &str) -> HeldRead {
        let (reached_tx, reached_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.state.lock().unwrap().holds.push(Hold {
            fragment: fragment.to_string(),
            reached: reached_tx,
            release: release_rx,
        });
        HeldRead {
            reached: Some(reached_rx),
            release: release_tx,
        }
    }

    pub fn set_rows_affected(&self, n: u64) {
        self.state.lock().unwrap().rows_affected = Some(n);
    }

    pub fn record(&self, table: &str) -> Option<TableSchema> {
        let state = self.state.lock().unwrap();
        state
            .records
            .get(table)
            .map(|text| serde_json::from_str(text).expect("record holds a schema"))
    }

    pub fn record_names(&self) -> Vec<String> {
        self.state.lock().unwrap().records.keys().cloned().collect()
    }

    fn begin(&self, statement: &Statement) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.log.push(statement.clone());
        if let Some(pos) = state
            .failures
            .iter()
            .position(|f| statement.sql.contains(f.as_str()))
        {
            let fragment = state.failures.remove(pos);
            return Err(sqlx::Error::Protocol(format!("injected failure on {fragment}")).into());
        }
        Ok(())
    }
}

fn param_str(statement: &Statement, idx: usize) -> String {
    statement.params[idx]
        .as_str()
        .expect("string parameter")
        .to_string()
}

#[async_trait]
impl Database for MemoryDb {
    async fn execute(&self, statement: Statement) -> Result<ExecResult, StoreError> {
        self.begin(&statement)?;
        let mut state = self.state.lock().unwrap();
        let sql = statement.sql.as_str();

        if sql.contains(METADATA_MARKER) {
            if sql.starts_with("INSERT") {
                let table = param_str(&statement, 0);
                if state.records.contains_key(&table) {
                    return Err(sqlx::Error::Protocol(format!("Duplicate entry '{table}'")).into());
                }
                state.records.insert(table, param_str(&statement, 1));
                return Ok(ExecResult {
                    rows_affected: 1,
                    last_insert_id: 0,
                });
            }
            if sql.starts_with("UPDATE") {
                let (table, columns, key) = (
                    param_str(&statement, 0),
                    param_str(&statement, 1),
                    param_str(&statement, 2),
                );
                let found = state.records.remove(&key).is_some();
                if found {
                    state.records.insert(table, columns);
                }
                return Ok(ExecResult {
                    rows_affected: u64::from(found),
                    last_insert_id: 0,
                });
            }
            if sql.starts_with("DELETE") {
                let found = state.records.remove(&param_str(&statement, 0)).is_some();
                return Ok(ExecResult {
                    rows_affected: u64::from(found),
                    last_insert_id: 0,
                });
            }
            return Ok(ExecResult::default());
        }

        let mut result = ExecResult {
            rows_affected: state.rows_affected.unwrap_or(1),
            last_insert_id: 0,
        };
        if sql.starts_with("INSERT") {
            state.next_id += 1;
            result.last_insert_id = state.next_id;
        }
        Ok(result)
    }

    async fn fetch(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        self.begin(&statement)?;
        let (rows, hold) = {
            let mut state = self.state.lock().unwrap();
            let rows = answer(&mut state, &statement);
            let pos = state
                .holds
                .iter()
                .position(|h| statement.sql.contains(h.fragment.as_str()));
            (rows, pos.map(|pos| state.holds.remove(pos)))
        };

        if let Some(hold) = hold {
            let _ = hold.reached.send(());
            let _ = hold.release.await;
        }
        Ok(rows)
    }
}

fn answer(state: &mut State, statement: &Statement) -> Vec<Row> {
    let sql = statement.sql.as_str();

    if sql == "SELECT 1" {
        return vec![json!({"1": 1}).as_object().unwrap().clone()];
    }

    if sql.contains(METADATA_MARKER) {
        if sql.starts_with("SELECT `columns`") {
            let table = param_str(statement, 0);
            return state
                .records
                .get(&table)
                .map(|text| vec![json!({"columns": text}).as_object().unwrap().clone()])
                .unwrap_or_default();
        }
        if sql.starts_with("SELECT `table`") {
            return state
                .records
                .keys()
                .map(|name| json!({"table": name}).as_object().unwrap().clone())
                .collect();
        }
    }

    state.scripted.pop_front().unwrap_or_default()
}

pub fn store_with(db: &MemoryDb) -> ContentStore<MemoryDb> {
    store_with_registry(db, Registry::builder().build())
}

pub fn store_with_registry(db: &MemoryDb, registry: Arc<Registry>) -> ContentStore<MemoryDb> {
    ContentStore::new(db.clone(), registry, TableNaming::default())
}

pub fn row(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().expect("row must be an object").clone()
}
