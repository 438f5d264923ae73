use crate::config::DatabaseConfig;
use crate::db::decode::decode_row;
use crate::db::statement::{ExecResult, Row, Statement};
use crate::db::traits::Database;
use crate::error::StoreError;
use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde_json::Value;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlArguments, MySqlPoolOptions};
use sqlx::query::Query;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Run a write or DDL statement.
    Execute(Statement, RpcReplyPort<Result<ExecResult, StoreError>>),

    /// Run a read statement and decode every row.
    Fetch(Statement, RpcReplyPort<Result<Vec<Row>, StoreError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

#[async_trait]
impl Database for DbActorHandle {
    async fn execute(&self, statement: Statement) -> Result<ExecResult, StoreError> {
        ractor::call!(self.actor, DbActorMessage::Execute, statement)
            .map_err(|e| StoreError::RactorError(format!("DbActor Execute RPC failed: {e}")))?
    }

    async fn fetch(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        ractor::call!(self.actor, DbActorMessage::Fetch, statement)
            .map_err(|e| StoreError::RactorError(format!("DbActor Fetch RPC failed: {e}")))?
    }
}

pub struct DbActorArgs {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

struct DbActorState {
    pool: MySqlPool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = DbActorArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let pool = MySqlPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(args.acquire_timeout)
            .connect_lazy(args.database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?;

        info!(
            max_connections = args.max_connections,
            "DbActor initialized"
        );
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::Execute(statement, reply) => {
                let res = self.execute(&state.pool, statement).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Fetch(statement, reply) => {
                let res = self.fetch(&state.pool, statement).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn execute(&self, pool: &MySqlPool, statement: Statement) -> Result<ExecResult, StoreError> {
        let statement = statement.expand();
        debug!(sql = %statement.sql, params = statement.params.len(), "execute");

        let done = bind_all(sqlx::query(&statement.sql), &statement.params)
            .execute(pool)
            .await?;

        Ok(ExecResult {
            rows_affected: done.rows_affected(),
            last_insert_id: done.last_insert_id(),
        })
    }

    async fn fetch(&self, pool: &MySqlPool, statement: Statement) -> Result<Vec<Row>, StoreError> {
        let statement = statement.expand();
        debug!(sql = %statement.sql, params = statement.params.len(), "fetch");

        let rows = bind_all(sqlx::query(&statement.sql), &statement.params)
            .fetch_all(pool)
            .await?;

        Ok(rows.iter().map(decode_row).collect())
    }
}

fn bind_all<'q>(
    mut query: Query<'q, sqlx::MySql, MySqlArguments>,
    params: &'q [Value],
) -> Query<'q, sqlx::MySql, MySqlArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i)
                } else if let Some(u) = n.as_u64() {
                    query.bind(u)
                } else {
                    query.bind(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => query.bind(s.as_str()),
            // Arrays left after `expand` are nested values; store them as JSON text.
            Value::Array(_) | Value::Object(_) => query.bind(param.to_string()),
        };
    }
    query
}

/// Spawn the database actor and return a cloneable handle.
///
/// The pool connects lazily; call [`Database::ping`] to surface connection problems early.
pub async fn spawn(config: &DatabaseConfig, database_url: &str) -> Result<DbActorHandle, StoreError> {
    let args = DbActorArgs {
        database_url: database_url.to_string(),
        max_connections: config.max_connections,
        acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
    };

    let (actor, _jh) = ractor::Actor::spawn(Some("DbActor".to_string()), DbActor, args)
        .await
        .map_err(|e| StoreError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}
