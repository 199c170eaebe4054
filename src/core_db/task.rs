use crate::core_db::error::DbError;
use crate::core_db::store::{Query, Store};
use log::{error, trace};
use serde_json::{Map, Value};
use tokio::sync::oneshot;

/// One unit of work for the database worker.
#[derive(Debug)]
pub enum Task {
    Insert {
        container: String,
        document: Value,
    },
    Update {
        container: String,
        query: Query,
        fields: Map<String, Value>,
    },
    Delete {
        container: String,
        query: Query,
    },
    Select {
        container: String,
        query: Query,
        reply: oneshot::Sender<Result<Vec<Value>, DbError>>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

impl Task {
    /// Runs the task against `store`. Write failures are only logged; a select
    /// hands its result back to the waiting caller.
    pub async fn execute(self, store: &mut Store) {
        match self {
            Task::Insert {
                container,
                document,
            } => {
                if let Err(e) = store.insert(&container, document).await {
                    error!("Database insert failed: {}", e);
                }
            }
            Task::Update {
                container,
                query,
                fields,
            } => match store.update(&container, &query, &fields).await {
                Ok(count) => trace!("Updated {} documents in {}", count, container),
                Err(e) => error!("Database update failed: {}", e),
            },
            Task::Delete { container, query } => match store.delete(&container, &query).await {
                Ok(count) => trace!("Deleted {} documents from {}", count, container),
                Err(e) => error!("Database delete failed: {}", e),
            },
            Task::Select {
                container,
                query,
                reply,
            } => {
                let result = store.select(&container, &query).await;
                if let Err(e) = &result {
                    error!("Database select failed: {}", e);
                }
                if reply.send(result).is_err() {
                    trace!("Select caller went away before the result was ready");
                }
            }
            Task::Shutdown { done } => {
                let _ = done.send(());
            }
        }
    }
}
