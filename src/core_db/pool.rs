use crate::core_db::error::DbError;
use crate::core_db::store::{Query, Store};
use crate::core_db::task::Task;
use log::{info, warn};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

/// Handle to the database worker task.
///
/// Writes are queued and forgotten; `select` waits for its result. All tasks
/// run in submission order on a single worker that owns the [`Store`].
#[derive(Debug, Clone)]
pub struct Pool {
    sender: mpsc::UnboundedSender<Task>,
}

impl Pool {
    /// Spawns the worker on the current runtime.
    pub fn start(data_dir: impl Into<PathBuf>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();
        let mut store = Store::new(data_dir);
        info!("Database worker started on {:?}", store.data_dir());

        tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                let last = matches!(task, Task::Shutdown { .. });
                task.execute(&mut store).await;
                if last {
                    break;
                }
            }
            info!("Database worker stopped");
        });

        Self { sender }
    }

    pub fn queue(&self, task: Task) {
        if self.sender.send(task).is_err() {
            warn!("Database worker is gone, task dropped");
        }
    }

    pub fn insert(&self, container: &str, document: Value) {
        self.queue(Task::Insert {
            container: container.to_string(),
            document,
        });
    }

    pub fn update(&self, container: &str, query: Query, fields: Map<String, Value>) {
        self.queue(Task::Update {
            container: container.to_string(),
            query,
            fields,
        });
    }

    pub fn delete(&self, container: &str, query: Query) {
        self.queue(Task::Delete {
            container: container.to_string(),
            query,
        });
    }

    pub async fn select(&self, container: &str, query: Query) -> Result<Vec<Value>, DbError> {
        let (reply, result) = oneshot::channel();
        self.sender
            .send(Task::Select {
                container: container.to_string(),
                query,
                reply,
            })
            .map_err(|_| DbError::WorkerStopped)?;
        result.await.map_err(|_| DbError::WorkerStopped)?
    }

    /// Lets the worker finish everything queued so far, then stops it.
    pub async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self.sender.send(Task::Shutdown { done }).is_ok() {
            let _ = finished.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_db::store::query;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_select_sees_earlier_writes() {
        let dir = tempdir().unwrap();
        let pool = Pool::start(dir.path());

        pool.insert("users", json!({"name": "alice"}));
        pool.insert("users", json!({"name": "bob"}));
        pool.delete("users", query([("name", json!("alice"))]));

        let users = pool.select("users", Query::new()).await.unwrap();
        assert_eq!(users, vec![json!({"name": "bob"})]);
    }

    #[tokio::test]
    async fn test_failed_write_is_not_fatal() {
        let dir = tempdir().unwrap();
        let pool = Pool::start(dir.path());

        pool.insert("users", json!("not an object"));
        assert!(pool.select("users", Query::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let dir = tempdir().unwrap();
        let pool = Pool::start(dir.path());
        pool.insert("ipmasks", json!({"user": "alice", "mask": "*@*"}));
        pool.shutdown().await;

        assert!(dir.path().join("ipmasks.json").exists());
        assert!(matches!(
            pool.select("ipmasks", Query::new()).await,
            Err(DbError::WorkerStopped)
        ));
    }
}
