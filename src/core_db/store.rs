use crate::core_db::error::DbError;
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Field-equality filter. An empty query matches every document.
pub type Query = Map<String, Value>;

/// JSON document store: one array file per container under `data_dir`.
///
/// Containers are loaded on first use and kept in memory; every mutation
/// rewrites the container file through a temporary file and a rename. The
/// cached copy only changes once that write succeeded.
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    containers: HashMap<String, Vec<Value>>,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            containers: HashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn insert(&mut self, container: &str, document: Value) -> Result<(), DbError> {
        if !document.is_object() {
            return Err(DbError::InvalidDocument(format!(
                "expected an object in {}, got {}",
                container, document
            )));
        }
        let mut documents = self.load(container).await?.clone();
        documents.push(document);
        self.commit(container, documents).await
    }

    /// Merges `fields` into every matching document. Returns the match count.
    pub async fn update(
        &mut self,
        container: &str,
        query: &Query,
        fields: &Map<String, Value>,
    ) -> Result<usize, DbError> {
        let mut documents = self.load(container).await?.clone();
        let mut updated = 0;
        for document in documents.iter_mut() {
            if matches(document, query) {
                if let Some(object) = document.as_object_mut() {
                    for (key, value) in fields {
                        object.insert(key.clone(), value.clone());
                    }
                    updated += 1;
                }
            }
        }
        if updated > 0 {
            self.commit(container, documents).await?;
        }
        Ok(updated)
    }

    pub async fn delete(&mut self, container: &str, query: &Query) -> Result<usize, DbError> {
        let mut documents = self.load(container).await?.clone();
        let before = documents.len();
        documents.retain(|document| !matches(document, query));
        let removed = before - documents.len();
        if removed > 0 {
            self.commit(container, documents).await?;
        }
        Ok(removed)
    }

    pub async fn select(&mut self, container: &str, query: &Query) -> Result<Vec<Value>, DbError> {
        Ok(self
            .load(container)
            .await?
            .iter()
            .filter(|document| matches(document, query))
            .cloned()
            .collect())
    }

    fn container_path(&self, container: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", container))
    }

    async fn load(&mut self, container: &str) -> Result<&mut Vec<Value>, DbError> {
        if !self.containers.contains_key(container) {
            let path = self.container_path(container);
            let documents = match tokio::fs::read_to_string(&path).await {
                Ok(content) if content.trim().is_empty() => Vec::new(),
                Ok(content) => {
                    serde_json::from_str(&content).map_err(|e| DbError::ReadError {
                        container: container.to_string(),
                        reason: e.to_string(),
                    })?
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => {
                    return Err(DbError::ReadError {
                        container: container.to_string(),
                        reason: e.to_string(),
                    })
                }
            };
            debug!("Loaded {} documents from {:?}", documents.len(), path);
            self.containers.insert(container.to_string(), documents);
        }

        self.containers
            .get_mut(container)
            .ok_or_else(|| DbError::ReadError {
                container: container.to_string(),
                reason: "container vanished from cache".to_string(),
            })
    }

    async fn commit(&mut self, container: &str, documents: Vec<Value>) -> Result<(), DbError> {
        self.save(container, &documents).await?;
        self.containers.insert(container.to_string(), documents);
        Ok(())
    }

    async fn save(&self, container: &str, documents: &[Value]) -> Result<(), DbError> {
        let write_error = |reason: String| DbError::WriteError {
            container: container.to_string(),
            reason,
        };

        let content =
            serde_json::to_string_pretty(documents).map_err(|e| write_error(e.to_string()))?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| write_error(e.to_string()))?;

        let path = self.container_path(container);
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| write_error(e.to_string()))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| write_error(e.to_string()))?;
        Ok(())
    }
}

fn matches(document: &Value, query: &Query) -> bool {
    query
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

/// Builds a query from `key = value` pairs.
pub fn query<const N: usize>(pairs: [(&str, Value); N]) -> Query {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
