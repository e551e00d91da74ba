//! Fact provider adapters: snapshot replay and per-query timeouts.

use anyhow::Context;
use camino::Utf8Path;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use stigeval_domain::model::FactQuery;
use stigeval_domain::{FactAnswer, FactProvider, ProviderError};
use stigeval_types::{FactSnapshot, SCHEMA_FACTS_V1};

/// Replays a captured `stigeval.facts.v1` snapshot.
///
/// Queries not present in the snapshot are answered as not found.
#[derive(Debug, Default)]
pub struct SnapshotProvider {
    answers: BTreeMap<FactQuery, FactAnswer>,
}

impl SnapshotProvider {
    pub fn from_snapshot(snapshot: FactSnapshot) -> anyhow::Result<Self> {
        if let Some(schema) = snapshot.schema.as_deref().filter(|s| *s != SCHEMA_FACTS_V1) {
            anyhow::bail!("unsupported facts schema: {schema} (expected {SCHEMA_FACTS_V1})");
        }

        let mut answers = BTreeMap::new();
        for entry in snapshot.facts {
            let query = FactQuery {
                name: entry.name,
                params: entry.params,
            };
            let answer = match (entry.value, entry.error) {
                (Some(_), Some(_)) => {
                    anyhow::bail!("fact {query} has both a value and an error")
                }
                (Some(value), None) => Ok(Some(value)),
                (None, Some(error)) => Err(ProviderError::Unavailable(error)),
                (None, None) => Ok(None),
            };
            if answers.contains_key(&query) {
                anyhow::bail!("fact {query} is recorded more than once");
            }
            answers.insert(query, answer);
        }

        Ok(Self { answers })
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let snapshot: FactSnapshot = serde_json::from_str(text).context("parse facts json")?;
        Self::from_snapshot(snapshot)
    }

    pub fn load(path: &Utf8Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path))?;
        Self::parse(&text).with_context(|| format!("load facts {}", path))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FactProvider for SnapshotProvider {
    fn query(&self, query: &FactQuery) -> FactAnswer {
        self.answers.get(query).cloned().unwrap_or(Ok(None))
    }
}

/// Bounds every query of the wrapped provider.
///
/// Each query runs on its own thread; a query still running at the deadline is
/// reported as [`ProviderError::Timeout`] and its eventual answer discarded.
pub struct TimeoutProvider {
    inner: Arc<dyn FactProvider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn FactProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl FactProvider for TimeoutProvider {
    fn query(&self, query: &FactQuery) -> FactAnswer {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned = query.clone();
        thread::Builder::new()
            .name("stigeval-fact".to_string())
            .spawn(move || {
                // The receiver is gone if the query already timed out.
                let _ = tx.send(inner.query(&owned));
            })
            .map_err(|e| ProviderError::Unavailable(format!("spawn query thread: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(answer) => answer,
            Err(RecvTimeoutError::Timeout) => {
                let ms = self.timeout.as_millis() as u64;
                tracing::warn!(fact = %query, timeout_ms = ms, "fact query timed out");
                Err(ProviderError::Timeout(ms))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ProviderError::Unavailable(
                "query thread exited without answering".to_string(),
            )),
        }
    }
}
