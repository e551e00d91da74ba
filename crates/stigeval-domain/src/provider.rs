//! The fact provider seam.
//!
//! The engine never touches the registry, the security policy database or WMI itself.
//! Everything it knows about the host arrives through [`FactProvider::query`].

use crate::error::ProviderError;
use crate::model::FactQuery;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock};
use stigeval_types::Value;

/// `Ok(None)` means the fact is not present on the host.
pub type FactAnswer = Result<Option<Value>, ProviderError>;

/// Supplies host facts. Implementations must tolerate concurrent read-only queries.
pub trait FactProvider: Send + Sync {
    fn query(&self, query: &FactQuery) -> FactAnswer;
}

impl<P: FactProvider + ?Sized> FactProvider for &P {
    fn query(&self, query: &FactQuery) -> FactAnswer {
        (**self).query(query)
    }
}

impl<P: FactProvider + ?Sized> FactProvider for Arc<P> {
    fn query(&self, query: &FactQuery) -> FactAnswer {
        (**self).query(query)
    }
}

impl<P: FactProvider + ?Sized> FactProvider for Box<P> {
    fn query(&self, query: &FactQuery) -> FactAnswer {
        (**self).query(query)
    }
}

/// Fixed answers held in memory. Records every query it receives.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    answers: BTreeMap<FactQuery, FactAnswer>,
    log: Mutex<Vec<FactQuery>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query: FactQuery, answer: FactAnswer) {
        self.answers.insert(query, answer);
    }

    pub fn with(mut self, query: FactQuery, value: impl Into<Value>) -> Self {
        self.insert(query, Ok(Some(value.into())));
        self
    }

    pub fn with_error(mut self, query: FactQuery, error: ProviderError) -> Self {
        self.insert(query, Err(error));
        self
    }

    /// Queries received so far, in arrival order.
    pub fn queried(&self) -> Vec<FactQuery> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl FactProvider for MemoryProvider {
    fn query(&self, query: &FactQuery) -> FactAnswer {
        if let Ok(mut log) = self.log.lock() {
            log.push(query.clone());
        }
        self.answers.get(query).cloned().unwrap_or(Ok(None))
    }
}

/// Answers each distinct query at most once per run.
///
/// Concurrent callers asking for the same key block on that key only; the role facts
/// every control needs are fetched once and shared.
pub struct CachingProvider<P> {
    inner: P,
    cells: Mutex<HashMap<FactQuery, Arc<OnceLock<FactAnswer>>>>,
}

impl<P: FactProvider> CachingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cells: Mutex::new(HashMap::new()),
        }
    }

    fn cell(&self, query: &FactQuery) -> Arc<OnceLock<FactAnswer>> {
        match self.cells.lock() {
            Ok(mut cells) => cells.entry(query.clone()).or_default().clone(),
            // A poisoned map only loses sharing, not correctness.
            Err(_) => Arc::new(OnceLock::new()),
        }
    }
}

impl<P: FactProvider> FactProvider for CachingProvider<P> {
    fn query(&self, query: &FactQuery) -> FactAnswer {
        self.cell(query)
            .get_or_init(|| self.inner.query(query))
            .clone()
    }
}
