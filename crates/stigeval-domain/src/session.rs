use crate::cancel::CancelToken;
use crate::error::EvalError;
use crate::host::RoleSource;
use crate::model::FactQuery;
use crate::provider::FactProvider;
use std::collections::BTreeMap;
use stigeval_types::Value;

/// Facts observed during one control evaluation.
///
/// Every provider call goes through [`Session::fetch`], which is also where
/// cancellation is honoured. Answers are read-only snapshots for the rest of the
/// evaluation; they are dropped with the session.
pub struct Session<'a> {
    provider: &'a dyn FactProvider,
    cancel: &'a CancelToken,
    facts: BTreeMap<FactQuery, Option<Value>>,
}

impl<'a> Session<'a> {
    pub fn new(provider: &'a dyn FactProvider, cancel: &'a CancelToken) -> Self {
        Self {
            provider,
            cancel,
            facts: BTreeMap::new(),
        }
    }

    pub fn fetch(&mut self, query: &FactQuery) -> Result<Option<Value>, EvalError> {
        if let Some(known) = self.facts.get(query) {
            return Ok(known.clone());
        }
        if self.cancel.is_cancelled() {
            return Err(EvalError::Cancelled);
        }

        match self.provider.query(query) {
            Ok(answer) => {
                tracing::trace!(fact = %query, found = answer.is_some(), "fact answered");
                self.facts.insert(query.clone(), answer.clone());
                Ok(answer)
            }
            Err(source) => {
                tracing::warn!(fact = %query, error = %source, "fact provider failed");
                Err(EvalError::Provider {
                    fact: query.to_string(),
                    source,
                })
            }
        }
    }
}

impl RoleSource for Session<'_> {
    fn role_fact(&mut self, name: &'static str) -> Result<Option<Value>, EvalError> {
        self.fetch(&FactQuery::new(name))
    }
}
