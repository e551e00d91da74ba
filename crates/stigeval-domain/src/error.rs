use stigeval_types::ids;

/// Failure reported by a fact provider. Never retried by the engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("query timed out after {0} ms")]
    Timeout(u64),
    #[error("fact source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Errors local to one control evaluation.
///
/// None of these abort sibling controls. `Cancelled` never reaches a result: the
/// evaluation is dropped instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("fact provider failed for {fact}: {source}")]
    Provider {
        fact: String,
        #[source]
        source: ProviderError,
    },
    #[error("could not resolve expected value for {lookup}: {reason}")]
    Resolution { lookup: String, reason: String },
    #[error("unrecognized role facts: {0}")]
    Applicability(String),
    #[error("evaluation cancelled")]
    Cancelled,
}

impl EvalError {
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::Provider { .. } => ids::CODE_PROVIDER_ERROR,
            EvalError::Resolution { .. } => ids::CODE_RESOLUTION_ERROR,
            EvalError::Applicability(_) => ids::CODE_APPLICABILITY_ERROR,
            EvalError::Cancelled => ids::CODE_RUNTIME_ERROR,
        }
    }
}

/// A control evaluation abandoned at a fact provider boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("evaluation abandoned after cancellation")]
pub struct Cancelled;

/// Structural problems in a control definition, caught when a catalog is loaded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("control id must not be empty")]
    EmptyId,
    #[error("{control}: applicability can select branch '{branch}' but no such branch is defined")]
    MissingBranch { control: String, branch: String },
    #[error("{control}: branch '{branch}' is defined twice")]
    DuplicateBranch { control: String, branch: String },
    #[error("{control}: branch '{branch}' is never selected by the applicability rule")]
    UnreachableBranch { control: String, branch: String },
    #[error("{control}: branch '{branch}' has no check groups")]
    EmptyBranch { control: String, branch: String },
    #[error("{control}: branch '{branch}' group {group} has no assertions")]
    EmptyGroup {
        control: String,
        branch: String,
        group: usize,
    },
    #[error("{control}: exemption '{input}' targets unselectable branch '{branch}'")]
    UnreachableExemption {
        control: String,
        input: String,
        branch: String,
    },
}
