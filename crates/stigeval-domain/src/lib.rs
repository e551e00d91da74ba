//! Pure STIG control evaluation (no IO).
//!
//! Input: control definitions, a scan policy and a [`FactProvider`].
//! Output: one terminal result per control plus verdict and summary data.
//!
//! Host access stays behind [`FactProvider`]; the engine only decides applicability,
//! resolves expected values, compares, and classifies.

#![forbid(unsafe_code)]

pub mod applicability;
pub mod assertion;
pub mod cancel;
pub mod classify;
pub mod error;
pub mod host;
pub mod model;
pub mod policy;
pub mod provider;
pub mod report;
pub mod resolve;
pub mod session;

mod engine;

pub use cancel::CancelToken;
pub use engine::{EvalContext, evaluate, evaluate_control};
pub use error::{Cancelled, EvalError, ModelError, ProviderError};
pub use provider::{CachingProvider, FactAnswer, FactProvider, MemoryProvider};

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;
