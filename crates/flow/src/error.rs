//! Error types for the flow library.

use thiserror::Error;

/// Errors raised by the library itself.
///
/// Failures flowing through user pipelines are [`Failure`](crate::Failure)
/// values; this type only covers what the library reports on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A panic was captured. Attached as the cause of the resulting failure.
    #[error("panicked: {0}")]
    Panic(String),
    /// [`install`](crate::install) was called after a classifier was already in place.
    #[error("a failure classifier is already installed")]
    ClassifierInstalled,
}
