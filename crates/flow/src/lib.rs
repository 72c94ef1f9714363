//! Failures as values.
//!
//! Instead of wrapping results in a dedicated container, this crate treats a
//! failure as an ordinary value: a [`Failure`], an `Err`, or anything a
//! [`Classifier`] recognizes. Every other value is normal. [`flet!`] binds a sequence of values and stops
//! at the first failure, whether it was returned or raised with a panic. The
//! combinators in this crate ([`call`], [`then`], [`otherwise`], [`thru`])
//! build linear pipelines over the same values.
//!
//! ```
//! use flow::{flet, raise};
//!
//! fn checked_div(a: i32, b: i32) -> i32 {
//!     if b == 0 {
//!         raise!("division by zero", { "dividend": a });
//!     }
//!     a / b
//! }
//!
//! let ok = flet!([a, checked_div(10, 2), b, checked_div(a, 5)], a + b);
//! assert_eq!(ok, Ok(6));
//!
//! let failed = flet!([a, checked_div(10, 0), b, checked_div(a, 5)], a + b);
//! assert_eq!(failed.unwrap_err().message(), "division by zero");
//! ```

mod classify;
mod combinators;
mod dispatch;
mod error;
mod failure;
mod flet;

pub use classify::{global, install, is_failure, Classifier, Flow};
pub use combinators::{call, call_with, otherwise, otherwise_call, otherwise_if, then, then_call, thru};
pub use error::Error;
pub use failure::{Data, Failure};
pub use flet::caught;

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[doc(hidden)]
pub mod __private {
    pub use crate::combinators::capture;
    pub use crate::dispatch::{kind_of, FlowKind, PlainKind, ResultKind};
    pub use crate::flet::run;
    pub use serde_json::json;
}
