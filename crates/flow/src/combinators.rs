//! Small combinators for linear pipelines over failure values.
//!
//! These are plain generic functions, so their inputs and the results of
//! their closures are [`Flow`] values: return `Ok(value)` for a normal value.

use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};

use crate::classify::{global, Classifier, Flow};
use crate::failure::Failure;

/// Run `f`, capturing a panic as a failure, and classify what it returns.
pub fn call<F, V>(f: F) -> Result<V::Value, Failure>
where
    F: FnOnce() -> V,
    V: Flow,
{
    call_with(global(), f)
}

/// [`call`] against an explicit classifier.
pub fn call_with<F, V>(classifier: &Classifier, f: F) -> Result<V::Value, Failure>
where
    F: FnOnce() -> V,
    V: Flow,
{
    capture(classifier, f)?.classify(classifier)
}

/// Run `f`, converting a panic into a failure through `classifier`.
#[doc(hidden)]
pub fn capture<F, T>(classifier: &Classifier, f: F) -> Result<T, Failure>
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| classifier.catch(payload))
}

/// Apply `f` to a normal value; pass a failure through untouched.
pub fn then<V, F, U>(value: V, f: F) -> Result<U::Value, Failure>
where
    V: Flow,
    F: FnOnce(V::Value) -> U,
    U: Flow,
{
    value.into_flow().and_then(|value| f(value).into_flow())
}

/// [`then`], with `f` run under [`call`].
pub fn then_call<V, F, U>(value: V, f: F) -> Result<U::Value, Failure>
where
    V: Flow,
    F: FnOnce(V::Value) -> U,
    U: Flow,
{
    value.into_flow().and_then(|value| call(|| f(value)))
}

/// Apply `f` to a failure; pass a normal value through untouched.
pub fn otherwise<V, F, U>(value: V, f: F) -> Result<V::Value, Failure>
where
    V: Flow,
    F: FnOnce(Failure) -> U,
    U: Flow<Value = V::Value>,
{
    value.into_flow().or_else(|failure| f(failure).into_flow())
}

/// [`otherwise`], with `f` run under [`call`].
pub fn otherwise_call<V, F, U>(value: V, f: F) -> Result<V::Value, Failure>
where
    V: Flow,
    F: FnOnce(Failure) -> U,
    U: Flow<Value = V::Value>,
{
    value.into_flow().or_else(|failure| call(|| f(failure)))
}

/// [`otherwise`], only for failures caused by an `E`.
pub fn otherwise_if<E, V, F, U>(value: V, f: F) -> Result<V::Value, Failure>
where
    E: StdError + 'static,
    V: Flow,
    F: FnOnce(Failure) -> U,
    U: Flow<Value = V::Value>,
{
    match value.into_flow() {
        Err(failure) if failure.is_caused_by::<E>() => f(failure).into_flow(),
        other => other,
    }
}

/// Run `f` for its side effect on any value, failure or not, and return the value.
pub fn thru<V, F>(value: V, f: F) -> V
where
    F: FnOnce(&V),
{
    f(&value);
    value
}
