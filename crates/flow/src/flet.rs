//! Sequential binding that stops at the first failure.
//!
//! `flet!([a, x, b, y], body)` expands to one closure holding a chain of
//! `let` statements. Each initializer, then the body, runs with panics
//! captured and its value classified; a failure leaves the closure through `?`
//! in a single jump, and [`run`] hands it to the failure handler. Per
//! evaluation the form moves through
//!
//! ```text
//! Pending(0) -> Pending(1) -> .. -> Pending(n) -> EvaluatingBody -> Done(value)
//!      \            \                  \               \
//!       +------------+------------------+---------------+--> HandlingFailure(f) -> Done(handler(f))
//! ```
//!
//! and never revisits a state.

use crate::failure::Failure;

/// The default failure handler: the failure becomes the form's `Err`.
pub fn caught<T>(failure: Failure) -> Result<T, Failure> {
    Err(failure)
}

/// Evaluate an expanded `flet!` plan, dispatching its failure, if any, to
/// `handler` exactly once.
pub fn run<T, E, P, H>(plan: P, handler: H) -> Result<T, E>
where
    P: FnOnce() -> Result<T, Failure>,
    H: FnOnce(Failure) -> Result<T, E>,
{
    match plan() {
        Ok(value) => Ok(value),
        Err(failure) => {
            tracing::debug!(failure = %failure.to_json(), "flet short-circuited");
            handler(failure)
        }
    }
}

/// Bind names in order, stopping at the first failure.
///
/// Bindings are a flat list of `pattern, expression` pairs. Each expression
/// sees the names bound before it. A binding whose expression panics, or
/// evaluates to a failure according to [`Flow`](crate::Flow), skips every
/// later binding and the body; the body is checked the same way. Values of
/// types without a `Flow` impl bind as they are.
///
/// With the default handler the form evaluates to `Result<T, Failure>`:
///
/// ```
/// use flow::{flet, Failure};
///
/// assert_eq!(flet!([a, 1, b, 2], a + b), Ok(3));
///
/// fn parse(s: &str) -> Result<i32, Failure> {
///     s.parse::<i32>().map_err(Failure::from)
/// }
///
/// let sum = flet!([a, parse("1"), b, parse("2")], a + b);
/// assert_eq!(sum, Ok(3));
///
/// let failed = flet!([a, parse("1"), b, parse("two")], a + b);
/// assert!(failed.is_err());
/// ```
///
/// A leading `:caught, handler` pair replaces the handler. Its return value
/// is the result of the form, as is, even if it is itself a failure:
///
/// ```
/// use flow::{fail_with, flet};
///
/// let handled: Result<i32, String> = flet!(
///     [:caught, |failure| Err(format!("handled:{}", failure.message())),
///      a, 1_i32,
///      b, Err::<i32, _>(fail_with!("bad"))],
///     a + b
/// );
/// assert_eq!(handled, Err("handled:bad".to_string()));
/// ```
///
/// `:classifier, &classifier` (after the handler pair, if both are given)
/// classifies against an explicit [`Classifier`](crate::Classifier) instead
/// of the [global](crate::global) one.
///
/// Expressions run inside closures: `?` and `return` in a binding or the
/// body act on that closure, so return the `Result` and let `flet!` classify
/// it instead. A `Result` whose error type has no conversion into
/// [`Failure`](crate::Failure) is rejected at compile time.
///
/// The bindings must come in pairs:
///
/// ```compile_fail
/// let _ = flow::flet!([a], 0_i32);
/// ```
///
/// ```compile_fail
/// let _ = flow::flet!([a, 1_i32, b], a);
/// ```
///
/// The marker pairs do not count towards that:
///
/// ```compile_fail
/// let _ = flow::flet!([:caught, flow::caught, a], 0_i32);
/// ```
///
/// ```compile_fail
/// let classifier = flow::Classifier::new();
/// let _ = flow::flet!([:classifier, &classifier, a, 1, b], a);
/// ```
#[macro_export]
macro_rules! flet {
    ([:caught, $handler:expr, :classifier, $classifier:expr $(, $($bindings:tt)*)?], $body:expr $(,)?) => {
        $crate::__private::run(
            || -> ::core::result::Result<_, $crate::Failure> {
                let classifier: &$crate::Classifier = $classifier;
                $crate::__flet_bind!(classifier; [$($($bindings)*)?] $body)
            },
            $handler,
        )
    };
    ([:caught, $handler:expr $(, $($bindings:tt)*)?], $body:expr $(,)?) => {
        $crate::__private::run(
            || -> ::core::result::Result<_, $crate::Failure> {
                let classifier: &$crate::Classifier = $crate::global();
                $crate::__flet_bind!(classifier; [$($($bindings)*)?] $body)
            },
            $handler,
        )
    };
    ([:classifier, $classifier:expr $(, $($bindings:tt)*)?], $body:expr $(,)?) => {
        $crate::__private::run(
            || -> ::core::result::Result<_, $crate::Failure> {
                let classifier: &$crate::Classifier = $classifier;
                $crate::__flet_bind!(classifier; [$($($bindings)*)?] $body)
            },
            $crate::caught,
        )
    };
    ([$($bindings:tt)*], $body:expr $(,)?) => {
        $crate::__private::run(
            || -> ::core::result::Result<_, $crate::Failure> {
                let classifier: &$crate::Classifier = $crate::global();
                $crate::__flet_bind!(classifier; [$($bindings)*] $body)
            },
            $crate::caught,
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __flet_bind {
    ($classifier:ident; [] $body:expr) => {{
        #[allow(unused_imports)]
        use $crate::__private::{FlowKind as _, PlainKind as _, ResultKind as _};
        let value = $crate::__private::capture($classifier, || $body)?;
        (&&&$crate::__private::kind_of(&value)).flow_kind().classify(value, $classifier)
    }};
    ($classifier:ident; [$name:pat, $init:expr $(, $($rest:tt)*)?] $body:expr) => {{
        let $name = {
            #[allow(unused_imports)]
            use $crate::__private::{FlowKind as _, PlainKind as _, ResultKind as _};
            let value = $crate::__private::capture($classifier, || $init)?;
            (&&&$crate::__private::kind_of(&value)).flow_kind().classify(value, $classifier)?
        };
        $crate::__flet_bind!($classifier; [$($($rest)*)?] $body)
    }};
    ($classifier:ident; [$($odd:tt)*] $body:expr) => {
        ::core::compile_error!("flet requires an even number of forms in bindings")
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_run_passes_value_through() {
        let result: Result<i32, Failure> = run(|| Ok(7), caught);
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn test_run_calls_handler_once() {
        let calls = Cell::new(0);
        let result: Result<i32, String> = run(
            || Err(Failure::new("first")),
            |failure| {
                calls.set(calls.get() + 1);
                Err(failure.message().to_uppercase())
            },
        );
        assert_eq!(result, Err("FIRST".to_string()));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_run_skips_handler_on_success() {
        let result: Result<i32, Failure> = run(|| Ok(1), |_| -> Result<i32, Failure> { unreachable!() });
        assert_eq!(result, Ok(1));
    }

    #[test]
    fn test_flet_inside_crate() {
        let result = crate::flet!([a, 2_i32, b, a * 10], a + b);
        assert_eq!(result, Ok(22));
    }

    #[test]
    fn test_flet_unsuffixed_literals() {
        assert_eq!(crate::flet!([a, 1, b, 2], a + b), Ok(3));
        assert_eq!(crate::flet!([x, 1.5, y, x * 2.0], y), Ok(3.0));
    }
}
