//! Static choice of how a macro-bound value is classified.
//!
//! `flet!` and `is_failure!` accept values of any type. Which path a value
//! takes is decided by method resolution on `&&&Kind<V>`:
//!
//! - `V: Flow` resolves at the first autoderef step and is classified.
//! - `Result<T, E>` without a [`Flow`] impl resolves at the second step and
//!   demands `E: Into<Failure>`, so an unconvertible error does not compile
//!   instead of binding silently.
//! - anything else resolves at the last step and is a normal value.
//!
//! Integer and float literals have no [`Flow`] impl to be ambiguous with, so
//! they keep their usual fallback types.

use std::marker::PhantomData;

use crate::classify::{Classifier, Flow};
use crate::failure::Failure;

pub struct Kind<V>(PhantomData<V>);

pub fn kind_of<V>(_: &V) -> Kind<V> {
    Kind(PhantomData)
}

pub struct Flowing;

pub struct Fallible;

pub struct Plain;

pub trait FlowKind {
    #[inline]
    fn flow_kind(&self) -> Flowing {
        Flowing
    }
}

impl<V: Flow> FlowKind for &&Kind<V> {}

pub trait ResultKind {
    #[inline]
    fn flow_kind(&self) -> Fallible {
        Fallible
    }
}

impl<T, E> ResultKind for &Kind<Result<T, E>> {}

pub trait PlainKind {
    #[inline]
    fn flow_kind(&self) -> Plain {
        Plain
    }
}

impl<V> PlainKind for Kind<V> {}

impl Flowing {
    pub fn classify<V: Flow>(self, value: V, classifier: &Classifier) -> Result<V::Value, Failure> {
        value.classify(classifier)
    }

    pub fn is_failure<V: Flow>(self, value: &V) -> bool {
        value.is_failure()
    }
}

impl Fallible {
    pub fn classify<T, E>(self, value: Result<T, E>, _classifier: &Classifier) -> Result<T, Failure>
    where
        E: Into<Failure>,
    {
        value.map_err(Into::into)
    }

    pub fn is_failure<T, E>(self, value: &Result<T, E>) -> bool {
        value.is_err()
    }
}

impl Plain {
    pub fn classify<T>(self, value: T, _classifier: &Classifier) -> Result<T, Failure> {
        Ok(value)
    }

    pub fn is_failure<T>(self, _value: &T) -> bool {
        false
    }
}
