//! Deciding what counts as a failure.
//!
//! Two seams work together here:
//!
//! - [`Flow`] is implemented by types that can carry a failure and answers
//!   "is this value a failure, and if not, what does it bind as". Downstream
//!   crates implement it for their own failure representations. Values of
//!   every other type are normal: [`flet!`](crate::flet) and
//!   [`is_failure!`](crate::is_failure!) bind and test them as they are.
//! - [`Classifier`] is a registry keyed by runtime type. It classifies values
//!   whose type is only known at runtime (`dyn Any`), and it turns captured
//!   panic payloads into [`Failure`]s.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::panic;

use once_cell::sync::{Lazy, OnceCell};

use crate::error::Error;
use crate::failure::Failure;

/// Classification of a value into a normal value or a failure.
pub trait Flow: Sized {
    /// What a normal value binds as.
    type Value;

    /// Whether this value is a failure.
    fn is_failure(&self) -> bool;

    /// Split into the normal value or the failure.
    fn into_flow(self) -> Result<Self::Value, Failure>;

    /// Like [`into_flow`](Flow::into_flow), consulting `classifier` for
    /// values whose type is only known at runtime.
    fn classify(self, _classifier: &Classifier) -> Result<Self::Value, Failure> {
        self.into_flow()
    }
}

impl<T, E> Flow for Result<T, E>
where
    E: Into<Failure>,
{
    type Value = T;

    fn is_failure(&self) -> bool {
        self.is_err()
    }

    fn into_flow(self) -> Result<T, Failure> {
        self.map_err(Into::into)
    }
}

impl Flow for Failure {
    type Value = Infallible;

    fn is_failure(&self) -> bool {
        true
    }

    fn into_flow(self) -> Result<Infallible, Failure> {
        Err(self)
    }
}

impl Flow for Box<dyn Any + Send> {
    type Value = Self;

    fn is_failure(&self) -> bool {
        global().is_failure(&**self)
    }

    fn into_flow(self) -> Result<Self, Failure> {
        self.classify(global())
    }

    fn classify(self, classifier: &Classifier) -> Result<Self, Failure> {
        match classifier.classify(&*self) {
            Some(failure) => Err(failure),
            None => Ok(self),
        }
    }
}

type Rule = Box<dyn Fn(&dyn Any) -> Option<Failure> + Send + Sync>;

/// Registry of failure representations, keyed by runtime type.
///
/// Build one at startup and either [`install`] it or pass it explicitly to
/// [`call_with`](crate::call_with) and `flet!([:classifier, ..])`. Rules
/// never change once the classifier is in use.
pub struct Classifier {
    rules: HashMap<TypeId, Rule>,
    ignored: HashSet<TypeId>,
}

impl Classifier {
    /// A classifier that only recognizes [`Failure`].
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
            ignored: HashSet::new(),
        }
        .register(|failure: &Failure| failure.clone())
    }

    /// Treat values of type `T` as failures, converted by `rule`.
    ///
    /// Replaces any earlier rule for `T`.
    pub fn register<T, F>(mut self, rule: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Failure + Send + Sync + 'static,
    {
        let rule: Rule = Box::new(move |value: &dyn Any| value.downcast_ref::<T>().map(&rule));
        self.rules.insert(TypeId::of::<T>(), rule);
        self
    }

    /// Never capture panics whose payload is a `T`; they keep unwinding.
    pub fn ignore<T: Any>(mut self) -> Self {
        self.ignored.insert(TypeId::of::<T>());
        self
    }

    /// Number of registered failure types.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no failure type is registered, not even [`Failure`].
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `value`'s runtime type has a rule.
    pub fn is_failure(&self, value: &dyn Any) -> bool {
        self.rules.contains_key(&value.type_id())
    }

    /// The failure `value` represents, or `None` for a normal value.
    pub fn classify(&self, value: &dyn Any) -> Option<Failure> {
        let rule = self.rules.get(&value.type_id());
        if rule.is_none() {
            tracing::trace!("value of unregistered type classified as normal");
        }
        rule.and_then(|rule| rule(value))
    }

    /// Convert a captured panic payload into a failure.
    ///
    /// A raised [`Failure`] comes back as it was. Any other payload is kept on
    /// the returned failure, see [`Failure::downcast_payload`]. Payloads of an
    /// [ignored](Classifier::ignore) type resume unwinding.
    pub fn catch(&self, payload: Box<dyn Any + Send>) -> Failure {
        let type_id = (*payload).type_id();
        if self.ignored.contains(&type_id) {
            panic::resume_unwind(payload);
        }

        let payload = match payload.downcast::<Failure>() {
            Ok(failure) => return *failure,
            Err(payload) => payload,
        };
        if let Some(failure) = self.classify(&*payload) {
            return failure.retain_payload(payload);
        }

        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "panic with a non-string payload".to_string()
        };
        tracing::debug!(%message, "captured panic");
        Failure::from(Error::Panic(message)).retain_payload(payload)
    }
}

impl Default for Classifier {
    /// Recognizes [`Failure`], this crate's [`Error`] and `std::io::Error`.
    fn default() -> Self {
        Self::new()
            .register(|error: &Error| Failure::from(error.clone()))
            .register(|error: &std::io::Error| {
                Failure::new(error.to_string()).with_data("kind", format!("{:?}", error.kind()))
            })
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rules.len())
            .field("ignored", &self.ignored.len())
            .finish()
    }
}

static CLASSIFIER: OnceCell<Classifier> = OnceCell::new();

static DEFAULT: Lazy<Classifier> = Lazy::new(Classifier::default);

/// Install the process-wide classifier.
///
/// Call once, at startup. Classification that happens earlier uses
/// [`Classifier::default`] and does not prevent the install.
pub fn install(classifier: Classifier) -> crate::Result<()> {
    let rules = classifier.len();
    CLASSIFIER
        .set(classifier)
        .map_err(|_| Error::ClassifierInstalled)?;
    tracing::info!(rules, "installed failure classifier");
    Ok(())
}

/// The installed classifier, or [`Classifier::default`] if none was installed.
pub fn global() -> &'static Classifier {
    CLASSIFIER.get().unwrap_or_else(|| Lazy::force(&DEFAULT))
}

/// Whether `value` is a failure, for a type known to implement [`Flow`].
///
/// Generic code uses this; [`is_failure!`](crate::is_failure!) takes a value
/// of any type.
pub fn is_failure<V: Flow>(value: &V) -> bool {
    value.is_failure()
}

/// Whether a value of any type is a failure. The `fail?` predicate.
///
/// Types without a [`Flow`] impl are never failures.
///
/// ```
/// use flow::{is_failure, Failure};
///
/// assert!(is_failure!(Failure::new("bad")));
/// assert!(is_failure!("12x".parse::<i32>()));
/// assert!(!is_failure!(42));
/// assert!(!is_failure!(vec![1, 2, 3]));
/// ```
#[macro_export]
macro_rules! is_failure {
    ($value:expr $(,)?) => {{
        #[allow(unused_imports)]
        use $crate::__private::{FlowKind as _, PlainKind as _, ResultKind as _};
        let value = &$value;
        (&&&$crate::__private::kind_of(value)).flow_kind().is_failure(value)
    }};
}
