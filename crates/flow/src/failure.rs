//! The failure carrier.
//!
//! A [`Failure`] is a plain value: building one never captures a backtrace
//! unless asked to, so returning failures is as cheap as returning any other
//! small struct.

use std::any::Any;
use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::num::{ParseFloatError, ParseIntError};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::Error;

/// Structured payload attached to a failure.
pub type Data = serde_json::Map<String, Value>;

/// A panic payload is `Send` but not `Sync`; the mutex makes it shareable.
type Payload = Arc<Mutex<Box<dyn Any + Send>>>;

/// A failure value: a message, a data payload and an optional cause.
///
/// A failure captured from a panic also keeps the raw panic payload, see
/// [`downcast_payload`](Failure::downcast_payload).
#[derive(Debug, Clone)]
pub struct Failure {
    message: String,
    data: Data,
    cause: Option<Arc<dyn StdError + Send + Sync>>,
    backtrace: Option<Arc<Backtrace>>,
    payload: Option<Payload>,
}

impl Failure {
    /// Create a failure with a message and an empty payload.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: Data::new(),
            cause: None,
            backtrace: None,
            payload: None,
        }
    }

    /// Wrap an error. The message is the error's `Display` output and the
    /// error itself is kept as the cause.
    pub fn from_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new(error.to_string()).with_cause(error)
    }

    /// Add one entry to the payload.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Merge a JSON value into the payload.
    ///
    /// Object keys are merged; any other value is stored under `"value"`.
    pub fn with_json_data(mut self, json: Value) -> Self {
        match json {
            Value::Object(map) => self.data.extend(map),
            other => {
                self.data.insert("value".to_string(), other);
            }
        }
        self
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub(crate) fn retain_payload(mut self, payload: Box<dyn Any + Send>) -> Self {
        self.payload = Some(Arc::new(Mutex::new(payload)));
        self
    }

    /// Capture a backtrace at this point. Off by default.
    pub fn with_backtrace(mut self) -> Self {
        self.backtrace = Some(Arc::new(Backtrace::force_capture()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Look up one payload entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_deref()
    }

    /// The cause, if it is an `E`.
    pub fn downcast_cause<E: StdError + 'static>(&self) -> Option<&E> {
        self.cause()?.downcast_ref::<E>()
    }

    pub fn is_caused_by<E: StdError + 'static>(&self) -> bool {
        self.downcast_cause::<E>().is_some()
    }

    /// Run `f` on the panic payload this failure was captured from, if that
    /// payload is a `T`.
    pub fn inspect_payload<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let payload = self.payload.as_ref()?.lock().unwrap_or_else(PoisonError::into_inner);
        (**payload).downcast_ref::<T>().map(f)
    }

    /// A copy of the panic payload this failure was captured from, if that
    /// payload is a `T`.
    ///
    /// ```
    /// #[derive(Clone, Debug, PartialEq)]
    /// struct Custom(u32);
    ///
    /// let failure = flow::call(|| -> Result<i32, flow::Failure> {
    ///     std::panic::panic_any(Custom(7))
    /// })
    /// .unwrap_err();
    /// assert_eq!(failure.downcast_payload::<Custom>(), Some(Custom(7)));
    /// ```
    pub fn downcast_payload<T: Any + Clone>(&self) -> Option<T> {
        self.inspect_payload(T::clone)
    }

    /// Throw this failure.
    ///
    /// This unwinds without running the panic hook, so nothing is printed
    /// and no backtrace is taken. When the unwind is captured by
    /// [`flet!`](crate::flet) or [`call`](crate::call), the same failure comes
    /// back out. Uncaught, it ends the thread silently.
    pub fn raise(self) -> ! {
        std::panic::resume_unwind(Box::new(self))
    }

    /// Render as `{ "message": .., "data": {..}, "cause": .. }`.
    pub fn to_json(&self) -> Value {
        // Serializing a map of JSON values into a `Value` cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Failure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Two failures are equal when their messages and payloads are.
impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message && self.data == other.data
    }
}

#[derive(Serialize)]
struct FailureView<'a> {
    message: &'a str,
    data: &'a Data,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<String>,
}

impl Serialize for Failure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FailureView {
            message: &self.message,
            data: &self.data,
            cause: self.cause.as_ref().map(|cause| cause.to_string()),
        }
        .serialize(serializer)
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::new(message)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::new(message)
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        let panic = match &error {
            Error::Panic(message) => Some(message.clone()),
            Error::ClassifierInstalled => None,
        };
        match panic {
            Some(message) => Failure::from_error(error).with_data("panic", message),
            None => Failure::from_error(error),
        }
    }
}

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        let kind = format!("{:?}", error.kind());
        Failure::from_error(error).with_data("kind", kind)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(error: serde_json::Error) -> Self {
        Failure::from_error(error)
    }
}

impl From<ParseIntError> for Failure {
    fn from(error: ParseIntError) -> Self {
        Failure::from_error(error)
    }
}

impl From<ParseFloatError> for Failure {
    fn from(error: ParseFloatError) -> Self {
        Failure::from_error(error)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for Failure {
    fn from(error: Box<dyn StdError + Send + Sync>) -> Self {
        match error.downcast::<Failure>() {
            Ok(failure) => *failure,
            Err(error) => Failure {
                message: error.to_string(),
                data: Data::new(),
                cause: Some(Arc::from(error)),
                backtrace: None,
                payload: None,
            },
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<Failure>() {
            Ok(failure) => failure,
            Err(error) => Failure::from(Box::<dyn StdError + Send + Sync>::from(error)),
        }
    }
}

/// Build a [`Failure`] from a message and an optional JSON payload.
///
/// ```
/// let failure = flow::fail_with!("not found", { "id": 7 });
/// assert_eq!(failure.message(), "not found");
/// assert_eq!(failure.get("id"), Some(&serde_json::json!(7)));
/// ```
#[macro_export]
macro_rules! fail_with {
    ($message:expr $(,)?) => {
        $crate::Failure::new($message)
    };
    ($message:expr, $($data:tt)+) => {
        $crate::Failure::new($message).with_json_data($crate::__private::json!($($data)+))
    };
}

/// Build a [`Failure`] like [`fail_with!`] and throw it.
#[macro_export]
macro_rules! raise {
    ($($args:tt)+) => {
        $crate::fail_with!($($args)+).raise()
    };
}
