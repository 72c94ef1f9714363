/// Integration tests for the process-wide classifier.
///
/// Installing is once per process, so this file holds a single test.

use std::any::Any;

use flow::{call, flet, global, install, is_failure, Classifier, Error, Failure};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Rejected(String);

fn reject(reason: &str) -> Result<i32, Failure> {
    std::panic::panic_any(Rejected(reason.to_string()))
}

#[test]
fn test_install_once_then_classify_globally() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    // Classifying before any install uses the default rules and leaves the
    // slot free.
    assert_eq!(flet!([a, 1, b, Ok::<_, Failure>(2)], a + b), Ok(3));
    let early = call(|| reject("early")).unwrap_err();
    assert!(early.message().contains("non-string payload"));
    assert!(!global().is_failure(&Rejected("x".into())));

    let classifier = Classifier::default()
        .register(|rejected: &Rejected| Failure::new(rejected.0.clone()).with_data("rejected", true));
    install(classifier).unwrap();
    assert!(matches!(install(Classifier::new()), Err(Error::ClassifierInstalled)));

    assert!(global().is_failure(&Rejected("x".into())));
    assert!(global().is_failure(&Failure::new("still recognized")));

    let boxed: Box<dyn Any + Send> = Box::new(Rejected("boxed".into()));
    assert!(is_failure(&boxed));
    let result = flet!([_value, boxed], 1_i32);
    assert_eq!(result.unwrap_err().message(), "boxed");

    let failure = call(|| reject("thrown")).unwrap_err();
    assert_eq!(failure, Failure::new("thrown").with_data("rejected", true));
}
