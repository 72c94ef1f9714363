/// Integration tests for extending classification and composing pipelines

use std::cell::Cell;

use flow::{
    call, fail_with, flet, is_failure, otherwise, otherwise_if, then, then_call, thru, Failure, Flow,
};

/// A failure representation defined outside the crate.
#[derive(Debug, PartialEq)]
enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L: Into<Failure>, R> Flow for Either<L, R> {
    type Value = R;

    fn is_failure(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    fn into_flow(self) -> Result<R, Failure> {
        match self {
            Either::Left(left) => Err(left.into()),
            Either::Right(right) => Ok(right),
        }
    }
}

fn lookup(id: u32) -> Either<String, &'static str> {
    match id {
        1 => Either::Right("alice"),
        2 => Either::Right("bob"),
        _ => Either::Left(format!("no user {id}")),
    }
}

#[test]
fn test_custom_representation_in_flet() {
    let result = flet!([a, lookup(1), b, lookup(2)], format!("{a}+{b}"));
    assert_eq!(result.unwrap(), "alice+bob");

    let later = Cell::new(false);
    let result = flet!([a, lookup(1), b, lookup(9), c, { later.set(true); lookup(2) }], (a, b, c));
    assert_eq!(result.unwrap_err().message(), "no user 9");
    assert!(!later.get());
}

#[test]
fn test_custom_representation_with_combinators() {
    assert!(is_failure(&lookup(3)));
    assert!(!is_failure(&lookup(1)));
    assert!(is_failure!(lookup(3)));

    let greeting = then(lookup(2), |name| Ok::<_, Failure>(format!("hi {name}")));
    assert_eq!(greeting.unwrap(), "hi bob");

    let fallback = otherwise(lookup(5), |_| Either::<String, _>::Right("guest"));
    assert_eq!(fallback.unwrap(), "guest");
}

#[test]
fn test_pipeline() {
    let logged = Cell::new(0);

    let total = then(call(|| "40".parse::<i32>()), |n| Ok::<_, Failure>(n + 2));
    let total = thru(total, |_| logged.set(logged.get() + 1));
    let total = otherwise(total, |_| Ok::<_, Failure>(0));
    assert_eq!(total.unwrap(), 42);

    let broken = then(call(|| "forty".parse::<i32>()), |n| Ok::<_, Failure>(n + 2));
    let broken = thru(broken, |_| logged.set(logged.get() + 1));
    assert!(broken.is_err());
    assert_eq!(logged.get(), 2);
}

#[test]
fn test_then_call_and_otherwise_if() {
    let result = then_call(Ok::<_, Failure>(3_i32), |n| -> Result<i32, Failure> {
        if n > 2 {
            panic!("too big: {n}");
        }
        Ok(n)
    });
    let failure = result.unwrap_err();
    assert!(failure.message().contains("too big: 3"));

    let recovered = otherwise_if::<flow::Error, _, _, _>(Err::<i32, _>(failure), |_| Ok::<_, Failure>(0));
    assert_eq!(recovered.unwrap(), 0);

    let untouched =
        otherwise_if::<flow::Error, _, _, _>(Err::<i32, _>(fail_with!("plain")), |_| Ok::<_, Failure>(0));
    assert_eq!(untouched.unwrap_err().message(), "plain");
}

#[test]
fn test_anyhow_errors_classify() {
    fn load() -> anyhow::Result<u8> {
        anyhow::bail!("config missing")
    }

    let result = flet!([config, load()], config + 1);
    assert_eq!(result.unwrap_err().message(), "config missing");
}
