use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

use crate::{CollectingReporter, Invocation, LogReporter, report_fn, wrap};

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

struct PendingOnceThenReady {
    pending: bool,
}

impl Future for PendingOnceThenReady {
    type Output = Result<u32, String>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.pending {
            self.pending = false;
            Poll::Pending
        } else {
            Poll::Ready(Ok(7))
        }
    }
}

fn noop_waker() -> Waker {
    Waker::from(Arc::new(NoopWake))
}

#[test]
fn report_fires_only_at_settlement() {
    let reporter = CollectingReporter::new();
    let wrapped = wrap(
        "settle.once",
        || PendingOnceThenReady { pending: true },
        reporter.clone(),
    );

    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    let mut fut = Box::pin(wrapped.call(()));

    assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Pending));
    assert!(reporter.is_empty());

    assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Ready(Ok(7))));
    assert_eq!(reporter.len(), 1);
}

#[test]
fn dropping_pending_call_reports_nothing() {
    let reporter = CollectingReporter::new();
    let wrapped = wrap(
        "settle.never",
        || PendingOnceThenReady { pending: true },
        reporter.clone(),
    );

    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    let mut fut = Box::pin(wrapped.call(()));

    assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Pending));
    drop(fut);

    assert!(reporter.is_empty());
}

#[test]
#[should_panic(expected = "polled after completion")]
fn polling_after_completion_panics() {
    let reporter = CollectingReporter::new();
    let wrapped = wrap(
        "settle.twice",
        || PendingOnceThenReady { pending: false },
        reporter.clone(),
    );

    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    let mut fut = Box::pin(wrapped.call(()));

    assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Ready(Ok(7))));
    let _ = fut.as_mut().poll(&mut cx);
}

#[tokio::test(flavor = "current_thread")]
async fn resolved_value_passes_through_unchanged() {
    let reporter = CollectingReporter::new();
    let double = wrap(
        "double",
        |x: i64| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, Infallible>(x * 2)
        },
        reporter.clone(),
    );

    let value = double
        .call((21,))
        .await
        .expect("doubling cannot fail");
    assert_eq!(value, 42);
    assert_eq!(double.name(), "double");

    let reports = reporter.take();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.name, "double");
    assert_eq!(report.args, (21,));
    assert!(!report.invocation.application_error);
    assert!(
        report.invocation.duration() >= Duration::from_millis(100),
        "expected at least the target's own 100ms delay, measured {:?}",
        report.invocation.duration()
    );
}

#[tokio::test(flavor = "current_thread")]
async fn errors_propagate_unchanged() {
    let reporter = CollectingReporter::new();
    let failing = wrap(
        "fail",
        || async { Err::<(), String>("boom".to_string()) },
        reporter.clone(),
    );

    let err = failing.call(()).await.expect_err("target always fails");
    assert_eq!(err, "boom");

    let reports = reporter.take();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].name, "fail");
    assert!(reports[0].invocation.application_error);
}

#[tokio::test(flavor = "current_thread")]
async fn duration_excludes_time_before_first_poll() {
    let reporter = CollectingReporter::new();
    let quick = wrap(
        "quick",
        || async { Ok::<_, Infallible>(()) },
        reporter.clone(),
    );

    let fut = quick.call(());
    std::thread::sleep(Duration::from_millis(50));
    fut.await.expect("quick target cannot fail");

    let reports = reporter.take();
    assert_eq!(reports.len(), 1);
    assert!(
        reports[0].invocation.duration() < Duration::from_millis(50),
        "expected the pre-poll wait to be excluded, measured {:?}",
        reports[0].invocation.duration()
    );
}

#[tokio::test(flavor = "current_thread")]
async fn concurrent_calls_do_not_share_measurements() {
    let reporter = CollectingReporter::new();
    let nap = wrap(
        "nap",
        |label: &'static str, delay_ms: u64| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok::<_, Infallible>(label)
        },
        reporter.clone(),
    );

    let (slow, fast) = tokio::join!(nap.call(("slow", 80)), nap.call(("fast", 10)));
    assert_eq!(slow.expect("nap cannot fail"), "slow");
    assert_eq!(fast.expect("nap cannot fail"), "fast");

    let reports = reporter.take();
    assert_eq!(reports.len(), 2);
    let fast_report = reports
        .iter()
        .find(|report| report.args.0 == "fast")
        .expect("fast invocation should be reported");
    let slow_report = reports
        .iter()
        .find(|report| report.args.0 == "slow")
        .expect("slow invocation should be reported");

    assert_eq!(fast_report.args, ("fast", 10));
    assert_eq!(slow_report.args, ("slow", 80));
    assert!(fast_report.invocation.duration() >= Duration::from_millis(10));
    assert!(slow_report.invocation.duration() >= Duration::from_millis(80));
    assert!(
        fast_report.invocation.duration() <= slow_report.invocation.duration(),
        "expected each invocation to measure its own delay"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn arguments_forward_in_order() {
    let reporter = CollectingReporter::new();
    let concat = wrap(
        "concat",
        |a: String, b: u32, c: bool| async move { Ok::<_, Infallible>(format!("{a}-{b}-{c}")) },
        reporter.clone(),
    );

    let out = concat
        .call(("x".to_string(), 7, true))
        .await
        .expect("concat cannot fail");
    assert_eq!(out, "x-7-true");

    let reports = reporter.take();
    assert_eq!(reports[0].args, ("x".to_string(), 7, true));
}

#[tokio::test(flavor = "current_thread")]
async fn closure_reporter_receives_the_record() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let wrapped = wrap(
        "closure.report",
        |x: u8| async move { Ok::<_, Infallible>(x) },
        report_fn(move |name: &str, invocation: &Invocation, args: &(u8,)| {
            sink.lock().push((name.to_string(), invocation.clone(), *args));
        }),
    );

    let value = wrapped.call((9,)).await.expect("target cannot fail");
    assert_eq!(value, 9);

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "closure.report");
    assert!(!seen[0].1.application_error);
    assert_eq!(seen[0].2, (9,));
}

#[tokio::test(flavor = "current_thread")]
#[should_panic(expected = "reporter exploded")]
async fn reporter_panics_reach_the_caller() {
    let exploding = wrap(
        "explode",
        || async { Ok::<_, Infallible>(()) },
        report_fn(|_: &str, _: &Invocation, _: &()| panic!("reporter exploded")),
    );

    let _ = exploding.call(()).await;
}

#[tokio::test(flavor = "current_thread")]
async fn log_reporter_is_usable_as_handler() {
    let logged = wrap(
        "logged",
        |x: u8| async move { Ok::<_, Infallible>(x) },
        LogReporter,
    );

    let value = logged.call((3,)).await.expect("target cannot fail");
    assert_eq!(value, 3);
}
