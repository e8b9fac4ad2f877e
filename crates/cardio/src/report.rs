//! Reporting handlers: the [`Reporter`] capability and its stock implementations.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::invocation::Invocation;

/// Per-invocation reporting capability.
///
/// `Args` is the argument tuple of the wrapped operation, so reports stay
/// typed end to end.
pub trait Reporter<Args> {
    /// Receives one settled invocation: the operation name, its measurement,
    /// and the argument tuple the call was made with.
    ///
    /// Runs synchronously on the invoking task, exactly once per settled
    /// invocation, after the wrapped operation settles and before its result
    /// is yielded. The return value cannot affect control flow. If this
    /// panics, the panic propagates to the wrapped call's caller;
    /// observability failures are not swallowed.
    fn report(&self, name: &str, invocation: &Invocation, args: &Args);
}

// ── Closure adapter ──────────────────────────────────────

/// Adapts a plain closure into a [`Reporter`]. Built with [`report_fn`].
pub struct ReportFn<F> {
    f: F,
}

/// Wraps `f` so it can be used wherever a [`Reporter`] is expected.
///
/// The raw-callback form of the API:
///
/// ```
/// use cardio::{Invocation, report_fn};
///
/// let reporter = report_fn(|name: &str, invocation: &Invocation, _args: &(u32,)| {
///     eprintln!("{name}: {:.3}ms", invocation.duration_ms());
/// });
/// # let _ = reporter;
/// ```
pub fn report_fn<F>(f: F) -> ReportFn<F> {
    ReportFn { f }
}

impl<Args, F> Reporter<Args> for ReportFn<F>
where
    F: Fn(&str, &Invocation, &Args),
{
    fn report(&self, name: &str, invocation: &Invocation, args: &Args) {
        (self.f)(name, invocation, args)
    }
}

// ── Logging reporter ─────────────────────────────────────

/// Reporter that emits one structured `tracing` event per invocation.
///
/// Successful invocations log at `info`, failed ones at `warn`; both carry
/// the operation name, the measured duration in milliseconds, and the
/// argument tuple in its `Debug` form.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl<Args: fmt::Debug> Reporter<Args> for LogReporter {
    fn report(&self, name: &str, invocation: &Invocation, args: &Args) {
        if invocation.application_error {
            tracing::warn!(
                op = name,
                duration_ms = invocation.duration_ms(),
                ?args,
                "wrapped operation failed"
            );
        } else {
            tracing::info!(
                op = name,
                duration_ms = invocation.duration_ms(),
                ?args,
                "wrapped operation completed"
            );
        }
    }
}

// ── Collecting reporter ──────────────────────────────────

/// One collected report: what a [`CollectingReporter`] stores per invocation.
#[derive(Clone, Debug)]
pub struct Report<Args> {
    /// Operation name the report was filed under.
    pub name: String,
    /// The per-invocation measurement.
    pub invocation: Invocation,
    /// Argument tuple of the invocation.
    pub args: Args,
}

/// In-memory reporter: stores every report in a shared buffer.
///
/// Clones share the same buffer, so a wrapped operation can own one handle
/// while a test keeps another for assertions.
pub struct CollectingReporter<Args> {
    reports: Arc<Mutex<Vec<Report<Args>>>>,
}

impl<Args> CollectingReporter<Args> {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of reports collected so far.
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// True if nothing has been reported yet.
    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }

    /// Drains and returns every collected report, oldest first.
    pub fn take(&self) -> Vec<Report<Args>> {
        std::mem::take(&mut *self.reports.lock())
    }
}

impl<Args> Clone for CollectingReporter<Args> {
    fn clone(&self) -> Self {
        Self {
            reports: Arc::clone(&self.reports),
        }
    }
}

impl<Args> Default for CollectingReporter<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone> Reporter<Args> for CollectingReporter<Args> {
    fn report(&self, name: &str, invocation: &Invocation, args: &Args) {
        self.reports.lock().push(Report {
            name: name.to_string(),
            invocation: invocation.clone(),
            args: args.clone(),
        });
    }
}
