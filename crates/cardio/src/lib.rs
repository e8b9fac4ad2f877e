//! Wall-clock instrumentation for asynchronous operations.
//!
//! Cardio wraps a named async operation and measures every invocation: how
//! long it ran (monotonic clock, suspension included) and whether it returned
//! an error. Each settled invocation produces exactly one [`Invocation`]
//! record, handed to a caller-supplied [`Reporter`] before the result reaches
//! the caller. The wrapped operation is otherwise untouched — same resolved
//! value, same error, same asynchronous shape.
//!
//! # Using this crate
//!
//! ```
//! use cardio::{CollectingReporter, wrap};
//!
//! # tokio::runtime::Builder::new_current_thread()
//! #     .enable_all()
//! #     .build()
//! #     .expect("failed to build tokio runtime")
//! #     .block_on(async {
//! let reporter = CollectingReporter::new();
//! let double = wrap(
//!     "double",
//!     |x: i64| async move { Ok::<_, std::convert::Infallible>(x * 2) },
//!     reporter.clone(),
//! );
//!
//! let value = double.call((21,)).await.expect("doubling cannot fail");
//! assert_eq!(value, 42);
//! assert_eq!(reporter.len(), 1);
//! # });
//! ```
//!
//! Arguments are passed as a tuple (`call(())`, `call((a,))`, `call((a, b))`,
//! …) and forwarded to the target verbatim; the reporter receives the same
//! tuple alongside the measurement. In production, report through
//! [`LogReporter`] (one structured `tracing` event per invocation) or any
//! [`Reporter`] of your own.
//!
//! # What is measured
//!
//! - **Duration**: from the moment the wrapped operation starts executing to
//!   the moment it settles, on a monotonic clock. Time spent suspended inside
//!   the operation counts; time spent before the call starts does not.
//! - **Outcome**: whether the operation returned `Err`. Nothing else — no
//!   aggregation, sampling, or retention happens here.

mod invocation;
mod report;
mod wrap;

pub use invocation::Invocation;
pub use report::{CollectingReporter, LogReporter, Report, ReportFn, Reporter, report_fn};
pub use wrap::{AsyncOp, Measured, Outcome, Wrapped, wrap};

#[cfg(test)]
mod tests;
