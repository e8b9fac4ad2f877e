//! The instrumentation wrapper: [`wrap`], [`Wrapped`], and the [`Measured`] future.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use crate::invocation::Invocation;
use crate::report::Reporter;

// ── Async target abstraction ─────────────────────────────

/// An asynchronous operation callable with the argument tuple `Args`.
///
/// Implemented for plain async functions and closures of arity 0 through 8;
/// `Args` is the corresponding parameter tuple, so `Fn(A, B) -> Fut` is an
/// `AsyncOp<(A, B)>`.
pub trait AsyncOp<Args> {
    /// What one invocation resolves to.
    type Output;
    /// The in-flight form of one invocation.
    type Future: Future<Output = Self::Output>;

    /// Starts one invocation with `args`.
    fn invoke(&self, args: Args) -> Self::Future;
}

macro_rules! impl_async_op {
    ($($arg:ident),*) => {
        impl<Func, Fut, $($arg,)*> AsyncOp<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Fut,
            Fut: Future,
        {
            type Output = Fut::Output;
            type Future = Fut;

            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Fut {
                (self)($($arg),*)
            }
        }
    };
}

impl_async_op!();
impl_async_op!(A1);
impl_async_op!(A1, A2);
impl_async_op!(A1, A2, A3);
impl_async_op!(A1, A2, A3, A4);
impl_async_op!(A1, A2, A3, A4, A5);
impl_async_op!(A1, A2, A3, A4, A5, A6);
impl_async_op!(A1, A2, A3, A4, A5, A6, A7);
impl_async_op!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Settled outcomes that classify as success or application error.
pub trait Outcome {
    /// True if this outcome counts as a failure of the operation.
    fn is_application_error(&self) -> bool;
}

impl<T, E> Outcome for Result<T, E> {
    fn is_application_error(&self) -> bool {
        self.is_err()
    }
}

// ── Wrapper ──────────────────────────────────────────────

/// A named async operation with timing and outcome instrumentation attached.
///
/// Produced by [`wrap`]. Behaviorally transparent to the target's caller:
/// same resolved value, same error, same asynchronous shape, plus exactly one
/// [`Reporter::report`] per settled invocation.
pub struct Wrapped<T, R> {
    name: String,
    target: T,
    reporter: R,
}

/// Wraps `target` so every invocation is measured and reported to `reporter`
/// under `name`.
///
/// The name is opaque to the wrapper and passed through to reports
/// unmodified. Overlapping invocations never interfere: all timing state is
/// local to each returned [`Measured`] future.
pub fn wrap<T, R>(name: impl Into<String>, target: T, reporter: R) -> Wrapped<T, R> {
    Wrapped {
        name: name.into(),
        target,
        reporter,
    }
}

impl<T, R> Wrapped<T, R> {
    /// The operation name given to [`wrap`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the wrapped operation with the argument tuple `args`.
    ///
    /// The tuple is cloned once up front: the target consumes the original
    /// and the reporter later receives the clone. Timing starts when the
    /// returned future is first polled and stops when the target settles, so
    /// the measurement covers exactly the target's own execution, suspension
    /// included.
    pub fn call<Args>(&self, args: Args) -> Measured<'_, T::Future, R, Args>
    where
        T: AsyncOp<Args>,
        Args: Clone,
    {
        let reported = args.clone();
        Measured {
            name: &self.name,
            reporter: &self.reporter,
            args: Some(reported),
            started: None,
            future: self.target.invoke(args),
        }
    }
}

// ── Measured future ──────────────────────────────────────

/// One in-flight wrapped invocation.
///
/// Polls the target through transparently. At settlement it builds the
/// [`Invocation`] record, reports it, and yields the target's untouched
/// result. Dropped while pending, it reports nothing: the invocation never
/// settled.
pub struct Measured<'a, F, R, Args> {
    name: &'a str,
    reporter: &'a R,
    args: Option<Args>,
    started: Option<Instant>,
    future: F,
}

impl<F, R, Args> Future for Measured<'_, F, R, Args>
where
    F: Future,
    F::Output: Outcome,
    R: Reporter<Args>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // SAFETY: we never move `future` after pinning `Self`.
        #[allow(unsafe_code)]
        let this = unsafe { self.get_unchecked_mut() };
        let started = *this.started.get_or_insert_with(Instant::now);
        #[allow(unsafe_code)]
        let future = unsafe { Pin::new_unchecked(&mut this.future) };
        let result = match future.poll(cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };
        let invocation =
            Invocation::from_elapsed(started.elapsed(), result.is_application_error());
        let args = this
            .args
            .take()
            .expect("measured invocation polled after completion");
        this.reporter.report(this.name, &invocation, &args);
        Poll::Ready(result)
    }
}
