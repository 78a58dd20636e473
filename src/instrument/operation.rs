//! The operation abstraction the instrumentation wrappers compose around.

use std::fmt;
use std::marker::PhantomData;

use super::{CallArgs, CallHistory, CountCalls};
use crate::error::Result;
use crate::store::StoreHandle;

// == Operation ==
/// A named, synchronous call that can be instrumented.
///
/// The identity is the stable name under which counters and call logs are
/// kept, so two operations sharing an identity share their records.
pub trait Operation {
    type Args: CallArgs;
    type Output: fmt::Display;

    fn identity(&self) -> &str;

    fn invoke(&self, args: Self::Args) -> Result<Self::Output>;

    /// Whether this operation (or a layer beneath it) already counts calls.
    fn counts_calls(&self) -> bool {
        false
    }

    /// Whether this operation (or a layer beneath it) already records history.
    fn records_history(&self) -> bool {
        false
    }
}

// == Instrument ==
/// Chaining helpers for wrapping any operation.
///
/// ```ignore
/// let op = operation("double", |(n,): (i64,)| Ok(n * 2))
///     .count_calls(store.clone())
///     .call_history(store.clone());
/// ```
pub trait Instrument: Operation + Sized {
    fn count_calls(self, store: StoreHandle) -> CountCalls<Self> {
        CountCalls::new(self, store)
    }

    fn call_history(self, store: StoreHandle) -> CallHistory<Self> {
        CallHistory::new(self, store)
    }
}

impl<O: Operation> Instrument for O {}

// == Fn Operation ==
/// An operation backed by a closure.
pub struct FnOperation<F, A, R> {
    identity: String,
    f: F,
    _marker: PhantomData<fn(A) -> R>,
}

/// Wraps `f` as an operation named `identity`.
pub fn operation<F, A, R>(identity: impl Into<String>, f: F) -> FnOperation<F, A, R>
where
    F: Fn(A) -> Result<R>,
    A: CallArgs,
    R: fmt::Display,
{
    FnOperation {
        identity: identity.into(),
        f,
        _marker: PhantomData,
    }
}

impl<F, A, R> Operation for FnOperation<F, A, R>
where
    F: Fn(A) -> Result<R>,
    A: CallArgs,
    R: fmt::Display,
{
    type Args = A;
    type Output = R;

    fn identity(&self) -> &str {
        &self.identity
    }

    fn invoke(&self, args: A) -> Result<R> {
        (self.f)(args)
    }
}

impl<F, A, R> fmt::Debug for FnOperation<F, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperation")
            .field("identity", &self.identity)
            .finish()
    }
}
