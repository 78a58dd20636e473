//! Call counting.

use tracing::debug;

use super::Operation;
use crate::error::Result;
use crate::keys::counter_key;
use crate::store::StoreHandle;

/// Increments the operation's call counter before every call.
///
/// Failed calls are counted too: the counter reflects attempts. Wrapping an
/// operation that already counts is a no-op.
pub struct CountCalls<O> {
    inner: O,
    store: StoreHandle,
    active: bool,
}

impl<O: Operation> CountCalls<O> {
    pub fn new(inner: O, store: StoreHandle) -> Self {
        let active = !inner.counts_calls();
        if !active {
            debug!(identity = inner.identity(), "calls already counted");
        }
        Self {
            inner,
            store,
            active,
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: Operation> Operation for CountCalls<O> {
    type Args = O::Args;
    type Output = O::Output;

    fn identity(&self) -> &str {
        self.inner.identity()
    }

    fn invoke(&self, args: Self::Args) -> Result<Self::Output> {
        if self.active {
            self.store.increment(&counter_key(self.identity()))?;
        }
        self.inner.invoke(args)
    }

    fn counts_calls(&self) -> bool {
        true
    }

    fn records_history(&self) -> bool {
        self.inner.records_history()
    }
}
