//! Call history recording.

use tracing::{debug, warn};

use super::{CallArgs, Operation};
use crate::error::Result;
use crate::keys::{inputs_key, outputs_key};
use crate::store::StoreHandle;

/// Appends each call's rendered arguments to `<identity>:inputs` and, once
/// the call succeeds, its rendered result to `<identity>:outputs`.
///
/// A failed call leaves its input without an output. Replay reports the
/// resulting length mismatch instead of pairing past it.
pub struct CallHistory<O> {
    inner: O,
    store: StoreHandle,
    active: bool,
}

impl<O: Operation> CallHistory<O> {
    pub fn new(inner: O, store: StoreHandle) -> Self {
        let active = !inner.records_history();
        if !active {
            debug!(identity = inner.identity(), "history already recorded");
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

impl<O: Operation> Operation for CallHistory<O> {
    type Args = O::Args;
    type Output = O::Output;

    fn identity(&self) -> &str {
        self.inner.identity()
    }

    fn invoke(&self, args: Self::Args) -> Result<Self::Output> {
        if !self.active {
            return self.inner.invoke(args);
        }

        let identity = self.identity();
        self.store
            .append(&inputs_key(identity), args.render().as_bytes())?;

        match self.inner.invoke(args) {
            Ok(output) => {
                self.store
                    .append(&outputs_key(identity), output.to_string().as_bytes())?;
                Ok(output)
            }
            Err(err) => {
                warn!(identity = identity, error = %err, "call failed, no output recorded");
                Err(err)
            }
        }
    }

    fn counts_calls(&self) -> bool {
        self.inner.counts_calls()
    }

    fn records_history(&self) -> bool {
        true
    }
}
