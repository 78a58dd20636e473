//! Replay Module
//!
//! Rebuilds an operation's call history from its counter and call logs.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::cache::decode_integer;
use crate::error::Result;
use crate::keys::{counter_key, inputs_key, outputs_key};
use crate::store::KeyValueStore;

/// One recorded call: its rendered arguments and rendered result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub input: String,
    pub output: String,
}

/// The call logs of an operation have different lengths.
///
/// Happens when a recorded call failed, or when concurrent callers
/// interleaved their appends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityWarning {
    pub inputs: usize,
    pub outputs: usize,
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inputs but {} outputs recorded; only the first {} calls are paired",
            self.inputs,
            self.outputs,
            self.inputs.min(self.outputs)
        )
    }
}

// == Transcript ==
/// Ordered, read-only view of an operation's recorded calls.
///
/// Displays as:
///
/// ```text
/// store was called 2 times:
/// store(*('a',)) -> 1f0c...
/// store(*('b',)) -> 9e2d...
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub identity: String,
    pub count: u64,
    pub calls: Vec<CallRecord>,
    pub warning: Option<IntegrityWarning>,
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} was called {} times:", self.identity, self.count)?;
        for call in &self.calls {
            write!(f, "\n{}(*{}) -> {}", self.identity, call.input, call.output)?;
        }
        Ok(())
    }
}

// == Replay ==
/// Reads the counter and call logs recorded for `identity`.
///
/// Never writes to the store. Mismatched log lengths are reported on the
/// transcript and logged, and only the common prefix is paired.
pub fn replay(store: &dyn KeyValueStore, identity: &str) -> Result<Transcript> {
    let count = match store.peek(&counter_key(identity))? {
        Some(bytes) => decode_integer(bytes)?.max(0) as u64,
        None => 0,
    };

    let inputs = store.range(&inputs_key(identity), 0, -1)?;
    let outputs = store.range(&outputs_key(identity), 0, -1)?;

    let warning = if inputs.len() != outputs.len() {
        let warning = IntegrityWarning {
            inputs: inputs.len(),
            outputs: outputs.len(),
        };
        warn!(identity = identity, "{}", warning);
        Some(warning)
    } else {
        None
    };

    let calls = inputs
        .iter()
        .zip(outputs.iter())
        .map(|(input, output)| CallRecord {
            input: String::from_utf8_lossy(input).into_owned(),
            output: String::from_utf8_lossy(output).into_owned(),
        })
        .collect();

    Ok(Transcript {
        identity: identity.to_string(),
        count,
        calls,
        warning,
    })
}
