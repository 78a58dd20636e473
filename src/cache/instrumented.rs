//! Instrumented Cache Module
//!
//! A typed cache whose `store` calls are counted and recorded.

use super::typed::{StoreOperation, TypedCache};
use super::value::Value;
use crate::error::Result;
use crate::instrument::{CallHistory, CountCalls, Instrument, Operation};
use crate::replay::{replay, Transcript};
use crate::store::StoreHandle;

/// Identity under which `Cache::store` is recorded by default.
pub const STORE_IDENTITY: &str = "Cache.store";

type RecordedStore = CallHistory<CountCalls<StoreOperation>>;

// == Cache ==
/// Typed cache with call counting and history on `store`.
pub struct Cache {
    typed: TypedCache,
    store_op: RecordedStore,
}

impl Cache {
    /// Builds a cache recording `store` calls as [`STORE_IDENTITY`].
    pub fn new(store: StoreHandle) -> Self {
        Self::with_identity(store, STORE_IDENTITY)
    }

    /// Builds a cache recording `store` calls under `identity`.
    pub fn with_identity(store: StoreHandle, identity: impl Into<String>) -> Self {
        let typed = TypedCache::new(store.clone());
        let store_op = StoreOperation::new(typed.clone(), identity)
            .count_calls(store.clone())
            .call_history(store);
        Self { typed, store_op }
    }

    /// Flushes the store, then builds the cache, so counters start at zero.
    pub fn fresh(store: StoreHandle) -> Result<Self> {
        store.flush()?;
        Ok(Self::new(store))
    }

    pub fn store_identity(&self) -> &str {
        self.store_op.identity()
    }

    pub fn typed(&self) -> &TypedCache {
        &self.typed
    }

    /// Stores `value` under a new key, counting and recording the call.
    pub fn store(&self, value: impl Into<Value>) -> Result<String> {
        self.store_op.invoke((value.into(),))
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.typed.retrieve_raw(key)
    }

    pub fn get_str(&self, key: &str) -> Result<Option<String>> {
        self.typed.retrieve_as_text(key)
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.typed.retrieve_as_integer(key)
    }

    /// Transcript of every recorded `store` call.
    pub fn replay(&self) -> Result<Transcript> {
        replay(self.typed.store_handle().as_ref(), self.store_identity())
    }
}
