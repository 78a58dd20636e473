//! Typed Cache Module
//!
//! Stores scalars under generated keys and decodes them on the way out.

use tracing::debug;
use uuid::Uuid;

use super::value::{decode_float, decode_integer, decode_text, Value};
use crate::error::Result;
use crate::instrument::Operation;
use crate::store::StoreHandle;

// == Typed Cache ==
/// Store/retrieve contract over a key-value store.
#[derive(Clone)]
pub struct TypedCache {
    store: StoreHandle,
}

impl TypedCache {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// The store this cache writes to.
    pub fn store_handle(&self) -> &StoreHandle {
        &self.store
    }

    // == Store ==
    /// Writes `value` under a fresh random key and returns the key.
    pub fn store(&self, value: impl Into<Value>) -> Result<String> {
        let value = value.into();
        let key = Uuid::new_v4().to_string();
        self.store.set(&key, &value.to_bytes())?;
        debug!(key = %key, "stored value");
        Ok(key)
    }

    // == Retrieve ==
    /// Reads the raw bytes at `key`, `None` if absent.
    pub fn retrieve_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(key)
    }

    /// Reads `key` and converts it with `decode`.
    ///
    /// An absent key is `Ok(None)`; a decode failure is returned as is.
    pub fn retrieve<T, F>(&self, key: &str, decode: F) -> Result<Option<T>>
    where
        F: FnOnce(Vec<u8>) -> Result<T>,
    {
        self.store.get(key)?.map(decode).transpose()
    }

    pub fn retrieve_as_text(&self, key: &str) -> Result<Option<String>> {
        self.retrieve(key, decode_text)
    }

    pub fn retrieve_as_integer(&self, key: &str) -> Result<Option<i64>> {
        self.retrieve(key, decode_integer)
    }

    pub fn retrieve_as_float(&self, key: &str) -> Result<Option<f64>> {
        self.retrieve(key, decode_float)
    }
}

// == Store Operation ==
/// `TypedCache::store` as an instrumentable operation.
#[derive(Clone)]
pub struct StoreOperation {
    cache: TypedCache,
    identity: String,
}

impl StoreOperation {
    pub fn new(cache: TypedCache, identity: impl Into<String>) -> Self {
        Self {
            cache,
            identity: identity.into(),
        }
    }
}

impl Operation for StoreOperation {
    type Args = (Value,);
    type Output = String;

    fn identity(&self) -> &str {
        &self.identity
    }

    fn invoke(&self, (value,): (Value,)) -> Result<String> {
        self.cache.store(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::CacheError;
    use crate::store::{KeyValueStore, MemoryStore};

    fn typed() -> TypedCache {
        TypedCache::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_store_returns_distinct_uuid_keys() {
        let cache = typed();
        let a = cache.store("x").unwrap();
        let b = cache.store("x").unwrap();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_round_trip_each_type() {
        let cache = typed();

        let key = cache.store("hello").unwrap();
        assert_eq!(cache.retrieve_as_text(&key).unwrap().as_deref(), Some("hello"));

        let key = cache.store(b"\x00\x01".as_slice()).unwrap();
        assert_eq!(cache.retrieve_raw(&key).unwrap(), Some(vec![0u8, 1]));

        let key = cache.store(123i64).unwrap();
        assert_eq!(cache.retrieve_as_integer(&key).unwrap(), Some(123));

        let key = cache.store(2.5f64).unwrap();
        assert_eq!(cache.retrieve_as_float(&key).unwrap(), Some(2.5));
    }

    #[test]
    fn test_absent_key_is_none() {
        let cache = typed();
        assert_eq!(cache.retrieve_raw("never-written").unwrap(), None);
        assert_eq!(cache.retrieve_as_integer("never-written").unwrap(), None);
    }

    #[test]
    fn test_retrieve_with_custom_decode() {
        let cache = typed();
        let key = cache.store("a,b,c").unwrap();

        let parts = cache
            .retrieve(&key, |bytes| {
                Ok(String::from_utf8_lossy(&bytes)
                    .split(',')
                    .map(str::to_string)
                    .collect::<Vec<_>>())
            })
            .unwrap();
        assert_eq!(parts, Some(vec!["a".into(), "b".into(), "c".into()]));
    }

    #[test]
    fn test_decode_failure_propagates() {
        let cache = typed();
        let key = cache.store("not a number").unwrap();
        assert!(matches!(
            cache.retrieve_as_integer(&key),
            Err(CacheError::Decode(_))
        ));
    }

    #[test]
    fn test_store_operation_writes_through() {
        let store = Arc::new(MemoryStore::new());
        let op = StoreOperation::new(TypedCache::new(store.clone()), "store");

        let key = op.invoke((Value::from("v"),)).unwrap();
        assert_eq!(op.identity(), "store");
        assert_eq!(store.get(&key).unwrap(), Some(b"v".to_vec()));
    }
}
