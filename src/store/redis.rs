//! Redis-backed store.
//!
//! Maps each store operation onto a single Redis command, so atomicity of
//! `increment` and `append` comes from the server.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{expiry_ms, KeyValueStore};
use crate::error::{CacheError, Result};

/// Store backed by a Redis server over one synchronous connection.
pub struct RedisStore {
    client: redis::Client,
    conn: Mutex<Option<redis::Connection>>,
}

impl RedisStore {
    /// Opens a client for `url` and checks the server is reachable.
    pub fn connect(url: &str) -> Result<Self> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::StoreUnavailable(e.to_string()))?;
        let conn = client
            .get_connection()
            .map_err(|e| CacheError::StoreUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Runs `cmd` on the shared connection, reconnecting once if it was lost.
    fn query<T: redis::FromRedisValue>(&self, key: &str, cmd: &redis::Cmd) -> Result<T> {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            debug!("reconnecting to redis");
            let conn = self
                .client
                .get_connection()
                .map_err(|e| CacheError::StoreUnavailable(e.to_string()))?;
            *guard = Some(conn);
        }

        let Some(conn) = guard.as_mut() else {
            return Err(CacheError::StoreUnavailable("no connection".to_string()));
        };
        match cmd.query(conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
                    warn!(error = %e, "redis connection lost");
                    *guard = None;
                }
                Err(map_redis_error(key, e))
            }
        }
    }
}

fn map_redis_error(key: &str, err: redis::RedisError) -> CacheError {
    if err.code() == Some("WRONGTYPE") {
        return CacheError::WrongType(key.to_string());
    }
    match err.kind() {
        redis::ErrorKind::ResponseError | redis::ErrorKind::TypeError => {
            CacheError::Decode(err.to_string())
        }
        _ => CacheError::StoreUnavailable(err.to_string()),
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.query(key, redis::cmd("GET").arg(key))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.query(key, redis::cmd("SET").arg(key).arg(value))
    }

    fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let ttl_ms = expiry_ms(key, ttl)?;
        self.query(
            key,
            redis::cmd("SET").arg(key).arg(value).arg("PX").arg(ttl_ms),
        )
    }

    fn increment(&self, key: &str) -> Result<i64> {
        self.query(key, redis::cmd("INCR").arg(key))
    }

    fn append(&self, list_key: &str, value: &[u8]) -> Result<usize> {
        self.query(list_key, redis::cmd("RPUSH").arg(list_key).arg(value))
    }

    fn range(&self, list_key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>> {
        self.query(
            list_key,
            redis::cmd("LRANGE").arg(list_key).arg(start).arg(end),
        )
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.query(key, redis::cmd("EXISTS").arg(key))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let removed: i64 = self.query(key, redis::cmd("DEL").arg(key))?;
        Ok(removed > 0)
    }

    fn flush(&self) -> Result<()> {
        self.query("*", &redis::cmd("FLUSHDB"))
    }
}
