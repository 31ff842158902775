//! # Default Strategy
//!
//! A process-wide, lazily constructed capacity-1 pool backing the free
//! [`spawn`] function, for callers who do not need custom pooling. The
//! default pool resolves definitions against the global registry. It can be
//! replaced or cleared, which is how tests substitute their own pool;
//! explicit lifecycle management is otherwise not required.

use lazy_static::lazy_static;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::errors::SpawnError;
use crate::handle::ActorHandle;
use crate::pool::{PoolOptions, RoundRobinPool};
use crate::wire::CallArg;

lazy_static! {
    static ref DEFAULT_POOL: RwLock<Option<Arc<RoundRobinPool>>> = RwLock::new(None);
}

/// The process-wide default pool, constructed on first use.
pub fn default_pool() -> Arc<RoundRobinPool> {
    if let Some(pool) = DEFAULT_POOL.read().unwrap().as_ref() {
        return pool.clone();
    }

    let mut slot = DEFAULT_POOL.write().unwrap();
    // Another caller may have won the race between the read and the write.
    if let Some(pool) = slot.as_ref() {
        return pool.clone();
    }

    debug!("Constructing the default pool");
    let pool = Arc::new(RoundRobinPool::new(PoolOptions::default()));
    *slot = Some(pool.clone());
    pool
}

/// Replaces the default pool, returning the previous one if it existed. The
/// previous pool is not terminated; that remains the caller's decision.
pub fn set_default_pool(pool: Arc<RoundRobinPool>) -> Option<Arc<RoundRobinPool>> {
    DEFAULT_POOL.write().unwrap().replace(pool)
}

/// Clears the default pool so the next [`spawn`] constructs a fresh one.
/// Returns the pool that was cleared, if any.
pub fn reset_default_pool() -> Option<Arc<RoundRobinPool>> {
    DEFAULT_POOL.write().unwrap().take()
}

/// Spawns an actor on the default pool.
pub async fn spawn(definition: &str, ctor_args: Vec<CallArg>) -> Result<ActorHandle, SpawnError> {
    default_pool().spawn(definition, ctor_args).await
}
