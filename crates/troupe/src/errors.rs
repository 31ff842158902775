//! # Error Types
//!
//! The error taxonomy of the pool and the remote-actor protocol. Pool-level
//! failures (`PoolError`) and actor/container-level failures (`ActorError`)
//! are kept separate; `SpawnError` joins them at the one seam where a single
//! operation can fail either way.

use thiserror::Error;

use crate::id::ActorId;

/// Failures of the pool itself, independent of any container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has been terminated; it never recovers and no slot is
    /// resurrected.
    #[error("pool has been terminated")]
    Terminated,

    /// The rotation produced a slot index outside the slot array. Unreachable
    /// under correct modulo arithmetic, but checked rather than left to
    /// index-out-of-bounds behavior.
    #[error("slot {index} unavailable (capacity {capacity})")]
    SlotUnavailable { index: usize, capacity: usize },
}

/// Failures of a container or of an actor living inside one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// The definition name is not present in the registry on the container
    /// side.
    #[error("no actor registered under definition '{0}'")]
    UnknownDefinition(String),

    /// The registered constructor failed. The container remains usable.
    #[error("actor instantiation failed: {0}")]
    Instantiation(String),

    /// The actor does not dispatch the requested method name.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// No actor with this id lives in the target container.
    #[error("no actor with id {0} in this container")]
    ActorNotFound(ActorId),

    /// An argument or result could not be marshaled across the boundary.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The owning container was terminated; the call was released rather
    /// than left pending.
    #[error("container has been terminated")]
    ContainerTerminated,

    /// A reply channel was dropped without a response.
    #[error("operation channel closed")]
    ChannelClosed,

    /// A proxied callback invocation failed on the origin side.
    #[error("callback invocation failed: {0}")]
    Callback(String),
}

/// Error surface of a pool-level spawn, which can fail in the pool, in the
/// container factory, or in the remote instantiation.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Actor(#[from] ActorError),

    #[error("failed to start container: {0}")]
    ContainerStart(String),
}
