//! # Troupe
//!
//! Troupe is an off-thread actor-container pool: it instantiates objects
//! ("actors") inside isolated execution contexts and lets you interact with
//! them as if they were local, with every method call transparently becoming
//! an asynchronous remote call.
//!
//! ## Core Pieces
//!
//! * `RoundRobinPool`: a fixed-capacity, lazily-populated pool of containers
//!   that assigns spawns round-robin by slot index
//! * `Container`: one isolated execution context (a dedicated worker thread
//!   by default) hosting zero or more actors
//! * `ActorHandle`: the local stand-in for a remote actor instance
//! * `ActorRegistry`: the shared registry of constructible actor types both
//!   sides resolve definition names against
//! * `wire`: the serialization contract deciding what is copied by value and
//!   what crosses the boundary as a live proxy
//!
//! ## Example
//!
//! ```rust,no_run
//! use troupe::{
//!     Actor, ActorArgs, ActorError, ActorRegistry, PoolOptions, ReturnValue, RoundRobinPool,
//! };
//!
//! struct Counter {
//!     count: u64,
//! }
//!
//! impl Actor for Counter {
//!     fn construct(args: ActorArgs) -> Result<Self, ActorError> {
//!         Ok(Self { count: args.get(0)? })
//!     }
//!
//!     fn dispatch(&mut self, method: &str, args: ActorArgs) -> Result<ReturnValue, ActorError> {
//!         match method {
//!             "add" => {
//!                 self.count += args.get::<u64>(0)?;
//!                 ReturnValue::value(&self.count)
//!             }
//!             "count" => ReturnValue::value(&self.count),
//!             other => Err(ActorError::MethodNotFound(other.to_string())),
//!         }
//!     }
//! }
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = ActorRegistry::global();
//! registry.register::<Counter>("counter");
//!
//! let pool = RoundRobinPool::new(PoolOptions::with_capacity(2));
//! let counter = pool.spawn("counter", vec![troupe::CallArg::value(&0u64)?]).await?;
//!
//! let count: u64 = counter.call("add", 5u64).await?;
//! assert_eq!(count, 5);
//!
//! pool.terminate_all().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Isolation Model
//!
//! Each container is a separately scheduled unit of execution. A blocked or
//! unresponsive actor stalls only its own container; the only recovery the
//! pool offers is terminating the container outright, which releases every
//! pending call with [`ActorError::ContainerTerminated`] rather than waiting
//! on the actor to cooperate.

pub mod config;
pub mod container;
pub mod errors;
pub mod global;
pub mod handle;
pub mod id;
pub mod logging;
pub mod messages;
pub mod pool;
pub mod registry;
pub mod wire;

pub use config::PoolSettings;
pub use container::{Container, ContainerFactory, ExecutionHandle, ThreadContainerFactory};
pub use errors::{ActorError, PoolError, SpawnError};
pub use global::{default_pool, reset_default_pool, set_default_pool, spawn};
pub use handle::{ActorHandle, Returned, ReturnedCallback};
pub use id::{ActorId, CallbackId};
pub use pool::{PoolOptions, RoundRobinPool};
pub use registry::{Actor, ActorArgs, ActorRegistry, RemoteCallback};
pub use wire::{CallArg, CallbackFn, EventSummary, ReturnValue, WireValue};
