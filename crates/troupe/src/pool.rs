//! # Round-Robin Pool
//!
//! The fixed-capacity, lazily-populated pool of containers. Spawns are
//! assigned to slots in pure round-robin order by index, never by load: a
//! slow or blocked actor does not exclude its slot from future assignments.
//! The pool provides isolation between containers, not work stealing.
//!
//! Each slot is a single-flight initialization cell: concurrent first
//! touches of an empty slot await one container construction, and a failed
//! construction leaves the slot empty for a later attempt. Termination is
//! terminal; a terminated pool never spawns again and never resurrects a
//! slot.

use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::container::{Container, ContainerFactory, ThreadContainerFactory};
use crate::errors::{PoolError, SpawnError};
use crate::handle::ActorHandle;
use crate::registry::ActorRegistry;
use crate::wire::CallArg;

/// Default thread-name prefix for containers created by the default factory.
pub const DEFAULT_LOCATOR: &str = "troupe-container";

/// Configuration of a [`RoundRobinPool`].
pub struct PoolOptions {
    /// Maximum number of containers the pool may create. Fixed at
    /// construction; values below 1 are clamped to 1.
    pub capacity: usize,
    /// Passed through to the factory; the default factory uses it as the
    /// container thread-name prefix.
    pub locator: String,
    /// Creates isolated execution contexts.
    pub factory: Arc<dyn ContainerFactory>,
    /// Registry both sides resolve actor definitions against.
    pub registry: Arc<ActorRegistry>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            capacity: 1,
            locator: DEFAULT_LOCATOR.to_string(),
            factory: Arc::new(ThreadContainerFactory::default()),
            registry: ActorRegistry::global(),
        }
    }
}

impl PoolOptions {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }
}

type Slot = Arc<OnceCell<Container>>;

struct PoolState {
    slots: Vec<Slot>,
    cursor: usize,
    terminated: bool,
}

/// The fixed-capacity round-robin container pool.
pub struct RoundRobinPool {
    capacity: usize,
    locator: String,
    factory: Arc<dyn ContainerFactory>,
    registry: Arc<ActorRegistry>,
    state: Mutex<PoolState>,
}

impl RoundRobinPool {
    pub fn new(options: PoolOptions) -> Self {
        let capacity = if options.capacity == 0 {
            warn!("Pool capacity 0 requested, clamping to 1");
            1
        } else {
            options.capacity
        };

        let slots = (0..capacity).map(|_| Slot::default()).collect();
        Self {
            capacity,
            locator: options.locator,
            factory: options.factory,
            registry: options.registry,
            state: Mutex::new(PoolState {
                slots,
                cursor: 0,
                terminated: false,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True iff [`RoundRobinPool::terminate_all`] has completed.
    pub fn is_terminated(&self) -> bool {
        self.state.lock().unwrap().terminated
    }

    /// Instantiates a registered actor definition in the next container of
    /// the rotation, lazily starting that container first if needed.
    pub async fn spawn(
        &self,
        definition: &str,
        ctor_args: Vec<CallArg>,
    ) -> Result<ActorHandle, SpawnError> {
        let (slot, index) = self.next_slot()?;

        let container = slot
            .get_or_try_init(|| {
                debug!("Lazily starting container for slot {}", index);
                Container::start(
                    self.factory.clone(),
                    &self.locator,
                    index,
                    self.registry.clone(),
                )
            })
            .await?;

        // A terminate_all racing the lazy start above must still win: never
        // hand out an actor in a container the pool no longer owns.
        if self.is_terminated() {
            container.terminate();
            return Err(PoolError::Terminated.into());
        }

        Ok(container.spawn(definition, ctor_args).await?)
    }

    /// Picks the slot for this spawn and advances the rotation. The cursor
    /// advances whether or not the spawn then succeeds, so failures do not
    /// skew the rotation.
    fn next_slot(&self) -> Result<(Slot, usize), PoolError> {
        let mut state = self.state.lock().unwrap();
        if state.terminated {
            return Err(PoolError::Terminated);
        }

        let index = state.cursor;
        state.cursor = (state.cursor + 1) % self.capacity;

        match state.slots.get(index) {
            Some(slot) => Ok((slot.clone(), index)),
            None => Err(PoolError::SlotUnavailable {
                index,
                capacity: self.capacity,
            }),
        }
    }

    /// Terminates every started container, clears the slots, and flips the
    /// pool into its terminal state. Idempotent; a pool with no started
    /// containers terminates trivially.
    pub async fn terminate_all(&self) {
        let slots = {
            let mut state = self.state.lock().unwrap();
            if state.terminated {
                return;
            }
            state.terminated = true;
            std::mem::take(&mut state.slots)
        };

        let mut terminated = 0usize;
        for slot in &slots {
            if let Some(container) = slot.get() {
                container.terminate();
                terminated += 1;
            }
        }
        info!("Pool terminated ({} containers stopped)", terminated);
    }
}

impl std::fmt::Debug for RoundRobinPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("RoundRobinPool")
            .field("capacity", &self.capacity)
            .field("cursor", &state.cursor)
            .field("terminated", &state.terminated)
            .finish()
    }
}
