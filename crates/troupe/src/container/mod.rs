//! # Container
//!
//! The caller side of one isolated execution context. A container is created
//! at most once per pool slot, hosts zero or more actors, and is reachable
//! only through its request endpoint. It also services callback invocations
//! coming back out of the context, running the registered origin-side
//! closures and replying with their results.
//!
//! Termination is deliberately coarse: it cancels the container token and
//! abandons the execution context without draining or signaling in-flight
//! work, so an unresponsive actor can always be forcibly reclaimed. Calls
//! pending at that moment are released with
//! [`ActorError::ContainerTerminated`] rather than left hanging.

mod factory;
mod host;

pub use factory::{ContainerFactory, ExecutionHandle, ThreadContainerFactory, DEFAULT_CHANNEL_DEPTH};

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{ActorError, SpawnError};
use crate::handle::ActorHandle;
use crate::messages::{CallbackMessage, HostRequest};
use crate::registry::ActorRegistry;
use crate::wire::{marshal_args, CallArg, CallbackTable};

/// One isolated execution context, as seen by its owning pool.
pub struct Container {
    slot_index: usize,
    execution: ExecutionHandle,
    callbacks: CallbackTable,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("slot_index", &self.slot_index)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl Container {
    /// Creates the execution context through the factory and wires up the
    /// origin-side callback service. One-shot: a container that fails to
    /// start is never retried on the same value.
    pub async fn start(
        factory: Arc<dyn ContainerFactory>,
        locator: &str,
        slot_index: usize,
        registry: Arc<ActorRegistry>,
    ) -> Result<Self, SpawnError> {
        let mut execution = factory
            .create(locator, slot_index, registry)
            .await
            .map_err(|e| SpawnError::ContainerStart(e.to_string()))?;

        let invoke_rx = execution
            .invoke_rx
            .take()
            .ok_or_else(|| SpawnError::ContainerStart("factory returned no callback channel".to_string()))?;

        let callbacks: CallbackTable = Default::default();
        tokio::spawn(service_callbacks(
            invoke_rx,
            callbacks.clone(),
            execution.cancel.clone(),
        ));

        info!("Container started in slot {}", slot_index);
        Ok(Self {
            slot_index,
            execution,
            callbacks,
        })
    }

    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    pub fn is_terminated(&self) -> bool {
        self.execution.cancel.is_cancelled()
    }

    /// Instantiates a registered actor definition inside this container and
    /// returns a handle to it. Instantiation failures are propagated from
    /// the container side and leave the container usable.
    pub async fn spawn(
        &self,
        definition: &str,
        ctor_args: Vec<CallArg>,
    ) -> Result<ActorHandle, ActorError> {
        if self.is_terminated() {
            return Err(ActorError::ContainerTerminated);
        }

        let args = marshal_args(ctor_args, &self.callbacks);
        let (response_tx, response_rx) = oneshot::channel();
        self.execution
            .request_tx
            .send(HostRequest::Spawn {
                definition: definition.to_string(),
                args,
                response_tx,
            })
            .await
            .map_err(|_| ActorError::ContainerTerminated)?;

        let actor_id = tokio::select! {
            _ = self.execution.cancel.cancelled() => return Err(ActorError::ContainerTerminated),
            result = response_rx => result.map_err(|_| ActorError::ChannelClosed)??,
        };

        debug!("Spawned '{}' as {} in slot {}", definition, actor_id, self.slot_index);
        Ok(ActorHandle::new(
            actor_id,
            self.slot_index,
            self.execution.request_tx.clone(),
            self.execution.cancel.clone(),
            self.callbacks.clone(),
        ))
    }

    /// Destroys the execution context immediately, including any actor
    /// currently executing inside it. Idempotent.
    pub fn terminate(&self) {
        if !self.is_terminated() {
            info!("Terminating container in slot {}", self.slot_index);
        }
        self.execution.terminate();
    }
}

/// Origin-side service loop: runs registered closures on behalf of actors
/// invoking their proxied callbacks, and drops registrations the container
/// side has released, until the container is cancelled or the context drops
/// its sender.
async fn service_callbacks(
    mut invoke_rx: mpsc::Receiver<CallbackMessage>,
    callbacks: CallbackTable,
    cancel: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = invoke_rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let invoke = match message {
            CallbackMessage::Invoke(invoke) => invoke,
            CallbackMessage::Release(callback_id) => {
                callbacks.lock().unwrap().remove(&callback_id);
                continue;
            }
        };

        let callback = callbacks.lock().unwrap().get(&invoke.callback_id).cloned();
        let result = match callback {
            Some(f) => f(invoke.args),
            None => {
                warn!("Unknown callback id {}", invoke.callback_id);
                Err(ActorError::Callback(format!(
                    "unknown callback id {}",
                    invoke.callback_id
                )))
            }
        };
        if invoke.response_tx.send(result).is_err() {
            debug!("Container went away before the callback reply");
        }
    }
    debug!("Callback service loop exiting");
}
