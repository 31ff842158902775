//! # Container Hosting Loop
//!
//! The protocol that runs *inside* a container: a synchronous loop on the
//! container's dedicated thread that resolves definitions against the
//! registry, constructs actors, and dispatches method calls. Requests are
//! executed strictly in arrival order, so a call that blocks (an actor stuck
//! in an infinite loop) blocks this container and only this container.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::ActorError;
use crate::id::{ActorId, CallbackId};
use crate::messages::{CallbackMessage, HostRequest};
use crate::registry::{Actor, ActorArgs, ActorRegistry, CallbackPort};
use crate::wire::{CallbackFn, ReturnValue, WireValue};

/// Runs the hosting loop until the request channel closes or the container
/// is cancelled. Entered on a dedicated thread by the container factory.
pub(crate) fn run(
    registry: Arc<ActorRegistry>,
    mut request_rx: mpsc::Receiver<HostRequest>,
    invoke_tx: mpsc::Sender<CallbackMessage>,
    cancel: CancellationToken,
) {
    let port = CallbackPort { invoke_tx };
    let mut actors: HashMap<ActorId, Box<dyn Actor>> = HashMap::new();
    let mut returned: HashMap<CallbackId, CallbackFn> = HashMap::new();

    debug!("Container hosting loop started");
    while let Some(request) = request_rx.blocking_recv() {
        if cancel.is_cancelled() {
            break;
        }
        match request {
            HostRequest::Spawn {
                definition,
                args,
                response_tx,
            } => {
                let result = spawn_actor(&registry, &definition, args, &port, &mut actors);
                if response_tx.send(result).is_err() {
                    debug!("Spawn caller went away before the reply");
                }
            }
            HostRequest::Call {
                actor_id,
                method,
                args,
                response_tx,
            } => {
                let result = match actors.get_mut(&actor_id) {
                    Some(actor) => actor
                        .dispatch(&method, ActorArgs::new(args, port.clone()))
                        .map(|value| marshal_return(value, &mut returned)),
                    None => Err(ActorError::ActorNotFound(actor_id)),
                };
                if response_tx.send(result).is_err() {
                    debug!("Caller went away before the reply to '{}'", method);
                }
            }
            HostRequest::InvokeReturned {
                callback_id,
                args,
                response_tx,
            } => {
                let result = match returned.get(&callback_id) {
                    Some(f) => f(args),
                    None => {
                        warn!("Unknown returned callback id {}", callback_id);
                        Err(ActorError::Callback(format!(
                            "unknown callback id {callback_id}"
                        )))
                    }
                };
                if response_tx.send(result).is_err() {
                    debug!("Caller went away before the callback reply");
                }
            }
            HostRequest::ReleaseReturned { callback_id } => {
                returned.remove(&callback_id);
            }
        }
    }
    debug!("Container hosting loop exiting with {} actors", actors.len());
}

/// Marshals an actor's result for the reply channel, registering a returned
/// closure under a fresh id so the caller gets a remote reference to it.
fn marshal_return(
    value: ReturnValue,
    returned: &mut HashMap<CallbackId, CallbackFn>,
) -> WireValue {
    match value {
        ReturnValue::Value(v) => WireValue::Data(v),
        ReturnValue::Event(e) => WireValue::Event(e),
        ReturnValue::Callback(f) => {
            let id = CallbackId::generate();
            returned.insert(id, f);
            WireValue::Callback(id)
        }
    }
}

fn spawn_actor(
    registry: &ActorRegistry,
    definition: &str,
    args: Vec<WireValue>,
    port: &CallbackPort,
    actors: &mut HashMap<ActorId, Box<dyn Actor>>,
) -> Result<ActorId, ActorError> {
    let constructor = registry
        .resolve(definition)
        .ok_or_else(|| ActorError::UnknownDefinition(definition.to_string()))?;

    match constructor(ActorArgs::new(args, port.clone())) {
        Ok(actor) => {
            let id = ActorId::generate();
            actors.insert(id, actor);
            debug!("Instantiated '{}' as actor {}", definition, id);
            Ok(id)
        }
        Err(e) => {
            warn!("Instantiation of '{}' failed: {}", definition, e);
            // Constructor failures leave the container usable.
            Err(match e {
                ActorError::Instantiation(_) => e,
                other => ActorError::Instantiation(other.to_string()),
            })
        }
    }
}
