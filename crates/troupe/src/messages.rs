//! # Container Protocol Messages
//!
//! The channel RPC protocol between the caller side and a container's
//! hosting loop. Requests flow down one mpsc channel per container (which is
//! what gives calls their per-container FIFO ordering) and carry a oneshot
//! sender for the reply. Callback invocations flow back up a second channel.

use serde_json::Value;
use tokio::sync::oneshot;

use crate::errors::ActorError;
use crate::id::{ActorId, CallbackId};
use crate::wire::WireValue;

/// A request to a container's hosting loop.
#[derive(Debug)]
pub enum HostRequest {
    /// Resolve a definition against the registry, construct the actor with
    /// the given arguments, and return its id.
    Spawn {
        definition: String,
        args: Vec<WireValue>,
        response_tx: oneshot::Sender<Result<ActorId, ActorError>>,
    },
    /// Dispatch one named method call on an actor. The reply is a wire
    /// value, so a closure result comes back as a remote reference.
    Call {
        actor_id: ActorId,
        method: String,
        args: Vec<WireValue>,
        response_tx: oneshot::Sender<Result<WireValue, ActorError>>,
    },
    /// Invoke a container-side closure that an earlier call returned.
    InvokeReturned {
        callback_id: CallbackId,
        args: Vec<Value>,
        response_tx: oneshot::Sender<Result<Value, ActorError>>,
    },
    /// Drop the registration of a returned closure once its last
    /// caller-side proxy is gone.
    ReleaseReturned { callback_id: CallbackId },
}

/// Traffic on a container's upstream channel, sent from inside a container
/// back to its origin.
#[derive(Debug)]
pub enum CallbackMessage {
    /// Run a proxied caller-side closure and reply with its result.
    Invoke(CallbackInvoke),
    /// Drop a closure registration whose last container-side proxy is gone.
    Release(CallbackId),
}

/// An invocation of a proxied caller-side callback.
#[derive(Debug)]
pub struct CallbackInvoke {
    pub callback_id: CallbackId,
    pub args: Vec<Value>,
    pub response_tx: oneshot::Sender<Result<Value, ActorError>>,
}
