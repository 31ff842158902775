//! # Actor Handle
//!
//! The local stand-in for one remote actor instance. Every call marshals its
//! arguments per the serialization contract, routes to the owning
//! container's endpoint, awaits the remote result, and marshals it back.
//! All calls are asynchronous regardless of the target method's nature: the
//! call crosses an isolation boundary, so this is a correctness requirement
//! rather than an optimization.
//!
//! Calls issued through one handle reach its container in issue order.
//! There is no per-call timeout: a call on a hung actor stays pending until
//! the owning container is terminated, at which point it is released with
//! [`ActorError::ContainerTerminated`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::errors::ActorError;
use crate::id::{ActorId, CallbackId};
use crate::messages::HostRequest;
use crate::wire::{marshal_args, CallArg, CallbackTable, EventSummary, WireValue};

/// A handle to one actor instance inside a container. Cheap to clone; does
/// not own the container, only routes calls to it.
#[derive(Clone)]
pub struct ActorHandle {
    actor_id: ActorId,
    slot_index: usize,
    request_tx: mpsc::Sender<HostRequest>,
    cancel: CancellationToken,
    callbacks: CallbackTable,
}

impl ActorHandle {
    pub(crate) fn new(
        actor_id: ActorId,
        slot_index: usize,
        request_tx: mpsc::Sender<HostRequest>,
        cancel: CancellationToken,
        callbacks: CallbackTable,
    ) -> Self {
        Self {
            actor_id,
            slot_index,
            request_tx,
            cancel,
            callbacks,
        }
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// Index of the pool slot whose container hosts this actor.
    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    /// Calls a method with a single by-value parameter. Pass a tuple to
    /// carry several values in one copied argument.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, ActorError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.call_args(method, vec![CallArg::value(&params)?]).await
    }

    /// Calls a method with the full argument surface of the serialization
    /// contract, including proxied callbacks and event summaries, and
    /// decodes the result by value. A method that returns a closure cannot
    /// be decoded here; take its proxy through [`ActorHandle::call_raw`].
    pub async fn call_args<R>(&self, method: &str, args: Vec<CallArg>) -> Result<R, ActorError>
    where
        R: DeserializeOwned,
    {
        self.call_raw(method, args).await?.decode().map_err(|e| {
            error!("Failed to decode result of '{}': {}", method, e);
            e
        })
    }

    /// Calls a method and hands back the result in wire form: plain data,
    /// an event summary, or an invocable proxy for a closure the actor
    /// returned.
    pub async fn call_raw(&self, method: &str, args: Vec<CallArg>) -> Result<Returned, ActorError> {
        let wire = self.dispatch_raw(method, args).await?;
        Ok(match wire {
            WireValue::Data(v) => Returned::Value(v),
            WireValue::Event(e) => Returned::Event(e),
            WireValue::Callback(id) => Returned::Callback(ReturnedCallback {
                inner: Arc::new(ReturnedCallbackInner {
                    callback_id: id,
                    request_tx: self.request_tx.clone(),
                    cancel: self.cancel.clone(),
                }),
            }),
        })
    }

    async fn dispatch_raw(&self, method: &str, args: Vec<CallArg>) -> Result<WireValue, ActorError> {
        if self.cancel.is_cancelled() {
            return Err(ActorError::ContainerTerminated);
        }

        let args = marshal_args(args, &self.callbacks);
        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(HostRequest::Call {
                actor_id: self.actor_id,
                method: method.to_string(),
                args,
                response_tx,
            })
            .await
            .map_err(|_| ActorError::ContainerTerminated)?;

        // Race the reply against container termination so calls in flight at
        // terminate() reject instead of hanging on an abandoned thread.
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ActorError::ContainerTerminated),
            result = response_rx => match result {
                Ok(result) => result,
                Err(_) => {
                    error!("Channel closed while waiting for '{}' on {}", method, self.actor_id);
                    Err(ActorError::ChannelClosed)
                }
            },
        }
    }
}

impl std::fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorHandle")
            .field("actor_id", &self.actor_id)
            .field("slot_index", &self.slot_index)
            .finish()
    }
}

/// One call result as it arrives on the caller side.
#[derive(Clone, Debug)]
pub enum Returned {
    /// Plain data, copied by value.
    Value(Value),
    /// A proxy for a closure that stayed inside the container.
    Callback(ReturnedCallback),
    /// A copyable decomposition of an event-like value.
    Event(EventSummary),
}

impl Returned {
    /// Decodes a by-value result. Event summaries decode like data; a
    /// proxied closure has no by-value form and is refused.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ActorError> {
        match self {
            Returned::Value(v) => serde_json::from_value(v)
                .map_err(|e| ActorError::Serialization(e.to_string())),
            Returned::Event(summary) => {
                let v = serde_json::to_value(summary)
                    .map_err(|e| ActorError::Serialization(e.to_string()))?;
                serde_json::from_value(v).map_err(|e| ActorError::Serialization(e.to_string()))
            }
            Returned::Callback(_) => Err(ActorError::Serialization(
                "result is a proxied closure; take it with call_raw".to_string(),
            )),
        }
    }

    /// Takes the result as an invocable proxy.
    pub fn into_callback(self) -> Result<ReturnedCallback, ActorError> {
        match self {
            Returned::Callback(cb) => Ok(cb),
            other => Err(ActorError::Serialization(format!(
                "result is not a closure: {other:?}"
            ))),
        }
    }
}

/// An invocable proxy for a closure a container-side actor returned. The
/// closure itself never leaves its container; invocations route down the
/// container's request channel and run there, in order with other requests.
///
/// When the last clone of the proxy drops, the closure's registration
/// inside the container is released.
#[derive(Clone)]
pub struct ReturnedCallback {
    inner: Arc<ReturnedCallbackInner>,
}

struct ReturnedCallbackInner {
    callback_id: CallbackId,
    request_tx: mpsc::Sender<HostRequest>,
    cancel: CancellationToken,
}

impl ReturnedCallback {
    /// Invoke the container-side closure with the given arguments.
    pub async fn invoke(&self, args: Vec<Value>) -> Result<Value, ActorError> {
        if self.inner.cancel.is_cancelled() {
            return Err(ActorError::ContainerTerminated);
        }

        let (response_tx, response_rx) = oneshot::channel();
        self.inner
            .request_tx
            .send(HostRequest::InvokeReturned {
                callback_id: self.inner.callback_id,
                args,
                response_tx,
            })
            .await
            .map_err(|_| ActorError::ContainerTerminated)?;

        tokio::select! {
            _ = self.inner.cancel.cancelled() => Err(ActorError::ContainerTerminated),
            result = response_rx => match result {
                Ok(result) => result,
                Err(_) => Err(ActorError::ChannelClosed),
            },
        }
    }
}

impl Drop for ReturnedCallbackInner {
    fn drop(&mut self) {
        let _ = self.request_tx.try_send(HostRequest::ReleaseReturned {
            callback_id: self.callback_id,
        });
    }
}

impl std::fmt::Debug for ReturnedCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReturnedCallback")
            .field("callback_id", &self.inner.callback_id)
            .finish()
    }
}
