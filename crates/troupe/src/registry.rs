//! # Actor Registry
//!
//! The registered-constructor lookup that carries actor definitions across
//! the isolation boundary. Instead of shipping code, the caller ships a
//! stable definition name; both sides resolve it against a shared
//! [`ActorRegistry`] of constructible actor types. The contract is
//! unchanged from source-shipping designs: instantiate by reference, pass
//! constructor arguments, get back a handle.

use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::errors::ActorError;
use crate::id::CallbackId;
use crate::messages::{CallbackInvoke, CallbackMessage};
use crate::wire::{ReturnValue, WireValue};

/// The capability surface of an actor.
///
/// An implementation must be independently constructible inside a container:
/// it may close over nothing from the caller, and everything it needs at
/// construction time arrives through [`ActorArgs`]. `dispatch` performs one
/// named method call; on the caller side every such call is asynchronous.
pub trait Actor: Send + 'static {
    /// Construct the actor from marshaled constructor arguments.
    fn construct(args: ActorArgs) -> Result<Self, ActorError>
    where
        Self: Sized;

    /// Dispatch one named method call. Unknown names must return
    /// [`ActorError::MethodNotFound`]. A [`ReturnValue::Callback`] result
    /// stays in the container and reaches the caller as an invocable proxy.
    fn dispatch(&mut self, method: &str, args: ActorArgs) -> Result<ReturnValue, ActorError>;
}

/// Marshaled arguments as seen from inside a container, with accessors that
/// enforce the serialization contract: data decodes by value, callbacks
/// materialize as invocable proxies.
pub struct ActorArgs {
    values: Vec<WireValue>,
    port: CallbackPort,
    taken: RefCell<HashMap<usize, RemoteCallback>>,
}

impl ActorArgs {
    pub(crate) fn new(values: Vec<WireValue>, port: CallbackPort) -> Self {
        Self {
            values,
            port,
            taken: RefCell::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Decodes the argument at `index` as a by-value copy. Event arguments
    /// decode as [`crate::wire::EventSummary`]; callback arguments are
    /// rejected here and must be taken through [`ActorArgs::callback`].
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, ActorError> {
        match self.values.get(index) {
            Some(WireValue::Data(v)) => serde_json::from_value(v.clone())
                .map_err(|e| ActorError::Serialization(e.to_string())),
            Some(WireValue::Event(summary)) => {
                let v = serde_json::to_value(summary)
                    .map_err(|e| ActorError::Serialization(e.to_string()))?;
                serde_json::from_value(v).map_err(|e| ActorError::Serialization(e.to_string()))
            }
            Some(WireValue::Callback(_)) => Err(ActorError::Serialization(format!(
                "argument {index} is a callback; take it with callback()"
            ))),
            None => Err(ActorError::Serialization(format!(
                "missing argument {index}"
            ))),
        }
    }

    /// Takes the argument at `index` as an invocable callback proxy. Taking
    /// the same index twice hands back the same proxy.
    pub fn callback(&self, index: usize) -> Result<RemoteCallback, ActorError> {
        if let Some(cb) = self.taken.borrow().get(&index) {
            return Ok(cb.clone());
        }
        match self.values.get(index) {
            Some(WireValue::Callback(id)) => {
                let cb = RemoteCallback {
                    inner: Arc::new(RemoteCallbackInner {
                        id: *id,
                        port: self.port.clone(),
                    }),
                };
                self.taken.borrow_mut().insert(index, cb.clone());
                Ok(cb)
            }
            Some(_) => Err(ActorError::Serialization(format!(
                "argument {index} is not a callback"
            ))),
            None => Err(ActorError::Serialization(format!(
                "missing argument {index}"
            ))),
        }
    }
}

impl Drop for ActorArgs {
    fn drop(&mut self) {
        // Callback arguments the actor never took have no proxy to release
        // them later; unregister them on the origin side now.
        let taken = self.taken.borrow();
        for (index, value) in self.values.iter().enumerate() {
            if let WireValue::Callback(id) = value {
                if !taken.contains_key(&index) {
                    let _ = self
                        .port
                        .invoke_tx
                        .try_send(CallbackMessage::Release(*id));
                }
            }
        }
    }
}

/// Container-side sender for callback invocations, cloned into every
/// [`RemoteCallback`] handed to an actor.
#[derive(Clone, Debug)]
pub(crate) struct CallbackPort {
    pub(crate) invoke_tx: tokio::sync::mpsc::Sender<CallbackMessage>,
}

/// A live proxy for a caller-side closure. Invoking it forwards the
/// invocation back to the origin side and blocks the container thread until
/// the origin replies with the closure's result.
///
/// When the last clone of the proxy drops, the closure's registration on
/// the origin side is released.
#[derive(Clone, Debug)]
pub struct RemoteCallback {
    inner: Arc<RemoteCallbackInner>,
}

#[derive(Debug)]
struct RemoteCallbackInner {
    id: CallbackId,
    port: CallbackPort,
}

impl RemoteCallback {
    /// Invoke the origin-side closure with the given arguments.
    ///
    /// Blocks the calling thread; only valid from inside a container's
    /// hosting thread, never from an async runtime.
    pub fn invoke(&self, args: Vec<Value>) -> Result<Value, ActorError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.inner
            .port
            .invoke_tx
            .blocking_send(CallbackMessage::Invoke(CallbackInvoke {
                callback_id: self.inner.id,
                args,
                response_tx: tx,
            }))
            .map_err(|_| ActorError::ContainerTerminated)?;
        rx.blocking_recv().map_err(|_| ActorError::ChannelClosed)?
    }
}

impl Drop for RemoteCallbackInner {
    fn drop(&mut self) {
        let _ = self
            .port
            .invoke_tx
            .try_send(CallbackMessage::Release(self.id));
    }
}

type ConstructorFn = Arc<dyn Fn(ActorArgs) -> Result<Box<dyn Actor>, ActorError> + Send + Sync>;

/// The shared registry of constructible actor types, keyed by stable
/// definition name.
#[derive(Default)]
pub struct ActorRegistry {
    constructors: RwLock<HashMap<String, ConstructorFn>>,
}

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<ActorRegistry> = Arc::new(ActorRegistry::new());
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by the default strategy.
    pub fn global() -> Arc<ActorRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Registers an actor type under a definition name. A later registration
    /// under the same name replaces the earlier one.
    pub fn register<A: Actor>(&self, definition: &str) {
        self.register_with(definition, |args| {
            Ok(Box::new(A::construct(args)?) as Box<dyn Actor>)
        });
    }

    /// Registers an arbitrary constructor closure under a definition name.
    pub fn register_with<F>(&self, definition: &str, constructor: F)
    where
        F: Fn(ActorArgs) -> Result<Box<dyn Actor>, ActorError> + Send + Sync + 'static,
    {
        debug!("Registering actor definition '{}'", definition);
        self.constructors
            .write()
            .unwrap()
            .insert(definition.to_string(), Arc::new(constructor));
    }

    pub fn contains(&self, definition: &str) -> bool {
        self.constructors.read().unwrap().contains_key(definition)
    }

    pub(crate) fn resolve(&self, definition: &str) -> Option<ConstructorFn> {
        self.constructors.read().unwrap().get(definition).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::EventSummary;
    use pretty_assertions::assert_eq;

    struct Echo {
        greeting: String,
    }

    impl Actor for Echo {
        fn construct(args: ActorArgs) -> Result<Self, ActorError> {
            Ok(Self {
                greeting: args.get(0)?,
            })
        }

        fn dispatch(&mut self, method: &str, _args: ActorArgs) -> Result<ReturnValue, ActorError> {
            match method {
                "greeting" => ReturnValue::value(&self.greeting),
                other => Err(ActorError::MethodNotFound(other.to_string())),
            }
        }
    }

    fn port() -> CallbackPort {
        let (invoke_tx, _rx) = tokio::sync::mpsc::channel(1);
        CallbackPort { invoke_tx }
    }

    #[test]
    fn registration_resolves_and_constructs() {
        let registry = ActorRegistry::new();
        registry.register::<Echo>("echo");
        assert!(registry.contains("echo"));
        assert!(!registry.contains("missing"));

        let ctor = registry.resolve("echo").unwrap();
        let args = ActorArgs::new(vec![WireValue::Data(Value::from("hai"))], port());
        let mut actor = ctor(args).unwrap();

        let result = actor
            .dispatch("greeting", ActorArgs::new(vec![], port()))
            .unwrap();
        match result {
            ReturnValue::Value(v) => assert_eq!(v, Value::from("hai")),
            other => panic!("expected a by-value result, got {other:?}"),
        }
    }

    #[test]
    fn args_reject_type_confusion() {
        let args = ActorArgs::new(
            vec![
                WireValue::Data(Value::from(3)),
                WireValue::Callback(CallbackId::generate()),
            ],
            port(),
        );

        assert_eq!(args.get::<u32>(0).unwrap(), 3);
        assert!(matches!(
            args.get::<u32>(1),
            Err(ActorError::Serialization(_))
        ));
        assert!(matches!(
            args.callback(0),
            Err(ActorError::Serialization(_))
        ));
        assert!(args.callback(1).is_ok());
        assert!(matches!(
            args.get::<u32>(5),
            Err(ActorError::Serialization(_))
        ));
    }

    #[test]
    fn dropping_every_proxy_releases_the_callback_registration() {
        let (invoke_tx, mut rx) = tokio::sync::mpsc::channel(4);
        let id = CallbackId::generate();
        let args = ActorArgs::new(vec![WireValue::Callback(id)], CallbackPort { invoke_tx });

        let first = args.callback(0).unwrap();
        let second = args.callback(0).unwrap();
        drop(args);
        drop(first);
        assert!(rx.try_recv().is_err(), "registration released too early");

        drop(second);
        match rx.try_recv() {
            Ok(CallbackMessage::Release(released)) => assert_eq!(released, id),
            other => panic!("expected a release message, got {other:?}"),
        }
        assert!(rx.try_recv().is_err(), "registration released twice");
    }

    #[test]
    fn unconsumed_callback_arguments_are_released_with_the_args() {
        let (invoke_tx, mut rx) = tokio::sync::mpsc::channel(4);
        let id = CallbackId::generate();
        let args = ActorArgs::new(
            vec![WireValue::Data(Value::from(1)), WireValue::Callback(id)],
            CallbackPort { invoke_tx },
        );

        drop(args);
        match rx.try_recv() {
            Ok(CallbackMessage::Release(released)) => assert_eq!(released, id),
            other => panic!("expected a release message, got {other:?}"),
        }
    }

    #[test]
    fn event_arguments_decode_as_summaries() {
        let summary = EventSummary::new("resize").with_field("cols", 80);
        let args = ActorArgs::new(vec![WireValue::Event(summary.clone())], port());
        let decoded: EventSummary = args.get(0).unwrap();
        assert_eq!(decoded, summary);
    }
}
