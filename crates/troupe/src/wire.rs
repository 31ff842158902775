//! # Serialization Contract
//!
//! Rules for what crosses the isolation boundary as a copy and what becomes
//! a live proxy. Plain data is copied by value as JSON. Closures are never
//! copied, in either direction: a caller-side closure is registered in the
//! owning container's callback table and travels as a [`CallbackId`], which
//! the container side materializes into an invocable proxy; a closure
//! returned by an actor is registered on the container side and travels
//! back the same way, materialized as an invocable proxy on the caller
//! side. Event-like values are decomposed into a copyable summary of
//! identifying fields, since their full native identity is meaningless on
//! the other side.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::ActorError;
use crate::id::CallbackId;

/// A caller-side closure proxied into a container. Invoked with the
/// forwarded arguments; runs exactly once per remote invocation.
pub type CallbackFn = Arc<dyn Fn(Vec<Value>) -> Result<Value, ActorError> + Send + Sync>;

/// Per-container table of registered callbacks, shared between the container
/// client and every handle bound to it.
pub(crate) type CallbackTable = Arc<Mutex<HashMap<CallbackId, CallbackFn>>>;

/// One value as it travels across the isolation boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WireValue {
    /// Plain data, copied by value.
    Data(Value),
    /// A proxied caller-side closure, passed by remote reference.
    Callback(CallbackId),
    /// A copyable decomposition of an event-like value.
    Event(EventSummary),
}

/// The copyable summary of an event-like value: a kind tag plus the
/// identifying fields, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub kind: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
}

impl EventSummary {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(name.into(), v);
        }
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// One argument as supplied by the caller, before marshaling.
pub enum CallArg {
    /// Copied by value.
    Value(Value),
    /// Proxied; the closure stays on the origin side.
    Callback(CallbackFn),
    /// Copied as an identifying summary.
    Event(EventSummary),
}

impl CallArg {
    /// A by-value argument. Fails if the value cannot be serialized.
    pub fn value<T: Serialize>(value: &T) -> Result<Self, ActorError> {
        let v = serde_json::to_value(value)
            .map_err(|e| ActorError::Serialization(e.to_string()))?;
        Ok(CallArg::Value(v))
    }

    /// A proxied callback argument.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, ActorError> + Send + Sync + 'static,
    {
        CallArg::Callback(Arc::new(f))
    }

    /// An event argument, decomposed into its summary.
    pub fn event(summary: EventSummary) -> Self {
        CallArg::Event(summary)
    }
}

impl std::fmt::Debug for CallArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallArg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            CallArg::Callback(_) => f.debug_tuple("Callback").finish(),
            CallArg::Event(e) => f.debug_tuple("Event").field(e).finish(),
        }
    }
}

/// One value as an actor hands it back from a dispatched method.
///
/// Plain data is copied to the caller; a closure stays on the container
/// side and crosses back as a remote reference the caller can invoke.
pub enum ReturnValue {
    /// Copied by value.
    Value(Value),
    /// Proxied; the closure stays on the container side.
    Callback(CallbackFn),
    /// Copied as an identifying summary.
    Event(EventSummary),
}

impl ReturnValue {
    /// A by-value result. Fails if the value cannot be serialized.
    pub fn value<T: Serialize>(value: &T) -> Result<Self, ActorError> {
        let v = serde_json::to_value(value)
            .map_err(|e| ActorError::Serialization(e.to_string()))?;
        Ok(ReturnValue::Value(v))
    }

    /// A proxied callback result.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, ActorError> + Send + Sync + 'static,
    {
        ReturnValue::Callback(Arc::new(f))
    }

    /// An event result, decomposed into its summary.
    pub fn event(summary: EventSummary) -> Self {
        ReturnValue::Event(summary)
    }
}

impl From<Value> for ReturnValue {
    fn from(value: Value) -> Self {
        ReturnValue::Value(value)
    }
}

impl std::fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            ReturnValue::Callback(_) => f.debug_tuple("Callback").finish(),
            ReturnValue::Event(e) => f.debug_tuple("Event").field(e).finish(),
        }
    }
}

/// Marshals caller arguments into wire values, registering any callbacks in
/// the container's table under fresh ids.
pub(crate) fn marshal_args(args: Vec<CallArg>, callbacks: &CallbackTable) -> Vec<WireValue> {
    args.into_iter()
        .map(|arg| match arg {
            CallArg::Value(v) => WireValue::Data(v),
            CallArg::Callback(f) => {
                let id = CallbackId::generate();
                callbacks.lock().unwrap().insert(id, f);
                WireValue::Callback(id)
            }
            CallArg::Event(e) => WireValue::Event(e),
        })
        .collect()
}
