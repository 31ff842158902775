#![allow(dead_code)]

use anyhow::Result;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use troupe::container::ExecutionHandle;
use troupe::{
    Actor, ActorArgs, ActorError, ActorRegistry, ContainerFactory, EventSummary, RemoteCallback,
    ReturnValue, ThreadContainerFactory,
};

/// Holds a numeric value and a label from its constructor arguments.
pub struct Counter {
    value: u64,
    label: String,
}

impl Actor for Counter {
    fn construct(args: ActorArgs) -> Result<Self, ActorError> {
        Ok(Self {
            value: args.get(0)?,
            label: args.get(1)?,
        })
    }

    fn dispatch(&mut self, method: &str, args: ActorArgs) -> Result<ReturnValue, ActorError> {
        match method {
            "value" => ReturnValue::value(&self.value),
            "label" => ReturnValue::value(&self.label),
            "add" => {
                self.value += args.get::<u64>(0)?;
                ReturnValue::value(&self.value)
            }
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

/// Behaves.
pub struct GoodActor;

impl Actor for GoodActor {
    fn construct(_args: ActorArgs) -> Result<Self, ActorError> {
        Ok(Self)
    }

    fn dispatch(&mut self, method: &str, _args: ActorArgs) -> Result<ReturnValue, ActorError> {
        match method {
            "gimme42" => ReturnValue::value(&42u64),
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

/// Blocks its container thread forever on request.
pub struct BadActor;

impl Actor for BadActor {
    fn construct(_args: ActorArgs) -> Result<Self, ActorError> {
        Ok(Self)
    }

    fn dispatch(&mut self, method: &str, _args: ActorArgs) -> Result<ReturnValue, ActorError> {
        match method {
            "gimme42" => ReturnValue::value(&42u64),
            "block" => loop {
                std::thread::park();
            },
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

/// Forwards a value into a callback argument and returns the callback's
/// result.
pub struct Relay;

impl Actor for Relay {
    fn construct(_args: ActorArgs) -> Result<Self, ActorError> {
        Ok(Self)
    }

    fn dispatch(&mut self, method: &str, args: ActorArgs) -> Result<ReturnValue, ActorError> {
        match method {
            "notify" => {
                let value: Value = args.get(0)?;
                let callback = args.callback(1)?;
                Ok(callback.invoke(vec![value])?.into())
            }
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

/// Keeps a callback from its constructor arguments and rings it on demand.
pub struct Chime {
    bell: RemoteCallback,
}

impl Actor for Chime {
    fn construct(args: ActorArgs) -> Result<Self, ActorError> {
        Ok(Self {
            bell: args.callback(0)?,
        })
    }

    fn dispatch(&mut self, method: &str, _args: ActorArgs) -> Result<ReturnValue, ActorError> {
        match method {
            "ring" => Ok(self.bell.invoke(vec![Value::from("ding")])?.into()),
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

/// Reads the identifying fields out of an event summary argument.
pub struct Auditor;

impl Actor for Auditor {
    fn construct(_args: ActorArgs) -> Result<Self, ActorError> {
        Ok(Self)
    }

    fn dispatch(&mut self, method: &str, args: ActorArgs) -> Result<ReturnValue, ActorError> {
        match method {
            "observe" => {
                let event: EventSummary = args.get(0)?;
                ReturnValue::value(&event.kind)
            }
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

/// Hands back a closure over its constructor state when asked.
pub struct Adder {
    base: u64,
}

impl Actor for Adder {
    fn construct(args: ActorArgs) -> Result<Self, ActorError> {
        Ok(Self {
            base: args.get(0)?,
        })
    }

    fn dispatch(&mut self, method: &str, _args: ActorArgs) -> Result<ReturnValue, ActorError> {
        match method {
            "make" => {
                let base = self.base;
                Ok(ReturnValue::callback(move |args| {
                    let n = args
                        .first()
                        .and_then(Value::as_u64)
                        .ok_or_else(|| ActorError::Callback("expected a number".to_string()))?;
                    Ok(Value::from(base + n))
                }))
            }
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

/// Always fails to construct.
pub struct Unbuildable;

impl Actor for Unbuildable {
    fn construct(_args: ActorArgs) -> Result<Self, ActorError> {
        Err(ActorError::Instantiation("refuses to construct".to_string()))
    }

    fn dispatch(&mut self, _method: &str, _args: ActorArgs) -> Result<ReturnValue, ActorError> {
        unreachable!("Unbuildable never constructs")
    }
}

/// A fresh registry with every test actor registered.
pub fn test_registry() -> Arc<ActorRegistry> {
    let registry = Arc::new(ActorRegistry::new());
    registry.register::<Counter>("counter");
    registry.register::<GoodActor>("good");
    registry.register::<BadActor>("bad");
    registry.register::<Relay>("relay");
    registry.register::<Chime>("chime");
    registry.register::<Auditor>("auditor");
    registry.register::<Adder>("adder");
    registry.register::<Unbuildable>("unbuildable");
    registry
}

/// Wraps the default factory and records which slots containers were
/// created for, in creation order.
pub struct RecordingFactory {
    inner: ThreadContainerFactory,
    created: Mutex<Vec<usize>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self {
            inner: ThreadContainerFactory::default(),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn created_slots(&self) -> Vec<usize> {
        self.created.lock().unwrap().clone()
    }
}

impl ContainerFactory for RecordingFactory {
    fn create(
        &self,
        locator: &str,
        slot_index: usize,
        registry: Arc<ActorRegistry>,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionHandle>> + Send>> {
        self.created.lock().unwrap().push(slot_index);
        self.inner.create(locator, slot_index, registry)
    }
}
