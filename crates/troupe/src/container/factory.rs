//! # Container Factory
//!
//! The injectable mechanism for creating isolated execution contexts. The
//! pool only ever sees the [`ContainerFactory`] trait and the
//! [`ExecutionHandle`] it returns; the default implementation backs each
//! container with a dedicated OS thread running the hosting loop.

use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::container::host;
use crate::messages::{CallbackMessage, HostRequest};
use crate::registry::ActorRegistry;

/// Default depth of a container's request and callback channels.
pub const DEFAULT_CHANNEL_DEPTH: usize = 64;

/// Owns one isolated execution context. The only authority able to terminate
/// it; everything else routes through the request endpoint.
#[derive(Debug)]
pub struct ExecutionHandle {
    pub(crate) request_tx: mpsc::Sender<HostRequest>,
    pub(crate) invoke_rx: Option<mpsc::Receiver<CallbackMessage>>,
    pub(crate) cancel: CancellationToken,
}

impl ExecutionHandle {
    pub fn new(
        request_tx: mpsc::Sender<HostRequest>,
        invoke_rx: mpsc::Receiver<CallbackMessage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            request_tx,
            invoke_rx: Some(invoke_rx),
            cancel,
        }
    }

    /// Destroys the execution context: cancels the container token so every
    /// pending and future call is released. No drain, no cooperative signal.
    pub fn terminate(&self) {
        self.cancel.cancel();
    }
}

/// Creates isolated execution contexts on behalf of a pool.
///
/// `locator` names the context (thread name prefix for the default factory,
/// free for other factories to interpret); `slot_index` is the pool slot the
/// context will occupy; `registry` is the actor registry the context must
/// resolve definitions against.
pub trait ContainerFactory: Send + Sync + 'static {
    fn create(
        &self,
        locator: &str,
        slot_index: usize,
        registry: Arc<ActorRegistry>,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionHandle>> + Send>>;
}

/// The default factory: one dedicated OS thread per container, running the
/// hosting loop synchronously. A thread is preemptible from the outside in
/// the sense the pool needs: abandoning it reclaims the slot immediately
/// even while an actor blocks inside it.
#[derive(Debug, Clone)]
pub struct ThreadContainerFactory {
    pub channel_depth: usize,
}

impl Default for ThreadContainerFactory {
    fn default() -> Self {
        Self {
            channel_depth: DEFAULT_CHANNEL_DEPTH,
        }
    }
}

impl ContainerFactory for ThreadContainerFactory {
    fn create(
        &self,
        locator: &str,
        slot_index: usize,
        registry: Arc<ActorRegistry>,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionHandle>> + Send>> {
        let depth = self.channel_depth;
        let thread_name = format!("{locator}-{slot_index}");
        Box::pin(async move {
            let (request_tx, request_rx) = mpsc::channel(depth);
            let (invoke_tx, invoke_rx) = mpsc::channel(depth);
            let cancel = CancellationToken::new();

            let loop_cancel = cancel.clone();
            std::thread::Builder::new()
                .name(thread_name.clone())
                .spawn(move || host::run(registry, request_rx, invoke_tx, loop_cancel))?;

            info!("Started container thread '{}'", thread_name);
            Ok(ExecutionHandle::new(request_tx, invoke_rx, cancel))
        })
    }
}
