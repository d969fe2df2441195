//! Dedicated worker runtime for endpoint resolution.
//!
//! Resolving an endpoint performs network I/O, so it must never run on the
//! caller's main context. This module owns a Tokio runtime that resolution
//! tasks are spawned onto, and hands back a [`TaskHandle`] that can be awaited
//! from async code or waited on from a plain thread.
//!
//! # Runtime flavors
//!
//! - **Multi-threaded** (default): Tokio's work-stealing scheduler.
//! - **Single-threaded**: a current-thread runtime driven by one dedicated
//!   OS thread. All resolutions then run strictly one after another.
//!
//! # Example
//!
//! ```no_run
//! use tunnel_endpoint_core::runtime::{WorkerRuntime, WorkerRuntimeConfig};
//!
//! let runtime = WorkerRuntime::new(WorkerRuntimeConfig::single_threaded())?;
//! let handle = runtime.spawn(async { "resolved" });
//! assert_eq!(handle.blocking_wait(), Some("resolved"));
//! # Ok::<(), tunnel_endpoint_core::runtime::RuntimeError>(())
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;

use crate::logging::targets;

static GLOBAL_RUNTIME: OnceLock<WorkerRuntime> = OnceLock::new();

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// The scheduler flavor of a [`WorkerRuntime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeFlavor {
    /// Tokio's multi-threaded scheduler.
    #[default]
    MultiThreaded,
    /// A current-thread runtime on one dedicated OS thread.
    SingleThreaded,
}

/// Configuration for the worker runtime.
#[derive(Debug, Clone)]
pub struct WorkerRuntimeConfig {
    /// The scheduler flavor.
    pub flavor: RuntimeFlavor,
    /// Worker thread count for the multi-threaded flavor.
    /// Defaults to the number of CPU cores.
    pub worker_threads: Option<usize>,
    /// Name prefix for runtime threads.
    pub thread_name: String,
}

impl Default for WorkerRuntimeConfig {
    fn default() -> Self {
        Self {
            flavor: RuntimeFlavor::MultiThreaded,
            worker_threads: None,
            thread_name: "endpoint-resolver".to_string(),
        }
    }
}

impl WorkerRuntimeConfig {
    /// Configuration for a multi-threaded runtime.
    pub fn multi_threaded() -> Self {
        Self {
            flavor: RuntimeFlavor::MultiThreaded,
            ..Default::default()
        }
    }

    /// Configuration for a single-threaded runtime.
    pub fn single_threaded() -> Self {
        Self {
            flavor: RuntimeFlavor::SingleThreaded,
            ..Default::default()
        }
    }

    /// Set the number of worker threads (multi-threaded flavor only).
    pub fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = Some(count);
        self
    }

    /// Set the thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// Handle to a task spawned on the worker runtime.
#[derive(Debug)]
pub struct TaskHandle<T> {
    id: u64,
    receiver: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Unique task ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Block the current thread until the task completes.
    ///
    /// Returns `None` if the task panicked or the runtime shut down first.
    ///
    /// # Warning
    ///
    /// Must not be called from inside an async context.
    pub fn blocking_wait(self) -> Option<T> {
        self.receiver.blocking_recv().ok()
    }

    /// Take the result if the task has already finished.
    pub fn try_get(mut self) -> Result<T, Self> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(value),
            Err(_) => Err(self),
        }
    }

    /// Await the task result.
    pub async fn wait(self) -> Option<T> {
        self.receiver.await.ok()
    }
}

struct SingleThreadedState {
    thread_handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: oneshot::Sender<()>,
}

/// The worker runtime resolution tasks run on.
pub struct WorkerRuntime {
    // Owned runtime for the multi-threaded flavor; dropping it shuts down.
    #[allow(dead_code)]
    runtime: Option<Runtime>,
    handle: Handle,
    single_threaded: Option<SingleThreadedState>,
    flavor: RuntimeFlavor,
    active_tasks: Arc<AtomicU64>,
}

impl WorkerRuntime {
    /// The process-wide worker runtime, created on first use with defaults.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to create the runtime threads.
    pub fn global() -> &'static WorkerRuntime {
        GLOBAL_RUNTIME.get_or_init(|| {
            WorkerRuntime::new(WorkerRuntimeConfig::default())
                .expect("Failed to create global worker runtime")
        })
    }

    /// Initialize the process-wide runtime with a custom configuration.
    ///
    /// Fails if the global runtime already exists.
    pub fn init_global(config: WorkerRuntimeConfig) -> Result<&'static WorkerRuntime, RuntimeError> {
        let runtime = WorkerRuntime::new(config)?;
        GLOBAL_RUNTIME
            .set(runtime)
            .map_err(|_| RuntimeError::AlreadyInitialized)?;
        let runtime = GLOBAL_RUNTIME.get().ok_or(RuntimeError::AlreadyInitialized)?;
        crate::endpoint_info!(flavor = ?runtime.flavor(), "initialized global worker runtime");
        Ok(runtime)
    }

    /// Create a new worker runtime.
    pub fn new(config: WorkerRuntimeConfig) -> Result<Self, RuntimeError> {
        match config.flavor {
            RuntimeFlavor::MultiThreaded => Self::new_multi_threaded(config),
            RuntimeFlavor::SingleThreaded => Self::new_single_threaded(config),
        }
    }

    fn new_multi_threaded(config: WorkerRuntimeConfig) -> Result<Self, RuntimeError> {
        let mut builder = Builder::new_multi_thread();
        builder.thread_name(&config.thread_name).enable_all();

        if let Some(workers) = config.worker_threads {
            builder.worker_threads(workers);
        }

        let runtime = builder
            .build()
            .map_err(|e| RuntimeError::CreationFailed(e.to_string()))?;
        let handle = runtime.handle().clone();

        tracing::debug!(target: targets::RUNTIME, thread_name = %config.thread_name, "started multi-threaded worker runtime");

        Ok(Self {
            runtime: Some(runtime),
            handle,
            single_threaded: None,
            flavor: RuntimeFlavor::MultiThreaded,
            active_tasks: Arc::new(AtomicU64::new(0)),
        })
    }

    fn new_single_threaded(config: WorkerRuntimeConfig) -> Result<Self, RuntimeError> {
        let (handle_tx, handle_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread_handle = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = handle_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = handle_tx.send(Ok(runtime.handle().clone()));

                runtime.block_on(async {
                    let _ = shutdown_rx.await;
                });
            })
            .map_err(|e| RuntimeError::CreationFailed(e.to_string()))?;

        let handle = handle_rx
            .recv()
            .map_err(|_| RuntimeError::CreationFailed("Runtime thread exited early".to_string()))?
            .map_err(RuntimeError::CreationFailed)?;

        tracing::debug!(target: targets::RUNTIME, thread_name = %config.thread_name, "started single-threaded worker runtime");

        Ok(Self {
            runtime: None,
            handle,
            single_threaded: Some(SingleThreadedState {
                thread_handle: Mutex::new(Some(thread_handle)),
                shutdown_tx,
            }),
            flavor: RuntimeFlavor::SingleThreaded,
            active_tasks: Arc::new(AtomicU64::new(0)),
        })
    }

    /// The scheduler flavor.
    pub fn flavor(&self) -> RuntimeFlavor {
        self.flavor
    }

    /// Number of spawned tasks that have not finished yet.
    pub fn active_tasks(&self) -> u64 {
        self.active_tasks.load(Ordering::Acquire)
    }

    /// Handle to the underlying Tokio runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Spawn a task and return a handle to its result.
    pub fn spawn<F, T>(&self, future: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        let active_tasks = self.active_tasks.clone();

        active_tasks.fetch_add(1, Ordering::AcqRel);
        crate::endpoint_trace!(task_id = id, "spawning task");

        self.handle.spawn(async move {
            let result = future.await;
            // Count the task finished before its waiter can observe the result.
            active_tasks.fetch_sub(1, Ordering::AcqRel);
            if sender.send(result).is_err() {
                crate::endpoint_debug!(task_id = id, "task result dropped, handle gone");
            }
        });

        TaskHandle { id, receiver }
    }

    /// Run a future to completion on the worker runtime, blocking the caller.
    ///
    /// # Warning
    ///
    /// Panics if called from inside an async context.
    pub fn block_on<F, T>(&self, future: F) -> T
    where
        F: Future<Output = T>,
    {
        self.handle.block_on(future)
    }

    /// Stop the runtime.
    ///
    /// For the single-threaded flavor this joins the runtime thread.
    pub fn shutdown(mut self) {
        if let Some(state) = self.single_threaded.take() {
            let _ = state.shutdown_tx.send(());
            if let Some(handle) = state.thread_handle.lock().take() {
                if handle.join().is_err() {
                    crate::endpoint_warn!("worker runtime thread panicked");
                }
            }
        }
        tracing::debug!(target: targets::RUNTIME, "worker runtime shut down");
    }
}

impl std::fmt::Debug for WorkerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRuntime")
            .field("flavor", &self.flavor)
            .field("active_tasks", &self.active_tasks())
            .finish()
    }
}

/// Errors raised while creating the worker runtime.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    /// The global runtime has already been initialized.
    AlreadyInitialized,
    /// The runtime could not be created.
    CreationFailed(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "Worker runtime already initialized"),
            Self::CreationFailed(msg) => write!(f, "Failed to create worker runtime: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}
