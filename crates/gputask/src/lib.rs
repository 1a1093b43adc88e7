//! # GpuTask
//!
//! Frame pipelined scheduling of asynchronous GPU work.
//!
//! Uploads, readbacks, copies and other generated commands are expressed as [GpuTask]s. A [TasksContext] executes a task as soon as it
//! is [run](TasksContext::run) and keeps it in flight until the GPU has finished the frame the work was recorded in.
//!
//! Device progress is tracked by a frame counter ([SyncCounter]). Each task declares a [SyncPoint] at which its effects are visible.
//! Once per frame [on_frame_begin](TasksContext::on_frame_begin) advances the counter and syncs every task whose sync point
//! was reached. Finished tasks are retired, dropping the context cancels everything that is still in flight.
//!
//! ```ignore
//! let mut tasks = TasksContext::new(&device)?;
//! tasks.run(upload.clone());
//!
//! loop {
//!     tasks.on_frame_begin();
//!     //render...
//!     tasks.on_frame_end();
//! }
//! ```
//!
//! The graphics API itself is consumed through the [GraphicsDevice] and [GraphicsContext] capabilities. Whether tasks reuse the device's
//! main context or get a private one is decided once via [TasksConfig] (see the `dedicated_context` feature).

mod config;
mod context;
mod device;
mod error;
mod registry;
mod sync;
mod task;

#[cfg(test)]
mod testing;

pub use config::{ContextMode, TasksConfig};
pub use context::{TaskStats, TasksContext};
pub use device::{BufferCopy, BufferDesc, BufferKey, GraphicsContext, GraphicsDevice, MemoryUsage};
pub use error::{ContextError, DeviceError, TasksError};
pub use registry::{DEFAULT_REGISTRY_CAPACITY, Sweep, TaskKey, TaskRegistry};
pub use sync::{DEFAULT_INITIAL_SYNC_POINT, SyncCounter, SyncPoint};
pub use task::{DEFAULT_SYNC_LATENCY, ExecutionContext, GpuTask, TaskCore, TaskState};

