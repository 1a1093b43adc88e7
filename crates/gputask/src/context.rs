use crate::{
    config::{ContextMode, TasksConfig},
    device::{GraphicsContext, GraphicsDevice},
    error::{DeviceError, TasksError},
    registry::TaskRegistry,
    sync::{SyncCounter, SyncPoint},
    task::{ExecutionContext, GpuTask, TaskState},
};
use std::{
    sync::Arc,
    thread::{self, ThreadId},
};

///The graphics context tasks are executed on. Resolved once when the [TasksContext] is created.
pub(crate) enum ContextBinding {
    ///Borrowed main context of the device. Frame bracketing belongs to the device's owner.
    Shared(Arc<dyn GraphicsContext>),
    ///Private context, bracketed by the scheduler.
    Dedicated(Box<dyn GraphicsContext>),
}

impl ContextBinding {
    fn acquire(device: &dyn GraphicsDevice, mode: ContextMode) -> Result<Self, DeviceError> {
        match mode {
            ContextMode::Shared => Ok(ContextBinding::Shared(device.main_context())),
            ContextMode::Dedicated => Ok(ContextBinding::Dedicated(device.create_context(true)?)),
        }
    }

    fn gpu(&self) -> &dyn GraphicsContext {
        match self {
            ContextBinding::Shared(ctx) => ctx.as_ref(),
            ContextBinding::Dedicated(ctx) => ctx.as_ref(),
        }
    }

    fn mode(&self) -> ContextMode {
        match self {
            ContextBinding::Shared(_) => ContextMode::Shared,
            ContextBinding::Dedicated(_) => ContextMode::Dedicated,
        }
    }

    fn frame_begin(&self) {
        if let ContextBinding::Dedicated(ctx) = self {
            ctx.frame_begin();
        }
    }

    fn frame_end(&self) {
        if let ContextBinding::Dedicated(ctx) = self {
            ctx.frame_end();
        }
    }
}

///Counters over the lifetime of a [TasksContext].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    ///Tasks that where admitted and executed.
    pub executed: u64,
    ///Tasks that where retired as finished.
    pub finished: u64,
    ///Tasks that where cancelled before their sync, either by themselves, by their owner or at teardown.
    pub cancelled: u64,
}

///Schedules [GpuTask]s.
///
/// Tasks are executed as soon as they are [run](Self::run). Since the GPU executes the recorded work asynchronously, the task is kept
/// in flight until the frame counter reaches the task's sync point. Each [on_frame_begin](Self::on_frame_begin) advances the counter by one
/// and retires all tasks that could be synced.
///
/// The context is bound to the thread it was created on. Dropping it cancels all tasks that are still in flight.
pub struct TasksContext {
    binding: ContextBinding,
    counter: SyncCounter,
    registry: TaskRegistry,
    stats: TaskStats,
    owner: ThreadId,
}

impl TasksContext {
    ///Creates the context with the default [TasksConfig].
    pub fn new(device: &dyn GraphicsDevice) -> Result<Self, TasksError> {
        Self::with_config(device, TasksConfig::default())
    }

    pub fn with_config(device: &dyn GraphicsDevice, config: TasksConfig) -> Result<Self, TasksError> {
        let binding = ContextBinding::acquire(device, config.mode)?;

        #[cfg(feature = "logging")]
        log::info!(
            "Created tasks context on {:?} graphics context \"{}\", starting at {}",
            config.mode,
            binding.gpu().name(),
            config.initial_sync_point
        );

        Ok(TasksContext {
            binding,
            counter: SyncCounter::new(config.initial_sync_point),
            registry: TaskRegistry::with_capacity(config.registry_capacity),
            stats: TaskStats::default(),
            owner: thread::current().id(),
        })
    }

    ///Admits `task` and executes it right away.
    ///
    /// Failures while executing are the task's concern. If the task cancels its synchronisation while executing, it is dropped
    /// from the context immediately.
    ///
    /// # Panics
    ///
    /// If the task is still active in this context.
    pub fn run(&mut self, task: Arc<dyn GpuTask>) {
        debug_assert!(self.is_owner_thread(), "Tasks must be run on the owning thread");

        //entry of a task that was cancelled and reset before the next sweep
        if self.registry.contains(&task) && task.state() != TaskState::Active {
            self.on_cancel_sync(&task);
        }
        self.registry.push(task.clone());

        let mut cx = ExecutionContext::new(self.binding.gpu(), self.counter.current());
        task.execute(&mut cx);
        let cancel = cx.is_cancel_requested();
        self.stats.executed += 1;

        if cancel {
            self.on_cancel_sync(&task);
        }
    }

    ///Moves forward one frame and retires every task whose sync point was reached.
    pub fn on_frame_begin(&mut self) {
        debug_assert!(self.is_owner_thread(), "Frames must be advanced on the owning thread");

        self.binding.frame_begin();

        let current = self.counter.advance();
        let swept = self.registry.sweep(current);
        self.stats.finished += swept.finished as u64;
        self.stats.cancelled += swept.cancelled as u64;

        #[cfg(feature = "logging")]
        if swept.removed() > 0 {
            log::trace!(
                "{}: retired {} tasks, dropped {} cancelled, {} in flight",
                current,
                swept.finished,
                swept.cancelled,
                self.registry.len()
            );
        }
    }

    ///Ends the frame. Submits the frame's work if the context is dedicated, does nothing otherwise.
    pub fn on_frame_end(&mut self) {
        self.binding.frame_end();
    }

    ///Called by a task that abandons its pending synchronisation. Does nothing if the task is not in flight (anymore).
    pub fn on_cancel_sync<T: GpuTask + ?Sized>(&mut self, task: &Arc<T>) {
        if self.registry.remove(task).is_some() {
            self.stats.cancelled += 1;
            #[cfg(feature = "logging")]
            log::warn!("{} has been canceled before a sync", task);
        } else {
            #[cfg(feature = "logging")]
            log::debug!("{} cancelled its sync, but was not in flight", task);
        }
    }

    ///Cancels an in-flight task and removes it from the context. Returns false if the task was not in flight, or is not active
    /// anymore. Finished tasks are left to the next frame's sweep.
    pub fn cancel<T: GpuTask + ?Sized>(&mut self, task: &Arc<T>) -> bool {
        if !self.registry.contains(task) || task.state() != TaskState::Active {
            return false;
        }
        task.cancel_sync();
        self.on_cancel_sync(task);
        true
    }

    pub fn current_sync_point(&self) -> SyncPoint {
        self.counter.current()
    }

    ///The graphics context tasks are executed on.
    pub fn gpu(&self) -> &dyn GraphicsContext {
        self.binding.gpu()
    }

    pub fn mode(&self) -> ContextMode {
        self.binding.mode()
    }

    ///Number of tasks in flight.
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_pending<T: ?Sized>(&self, task: &Arc<T>) -> bool {
        self.registry.contains(task)
    }

    ///Number of tasks that where retired as finished.
    pub fn total_tasks_done(&self) -> u64 {
        self.stats.finished
    }

    pub fn stats(&self) -> TaskStats {
        self.stats
    }

    fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }
}

impl Drop for TasksContext {
    fn drop(&mut self) {
        assert!(
            self.is_owner_thread(),
            "TasksContext must be destroyed on the thread that created it"
        );

        let tasks = self.registry.take_all();
        for task in tasks {
            #[cfg(feature = "logging")]
            log::warn!("{} has been canceled before a sync", task);
            if !matches!(task.state(), TaskState::Cancelled | TaskState::Failed) {
                task.cancel_sync();
            }
            self.stats.cancelled += 1;
        }

        #[cfg(feature = "logging")]
        log::info!(
            "Tasks context shut down at {}: {} executed, {} finished, {} cancelled",
            self.counter.current(),
            self.stats.executed,
            self.stats.finished,
            self.stats.cancelled
        );
    }
}
