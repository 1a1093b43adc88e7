use crate::{device::GraphicsContext, sync::SyncPoint};
use std::{
    fmt::Display,
    sync::atomic::{AtomicU64, AtomicU8, Ordering},
};

///Number of frames a task's GPU work needs until it is considered visible, if not configured otherwise.
pub const DEFAULT_SYNC_LATENCY: u64 = 2;

///Lifecycle of a task. The scheduler only ever looks for [TaskState::Active] and [TaskState::Finished], the rest belongs to
/// the task's own state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    ///Not yet admitted, or reset for resubmission.
    Created = 0,
    ///Executed, waiting for its sync point.
    Active = 1,
    Finished = 2,
    Cancelled = 3,
    Failed = 4,
}

impl TaskState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => TaskState::Created,
            1 => TaskState::Active,
            2 => TaskState::Finished,
            3 => TaskState::Cancelled,
            _ => TaskState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Finished | TaskState::Cancelled | TaskState::Failed
        )
    }
}

impl Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

///What a task sees while being executed.
pub struct ExecutionContext<'a> {
    gpu: &'a dyn GraphicsContext,
    current: SyncPoint,
    cancel_requested: bool,
}

impl<'a> ExecutionContext<'a> {
    ///Creates an execution context for `gpu` at the frame `current`. Usually only done by the
    /// [TasksContext](crate::TasksContext).
    pub fn new(gpu: &'a dyn GraphicsContext, current: SyncPoint) -> Self {
        ExecutionContext {
            gpu,
            current,
            cancel_requested: false,
        }
    }

    ///The context GPU work has to be recorded into.
    pub fn gpu(&self) -> &'a dyn GraphicsContext {
        self.gpu
    }

    pub fn current_sync_point(&self) -> SyncPoint {
        self.current
    }

    ///Abandons synchronisation of the executing task. The scheduler drops the task once `execute` returned.
    pub fn cancel_sync(&mut self) {
        self.cancel_requested = true;
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested
    }
}

///A unit of asynchronous GPU work.
///
/// Tasks are shared via `Arc<dyn GpuTask>`. The originator keeps its handle, the scheduler only holds a clone while the task
/// is in flight. `Display` is used as the task's identity in diagnostics.
///
/// Most implementations embed a [TaskCore] and forward everything apart from `execute` to it.
pub trait GpuTask: Display {
    ///Records the task's GPU work into the context's graphics context.
    fn execute(&self, cx: &mut ExecutionContext<'_>);

    ///Sync point at which the GPU work is guaranteed to be finished.
    fn sync_point(&self) -> SyncPoint;

    fn state(&self) -> TaskState;

    ///Finalizes the task. Called once the frame counter reached [sync_point](Self::sync_point). Should move the task to
    /// [TaskState::Finished].
    fn sync(&self);

    ///Abandons pending synchronisation.
    fn cancel_sync(&self);
}

///Reusable task state machine.
///
/// ```text
/// Created -> Active -> Finished
///                   -> Cancelled
///                   -> Failed
/// ```
///
/// Terminal states can be [reset](Self::reset) to resubmit a task.
#[derive(Debug)]
pub struct TaskCore {
    name: String,
    latency: u64,
    state: AtomicU8,
    sync_point: AtomicU64,
}

impl TaskCore {
    pub fn new(name: impl Into<String>) -> Self {
        TaskCore {
            name: name.into(),
            latency: DEFAULT_SYNC_LATENCY,
            state: AtomicU8::new(TaskState::Created as u8),
            sync_point: AtomicU64::new(SyncPoint::ZERO.value()),
        }
    }

    ///Sets the number of frames the GPU work needs to become visible.
    pub fn with_latency(mut self, frames: u64) -> Self {
        self.set_latency(frames);
        self
    }

    ///Sets the number of frames between execution and sync. Applies to the next execution.
    pub fn set_latency(&mut self, frames: u64) {
        self.latency = frames;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latency(&self) -> u64 {
        self.latency
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn sync_point(&self) -> SyncPoint {
        SyncPoint(self.sync_point.load(Ordering::Acquire))
    }

    fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }

    ///Moves the task into the active state and runs `run` against the execution context's graphics context.
    ///
    /// On success the sync point is set `latency` frames after the current one. If `run` fails, the error is logged, the
    /// task is marked [TaskState::Failed] and synchronisation is cancelled.
    ///
    /// # Panics
    ///
    /// If the task is still in flight.
    pub fn execute<E: Display>(
        &self,
        cx: &mut ExecutionContext<'_>,
        run: impl FnOnce(&dyn GraphicsContext) -> Result<(), E>,
    ) {
        assert!(
            self.state() != TaskState::Active,
            "{} executed while still in flight",
            self.name
        );

        self.set_state(TaskState::Active);
        match run(cx.gpu()) {
            Ok(()) => {
                let target = cx.current_sync_point().after(self.latency);
                self.sync_point.store(target.value(), Ordering::Release);
            }
            #[allow(unused_variables)]
            Err(e) => {
                #[cfg(feature = "logging")]
                log::error!("{} failed to execute: {}", self.name, e);
                self.set_state(TaskState::Failed);
                cx.cancel_sync();
            }
        }
    }

    ///Runs `on_sync` and finishes the task. Does nothing if the task is not active.
    pub fn sync(&self, on_sync: impl FnOnce()) {
        if self.state() != TaskState::Active {
            return;
        }
        on_sync();
        self.set_state(TaskState::Finished);
    }

    ///Cancels an active task. Returns false if the task was not active.
    pub fn cancel_sync(&self) -> bool {
        self.state
            .compare_exchange(
                TaskState::Active as u8,
                TaskState::Cancelled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    ///Resets a terminal task so it can be resubmitted. Returns false if the task is still in flight.
    pub fn reset(&self) -> bool {
        if self.state() == TaskState::Active {
            return false;
        }
        self.sync_point
            .store(SyncPoint::ZERO.value(), Ordering::Release);
        self.set_state(TaskState::Created);
        true
    }
}

impl Display for TaskCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
