use gputask::{
    ContextError, ExecutionContext, GpuTask, GraphicsContext, SyncPoint, TaskCore, TaskState,
};
use std::{cell::RefCell, fmt::Display};

type Record = Box<dyn Fn(&dyn GraphicsContext) -> Result<(), ContextError>>;
type OnSync = Box<dyn FnMut()>;

///Task that records whatever commands the user supplied closure generates.
///
/// An optional callback is invoked once the commands are guaranteed to be executed.
pub struct GenerateCommands {
    core: TaskCore,
    record: Record,
    on_sync: RefCell<Option<OnSync>>,
}

impl GenerateCommands {
    pub fn new(
        name: impl Into<String>,
        record: impl Fn(&dyn GraphicsContext) -> Result<(), ContextError> + 'static,
    ) -> Self {
        GenerateCommands {
            core: TaskCore::new(name),
            record: Box::new(record),
            on_sync: RefCell::new(None),
        }
    }

    ///Sets a callback that is invoked when the task is synced.
    pub fn on_sync(self, callback: impl FnMut() + 'static) -> Self {
        *self.on_sync.borrow_mut() = Some(Box::new(callback));
        self
    }

    pub fn with_latency(mut self, frames: u64) -> Self {
        self.core.set_latency(frames);
        self
    }

    ///Makes the task submittable again. Returns false if it is still in flight.
    pub fn reset(&self) -> bool {
        self.core.reset()
    }
}

impl Display for GenerateCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.core)
    }
}

impl GpuTask for GenerateCommands {
    fn execute(&self, cx: &mut ExecutionContext<'_>) {
        self.core.execute(cx, |gpu| (self.record)(gpu));
    }

    fn sync_point(&self) -> SyncPoint {
        self.core.sync_point()
    }

    fn state(&self) -> TaskState {
        self.core.state()
    }

    fn sync(&self) {
        self.core.sync(|| {
            if let Some(callback) = self.on_sync.borrow_mut().as_mut() {
                callback();
            }
        });
    }

    fn cancel_sync(&self) {
        self.core.cancel_sync();
    }
}
