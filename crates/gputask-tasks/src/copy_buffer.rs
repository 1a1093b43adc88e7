use gputask::{BufferCopy, BufferKey, ExecutionContext, GpuTask, SyncPoint, TaskCore, TaskState};
use std::fmt::Display;

///Copies a region of one buffer into another.
pub struct CopyBuffer {
    core: TaskCore,
    pub src: BufferKey,
    pub dst: BufferKey,
    pub region: BufferCopy,
}

impl CopyBuffer {
    pub fn new(src: BufferKey, dst: BufferKey, region: BufferCopy) -> Self {
        CopyBuffer {
            core: TaskCore::new("CopyBuffer"),
            src,
            dst,
            region,
        }
    }

    pub fn with_latency(mut self, frames: u64) -> Self {
        self.core.set_latency(frames);
        self
    }

    pub fn is_copied(&self) -> bool {
        self.core.state() == TaskState::Finished
    }
}

impl Display for CopyBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({:?} -> {:?}, {} bytes)",
            self.core, self.src, self.dst, self.region.size
        )
    }
}

impl GpuTask for CopyBuffer {
    fn execute(&self, cx: &mut ExecutionContext<'_>) {
        self.core
            .execute(cx, |gpu| gpu.copy_buffer(self.src, self.dst, self.region));
    }

    fn sync_point(&self) -> SyncPoint {
        self.core.sync_point()
    }

    fn state(&self) -> TaskState {
        self.core.state()
    }

    fn sync(&self) {
        self.core.sync(|| {});
    }

    fn cancel_sync(&self) {
        self.core.cancel_sync();
    }
}
