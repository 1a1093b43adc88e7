use crate::GpuTaskError;
use gputask::{
    BufferDesc, BufferKey, ExecutionContext, GpuTask, GraphicsDevice, SyncPoint, TaskCore,
    TaskState,
};
use std::fmt::Display;

///Uploads a number of elements of type `T`.
///
/// Either creates a fitting device local buffer (`self.buffer`), or writes into an existing one. Note that the buffer's content is
/// undefined until the task finished.
pub struct UploadBuffer<T: bytemuck::Pod> {
    core: TaskCore,
    pub buffer: BufferKey,
    offset: u64,
    data: Vec<T>,
}

impl<T: bytemuck::Pod> UploadBuffer<T> {
    ///Creates a new device local buffer for the given data.
    pub fn new(device: &dyn GraphicsDevice, data: &[T]) -> Result<Self, GpuTaskError> {
        let buffer = device.create_buffer(BufferDesc::gpu_only::<T>(data.len()))?;
        Ok(Self::new_with_buffer(buffer, 0, data))
    }

    ///Uploads `data` to `buffer`, starting at `offset` bytes.
    pub fn new_with_buffer(buffer: BufferKey, offset: u64, data: &[T]) -> Self {
        UploadBuffer {
            core: TaskCore::new("BufferUpload"),
            buffer,
            offset,
            data: data.to_vec(),
        }
    }

    ///Overwrites the task's name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.core = TaskCore::new(name).with_latency(self.core.latency());
        self
    }

    pub fn with_latency(mut self, frames: u64) -> Self {
        self.core.set_latency(frames);
        self
    }

    ///Returns true once the uploaded data is visible on the device.
    pub fn is_uploaded(&self) -> bool {
        self.core.state() == TaskState::Finished
    }

    ///Makes the task submittable again. Returns false if it is still in flight.
    pub fn reset(&self) -> bool {
        self.core.reset()
    }
}

impl<T: bytemuck::Pod> Display for UploadBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({} bytes)", self.core, core::mem::size_of_val(self.data.as_slice()))
    }
}

impl<T: bytemuck::Pod> GpuTask for UploadBuffer<T> {
    fn execute(&self, cx: &mut ExecutionContext<'_>) {
        self.core.execute(cx, |gpu| {
            gpu.write_buffer(self.buffer, self.offset, bytemuck::cast_slice(&self.data))
        });
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
