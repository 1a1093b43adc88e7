use crate::TaskError;
use gputask::{
    BufferCopy, BufferDesc, BufferKey, ExecutionContext, GpuTask, GraphicsDevice, SyncPoint,
    TaskCore, TaskState,
};
use std::{cell::RefCell, fmt::Display, sync::Arc};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DownloadError {
    #[error("Task was not synced yet, the download is not available.")]
    NotSynced,
    #[error("Reading back the download failed: {0}")]
    ReadbackFailed(String),
}

enum Readback<T> {
    Pending,
    Ready(Vec<T>),
    Failed(String),
}

///Downloads some GPU resident buffer into CPU accessible memory.
///
/// Once the task is synced, the data is read back and available through [Self::download] or [Self::data]. Note that you can
/// [reset](Self::reset) and resubmit the task if you want to update the cpu side copy. The readback buffer is destroyed when the task is dropped.
pub struct DownloadBuffer<T: bytemuck::Pod> {
    core: TaskCore,
    device: Arc<dyn GraphicsDevice>,
    gpu_buffer: BufferKey,
    cpu_access: BufferKey,
    count: usize,
    readback: RefCell<Readback<T>>,
}

impl<T: bytemuck::Pod> DownloadBuffer<T> {
    ///Downloads the first `count` elements of `buffer`.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        buffer: BufferKey,
        count: usize,
    ) -> Result<Self, TaskError<DownloadError>> {
        let cpu_access = device.create_buffer(BufferDesc::readback::<T>(count))?;
        Ok(DownloadBuffer {
            core: TaskCore::new("DownloadBuffer"),
            device,
            gpu_buffer: buffer,
            cpu_access,
            count,
            readback: RefCell::new(Readback::Pending),
        })
    }

    pub fn with_latency(mut self, frames: u64) -> Self {
        self.core.set_latency(frames);
        self
    }

    ///Copies the downloaded elements into `dst`.
    ///
    /// If successful, returns the number of elements that were copied.
    pub fn download(&self, dst: &mut [T]) -> Result<usize, TaskError<DownloadError>> {
        match &*self.readback.borrow() {
            Readback::Ready(data) => {
                let size = data.len().min(dst.len());
                dst[0..size].copy_from_slice(&data[0..size]);
                Ok(size)
            }
            Readback::Pending => Err(TaskError::Task(DownloadError::NotSynced)),
            Readback::Failed(e) => Err(TaskError::Task(DownloadError::ReadbackFailed(e.clone()))),
        }
    }

    ///Returns the downloaded elements, if the task was synced.
    pub fn data(&self) -> Option<Vec<T>> {
        match &*self.readback.borrow() {
            Readback::Ready(data) => Some(data.clone()),
            _ => None,
        }
    }

    ///Makes the task submittable again. Returns false if it is still in flight.
    pub fn reset(&self) -> bool {
        if !self.core.reset() {
            return false;
        }
        *self.readback.borrow_mut() = Readback::Pending;
        true
    }

    fn read_back(&self) {
        let mut data = vec![T::zeroed(); self.count];
        let res = self
            .device
            .read_buffer(self.cpu_access, 0, bytemuck::cast_slice_mut(&mut data));

        *self.readback.borrow_mut() = match res {
            Ok(()) => Readback::Ready(data),
            Err(e) => {
                #[cfg(feature = "logging")]
                log::error!("{} failed to read back: {}", self.core, e);
                Readback::Failed(e.to_string())
            }
        };
    }
}

impl<T: bytemuck::Pod> Display for DownloadBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({} elements)", self.core, self.count)
    }
}

impl<T: bytemuck::Pod> GpuTask for DownloadBuffer<T> {
    fn execute(&self, cx: &mut ExecutionContext<'_>) {
        let size = (core::mem::size_of::<T>() * self.count) as u64;
        self.core.execute(cx, |gpu| {
            gpu.copy_buffer(self.gpu_buffer, self.cpu_access, BufferCopy::whole(size))
        });
    }

    fn sync_point(&self) -> SyncPoint {
        self.core.sync_point()
    }

    fn state(&self) -> TaskState {
        self.core.state()
    }

    fn sync(&self) {
        self.core.sync(|| self.read_back());
    }

    fn cancel_sync(&self) {
        self.core.cancel_sync();
    }
}

impl<T: bytemuck::Pod> Drop for DownloadBuffer<T> {
    fn drop(&mut self) {
        self.device.destroy_buffer(self.cpu_access);
    }
}
