//! # Device and context capabilities
//!
//! The scheduler does not talk to a graphics API directly. Instead it consumes two capabilities:
//!
//! - [GraphicsDevice]: owns resources and hands out [GraphicsContext]s. Either the device's main context (shared), or a private one (dedicated).
//! - [GraphicsContext]: a command stream tasks record their GPU work into.
//!
//! Both are handles, all functions take `&self`. Implementations are responsible for their own interior synchronisation.

use crate::error::{ContextError, DeviceError};
use slotmap::new_key_type;
use std::sync::Arc;

new_key_type! {
    ///Handle to a buffer allocated through a [GraphicsDevice].
    pub struct BufferKey;
}

///Where a buffer's memory lives and who is allowed to touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryUsage {
    ///Device local memory, only accessible through commands.
    GpuOnly,
    ///Host visible memory that is written by the cpu and read by the gpu. Usually staging memory.
    CpuToGpu,
    ///Host visible memory written by the gpu and read back by the cpu.
    GpuToCpu,
}

impl MemoryUsage {
    pub fn is_cpu_readable(&self) -> bool {
        matches!(self, MemoryUsage::GpuToCpu)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    ///Size in bytes.
    pub size: u64,
    pub usage: MemoryUsage,
}

impl BufferDesc {
    ///Device local buffer that can hold `count` times `T`.
    pub fn gpu_only<T>(count: usize) -> Self {
        BufferDesc {
            size: (core::mem::size_of::<T>() * count) as u64,
            usage: MemoryUsage::GpuOnly,
        }
    }

    ///Readback buffer that can hold `count` times `T`.
    pub fn readback<T>(count: usize) -> Self {
        BufferDesc {
            size: (core::mem::size_of::<T>() * count) as u64,
            usage: MemoryUsage::GpuToCpu,
        }
    }

    pub fn with_usage(mut self, usage: MemoryUsage) -> Self {
        self.usage = usage;
        self
    }
}

///Region of a buffer to buffer copy. All values in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferCopy {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

impl BufferCopy {
    ///Copies `size` bytes from the start of the source to the start of the destination.
    pub fn whole(size: u64) -> Self {
        BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size,
        }
    }
}

///Command stream GPU work is recorded into. Execution on the device is asynchronous, effects are only guaranteed to be visible
/// after the frame the command was recorded in has finished on the device.
pub trait GraphicsContext {
    ///Debug name of the context.
    fn name(&self) -> &str;

    ///Opens a frame on this context. Only called by owners of the context.
    fn frame_begin(&self);

    ///Closes the frame and submits all recorded work.
    fn frame_end(&self);

    ///Records an update of `dst` at `offset` with `data`.
    fn write_buffer(&self, dst: BufferKey, offset: u64, data: &[u8]) -> Result<(), ContextError>;

    ///Records a copy from `src` to `dst`.
    fn copy_buffer(
        &self,
        src: BufferKey,
        dst: BufferKey,
        region: BufferCopy,
    ) -> Result<(), ContextError>;
}

///The device the scheduler executes its work on.
pub trait GraphicsDevice {
    ///Returns the device's main context. The context is shared with the rest of the renderer, users must not bracket frames on it.
    fn main_context(&self) -> Arc<dyn GraphicsContext>;

    ///Creates a new context. If `dedicated` is set, the context is not shared with any other user and the caller
    /// owns its frame bracketing.
    fn create_context(&self, dedicated: bool) -> Result<Box<dyn GraphicsContext>, DeviceError>;

    fn create_buffer(&self, desc: BufferDesc) -> Result<BufferKey, DeviceError>;

    ///Destroys the buffer. Destroying an unknown buffer is a no-op.
    fn destroy_buffer(&self, buffer: BufferKey);

    ///Maps `buffer` and copies `dst.len()` bytes starting at `offset` into `dst`. Only possible on [MemoryUsage::GpuToCpu] buffers.
    fn read_buffer(&self, buffer: BufferKey, offset: u64, dst: &mut [u8]) -> Result<(), DeviceError>;
}
