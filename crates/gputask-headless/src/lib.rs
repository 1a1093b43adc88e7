//! # Headless device
//!
//! Implements [GraphicsDevice] and [GraphicsContext] on host memory. Useful for tests, tooling and for running
//! task based code without a GPU.
//!
//! Buffers are plain byte vectors. Contexts record commands and apply them when their frame ends, so the usual frame latency of a real
//! device is kept: a readback only observes an upload once the frame the upload was recorded in has been submitted.
//!
//! The device's main context is shared. Its frames are bracketed by the owner of the device through [HeadlessDevice::main].

mod context;
mod memory;

pub use context::HeadlessContext;

use gputask::{BufferDesc, BufferKey, DeviceError, GraphicsContext, GraphicsDevice};
use memory::{Memory, lock};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

pub struct HeadlessDevice {
    memory: Arc<Mutex<Memory>>,
    main: Arc<HeadlessContext>,
    created_contexts: AtomicUsize,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        let memory = Arc::new(Mutex::new(Memory::default()));
        HeadlessDevice {
            main: Arc::new(HeadlessContext::new("main", memory.clone())),
            memory,
            created_contexts: AtomicUsize::new(0),
        }
    }

    ///The device's main context.
    pub fn main(&self) -> &Arc<HeadlessContext> {
        &self.main
    }

    ///Creates a context with concrete type. Same as [create_context](GraphicsDevice::create_context).
    pub fn create_headless_context(&self) -> HeadlessContext {
        let idx = self.created_contexts.fetch_add(1, Ordering::AcqRel);
        HeadlessContext::new(format!("headless-{}", idx), self.memory.clone())
    }

    ///Number of live buffers.
    pub fn buffer_count(&self) -> usize {
        lock(&self.memory).len()
    }

    pub fn buffer_desc(&self, buffer: BufferKey) -> Option<BufferDesc> {
        lock(&self.memory).desc(buffer)
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn main_context(&self) -> Arc<dyn GraphicsContext> {
        self.main.clone()
    }

    fn create_context(&self, _dedicated: bool) -> Result<Box<dyn GraphicsContext>, DeviceError> {
        Ok(Box::new(self.create_headless_context()))
    }

    fn create_buffer(&self, desc: BufferDesc) -> Result<BufferKey, DeviceError> {
        lock(&self.memory).allocate(desc)
    }

    fn destroy_buffer(&self, buffer: BufferKey) {
        if !lock(&self.memory).free(buffer) {
            #[cfg(feature = "logging")]
            log::warn!("Tried to destroy unknown buffer {:?}", buffer);
        }
    }

    fn read_buffer(&self, buffer: BufferKey, offset: u64, dst: &mut [u8]) -> Result<(), DeviceError> {
        lock(&self.memory).read(buffer, offset, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gputask::{BufferCopy, ContextError, MemoryUsage};
    use static_assertions::assert_impl_all;

    #[test]
    fn impl_send_sync() {
        assert_impl_all!(HeadlessDevice: Send, Sync);
        assert_impl_all!(HeadlessContext: Send, Sync);
    }

    #[test]
    fn writes_become_visible_at_frame_end() {
        let device = HeadlessDevice::new();
        let buffer = device
            .create_buffer(BufferDesc::readback::<u8>(4))
            .unwrap();

        device.main().frame_begin();
        device.main().write_buffer(buffer, 0, &[1, 2, 3, 4]).unwrap();
        assert_eq!(device.main().pending_commands(), 1);

        let mut dst = [0u8; 4];
        device.read_buffer(buffer, 0, &mut dst).unwrap();
        assert_eq!(dst, [0; 4]);

        device.main().frame_end();
        device.read_buffer(buffer, 0, &mut dst).unwrap();
        assert_eq!(dst, [1, 2, 3, 4]);
        assert_eq!(device.main().submitted_commands(), 1);
    }

    #[test]
    fn copy_between_buffers() {
        let device = HeadlessDevice::new();
        let src = device.create_buffer(BufferDesc::gpu_only::<u8>(8)).unwrap();
        let dst = device.create_buffer(BufferDesc::readback::<u8>(4)).unwrap();

        let ctx = device.create_context(true).unwrap();
        ctx.frame_begin();
        ctx.write_buffer(src, 0, &[0, 1, 2, 3, 4, 5, 6, 7]).unwrap();
        ctx.copy_buffer(
            src,
            dst,
            BufferCopy {
                src_offset: 4,
                dst_offset: 0,
                size: 4,
            },
        )
        .unwrap();
        ctx.frame_end();

        let mut out = [0u8; 4];
        device.read_buffer(dst, 0, &mut out).unwrap();
        assert_eq!(out, [4, 5, 6, 7]);
    }

    #[test]
    fn validation() {
        let device = HeadlessDevice::new();
        let buffer = device.create_buffer(BufferDesc::gpu_only::<u8>(4)).unwrap();

        assert!(matches!(
            device.main().write_buffer(buffer, 2, &[0; 4]),
            Err(ContextError::OutOfRange { .. })
        ));
        assert!(matches!(
            device
                .main()
                .copy_buffer(buffer, buffer, BufferCopy::whole(4)),
            Err(ContextError::OverlappingCopy)
        ));
        assert!(matches!(
            device.read_buffer(buffer, 0, &mut [0; 4]),
            Err(DeviceError::BufferNotCpuReadable(_))
        ));
        assert!(matches!(
            device.create_buffer(BufferDesc {
                size: 0,
                usage: MemoryUsage::GpuOnly
            }),
            Err(DeviceError::ZeroSizedBuffer)
        ));

        device.destroy_buffer(buffer);
        assert_eq!(device.buffer_count(), 0);
        assert!(matches!(
            device.main().write_buffer(buffer, 0, &[0; 4]),
            Err(ContextError::UnknownBuffer(_))
        ));
    }

    #[test]
    fn destroyed_before_submit_is_dropped() {
        let device = HeadlessDevice::new();
        let buffer = device.create_buffer(BufferDesc::gpu_only::<u8>(4)).unwrap();
        device.main().write_buffer(buffer, 0, &[1; 4]).unwrap();
        device.destroy_buffer(buffer);

        device.main().submit();
        assert_eq!(device.main().submitted_commands(), 0);
        assert_eq!(device.main().pending_commands(), 0);
    }

    #[test]
    fn contexts_get_unique_names() {
        let device = HeadlessDevice::new();
        let a = device.create_context(true).unwrap();
        let b = device.create_context(true).unwrap();
        assert_ne!(a.name(), b.name());
        assert_eq!(device.main().name(), "main");
    }
}
