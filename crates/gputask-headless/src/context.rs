use crate::memory::{Memory, lock};
use gputask::{BufferCopy, BufferKey, ContextError, GraphicsContext};
use smallvec::SmallVec;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

enum Command {
    Write {
        dst: BufferKey,
        offset: u64,
        data: Vec<u8>,
    },
    Copy {
        src: BufferKey,
        dst: BufferKey,
        region: BufferCopy,
    },
}

///Command stream on a [HeadlessDevice](crate::HeadlessDevice).
///
/// Commands are validated when recorded, but only applied to the device's memory once the frame ends (or the stream is
/// [submitted](Self::submit) explicitly). Until then, their effects are invisible, just like work that is still in flight on a real GPU.
pub struct HeadlessContext {
    name: String,
    memory: Arc<Mutex<Memory>>,
    stream: Mutex<SmallVec<[Command; 8]>>,
    frames_begun: AtomicU64,
    frames_ended: AtomicU64,
    submitted: AtomicU64,
}

impl HeadlessContext {
    pub(crate) fn new(name: impl Into<String>, memory: Arc<Mutex<Memory>>) -> Self {
        HeadlessContext {
            name: name.into(),
            memory,
            stream: Mutex::new(SmallVec::new()),
            frames_begun: AtomicU64::new(0),
            frames_ended: AtomicU64::new(0),
            submitted: AtomicU64::new(0),
        }
    }

    pub fn frames_begun(&self) -> u64 {
        self.frames_begun.load(Ordering::Acquire)
    }

    pub fn frames_ended(&self) -> u64 {
        self.frames_ended.load(Ordering::Acquire)
    }

    ///Number of recorded, but not yet submitted commands.
    pub fn pending_commands(&self) -> usize {
        lock(&self.stream).len()
    }

    ///Number of commands applied so far.
    pub fn submitted_commands(&self) -> u64 {
        self.submitted.load(Ordering::Acquire)
    }

    ///Applies all recorded commands to device memory.
    pub fn submit(&self) {
        let commands = std::mem::take(&mut *lock(&self.stream));
        if commands.is_empty() {
            return;
        }

        let mut memory = lock(&self.memory);
        for cmd in commands {
            let res = match cmd {
                Command::Write { dst, offset, data } => memory.write(dst, offset, &data),
                Command::Copy { src, dst, region } => memory.copy(src, dst, region),
            };
            match res {
                Ok(()) => {
                    self.submitted.fetch_add(1, Ordering::AcqRel);
                }
                //buffers might have been destroyed since recording
                #[allow(unused_variables)]
                Err(e) => {
                    #[cfg(feature = "logging")]
                    log::error!("{}: dropping command at submit: {}", self.name, e);
                }
            }
        }
    }
}

impl GraphicsContext for HeadlessContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn frame_begin(&self) {
        self.frames_begun.fetch_add(1, Ordering::AcqRel);
    }

    fn frame_end(&self) {
        let ended = self.frames_ended.fetch_add(1, Ordering::AcqRel) + 1;
        if ended > self.frames_begun() {
            #[cfg(feature = "logging")]
            log::error!(
                "{}: frame_end without matching frame_begin ({} ended, {} begun)",
                self.name,
                ended,
                self.frames_begun()
            );
        }
        self.submit();
    }

    fn write_buffer(&self, dst: BufferKey, offset: u64, data: &[u8]) -> Result<(), ContextError> {
        lock(&self.memory).validate(dst, offset, data.len() as u64)?;
        lock(&self.stream).push(Command::Write {
            dst,
            offset,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn copy_buffer(
        &self,
        src: BufferKey,
        dst: BufferKey,
        region: BufferCopy,
    ) -> Result<(), ContextError> {
        if src == dst {
            return Err(ContextError::OverlappingCopy);
        }
        {
            let memory = lock(&self.memory);
            memory.validate(src, region.src_offset, region.size)?;
            memory.validate(dst, region.dst_offset, region.size)?;
        }
        lock(&self.stream).push(Command::Copy { src, dst, region });
        Ok(())
    }
}
