use gputask::{BufferCopy, BufferDesc, BufferKey, ContextError, DeviceError};
use slotmap::SlotMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub(crate) struct Allocation {
    pub desc: BufferDesc,
    pub data: Vec<u8>,
}

///All buffers of a device.
#[derive(Default)]
pub(crate) struct Memory {
    buffers: SlotMap<BufferKey, Allocation>,
}

///Locks `mutex`, ignoring poisoning. The protected state stays consistent since no operation panics halfway through a mutation.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_range(offset: u64, size: u64, capacity: u64) -> Result<(), (u64, u64, u64)> {
    match offset.checked_add(size) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err((offset, size, capacity)),
    }
}

impl Memory {
    pub fn allocate(&mut self, desc: BufferDesc) -> Result<BufferKey, DeviceError> {
        if desc.size == 0 {
            return Err(DeviceError::ZeroSizedBuffer);
        }
        Ok(self.buffers.insert(Allocation {
            desc,
            data: vec![0; desc.size as usize],
        }))
    }

    pub fn free(&mut self, key: BufferKey) -> bool {
        self.buffers.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn desc(&self, key: BufferKey) -> Option<BufferDesc> {
        self.buffers.get(key).map(|a| a.desc)
    }

    ///Checks that `size` bytes at `offset` are inside `key`.
    pub fn validate(&self, key: BufferKey, offset: u64, size: u64) -> Result<(), ContextError> {
        let alloc = self
            .buffers
            .get(key)
            .ok_or(ContextError::UnknownBuffer(key))?;
        check_range(offset, size, alloc.desc.size).map_err(|(offset, size, capacity)| {
            ContextError::OutOfRange {
                offset,
                size,
                capacity,
            }
        })
    }

    pub fn write(&mut self, key: BufferKey, offset: u64, data: &[u8]) -> Result<(), ContextError> {
        self.validate(key, offset, data.len() as u64)?;
        let alloc = self
            .buffers
            .get_mut(key)
            .ok_or(ContextError::UnknownBuffer(key))?;
        let start = offset as usize;
        alloc.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn copy(
        &mut self,
        src: BufferKey,
        dst: BufferKey,
        region: BufferCopy,
    ) -> Result<(), ContextError> {
        if src == dst {
            return Err(ContextError::OverlappingCopy);
        }
        self.validate(src, region.src_offset, region.size)?;
        self.validate(dst, region.dst_offset, region.size)?;

        let Some([src, dst]) = self.buffers.get_disjoint_mut([src, dst]) else {
            return Err(ContextError::OverlappingCopy);
        };
        let size = region.size as usize;
        let src_start = region.src_offset as usize;
        let dst_start = region.dst_offset as usize;
        dst.data[dst_start..dst_start + size]
            .copy_from_slice(&src.data[src_start..src_start + size]);
        Ok(())
    }

    ///Host read. Only allowed on cpu readable memory.
    pub fn read(&self, key: BufferKey, offset: u64, dst: &mut [u8]) -> Result<(), DeviceError> {
        let alloc = self.buffers.get(key).ok_or(DeviceError::UnknownBuffer(key))?;
        if !alloc.desc.usage.is_cpu_readable() {
            return Err(DeviceError::BufferNotCpuReadable(key));
        }
        check_range(offset, dst.len() as u64, alloc.desc.size).map_err(
            |(offset, size, capacity)| DeviceError::OutOfRange {
                offset,
                size,
                capacity,
            },
        )?;
        let start = offset as usize;
        dst.copy_from_slice(&alloc.data[start..start + dst.len()]);
        Ok(())
    }
}
