use thiserror::Error;

use crate::device::BufferKey;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Device can't create a dedicated graphics context")]
    NoDedicatedContext,
    #[error("Buffer can't have a size of 0")]
    ZeroSizedBuffer,
    #[error("Buffer {0:?} does not exist (anymore)")]
    UnknownBuffer(BufferKey),
    #[error("Buffer {0:?} can't be read by the cpu. Therefore it can't be mapped.")]
    BufferNotCpuReadable(BufferKey),
    #[error("Access of {size} bytes at offset {offset} exceeds buffer of {capacity} bytes")]
    OutOfRange { offset: u64, size: u64, capacity: u64 },
    #[error("Other error: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Buffer {0:?} is not known to the context's device")]
    UnknownBuffer(BufferKey),
    #[error("Command accesses {size} bytes at offset {offset}, but buffer only has {capacity} bytes")]
    OutOfRange { offset: u64, size: u64, capacity: u64 },
    #[error("Source and destination of a copy can't be the same buffer")]
    OverlappingCopy,
    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),
}

///Top level error of the scheduler. Note that task failures are never reported through this type, those are the task's
/// own concern.
#[derive(Error, Debug)]
pub enum TasksError {
    #[error("Failed to acquire graphics context: {0}")]
    ContextCreation(#[from] DeviceError),
}
