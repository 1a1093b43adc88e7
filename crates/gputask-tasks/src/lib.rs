//! # Tasks
//!
//! Collects a number of tasks that are useful in most GPU applications.
//!
//! All tasks embed a [TaskCore](gputask::TaskCore) and are run through a [TasksContext](gputask::TasksContext). They are shared
//! as `Arc`s, so the originator can keep its handle to access results once the task finished.
#![deny(warnings)]

use gputask::{ContextError, DeviceError};
use std::fmt::Display;
use thiserror::Error;

mod copy_buffer;
pub use copy_buffer::CopyBuffer;
mod download_buffer;
pub use download_buffer::{DownloadBuffer, DownloadError};
mod generate_commands;
pub use generate_commands::GenerateCommands;
mod upload_buffer;
pub use upload_buffer::UploadBuffer;

#[derive(Error, Debug)]
pub struct NoTaskError;

impl Display for NoTaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NoError")
    }
}

///Typedef for a error that has no task specific version.
pub type GpuTaskError = TaskError<NoTaskError>;

///Allows you to specify from which part of either your task, the device or the graphics context an error originated.
#[derive(Error, Debug)]
pub enum TaskError<TaskErr: std::error::Error> {
    #[error("Task Error: {0}")]
    Task(TaskErr),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Graphics context error: {0}")]
    Context(#[from] ContextError),
}
