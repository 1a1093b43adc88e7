//! Runs a small frame loop on the headless device. Every frame uploads a counter, every third frame the
//! counter buffer is read back. Readbacks arrive a few frames later, once their sync point was reached.

use anyhow::Result;
use gputask::{BufferDesc, GraphicsContext, GraphicsDevice, TasksContext};
use gputask_headless::HeadlessDevice;
use gputask_tasks::{DownloadBuffer, UploadBuffer};
use std::sync::Arc;

const FRAMES: u32 = 12;

fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Trace)
        .init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;

    let device = Arc::new(HeadlessDevice::new());
    let mut tasks = TasksContext::new(device.as_ref())?;
    log::info!(
        "Running {} frames on {:?} context \"{}\"",
        FRAMES,
        tasks.mode(),
        tasks.gpu().name()
    );

    let counter = device.create_buffer(BufferDesc::gpu_only::<u32>(1))?;
    let mut downloads = Vec::new();

    for frame in 0..FRAMES {
        device.main().frame_begin();
        tasks.on_frame_begin();

        let upload = Arc::new(
            UploadBuffer::new_with_buffer(counter, 0, &[frame]).with_name(format!("Counter{}", frame)),
        );
        tasks.run(upload);

        if frame % 3 == 0 {
            let download = Arc::new(DownloadBuffer::<u32>::new(device.clone(), counter, 1)?);
            tasks.run(download.clone());
            downloads.push((frame, download));
        }

        downloads.retain(|(issued, download)| match download.data() {
            Some(data) => {
                log::info!(
                    "Frame {}: readback issued in frame {} arrived: {:?}",
                    frame,
                    issued,
                    data
                );
                false
            }
            None => true,
        });

        tasks.on_frame_end();
        device.main().frame_end();
    }

    log::info!(
        "{} tasks done, {} still in flight at {}",
        tasks.total_tasks_done(),
        tasks.pending_count(),
        tasks.current_sync_point()
    );

    //dropping the context cancels everything still in flight
    drop(tasks);
    Ok(())
}
