//! Test doubles shared by the unit tests.

use crate::{
    device::{BufferCopy, BufferDesc, BufferKey, GraphicsContext, GraphicsDevice},
    error::{ContextError, DeviceError},
    sync::SyncPoint,
    task::{ExecutionContext, GpuTask, TaskState},
};
use std::{
    cell::Cell,
    fmt::Display,
    sync::{
        Arc, Mutex, Once,
        atomic::{AtomicUsize, Ordering},
    },
};

#[derive(Default, Debug)]
pub struct FrameCounters {
    pub begun: AtomicUsize,
    pub ended: AtomicUsize,
    pub writes: AtomicUsize,
}

impl FrameCounters {
    pub fn begun(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }
    pub fn ended(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

///Context that records nothing but counts calls.
#[derive(Default)]
pub struct NullContext {
    pub counters: Arc<FrameCounters>,
}

impl GraphicsContext for NullContext {
    fn name(&self) -> &str {
        "null"
    }
    fn frame_begin(&self) {
        self.counters.begun.fetch_add(1, Ordering::SeqCst);
    }
    fn frame_end(&self) {
        self.counters.ended.fetch_add(1, Ordering::SeqCst);
    }
    fn write_buffer(&self, _dst: BufferKey, _offset: u64, _data: &[u8]) -> Result<(), ContextError> {
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn copy_buffer(
        &self,
        _src: BufferKey,
        _dst: BufferKey,
        _region: BufferCopy,
    ) -> Result<(), ContextError> {
        Ok(())
    }
}

pub struct NullDevice {
    pub main: Arc<NullContext>,
    pub dedicated: Arc<FrameCounters>,
    pub allow_dedicated: bool,
}

impl Default for NullDevice {
    fn default() -> Self {
        NullDevice {
            main: Arc::new(NullContext::default()),
            dedicated: Arc::new(FrameCounters::default()),
            allow_dedicated: true,
        }
    }
}

impl GraphicsDevice for NullDevice {
    fn main_context(&self) -> Arc<dyn GraphicsContext> {
        self.main.clone()
    }
    fn create_context(&self, dedicated: bool) -> Result<Box<dyn GraphicsContext>, DeviceError> {
        if dedicated && !self.allow_dedicated {
            return Err(DeviceError::NoDedicatedContext);
        }
        Ok(Box::new(NullContext {
            counters: self.dedicated.clone(),
        }))
    }
    fn create_buffer(&self, _desc: BufferDesc) -> Result<BufferKey, DeviceError> {
        Err(DeviceError::Other("null device has no memory".to_owned()))
    }
    fn destroy_buffer(&self, _buffer: BufferKey) {}
    fn read_buffer(
        &self,
        buffer: BufferKey,
        _offset: u64,
        _dst: &mut [u8],
    ) -> Result<(), DeviceError> {
        Err(DeviceError::UnknownBuffer(buffer))
    }
}

///Scriptable task.
pub struct MockTask {
    name: String,
    target: Cell<u64>,
    state: Cell<TaskState>,
    syncs_to_finish: Cell<usize>,
    fail_execute: Cell<bool>,
    execute_calls: Cell<usize>,
    sync_calls: Cell<usize>,
    cancel_calls: Cell<usize>,
}

impl MockTask {
    ///Task that is not yet executed. Once executed, reports `sync_point`.
    pub fn new(name: &str, sync_point: u64) -> Arc<Self> {
        Arc::new(MockTask {
            name: name.to_owned(),
            target: Cell::new(sync_point),
            state: Cell::new(TaskState::Created),
            syncs_to_finish: Cell::new(1),
            fail_execute: Cell::new(false),
            execute_calls: Cell::new(0),
            sync_calls: Cell::new(0),
            cancel_calls: Cell::new(0),
        })
    }

    ///Task that is already in flight.
    pub fn active(name: &str, sync_point: u64) -> Arc<Self> {
        let task = Self::new(name, sync_point);
        task.state.set(TaskState::Active);
        task
    }

    ///Needs `n` sync calls until it reports finished.
    pub fn finish_after(self: Arc<Self>, n: usize) -> Arc<Self> {
        self.syncs_to_finish.set(n);
        self
    }

    ///Fails while executing.
    pub fn failing(self: Arc<Self>) -> Arc<Self> {
        self.fail_execute.set(true);
        self
    }

    pub fn force_finish(&self) {
        self.state.set(TaskState::Finished);
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.get()
    }
    pub fn sync_calls(&self) -> usize {
        self.sync_calls.get()
    }
    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.get()
    }
}

impl Display for MockTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl GpuTask for MockTask {
    fn execute(&self, cx: &mut ExecutionContext<'_>) {
        self.execute_calls.set(self.execute_calls.get() + 1);
        if self.fail_execute.get() {
            self.state.set(TaskState::Failed);
            cx.cancel_sync();
        } else {
            self.state.set(TaskState::Active);
        }
    }
    fn sync_point(&self) -> SyncPoint {
        SyncPoint(self.target.get())
    }
    fn state(&self) -> TaskState {
        self.state.get()
    }
    fn sync(&self) {
        assert_eq!(
            self.state.get(),
            TaskState::Active,
            "{} synced while not active",
            self.name
        );
        self.sync_calls.set(self.sync_calls.get() + 1);
        if self.sync_calls.get() >= self.syncs_to_finish.get() {
            self.state.set(TaskState::Finished);
        }
    }
    fn cancel_sync(&self) {
        self.cancel_calls.set(self.cancel_calls.get() + 1);
        //finished tasks stay finished
        if self.state.get() != TaskState::Finished {
            self.state.set(TaskState::Cancelled);
        }
    }
}

struct CapturingLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};

///Installs the capturing logger. Tests run in parallel, so records should be filtered by a name unique to the test.
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
    });
}

///Number of records at `level` that mention `needle`.
pub fn records_mentioning(level: log::Level, needle: &str) -> usize {
    LOGGER
        .records
        .lock()
        .map(|records| {
            records
                .iter()
                .filter(|(l, msg)| *l == level && msg.contains(needle))
                .count()
        })
        .unwrap_or(0)
}
