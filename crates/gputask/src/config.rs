use crate::{
    registry::DEFAULT_REGISTRY_CAPACITY,
    sync::{DEFAULT_INITIAL_SYNC_POINT, SyncPoint},
};

///Which graphics context the scheduler executes its tasks on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextMode {
    ///Reuses the device's main context. Frame bracketing is left to the device's owner.
    Shared,
    ///Creates a private context. The scheduler brackets each frame on it.
    Dedicated,
}

impl Default for ContextMode {
    ///[ContextMode::Dedicated] if the `dedicated_context` feature is enabled, [ContextMode::Shared] otherwise.
    fn default() -> Self {
        if cfg!(feature = "dedicated_context") {
            ContextMode::Dedicated
        } else {
            ContextMode::Shared
        }
    }
}

///Construction time configuration of a [TasksContext](crate::TasksContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasksConfig {
    ///Value the frame counter starts at. Should be well above zero, so that default sync points are always reached.
    pub initial_sync_point: SyncPoint,
    ///Number of in-flight tasks space is reserved for.
    pub registry_capacity: usize,
    pub mode: ContextMode,
}

impl TasksConfig {
    pub fn with_mode(mut self, mode: ContextMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_initial_sync_point(mut self, initial: SyncPoint) -> Self {
        self.initial_sync_point = initial;
        self
    }

    pub fn with_registry_capacity(mut self, capacity: usize) -> Self {
        self.registry_capacity = capacity;
        self
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        TasksConfig {
            initial_sync_point: DEFAULT_INITIAL_SYNC_POINT,
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            mode: ContextMode::default(),
        }
    }
}
