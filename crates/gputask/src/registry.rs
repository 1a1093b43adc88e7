use crate::{
    sync::SyncPoint,
    task::{GpuTask, TaskState},
};
use ahash::AHashSet;
use std::sync::Arc;

///Default number of in-flight tasks the registry reserves space for.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 64;

///Identity of a task, derived from its allocation. Stable as long as any `Arc` to the task is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey(usize);

impl TaskKey {
    pub fn of<T: ?Sized>(task: &Arc<T>) -> Self {
        TaskKey(Arc::as_ptr(task) as *const () as usize)
    }
}

///Number of tasks a [TaskRegistry::sweep] removed, by the state they were removed in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sweep {
    pub finished: usize,
    pub cancelled: usize,
}

impl Sweep {
    pub fn removed(&self) -> usize {
        self.finished + self.cancelled
    }
}

///Ordered collection of in-flight tasks. Order is admission order.
pub struct TaskRegistry {
    tasks: Vec<Arc<dyn GpuTask>>,
    members: AHashSet<TaskKey>,
}

impl TaskRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        TaskRegistry {
            tasks: Vec::with_capacity(capacity),
            members: AHashSet::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains<T: ?Sized>(&self, task: &Arc<T>) -> bool {
        self.members.contains(&TaskKey::of(task))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn GpuTask>> {
        self.tasks.iter()
    }

    ///Appends `task`.
    ///
    /// # Panics
    ///
    /// If the task is already registered. A task occupies at most one slot.
    pub fn push(&mut self, task: Arc<dyn GpuTask>) {
        let is_new = self.members.insert(TaskKey::of(&task));
        assert!(is_new, "{} was admitted while still in flight", task);
        self.tasks.push(task);
    }

    ///Removes `task` while keeping the order of all others. Returns `None` if the task is not registered.
    pub fn remove<T: ?Sized>(&mut self, task: &Arc<T>) -> Option<Arc<dyn GpuTask>> {
        let key = TaskKey::of(task);
        let idx = self.tasks.iter().position(|t| TaskKey::of(t) == key)?;
        self.members.remove(&key);
        Some(self.tasks.remove(idx))
    }

    ///Swaps out all tasks, leaving the registry empty.
    pub fn take_all(&mut self) -> Vec<Arc<dyn GpuTask>> {
        self.members.clear();
        std::mem::take(&mut self.tasks)
    }

    ///Single front to back pass over all tasks.
    ///
    /// Every active task whose sync point is reached by `current` is synced. Afterwards every finished task (synced in this pass or
    /// before) is removed. Tasks that were cancelled or failed without going through the scheduler are removed as well, without
    /// being synced. Tasks whose sync point lies in the future are not touched.
    pub fn sweep(&mut self, current: SyncPoint) -> Sweep {
        let mut result = Sweep::default();
        let members = &mut self.members;
        self.tasks.retain(|task| {
            if task.state() == TaskState::Active && task.sync_point() <= current {
                #[cfg(feature = "logging")]
                log::trace!("Syncing {} at {}", task, current);
                task.sync();
            }

            match task.state() {
                TaskState::Finished => result.finished += 1,
                TaskState::Cancelled | TaskState::Failed => {
                    #[cfg(feature = "logging")]
                    log::warn!("{} has been canceled before a sync", task);
                    result.cancelled += 1;
                }
                TaskState::Created | TaskState::Active => return true,
            }
            members.remove(&TaskKey::of(task));
            false
        });

        result
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        TaskRegistry::with_capacity(DEFAULT_REGISTRY_CAPACITY)
    }
}
