//! Core-affine preemptive scheduler for the ESP32 dual-core.
//!
//! Every task becomes one FreeRTOS task pinned to a core, with its own
//! priority and stack, looping forever:
//!
//! ```text
//!   ┌──────────────┐   removed? ──▶ exit
//!   │  task thread │   enabled? ──▶ work(), count += 1
//!   └──────┬───────┘   sleep(interval)
//!          └────────── repeat
//! ```
//!
//! Tasks are registered before [`AffineScheduler::start`].  After start the
//! table is frozen for additions; enable/disable still apply on the task's
//! next turn, and removal asks the thread to exit and drops the entry.
//!
//! # ESP-IDF threading model
//!
//! ESP-IDF implements `std::thread` on pthreads, which are thin wrappers
//! around FreeRTOS tasks.  `esp_pthread_set_cfg()` sets thread-local
//! configuration for the *next* `pthread_create()` from the calling thread,
//! so the config→spawn pair must not interleave with other thread creation
//! on the same thread.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

use super::{MAX_TASKS, TaskInfo, TaskName, TaskScheduler, task_name};
use crate::app::ports::Clock;
use crate::error::SchedulerError;

/// CPU core identifiers for the ESP32 Xtensa dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): protocol stacks and the radio bridge.
    Pro = 0,
    /// Core 1 (APP_CPU): inputs, the wireless link and status.
    App = 1,
}

/// Default task stack.
pub const DEFAULT_STACK_KB: usize = 4;

/// Spawn a thread pinned to `core` with explicit priority and stack.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &str,
    f: impl FnOnce() + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    // FreeRTOS copies the name into the TCB during pthread_create.
    let mut c_name: heapless::String<{ super::MAX_TASK_NAME + 1 }> = heapless::String::new();
    let _ = c_name.push_str(name);
    let _ = c_name.push('\0');

    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = c_name.as_ptr() as *const _;
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(std::io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        name, core, priority, stack_kb
    );

    std::thread::Builder::new().name(name.into()).spawn(f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &str,
    f: impl FnOnce() + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    info!("Spawning '{}' (sim, no core pinning, stack={}KB)", name, stack_kb);

    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}

/// A unit of work plus where and how it runs.
pub struct AffineJob {
    core: Core,
    priority: u8,
    stack_kb: usize,
    run: Box<dyn FnMut() + Send + 'static>,
}

impl AffineJob {
    pub fn new(core: Core, priority: u8, run: impl FnMut() + Send + 'static) -> Self {
        Self {
            core,
            priority,
            stack_kb: DEFAULT_STACK_KB,
            run: Box::new(run),
        }
    }

    pub fn stack_kb(mut self, stack_kb: usize) -> Self {
        self.stack_kb = stack_kb;
        self
    }
}

/// Flags and counters shared between the table and the task thread.
#[derive(Default)]
struct TaskShared {
    enabled: AtomicBool,
    removed: AtomicBool,
    execution_count: AtomicU32,
    last_execution_ms: AtomicU32,
}

struct AffineEntry {
    name: TaskName,
    interval_ms: u32,
    shared: Arc<TaskShared>,
    /// Taken when the thread is spawned.
    job: Option<AffineJob>,
    handle: Option<JoinHandle<()>>,
}

impl TaskShared {
    fn info(&self, name: &TaskName, interval_ms: u32) -> TaskInfo {
        TaskInfo {
            name: name.clone(),
            interval_ms,
            enabled: self.enabled.load(Ordering::Relaxed),
            execution_count: self.execution_count.load(Ordering::Relaxed),
            last_execution_ms: self.last_execution_ms.load(Ordering::Relaxed),
        }
    }
}

impl AffineEntry {
    fn info(&self) -> TaskInfo {
        self.shared.info(&self.name, self.interval_ms)
    }
}

fn task_loop<K: Clock>(name: TaskName, interval_ms: u32, mut job: AffineJob, shared: Arc<TaskShared>, clock: K) {
    let period = Duration::from_millis(u64::from(interval_ms));
    loop {
        if shared.removed.load(Ordering::Acquire) {
            info!("Scheduler: '{}' exiting", name);
            return;
        }
        if shared.enabled.load(Ordering::Acquire) {
            (job.run)();
            shared.last_execution_ms.store(clock.now_ms(), Ordering::Relaxed);
            shared.execution_count.fetch_add(1, Ordering::Relaxed);
        }
        if interval_ms == 0 {
            std::thread::yield_now();
        } else {
            std::thread::sleep(period);
        }
    }
}

/// Monitor-side copy of one table entry.
#[derive(Clone)]
struct MonitoredTask {
    name: TaskName,
    interval_ms: u32,
    shared: Arc<TaskShared>,
}

type Registry = Arc<Mutex<heapless::Vec<MonitoredTask, MAX_TASKS>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, heapless::Vec<MonitoredTask, MAX_TASKS>> {
    // Entries are plain data; a panicked holder cannot leave them torn.
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read-only view of task counters, safe to move into another task.
///
/// Follows the scheduler's table, so tasks added or removed after the
/// monitor was taken are reflected too.
#[derive(Clone, Default)]
pub struct TaskMonitor {
    registry: Registry,
}

impl TaskMonitor {
    pub fn tasks(&self) -> heapless::Vec<TaskInfo, MAX_TASKS> {
        lock(&self.registry)
            .iter()
            .map(|t| t.shared.info(&t.name, t.interval_ms))
            .collect()
    }
}

/// Thread-per-task scheduler.  `K` stamps each run's completion time.
pub struct AffineScheduler<K> {
    tasks: heapless::Vec<AffineEntry, MAX_TASKS>,
    registry: Registry,
    clock: K,
    started: bool,
}

impl<K: Clock + Clone + Send + 'static> AffineScheduler<K> {
    pub fn new(clock: K) -> Self {
        Self {
            tasks: heapless::Vec::new(),
            registry: Registry::default(),
            clock,
            started: false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the named task's thread is alive.
    pub fn is_running(&self, name: &str) -> bool {
        self.tasks
            .iter()
            .find(|t| t.name == name)
            .and_then(|t| t.handle.as_ref())
            .is_some_and(|h| !h.is_finished())
    }

    /// A live view of the task table's counters.
    pub fn monitor(&self) -> TaskMonitor {
        TaskMonitor {
            registry: self.registry.clone(),
        }
    }

    /// Spawn every registered task.
    ///
    /// Stops at the first thread the OS refuses.  Tasks spawned before it
    /// keep running; the refused task and every task after it are dropped
    /// from the table and named in the log.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.started {
            return Err(SchedulerError::AlreadyStarted);
        }
        self.started = true;

        let mut refused = false;
        for entry in self.tasks.iter_mut() {
            let Some(job) = entry.job.take() else {
                continue;
            };
            let (core, priority, stack_kb) = (job.core, job.priority, job.stack_kb);
            let name = entry.name.clone();
            let interval_ms = entry.interval_ms;
            let shared = entry.shared.clone();
            let clock = self.clock.clone();

            match spawn_on_core(core, priority, stack_kb, &entry.name, move || {
                task_loop(name, interval_ms, job, shared, clock)
            }) {
                Ok(handle) => entry.handle = Some(handle),
                Err(e) => {
                    warn!("Scheduler: '{}' spawn failed: {}", entry.name, e);
                    refused = true;
                    break;
                }
            }
        }

        if refused {
            self.drop_unspawned();
            return Err(SchedulerError::SpawnFailed);
        }
        info!("Scheduler: {} task(s) started", self.tasks.len());
        Ok(())
    }

    fn drop_unspawned(&mut self) {
        let mut idx = 0;
        while idx < self.tasks.len() {
            if self.tasks[idx].handle.is_some() {
                idx += 1;
                continue;
            }
            let entry = self.tasks.remove(idx);
            entry.shared.removed.store(true, Ordering::Release);
            self.unregister(&entry.name);
            warn!("Scheduler: '{}' not running, dropped", entry.name);
        }
    }

    fn unregister(&self, name: &str) {
        let mut table = lock(&self.registry);
        if let Some(idx) = table.iter().position(|t| t.name == name) {
            table.remove(idx);
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == name)
    }

    fn shared(&self, name: &str) -> Result<&TaskShared, SchedulerError> {
        self.tasks
            .iter()
            .find(|t| t.name == name)
            .map(|t| &*t.shared)
            .ok_or(SchedulerError::NotFound)
    }
}

/// Dropping the scheduler asks every task thread to exit.
impl<K> Drop for AffineScheduler<K> {
    fn drop(&mut self) {
        for entry in &self.tasks {
            entry.shared.removed.store(true, Ordering::Release);
        }
    }
}

impl<K: Clock + Clone + Send + 'static> TaskScheduler for AffineScheduler<K> {
    type Work = AffineJob;

    fn add_task(&mut self, name: &str, work: AffineJob, interval_ms: u32) -> Result<(), SchedulerError> {
        if self.started {
            warn!("Scheduler: '{}' added after start", name);
            return Err(SchedulerError::AlreadyStarted);
        }
        if self.tasks.is_full() {
            warn!("Scheduler: table full, '{}' not added", name);
            return Err(SchedulerError::TableFull);
        }
        if self.position(name).is_some() {
            warn!("Scheduler: '{}' already registered", name);
            return Err(SchedulerError::DuplicateName);
        }
        let shared = Arc::new(TaskShared::default());
        shared.enabled.store(true, Ordering::Relaxed);
        let name = task_name(name)?;
        let monitored = MonitoredTask {
            name: name.clone(),
            interval_ms,
            shared: shared.clone(),
        };
        let entry = AffineEntry {
            name: name.clone(),
            interval_ms,
            shared,
            job: Some(work),
            handle: None,
        };
        if self.tasks.push(entry).is_err() {
            return Err(SchedulerError::TableFull);
        }
        let _ = lock(&self.registry).push(monitored);
        info!("Scheduler: added '{}' every {}ms", name, interval_ms);
        Ok(())
    }

    fn remove_task(&mut self, name: &str) -> Result<(), SchedulerError> {
        let idx = self.position(name).ok_or(SchedulerError::NotFound)?;
        let entry = self.tasks.remove(idx);
        entry.shared.removed.store(true, Ordering::Release);
        self.unregister(name);
        info!("Scheduler: removed '{}'", name);
        Ok(())
    }

    fn enable_task(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.shared(name)?.enabled.store(true, Ordering::Release);
        Ok(())
    }

    fn disable_task(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.shared(name)?.enabled.store(false, Ordering::Release);
        Ok(())
    }

    fn task(&self, name: &str) -> Option<TaskInfo> {
        self.tasks.iter().find(|t| t.name == name).map(AffineEntry::info)
    }

    fn task_count(&self) -> usize {
        self.tasks.len()
    }

    fn tasks(&self) -> heapless::Vec<TaskInfo, MAX_TASKS> {
        self.tasks.iter().map(AffineEntry::info).collect()
    }
}
