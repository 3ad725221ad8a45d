//! Core-pinned thread spawning for the ESP32 dual-core.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size. On non-ESP targets, falls back to plain thread spawn.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread. This means the config→spawn pair must not be
//! interleaved with other thread creation on the same thread.

use crate::app::ports::{TaskSpawner, TaskSpec};
use crate::error::SpawnError;

/// CPU core identifiers for the ESP32 Xtensa LX6 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): protocol stacks (WiFi, lwIP, MQTT).
    Pro = 0,
    /// Core 1 (APP_CPU): application logic and pulse generation.
    App = 1,
}

/// Spawn a thread pinned to a specific core with explicit priority and stack.
///
/// On ESP-IDF, uses `esp_pthread_set_cfg()` to configure core affinity,
/// priority, and stack size before `std::thread::spawn`.  The FreeRTOS task
/// name is truncated to the platform limit.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>, SpawnError> {
    // SAFETY: esp_create_default_pthread_config returns a plain struct;
    // esp_pthread_set_cfg copies it into thread-local storage of the caller.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as i32;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            return Err(SpawnError::PthreadConfig(ret));
        }
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(name.into())
        .spawn(f)
        .map_err(|_| SpawnError::ThreadCreate)
}

/// Smallest stack handed to a host thread.  Firmware budgets are sized for
/// the ESP32 and are too tight for an unoptimised host build.
#[cfg(not(target_os = "espidf"))]
const SIM_MIN_STACK_KB: usize = 64;

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<std::thread::JoinHandle<()>, SpawnError> {
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        name,
        stack_kb
    );

    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack_kb.max(SIM_MIN_STACK_KB) * 1024)
        .spawn(f)
        .map_err(|_| SpawnError::ThreadCreate)
}

/// [`TaskSpawner`] backed by [`spawn_on_core`].  Handles are dropped, so
/// every task is detached.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSpawner;

impl TaskSpawner for ThreadSpawner {
    fn spawn(
        &self,
        spec: TaskSpec,
        job: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), SpawnError> {
        spawn_on_core(spec.core, spec.priority, spec.stack_kb, spec.name, job).map(drop)
    }
}
