//! Actuation executor: the single-owner stepper sequence.
//!
//! ```text
//!   lock ─▶ busy? ──yes──▶ unlock ─▶ Skipped
//!             │
//!             no
//!             ▼
//!   set busy ─▶ unlock ─▶ phase 1 ─▶ phase 2 ─▶ phase 3 ─▶ Completed
//!                             │          │          │
//!                             └──────────┴──────────┴──▶ Aborted(err)
//!
//!   ActuationGuard::drop ─▶ lock ─▶ clear busy ─▶ unlock   (always)
//! ```
//!
//! The busy flag lock is held only for the check-and-set and for the final
//! clear, never across motion, so other tasks can probe it at any time and
//! simply see `true`.  Attempt-and-skip: a request that loses the race is
//! dropped, never queued.

use core::cell::Cell;
use std::sync::Mutex as StdMutex;
use std::sync::PoisonError;
use std::time::Instant;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{error, info};

use crate::drivers::stepper::{Direction, steps_for};
use crate::error::ActuationError;

use super::events::AppEvent;
use super::ports::{ActuatorPort, AxisId, EventSink};

// ───────────────────────────────────────────────────────────────
// Sequence table
// ───────────────────────────────────────────────────────────────

/// One entry of the fixed actuation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub axis: AxisId,
    pub direction: Direction,
    pub steps: u32,
}

/// Revolutions per phase.
pub const PHASE_REVOLUTIONS: u32 = 10;

/// The sequence, executed strictly in order.
pub const SEQUENCE: [Phase; 3] = [
    Phase { axis: AxisId::Axis1, direction: Direction::Forward, steps: steps_for(PHASE_REVOLUTIONS) },
    Phase { axis: AxisId::Axis2, direction: Direction::Forward, steps: steps_for(PHASE_REVOLUTIONS) },
    Phase { axis: AxisId::Axis2, direction: Direction::Reverse, steps: steps_for(PHASE_REVOLUTIONS) },
];

// ───────────────────────────────────────────────────────────────
// Outcome
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run held the busy flag; nothing was driven.
    Skipped,
    Completed,
    /// `phase` (0-based) failed; later phases were not run.
    Aborted { phase: usize, error: ActuationError },
}

// ───────────────────────────────────────────────────────────────
// Busy flag
// ───────────────────────────────────────────────────────────────

/// Process-wide "a sequence is running" flag with an explicit
/// acquire/release contract.
pub struct BusyFlag {
    running: Mutex<CriticalSectionRawMutex, Cell<bool>>,
}

impl BusyFlag {
    pub const fn new() -> Self {
        Self {
            running: Mutex::new(Cell::new(false)),
        }
    }

    /// Check-and-set under the lock.  `Some` means the caller now owns the
    /// flag until the returned guard is dropped.
    pub fn try_acquire(&self) -> Option<ActuationGuard<'_>> {
        let acquired = self.running.lock(|running| {
            if running.get() {
                false
            } else {
                running.set(true);
                true
            }
        });
        acquired.then(|| ActuationGuard { flag: self })
    }

    pub fn is_set(&self) -> bool {
        self.running.lock(Cell::get)
    }

    fn clear(&self) {
        self.running.lock(|running| running.set(false));
    }
}

impl Default for BusyFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Ownership of the busy flag.  Dropping it clears the flag, which also
/// happens while unwinding from a panic inside a phase.
#[must_use = "dropping the guard immediately releases the busy flag"]
pub struct ActuationGuard<'a> {
    flag: &'a BusyFlag,
}

impl Drop for ActuationGuard<'_> {
    fn drop(&mut self) {
        self.flag.clear();
    }
}

// ───────────────────────────────────────────────────────────────
// Executor
// ───────────────────────────────────────────────────────────────

/// Owns the stepper rig and the busy flag.  Shared between spawned
/// actuation tasks behind an `Arc`.
///
/// The rig sits in its own mutex, but only the busy-flag owner ever locks
/// it, so that lock is never contended.
pub struct ActuationExecutor<A, S> {
    busy: BusyFlag,
    rig: StdMutex<A>,
    sink: S,
}

impl<A, S> ActuationExecutor<A, S>
where
    A: ActuatorPort,
    S: EventSink,
{
    pub fn new(rig: A, sink: S) -> Self {
        Self {
            busy: BusyFlag::new(),
            rig: StdMutex::new(rig),
            sink,
        }
    }

    /// Whether a sequence currently holds the busy flag.
    pub fn is_running(&self) -> bool {
        self.busy.is_set()
    }

    /// Run the full sequence on the calling task, or return
    /// [`RunOutcome::Skipped`] at once if one is already running.
    ///
    /// Errors are reported through the event sink and the log; they are
    /// returned here only for observability by the caller.
    pub fn run_sequence(&self) -> RunOutcome {
        let Some(_guard) = self.busy.try_acquire() else {
            info!("Actuation: sequence already running, request dropped");
            self.sink.emit(&AppEvent::ActuationSkipped);
            return RunOutcome::Skipped;
        };

        info!("Actuation: running stepper sequence");
        self.sink.emit(&AppEvent::ActuationStarted);
        let started = Instant::now();

        // A previous run that panicked mid-phase poisons the rig mutex; the
        // rig itself holds no invariants a panic could break.
        let mut rig = self.rig.lock().unwrap_or_else(PoisonError::into_inner);

        for (index, phase) in SEQUENCE.iter().enumerate() {
            info!(
                "Actuation: axis {} {:?} {} steps",
                phase.axis.number(),
                phase.direction,
                phase.steps
            );
            self.sink.emit(&AppEvent::PhaseStarted {
                axis: phase.axis,
                direction: phase.direction,
                steps: phase.steps,
            });

            if let Err(e) = rig.run_phase(phase.axis, phase.direction, phase.steps) {
                error!("Actuation: phase {} aborted: {}", index + 1, e);
                self.sink.emit(&AppEvent::ActuationAborted(e));
                return RunOutcome::Aborted { phase: index, error: e };
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!("Actuation: sequence complete in {} ms", elapsed_ms);
        self.sink.emit(&AppEvent::ActuationCompleted { elapsed_ms });
        RunOutcome::Completed
    }
}
