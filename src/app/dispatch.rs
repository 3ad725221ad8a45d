//! Trigger-to-task dispatch.
//!
//! Every accepted trigger gets its own short-lived actuation task so the
//! listener goes straight back to polling.  The spawned task calls
//! [`ActuationExecutor::run_sequence`], which resolves the busy-flag race.
//!
//! A burst of triggers could otherwise spawn a task per message, each of
//! which would just find the flag set and exit.  The in-flight cap bounds
//! that: once [`MAX_IN_FLIGHT_ACTUATIONS`] tasks exist, further triggers are
//! dropped here without creating anything.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{error, warn};

use crate::drivers::task_pin::Core;
use crate::error::SpawnError;

use super::actuation::ActuationExecutor;
use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, TaskSpawner, TaskSpec};

/// Upper bound on actuation tasks alive at once (running or about to skip).
pub const MAX_IN_FLIGHT_ACTUATIONS: usize = 2;

/// Scheduling for one actuation task.  Pulse timing runs on the APP core,
/// away from the network stacks.
pub const ACTUATION_TASK: TaskSpec = TaskSpec {
    name: "actuation",
    core: Core::App,
    priority: 5,
    stack_kb: 4,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Spawned,
    /// Cap reached; the trigger was dropped.
    Saturated { in_flight: usize },
    SpawnFailed(SpawnError),
}

/// What the trigger listener calls on an activate message.
pub trait ActuationTrigger {
    fn fire(&self) -> DispatchOutcome;
}

/// Decrements the in-flight counter when the actuation task ends, however
/// it ends.
struct InFlightSlot(Arc<AtomicUsize>);

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct ActuationDispatcher<A, S, P> {
    executor: Arc<ActuationExecutor<A, S>>,
    spawner: P,
    sink: S,
    in_flight: Arc<AtomicUsize>,
}

impl<A, S, P> ActuationDispatcher<A, S, P>
where
    A: ActuatorPort + Send + 'static,
    S: EventSink + Clone + Send + Sync + 'static,
    P: TaskSpawner,
{
    pub fn new(executor: Arc<ActuationExecutor<A, S>>, spawner: P, sink: S) -> Self {
        Self {
            executor,
            spawner,
            sink,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Actuation tasks currently alive.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim a slot, or report how many are taken.
    fn claim_slot(&self) -> Result<InFlightSlot, usize> {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < MAX_IN_FLIGHT_ACTUATIONS).then_some(n + 1)
            })
            .map(|_| InFlightSlot(Arc::clone(&self.in_flight)))
    }
}

impl<A, S, P> ActuationTrigger for ActuationDispatcher<A, S, P>
where
    A: ActuatorPort + Send + 'static,
    S: EventSink + Clone + Send + Sync + 'static,
    P: TaskSpawner,
{
    fn fire(&self) -> DispatchOutcome {
        let slot = match self.claim_slot() {
            Ok(slot) => slot,
            Err(in_flight) => {
                warn!("Dispatch: {} actuation tasks in flight, trigger dropped", in_flight);
                self.sink.emit(&AppEvent::TriggerDropped { in_flight });
                return DispatchOutcome::Saturated { in_flight };
            }
        };

        let executor = Arc::clone(&self.executor);
        let job = Box::new(move || {
            let _slot = slot;
            executor.run_sequence();
        });

        // A failed spawn drops the job, and the slot with it.
        match self.spawner.spawn(ACTUATION_TASK, job) {
            Ok(()) => {
                self.sink.emit(&AppEvent::TriggerDispatched);
                DispatchOutcome::Spawned
            }
            Err(e) => {
                error!("Dispatch: could not start actuation task: {}", e);
                self.sink.emit(&AppEvent::DispatchFailed(e));
                DispatchOutcome::SpawnFailed(e)
            }
        }
    }
}
