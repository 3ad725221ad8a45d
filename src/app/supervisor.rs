//! Task supervisor: network bootstrap, then launch and idle.
//!
//! ```text
//!   connect ─▶ poll link ×N (1 s apart) ──up──▶ launch listener ─▶ launch sampler ─▶ idle
//!                     │
//!                  timeout ──▶ return error (no task started)
//! ```
//!
//! Bootstrap runs once.  Launched tasks are detached and never joined; the
//! supervisor keeps no handle to them.

use core::time::Duration;

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::error::{ConnectivityError, Error};

use super::events::AppEvent;
use super::ports::{ClockPort, ConnectivityPort, EventSink, TaskSpawner, TaskSpec};

/// Sleep between idle ticks once everything is running.
const IDLE_TICK: Duration = Duration::from_secs(1);

/// A long-running task the supervisor can launch.
pub trait BackgroundTask: Send + 'static {
    fn spec(&self) -> TaskSpec;

    /// Body of the task.  Expected never to return.
    fn run(self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapPolicy {
    /// Link-state polls before giving up.
    pub attempts: u32,
    pub interval: Duration,
}

impl BootstrapPolicy {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            attempts: config.wifi_connect_attempts,
            interval: config.wifi_attempt_interval(),
        }
    }
}

pub struct Supervisor<W, K, S> {
    network: W,
    clock: K,
    sink: S,
    policy: BootstrapPolicy,
}

impl<W, K, S> Supervisor<W, K, S>
where
    W: ConnectivityPort,
    K: ClockPort,
    S: EventSink,
{
    pub fn new(network: W, clock: K, sink: S, policy: BootstrapPolicy) -> Self {
        Self { network, clock, sink, policy }
    }

    pub fn network(&self) -> &W {
        &self.network
    }

    /// Bring the link up, polling up to `policy.attempts` times.
    pub fn bootstrap(&mut self) -> Result<(), ConnectivityError> {
        info!("Network: connecting");
        let started_ms = self.clock.uptime_ms();
        if let Err(e) = self.network.connect() {
            error!("Network: association failed: {}", e);
            self.sink.emit(&AppEvent::BootstrapFailed(e));
            return Err(e);
        }

        let max = self.policy.attempts;
        for attempt in 1..=max {
            if self.network.is_connected() {
                return self.link_up(started_ms);
            }
            info!("Network: waiting for link ({}/{})", attempt, max);
            self.sink.emit(&AppEvent::NetworkWaiting { attempt, max });
            self.clock.sleep(self.policy.interval);
        }
        if self.network.is_connected() {
            return self.link_up(started_ms);
        }

        let e = ConnectivityError::Timeout { attempts: max };
        error!("Network: {}", e);
        self.network.disconnect();
        self.sink.emit(&AppEvent::BootstrapFailed(e));
        Err(e)
    }

    fn link_up(&mut self, started_ms: u64) -> Result<(), ConnectivityError> {
        if let Err(e) = self.network.on_link_up() {
            error!("Network: link up but no IP: {}", e);
            self.sink.emit(&AppEvent::BootstrapFailed(e));
            return Err(e);
        }
        let elapsed_ms = self.clock.uptime_ms().saturating_sub(started_ms);
        info!("Network: up after {} ms", elapsed_ms);
        self.sink.emit(&AppEvent::NetworkUp { elapsed_ms });
        Ok(())
    }

    /// Spawn one background task, detached.
    pub fn launch<B, P>(&self, task: B, spawner: &P) -> Result<(), Error>
    where
        B: BackgroundTask,
        P: TaskSpawner,
    {
        let spec = task.spec();
        match spawner.spawn(spec, Box::new(move || task.run())) {
            Ok(()) => {
                self.sink.emit(&AppEvent::TaskLaunched { name: spec.name });
                Ok(())
            }
            Err(error) => {
                error!("Supervisor: could not launch '{}': {}", spec.name, error);
                self.sink.emit(&AppEvent::TaskLaunchFailed { name: spec.name, error });
                Err(error.into())
            }
        }
    }

    /// Bootstrap, then launch both tasks.  Returns once they are running.
    pub fn bring_up<L, T, P>(&mut self, listener: L, sampler: T, spawner: &P) -> Result<(), Error>
    where
        L: BackgroundTask,
        T: BackgroundTask,
        P: TaskSpawner,
    {
        self.bootstrap()?;
        self.launch(listener, spawner)?;
        if let Err(e) = self.launch(sampler, spawner) {
            warn!("Supervisor: listener is running without telemetry");
            return Err(e);
        }
        info!("Supervisor: all tasks running");
        self.sink.emit(&AppEvent::SystemReady);
        Ok(())
    }

    /// [`bring_up`](Self::bring_up), then idle forever.  Returns only with
    /// the error that stopped bring-up.
    pub fn start<L, T, P>(mut self, listener: L, sampler: T, spawner: &P) -> Error
    where
        L: BackgroundTask,
        T: BackgroundTask,
        P: TaskSpawner,
    {
        if let Err(e) = self.bring_up(listener, sampler, spawner) {
            return e;
        }
        loop {
            self.clock.sleep(IDLE_TICK);
        }
    }
}
