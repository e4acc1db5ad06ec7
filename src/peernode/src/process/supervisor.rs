//! Process supervisor state machine.
//!
//! `Idle --start--> Running --stop--> Idle`; `status` from either state.
//! Methods that change state take `&mut self`: one owner, one caller. Share
//! a supervisor across threads only behind external serialization.

use super::{
    OsPlatform, ProcessExit, ProcessMonitor, ProcessPlatform, ProcessState, RunState,
};
use crate::error::{NodeError, Result};
use std::process::Command;
use std::time::{Duration, Instant};

/// Builds the node's command line. Called on every `start`.
pub type CommandFactory = Box<dyn Fn() -> Result<Command> + Send>;

/// Poll interval while waiting out a stop grace period
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What `stop` does after the interrupt signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopPolicy {
    /// Wait for exit without bound
    #[default]
    WaitForever,
    /// Wait up to the grace period, then kill
    KillAfter(Duration),
}

impl StopPolicy {
    pub fn from_grace_period(grace: Option<Duration>) -> Self {
        grace.map_or(StopPolicy::WaitForever, StopPolicy::KillAfter)
    }
}

enum Slot<P: ProcessPlatform> {
    Idle,
    Running {
        child: P::Child,
        pid: u32,
        monitor: P::Monitor,
    },
}

pub struct Supervisor<P: ProcessPlatform = OsPlatform> {
    node_id: String,
    factory: CommandFactory,
    platform: P,
    stop_policy: StopPolicy,
    slot: Slot<P>,
}

impl Supervisor<OsPlatform> {
    pub fn new(node_id: impl Into<String>, factory: CommandFactory) -> Self {
        Self::with_platform(node_id, factory, OsPlatform)
    }
}

impl<P: ProcessPlatform> Supervisor<P> {
    pub fn with_platform(node_id: impl Into<String>, factory: CommandFactory, platform: P) -> Self {
        Self {
            node_id: node_id.into(),
            factory,
            platform,
            stop_policy: StopPolicy::default(),
            slot: Slot::Idle,
        }
    }

    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn is_running(&self) -> bool {
        matches!(self.slot, Slot::Running { .. })
    }

    /// PID of the live process, if any
    pub fn pid(&self) -> Option<u32> {
        match &self.slot {
            Slot::Running { pid, .. } => Some(*pid),
            Slot::Idle => None,
        }
    }

    /// Launch the node process.
    ///
    /// Returns once the OS has accepted the launch, not once the node is
    /// ready. Any failure leaves the supervisor idle.
    pub fn start(&mut self) -> Result<()> {
        if let Slot::Running { pid, .. } = &self.slot {
            tracing::info!("[Supervisor] Node {} is already started", self.node_id);
            return Err(NodeError::AlreadyRunning {
                node_id: self.node_id.clone(),
                pid: *pid,
            });
        }

        let command = (self.factory)().map_err(|e| {
            tracing::warn!("[Supervisor] Failed to build command for {}: {}", self.node_id, e);
            e
        })?;

        let mut child = self.platform.spawn(&self.node_id, command).map_err(|e| {
            tracing::warn!("[Supervisor] Failed to start node {}: {}", self.node_id, e);
            e
        })?;
        let pid = self.platform.pid(&child);

        let monitor = match self.platform.attach(pid) {
            Ok(monitor) => monitor,
            Err(e) => {
                tracing::warn!(
                    "[Supervisor] Failed to monitor node {} (pid {}): {}; stopping it",
                    self.node_id,
                    pid,
                    e
                );
                self.abandon(&mut child, pid);
                return Err(e);
            }
        };

        self.slot = Slot::Running {
            child,
            pid,
            monitor,
        };
        tracing::info!("[Supervisor] Node {} started (pid {})", self.node_id, pid);
        Ok(())
    }

    /// Interrupt the node process and block until it exits.
    ///
    /// A failed signal or wait leaves the supervisor running so the call can
    /// be retried.
    pub fn stop(&mut self) -> Result<()> {
        let Slot::Running { child, pid, .. } = &mut self.slot else {
            tracing::info!("[Supervisor] Node {} is already stopped", self.node_id);
            return Err(NodeError::NotRunning {
                node_id: self.node_id.clone(),
            });
        };
        let pid = *pid;

        tracing::info!("[Supervisor] Stopping node {} (pid {})", self.node_id, pid);
        if let Err(e) = self.platform.interrupt(child) {
            tracing::warn!("[Supervisor] Failed to stop node {}: {}", self.node_id, e);
            return Err(e);
        }

        let exit = wait_for_exit(&self.platform, self.stop_policy, child, pid).map_err(|e| {
            tracing::warn!("[Supervisor] Failed to stop node {}: {}", self.node_id, e);
            e
        })?;

        self.slot = Slot::Idle;
        tracing::info!(
            "[Supervisor] Node {} stopped (pid {}, exit code {:?})",
            self.node_id,
            pid,
            exit.code
        );
        Ok(())
    }

    /// Current process state. A node with no live process reports the zero
    /// state; query failures are errors, never stale data.
    pub fn status(&self) -> Result<ProcessState> {
        let Slot::Running { pid, monitor, .. } = &self.slot else {
            return Ok(ProcessState::stopped());
        };

        let sample = monitor.sample().map_err(|e| {
            tracing::warn!("[Supervisor] Failed to get status of node {}: {}", self.node_id, e);
            e
        })?;

        Ok(ProcessState {
            pid: *pid,
            run_state: RunState::from_code(&sample.state_code),
            resident_memory_bytes: sample.resident_memory_bytes,
            virtual_memory_bytes: sample.virtual_memory_bytes,
            cpu_percent: sample.cpu_percent,
        })
    }

    /// Stop a child that was launched but could not be monitored
    fn abandon(&self, child: &mut P::Child, pid: u32) {
        if let Err(e) = self.platform.interrupt(child) {
            tracing::warn!("[Supervisor] Failed to interrupt pid {}: {}", pid, e);
            return;
        }
        if let Err(e) = wait_for_exit(&self.platform, self.stop_policy, child, pid) {
            tracing::warn!("[Supervisor] Failed to reap pid {}: {}", pid, e);
        }
    }
}

/// Block until exit, honoring the stop policy's grace period
fn wait_for_exit<P: ProcessPlatform>(
    platform: &P,
    policy: StopPolicy,
    child: &mut P::Child,
    pid: u32,
) -> Result<ProcessExit> {
    match policy {
        StopPolicy::WaitForever => platform.wait(child),
        StopPolicy::KillAfter(grace) => wait_or_kill(platform, child, pid, grace),
    }
}

fn wait_or_kill<P: ProcessPlatform>(
    platform: &P,
    child: &mut P::Child,
    pid: u32,
    grace: Duration,
) -> Result<ProcessExit> {
    let deadline = Instant::now() + grace;
    loop {
        if let Some(exit) = platform.try_wait(child)? {
            return Ok(exit);
        }
        if Instant::now() >= deadline {
            break;
        }
        std::thread::sleep(STOP_POLL_INTERVAL);
    }

    tracing::warn!(
        "[Supervisor] pid {} still running after {:?}, killing",
        pid,
        grace
    );
    platform.kill(child)?;
    platform.wait(child)
}
