//! Supervision of a single external node process.
//!
//! The OS boundary is the [`ProcessPlatform`] trait: launch, graceful
//! interrupt, wait, forced kill and a metrics monitor. [`OsPlatform`] is the
//! real implementation (std::process, nix signals, /proc metrics).

pub mod platform;
pub mod proc_stat;
pub mod supervisor;

pub use platform::{OsPlatform, ProcMonitor};
pub use supervisor::{CommandFactory, StopPolicy, Supervisor};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::process::Command;

/// Run state reported by `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Sleeping,
    Stopped,
    Idle,
    Zombie,
    Waiting,
    Locked,
    Unknown,
}

impl RunState {
    /// Map a single-letter OS state code. Codes outside the table are
    /// `Unknown`, never an error.
    pub fn from_code(code: &str) -> Self {
        match code {
            "R" => RunState::Running,
            "S" => RunState::Sleeping,
            "T" => RunState::Stopped,
            "I" => RunState::Idle,
            "Z" => RunState::Zombie,
            "W" => RunState::Waiting,
            "L" => RunState::Locked,
            _ => RunState::Unknown,
        }
    }
}

/// Point-in-time process state, computed on every query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessState {
    pub pid: u32,
    pub run_state: RunState,
    pub resident_memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    pub cpu_percent: f64,
}

impl ProcessState {
    /// State of a node with no live process
    pub fn stopped() -> Self {
        Self {
            pid: 0,
            run_state: RunState::Stopped,
            resident_memory_bytes: 0,
            virtual_memory_bytes: 0,
            cpu_percent: 0.0,
        }
    }
}

/// Raw metrics read from the OS
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub state_code: String,
    pub resident_memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    pub cpu_percent: f64,
}

/// How a process ended; `code` is `None` when it was killed by a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
}

pub trait ProcessMonitor {
    fn sample(&self) -> Result<ProcessSample>;
}

pub trait ProcessPlatform {
    type Child;
    type Monitor: ProcessMonitor;

    /// Launch `command`. Returns once the OS has accepted it.
    fn spawn(&self, node_id: &str, command: Command) -> Result<Self::Child>;

    fn pid(&self, child: &Self::Child) -> u32;

    /// Open a metrics handle for a launched process
    fn attach(&self, pid: u32) -> Result<Self::Monitor>;

    /// Send the graceful interrupt signal
    fn interrupt(&self, child: &mut Self::Child) -> Result<()>;

    /// Forced termination, used only when a stop grace period elapses
    fn kill(&self, child: &mut Self::Child) -> Result<()>;

    /// Block until the process exits
    fn wait(&self, child: &mut Self::Child) -> Result<ProcessExit>;

    fn try_wait(&self, child: &mut Self::Child) -> Result<Option<ProcessExit>>;
}
