use super::proc_stat::{self, StatFields};
use super::{ProcessExit, ProcessMonitor, ProcessPlatform, ProcessSample};
use crate::error::{NodeError, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::{sysconf, Pid, SysconfVar};
use std::path::PathBuf;
use std::process::{Child, Command};

const FALLBACK_PAGE_SIZE: u64 = 4096;
const FALLBACK_CLOCK_TICKS: u64 = 100;

/// Processes launched with std::process, signalled with nix
#[derive(Debug, Clone, Copy, Default)]
pub struct OsPlatform;

impl ProcessPlatform for OsPlatform {
    type Child = Child;
    type Monitor = ProcMonitor;

    fn spawn(&self, node_id: &str, mut command: Command) -> Result<Child> {
        tracing::debug!("[OsPlatform] Launching {:?}", command);
        command.spawn().map_err(|e| NodeError::Launch {
            node_id: node_id.to_string(),
            source: e,
        })
    }

    fn pid(&self, child: &Child) -> u32 {
        child.id()
    }

    fn attach(&self, pid: u32) -> Result<ProcMonitor> {
        ProcMonitor::open(pid)
    }

    fn interrupt(&self, child: &mut Child) -> Result<()> {
        let pid = child.id();
        kill(Pid::from_raw(pid as i32), Signal::SIGINT)
            .map_err(|e| NodeError::Signal { pid, source: e })
    }

    fn kill(&self, child: &mut Child) -> Result<()> {
        let pid = child.id();
        kill(Pid::from_raw(pid as i32), Signal::SIGKILL)
            .map_err(|e| NodeError::Signal { pid, source: e })
    }

    fn wait(&self, child: &mut Child) -> Result<ProcessExit> {
        let pid = child.id();
        let status = child.wait().map_err(|e| NodeError::Wait { pid, source: e })?;
        Ok(ProcessExit {
            code: status.code(),
        })
    }

    fn try_wait(&self, child: &mut Child) -> Result<Option<ProcessExit>> {
        let pid = child.id();
        let status = child
            .try_wait()
            .map_err(|e| NodeError::Wait { pid, source: e })?;
        Ok(status.map(|s| ProcessExit { code: s.code() }))
    }
}

/// Metrics handle reading `/proc/<pid>`
#[derive(Debug, Clone)]
pub struct ProcMonitor {
    pid: u32,
    proc_dir: PathBuf,
    page_size: u64,
    clock_ticks: u64,
}

impl ProcMonitor {
    pub fn open(pid: u32) -> Result<Self> {
        let proc_dir = PathBuf::from(format!("/proc/{}", pid));
        if !proc_dir.exists() {
            return Err(NodeError::ProcessQuery {
                pid,
                reason: format!("{} does not exist", proc_dir.display()),
            });
        }

        let page_size = sysconf(SysconfVar::PAGE_SIZE)
            .ok()
            .flatten()
            .map(|v| v as u64)
            .unwrap_or(FALLBACK_PAGE_SIZE);
        let clock_ticks = sysconf(SysconfVar::CLK_TCK)
            .ok()
            .flatten()
            .map(|v| v as u64)
            .unwrap_or(FALLBACK_CLOCK_TICKS);

        Ok(Self {
            pid,
            proc_dir,
            page_size,
            clock_ticks,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    fn read_stat(&self) -> Result<StatFields> {
        let path = self.proc_dir.join("stat");
        let contents = std::fs::read_to_string(&path).map_err(|e| NodeError::ProcessQuery {
            pid: self.pid,
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        proc_stat::parse_stat(self.pid, &contents)
    }

    fn read_uptime(&self) -> Result<f64> {
        let contents =
            std::fs::read_to_string("/proc/uptime").map_err(|e| NodeError::ProcessQuery {
                pid: self.pid,
                reason: format!("failed to read /proc/uptime: {}", e),
            })?;
        proc_stat::parse_uptime(&contents).ok_or_else(|| NodeError::ProcessQuery {
            pid: self.pid,
            reason: "malformed /proc/uptime".to_string(),
        })
    }
}

impl ProcessMonitor for ProcMonitor {
    fn sample(&self) -> Result<ProcessSample> {
        let stat = self.read_stat()?;
        let uptime = self.read_uptime()?;
        Ok(ProcessSample {
            cpu_percent: proc_stat::cpu_percent(&stat, uptime, self.clock_ticks),
            resident_memory_bytes: stat.rss_pages * self.page_size,
            virtual_memory_bytes: stat.vsize,
            state_code: stat.state,
        })
    }
}
