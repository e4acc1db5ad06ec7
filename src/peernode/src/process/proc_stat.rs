//! `/proc/<pid>/stat` parsing.
//!
//! Field numbers follow proc(5). The command name (field 2) is wrapped in
//! parentheses and may itself contain spaces or parentheses, so parsing starts
//! after the last `)`.

use crate::error::{NodeError, Result};

/// The subset of `/proc/<pid>/stat` used for status queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub state: String,
    /// Clock ticks in user mode
    pub utime: u64,
    /// Clock ticks in kernel mode
    pub stime: u64,
    /// Clock ticks after boot at which the process started
    pub starttime: u64,
    /// Virtual memory size in bytes
    pub vsize: u64,
    /// Resident set size in pages
    pub rss_pages: u64,
}

// Offsets into the fields following the command name (field 3 is index 0)
const STATE_IDX: usize = 0;
const UTIME_IDX: usize = 11;
const STIME_IDX: usize = 12;
const STARTTIME_IDX: usize = 19;
const VSIZE_IDX: usize = 20;
const RSS_IDX: usize = 21;

pub fn parse_stat(pid: u32, contents: &str) -> Result<StatFields> {
    let close = contents.rfind(')').ok_or_else(|| NodeError::ProcessQuery {
        pid,
        reason: "malformed stat: missing command name".to_string(),
    })?;
    let fields: Vec<&str> = contents[close + 1..].split_whitespace().collect();
    if fields.len() <= RSS_IDX {
        return Err(NodeError::ProcessQuery {
            pid,
            reason: format!("malformed stat: {} fields after command name", fields.len()),
        });
    }

    let number = |idx: usize, name: &str| -> Result<u64> {
        fields[idx].parse::<u64>().map_err(|e| NodeError::ProcessQuery {
            pid,
            reason: format!("malformed stat field {}: {}", name, e),
        })
    };

    Ok(StatFields {
        state: fields[STATE_IDX].to_string(),
        utime: number(UTIME_IDX, "utime")?,
        stime: number(STIME_IDX, "stime")?,
        starttime: number(STARTTIME_IDX, "starttime")?,
        vsize: number(VSIZE_IDX, "vsize")?,
        // rss is signed in the kernel; clamp transient negatives
        rss_pages: fields[RSS_IDX].parse::<i64>().map(|v| v.max(0) as u64).map_err(|e| {
            NodeError::ProcessQuery {
                pid,
                reason: format!("malformed stat field rss: {}", e),
            }
        })?,
    })
}

/// Seconds since boot from `/proc/uptime`
pub fn parse_uptime(contents: &str) -> Option<f64> {
    contents.split_whitespace().next()?.parse().ok()
}

/// Average CPU usage over the process lifetime, in percent of one CPU
pub fn cpu_percent(stat: &StatFields, uptime_secs: f64, clock_ticks: u64) -> f64 {
    if clock_ticks == 0 {
        return 0.0;
    }
    let ticks = clock_ticks as f64;
    let elapsed = uptime_secs - stat.starttime as f64 / ticks;
    if elapsed <= 0.0 {
        return 0.0;
    }
    let busy = (stat.utime + stat.stime) as f64 / ticks;
    100.0 * busy / elapsed
}
