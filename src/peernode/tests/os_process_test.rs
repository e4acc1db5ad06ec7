//! Supervisor tests against real processes
//!
//! Uses `sleep` and `sh` as stand-ins for the peer binary.

use peernode::{CommandFactory, ErrorKind, NodeError, ProcessState, RunState, StopPolicy, Supervisor};
use std::process::Command;
use std::time::Duration;

fn command(program: &'static str, args: &'static [&'static str]) -> CommandFactory {
    Box::new(move || {
        let mut command = Command::new(program);
        command.args(args);
        Ok(command)
    })
}

fn proc_exists(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{}", pid)).exists()
}

#[test]
fn test_start_status_stop_sleep_process() {
    let mut supervisor = Supervisor::new("sleeper", command("sleep", &["30"]));
    supervisor.start().unwrap();

    let pid = supervisor.pid().unwrap();
    assert!(pid > 0);

    let state = supervisor.status().unwrap();
    assert_eq!(state.pid, pid);
    assert!(
        matches!(state.run_state, RunState::Running | RunState::Sleeping),
        "unexpected state {:?}",
        state.run_state
    );
    assert!(state.virtual_memory_bytes > 0);
    assert!(state.cpu_percent >= 0.0);

    supervisor.stop().unwrap();
    assert!(!supervisor.is_running());
    assert!(!proc_exists(pid));
    assert_eq!(supervisor.status().unwrap(), ProcessState::stopped());
}

#[test]
fn test_restart_after_stop_gets_new_process() {
    let mut supervisor = Supervisor::new("sleeper", command("sleep", &["30"]));

    supervisor.start().unwrap();
    let first = supervisor.pid().unwrap();
    supervisor.stop().unwrap();

    supervisor.start().unwrap();
    let second = supervisor.pid().unwrap();
    assert_ne!(first, second);
    supervisor.stop().unwrap();
}

#[test]
fn test_missing_binary_is_launch_error() {
    let mut supervisor = Supervisor::new(
        "ghost",
        command("/nonexistent/peer-binary-for-tests", &["node", "start"]),
    );

    let err = supervisor.start().unwrap_err();
    assert!(matches!(err, NodeError::Launch { .. }));
    assert_eq!(err.kind(), ErrorKind::Collaborator);
    assert!(!supervisor.is_running());
}

#[test]
fn test_process_exited_on_its_own_reports_zombie() {
    let mut supervisor = Supervisor::new("short", command("true", &[]));
    supervisor.start().unwrap();

    // Not reaped until stop, so the exited child stays visible as a zombie
    let mut state = supervisor.status().unwrap();
    for _ in 0..50 {
        if state.run_state == RunState::Zombie {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
        state = supervisor.status().unwrap();
    }
    assert_eq!(state.run_state, RunState::Zombie);

    supervisor.stop().unwrap();
    assert!(!supervisor.is_running());
}

#[test]
fn test_grace_period_kills_process_ignoring_interrupt() {
    let mut supervisor = Supervisor::new(
        "stubborn",
        command("sh", &["-c", "trap '' INT; exec sleep 30"]),
    )
    .with_stop_policy(StopPolicy::KillAfter(Duration::from_millis(300)));
    supervisor.start().unwrap();
    let pid = supervisor.pid().unwrap();

    // Let the shell install the trap before interrupting
    std::thread::sleep(Duration::from_millis(200));

    supervisor.stop().unwrap();
    assert!(!supervisor.is_running());
    assert!(!proc_exists(pid));
}
