//! `/proc` parsing tests

use peernode::process::proc_stat::{cpu_percent, parse_stat, parse_uptime, StatFields};
use peernode::NodeError;

const STAT_LINE: &str = "1234 (my (weird) proc) S 1 1234 1234 0 -1 4194560 100 0 0 0 250 50 0 0 20 0 1 0 5000 10485760 300 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0\n";

// ============================================================================
// stat
// ============================================================================

#[test]
fn test_parse_stat_with_parentheses_in_command_name() {
    let stat = parse_stat(1234, STAT_LINE).unwrap();

    assert_eq!(
        stat,
        StatFields {
            state: "S".to_string(),
            utime: 250,
            stime: 50,
            starttime: 5000,
            vsize: 10_485_760,
            rss_pages: 300,
        }
    );
}

#[test]
fn test_parse_stat_truncated_is_error() {
    let err = parse_stat(7, "7 (short) S 1 7").unwrap_err();
    assert!(matches!(err, NodeError::ProcessQuery { pid: 7, .. }));
}

#[test]
fn test_parse_stat_without_command_name_is_error() {
    assert!(parse_stat(7, "").is_err());
    assert!(parse_stat(7, "7 S 1 2 3").is_err());
}

#[test]
fn test_parse_stat_non_numeric_field_is_error() {
    let bad = STAT_LINE.replace(" 250 50 ", " abc 50 ");
    assert!(parse_stat(1234, &bad).is_err());
}

#[test]
fn test_parse_stat_negative_rss_clamped() {
    let line = STAT_LINE.replace(" 10485760 300 ", " 10485760 -1 ");
    let stat = parse_stat(1234, &line).unwrap();
    assert_eq!(stat.rss_pages, 0);
}

// ============================================================================
// uptime / CPU
// ============================================================================

#[test]
fn test_parse_uptime() {
    assert_eq!(parse_uptime("12345.67 54321.00\n"), Some(12345.67));
    assert_eq!(parse_uptime(""), None);
    assert_eq!(parse_uptime("garbage"), None);
}

#[test]
fn test_cpu_percent_is_lifetime_average() {
    let stat = parse_stat(1234, STAT_LINE).unwrap();

    // 3s of CPU over 30s since start (started at 50s, uptime 80s)
    let cpu = cpu_percent(&stat, 80.0, 100);
    assert!((cpu - 10.0).abs() < 1e-9, "cpu = {}", cpu);
}

#[test]
fn test_cpu_percent_degenerate_inputs_are_zero() {
    let stat = parse_stat(1234, STAT_LINE).unwrap();

    assert_eq!(cpu_percent(&stat, 80.0, 0), 0.0);
    // Uptime not past start time
    assert_eq!(cpu_percent(&stat, 50.0, 100), 0.0);
    assert_eq!(cpu_percent(&stat, 10.0, 100), 0.0);
}
