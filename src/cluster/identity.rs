//! Node identity
//!
//! Short opaque token used to recognize (and drop) our own broadcasts.

use std::fs;

/// `[host:ppid:pid]` for the running process
pub fn node_identity() -> String {
    format!("[{}:{}:{}]", hostname(), parent_pid(), std::process::id())
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(unix)]
fn parent_pid() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn parent_pid() -> u32 {
    0
}
