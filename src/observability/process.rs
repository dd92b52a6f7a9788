//! Process resource snapshot for the status endpoints.

use serde::Serialize;

/// Memory usage in bytes.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct MemoryUsage {
    pub rss: u64,
    #[serde(rename = "virtual")]
    pub virtual_size: u64,
}

/// Read current memory usage. Zeros where `/proc` is unavailable.
pub fn memory_usage() -> MemoryUsage {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| parse_status(&status))
        .unwrap_or_default()
}

/// `VmRSS` and `VmSize` from `/proc/<pid>/status`, reported by the kernel in kB.
fn parse_status(status: &str) -> Option<MemoryUsage> {
    let mut rss = None;
    let mut virtual_size = None;

    for line in status.lines() {
        if let Some(value) = line.strip_prefix("VmRSS:") {
            rss = parse_kb(value);
        } else if let Some(value) = line.strip_prefix("VmSize:") {
            virtual_size = parse_kb(value);
        }
    }

    Some(MemoryUsage {
        rss: rss?,
        virtual_size: virtual_size?,
    })
}

fn parse_kb(value: &str) -> Option<u64> {
    let mut parts = value.split_whitespace();
    let amount: u64 = parts.next()?.parse().ok()?;
    match parts.next() {
        Some("kB") | None => Some(amount * 1024),
        Some(_) => None,
    }
}
