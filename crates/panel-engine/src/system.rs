//! Static system facts for label rows.
//!
//! Values are computed on first use and cached for the life of the process.
//! Lookups block (file reads, `lspci`), so widgets call them on the worker pool.

use std::{
    collections::HashMap,
    fs,
    io::Read as _,
    process::{Command, Stdio},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use tracing::debug;
use wait_timeout::ChildExt as _;

/// Shown for unknown keys and failed probes.
pub const NOT_AVAILABLE: &str = "N/A";

/// Upper bound on each `lspci` run.
const LSPCI_TIMEOUT: Duration = Duration::from_secs(5);

/// PCI classes that identify a display adapter.
const GPU_CLASSES: [&str; 2] = ["VGA compatible controller", "3D controller"];

/// Cached system facts. Clones share the cache.
#[derive(Clone, Default)]
pub struct SystemInfo {
    /// Computed values by key.
    cache: Arc<Mutex<HashMap<String, String>>>,
}

impl SystemInfo {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key` (`memory_total`, `cpu_model`, `gpu_model`,
    /// `kernel_version`). Unknown keys yield [`NOT_AVAILABLE`].
    pub fn get(&self, key: &str) -> String {
        if let Some(v) = self.cache.lock().get(key) {
            return v.clone();
        }
        let value = compute(key).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        self.cache
            .lock()
            .entry(key.to_string())
            .or_insert(value)
            .clone()
    }

    /// Seed the cache, bypassing the probes.
    pub fn insert(&self, key: &str, value: &str) {
        self.cache.lock().insert(key.to_string(), value.to_string());
    }
}

/// Run the probe for `key`.
fn compute(key: &str) -> Option<String> {
    match key {
        "memory_total" => read("/proc/meminfo").and_then(|s| parse_meminfo(&s)),
        "cpu_model" => read("/proc/cpuinfo").and_then(|s| parse_cpuinfo(&s)),
        "gpu_model" => gpu_model(),
        "kernel_version" => read("/proc/sys/kernel/osrelease")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        other => {
            debug!(key = other, "unknown system value key");
            None
        }
    }
}

/// Read a file, logging failures.
fn read(path: &str) -> Option<String> {
    fs::read_to_string(path)
        .map_err(|e| debug!(path, error = %e, "system probe read failed"))
        .ok()
}

/// `MemTotal` in GiB with one decimal.
fn parse_meminfo(content: &str) -> Option<String> {
    let line = content.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(format!("{:.1} GB", kb as f64 / 1_048_576.0))
}

/// First `model name`, without the clock suffix.
fn parse_cpuinfo(content: &str) -> Option<String> {
    let line = content
        .lines()
        .find(|l| l.trim().to_lowercase().starts_with("model name"))?;
    let (_, raw) = line.split_once(':')?;
    let raw = raw.trim();
    let base = raw.split(" @").next().unwrap_or(raw).trim();
    Some(if base.is_empty() { raw } else { base }.to_string())
}

/// Vendor and device from `lspci -mm` output.
fn parse_lspci_mm(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|l| GPU_CLASSES.iter().any(|c| l.contains(&format!("\"{c}\""))))
        .find_map(|l| {
            let parts: Vec<&str> = l.split('"').collect();
            (parts.len() >= 6).then(|| format!("{} {}", parts[3], parts[5]).trim().to_string())
        })
}

/// Description from plain `lspci` output.
fn parse_lspci(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|l| GPU_CLASSES.iter().any(|c| l.contains(c)))
        .find_map(|l| l.splitn(3, ':').nth(2).map(|s| s.trim().to_string()))
}

/// Probe the GPU, preferring the machine-readable format.
fn gpu_model() -> Option<String> {
    lspci(&["-mm"])
        .as_deref()
        .and_then(parse_lspci_mm)
        .or_else(|| lspci(&[]).as_deref().and_then(parse_lspci))
}

/// Run `lspci` with a timeout and return stdout on success.
fn lspci(args: &[&str]) -> Option<String> {
    let mut child = Command::new("lspci")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| debug!(error = %e, "lspci unavailable"))
        .ok()?;
    let status = match child.wait_timeout(LSPCI_TIMEOUT) {
        Ok(Some(status)) => status,
        Ok(None) => {
            debug!("lspci timed out");
            let _ = child.kill();
            let _ = child.wait();
            return None;
        }
        Err(e) => {
            debug!(error = %e, "lspci wait failed");
            return None;
        }
    };
    if !status.success() {
        return None;
    }
    let mut out = String::new();
    child.stdout.take()?.read_to_string(&mut out).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meminfo_rounds_to_one_decimal() {
        let src = "MemFree:  100 kB\nMemTotal:       16318480 kB\n";
        assert_eq!(parse_meminfo(src).as_deref(), Some("15.6 GB"));
        assert_eq!(parse_meminfo("MemTotal: lots"), None);
    }

    #[test]
    fn cpu_model_drops_clock() {
        let src = "processor\t: 0\nmodel name\t: Intel(R) Core(TM) i7-4770 CPU @ 3.40GHz\n";
        assert_eq!(
            parse_cpuinfo(src).as_deref(),
            Some("Intel(R) Core(TM) i7-4770 CPU")
        );
        assert_eq!(
            parse_cpuinfo("model name : AMD Ryzen 7 5800X").as_deref(),
            Some("AMD Ryzen 7 5800X")
        );
    }

    #[test]
    fn lspci_formats() {
        let mm = concat!(
            "00:1f.3 \"Audio device\" \"Intel Corporation\" \"Cannon Lake\"\n",
            "01:00.0 \"VGA compatible controller\" \"NVIDIA Corporation\" \"GA104\" -ra1 \"Device\" \"1234\"\n",
        );
        assert_eq!(parse_lspci_mm(mm).as_deref(), Some("NVIDIA Corporation GA104"));
        let plain = "00:02.0 VGA compatible controller: Intel Corporation UHD Graphics 630\n";
        assert_eq!(
            parse_lspci(plain).as_deref(),
            Some("Intel Corporation UHD Graphics 630")
        );
        assert_eq!(parse_lspci("00:1f.3 Audio device: x"), None);
    }

    #[test]
    fn unknown_keys_are_cached_as_not_available() {
        let info = SystemInfo::new();
        assert_eq!(info.get("favourite_colour"), NOT_AVAILABLE);
        info.insert("gpu_model", "Test GPU");
        assert_eq!(info.get("gpu_model"), "Test GPU");
        assert_eq!(info.clone().get("gpu_model"), "Test GPU");
    }
}
