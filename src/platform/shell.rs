//! Shell-tool fallbacks for hardware readings.
//!
//! Each helper runs an external inspection tool when it is installed and
//! parses the values of interest out of its output. A missing tool or
//! unparseable output yields `None`, never an error.

use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::monitor::snapshot::sane;

fn run_tool(tool: &str, args: &[&str]) -> Option<String> {
    which::which(tool).ok()?;
    let output = Command::new(tool).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Realtime adapter metrics parsed from `nvidia-smi` CSV output.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SmiMetrics {
    pub core_usage: Option<f64>,
    pub core_temperature: Option<f64>,
    pub core_frequency: Option<f64>,
    pub memory_frequency: Option<f64>,
    pub vram_used_gb: Option<f64>,
    pub vram_total_gb: Option<f64>,
    pub fan_speed: Option<f64>,
}

/// Query `nvidia-smi` for one adapter's realtime metrics.
pub fn nvidia_smi_metrics(gpu_index: u32) -> Option<SmiMetrics> {
    let output = run_tool(
        "nvidia-smi",
        &[
            &format!("--id={gpu_index}"),
            "--query-gpu=utilization.gpu,temperature.gpu,clocks.current.graphics,clocks.current.memory,memory.used,memory.total,fan.speed",
            "--format=csv,noheader,nounits",
        ],
    )?;
    parse_nvidia_smi_csv(output.lines().next()?)
}

// CSV order: usage %, temp °C, core clock MHz, mem clock MHz, used MiB, total MiB, fan %.
// Unsupported fields print "[N/A]" and drop out individually.
fn parse_nvidia_smi_csv(line: &str) -> Option<SmiMetrics> {
    const MIB_PER_GIB: f64 = 1024.0;

    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 7 {
        return None;
    }
    let field = |i: usize| parts[i].parse::<f64>().ok().and_then(sane);

    Some(SmiMetrics {
        core_usage: field(0),
        core_temperature: field(1),
        core_frequency: field(2),
        memory_frequency: field(3),
        vram_used_gb: field(4).map(|mib| mib / MIB_PER_GIB),
        vram_total_gb: field(5).map(|mib| mib / MIB_PER_GIB),
        fan_speed: field(6),
    })
}

static SENSORS_PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Package id \d+:\s+\+?([\d.]+)°C").unwrap());
static SENSORS_CORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Core \d+:\s+\+?([\d.]+)°C").unwrap());
static SENSORS_DIMM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:SODIMM|DIMM)[^:\n]*:\s+\+?([\d.]+)°C").unwrap());

/// CPU temperature from lm-sensors output. "Package id N" outranks the
/// per-core lines.
pub fn sensors_cpu_temperature() -> Option<f64> {
    parse_sensors_cpu_temperature(&run_tool("sensors", &[])?)
}

fn parse_sensors_cpu_temperature(output: &str) -> Option<f64> {
    let captures = SENSORS_PACKAGE_RE
        .captures(output)
        .or_else(|| SENSORS_CORE_RE.captures(output))?;
    captures[1].parse().ok().and_then(sane)
}

/// Memory module temperature from lm-sensors output.
pub fn sensors_ram_temperature() -> Option<f64> {
    parse_sensors_ram_temperature(&run_tool("sensors", &[])?)
}

fn parse_sensors_ram_temperature(output: &str) -> Option<f64> {
    SENSORS_DIMM_RE.captures(output)?[1].parse().ok().and_then(sane)
}

static IOREG_CPU_DIE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""CPU die temperature"\s*=\s*(\d+)"#).unwrap());

/// CPU die temperature from the IOKit registry, reported in tenths of °C.
pub fn ioreg_cpu_temperature() -> Option<f64> {
    parse_ioreg_cpu_temperature(&run_tool("ioreg", &["-r", "-c", "IOPlatformDevice"])?)
}

fn parse_ioreg_cpu_temperature(output: &str) -> Option<f64> {
    IOREG_CPU_DIE_RE.captures(output)?[1]
        .parse::<f64>()
        .ok()
        .map(|tenths| tenths / 10.0)
        .and_then(sane)
}

static PROFILER_VRAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"VRAM \([^)]*\):\s*(\d+)\s*(GB|MB)").unwrap());

/// Total VRAM of the first display adapter from `system_profiler`.
pub fn system_profiler_vram_total_gb() -> Option<f64> {
    parse_system_profiler_vram(&run_tool("system_profiler", &["SPDisplaysDataType"])?)
}

fn parse_system_profiler_vram(output: &str) -> Option<f64> {
    let captures = PROFILER_VRAM_RE.captures(output)?;
    let amount: f64 = captures[1].parse().ok()?;
    let gb = if &captures[2] == "MB" { amount / 1024.0 } else { amount };
    sane(gb)
}
