// UI and formatting module

use std::fmt::Write as _;

use colored::Colorize;

use crate::core::monitor::snapshot::MetricSnapshot;
use crate::error::Result;

fn metric(value: Option<f64>, precision: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*}{}", precision, v, unit),
        None => "N/A".to_string(),
    }
}

/// Render a snapshot as sectioned terminal text.
pub fn render_text(snapshot: &MetricSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "CPU".bold().cyan());
    let _ = writeln!(out, "  Usage:        {}", metric(snapshot.cpu.usage, 1, " %"));
    let _ = writeln!(out, "  Temperature:  {}", metric(snapshot.cpu.temperature, 1, " °C"));
    let _ = writeln!(out, "  Frequency:    {}", metric(snapshot.cpu.frequency, 0, " MHz"));
    let _ = writeln!(out, "  Voltage:      {}", metric(snapshot.cpu.voltage, 3, " V"));
    if let Some(model) = &snapshot.cpu.cpu_model {
        let _ = writeln!(out, "  Model:        {model}");
    }

    let _ = writeln!(out, "{}", "GPU".bold().green());
    let _ = writeln!(out, "  Core usage:   {}", metric(snapshot.gpu.core_usage, 1, " %"));
    let _ = writeln!(out, "  Core temp:    {}", metric(snapshot.gpu.core_temperature, 1, " °C"));
    let _ = writeln!(out, "  Core clock:   {}", metric(snapshot.gpu.core_frequency, 0, " MHz"));
    let _ = writeln!(out, "  Memory clock: {}", metric(snapshot.gpu.memory_frequency, 0, " MHz"));
    let _ = writeln!(out, "  Memory temp:  {}", metric(snapshot.gpu.memory_temperature, 1, " °C"));
    let _ = writeln!(out, "  Hot spot:     {}", metric(snapshot.gpu.hotspot_temperature, 1, " °C"));
    let _ = writeln!(
        out,
        "  VRAM:         {} / {} ({})",
        metric(snapshot.gpu.vram_used_gb, 2, " GB"),
        metric(snapshot.gpu.vram_total_gb, 2, " GB"),
        metric(snapshot.gpu.vram_usage_percent, 1, " %"),
    );
    let _ = writeln!(out, "  Fan:          {}", metric(snapshot.gpu.fan_speed, 0, " %"));

    let _ = writeln!(out, "{}", "RAM".bold().yellow());
    let _ = writeln!(
        out,
        "  Used:         {} / {} ({})",
        metric(snapshot.ram.used, 2, " GB"),
        metric(snapshot.ram.total, 2, " GB"),
        metric(snapshot.ram.percent, 1, " %"),
    );
    let _ = writeln!(out, "  Available:    {}", metric(snapshot.ram.available, 2, " GB"));
    let _ = writeln!(out, "  Temperature:  {}", metric(snapshot.ram.ram_temperature, 1, " °C"));

    let _ = writeln!(out, "{}", "Network".bold().magenta());
    let _ = writeln!(out, "  Upload:       {}", metric(snapshot.network.upload_speed, 2, " MB/s"));
    let _ = writeln!(out, "  Download:     {}", metric(snapshot.network.download_speed, 2, " MB/s"));
    let _ = writeln!(out, "  Total sent:   {}", metric(snapshot.network.total_sent, 2, " GB"));
    let _ = writeln!(out, "  Total recv:   {}", metric(snapshot.network.total_received, 2, " GB"));

    out
}

/// Render a snapshot as one pretty-printed JSON document. Absent values
/// appear as `null`, every key is always present.
pub fn render_json(snapshot: &MetricSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monitor::snapshot::{CpuReading, MetricSnapshot};

    #[test]
    fn absent_values_render_as_na() {
        let text = render_text(&MetricSnapshot::default());
        assert!(text.contains("Usage:        N/A"));
        assert!(text.contains("Voltage:      N/A"));
    }

    #[test]
    fn present_values_render_with_units() {
        let snapshot = MetricSnapshot {
            cpu: CpuReading {
                usage: Some(42.53),
                frequency: Some(2400.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let text = render_text(&snapshot);
        assert!(text.contains("42.5 %"));
        assert!(text.contains("2400 MHz"));
    }

    #[test]
    fn json_keeps_absent_keys_as_null() {
        let json = render_json(&MetricSnapshot::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["cpu"]["temperature"].is_null());
        assert!(value["network"]["download_speed"].is_null());
    }
}
