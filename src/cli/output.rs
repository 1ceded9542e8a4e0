//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::WindowSnapshot;
use crate::error::Error;
use crate::transfer::TransferReport;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Result of a scatter read followed by a gather write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScatterResult {
    /// Bytes scattered across the windows.
    pub read: usize,
    /// Bytes gathered into the destination.
    pub written: usize,
    /// Cursor state of each window after the gather write.
    pub windows: Vec<WindowSnapshot>,
}

/// Result of sending a message through a pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipeEcho {
    /// Bytes written to the sink half.
    pub sent: usize,
    /// Bytes read back from the source half.
    pub received: usize,
    /// Received bytes, decoded lossily as UTF-8.
    pub message: String,
}

/// One step of a cursor walkthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectStep {
    /// Operation applied.
    pub operation: String,
    /// Cursors after the operation.
    pub window: WindowSnapshot,
    /// Bytes produced by the operation, if it read any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Formats a transfer report.
#[must_use]
pub fn format_report(report: &TransferReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "Copied {}", format_size(report.bytes));
            let _ = writeln!(output, "  Strategy:  {}", report.strategy);
            let _ = writeln!(output, "  Bytes:     {}", report.bytes);
            let _ = writeln!(output, "  Cycles:    {}", report.cycles);
            output
        }
        OutputFormat::Json => format_json(report),
    }
}

/// Formats a scatter/gather result.
#[must_use]
pub fn format_scatter(result: &ScatterResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "Scattered {} bytes", result.read);
            let _ = writeln!(output, "Gathered  {} bytes", result.written);
            let _ = writeln!(
                output,
                "{:<8} {:<10} {:<10} {:<10}",
                "Window", "Capacity", "Limit", "Position"
            );
            output.push_str(&"-".repeat(40));
            output.push('\n');
            for (index, window) in result.windows.iter().enumerate() {
                let _ = writeln!(
                    output,
                    "{:<8} {:<10} {:<10} {:<10}",
                    index, window.capacity, window.limit, window.position
                );
            }
            output
        }
        OutputFormat::Json => format_json(result),
    }
}

/// Formats a pipe echo.
#[must_use]
pub fn format_pipe(echo: &PipeEcho, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "{}", echo.message);
            let _ = writeln!(
                output,
                "({} bytes sent, {} bytes received)",
                echo.sent, echo.received
            );
            output
        }
        OutputFormat::Json => format_json(echo),
    }
}

/// Formats a cursor walkthrough.
#[must_use]
pub fn format_inspect(steps: &[InspectStep], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for step in steps {
                let _ = writeln!(output, "-------- {} --------", step.operation);
                let _ = writeln!(output, "  position: {}", step.window.position);
                let _ = writeln!(output, "  limit:    {}", step.window.limit);
                let _ = writeln!(output, "  capacity: {}", step.window.capacity);
                if let Some(mark) = step.window.mark {
                    let _ = writeln!(output, "  mark:     {mark}");
                }
                if let Some(ref out) = step.output {
                    let _ = writeln!(output, "  output:   {out}");
                }
            }
            output
        }
        OutputFormat::Json => format_json(&steps),
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(err: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => err.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }
            format_json(&ErrorOutput {
                error: err.to_string(),
            })
        }
    }
}

fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a byte size as human-readable.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
