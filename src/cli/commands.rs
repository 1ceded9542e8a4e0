//! CLI command implementations.
//!
//! Contains the logic behind each CLI command.

use crate::cli::output::{
    InspectStep, OutputFormat, PipeEcho, ScatterResult, format_inspect, format_pipe,
    format_report, format_scatter,
};
use crate::cli::parser::{Cli, Commands};
use crate::core::ByteWindow;
use crate::endpoint::{Endpoint, FileEndpoint, OpenMode, close_all, pipe};
use crate::error::{CommandError, Result};
use crate::transfer::{Strategy, copy_file, ensure_distinct};
use std::path::Path;
use tracing::debug;

/// Largest message `pipe` accepts; stays below the smallest common OS pipe
/// buffer so the single-threaded write cannot block.
const MAX_PIPE_MESSAGE: usize = 16 * 1024;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Copy {
            src,
            dst,
            strategy,
            window_size,
        } => cmd_copy(src, dst, strategy, *window_size, format),
        Commands::Scatter { src, dst, windows } => cmd_scatter(src, dst, windows, format),
        Commands::Pipe { message, capacity } => cmd_pipe(message, *capacity, format),
        Commands::Inspect { text, capacity } => cmd_inspect(text, *capacity, format),
    }
}

// ==================== Command Implementations ====================

fn cmd_copy(
    src: &Path,
    dst: &Path,
    strategy: &str,
    window_size: usize,
    format: OutputFormat,
) -> Result<String> {
    let strategy: Strategy = strategy.parse()?;
    if strategy == Strategy::Buffered && window_size == 0 {
        return Err(CommandError::InvalidArgument("--window-size must be > 0".to_string()).into());
    }

    debug!(src = %src.display(), dst = %dst.display(), %strategy, window_size, "copy");
    let report = copy_file(src, dst, strategy, window_size)?;
    Ok(format_report(&report, format))
}

fn cmd_scatter(src: &Path, dst: &Path, sizes: &[usize], format: OutputFormat) -> Result<String> {
    if sizes.is_empty() || sizes.contains(&0) {
        return Err(CommandError::InvalidArgument(
            "--windows needs one or more non-zero capacities".to_string(),
        )
        .into());
    }

    let mut source = FileEndpoint::open(src, OpenMode::READ)?;
    let mut sink = FileEndpoint::open(dst, OpenMode::WRITE | OpenMode::CREATE)?;
    let mut windows: Vec<ByteWindow> = sizes.iter().map(|&n| ByteWindow::allocate(n)).collect();

    let outcome = scatter_gather(&mut source, &mut sink, &mut windows);
    let closed = {
        let mut endpoints: [&mut dyn Endpoint; 2] = [&mut source, &mut sink];
        close_all(&mut endpoints)
    };
    let (read, written) = outcome?;
    closed?;

    let result = ScatterResult {
        read,
        written,
        windows: windows.iter().map(ByteWindow::snapshot).collect(),
    };
    Ok(format_scatter(&result, format))
}

fn scatter_gather(
    source: &mut FileEndpoint,
    sink: &mut FileEndpoint,
    windows: &mut [ByteWindow],
) -> Result<(usize, usize)> {
    ensure_distinct(source, sink)?;
    sink.truncate(0)?;
    let read = source.read_into_all(windows)?.bytes();
    for window in windows.iter_mut() {
        window.flip();
    }
    let written = sink.write_from_all(windows)?;
    Ok((read, written))
}

fn cmd_pipe(message: &str, capacity: usize, format: OutputFormat) -> Result<String> {
    if capacity > MAX_PIPE_MESSAGE {
        return Err(CommandError::InvalidArgument(format!(
            "--capacity must be at most {MAX_PIPE_MESSAGE}"
        ))
        .into());
    }

    let (mut sink, mut source) = pipe()?;
    let mut window = ByteWindow::allocate(capacity);
    window.put(message.as_bytes())?;
    window.flip();
    let sent = sink.write_from(&mut window)?;
    sink.close()?;

    window.clear();
    let mut received = 0;
    while !source.read_into(&mut window)?.is_eof() {
        received = window.position();
        if !window.has_remaining() {
            break;
        }
    }
    source.close()?;
    if received != sent {
        return Err(CommandError::ExecutionFailed(format!(
            "pipe returned {received} of {sent} bytes"
        ))
        .into());
    }

    window.flip();
    let echo = PipeEcho {
        sent,
        received,
        message: String::from_utf8_lossy(window.as_readable()).into_owned(),
    };
    Ok(format_pipe(&echo, format))
}

fn cmd_inspect(text: &str, capacity: usize, format: OutputFormat) -> Result<String> {
    let steps = walkthrough(text.as_bytes(), capacity)?;
    Ok(format_inspect(&steps, format))
}

/// Replays the cursor lifecycle of a window over `bytes`.
fn walkthrough(bytes: &[u8], capacity: usize) -> Result<Vec<InspectStep>> {
    let mut steps = Vec::new();
    let mut record = |operation: String, window: &ByteWindow, output: Option<&[u8]>| {
        steps.push(InspectStep {
            operation,
            window: window.snapshot(),
            output: output.map(|b| String::from_utf8_lossy(b).into_owned()),
        });
    };

    let mut window = ByteWindow::allocate(capacity);
    record(format!("allocate({capacity})"), &window, None);

    window.put(bytes)?;
    record(format!("put({} bytes)", bytes.len()), &window, None);

    window.flip();
    record("flip()".to_string(), &window, None);

    let all = window.get(window.remaining())?;
    record(format!("get({})", all.len()), &window, Some(all.as_slice()));

    window.rewind();
    record("rewind()".to_string(), &window, None);

    let head = window.get(window.remaining().min(2))?;
    record(format!("get({})", head.len()), &window, Some(head.as_slice()));

    window.mark();
    record("mark()".to_string(), &window, None);

    let next = window.get(window.remaining().min(2))?;
    record(format!("get({})", next.len()), &window, Some(next.as_slice()));

    window.reset()?;
    record("reset()".to_string(), &window, None);

    window.clear();
    record("clear()".to_string(), &window, None);

    Ok(steps)
}
