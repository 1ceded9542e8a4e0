//! Integration tests for chanio.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chanio::{
    ByteWindow, CommandError, Endpoint, EndpointError, Error, FileEndpoint, MemoryEndpoint,
    OpenMode, ReadStatus, Strategy, WindowError, close_all, copy_file, pipe, transfer,
};
use tempfile::TempDir;
use test_case::test_case;

/// Writes `len` patterned bytes to `name` inside `dir`.
fn write_fixture(dir: &TempDir, name: &str, len: usize) -> (std::path::PathBuf, Vec<u8>) {
    let path = dir.path().join(name);
    let payload: Vec<u8> = (0..=250u8).cycle().take(len).collect();
    std::fs::write(&path, &payload).expect("write fixture");
    (path, payload)
}

#[test]
fn test_window_abcdef_lifecycle() {
    let mut window = ByteWindow::allocate(1024);
    window.put(b"abcdef").expect("put");
    assert_eq!(
        (window.position(), window.limit(), window.capacity()),
        (6, 1024, 1024)
    );

    window.flip();
    assert_eq!((window.position(), window.limit()), (0, 6));

    let bytes = window.get(window.remaining()).expect("get");
    assert_eq!(bytes, b"abcdef");
    assert_eq!((window.position(), window.limit()), (6, 6));

    window.clear();
    assert_eq!(
        (window.position(), window.limit(), window.capacity()),
        (0, 1024, 1024)
    );
    // clear only moves cursors
    assert_eq!(&window.array()[..6], b"abcdef");
}

#[test]
fn test_window_mark_reset_scenario() {
    let mut window = ByteWindow::allocate(16);
    window.put(b"abcdef").expect("put");
    window.flip();

    assert_eq!(window.get(2).expect("get"), b"ab");
    window.mark();
    assert_eq!(window.get(2).expect("get"), b"cd");
    window.reset().expect("reset");
    assert_eq!(window.position(), 2);
    assert_eq!(window.get(2).expect("get"), b"cd");

    window.rewind();
    assert_eq!(window.mark_position(), None);
    assert!(matches!(window.reset(), Err(WindowError::InvalidMark)));
}

#[test]
fn test_window_reads_into_offset() {
    let mut window = ByteWindow::wrap(b"xyz".to_vec());
    let mut dest = [0u8; 5];
    window.get_into(&mut dest, 1, 3).expect("get_into");
    assert_eq!(&dest, b"\0xyz\0");

    window.rewind();
    let err = window.get_into(&mut dest, 4, 3).unwrap_err();
    assert!(matches!(err, WindowError::OutOfBounds { .. }));
    assert_eq!(window.position(), 0);
}

#[test_case(0, 1024, 0 ; "empty source")]
#[test_case(100, 1024, 1 ; "smaller than window")]
#[test_case(1024, 1024, 1 ; "exactly one window")]
#[test_case(1025, 1024, 2 ; "one byte over")]
#[test_case(10_000, 1024, 10 ; "many cycles")]
#[test_case(777, 1, 777 ; "single byte window")]
fn test_file_copy_cycles(len: usize, capacity: usize, cycles: u64) {
    let temp_dir = TempDir::new().expect("temp dir");
    let (src, payload) = write_fixture(&temp_dir, "1.jpg", len);
    let dst = temp_dir.path().join("2.jpg");

    let mut source = FileEndpoint::open(&src, OpenMode::READ).expect("open source");
    let mut sink = FileEndpoint::open(&dst, OpenMode::WRITE | OpenMode::CREATE).expect("open sink");
    let mut window = ByteWindow::allocate(capacity);

    let report = transfer::copy(&mut source, &mut sink, &mut window).expect("copy");
    assert_eq!(report.bytes, len as u64);
    assert_eq!(report.cycles, cycles);

    {
        let mut endpoints: [&mut dyn Endpoint; 2] = [&mut source, &mut sink];
        close_all(&mut endpoints).expect("close");
    }
    assert!(!source.is_open());
    assert_eq!(std::fs::read(&dst).expect("read dst"), payload);
}

#[test_case(Strategy::Buffered ; "buffered")]
#[test_case(Strategy::Direct ; "direct")]
#[test_case(Strategy::Mapped ; "mapped")]
fn test_copy_file_strategies(strategy: Strategy) {
    let temp_dir = TempDir::new().expect("temp dir");
    let (src, payload) = write_fixture(&temp_dir, "src.bin", 200_000);
    let dst = temp_dir.path().join("dst.bin");
    // stale, longer content must not survive
    std::fs::write(&dst, vec![0u8; 300_000]).expect("seed dst");

    let report = copy_file(&src, &dst, strategy, 4096).expect("copy_file");
    assert_eq!(report.strategy, strategy);
    assert_eq!(report.bytes, 200_000);
    assert_eq!(std::fs::read(&dst).expect("read dst"), payload);
}

#[test_case(Strategy::Buffered ; "buffered")]
#[test_case(Strategy::Direct ; "direct")]
#[test_case(Strategy::Mapped ; "mapped")]
fn test_copy_file_onto_itself_keeps_data(strategy: Strategy) {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("precious.txt");
    std::fs::write(&path, b"precious data").expect("write fixture");
    // a second spelling of the same path
    let alias = temp_dir.path().join(".").join("precious.txt");

    let err = copy_file(&path, &alias, strategy, 1024).unwrap_err();
    assert!(matches!(
        err,
        Error::Command(CommandError::InvalidArgument(_))
    ));
    assert_eq!(std::fs::read(&path).expect("read"), b"precious data");
}

#[test]
fn test_copy_file_missing_source() {
    let temp_dir = TempDir::new().expect("temp dir");
    let err = copy_file(
        temp_dir.path().join("missing"),
        temp_dir.path().join("out"),
        Strategy::Buffered,
        1024,
    )
    .unwrap_err();
    assert_eq!(
        err_io_kind(&err),
        Some(std::io::ErrorKind::NotFound),
        "unexpected error: {err}"
    );
}

fn err_io_kind(err: &Error) -> Option<std::io::ErrorKind> {
    match err {
        Error::Endpoint(e) => e.io_kind(),
        _ => None,
    }
}

#[test]
fn test_scatter_fills_first_window_before_second() {
    let temp_dir = TempDir::new().expect("temp dir");
    let (src, payload) = write_fixture(&temp_dir, "1.jpg", 1124);
    let dst = temp_dir.path().join("4.jpg");

    let mut source = FileEndpoint::open(&src, OpenMode::READ).expect("open source");
    let mut windows = [ByteWindow::allocate(100), ByteWindow::allocate(1024)];

    let status = source.read_into_all(&mut windows).expect("scatter");
    assert_eq!(status, ReadStatus::Bytes(1124));
    assert_eq!(windows[0].position(), 100);
    assert_eq!(windows[1].position(), 1024);
    assert_eq!(&windows[0].array()[..], &payload[..100]);

    // exhausted source
    let mut more = [ByteWindow::allocate(8)];
    assert_eq!(source.read_into_all(&mut more).expect("eof"), ReadStatus::Eof);

    for window in &mut windows {
        window.flip();
    }
    let mut sink = FileEndpoint::open(&dst, OpenMode::WRITE | OpenMode::CREATE).expect("open sink");
    assert_eq!(sink.write_from_all(&mut windows).expect("gather"), 1124);
    assert!(windows.iter().all(|w| !w.has_remaining()));
    sink.close().expect("close sink");

    assert_eq!(std::fs::read(&dst).expect("read dst"), payload);
}

#[test]
fn test_scatter_short_source_leaves_later_windows_empty() {
    let mut source = MemoryEndpoint::from_bytes(vec![1u8; 50]);
    let mut windows = [ByteWindow::allocate(100), ByteWindow::allocate(100)];

    assert_eq!(
        source.read_into_all(&mut windows).expect("scatter"),
        ReadStatus::Bytes(50)
    );
    assert_eq!(windows[0].position(), 50);
    assert_eq!(windows[1].position(), 0);
}

#[test]
fn test_gather_stops_when_sink_is_full() {
    let mut sink = MemoryEndpoint::bounded(5);
    let mut windows = [
        ByteWindow::wrap(b"abc".to_vec()),
        ByteWindow::wrap(b"def".to_vec()),
    ];

    assert_eq!(sink.write_from_all(&mut windows).expect("gather"), 5);
    assert_eq!(sink.contents(), b"abcde");
    assert_eq!(windows[1].remaining(), 1);
}

#[test]
fn test_stalled_sink_is_reported() {
    let mut source = MemoryEndpoint::from_bytes(vec![3u8; 20]);
    let mut sink = MemoryEndpoint::bounded(10);
    let mut window = ByteWindow::allocate(16);

    let err = transfer::copy(&mut source, &mut sink, &mut window).unwrap_err();
    assert!(matches!(
        err,
        Error::Transfer(chanio::TransferError::SinkStalled { .. })
    ));
    assert_eq!(sink.contents().len(), 10);
}

#[test]
fn test_pipe_round_trip() {
    let (mut sink, mut source) = pipe().expect("pipe");
    let message = "this is a message";

    let mut window = ByteWindow::allocate(1024);
    window.put(message.as_bytes()).expect("put");
    window.flip();
    assert_eq!(sink.write_from(&mut window).expect("write"), message.len());
    sink.close().expect("close sink");

    window.clear();
    let read = source.read_into(&mut window).expect("read");
    assert_eq!(read, ReadStatus::Bytes(message.len()));
    window.flip();
    assert_eq!(window.as_readable(), message.as_bytes());

    window.clear();
    assert_eq!(source.read_into(&mut window).expect("eof"), ReadStatus::Eof);
    assert_eq!(ReadStatus::Eof.as_count(), -1);
}

#[test]
fn test_pipe_feeds_transfer_engine() {
    let (mut sink, mut source) = pipe().expect("pipe");
    let mut window = ByteWindow::wrap(vec![b'z'; 3000]);
    sink.write_from(&mut window).expect("write");
    sink.close().expect("close sink");

    let mut out = MemoryEndpoint::sink();
    let mut small = ByteWindow::allocate(512);
    let report = transfer::copy(&mut source, &mut out, &mut small).expect("copy");
    assert_eq!(report.bytes, 3000);
    assert_eq!(out.contents(), vec![b'z'; 3000].as_slice());
}

#[test]
fn test_closed_endpoint_rejects_io() {
    let temp_dir = TempDir::new().expect("temp dir");
    let (src, _) = write_fixture(&temp_dir, "src.bin", 10);
    let mut source = FileEndpoint::open(&src, OpenMode::READ).expect("open");
    source.close().expect("close");
    source.close().expect("second close is a no-op");

    let mut window = ByteWindow::allocate(4);
    let err = source.read_into(&mut window).unwrap_err();
    assert!(matches!(err, Error::Endpoint(EndpointError::Closed { .. })));
    assert_eq!(window.position(), 0);
}

#[test_case(OpenMode::empty() ; "no flags")]
#[test_case(OpenMode::CREATE ; "create alone")]
#[test_case(OpenMode::READ | OpenMode::CREATE ; "create without write")]
fn test_invalid_open_modes(mode: OpenMode) {
    let temp_dir = TempDir::new().expect("temp dir");
    let err = FileEndpoint::open(temp_dir.path().join("f"), mode).unwrap_err();
    assert!(matches!(
        err,
        Error::Endpoint(EndpointError::InvalidMode { .. })
    ));
}

#[test]
fn test_read_only_file_rejects_write() {
    let temp_dir = TempDir::new().expect("temp dir");
    let (src, _) = write_fixture(&temp_dir, "src.bin", 10);
    let mut source = FileEndpoint::open(&src, OpenMode::READ).expect("open");
    let mut window = ByteWindow::wrap(b"nope".to_vec());

    let err = source.write_from(&mut window).unwrap_err();
    assert!(matches!(
        err,
        Error::Endpoint(EndpointError::UnsupportedOperation { .. })
    ));
    assert_eq!(window.position(), 0);
}

#[test]
fn test_direct_transfer_fully() {
    let temp_dir = TempDir::new().expect("temp dir");
    let (src, payload) = write_fixture(&temp_dir, "1.jpg", 5000);
    let dst = temp_dir.path().join("3.jpg");

    let mut source = FileEndpoint::open(&src, OpenMode::READ).expect("open source");
    let mut sink = FileEndpoint::open(&dst, OpenMode::WRITE | OpenMode::CREATE).expect("open sink");
    let size = source.size().expect("size");

    let report = transfer::transfer_fully(&mut source, &mut sink, 0, size).expect("transfer");
    assert_eq!(report.bytes, 5000);
    sink.close().expect("close");
    assert_eq!(std::fs::read(&dst).expect("read dst"), payload);
}

mod property_tests {
    use chanio::{ByteWindow, MemoryEndpoint, WindowError, transfer};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn flip_sets_limit_to_position(capacity in 0usize..512, fill in 0usize..512) {
            let fill = fill.min(capacity);
            let mut window = ByteWindow::allocate(capacity);
            window.put(&vec![1u8; fill]).unwrap();
            window.mark();
            window.flip();
            prop_assert_eq!(window.limit(), fill);
            prop_assert_eq!(window.position(), 0);
            prop_assert_eq!(window.mark_position(), None);
        }

        #[test]
        fn clear_restores_write_mode(capacity in 1usize..512, fill in 0usize..512, take in 0usize..512) {
            let fill = fill.min(capacity);
            let mut window = ByteWindow::allocate(capacity);
            window.put(&vec![2u8; fill]).unwrap();
            window.flip();
            let _ = window.get(take.min(fill)).unwrap();
            window.clear();
            prop_assert_eq!(window.position(), 0);
            prop_assert_eq!(window.limit(), capacity);
            prop_assert_eq!(window.capacity(), capacity);
            prop_assert_eq!(window.mark_position(), None);
        }

        #[test]
        fn cursor_ordering_holds(capacity in 0usize..256, ops in prop::collection::vec(0u8..6, 0..40)) {
            let mut window = ByteWindow::allocate(capacity);
            for op in ops {
                match op {
                    0 => { let _ = window.put(&[9u8; 3]); }
                    1 => { let _ = window.get(2); }
                    2 => window.flip(),
                    3 => window.clear(),
                    4 => window.mark(),
                    _ => { let _ = window.reset(); }
                }
                prop_assert!(window.position() <= window.limit());
                prop_assert!(window.limit() <= window.capacity());
                if let Some(mark) = window.mark_position() {
                    prop_assert!(mark <= window.position());
                }
            }
        }

        #[test]
        fn failed_put_changes_nothing(capacity in 0usize..64, extra in 1usize..64) {
            let mut window = ByteWindow::allocate(capacity);
            let before = window.snapshot();
            let err = window.put(&vec![0u8; capacity + extra]).unwrap_err();
            let is_overflow = matches!(err, WindowError::Overflow { .. });
            prop_assert!(is_overflow);
            prop_assert_eq!(window.snapshot(), before);
        }

        #[test]
        fn failed_get_changes_nothing(data in prop::collection::vec(any::<u8>(), 0..64), extra in 1usize..16) {
            let mut window = ByteWindow::wrap(data.clone());
            let before = window.snapshot();
            let err = window.get(data.len() + extra).unwrap_err();
            let is_underflow = matches!(err, WindowError::Underflow { .. });
            prop_assert!(is_underflow);
            prop_assert_eq!(window.snapshot(), before);
        }

        #[test]
        fn mark_then_reset_returns_to_mark(data in prop::collection::vec(any::<u8>(), 1..64), skip in 0usize..64, more in 0usize..64) {
            let mut window = ByteWindow::wrap(data.clone());
            let skip = skip.min(data.len());
            let _ = window.get(skip).unwrap();
            window.mark();
            let _ = window.get(more.min(data.len() - skip)).unwrap();
            window.reset().unwrap();
            prop_assert_eq!(window.position(), skip);
        }

        #[test]
        fn put_flip_get_round_trips(data in prop::collection::vec(any::<u8>(), 0..256)) {
            let mut window = ByteWindow::allocate(256);
            window.put(&data).unwrap();
            window.flip();
            prop_assert_eq!(window.get(window.remaining()).unwrap(), data);
        }

        #[test]
        fn copy_runs_ceil_cycles(len in 0usize..4096, capacity in 1usize..600) {
            let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let mut source = MemoryEndpoint::from_bytes(data.clone());
            let mut sink = MemoryEndpoint::sink();
            let mut window = ByteWindow::allocate(capacity);

            let report = transfer::copy(&mut source, &mut sink, &mut window).unwrap();
            prop_assert_eq!(report.cycles, len.div_ceil(capacity) as u64);
            prop_assert_eq!(sink.contents(), data.as_slice());
        }
    }
}

/// CLI command integration tests.
mod cli_tests {
    use chanio::cli::commands::execute;
    use chanio::cli::parser::{Cli, Commands};
    use tempfile::TempDir;

    fn make_cli(format: &str, command: Commands) -> Cli {
        Cli {
            verbose: false,
            format: format.to_string(),
            command,
        }
    }

    #[test]
    fn test_cmd_copy_each_strategy() {
        let temp_dir = TempDir::new().expect("temp dir");
        let src = temp_dir.path().join("src.bin");
        std::fs::write(&src, vec![4u8; 3000]).expect("write src");

        for strategy in ["buffered", "direct", "mapped", "mmap"] {
            let dst = temp_dir.path().join(format!("{strategy}.bin"));
            let cli = make_cli(
                "json",
                Commands::Copy {
                    src: src.clone(),
                    dst: dst.clone(),
                    strategy: strategy.to_string(),
                    window_size: 1024,
                },
            );
            let output = execute(&cli).expect("copy");
            let value: serde_json::Value = serde_json::from_str(&output).expect("json");
            assert_eq!(value["bytes"], 3000);
            assert_eq!(std::fs::read(&dst).expect("read dst"), vec![4u8; 3000]);
        }
    }

    #[test]
    fn test_cmd_copy_text_reports_cycles() {
        let temp_dir = TempDir::new().expect("temp dir");
        let src = temp_dir.path().join("src.bin");
        std::fs::write(&src, vec![4u8; 3000]).expect("write src");

        let cli = make_cli(
            "text",
            Commands::Copy {
                src,
                dst: temp_dir.path().join("dst.bin"),
                strategy: "buffered".to_string(),
                window_size: 1024,
            },
        );
        let output = execute(&cli).expect("copy");
        assert!(output.contains("Cycles:    3"));
    }

    #[test]
    fn test_cmd_inspect_text() {
        let cli = make_cli(
            "text",
            Commands::Inspect {
                text: "abcdef".to_string(),
                capacity: 1024,
            },
        );
        let output = execute(&cli).expect("inspect");
        assert!(output.contains("flip()"));
        assert!(output.contains("output:   abcdef"));
    }

    #[test]
    fn test_cmd_pipe_text() {
        let cli = make_cli(
            "text",
            Commands::Pipe {
                message: "this is a message".to_string(),
                capacity: 1024,
            },
        );
        let output = execute(&cli).expect("pipe");
        assert!(output.starts_with("this is a message\n"));
    }
}

/// Binary-level tests.
mod binary_tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn chanio() -> Command {
        let mut cmd = Command::cargo_bin("chanio").expect("binary");
        cmd.env_remove("CHANIO_FORMAT").env_remove("CHANIO_WINDOW_SIZE");
        cmd
    }

    #[test]
    fn test_binary_copy() {
        let temp_dir = TempDir::new().expect("temp dir");
        let src = temp_dir.path().join("src.bin");
        let dst = temp_dir.path().join("dst.bin");
        std::fs::write(&src, b"hello from a file").expect("write src");

        chanio()
            .arg("copy")
            .arg(&src)
            .arg(&dst)
            .args(["--strategy", "direct"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Copied 17 B"));
        assert_eq!(std::fs::read(&dst).expect("read dst"), b"hello from a file");
    }

    #[test]
    fn test_binary_window_size_from_env() {
        let temp_dir = TempDir::new().expect("temp dir");
        let src = temp_dir.path().join("src.bin");
        std::fs::write(&src, vec![0u8; 100]).expect("write src");

        chanio()
            .env("CHANIO_WINDOW_SIZE", "10")
            .arg("copy")
            .arg(&src)
            .arg(temp_dir.path().join("dst.bin"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Cycles:    10"));
    }

    #[test]
    fn test_binary_missing_source_json_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        chanio()
            .args(["--format", "json", "copy"])
            .arg(temp_dir.path().join("missing"))
            .arg(temp_dir.path().join("out"))
            .assert()
            .failure()
            .stdout(predicate::str::contains("\"error\""));
    }

    #[test]
    fn test_binary_inspect_overflow_text_error() {
        chanio()
            .args(["inspect", "too long for it", "--capacity", "4"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("buffer overflow"));
    }

    #[test]
    fn test_binary_pipe() {
        chanio()
            .args(["pipe", "through the pipe"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("through the pipe"));
    }
}
