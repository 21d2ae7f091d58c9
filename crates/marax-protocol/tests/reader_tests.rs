//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "tests"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Deadline and buffering behaviour of the line reader."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use std::io::Cursor;
use std::time::{Duration, Instant};

use marax_protocol::testing::{ChannelStream, SilentStream};
use marax_protocol::{decode, LineReader, MachineMode, ReadError};

const SLACK: Duration = Duration::from_millis(250);

#[tokio::test]
async fn returns_exact_line_bytes() {
    let reader =
        LineReader::spawn(Cursor::new(b"C1.23,068,120,054,0820,1\r\n".to_vec())).unwrap();
    let line = reader.read_line(Duration::from_secs(1)).await.unwrap();
    assert_eq!(line, b"C1.23,068,120,054,0820,1\r\n");
}

#[tokio::test]
async fn silent_device_times_out_on_schedule() {
    let reader = LineReader::spawn(SilentStream::new(Duration::from_millis(10))).unwrap();
    let timeout = Duration::from_millis(100);

    let started = Instant::now();
    let err = reader.read_line(timeout).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout(), "unexpected error: {err:?}");
    assert!(elapsed >= timeout);
    assert!(elapsed <= timeout + SLACK, "waited {elapsed:?}");
}

#[tokio::test]
async fn blocked_read_does_not_hold_the_caller() {
    // no data is ever fed, so the worker's read blocks for the whole test
    let (_feeder, stream) = ChannelStream::blocking();
    let reader = LineReader::spawn(stream).unwrap();
    let timeout = Duration::from_millis(80);

    let started = Instant::now();
    let err = reader.read_line(timeout).await.unwrap_err();
    assert!(matches!(err, ReadError::Timeout(t) if t == timeout));
    assert!(started.elapsed() <= timeout + SLACK);
}

#[tokio::test]
async fn line_that_arrives_too_late_is_discarded() {
    let (feeder, stream) = ChannelStream::blocking();
    let reader = LineReader::spawn(stream).unwrap();

    let err = reader.read_line(Duration::from_millis(50)).await.unwrap_err();
    assert!(err.is_timeout());

    feeder.feed("C1.23,068,120,054,0820,1\r\n");
    feeder.feed("V2.0,100,140,060,0000,0\r\n");

    let line = reader.read_line(Duration::from_secs(1)).await.unwrap();
    let status = decode(&line).unwrap();
    assert_eq!(status.mode, MachineMode::Steam);
    assert_eq!(status.version, "2.0");
}

#[tokio::test]
async fn cancelled_half_line_is_lost() {
    let (feeder, stream) = ChannelStream::polling(Duration::from_millis(5));
    let reader = LineReader::spawn(stream).unwrap();

    feeder.feed("C1.23,06");
    let err = reader.read_line(Duration::from_millis(60)).await.unwrap_err();
    assert!(err.is_timeout());

    // give the worker a poll tick to notice the caller is gone
    tokio::time::sleep(Duration::from_millis(30)).await;

    feeder.feed("8,120,054,0820,1\r\n");
    let line = reader.read_line(Duration::from_secs(1)).await.unwrap();
    assert_eq!(line, b"8,120,054,0820,1\r\n");
    assert!(decode(&line).unwrap_err().is_structural());
}

#[tokio::test]
async fn reads_resume_where_the_buffer_left_off() {
    let (feeder, stream) = ChannelStream::blocking();
    let reader = LineReader::spawn(stream).unwrap();

    feeder.feed("C1.23,068,120,054,0820,1\r\nV2.0,100,");
    let first = reader.read_line(Duration::from_secs(1)).await.unwrap();
    assert_eq!(first, b"C1.23,068,120,054,0820,1\r\n");

    feeder.feed("140,060,0000,0\r\n");
    let second = reader.read_line(Duration::from_secs(1)).await.unwrap();
    assert_eq!(second, b"V2.0,100,140,060,0000,0\r\n");
}

#[tokio::test]
async fn concurrent_callers_each_get_a_whole_line() {
    let (feeder, stream) = ChannelStream::blocking();
    let reader = LineReader::spawn(stream).unwrap();

    let a = tokio::spawn({
        let reader = reader.clone();
        async move { reader.read_line(Duration::from_secs(2)).await }
    });
    let b = tokio::spawn({
        let reader = reader.clone();
        async move { reader.read_line(Duration::from_secs(2)).await }
    });

    feeder.feed("C1.23,068,120,054,0820,1\r\n");
    feeder.feed("V2.0,100,140,060,0000,0\r\n");

    let mut lines = vec![a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
    lines.sort();
    assert_eq!(
        lines,
        vec![
            b"C1.23,068,120,054,0820,1\r\n".to_vec(),
            b"V2.0,100,140,060,0000,0\r\n".to_vec(),
        ]
    );
}

#[tokio::test]
async fn closed_stream_keeps_reporting_errors() {
    let (feeder, stream) = ChannelStream::blocking();
    let reader = LineReader::spawn(stream).unwrap();
    drop(feeder);

    for _ in 0..2 {
        let err = reader.read_line(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ReadError::Stream(_)), "unexpected error: {err:?}");
    }
    assert!(reader.is_running());
}

#[tokio::test]
async fn warmup_on_a_silent_device_does_not_hold_later_callers() {
    let (feeder, stream) = ChannelStream::polling(Duration::from_millis(5));
    let reader = LineReader::spawn_with_warmup(stream, 1).unwrap();

    for _ in 0..3 {
        let started = Instant::now();
        let err = reader.read_line(Duration::from_millis(30)).await.unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err:?}");
        assert!(started.elapsed() <= Duration::from_millis(30) + SLACK);
    }
    // let the worker notice the last caller is gone before data shows up
    tokio::time::sleep(Duration::from_millis(50)).await;

    feeder.feed("120,054,0820,1\r\n");
    feeder.feed("C1.23,068,120,054,0820,1\r\n");
    let line = reader.read_line(Duration::from_secs(1)).await.unwrap();
    assert_eq!(line, b"C1.23,068,120,054,0820,1\r\n");
}
