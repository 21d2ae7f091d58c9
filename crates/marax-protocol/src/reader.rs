//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Deadline bounded newline reader over a blocking byte stream."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
//! Bounded line reads.
//!
//! The stream is owned by a dedicated worker thread that holds the only
//! [`BufReader`] over it. Callers post a request and wait for the reply under
//! a tokio timer, so a silent device can never hold a caller past its
//! deadline. Requests are served strictly one at a time, which keeps the
//! connection single-flight no matter how many callers race for it.
//!
//! When a caller gives up, its read is abandoned. Streams that surface
//! `TimedOut`/`WouldBlock` between bytes (a serial port opened with a short
//! read timeout) let the worker notice and cancel the read, dropping the half
//! line it had collected. Streams that block indefinitely finish the read in
//! the background and the line is thrown away.

use std::io::{self, BufRead, BufReader, Read};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

/// Deadline applied to each scrape's line read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

const WORKER_NAME: &str = "marax-line-reader";

/// Failure to obtain one complete line.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("timeout reading from serial device after {0:?}")]
    Timeout(Duration),
    #[error("serial stream error: {0}")]
    Stream(#[from] io::Error),
    #[error("line reader worker is no longer running")]
    Closed,
}

impl ReadError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ReadError::Timeout(_))
    }
}

struct LineRequest {
    reply: oneshot::Sender<io::Result<Vec<u8>>>,
}

/// Handle to the worker thread that owns the byte stream.
///
/// Clones share the same worker. Once every handle is dropped the worker
/// exits after its current read returns.
#[derive(Debug, Clone)]
pub struct LineReader {
    requests: mpsc::UnboundedSender<LineRequest>,
}

impl LineReader {
    /// Move `stream` onto a new worker thread.
    pub fn spawn<R>(stream: R) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        Self::spawn_with_warmup(stream, 0)
    }

    /// Like [`LineReader::spawn`], but the first `discard` records are thrown
    /// away. The first record after opening a port is usually a fragment of
    /// whatever the device was halfway through sending.
    ///
    /// Warm-up runs on behalf of the first request and counts against its
    /// deadline; if that caller gives up, the next request picks it up.
    pub fn spawn_with_warmup<R>(stream: R, discard: usize) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (requests, inbox) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name(WORKER_NAME.to_owned())
            .spawn(move || run_worker(BufReader::new(stream), inbox, discard))?;
        Ok(Self { requests })
    }

    /// Read the next line, terminator included, or fail once `timeout` elapses.
    pub async fn read_line(&self, timeout: Duration) -> Result<Vec<u8>, ReadError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(LineRequest { reply })
            .map_err(|_| ReadError::Closed)?;

        match tokio::time::timeout(timeout, response).await {
            Ok(Ok(result)) => result.map_err(ReadError::from),
            Ok(Err(_)) => Err(ReadError::Closed),
            Err(_) => Err(ReadError::Timeout(timeout)),
        }
    }

    /// Whether the worker thread is still accepting requests.
    pub fn is_running(&self) -> bool {
        !self.requests.is_closed()
    }
}

fn run_worker<R: Read>(
    mut reader: BufReader<R>,
    mut inbox: mpsc::UnboundedReceiver<LineRequest>,
    discard: usize,
) {
    let mut warmup = discard;
    while let Some(request) = inbox.blocking_recv() {
        if request.reply.is_closed() {
            debug!("line request abandoned before the read started");
            continue;
        }
        if !discard_warmup(&mut reader, &mut warmup, || request.reply.is_closed()) {
            debug!(remaining = warmup, "warm-up cancelled after its caller timed out");
            continue;
        }
        match next_line(&mut reader, || request.reply.is_closed()) {
            Some(result) => {
                if let Ok(line) = &result {
                    trace!(bytes = line.len(), "line read");
                }
                if request.reply.send(result).is_err() {
                    debug!("discarding line completed after its caller timed out");
                }
            }
            None => debug!("line read cancelled after its caller timed out"),
        }
    }
    debug!("line reader worker exiting");
}

/// Throw away up to `remaining` records, counting down as they go.
///
/// Returns false if the caller was abandoned first. A failed read ends the
/// warm-up; the following read reports the stream's state to the caller.
fn discard_warmup<R, F>(reader: &mut R, remaining: &mut usize, abandoned: F) -> bool
where
    R: BufRead,
    F: Fn() -> bool,
{
    while *remaining > 0 {
        match next_line(reader, &abandoned) {
            Some(Ok(line)) => {
                *remaining -= 1;
                debug!(remaining = *remaining, bytes = line.len(), "discarded warm-up record");
            }
            Some(Err(err)) => {
                warn!(error = %err, "warm-up read failed");
                *remaining = 0;
            }
            None => return false,
        }
    }
    true
}

/// Collect bytes up to and including the next `\n`.
///
/// Returns `None` when `abandoned` reports the caller is gone at one of the
/// stream's poll timeouts; the partial line is dropped in that case.
fn next_line<R, F>(reader: &mut R, abandoned: F) -> Option<io::Result<Vec<u8>>>
where
    R: BufRead,
    F: Fn() -> bool,
{
    let mut line = Vec::new();
    loop {
        match reader.read_until(b'\n', &mut line) {
            Ok(_) if line.last() == Some(&b'\n') => return Some(Ok(line)),
            Ok(_) => {
                return Some(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended before end of line",
                )))
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                ) =>
            {
                if abandoned() {
                    trace!(partial = line.len(), "dropping partial line");
                    return None;
                }
            }
            Err(err) => return Some(Err(err)),
        }
    }
}
