//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "In-memory byte streams standing in for the serial port."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
//! Streams that behave like a serial port without needing one.

use std::io::{self, Read};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// A device that never says anything.
///
/// Every read sleeps for `poll` and then reports `TimedOut`, the way a serial
/// port opened with a read timeout does when the line is idle.
#[derive(Debug, Clone)]
pub struct SilentStream {
    poll: Duration,
}

impl SilentStream {
    pub fn new(poll: Duration) -> Self {
        Self { poll }
    }
}

impl Read for SilentStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        thread::sleep(self.poll);
        Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
    }
}

/// Stream fed chunk by chunk from a [`StreamFeeder`].
///
/// Each fed chunk is returned by a separate read (split only if the caller's
/// buffer is smaller), so tests control exactly where the reader sees gaps.
/// Without a poll interval a read blocks until the next chunk arrives; with
/// one it reports `TimedOut` after waiting that long. Dropping the feeder
/// ends the stream.
#[derive(Debug)]
pub struct ChannelStream {
    chunks: mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
    poll: Option<Duration>,
}

/// Writing half of a [`ChannelStream`].
#[derive(Debug, Clone)]
pub struct StreamFeeder {
    chunks: mpsc::Sender<Vec<u8>>,
}

impl StreamFeeder {
    /// Queue `bytes` for the stream. Returns false once the stream is gone.
    pub fn feed(&self, bytes: impl Into<Vec<u8>>) -> bool {
        self.chunks.send(bytes.into()).is_ok()
    }
}

impl ChannelStream {
    /// Stream whose reads block until data or end of stream.
    pub fn blocking() -> (StreamFeeder, Self) {
        Self::with_poll(None)
    }

    /// Stream whose reads give up with `TimedOut` after `poll`.
    pub fn polling(poll: Duration) -> (StreamFeeder, Self) {
        Self::with_poll(Some(poll))
    }

    fn with_poll(poll: Option<Duration>) -> (StreamFeeder, Self) {
        let (chunks_tx, chunks) = mpsc::channel();
        (
            StreamFeeder { chunks: chunks_tx },
            Self {
                chunks,
                pending: Vec::new(),
                poll,
            },
        )
    }

    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self.poll {
            None => Ok(self.chunks.recv().ok()),
            Some(poll) => match self.chunks.recv_timeout(poll) {
                Ok(chunk) => Ok(Some(chunk)),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => Ok(None),
            },
        }
    }
}

impl Read for ChannelStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.next_chunk()? {
                Some(chunk) => self.pending = chunk,
                None => return Ok(0),
            }
        }
        let count = buf.len().min(self.pending.len());
        buf[..count].copy_from_slice(&self.pending[..count]);
        self.pending.drain(..count);
        Ok(count)
    }
}
