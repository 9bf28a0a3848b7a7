//! Transfer guard module
//!
//! File bodies are streamed to the socket in fixed-size chunks. When a client
//! hangs up in the middle (a browser cancelling a large tile download), the
//! resulting write error is recognised here and absorbed; every other failure
//! is still reported as a server-side error.

use crate::logger;
use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::error::Error as StdError;
use std::io::{self, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, ReadBuf};

/// Read size for each body frame
pub const CHUNK_SIZE: usize = 64 * 1024;

/// How a failed transfer should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The peer closed or reset the connection; nothing to report
    PeerAborted,
    /// A genuine failure (disk, permissions, protocol)
    Failed,
}

/// Streaming body over (a window of) an open file
pub struct FileBody {
    file: File,
    remaining: u64,
}

impl FileBody {
    /// Stream `len` bytes from the current position of `file`.
    pub fn new(file: File, len: u64) -> Self {
        Self {
            file,
            remaining: len,
        }
    }

    /// Open `path` and stream `len` bytes starting at `start`.
    pub async fn open_range(path: &Path, start: u64, len: u64) -> io::Result<Self> {
        let mut file = File::open(path).await?;
        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }
        Ok(Self::new(file, len))
    }
}

impl Body for FileBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.remaining == 0 {
            return Poll::Ready(None);
        }

        let want = usize::try_from(this.remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
        // Each frame owns its chunk, so the filled part moves into `Bytes` without a copy
        let mut chunk = vec![0; want];
        let mut read_buf = ReadBuf::new(&mut chunk);

        match Pin::new(&mut this.file).poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Ready(Ok(())) => {
                let filled = read_buf.filled().len();
                if filled == 0 {
                    // File shrank after Content-Length went out
                    this.remaining = 0;
                    return Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "file truncated during transfer",
                    ))));
                }
                this.remaining -= filled as u64;
                chunk.truncate(filled);
                Poll::Ready(Some(Ok(Frame::data(Bytes::from(chunk)))))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == 0
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }
}

/// Whether an I/O error kind means the peer went away
pub const fn is_peer_disconnect(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
    )
}

pub fn classify_io(err: &io::Error) -> TransferOutcome {
    if is_peer_disconnect(err.kind()) {
        TransferOutcome::PeerAborted
    } else {
        TransferOutcome::Failed
    }
}

/// Walk the source chain; the first I/O error found decides.
pub fn classify(err: &(dyn StdError + 'static)) -> TransferOutcome {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return classify_io(io_err);
        }
        current = e.source();
    }
    TransferOutcome::Failed
}

/// Classify an error returned by a hyper connection future.
pub fn classify_connection_error(err: &hyper::Error) -> TransferOutcome {
    if err.is_canceled() || err.is_incomplete_message() || err.is_body_write_aborted() {
        return TransferOutcome::PeerAborted;
    }
    classify(err)
}

/// Log a connection error according to its classification.
///
/// Peer aborts only show up at debug level.
pub fn report_connection_error(err: &hyper::Error) -> TransferOutcome {
    let outcome = classify_connection_error(err);
    match outcome {
        TransferOutcome::PeerAborted => {
            logger::log_debug(&format!("Client closed connection mid-transfer: {err}"));
        }
        TransferOutcome::Failed => logger::log_connection_error(err),
    }
    outcome
}
