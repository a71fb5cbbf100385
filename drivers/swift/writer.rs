//! Streaming object writer
//!
//! Bytes written here travel through an in-memory pipe into a PUT request
//! running on its own task. `shutdown` closes the pipe and resolves to the
//! outcome of that request.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncWrite, DuplexStream};
use tokio::task::JoinHandle;

use super::client::SwiftError;

/// Pipe buffer between the writer and the upload task
pub(crate) const UPLOAD_PIPE_CAPACITY: usize = 256 * 1024;

pub struct ObjectWriter {
    pipe: DuplexStream,
    upload: Option<JoinHandle<Result<(), SwiftError>>>,
}

impl ObjectWriter {
    pub(crate) fn new(pipe: DuplexStream, upload: JoinHandle<Result<(), SwiftError>>) -> Self {
        Self {
            pipe,
            upload: Some(upload),
        }
    }

    /// Settle an upload whose body could not be fully written.
    ///
    /// `BrokenPipe` means the request stopped reading its body, so its own
    /// response is the real failure and is returned. Any other copy error
    /// aborts the request and is returned as `SwiftError::Io`.
    pub async fn abandon(mut self, copy_error: io::Error) -> SwiftError {
        let Some(upload) = self.upload.take() else {
            return SwiftError::Io(copy_error);
        };
        if copy_error.kind() != io::ErrorKind::BrokenPipe {
            upload.abort();
            return SwiftError::Io(copy_error);
        }
        match upload.await {
            Ok(Err(e)) => e,
            _ => SwiftError::Io(copy_error),
        }
    }
}

// Dropped before shutdown: the request is cut mid-body so the partial
// object is never committed.
impl Drop for ObjectWriter {
    fn drop(&mut self) {
        if let Some(upload) = self.upload.take() {
            upload.abort();
        }
    }
}

impl AsyncWrite for ObjectWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.pipe).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.pipe).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        ready!(Pin::new(&mut self.pipe).poll_shutdown(cx))?;

        let Some(upload) = self.upload.as_mut() else {
            return Poll::Ready(Ok(()));
        };
        let outcome = ready!(Pin::new(upload).poll(cx));
        self.upload = None;

        match outcome {
            Ok(Ok(())) => Poll::Ready(Ok(())),
            Ok(Err(e)) => Poll::Ready(Err(e.into())),
            Err(e) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("upload task ended abnormally: {}", e),
            ))),
        }
    }
}
