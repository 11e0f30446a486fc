use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::{Bytes, BytesMut};
use futures::Stream;

/// Re-cuts an upstream body into fixed-size chunks.
///
/// Holds at most one partial chunk plus the upstream frame being split, so
/// memory stays bounded however large the body is. Dropping the stream drops
/// the upstream body with it, which closes the connection.
pub struct RelayStream<S> {
    inner: S,
    buf: BytesMut,
    chunk_size: usize,
    relayed: u64,
    eof: bool,
    finished: bool,
    label: String,
}

impl<S> RelayStream<S> {
    pub fn new(inner: S, chunk_size: usize, label: impl Into<String>) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            inner,
            buf: BytesMut::with_capacity(chunk_size),
            chunk_size,
            relayed: 0,
            eof: false,
            finished: false,
            label: label.into(),
        }
    }

    pub fn relayed(&self) -> u64 {
        self.relayed
    }

    fn emit(&mut self, chunk: Bytes) -> Bytes {
        self.relayed += chunk.len() as u64;
        chunk
    }
}

impl<S, E> Stream for RelayStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            if this.buf.len() >= this.chunk_size {
                let chunk = this.buf.split_to(this.chunk_size).freeze();
                return Poll::Ready(Some(Ok(this.emit(chunk))));
            }

            if this.eof {
                if this.buf.is_empty() {
                    this.finished = true;
                    tracing::debug!("{}: relay complete, {} bytes", this.label, this.relayed);
                    return Poll::Ready(None);
                }
                let chunk = this.buf.split().freeze();
                return Poll::Ready(Some(Ok(this.emit(chunk))));
            }

            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(frame)) => this.buf.extend_from_slice(&frame),
                Some(Err(e)) => {
                    this.finished = true;
                    this.buf.clear();
                    tracing::warn!(
                        "{}: upstream failed after {} bytes: {}",
                        this.label,
                        this.relayed,
                        e
                    );
                    return Poll::Ready(Some(Err(e)));
                }
                None => this.eof = true,
            }
        }
    }
}

impl<S> Drop for RelayStream<S> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!(
                "{}: client went away after {} bytes, closing upstream",
                self.label,
                self.relayed
            );
        }
    }
}
