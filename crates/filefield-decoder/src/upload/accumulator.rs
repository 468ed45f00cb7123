//! Per-file accumulation.
//!
//! The orchestrator forwards a file part's chunks over a bounded channel to a
//! [`StreamAccumulator`] running on its own task. The accumulator enforces the field's byte
//! ceiling on every chunk and settles exactly once.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use filefield_core::{FieldConstraint, FileValue, FormError, SizeLimitScope};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::classifier::FilePart;
use crate::validator::ConstraintEnforcer;

/// What the orchestrator sends down a file part's channel.
#[derive(Debug)]
pub enum ChunkEvent {
    Data(Bytes),
    /// The part ended cleanly.
    End,
    Failed(ChunkError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// The body stream or tokenizer failed mid-part.
    Transport(String),
    /// The part went over the decode-wide byte cap.
    LimitReached { limit: u64, observed: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    Reading,
    Complete,
    Rejected,
    Aborted,
}

/// A fully read file that still has to pass the completion-time occurrence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub key: String,
    pub constraint: Arc<FieldConstraint>,
    pub file: FileValue,
}

#[derive(Debug)]
pub enum Settlement {
    Complete(FileCandidate),
    Rejected(FormError),
    Aborted(FormError),
    /// The decode was cancelled while this part was still reading.
    Cancelled,
}

#[derive(Debug)]
pub struct StreamAccumulator {
    part: FilePart,
    buffer: BytesMut,
    received: u64,
    state: AccumulatorState,
}

impl StreamAccumulator {
    pub fn new(part: FilePart) -> Self {
        Self {
            part,
            buffer: BytesMut::new(),
            received: 0,
            state: AccumulatorState::Reading,
        }
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Bytes accepted so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Bytes currently held in memory.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append one chunk, rejecting it before it is buffered if it would break the
    /// field's byte ceiling.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), FormError> {
        if self.state != AccumulatorState::Reading {
            return Err(FormError::Internal(format!(
                "chunk pushed to settled accumulation for field '{}'",
                self.part.name
            )));
        }

        let enforcer = ConstraintEnforcer::new(&self.part.constraint);
        if let Err(err) = enforcer.check_byte_budget(self.received, chunk.len()) {
            self.state = AccumulatorState::Rejected;
            self.buffer = BytesMut::new();
            return Err(err);
        }

        self.buffer.extend_from_slice(chunk);
        self.received += chunk.len() as u64;
        Ok(())
    }

    /// Settle after the part ended cleanly.
    pub fn finish(self) -> Settlement {
        match self.state {
            AccumulatorState::Reading => {
                let FilePart {
                    name,
                    key,
                    filename,
                    media_type,
                    encoding,
                    constraint,
                } = self.part;

                Settlement::Complete(FileCandidate {
                    key,
                    constraint,
                    file: FileValue {
                        field_name: name,
                        filename,
                        media_type,
                        encoding,
                        content: self.buffer.freeze(),
                    },
                })
            }
            state => Settlement::Aborted(FormError::Internal(format!(
                "accumulation for field '{}' finished in state {:?}",
                self.part.name, state
            ))),
        }
    }

    /// Consume chunk events until the part settles or `cancel` fires.
    ///
    /// Returning drops the receiver, which tells the sender to stop forwarding and
    /// discard the rest of the part.
    pub async fn run(
        mut self,
        mut chunks: mpsc::Receiver<ChunkEvent>,
        cancel: CancellationToken,
    ) -> Settlement {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(
                        field_name = %self.part.name,
                        received = self.received,
                        "File accumulation cancelled"
                    );
                    return Settlement::Cancelled;
                }
                event = chunks.recv() => event,
            };

            match event {
                Some(ChunkEvent::Data(chunk)) => {
                    if let Err(err) = self.push(&chunk) {
                        tracing::debug!(
                            field_name = %self.part.name,
                            limit = ?self.part.constraint.max_size(),
                            "File rejected while streaming"
                        );
                        return Settlement::Rejected(err);
                    }
                }
                Some(ChunkEvent::End) => {
                    tracing::debug!(
                        field_name = %self.part.name,
                        size = self.received,
                        "File part fully read"
                    );
                    return self.finish();
                }
                Some(ChunkEvent::Failed(ChunkError::LimitReached { limit, observed })) => {
                    self.state = AccumulatorState::Rejected;
                    return Settlement::Rejected(FormError::SizeLimit {
                        scope: SizeLimitScope::Transport,
                        field_name: Some(self.part.constraint.field_name().to_string()),
                        limit,
                        observed,
                    });
                }
                Some(ChunkEvent::Failed(ChunkError::Transport(message))) => {
                    self.state = AccumulatorState::Aborted;
                    return Settlement::Aborted(FormError::transport_message(message));
                }
                None => {
                    self.state = AccumulatorState::Aborted;
                    return Settlement::Aborted(FormError::transport_message(format!(
                        "stream for field '{}' closed before the part ended",
                        self.part.name
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filefield_core::ErrorKind;

    fn thumbnail_part(max_size: u64) -> FilePart {
        FilePart {
            name: "thumbnail".to_string(),
            key: "thumbnail".to_string(),
            filename: "thumb.webp".to_string(),
            media_type: "image/webp".to_string(),
            encoding: "7bit".to_string(),
            constraint: Arc::new(FieldConstraint::new("thumbnail").with_max_size(max_size)),
        }
    }

    #[test]
    fn push_rejects_before_buffering_oversized_chunk() {
        let mut accumulator = StreamAccumulator::new(thumbnail_part(100));
        accumulator.push(&[0u8; 60]).unwrap();
        assert_eq!(accumulator.buffered(), 60);

        let err = accumulator.push(&[0u8; 60]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeLimit);
        assert_eq!(accumulator.state(), AccumulatorState::Rejected);
        assert_eq!(accumulator.received(), 60);
        assert_eq!(accumulator.buffered(), 0);

        assert!(accumulator.push(b"x").is_err());
    }

    #[test]
    fn finish_produces_candidate() {
        let mut accumulator = StreamAccumulator::new(thumbnail_part(100));
        accumulator.push(b"hello ").unwrap();
        accumulator.push(b"world").unwrap();

        match accumulator.finish() {
            Settlement::Complete(candidate) => {
                assert_eq!(candidate.key, "thumbnail");
                assert_eq!(candidate.file.content.as_ref(), b"hello world");
                assert_eq!(candidate.file.filename, "thumb.webp");
                assert_eq!(candidate.file.size(), 11);
            }
            other => panic!("unexpected settlement: {:?}", other),
        }
    }

    #[tokio::test]
    async fn run_completes_on_end() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(
            StreamAccumulator::new(thumbnail_part(0)).run(rx, CancellationToken::new()),
        );

        tx.send(ChunkEvent::Data(Bytes::from_static(b"abc"))).await.unwrap();
        tx.send(ChunkEvent::End).await.unwrap();

        match handle.await.unwrap() {
            Settlement::Complete(candidate) => assert_eq!(candidate.file.size(), 3),
            other => panic!("unexpected settlement: {:?}", other),
        }
    }

    #[tokio::test]
    async fn run_rejects_and_detaches_sender() {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(
            StreamAccumulator::new(thumbnail_part(100)).run(rx, CancellationToken::new()),
        );

        tx.send(ChunkEvent::Data(Bytes::from(vec![0u8; 150])))
            .await
            .unwrap();

        match handle.await.unwrap() {
            Settlement::Rejected(FormError::SizeLimit {
                field_name, limit, ..
            }) => {
                assert_eq!(field_name.as_deref(), Some("thumbnail"));
                assert_eq!(limit, 100);
            }
            other => panic!("unexpected settlement: {:?}", other),
        }
        assert!(tx.send(ChunkEvent::End).await.is_err());
    }

    #[tokio::test]
    async fn run_aborts_when_sender_disappears() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(ChunkEvent::Data(Bytes::from_static(b"partial")))
            .await
            .unwrap();
        drop(tx);

        let settlement = StreamAccumulator::new(thumbnail_part(0))
            .run(rx, CancellationToken::new())
            .await;
        assert!(matches!(
            settlement,
            Settlement::Aborted(FormError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn run_reports_transport_limit() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(ChunkEvent::Failed(ChunkError::LimitReached {
            limit: 10,
            observed: 12,
        }))
        .await
        .unwrap();

        let settlement = StreamAccumulator::new(thumbnail_part(0))
            .run(rx, CancellationToken::new())
            .await;
        match settlement {
            Settlement::Rejected(FormError::SizeLimit {
                scope, observed, ..
            }) => {
                assert_eq!(scope, SizeLimitScope::Transport);
                assert_eq!(observed, 12);
            }
            other => panic!("unexpected settlement: {:?}", other),
        }
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let (_tx, rx) = mpsc::channel::<ChunkEvent>(4);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let settlement = StreamAccumulator::new(thumbnail_part(0))
            .run(rx, cancel)
            .await;
        assert!(matches!(settlement, Settlement::Cancelled));
    }
}
