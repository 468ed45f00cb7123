//! Decoder orchestration.
//!
//! A decode tokenizes the body with `multer`, handles scalar parts inline in wire order
//! and hands each declared file part to a [`StreamAccumulator`] task. The record is only
//! ever mutated here, once per scalar part and once per settled file.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use filefield_core::limits::{MAX_FIELD_VALUE_BYTES, MAX_PARTS, MULTIPART_FORM_DATA};
use filefield_core::{
    DecoderConfig, FileFieldSchema, FormError, MalformedReason, ResultRecord, SchemaIndex,
    SchemaRegistry, SizeLimitScope,
};
use futures::Stream;
use multer::{Field, Multipart};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::accumulator::{ChunkError, ChunkEvent, Settlement, StreamAccumulator};
use super::assembler::{append_file, append_scalar};
use super::classifier::{classify, FilePart, PartKind, RawPart};
use crate::validator::ConstraintEnforcer;

/// Result of a decode call.
pub enum DecodeOutcome<S> {
    Decoded(ResultRecord),
    /// Nothing to decode; the caller's body is handed back unpolled.
    Untouched(S),
}

impl<S> DecodeOutcome<S> {
    pub fn is_decoded(&self) -> bool {
        matches!(self, DecodeOutcome::Decoded(_))
    }

    pub fn into_record(self) -> Option<ResultRecord> {
        match self {
            DecodeOutcome::Decoded(record) => Some(record),
            DecodeOutcome::Untouched(_) => None,
        }
    }
}

impl<S> fmt::Debug for DecodeOutcome<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeOutcome::Decoded(record) => f.debug_tuple("Decoded").field(record).finish(),
            DecodeOutcome::Untouched(_) => f.write_str("Untouched(..)"),
        }
    }
}

/// Whether a `Content-Type` value announces a `multipart/form-data` body.
pub fn is_multipart_form_data(content_type: &str) -> bool {
    content_type
        .trim_start()
        .get(..MULTIPART_FORM_DATA.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MULTIPART_FORM_DATA))
}

/// Streaming multipart decoder bound to a schema registry.
#[derive(Clone)]
pub struct MultipartDecoder {
    config: DecoderConfig,
    registry: SchemaRegistry,
}

impl MultipartDecoder {
    /// Create a decoder using the process-wide schema registry.
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            registry: SchemaRegistry::global().clone(),
        }
    }

    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Decode `body` against the file fields declared by `T`.
    ///
    /// A body that is not `multipart/form-data` is returned untouched before the schema
    /// is looked at. A schema that cannot be built fails before any byte is read.
    pub async fn decode<T, S, O, E>(
        &self,
        content_type: &str,
        body: S,
    ) -> Result<DecodeOutcome<S>, FormError>
    where
        T: FileFieldSchema,
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        if !is_multipart_form_data(content_type) {
            return Ok(DecodeOutcome::Untouched(body));
        }

        let index = self.registry.resolve::<T>()?;
        self.decode_with_index(index, content_type, body).await
    }

    /// Decode `body` against an index built outside the registry.
    pub async fn decode_with_index<S, O, E>(
        &self,
        index: Arc<SchemaIndex>,
        content_type: &str,
        body: S,
    ) -> Result<DecodeOutcome<S>, FormError>
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        if !is_multipart_form_data(content_type) {
            tracing::debug!(content_type, "Body is not multipart/form-data, leaving it untouched");
            return Ok(DecodeOutcome::Untouched(body));
        }

        if !index.has_file_fields() && self.config.skip_without_file_fields {
            tracing::debug!(
                schema = %index.type_name(),
                "Schema declares no file fields, leaving body untouched"
            );
            return Ok(DecodeOutcome::Untouched(body));
        }

        let boundary = multer::parse_boundary(content_type).map_err(FormError::transport)?;

        let span = tracing::info_span!(
            "multipart_decode",
            decode_id = %Uuid::new_v4(),
            schema = %index.type_name(),
        );

        let session = DecodeSession::new(index, &self.config);
        session
            .run(Multipart::new(body, boundary))
            .instrument(span)
            .await
            .map(DecodeOutcome::Decoded)
    }

    /// Decode from any async reader.
    pub async fn decode_reader<R>(
        &self,
        index: Arc<SchemaIndex>,
        content_type: &str,
        reader: R,
    ) -> Result<DecodeOutcome<ReaderStream<R>>, FormError>
    where
        R: AsyncRead + Send + 'static,
    {
        self.decode_with_index(index, content_type, ReaderStream::new(reader))
            .await
    }
}

/// How forwarding a file part's bytes ended.
enum PumpOutcome {
    /// Every chunk and the end marker were delivered.
    Finished,
    /// The accumulation stopped listening or the decode-wide cap was hit. Its
    /// settlement carries the error.
    Detached,
}

/// State of one decode.
struct DecodeSession {
    index: Arc<SchemaIndex>,
    record: ResultRecord,
    accumulations: JoinSet<Settlement>,
    /// File parts per record key that started reading but have not been admitted yet.
    pending: HashMap<String, usize>,
    cancel: CancellationToken,
    channel_capacity: usize,
    drain_on_error: bool,
    transport_cap: Option<u64>,
    parts_seen: usize,
}

impl DecodeSession {
    fn new(index: Arc<SchemaIndex>, config: &DecoderConfig) -> Self {
        let transport_cap = Some(index.max_declared_file_size()).filter(|&cap| cap > 0);
        Self {
            index,
            record: ResultRecord::new(),
            accumulations: JoinSet::new(),
            pending: HashMap::new(),
            cancel: CancellationToken::new(),
            channel_capacity: config.chunk_channel_capacity.max(1),
            drain_on_error: config.drain_on_error,
            transport_cap,
            parts_seen: 0,
        }
    }

    async fn run(mut self, mut multipart: Multipart<'static>) -> Result<ResultRecord, FormError> {
        let result = match self.consume(&mut multipart).await {
            Ok(()) => self.settle().await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                tracing::info!(
                    parts = self.parts_seen,
                    fields = self.record.len(),
                    "Multipart body decoded"
                );
                Ok(self.record)
            }
            Err(err) => {
                self.cancel_outstanding().await;
                if self.drain_on_error {
                    drain_remaining(&mut multipart).await;
                }
                tracing::debug!(
                    error = %err,
                    kind = ?err.kind(),
                    parts = self.parts_seen,
                    "Multipart decode failed"
                );
                Err(err)
            }
        }
    }

    /// Walk the parts until the tokenizer reports the end of the body.
    async fn consume(&mut self, multipart: &mut Multipart<'static>) -> Result<(), FormError> {
        loop {
            self.reap_settled()?;

            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => return Ok(()),
                Err(err) => return Err(FormError::transport(err)),
            };

            self.parts_seen += 1;
            if self.parts_seen > MAX_PARTS {
                return Err(FormError::SizeLimit {
                    scope: SizeLimitScope::PartCount,
                    field_name: None,
                    limit: MAX_PARTS as u64,
                    observed: self.parts_seen as u64,
                });
            }

            self.dispatch(field).await?;
        }
    }

    async fn dispatch(&mut self, mut field: Field<'static>) -> Result<(), FormError> {
        match classify(RawPart::from_field(&field), &self.index)? {
            PartKind::Skip { name, reason } => {
                tracing::debug!(field_name = %name, ?reason, "Skipping multipart part");
                drain_field(&mut field).await
            }
            PartKind::Scalar { name } => {
                let value = read_scalar(&mut field, &name).await?;
                append_scalar(&mut self.record, &name, value);
                Ok(())
            }
            PartKind::File(part) => self.start_file(field, part).await,
        }
    }

    /// Check a file part up front, then stream it to a fresh accumulation.
    async fn start_file(&mut self, mut field: Field<'static>, part: FilePart) -> Result<(), FormError> {
        let enforcer = ConstraintEnforcer::new(&part.constraint);
        enforcer.check_media_type(&part.media_type)?;

        let in_flight = self.pending.get(&part.key).copied().unwrap_or(0);
        enforcer.check_occurrence(self.record.count(&part.key) + in_flight)?;

        tracing::debug!(
            field_name = %part.name,
            filename = %part.filename,
            media_type = %part.media_type,
            "Reading file part"
        );

        let field_name = part.name.clone();
        let (chunks, receiver) = mpsc::channel(self.channel_capacity);
        *self.pending.entry(part.key.clone()).or_default() += 1;
        self.accumulations.spawn(
            StreamAccumulator::new(part)
                .run(receiver, self.cancel.child_token())
                .in_current_span(),
        );

        match pump_field(&mut field, &chunks, self.transport_cap).await? {
            PumpOutcome::Finished => Ok(()),
            PumpOutcome::Detached => {
                // Stop reading the part here; whether the rest of the body is consumed is
                // up to the drain policy in `run`.
                drop(field);
                drop(chunks);
                self.settle().await?;
                Err(FormError::Internal(format!(
                    "file accumulation for '{}' detached without a rejection",
                    field_name
                )))
            }
        }
    }

    /// Admit every accumulation that has already settled, without waiting.
    fn reap_settled(&mut self) -> Result<(), FormError> {
        while let Some(joined) = self.accumulations.try_join_next() {
            self.admit(joined)?;
        }
        Ok(())
    }

    /// Wait for every outstanding accumulation.
    async fn settle(&mut self) -> Result<(), FormError> {
        while let Some(joined) = self.accumulations.join_next().await {
            self.admit(joined)?;
        }
        Ok(())
    }

    fn admit(&mut self, joined: Result<Settlement, JoinError>) -> Result<(), FormError> {
        let settlement = joined
            .map_err(|e| FormError::Internal(format!("file accumulation task failed: {}", e)))?;

        match settlement {
            Settlement::Complete(candidate) => {
                if let Some(in_flight) = self.pending.get_mut(&candidate.key) {
                    *in_flight = in_flight.saturating_sub(1);
                }

                ConstraintEnforcer::new(&candidate.constraint)
                    .check_occurrence(self.record.count(&candidate.key))?;

                tracing::debug!(
                    field_name = %candidate.file.field_name,
                    size = candidate.file.size(),
                    "File part admitted"
                );
                let as_sequence = candidate.constraint.collects_sequence();
                append_file(&mut self.record, &candidate.key, candidate.file, as_sequence);
                Ok(())
            }
            Settlement::Rejected(err) | Settlement::Aborted(err) => Err(err),
            Settlement::Cancelled => Ok(()),
        }
    }

    /// Stop every outstanding accumulation and wait for their tasks to exit.
    async fn cancel_outstanding(&mut self) {
        let outstanding = self.accumulations.len();
        self.cancel.cancel();
        self.accumulations.shutdown().await;
        if outstanding > 0 {
            tracing::debug!(outstanding, "Cancelled outstanding file accumulations");
        }
    }
}

/// Forward a file part's chunks to its accumulation, enforcing the decode-wide cap.
async fn pump_field(
    field: &mut Field<'static>,
    chunks: &mpsc::Sender<ChunkEvent>,
    transport_cap: Option<u64>,
) -> Result<PumpOutcome, FormError> {
    let mut forwarded: u64 = 0;

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                forwarded += chunk.len() as u64;
                if let Some(limit) = transport_cap.filter(|&limit| forwarded > limit) {
                    let event = ChunkEvent::Failed(ChunkError::LimitReached {
                        limit,
                        observed: forwarded,
                    });
                    send_final(chunks, event).await;
                    return Ok(PumpOutcome::Detached);
                }

                if chunks.send(ChunkEvent::Data(chunk)).await.is_err() {
                    return Ok(PumpOutcome::Detached);
                }
            }
            Ok(None) => {
                send_final(chunks, ChunkEvent::End).await;
                return Ok(PumpOutcome::Finished);
            }
            Err(err) => {
                // The accumulation only needs the message; the decode reports `err` itself.
                let err = FormError::transport(err);
                let event = ChunkEvent::Failed(ChunkError::Transport(err.to_string()));
                send_final(chunks, event).await;
                return Err(err);
            }
        }
    }
}

/// Deliver the last event of a part. A receiver that is already gone has settled on its own.
async fn send_final(chunks: &mpsc::Sender<ChunkEvent>, event: ChunkEvent) {
    if chunks.send(event).await.is_err() {
        tracing::trace!("File accumulation settled before its final chunk event");
    }
}

/// Read a scalar part's value, bounded by the fixed value ceiling.
async fn read_scalar(field: &mut Field<'static>, name: &str) -> Result<String, FormError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(FormError::transport)? {
        if buffer.len() + chunk.len() > MAX_FIELD_VALUE_BYTES {
            return Err(FormError::malformed(
                Some(name),
                MalformedReason::ValueTruncated,
            ));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Discard the rest of a part.
async fn drain_field(field: &mut Field<'static>) -> Result<(), FormError> {
    while field
        .chunk()
        .await
        .map_err(FormError::transport)?
        .is_some()
    {}
    Ok(())
}

/// Read and discard whatever is left of the body after a failed decode.
async fn drain_remaining(multipart: &mut Multipart<'static>) {
    let mut discarded_parts = 0usize;
    loop {
        match multipart.next_field().await {
            Ok(Some(mut field)) => {
                discarded_parts += 1;
                if drain_field(&mut field).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(error = %err, "Stopped draining multipart body");
                break;
            }
        }
    }

    if discarded_parts > 0 {
        tracing::debug!(discarded_parts, "Discarded remaining multipart parts");
    }
}
