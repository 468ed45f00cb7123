//! Test helpers: multipart body builders, byte streams and schemas.
//!
//! Run from workspace root: `cargo test -p filefield-decoder`.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::Poll;

use bytes::Bytes;
use filefield_core::{DecoderConfig, FieldConstraint, FileFieldSchema, SchemaRegistry};
use filefield_decoder::MultipartDecoder;
use futures::stream::BoxStream;
use futures::{stream, Stream, StreamExt};

pub const BOUNDARY: &str = "----filefield-test-boundary";

pub fn content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Builder for a raw multipart body.
#[derive(Default)]
pub struct BodyBuilder {
    body: Vec<u8>,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.push_headers(&format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n",
            name
        ));
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, filename: &str, media_type: &str, content: &[u8]) -> Self {
        self.push_headers(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n",
            name, filename, media_type
        ));
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// A part with hand-written headers.
    pub fn raw_part(mut self, headers: &str, content: &[u8]) -> Self {
        self.push_headers(headers);
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }

    /// The body without its closing delimiter.
    pub fn unterminated(self) -> Vec<u8> {
        self.body
    }

    fn push_headers(&mut self, headers: &str) {
        self.body
            .extend_from_slice(format!("--{}\r\n{}\r\n", BOUNDARY, headers).as_bytes());
    }
}

/// Split `body` into a stream of `chunk_size` pieces.
pub fn body_stream(
    body: Vec<u8>,
    chunk_size: usize,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Unpin + 'static {
    let chunks: Vec<Result<Bytes, std::io::Error>> = body
        .chunks(chunk_size.max(1))
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    stream::iter(chunks)
}

/// Like [`body_stream`] but flags `exhausted` once the stream has been read to its end.
pub fn tracked_stream(
    body: Vec<u8>,
    chunk_size: usize,
    exhausted: Arc<AtomicBool>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Unpin + 'static {
    body_stream(body, chunk_size).chain(stream::poll_fn(move |_| {
        exhausted.store(true, Ordering::SeqCst);
        Poll::Ready(None)
    }))
}

/// Delivers `body` in `chunk_size` pieces, yielding to the runtime before each one and
/// adding every delivered byte to `pulled`.
pub fn counting_stream(
    body: Vec<u8>,
    chunk_size: usize,
    pulled: Arc<AtomicUsize>,
) -> BoxStream<'static, Result<Bytes, std::io::Error>> {
    let chunks: Vec<Bytes> = body
        .chunks(chunk_size.max(1))
        .map(Bytes::copy_from_slice)
        .collect();
    stream::unfold(chunks.into_iter(), move |mut chunks| {
        let pulled = pulled.clone();
        async move {
            tokio::task::yield_now().await;
            let chunk = chunks.next()?;
            pulled.fetch_add(chunk.len(), Ordering::SeqCst);
            Some((Ok(chunk), chunks))
        }
    })
    .boxed()
}

/// A stream that delivers `body` and then fails.
pub fn failing_stream(
    body: Vec<u8>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Unpin + 'static {
    body_stream(body, 64).chain(stream::iter(vec![Err(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    ))]))
}

/// Decoder with its own registry so tests do not share cached schemas.
pub fn decoder() -> MultipartDecoder {
    decoder_with(DecoderConfig::default())
}

pub fn decoder_with(config: DecoderConfig) -> MultipartDecoder {
    MultipartDecoder::new(config).with_registry(SchemaRegistry::new())
}

/// The upload DTO used across the decoder tests.
pub struct UploadPhoto;

impl FileFieldSchema for UploadPhoto {
    fn file_fields() -> Vec<FieldConstraint> {
        vec![
            FieldConstraint::new("photo")
                .with_allowed_media_types(["image/jpeg", "image/png", "image/webp"])
                .with_max_size(5 * 1000 * 1000),
            FieldConstraint::new("thumbnail")
                .with_allowed_media_types(["image/webp"])
                .with_max_size(100),
            FieldConstraint::new("additional_assets")
                .with_field_name("additionalAssets")
                .with_allowed_media_types(["text/markdown"])
                .with_max_files(10),
        ]
    }
}

/// A single png `photo`.
pub struct PngOnly;

impl FileFieldSchema for PngOnly {
    fn file_fields() -> Vec<FieldConstraint> {
        vec![FieldConstraint::new("photo").with_allowed_media_types(["image/png"])]
    }
}

/// Up to three unrestricted `assets`.
pub struct Assets;

impl FileFieldSchema for Assets {
    fn file_fields() -> Vec<FieldConstraint> {
        vec![FieldConstraint::new("assets").with_max_files(3)]
    }
}

/// Only a capped `thumbnail`, so the decode-wide cap equals the field cap.
pub struct ThumbnailOnly;

impl FileFieldSchema for ThumbnailOnly {
    fn file_fields() -> Vec<FieldConstraint> {
        vec![FieldConstraint::new("thumbnail").with_max_size(100)]
    }
}

/// A schema without file fields.
pub struct Plain;

impl FileFieldSchema for Plain {
    fn file_fields() -> Vec<FieldConstraint> {
        Vec::new()
    }
}

/// Two properties claiming the same field name.
pub struct Conflicting;

impl FileFieldSchema for Conflicting {
    fn file_fields() -> Vec<FieldConstraint> {
        vec![
            FieldConstraint::new("front").with_field_name("image"),
            FieldConstraint::new("back").with_field_name("image"),
        ]
    }
}
