//! Attachment normalization.
//!
//! Callers may attach a file path, an in-memory buffer, a byte stream, a
//! wrapped [`Attachment`] carrying an explicit filename, or any sequence of
//! these. [`normalize`] turns each of them into a [`NormalizedAttachment`]
//! (`filename` plus [`PendingBytes`]) without performing I/O; the file reads
//! and stream drains happen when the pending data is resolved, right before
//! the message is dispatched.

use std::io;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use gunmail_http::FileAttachment;

/// A stream of byte chunks, e.g. a file being read or a network body.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Filename used when the input carries none.
pub const DEFAULT_FILENAME: &str = "file";

/// The payload of a wrapped [`Attachment`]: one of the base kinds.
pub enum AttachmentData {
    /// Read from this file path.
    Path(PathBuf),
    /// In-memory bytes.
    Buffer(Bytes),
    /// Drained from a byte stream.
    Stream(ByteStream),
}

impl AttachmentData {
    /// Wraps a byte stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }

    fn into_pending(self) -> PendingBytes {
        match self {
            Self::Path(path) => PendingBytes::File(path),
            Self::Buffer(bytes) => PendingBytes::Ready(bytes),
            Self::Stream(stream) => PendingBytes::Stream(stream),
        }
    }
}

impl From<PathBuf> for AttachmentData {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for AttachmentData {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for AttachmentData {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Bytes> for AttachmentData {
    fn from(bytes: Bytes) -> Self {
        Self::Buffer(bytes)
    }
}

impl From<Vec<u8>> for AttachmentData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(Bytes::from(bytes))
    }
}

impl std::fmt::Debug for AttachmentData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// An attachment with an explicit filename.
#[derive(Debug)]
pub struct Attachment {
    /// Filename presented to the recipient.
    pub filename: String,
    /// The attachment contents.
    pub data: AttachmentData,
}

impl Attachment {
    /// Creates an attachment named [`DEFAULT_FILENAME`].
    pub fn new(data: impl Into<AttachmentData>) -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            data: data.into(),
        }
    }

    /// Sets the filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

/// Anything that can be attached to a message.
pub enum AttachmentInput {
    /// A file on disk; the filename is the path's final segment.
    Path(PathBuf),
    /// In-memory bytes.
    Buffer(Bytes),
    /// A byte stream, drained when the message is sent.
    Stream(ByteStream),
    /// Data with an explicit filename.
    Wrapped(Attachment),
    /// Several attachments, kept in order.
    Many(Vec<AttachmentInput>),
}

impl AttachmentInput {
    /// Wraps a byte stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }
}

impl From<&str> for AttachmentInput {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<String> for AttachmentInput {
    fn from(path: String) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for AttachmentInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for AttachmentInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Bytes> for AttachmentInput {
    fn from(bytes: Bytes) -> Self {
        Self::Buffer(bytes)
    }
}

impl From<Vec<u8>> for AttachmentInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(Bytes::from(bytes))
    }
}

impl From<Attachment> for AttachmentInput {
    fn from(attachment: Attachment) -> Self {
        Self::Wrapped(attachment)
    }
}

impl From<AttachmentData> for AttachmentInput {
    fn from(data: AttachmentData) -> Self {
        match data {
            AttachmentData::Path(path) => Self::Path(path),
            AttachmentData::Buffer(bytes) => Self::Buffer(bytes),
            AttachmentData::Stream(stream) => Self::Stream(stream),
        }
    }
}

impl From<Vec<Self>> for AttachmentInput {
    fn from(items: Vec<Self>) -> Self {
        Self::Many(items)
    }
}

impl FromIterator<Self> for AttachmentInput {
    fn from_iter<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        Self::Many(iter.into_iter().collect())
    }
}

impl std::fmt::Debug for AttachmentInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Wrapped(attachment) => f.debug_tuple("Wrapped").field(attachment).finish(),
            Self::Many(items) => f.debug_tuple("Many").field(items).finish(),
        }
    }
}

/// Attachment contents that may not have been read yet.
pub enum PendingBytes {
    /// Already in memory.
    Ready(Bytes),
    /// To be read from disk.
    File(PathBuf),
    /// To be drained from a stream.
    Stream(ByteStream),
}

impl PendingBytes {
    /// Returns true if no I/O is needed to resolve the data.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Reads the file or drains the stream into a single buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the stream yields an
    /// error.
    pub async fn resolve(self) -> io::Result<Bytes> {
        match self {
            Self::Ready(bytes) => Ok(bytes),
            Self::File(path) => tokio::fs::read(&path)
                .await
                .map(Bytes::from)
                .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display()))),
            Self::Stream(stream) => drain(stream).await,
        }
    }
}

impl std::fmt::Debug for PendingBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(bytes) => f.debug_tuple("Ready").field(&bytes.len()).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Concatenates stream chunks in arrival order.
async fn drain(mut stream: ByteStream) -> io::Result<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.try_next().await? {
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// A single attachment in uniform shape.
#[derive(Debug)]
pub struct NormalizedAttachment {
    /// Filename presented to the recipient.
    pub filename: String,
    /// The contents, possibly still pending.
    pub data: PendingBytes,
}

impl NormalizedAttachment {
    /// Resolves the pending data.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the underlying file or stream fails.
    pub async fn resolve(self) -> io::Result<FileAttachment> {
        let data = self.data.resolve().await?;
        Ok(FileAttachment::new(self.filename, data))
    }
}

/// Result of [`normalize`]: mirrors the shape of the input.
#[derive(Debug)]
pub enum Normalized {
    /// A single attachment.
    One(NormalizedAttachment),
    /// A sequence, in input order.
    Many(Vec<Normalized>),
}

impl Normalized {
    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    /// Returns true for an empty sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens nested sequences depth-first, preserving order.
    #[must_use]
    pub fn into_flat(self) -> Vec<NormalizedAttachment> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<NormalizedAttachment>) {
        match self {
            Self::One(attachment) => out.push(attachment),
            Self::Many(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }

    /// Resolves every attachment, one after another, in order.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered.
    pub async fn resolve(self) -> io::Result<Vec<FileAttachment>> {
        let mut resolved = Vec::new();
        for attachment in self.into_flat() {
            resolved.push(attachment.resolve().await?);
        }
        Ok(resolved)
    }
}

/// Converts any attachment input into uniform `{filename, data}` records.
///
/// No I/O happens here: paths and streams become [`PendingBytes`] that
/// are resolved later.
#[must_use]
pub fn normalize(input: AttachmentInput) -> Normalized {
    match input {
        AttachmentInput::Many(items) => Normalized::Many(items.into_iter().map(normalize).collect()),
        AttachmentInput::Path(path) => Normalized::One(NormalizedAttachment {
            filename: file_name(&path),
            data: PendingBytes::File(path),
        }),
        AttachmentInput::Buffer(bytes) => Normalized::One(NormalizedAttachment {
            filename: DEFAULT_FILENAME.to_string(),
            data: PendingBytes::Ready(bytes),
        }),
        AttachmentInput::Stream(stream) => Normalized::One(NormalizedAttachment {
            filename: DEFAULT_FILENAME.to_string(),
            data: PendingBytes::Stream(stream),
        }),
        AttachmentInput::Wrapped(Attachment { filename, data }) => {
            let filename = if filename.is_empty() {
                DEFAULT_FILENAME.to_string()
            } else {
                filename
            };
            Normalized::One(NormalizedAttachment {
                filename,
                data: data.into_pending(),
            })
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || DEFAULT_FILENAME.to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::stream;
    use proptest::prelude::*;
    use std::io::Write;

    fn single(normalized: Normalized) -> NormalizedAttachment {
        match normalized {
            Normalized::One(attachment) => attachment,
            Normalized::Many(_) => panic!("Expected a single attachment"),
        }
    }

    #[tokio::test]
    async fn test_buffer_gets_default_filename() {
        let attachment = single(normalize(b"hello".to_vec().into()));
        assert_eq!(attachment.filename, "file");
        assert!(attachment.data.is_ready());
        assert_eq!(attachment.data.resolve().await.unwrap(), Bytes::from("hello"));
    }

    #[tokio::test]
    async fn test_wrapped_buffer_keeps_filename() {
        let input = Attachment::new(b"\x89PNG".to_vec()).with_filename("bob.png");
        let attachment = single(normalize(input.into()));
        assert_eq!(attachment.filename, "bob.png");
        assert_eq!(
            attachment.data.resolve().await.unwrap(),
            Bytes::from_static(b"\x89PNG")
        );
    }

    #[test]
    fn test_wrapped_empty_filename_falls_back() {
        let input = Attachment::new(Bytes::new()).with_filename("");
        assert_eq!(single(normalize(input.into())).filename, "file");
    }

    #[tokio::test]
    async fn test_path_uses_basename_and_reads_lazily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"report contents").unwrap();

        let attachment = single(normalize(file.path().into()));
        assert_eq!(
            attachment.filename,
            file.path().file_name().unwrap().to_string_lossy()
        );
        assert!(!attachment.data.is_ready());

        let resolved = attachment.resolve().await.unwrap();
        assert_eq!(resolved.data, Bytes::from("report contents"));
    }

    #[tokio::test]
    async fn test_missing_file_fails_at_resolution() {
        let attachment = single(normalize("/definitely/not/here/report.pdf".into()));
        assert_eq!(attachment.filename, "report.pdf");

        let err = attachment.data.resolve().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("report.pdf"));
    }

    #[tokio::test]
    async fn test_stream_chunks_concatenate_in_order() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from("ab")),
            Ok(Bytes::from("cd")),
            Ok(Bytes::from("ef")),
        ]);
        let attachment = single(normalize(AttachmentInput::stream(chunks)));
        assert_eq!(attachment.filename, "file");
        assert_eq!(attachment.data.resolve().await.unwrap(), Bytes::from("abcdef"));
    }

    #[tokio::test]
    async fn test_stream_error_rejects() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from("ab")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")),
        ]);
        let attachment = single(normalize(AttachmentInput::stream(chunks)));
        let err = attachment.data.resolve().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_wrapped_stream() {
        let chunks = stream::iter(vec![Ok(Bytes::from("img"))]);
        let input = Attachment::new(AttachmentData::stream(chunks)).with_filename("bob.png");
        let resolved = single(normalize(input.into())).resolve().await.unwrap();
        assert_eq!(resolved, FileAttachment::new("bob.png", Bytes::from("img")));
    }

    #[tokio::test]
    async fn test_nested_sequence_flattens_in_order() {
        let input = AttachmentInput::Many(vec![
            b"one".to_vec().into(),
            AttachmentInput::Many(vec![
                Attachment::new(b"two".to_vec()).with_filename("two.txt").into(),
                b"three".to_vec().into(),
            ]),
            Attachment::new(b"four".to_vec()).with_filename("four.txt").into(),
        ]);

        let normalized = normalize(input);
        assert_eq!(normalized.len(), 3);

        let resolved = normalized.resolve().await.unwrap();
        let names: Vec<&str> = resolved.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["file", "two.txt", "file", "four.txt"]);
        assert_eq!(resolved[2].data, Bytes::from("three"));
    }

    #[test]
    fn test_empty_sequence() {
        let normalized = normalize(AttachmentInput::Many(Vec::new()));
        assert!(normalized.is_empty());
        assert!(tokio_test::block_on(normalized.resolve()).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalize_preserves_order(
            buffers in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..16)
        ) {
            let input: AttachmentInput = buffers
                .iter()
                .cloned()
                .map(AttachmentInput::from)
                .collect();

            let normalized = normalize(input);
            prop_assert_eq!(normalized.len(), buffers.len());

            let resolved = tokio_test::block_on(normalized.resolve()).unwrap();
            let data: Vec<Vec<u8>> = resolved.into_iter().map(|a| a.data.to_vec()).collect();
            prop_assert_eq!(data, buffers);
        }
    }
}
