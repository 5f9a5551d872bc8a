//! Multipart bodies with a length known before the first byte is sent.
//!
//! The upload endpoints refuse chunked transfer encoding, so every body
//! is encoded by hand: a fixed head, the payload and a fixed tail. The
//! head and tail are plain bytes, which leaves the payload length as the
//! only unknown. [`StreamedPayload::probe`] resolves it once, consuming the
//! handle, and the resulting [`ProbedPayload`] can only be turned into a
//! body, never probed again.

use std::{io, path::Path};

use bytes::Bytes;
use futures::{
    future::{self, Either},
    stream, Stream, StreamExt,
};
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt, AsyncSeekExt},
};
use tokio_util::io::ReaderStream;

const FIELD_NAME: &str = "file";

/// What gets uploaded.
pub enum UploadPayload {
    Buffered(Bytes),
    Streamed(StreamedPayload),
}

impl UploadPayload {
    /// # Errors
    ///
    /// Returns `Err` if the file cannot be opened.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self::Streamed(StreamedPayload::from_file(file)))
    }

    async fn into_probed(self) -> io::Result<ProbedPayload> {
        match self {
            Self::Buffered(bytes) => Ok(ProbedPayload::buffered(bytes)),
            Self::Streamed(stream) => stream.probe().await,
        }
    }
}

impl From<Bytes> for UploadPayload {
    fn from(bytes: Bytes) -> Self {
        Self::Buffered(bytes)
    }
}

impl From<Vec<u8>> for UploadPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffered(Bytes::from(bytes))
    }
}

enum StreamSource {
    File(File),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

/// A single-consumer byte source whose length is unknown until probed.
pub struct StreamedPayload {
    source: StreamSource,
}

impl StreamedPayload {
    /// Regular files are measured through their metadata, so probing does
    /// not read them. Bytes before the current position are not uploaded.
    /// Files whose metadata reports no length (pipes, devices, procfs)
    /// are spooled like readers.
    pub const fn from_file(file: File) -> Self {
        Self {
            source: StreamSource::File(file),
        }
    }

    /// Arbitrary readers are spooled into memory by the probe.
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            source: StreamSource::Reader(Box::new(reader)),
        }
    }

    /// # Errors
    ///
    /// Returns `Err` if the file metadata or the reader cannot be read.
    pub async fn probe(self) -> io::Result<ProbedPayload> {
        match self.source {
            StreamSource::File(mut file) => {
                let metadata = file.metadata().await?;
                // Pipes, devices and procfs entries report a length of zero,
                // and an empty regular file costs nothing to read.
                if !metadata.is_file() || metadata.len() == 0 {
                    return spool(file).await;
                }
                let position = file.stream_position().await?;
                let len = metadata.len().saturating_sub(position);
                Ok(ProbedPayload {
                    len,
                    body: ProbedBody::File(file),
                })
            }
            StreamSource::Reader(reader) => spool(reader).await,
        }
    }
}

async fn spool(mut reader: impl AsyncRead + Unpin) -> io::Result<ProbedPayload> {
    let mut spooled = Vec::new();
    reader.read_to_end(&mut spooled).await?;
    Ok(ProbedPayload::buffered(Bytes::from(spooled)))
}

enum ProbedBody {
    Buffered(Bytes),
    File(File),
}

/// A payload with a known length, ready to be sent exactly once.
pub struct ProbedPayload {
    len: u64,
    body: ProbedBody,
}

impl ProbedPayload {
    fn buffered(bytes: Bytes) -> Self {
        Self {
            len: bytes.len() as u64,
            body: ProbedBody::Buffered(bytes),
        }
    }

    pub const fn len(&self) -> u64 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + Sync + 'static {
        match self.body {
            ProbedBody::Buffered(bytes) => {
                Either::Left(stream::once(future::ready(Ok::<_, io::Error>(bytes))))
            }
            // Never send more than was measured.
            ProbedBody::File(file) => Either::Right(ReaderStream::new(file.take(self.len))),
        }
    }
}

/// A `multipart/form-data` body holding a single file field.
pub struct MultipartForm {
    boundary: String,
    head: Bytes,
    payload: ProbedPayload,
    tail: Bytes,
}

impl MultipartForm {
    /// # Errors
    ///
    /// Returns `Err` if probing a streamed payload fails.
    pub async fn new(payload: UploadPayload, filename: Option<&str>) -> io::Result<Self> {
        let payload = payload.into_probed().await?;
        Ok(Self::from_probed(payload, filename))
    }

    pub fn from_probed(payload: ProbedPayload, filename: Option<&str>) -> Self {
        let boundary = format!("------------------------{}", uuid::Uuid::new_v4().simple());

        let disposition = match filename {
            Some(name) => format!(
                "form-data; name=\"{FIELD_NAME}\"; filename=\"{}\"",
                escape_quoted(name)
            ),
            None => format!("form-data; name=\"{FIELD_NAME}\""),
        };
        let head = format!(
            "--{boundary}\r\nContent-Disposition: {disposition}\r\nContent-Type: {}\r\n\r\n",
            guess_content_type(filename)
        );
        let tail = format!("\r\n--{boundary}--\r\n");

        Self {
            boundary,
            head: Bytes::from(head),
            payload,
            tail: Bytes::from(tail),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact number of bytes [`MultipartForm::into_stream`] yields.
    pub fn content_length(&self) -> u64 {
        self.head.len() as u64 + self.payload.len() + self.tail.len() as u64
    }

    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + Sync + 'static {
        stream::once(future::ready(Ok::<_, io::Error>(self.head)))
            .chain(self.payload.into_stream())
            .chain(stream::once(future::ready(Ok(self.tail))))
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn guess_content_type(filename: Option<&str>) -> &'static str {
    let extension = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
