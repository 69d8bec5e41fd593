use bytes::Bytes;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

/// Content to upload with `put_object`
pub enum ObjectSource {
    /// Read the object from a local file
    File(PathBuf),

    /// Read exactly `size` bytes from an in-memory or network stream
    Stream {
        reader: Box<dyn AsyncRead + Send + Unpin>,
        size: u64,
    },
}

impl ObjectSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ObjectSource::File(path.into())
    }

    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static, size: u64) -> Self {
        ObjectSource::Stream {
            reader: Box::new(reader),
            size,
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self::from_reader(io::Cursor::new(data), size)
    }

    /// Declared length of a stream source; files report `None`
    pub fn declared_size(&self) -> Option<u64> {
        match self {
            ObjectSource::File(_) => None,
            ObjectSource::Stream { size, .. } => Some(*size),
        }
    }

    /// Buffer the whole source.
    ///
    /// A stream that ends before its declared size is an `UnexpectedEof`
    /// error; bytes past the declared size are not read.
    pub async fn read_to_bytes(self) -> io::Result<Bytes> {
        match self {
            ObjectSource::File(path) => tokio::fs::read(&path).await.map(Bytes::from),
            ObjectSource::Stream { reader, size } => {
                let mut buf = Vec::with_capacity(size.min(64 * 1024 * 1024) as usize);
                reader.take(size).read_to_end(&mut buf).await?;

                if (buf.len() as u64) < size {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("stream ended after {} of {} bytes", buf.len(), size),
                    ));
                }

                Ok(Bytes::from(buf))
            }
        }
    }
}

impl std::fmt::Debug for ObjectSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectSource::File(path) => f.debug_tuple("File").field(path).finish(),
            ObjectSource::Stream { size, .. } => {
                f.debug_struct("Stream").field("size", size).finish_non_exhaustive()
            }
        }
    }
}

/// A fetched object whose body is still being streamed.
///
/// The body stays open for as long as the download is alive and is released
/// when it is dropped, so the owning scope decides how long the connection
/// is held.
pub struct ObjectDownload {
    content_type: Option<String>,
    content_length: Option<u64>,
    e_tag: Option<String>,
    body: Pin<Box<dyn AsyncRead + Send>>,
}

impl ObjectDownload {
    pub fn new(body: impl AsyncRead + Send + 'static) -> Self {
        Self {
            content_type: None,
            content_length: None,
            e_tag: None,
            body: Box::pin(body),
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }

    pub fn with_e_tag(mut self, e_tag: Option<String>) -> Self {
        self.e_tag = e_tag;
        self
    }

    /// Content type stored with the object
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }

    /// Read the remaining body into memory
    pub async fn bytes(mut self) -> io::Result<Bytes> {
        let mut buf = Vec::with_capacity(self.content_length.unwrap_or(0) as usize);
        self.read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}

impl AsyncRead for ObjectDownload {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.get_mut().body.as_mut().poll_read(cx, buf)
    }
}

impl std::fmt::Debug for ObjectDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDownload")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("e_tag", &self.e_tag)
            .finish_non_exhaustive()
    }
}
