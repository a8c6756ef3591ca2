//! `Content-Length` framed JSON over async byte streams.

use std::io;

use lantern_config::TransportConfig;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

pub struct FrameReader<R> {
    reader: BufReader<R>,
    limits: TransportConfig,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, limits: TransportConfig) -> Self {
        Self {
            reader: BufReader::new(inner),
            limits,
        }
    }

    /// Read one framed message. `Ok(None)` means the stream ended cleanly
    /// between messages.
    ///
    /// A body that is not valid JSON is reported as [`TransportError::Json`]
    /// after the body has been consumed, so the caller can skip it and keep
    /// reading.
    pub async fn read_value(&mut self) -> Result<Option<Value>> {
        let mut content_length: Option<usize> = None;
        let mut line = Vec::new();
        let mut saw_header = false;

        loop {
            line.clear();
            let max_line = self.limits.max_header_line_bytes;
            let n = (&mut self.reader)
                .take(max_line as u64 + 1)
                .read_until(b'\n', &mut line)
                .await?;
            if n == 0 {
                if saw_header {
                    return Err(TransportError::Protocol(
                        "stream ended inside message headers".to_string(),
                    ));
                }
                return Ok(None);
            }
            if line.len() > max_line {
                return Err(TransportError::Protocol(format!(
                    "header line exceeds {max_line} bytes"
                )));
            }

            let text = std::str::from_utf8(&line)
                .map_err(|_| TransportError::Protocol("header line is not UTF-8".to_string()))?;
            let trimmed = text.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                break;
            }
            saw_header = true;

            let Some((name, value)) = trimmed.split_once(':') else {
                continue;
            };

            if name.eq_ignore_ascii_case("Content-Length") {
                let value = value.trim();
                content_length = Some(value.parse::<usize>().map_err(|e| {
                    TransportError::Protocol(format!("invalid Content-Length {value:?}: {e}"))
                })?);
            }
        }

        let Some(len) = content_length else {
            return Err(TransportError::Protocol(
                "missing Content-Length header".to_string(),
            ));
        };
        if len > self.limits.max_message_bytes {
            return Err(TransportError::Protocol(format!(
                "Content-Length {len} exceeds maximum of {} bytes",
                self.limits.max_message_bytes
            )));
        }

        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf).await?;
        Ok(Some(serde_json::from_slice::<Value>(&buf)?))
    }
}

pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let bytes = serde_json::to_vec(message)?;
        self.writer
            .write_all(format!("Content-Length: {}\r\n\r\n", bytes.len()).as_bytes())
            .await?;
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
