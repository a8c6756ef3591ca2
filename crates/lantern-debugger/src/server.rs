//! Serves one front-end connection.
//!
//! Inbound requests are dispatched on the calling task. Everything outbound
//! (replies, errors and notifications raised by the target) goes through the
//! session's single channel, drained by a dedicated writer task, so the
//! front-end sees messages in the order they were produced.

use lantern_config::TransportConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::protocol::{Outbound, Request};
use crate::session::DebugSession;
use crate::transport::{FrameReader, FrameWriter, TransportError};

/// Run until the reader reaches end of stream or fails. The session is shut
/// down on the way out, which abandons any pending pause.
pub async fn run<R, W>(
    reader: R,
    writer: W,
    session: DebugSession,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    transport: TransportConfig,
) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let shutdown = CancellationToken::new();
    let writer_task = tokio::spawn(write_loop(writer, outbound, shutdown.clone()));

    let mut reader = FrameReader::new(reader, transport);
    let result = loop {
        match reader.read_value().await {
            Ok(Some(value)) => session.dispatch(Request::from_value(value)),
            Ok(None) => break Ok(()),
            Err(TransportError::Json(err)) => {
                tracing::warn!(target: "lantern.debugger", error = %err, "skipping malformed message");
            }
            Err(err) => break Err(err),
        }
    };

    if let Err(err) = &result {
        tracing::error!(target: "lantern.debugger", error = %err, "transport failed");
    }
    session.shutdown();
    shutdown.cancel();
    if let Err(err) = writer_task.await {
        tracing::warn!(target: "lantern.debugger", error = %err, "writer task failed");
    }
    result
}

async fn write_loop<W>(
    writer: W,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    shutdown: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    let mut writer = FrameWriter::new(writer);
    loop {
        let message = tokio::select! {
            biased;
            message = outbound.recv() => message,
            _ = shutdown.cancelled() => break,
        };
        let Some(message) = message else {
            return;
        };
        if let Err(err) = writer.write_message(&message).await {
            tracing::warn!(target: "lantern.debugger", error = %err, "failed to write message");
            return;
        }
    }

    // Flush whatever was queued before shutdown.
    while let Ok(message) = outbound.try_recv() {
        if writer.write_message(&message).await.is_err() {
            return;
        }
    }
}
