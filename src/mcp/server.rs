//! MCP server loop.
//!
//! Reads one JSON-RPC message per line, hands it to the
//! [`ProtocolDispatcher`] and writes the reply back on the same transport.
//! MCP notifications are consumed silently and a line that is not UTF-8 is
//! answered with a parse error. The loop ends at EOF or, for the
//! stdio server, on SIGINT/SIGTERM (Ctrl+C on Windows), after which the
//! store is flushed one last time.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite, BufReader, Stdin, Stdout};

use crate::mcp::dispatcher::ProtocolDispatcher;
use crate::mcp::protocol::JsonRpcError;
use crate::mcp::transport::{LineTransport, StdioTransport};
use crate::metadata::MetadataStore;

/// The MCP server for codebase test metadata.
pub struct McpServer<R, W> {
    /// The transport layer.
    transport: LineTransport<R, W>,
    /// Request router.
    dispatcher: ProtocolDispatcher,
}

impl McpServer<BufReader<Stdin>, Stdout> {
    /// Creates a server speaking over stdin/stdout.
    #[must_use]
    pub fn stdio(store: Arc<MetadataStore>) -> Self {
        Self::with_transport(store, StdioTransport::stdio())
    }
}

impl<R, W> McpServer<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a server over an arbitrary transport.
    #[must_use]
    pub const fn with_transport(store: Arc<MetadataStore>, transport: LineTransport<R, W>) -> Self {
        Self {
            transport,
            dispatcher: ProtocolDispatcher::new(store),
        }
    }

    /// Consumes the server, returning its transport.
    pub fn into_transport(self) -> LineTransport<R, W> {
        self.transport
    }

    /// Serves messages until the input is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve(&mut self) -> io::Result<()> {
        while let Some(line) = self.transport.read_line().await? {
            match String::from_utf8(line) {
                Ok(line) => self.handle_line(&line).await?,
                Err(e) => {
                    tracing::warn!(error = %e, "Input line is not valid UTF-8");
                    self.transport
                        .write_reply(&JsonRpcError::parse_error().into())
                        .await?;
                }
            }
        }
        tracing::info!("Input closed");
        Ok(())
    }

    /// Handles a single line of input.
    async fn handle_line(&mut self, line: &str) -> io::Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        match self.dispatcher.handle(line) {
            Some(reply) => self.transport.write_reply(&reply).await,
            None => Ok(()),
        }
    }

    /// Writes the store to disk before exiting.
    fn flush_store(&self) {
        if let Err(e) = self.dispatcher.store().save() {
            tracing::error!(error = %e, "Failed to flush metadata on shutdown");
        }
    }

    /// Runs the server with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    #[cfg(unix)]
    pub async fn run(&mut self) -> io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(io::Error::other)?;

        let result = tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
                Ok(())
            }

            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
                Ok(())
            }

            result = self.serve() => result,
        };

        self.flush_store();
        result
    }

    /// Runs the server with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    #[cfg(windows)]
    pub async fn run(&mut self) -> io::Result<()> {
        let result = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                Ok(())
            }

            result = self.serve() => result,
        };

        self.flush_store();
        result
    }
}
