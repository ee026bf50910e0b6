//! # LAN Transport
//!
//! Raw TCP printing on port 9100. Status is read by sending `ESC ACK SOH`
//! and reading back one ASB frame on the same connection.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument};

use super::Transport;
use crate::document::Document;
use crate::error::TransportError;
use crate::printer::PrinterConfig;
use crate::protocol::{self, commands, status};
use crate::status::RawStatus;

/// Default raw print port
pub const DEFAULT_PORT: u16 = 9100;

/// How long to wait for a status frame after requesting one.
const STATUS_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Raw TCP connection to a network printer.
#[derive(Debug)]
pub struct LanTransport {
    addr: String,
    connect_timeout: Duration,
    config: PrinterConfig,
    stream: Option<TcpStream>,
}

impl LanTransport {
    /// `identifier` is `host` or `host:port`.
    pub fn new(identifier: &str, default_port: u16, config: PrinterConfig) -> Self {
        Self {
            addr: socket_addr(identifier, default_port),
            connect_timeout: Duration::from_secs(5),
            config,
            stream: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream
            .as_mut()
            .ok_or_else(|| TransportError::Connection(format!("{}: not connected", self.addr)))
    }
}

/// Append the default port unless the identifier already names one.
/// Bare IPv6 addresses get brackets.
pub fn socket_addr(identifier: &str, default_port: u16) -> String {
    let identifier = identifier.trim();
    if identifier.starts_with('[') {
        if identifier.contains("]:") {
            return identifier.to_string();
        }
        return format!("{}:{}", identifier, default_port);
    }
    match identifier.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => {
            identifier.to_string()
        }
        _ if identifier.matches(':').count() > 1 => format!("[{}]:{}", identifier, default_port),
        _ => format!("{}:{}", identifier, default_port),
    }
}

#[async_trait]
impl Transport for LanTransport {
    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn open(&mut self) -> Result<(), TransportError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| TransportError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| TransportError::Connection(format!("{}: {}", self.addr, e)))?;
        stream.set_nodelay(true)?;
        info!("Connected");
        self.stream = Some(stream);
        Ok(())
    }

    #[instrument(skip(self, document), fields(addr = %self.addr, instructions = document.len()))]
    async fn print(&mut self, document: &Document) -> Result<(), TransportError> {
        let data = protocol::encode(document, &self.config);
        let stream = self.stream()?;
        stream.write_all(&data).await?;
        stream.flush().await?;
        info!(bytes = data.len(), "Print job sent");
        Ok(())
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn status(&mut self) -> Result<RawStatus, TransportError> {
        let stream = self.stream()?;
        stream.write_all(&commands::status_request()).await?;
        stream.flush().await?;

        let frame = tokio::time::timeout(STATUS_READ_TIMEOUT, read_asb_frame(stream))
            .await
            .map_err(|_| TransportError::Timeout("no status response".into()))??;
        debug!(frame = ?frame, "Status frame");
        status::parse_asb(&frame)
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
            debug!("Disconnected");
        }
        Ok(())
    }
}

async fn read_asb_frame(stream: &mut TcpStream) -> Result<Vec<u8>, TransportError> {
    let header = stream.read_u8().await?;
    let len = status::frame_len(header).ok_or_else(|| {
        TransportError::Device(format!("unexpected status header 0x{:02X}", header))
    })?;
    let mut frame = vec![0u8; len.max(1)];
    frame[0] = header;
    stream.read_exact(&mut frame[1..]).await?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::document;
    use tokio::net::TcpListener;

    #[test]
    fn test_socket_addr() {
        assert_eq!(socket_addr("192.168.1.50", 9100), "192.168.1.50:9100");
        assert_eq!(socket_addr("192.168.1.50:9101", 9100), "192.168.1.50:9101");
        assert_eq!(socket_addr("printer.local", 9100), "printer.local:9100");
        assert_eq!(socket_addr("fe80::1", 9100), "[fe80::1]:9100");
        assert_eq!(socket_addr("[fe80::1]:9200", 9100), "[fe80::1]:9200");
    }

    #[tokio::test]
    async fn test_print_sends_encoded_document() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let doc = document::build(&[Command::AppendText("hi\n".into())]);
        let mut transport = LanTransport::new(&addr.to_string(), DEFAULT_PORT, PrinterConfig::default());
        transport.open().await.unwrap();
        transport.print(&doc).await.unwrap();
        transport.close().await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(received, protocol::encode(&doc, &PrinterConfig::default()));
    }

    #[tokio::test]
    async fn test_status_reads_asb_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 3];
            socket.read_exact(&mut request).await.unwrap();
            assert_eq!(request, [0x1B, 0x06, 0x01]);
            socket
                .write_all(&[0x23, 0x86, 0x20, 0, 0, 0, 0, 0, 0])
                .await
                .unwrap();
        });

        let mut transport = LanTransport::new(&addr.to_string(), DEFAULT_PORT, PrinterConfig::default());
        transport.open().await.unwrap();
        let status = transport.status().await.unwrap();
        assert_eq!(status.cover_open, Some(true));
        assert_eq!(status.paper_empty, Some(false));
    }

    #[tokio::test]
    async fn test_print_without_open_fails() {
        let mut transport = LanTransport::new("127.0.0.1", DEFAULT_PORT, PrinterConfig::default());
        let err = transport.print(&Document::default()).await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }
}
