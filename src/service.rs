//! # Printer Service
//!
//! The public operations of the bridge. Every operation validates its
//! arguments, runs one fresh [`Session`] (or a discovery scan) and maps any
//! collaborator fault into the operation's [`ErrorKind`].
//!
//! | Operation | RPC method | Error kind |
//! |-----------|------------|------------|
//! | [`PrinterService::search_printers`] | `searchPrinters` | `DiscoveryFailed` |
//! | [`PrinterService::get_status`] | `getStatus` | `StatusFailed` |
//! | [`PrinterService::print`] | `print` | `PrintFailed` |
//! | [`PrinterService::print_commands`] | `printCommands` | `PrintFailed` |
//! | [`PrinterService::open_drawer`] | `openCashDrawer` | `DrawerFailed` |
//!
//! [`PrinterService::call`] is the JSON form used by the HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::bitmap::ImageDecoder;
use crate::command::{Command, CutType, DrawerChannel, parse_commands};
use crate::discovery::DiscoveryManager;
use crate::document::{self, Document};
use crate::error::{ErrorKind, Result, StarbridgeError};
use crate::session::{Outcome, Request, Session};
use crate::status::{NormalizedStatus, map_status};
use crate::transport::{ConnectionDescriptor, Connector, PrinterDescriptor, TransportClass};

/// Transport classes scanned by `searchPrinters`.
pub const SEARCH_CLASSES: [TransportClass; 3] = [
    TransportClass::Lan,
    TransportClass::Bluetooth,
    TransportClass::Usb,
];

/// A validated RPC call.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcRequest {
    SearchPrinters { timeout: Duration },
    GetStatus(ConnectionDescriptor),
    Print { descriptor: ConnectionDescriptor, text: String },
    PrintCommands { descriptor: ConnectionDescriptor, commands: Vec<Value> },
    OpenCashDrawer(ConnectionDescriptor),
}

impl RpcRequest {
    /// Validate `args` for `method`. Nothing here touches a device.
    pub fn parse(method: &str, args: &Value) -> Result<Self> {
        let args = args
            .as_object()
            .ok_or_else(|| invalid("arguments must be a JSON object"))?;

        match method {
            "searchPrinters" => {
                let timeout = args
                    .get("timeout")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| invalid("timeout must be a non-negative integer (ms)"))?;
                Ok(RpcRequest::SearchPrinters {
                    timeout: Duration::from_millis(timeout),
                })
            }
            "getStatus" => Ok(RpcRequest::GetStatus(descriptor_arg(args)?)),
            "print" => {
                let descriptor = descriptor_arg(args)?;
                let text = args
                    .get("command")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid("command must be a string"))?;
                Ok(RpcRequest::Print {
                    descriptor,
                    text: text.to_owned(),
                })
            }
            "printCommands" => {
                let descriptor = descriptor_arg(args)?;
                let commands = args
                    .get("commands")
                    .and_then(Value::as_array)
                    .ok_or_else(|| invalid("commands must be an array"))?;
                Ok(RpcRequest::PrintCommands {
                    descriptor,
                    commands: commands.clone(),
                })
            }
            "openCashDrawer" => Ok(RpcRequest::OpenCashDrawer(descriptor_arg(args)?)),
            other => Err(invalid(format!("unknown method '{}'", other))),
        }
    }

    /// Error kind reported if this call fails.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            RpcRequest::SearchPrinters { .. } => ErrorKind::DiscoveryFailed,
            RpcRequest::GetStatus(_) => ErrorKind::StatusFailed,
            RpcRequest::Print { .. } | RpcRequest::PrintCommands { .. } => ErrorKind::PrintFailed,
            RpcRequest::OpenCashDrawer(_) => ErrorKind::DrawerFailed,
        }
    }
}

fn invalid(message: impl Into<String>) -> StarbridgeError {
    StarbridgeError::InvalidArgument(message.into())
}

fn descriptor_arg(args: &Map<String, Value>) -> Result<ConnectionDescriptor> {
    let class = args
        .get("interfaceType")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("interfaceType must be a string"))?;
    let class = TransportClass::from_name(class)
        .ok_or_else(|| invalid(format!("unknown interfaceType '{}'", class)))?;
    let identifier = args
        .get("identifier")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("identifier must be a string"))?;
    ConnectionDescriptor::new(class, identifier)
        .ok_or_else(|| invalid("identifier must not be empty"))
}

/// Entry point for all printer operations.
pub struct PrinterService {
    connector: Arc<dyn Connector>,
    decoder: Arc<dyn ImageDecoder>,
    discovery: Arc<DiscoveryManager>,
    operation_timeout: Option<Duration>,
}

impl PrinterService {
    pub fn new(
        connector: Arc<dyn Connector>,
        decoder: Arc<dyn ImageDecoder>,
        discovery: Arc<DiscoveryManager>,
    ) -> Self {
        Self {
            connector,
            decoder,
            discovery,
            operation_timeout: None,
        }
    }

    /// Bound each device step of print, status and drawer operations.
    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Scan LAN, Bluetooth and USB for up to `timeout`.
    pub async fn search_printers(&self, timeout: Duration) -> Result<Vec<PrinterDescriptor>> {
        let printers = self.discovery.discover(&SEARCH_CLASSES, timeout).await?;
        info!(count = printers.len(), "search finished");
        Ok(printers)
    }

    #[instrument(skip(self), fields(descriptor = %descriptor))]
    pub async fn get_status(&self, descriptor: &ConnectionDescriptor) -> Result<NormalizedStatus> {
        let kind = ErrorKind::StatusFailed;
        match self.run(descriptor, Request::Status, kind).await? {
            Outcome::Status(raw) => Ok(map_status(&raw)),
            Outcome::Printed => Err(StarbridgeError::new(kind, "device returned no status")),
        }
    }

    /// Print `text` followed by a partial cut.
    #[instrument(skip(self, text), fields(descriptor = %descriptor, len = text.len()))]
    pub async fn print(&self, descriptor: &ConnectionDescriptor, text: &str) -> Result<()> {
        let doc = document::build(&[
            Command::AppendText(text.to_owned()),
            Command::CutPaper(CutType::Partial),
        ]);
        self.print_document(descriptor, &doc, ErrorKind::PrintFailed).await
    }

    /// Parse and print a list of command maps. Entries that do not parse are
    /// skipped; the rest print in order.
    #[instrument(skip(self, commands), fields(descriptor = %descriptor, commands = commands.len()))]
    pub async fn print_commands(
        &self,
        descriptor: &ConnectionDescriptor,
        commands: &[Value],
    ) -> Result<()> {
        let parsed = parse_commands(commands, self.decoder.as_ref());
        debug!(parsed = parsed.len(), "commands parsed");
        let doc = document::build(&parsed);
        self.print_document(descriptor, &doc, ErrorKind::PrintFailed).await
    }

    /// Pulse cash drawer channel 1.
    #[instrument(skip(self), fields(descriptor = %descriptor))]
    pub async fn open_drawer(&self, descriptor: &ConnectionDescriptor) -> Result<()> {
        let doc = Document::drawer_pulse(DrawerChannel::No1);
        self.print_document(descriptor, &doc, ErrorKind::DrawerFailed).await
    }

    async fn print_document(
        &self,
        descriptor: &ConnectionDescriptor,
        doc: &Document,
        kind: ErrorKind,
    ) -> Result<()> {
        self.run(descriptor, Request::Print(doc), kind).await?;
        Ok(())
    }

    async fn run(
        &self,
        descriptor: &ConnectionDescriptor,
        request: Request<'_>,
        kind: ErrorKind,
    ) -> Result<Outcome> {
        let transport = self
            .connector
            .connect(descriptor)
            .map_err(|e| e.into_operation_error(kind))?;
        Session::new(descriptor.clone(), transport)
            .with_timeout(self.operation_timeout)
            .run(request)
            .await
            .map_err(|e| e.into_operation_error(kind))
    }

    /// Run an RPC method with JSON arguments.
    ///
    /// The operation runs on its own task; if it panics the caller gets the
    /// operation's error kind.
    #[instrument(skip(self, args))]
    pub async fn call(self: &Arc<Self>, method: &str, args: &Value) -> Result<Value> {
        let request = RpcRequest::parse(method, args)?;
        let kind = request.error_kind();
        let service = Arc::clone(self);
        tokio::spawn(async move { service.dispatch(request).await })
            .await
            .map_err(|e| StarbridgeError::new(kind, format!("operation aborted: {}", e)))?
    }

    async fn dispatch(&self, request: RpcRequest) -> Result<Value> {
        let kind = request.error_kind();
        let to_json = |value: serde_json::Result<Value>| {
            value.map_err(|e| StarbridgeError::new(kind, e.to_string()))
        };
        match request {
            RpcRequest::SearchPrinters { timeout } => {
                let printers = self.search_printers(timeout).await?;
                to_json(serde_json::to_value(printers))
            }
            RpcRequest::GetStatus(descriptor) => {
                let status = self.get_status(&descriptor).await?;
                to_json(serde_json::to_value(status))
            }
            RpcRequest::Print { descriptor, text } => {
                self.print(&descriptor, &text).await?;
                Ok(Value::Bool(true))
            }
            RpcRequest::PrintCommands {
                descriptor,
                commands,
            } => {
                self.print_commands(&descriptor, &commands).await?;
                Ok(Value::Bool(true))
            }
            RpcRequest::OpenCashDrawer(descriptor) => {
                self.open_drawer(&descriptor).await?;
                Ok(Value::Bool(true))
            }
        }
    }
}
