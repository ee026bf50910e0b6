//! # Print Sessions
//!
//! A [`Session`] is one bounded open → operate → close unit of work against
//! a single device. Sessions are single use: build a fresh one per call.
//!
//! ```text
//! Closed ──open──► Opening ──► Open ──execute──► Executing ──► Open ──close──► Closing ──► Closed
//!                     │                              │                            │
//!                     └──────────────► Faulted ◄─────┴────────────────────────────┘
//! ```
//!
//! Any failing device step moves the session to `Faulted`. Closing a faulted
//! session is best-effort: the device is released and a close failure is
//! logged, not returned. A session dropped while it still holds the device
//! (for example a cancelled future) closes the device on a spawned task.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::document::Document;
use crate::error::TransportError;
use crate::status::RawStatus;
use crate::transport::{ConnectionDescriptor, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opening,
    Open,
    Executing,
    Closing,
    Faulted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Work to perform on an open session.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    Print(&'a Document),
    Status,
}

/// Result of a successful request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Printed,
    Status(RawStatus),
}

pub struct Session {
    descriptor: ConnectionDescriptor,
    transport: Option<Box<dyn Transport>>,
    state: SessionState,
    timeout: Option<Duration>,
    /// An open was attempted and no close has run since.
    holds_device: bool,
    used: bool,
}

impl Session {
    pub fn new(descriptor: ConnectionDescriptor, transport: Box<dyn Transport>) -> Self {
        Self {
            descriptor,
            transport: Some(transport),
            state: SessionState::Closed,
            timeout: None,
            holds_device: false,
            used: false,
        }
    }

    /// Bound every device step (open, execute, close) by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    fn invalid(&self, action: &'static str) -> TransportError {
        TransportError::InvalidTransition {
            from: self.state.to_string(),
            action,
        }
    }

    fn transport(&mut self) -> Result<&mut Box<dyn Transport>, TransportError> {
        let state = self.state.to_string();
        self.transport.as_mut().ok_or(TransportError::InvalidTransition {
            from: state,
            action: "use",
        })
    }

    /// Connect to the device.
    pub async fn open(&mut self) -> Result<(), TransportError> {
        if self.state != SessionState::Closed || self.used {
            return Err(self.invalid("open"));
        }
        self.used = true;
        self.state = SessionState::Opening;
        self.holds_device = true;

        let timeout = self.timeout;
        let result = bounded(timeout, "open", self.transport()?.open()).await;
        match result {
            Ok(()) => {
                debug!(descriptor = %self.descriptor, "session open");
                self.state = SessionState::Open;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Faulted;
                Err(e)
            }
        }
    }

    /// Run one request on the open device.
    pub async fn execute(&mut self, request: Request<'_>) -> Result<Outcome, TransportError> {
        if self.state != SessionState::Open {
            return Err(self.invalid("execute"));
        }
        self.state = SessionState::Executing;

        let timeout = self.timeout;
        let transport = self.transport()?;
        let result = match request {
            Request::Print(document) => bounded(timeout, "print", transport.print(document))
                .await
                .map(|()| Outcome::Printed),
            Request::Status => bounded(timeout, "status", transport.status())
                .await
                .map(Outcome::Status),
        };

        self.state = match result {
            Ok(_) => SessionState::Open,
            Err(_) => SessionState::Faulted,
        };
        result
    }

    /// Release the device.
    ///
    /// From `Open` a close failure is returned and leaves the session
    /// `Faulted`. From any interrupted or faulted state the close is
    /// best-effort and always succeeds.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        match self.state {
            SessionState::Closed => Err(self.invalid("close")),
            SessionState::Open => {
                self.state = SessionState::Closing;
                let result = self.release().await;
                self.state = match result {
                    Ok(()) => SessionState::Closed,
                    Err(_) => SessionState::Faulted,
                };
                result
            }
            SessionState::Opening
            | SessionState::Executing
            | SessionState::Closing
            | SessionState::Faulted => {
                if let Err(e) = self.release().await {
                    warn!(descriptor = %self.descriptor, error = %e, "close after fault failed");
                }
                self.state = SessionState::Faulted;
                Ok(())
            }
        }
    }

    async fn release(&mut self) -> Result<(), TransportError> {
        if !self.holds_device {
            return Ok(());
        }
        self.holds_device = false;
        let timeout = self.timeout;
        bounded(timeout, "close", self.transport()?.close()).await
    }

    /// Open, execute `request`, close. The device is released on every exit
    /// path; after a fault the step's error is returned.
    #[instrument(skip(self, request), fields(descriptor = %self.descriptor))]
    pub async fn run(mut self, request: Request<'_>) -> Result<Outcome, TransportError> {
        if let Err(e) = self.open().await {
            let _ = self.close().await;
            return Err(e);
        }
        let outcome = match self.execute(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let _ = self.close().await;
                return Err(e);
            }
        };
        self.close().await?;
        Ok(outcome)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.holds_device {
            return;
        }
        let Some(mut transport) = self.transport.take() else {
            return;
        };
        let descriptor = self.descriptor.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(descriptor = %descriptor, "session dropped while open, closing in background");
                handle.spawn(async move {
                    if let Err(e) = transport.close().await {
                        warn!(descriptor = %descriptor, error = %e, "background close failed");
                    }
                });
            }
            Err(_) => {
                warn!(descriptor = %descriptor, "session dropped outside a runtime, device not closed");
            }
        }
    }
}

/// Apply the optional step timeout.
async fn bounded<T>(
    timeout: Option<Duration>,
    step: &'static str,
    fut: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, TransportError> {
    match timeout {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            TransportError::Timeout(format!("{} did not complete within {:?}", step, limit))
        })?,
    }
}
