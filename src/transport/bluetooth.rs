//! # Bluetooth RFCOMM Transport
//!
//! Talks to Star printers over Bluetooth Serial Port Profile via a bound
//! RFCOMM TTY (`/dev/rfcommN`).
//!
//! ## Bluetooth Setup (Linux)
//!
//! The printer must be paired and bound before use:
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# pair 00:11:62:XX:XX:XX
//! $ sudo rfcomm bind 0 00:11:62:XX:XX:XX
//! # creates /dev/rfcomm0
//! ```
//!
//! The session identifier may be the MAC address (looked up in the RFCOMM
//! bindings) or the device path itself.
//!
//! ## TTY Configuration
//!
//! The device is opened in raw mode so binary data passes through unchanged:
//! no input or output processing, 8-bit characters, no echo, non-canonical
//! reads with a read timeout so a silent printer cannot block a status query
//! forever.
//!
//! All file I/O is blocking and runs on tokio's blocking pool.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::Transport;
use crate::document::Document;
use crate::error::TransportError;
use crate::printer::PrinterConfig;
use crate::protocol::{self, commands, status};
use crate::status::RawStatus;

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks
const CHUNK_DELAY: Duration = Duration::from_millis(2);

/// TTY read timeout in tenths of a second (VTIME)
const READ_TIMEOUT_DECISECONDS: u8 = 30;

/// Bluetooth printer transport over an RFCOMM TTY.
pub struct BluetoothTransport {
    identifier: String,
    config: PrinterConfig,
    file: Option<File>,
}

impl BluetoothTransport {
    /// `identifier` is a MAC address (`00:11:62:AA:BB:CC`) or a device path.
    pub fn new(identifier: &str, config: PrinterConfig) -> Self {
        Self {
            identifier: identifier.trim().to_string(),
            config,
            file: None,
        }
    }

    fn take_file(&mut self) -> Result<File, TransportError> {
        self.file.take().ok_or_else(|| {
            TransportError::Connection(format!("{}: not connected", self.identifier))
        })
    }
}

#[async_trait]
impl Transport for BluetoothTransport {
    #[instrument(skip(self), fields(identifier = %self.identifier))]
    async fn open(&mut self) -> Result<(), TransportError> {
        let identifier = self.identifier.clone();
        let file = tokio::task::spawn_blocking(move || {
            let device = resolve_device(&identifier)?;
            open_device(&device)
        })
        .await??;
        info!("Connected");
        self.file = Some(file);
        Ok(())
    }

    #[instrument(skip(self, document), fields(identifier = %self.identifier, instructions = document.len()))]
    async fn print(&mut self, document: &Document) -> Result<(), TransportError> {
        let data = protocol::encode(document, &self.config);
        let len = data.len();
        let mut file = self.take_file()?;
        let (file, result) = tokio::task::spawn_blocking(move || {
            let result = write_chunked(&mut file, &data);
            (file, result)
        })
        .await?;
        self.file = Some(file);
        result?;
        info!(bytes = len, "Print job sent");
        Ok(())
    }

    #[instrument(skip(self), fields(identifier = %self.identifier))]
    async fn status(&mut self) -> Result<RawStatus, TransportError> {
        let mut file = self.take_file()?;
        let (file, result) = tokio::task::spawn_blocking(move || {
            let result = request_status(&mut file);
            (file, result)
        })
        .await?;
        self.file = Some(file);
        let frame = result?;
        debug!(frame = ?frame, "Status frame");
        status::parse_asb(&frame)
    }

    #[instrument(skip(self), fields(identifier = %self.identifier))]
    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut file) = self.file.take() {
            tokio::task::spawn_blocking(move || file.flush()).await??;
            debug!("Disconnected");
        }
        Ok(())
    }
}

/// Map an identifier to an RFCOMM device path.
fn resolve_device(identifier: &str) -> Result<String, TransportError> {
    if identifier.starts_with('/') {
        return Ok(identifier.to_string());
    }
    if !is_valid_mac(identifier) {
        return Err(TransportError::Connection(format!(
            "'{}' is neither a Bluetooth address nor a device path",
            identifier
        )));
    }
    find_rfcomm_for_mac(identifier)?.ok_or_else(|| {
        TransportError::Connection(format!(
            "no RFCOMM device bound to {} (run: rfcomm bind 0 {})",
            identifier, identifier
        ))
    })
}

fn open_device(device: &str) -> Result<File, TransportError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(device)
        .map_err(|e| TransportError::Connection(format!("Failed to open {}: {}", device, e)))?;
    configure_tty_raw(&file)?;
    Ok(file)
}

/// Write `data`, in chunks with a short pause between them so the
/// Bluetooth buffer is not overrun.
fn write_chunked(file: &mut File, data: &[u8]) -> Result<(), TransportError> {
    if data.len() <= CHUNK_SIZE {
        file.write_all(data)?;
    } else {
        for chunk in data.chunks(CHUNK_SIZE) {
            file.write_all(chunk)?;
            thread::sleep(CHUNK_DELAY);
        }
    }
    file.flush()?;
    Ok(())
}

fn request_status(file: &mut File) -> Result<Vec<u8>, TransportError> {
    file.write_all(&commands::status_request())?;
    file.flush()?;

    let mut header = [0u8; 1];
    read_full(file, &mut header)?;
    let len = status::frame_len(header[0]).ok_or_else(|| {
        TransportError::Device(format!("unexpected status header 0x{:02X}", header[0]))
    })?;
    let mut frame = vec![0u8; len.max(1)];
    frame[0] = header[0];
    read_full(file, &mut frame[1..])?;
    Ok(frame)
}

/// `read_exact`, but a zero-length read (VTIME expiry) is a timeout.
fn read_full(file: &mut File, mut buf: &mut [u8]) -> Result<(), TransportError> {
    while !buf.is_empty() {
        match file.read(buf) {
            Ok(0) => return Err(TransportError::Timeout("no status response".into())),
            Ok(n) => {
                let rest = std::mem::take(&mut buf);
                buf = &mut rest[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Configure the device for raw binary I/O.
///
/// IXON/IXOFF/IXANY are cleared because 0x11 and 0x13 appear in raster data.
#[cfg(unix)]
fn configure_tty_raw(file: &File) -> Result<(), TransportError> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(TransportError::Connection(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8 | libc::CREAD | libc::CLOCAL;

    // Reads return after VTIME with whatever arrived (possibly nothing).
    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = READ_TIMEOUT_DECISECONDS;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(TransportError::Connection(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File) -> Result<(), TransportError> {
    Ok(())
}

// ============================================================================
// RFCOMM BINDINGS
// ============================================================================

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// A bound RFCOMM device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfcommBinding {
    /// Device path, e.g. `/dev/rfcomm0`
    pub device: String,
    /// Remote address, upper case
    pub mac: String,
}

/// Parse `rfcomm -a` / `/proc/net/rfcomm` style listings:
///
/// ```text
/// rfcomm0: 00:11:62:AA:BB:CC channel 1 clean
/// ```
pub fn parse_rfcomm_listing(listing: &str) -> Vec<RfcommBinding> {
    listing
        .lines()
        .filter_map(|line| {
            let (name, rest) = line.split_once(':')?;
            let name = name.trim();
            if !name.starts_with("rfcomm") {
                return None;
            }
            // Listings that carry both ends put the remote address last.
            let mac = rest
                .split_whitespace()
                .filter(|token| is_valid_mac(token))
                .last()?;
            Some(RfcommBinding {
                device: format!("/dev/{}", name),
                mac: mac.to_uppercase(),
            })
        })
        .collect()
}

/// Current RFCOMM bindings, from `/proc/net/rfcomm` or, failing that,
/// `rfcomm -a`.
#[cfg(unix)]
pub fn list_rfcomm_bindings() -> Result<Vec<RfcommBinding>, TransportError> {
    if let Ok(contents) = std::fs::read_to_string("/proc/net/rfcomm") {
        let bindings = parse_rfcomm_listing(&contents);
        if !bindings.is_empty() {
            return Ok(bindings);
        }
    }

    let output = std::process::Command::new("rfcomm")
        .arg("-a")
        .output()
        .map_err(|e| TransportError::Unsupported(format!("Failed to run 'rfcomm -a': {}", e)))?;
    Ok(parse_rfcomm_listing(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(not(unix))]
pub fn list_rfcomm_bindings() -> Result<Vec<RfcommBinding>, TransportError> {
    Err(TransportError::Unsupported(
        "RFCOMM is not available on this platform".into(),
    ))
}

/// Find an existing RFCOMM device bound to the given MAC address.
pub fn find_rfcomm_for_mac(mac: &str) -> Result<Option<String>, TransportError> {
    let mac_upper = mac.to_uppercase();
    Ok(list_rfcomm_bindings()?
        .into_iter()
        .find(|b| b.mac == mac_upper && Path::new(&b.device).exists())
        .map(|b| b.device))
}
