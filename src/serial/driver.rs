//! Native serial I/O behind a small capability boundary.
//!
//! `SerialLink` only talks to `PortDriver`/`PortHandle`, so the state machine
//! can run against real hardware (`NativePortDriver`) or the scripted
//! `MockPortDriver` used in tests.

use std::io;
use std::time::Duration;

use serialport::SerialPortType;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use super::PortDescriptor;

/// A live, exclusively owned connection to one port
#[async_trait::async_trait]
pub trait PortHandle: Send {
    /// Write the whole buffer and flush it to the device
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read one newline-terminated report, without the terminator
    async fn read_line(&mut self, timeout: Duration) -> io::Result<Vec<u8>>;

    /// Release the native handle
    async fn close(self: Box<Self>) -> io::Result<()>;
}

/// Opens ports and enumerates the ones the OS knows about
#[async_trait::async_trait]
pub trait PortDriver: Send + Sync {
    async fn open(&self, path: &str, baud_rate: u32) -> io::Result<Box<dyn PortHandle>>;

    fn list(&self) -> io::Result<Vec<PortDescriptor>>;
}

/// `tokio-serial` backed driver
#[derive(Debug, Default, Clone)]
pub struct NativePortDriver;

impl NativePortDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PortDriver for NativePortDriver {
    async fn open(&self, path: &str, baud_rate: u32) -> io::Result<Box<dyn PortHandle>> {
        let stream = tokio_serial::new(path, baud_rate)
            .timeout(Duration::from_millis(1000))
            .open_native_async()
            .map_err(io::Error::from)?;

        log::debug!("Native handle opened for {} @ {} baud", path, baud_rate);
        Ok(Box::new(NativePortHandle {
            stream,
            partial: Vec::new(),
        }))
    }

    fn list(&self) -> io::Result<Vec<PortDescriptor>> {
        let ports = serialport::available_ports().map_err(io::Error::from)?;

        Ok(ports
            .into_iter()
            .map(|port| {
                let descriptor = PortDescriptor::new(&port.port_name);
                match port.port_type {
                    SerialPortType::UsbPort(usb_info) => {
                        let mut descriptor = descriptor.with_usb_ids(usb_info.vid, usb_info.pid);
                        descriptor.description = format!(
                            "USB {} {}",
                            usb_info.manufacturer.as_deref().unwrap_or("Device"),
                            usb_info.product.as_deref().unwrap_or("Serial Port")
                        );
                        descriptor.manufacturer = usb_info.manufacturer;
                        descriptor.serial_number = usb_info.serial_number;
                        descriptor
                    }
                    SerialPortType::BluetoothPort => PortDescriptor {
                        description: "Bluetooth Serial".to_string(),
                        ..descriptor
                    },
                    SerialPortType::PciPort => PortDescriptor {
                        description: "PCI Serial".to_string(),
                        ..descriptor
                    },
                    SerialPortType::Unknown => descriptor,
                }
            })
            .collect())
    }
}

struct NativePortHandle {
    stream: SerialStream,
    partial: Vec<u8>,
}

impl NativePortHandle {
    /// Split one line off the front of the partial buffer, skipping blank lines
    fn take_line(&mut self) -> Option<Vec<u8>> {
        loop {
            let pos = self.partial.iter().position(|b| *b == b'\n' || *b == b'\r')?;
            let line: Vec<u8> = self.partial.drain(..=pos).take(pos).collect();
            if !line.is_empty() {
                return Some(line);
            }
        }
    }
}

#[async_trait::async_trait]
impl PortHandle for NativePortHandle {
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    async fn read_line(&mut self, timeout: Duration) -> io::Result<Vec<u8>> {
        let read = async {
            let mut buf = [0u8; 256];
            loop {
                if let Some(line) = self.take_line() {
                    return Ok(line);
                }
                let n = self.stream.read(&mut buf).await?;
                if n == 0 {
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "port closed"));
                }
                self.partial.extend_from_slice(&buf[..n]);
                // Devices that never send a terminator should not grow this forever
                if self.partial.len() > 8192 {
                    let keep = self.partial.len() - 4096;
                    self.partial.drain(..keep);
                }
            }
        };

        tokio::time::timeout(timeout, read)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no report from device"))?
    }

    async fn close(mut self: Box<Self>) -> io::Result<()> {
        // Dropping the stream releases the OS handle
        self.stream.flush().await
    }
}
