use log::{debug, info, warn};
use rusb::{Context, DeviceHandle, UsbContext};
use std::{env, time::Duration};

use crate::error::Error;

/// Sink for finished command frames.
///
/// Frames are written one call at a time, in program order. The protocol has
/// no delimiters, so a caller must not issue the next frame before the
/// previous `write` has returned.
pub trait Transport {
    /// Send `buf` and return the number of bytes the device accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;
}

/// Collects frames in memory.
impl Transport for Vec<u8> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        (**self).write(buf)
    }
}

/// USB identifiers, endpoints and timeouts of the printer.
///
/// Defaults match the EM5820 receipt printer module.
#[derive(Debug, Clone)]
pub struct UsbConfig {
    vendor_id: u16,
    product_id: u16,
    interface: u8,
    endpoint_in: u8,
    endpoint_out: u8,
    write_timeout: Duration,
    drain_timeout: Duration,
    drain_chunk: usize,
}

impl Default for UsbConfig {
    fn default() -> Self {
        UsbConfig {
            vendor_id: 0x28E9,
            product_id: 0x0289,
            interface: 0,
            endpoint_in: 0x81,
            endpoint_out: 0x03,
            write_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_millis(100),
            drain_chunk: 64,
        }
    }
}

impl UsbConfig {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        UsbConfig {
            vendor_id,
            product_id,
            ..Default::default()
        }
    }

    /// Defaults overridden by `EM5820_*` environment variables.
    ///
    /// Recognised: `EM5820_VENDOR_ID`, `EM5820_PRODUCT_ID`, `EM5820_INTERFACE`,
    /// `EM5820_ENDPOINT_IN`, `EM5820_ENDPOINT_OUT` and `EM5820_TIMEOUT_MS`.
    /// Numbers are decimal or `0x` prefixed hex.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, Error> {
        let number = |key: &str| -> Result<Option<u64>, Error> {
            match lookup(key) {
                Some(value) => parse_number(&value)
                    .map(Some)
                    .ok_or_else(|| Error::InvalidConfig(format!("{}={:?}", key, value))),
                None => Ok(None),
            }
        };
        let narrow = |key: &str, value: u64, max: u64| -> Result<u64, Error> {
            if value > max {
                Err(Error::InvalidConfig(format!("{} out of range: {}", key, value)))
            } else {
                Ok(value)
            }
        };

        let mut config = UsbConfig::default();
        if let Some(v) = number("EM5820_VENDOR_ID")? {
            config.vendor_id = narrow("EM5820_VENDOR_ID", v, u16::MAX as u64)? as u16;
        }
        if let Some(v) = number("EM5820_PRODUCT_ID")? {
            config.product_id = narrow("EM5820_PRODUCT_ID", v, u16::MAX as u64)? as u16;
        }
        if let Some(v) = number("EM5820_INTERFACE")? {
            config.interface = narrow("EM5820_INTERFACE", v, u8::MAX as u64)? as u8;
        }
        if let Some(v) = number("EM5820_ENDPOINT_IN")? {
            config.endpoint_in = narrow("EM5820_ENDPOINT_IN", v, u8::MAX as u64)? as u8;
        }
        if let Some(v) = number("EM5820_ENDPOINT_OUT")? {
            config.endpoint_out = narrow("EM5820_ENDPOINT_OUT", v, u8::MAX as u64)? as u8;
        }
        if let Some(v) = number("EM5820_TIMEOUT_MS")? {
            config.write_timeout = Duration::from_millis(v);
        }
        Ok(config)
    }

    pub fn interface(self, interface: u8) -> Self {
        UsbConfig { interface, ..self }
    }

    pub fn endpoints(self, endpoint_in: u8, endpoint_out: u8) -> Self {
        UsbConfig {
            endpoint_in,
            endpoint_out,
            ..self
        }
    }

    pub fn write_timeout(self, write_timeout: Duration) -> Self {
        UsbConfig {
            write_timeout,
            ..self
        }
    }

    /// Timeout of each inbound read used to flush stale device responses.
    pub fn drain_timeout(self, drain_timeout: Duration) -> Self {
        UsbConfig {
            drain_timeout,
            ..self
        }
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }
}

fn parse_number(value: &str) -> Option<u64> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Bulk USB connection to the printer.
///
/// The interface stays claimed for the lifetime of the value. Dropping it
/// releases the interface and hands the device back to the kernel driver if
/// one was detached in [`UsbTransport::open`].
pub struct UsbTransport {
    handle: DeviceHandle<Context>,
    config: UsbConfig,
    reattach_kernel_driver: bool,
}

impl UsbTransport {
    pub fn open(config: UsbConfig) -> Result<Self, Error> {
        let context = Context::new()?;
        let mut handle = Self::open_device(&context, config.vendor_id, config.product_id)?;
        let iface = config.interface;

        let reattach_kernel_driver = match handle.kernel_driver_active(iface) {
            Ok(true) => {
                handle.detach_kernel_driver(iface)?;
                debug!("Detached kernel driver from interface {}", iface);
                true
            }
            _ => false,
        };

        if let Err(err) = handle.claim_interface(iface) {
            if reattach_kernel_driver {
                if let Err(err) = handle.attach_kernel_driver(iface) {
                    warn!("Failed to reattach kernel driver: {}", err);
                }
            }
            return Err(Error::UsbError(err));
        }
        info!(
            "Claimed interface {} on {:04x}:{:04x}",
            iface, config.vendor_id, config.product_id
        );

        Ok(UsbTransport {
            handle,
            config,
            reattach_kernel_driver,
        })
    }

    fn open_device(
        context: &Context,
        vid: u16,
        pid: u16,
    ) -> Result<DeviceHandle<Context>, Error> {
        let devices = match context.devices() {
            Ok(devices) => devices,
            Err(err) => {
                debug!("Failed to read device list: {:?}", err);
                return Err(Error::DeviceListNotReadable);
            }
        };

        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(err) => {
                    debug!("{:?}", err);
                    continue;
                }
            };

            if device_desc.vendor_id() == vid && device_desc.product_id() == pid {
                return device.open().map_err(Error::UsbError);
            }
        }
        debug!("No device matches {:04x}:{:04x}", vid, pid);
        Err(Error::DeviceNotFound {
            vendor_id: vid,
            product_id: pid,
        })
    }

    /// Read and discard whatever the device has queued for us.
    fn drain(&self) -> usize {
        let mut buf = vec![0u8; self.config.drain_chunk];
        let mut drained = 0;

        while let Ok(n) =
            self.handle
                .read_bulk(self.config.endpoint_in, &mut buf, self.config.drain_timeout)
        {
            if n == 0 {
                break;
            }
            drained += n;
        }
        drained
    }
}

impl Transport for UsbTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let drained = self.drain();
        if drained > 0 {
            debug!("drained {} stale bytes before write", drained);
        }

        let n = self
            .handle
            .write_bulk(self.config.endpoint_out, buf, self.config.write_timeout)?;
        if n != buf.len() {
            debug!(
                "write error: bytes wrote {} != bytes supplied {}, possibly timeout ?",
                n,
                buf.len()
            );
            return Err(Error::ShortWrite {
                written: n,
                expected: buf.len(),
            });
        }
        Ok(n)
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        let iface = self.config.interface;
        if let Err(err) = self.handle.release_interface(iface) {
            warn!("Failed to release interface {}: {}", iface, err);
        }
        if self.reattach_kernel_driver {
            if let Err(err) = self.handle.attach_kernel_driver(iface) {
                warn!("Failed to reattach kernel driver: {}", err);
            }
        }
        debug!("Closed {:04x}:{:04x}", self.config.vendor_id, self.config.product_id);
    }
}
