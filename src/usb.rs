/*
 * This file is part of cprofan.
 *
 * Copyright (C) 2025 cprofan contributors
 *
 * cprofan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * cprofan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with cprofan. If not, see <https://www.gnu.org/licenses/>.
 */

//! USB transport over libusb interrupt endpoints

use std::time::Duration;

use rusb::{DeviceHandle, GlobalContext};
use tracing::{info, trace, warn};

use crate::config::DriverConfig;
use crate::error::{CproError, Result, TransportError};
use crate::transport::Transport;

pub struct UsbTransport {
    handle: DeviceHandle<GlobalContext>,
    interface: u8,
    endpoint_out: u8,
    endpoint_in: u8,
    timeout: Duration,
    interface_claimed: bool,
}

/// Whether a kernel driver holds `interface`. A failed query is logged
/// and treated as unbound; claiming reports the real conflict if any.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn kernel_driver_bound(interface: u8, active: rusb::Result<bool>) -> bool {
    match active {
        Ok(bound) => bound,
        Err(e) => {
            warn!("Cannot query kernel driver on interface {}: {}", interface, e);
            false
        }
    }
}

impl UsbTransport {
    /// Open the first device matching the configured VID/PID and claim
    /// its command interface.
    pub fn open(config: &DriverConfig) -> Result<Self> {
        let devices = rusb::devices().map_err(TransportError::from)?;

        for device in devices.iter() {
            let desc = match device.device_descriptor() {
                Ok(desc) => desc,
                Err(_) => continue,
            };
            if desc.vendor_id() != config.vendor_id || desc.product_id() != config.product_id {
                continue;
            }

            let handle = device.open().map_err(TransportError::from)?;
            let mut transport = Self {
                handle,
                interface: config.interface,
                endpoint_out: config.endpoint_out,
                endpoint_in: config.endpoint_in,
                timeout: config.timeout(),
                interface_claimed: false,
            };
            transport.claim()?;

            info!(
                bus = device.bus_number(),
                address = device.address(),
                "Opened Commander Pro {:04x}:{:04x}",
                config.vendor_id,
                config.product_id
            );
            return Ok(transport);
        }

        Err(CproError::DeviceNotFound {
            vendor_id: config.vendor_id,
            product_id: config.product_id,
        })
    }

    fn claim(&mut self) -> Result<()> {
        #[cfg(target_os = "linux")]
        {
            let active = self.handle.kernel_driver_active(self.interface);
            if kernel_driver_bound(self.interface, active) {
                self.handle
                    .detach_kernel_driver(self.interface)
                    .map_err(TransportError::from)?;
            }
        }

        self.handle
            .claim_interface(self.interface)
            .map_err(TransportError::from)?;
        self.interface_claimed = true;
        Ok(())
    }

    fn release(&mut self) {
        if self.interface_claimed {
            if let Err(e) = self.handle.release_interface(self.interface) {
                warn!("Failed to release interface {}: {}", self.interface, e);
            }
            self.interface_claimed = false;
            trace!("USB interface released");
        }
    }
}

fn map_usb_error(err: rusb::Error, timeout: TransportError) -> TransportError {
    match err {
        rusb::Error::Timeout => timeout,
        rusb::Error::NoDevice => TransportError::Disconnected,
        e => TransportError::Usb(e),
    }
}

impl Transport for UsbTransport {
    fn send(&mut self, frame: &[u8]) -> std::result::Result<(), TransportError> {
        let written = self
            .handle
            .write_interrupt(self.endpoint_out, frame, self.timeout)
            .map_err(|e| map_usb_error(e, TransportError::WriteTimeout))?;
        if written != frame.len() {
            return Err(TransportError::ShortWrite {
                expected: frame.len(),
                actual: written,
            });
        }
        Ok(())
    }

    fn receive(&mut self, frame: &mut [u8]) -> std::result::Result<usize, TransportError> {
        self.handle
            .read_interrupt(self.endpoint_in, frame, self.timeout)
            .map_err(|e| map_usb_error(e, TransportError::ReadTimeout))
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        self.release();
    }
}
