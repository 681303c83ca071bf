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

//! Device handle and sensor operations
//!
//! [`CommanderPro`] is one attached accessory. It owns the transport (via
//! a [`Link`] behind a mutex), the attach-time [`ChannelRegistry`], and the
//! per-fan cached state. Every operation that talks to the device holds
//! the link mutex for the whole encode/send/receive/decode sequence, so
//! any number of threads may share one handle.
//!
//! # Units
//!
//! - Temperature: centidegrees Celsius (raw whole degrees x 10)
//! - Fan speed: RPM, as reported
//! - Voltage: millivolts, as reported
//! - PWM: 0-255 on this side, 0-100 % on the wire
//!
//! # PWM read-back
//!
//! The accessory cannot report the duty cycle it is running. `read_pwm`
//! returns the last value passed to `set_pwm`, whether or not the device
//! accepted it.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::constants::{channels, pwm, status, temperature};
use crate::error::{CproError, Result};
use crate::protocol::Command;
use crate::registry::{ChannelKind, ChannelRegistry};
use crate::transport::{Link, Transport};

/// One attached Commander Pro
pub struct CommanderPro<T: Transport> {
    link: Mutex<Link<T>>,
    registry: ChannelRegistry,
    pwm: [AtomicU8; channels::FAN_COUNT],
    fan_enable: [AtomicBool; channels::FAN_COUNT],
    fan_enable_gating: bool,
}

impl<T: Transport> CommanderPro<T> {
    /// Attach with default settings
    pub fn attach(transport: T) -> Result<Self> {
        Self::attach_with_config(transport, &DriverConfig::default())
    }

    /// Attach to a device, sampling channel connectivity.
    ///
    /// Fails as a whole if connectivity cannot be read.
    pub fn attach_with_config(transport: T, config: &DriverConfig) -> Result<Self> {
        let mut link = Link::new(transport);
        let registry = ChannelRegistry::probe(&mut link)?;

        info!(
            temps = ?registry.connected(ChannelKind::Temperature),
            fans = ?registry.connected(ChannelKind::Fan),
            "Commander Pro attached"
        );

        Ok(Self {
            link: Mutex::new(link),
            registry,
            pwm: std::array::from_fn(|_| AtomicU8::new(pwm::DEFAULT_VALUE)),
            fan_enable: std::array::from_fn(|ch| AtomicBool::new(config.fan_enabled(ch))),
            fan_enable_gating: config.fan_enable_gating,
        })
    }

    /// Attach-time connectivity and labels
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    fn require_connected(&self, kind: ChannelKind, channel: usize) -> Result<()> {
        kind.check(channel)?;
        if self.registry.is_connected(kind, channel) {
            Ok(())
        } else {
            Err(CproError::NoData { kind, channel })
        }
    }

    /// Temperature in centidegrees Celsius
    pub fn read_temperature(&self, channel: usize) -> Result<i64> {
        self.require_connected(ChannelKind::Temperature, channel)?;

        let mut link = self.link.lock();
        let raw = match link.exchange(Command::GetTemp, channel as u8, 0) {
            Ok(reply) => reply.be16(),
            // probe pulled since attach
            Err(CproError::DeviceStatus { status: status::SENSOR_ABSENT, .. }) => {
                debug!(channel, "Temperature probe reported absent");
                return Err(CproError::NoData { kind: ChannelKind::Temperature, channel });
            }
            Err(e) => return Err(e),
        };
        Ok(raw as i64 * temperature::CENTIDEGREE_FACTOR)
    }

    /// Fan speed in RPM
    pub fn read_fan_rpm(&self, channel: usize) -> Result<u32> {
        self.require_connected(ChannelKind::Fan, channel)?;
        if self.fan_enable_gating && !self.fan_enable[channel].load(Ordering::Acquire) {
            return Err(CproError::NoData { kind: ChannelKind::Fan, channel });
        }

        let mut link = self.link.lock();
        let reply = link.exchange(Command::GetFanRpm, channel as u8, 0)?;
        Ok(reply.be16() as u32)
    }

    /// Rail voltage in millivolts (0 = 12V, 1 = 5V, 2 = 3.3V)
    pub fn read_voltage(&self, rail: usize) -> Result<u32> {
        ChannelKind::Voltage.check(rail)?;

        let mut link = self.link.lock();
        let reply = link.exchange(Command::GetVoltage, rail as u8, 0)?;
        Ok(reply.be16() as u32)
    }

    /// Attach-time label; never talks to the device
    pub fn read_label(&self, channel: usize, kind: ChannelKind) -> Result<&str> {
        kind.check(channel)?;
        self.registry
            .label(kind, channel)
            .ok_or(CproError::InvalidChannel { kind, channel })
    }

    /// Set fan duty from a 0-255 value.
    ///
    /// The cached value is updated before the command is sent and is kept
    /// even if the exchange fails.
    pub fn set_pwm(&self, channel: usize, value: i64) -> Result<()> {
        ChannelKind::Fan.check(channel)?;
        let value = u8::try_from(value).map_err(|_| CproError::InvalidPwm { value })?;

        let mut link = self.link.lock();
        self.pwm[channel].store(value, Ordering::Release);

        let percent = pwm::to_percent(value);
        debug!(channel, value, percent, "Setting fan duty");
        link.exchange(Command::SetFanPwm, channel as u8, percent)?;
        Ok(())
    }

    /// Last value passed to [`set_pwm`](Self::set_pwm), 0 before any
    pub fn read_pwm(&self, channel: usize) -> Result<u8> {
        ChannelKind::Fan.check(channel)?;
        Ok(self.pwm[channel].load(Ordering::Acquire))
    }

    /// Local enable flag; gates `read_fan_rpm` when gating is configured
    pub fn set_fan_enabled(&self, channel: usize, enabled: bool) -> Result<()> {
        ChannelKind::Fan.check(channel)?;
        self.fan_enable[channel].store(enabled, Ordering::Release);
        Ok(())
    }

    pub fn fan_enabled(&self, channel: usize) -> Result<bool> {
        ChannelKind::Fan.check(channel)?;
        Ok(self.fan_enable[channel].load(Ordering::Acquire))
    }

    /// Detach, handing back the transport
    pub fn detach(self) -> T {
        self.link.into_inner().into_inner()
    }
}
