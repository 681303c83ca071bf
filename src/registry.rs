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

//! Channel registry
//!
//! Connectivity and labels for every channel, sampled once when the
//! device is attached. The accessory only reports connectivity reliably
//! at power-on, so nothing here changes afterwards and the registry can
//! be read from any thread without locking.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::channels;
use crate::error::{CproError, Result};
use crate::protocol::{Command, FanMode};
use crate::transport::{Link, Transport};

/// Channel category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Temperature,
    Fan,
    Voltage,
}

impl ChannelKind {
    /// Number of channels in this category
    pub fn count(self) -> usize {
        match self {
            ChannelKind::Temperature => channels::TEMP_COUNT,
            ChannelKind::Fan => channels::FAN_COUNT,
            ChannelKind::Voltage => channels::VOLTAGE_COUNT,
        }
    }

    /// Fail with `InvalidChannel` unless `channel` is in range
    pub fn check(self, channel: usize) -> Result<()> {
        if channel < self.count() {
            Ok(())
        } else {
            Err(CproError::InvalidChannel { kind: self, channel })
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelKind::Temperature => "temperature",
            ChannelKind::Fan => "fan",
            ChannelKind::Voltage => "voltage",
        })
    }
}

/// Attach-time snapshot of which channels are populated
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    temp_connected: u8,
    fan_connected: u8,
    temp_labels: [String; channels::TEMP_COUNT],
    fan_labels: [String; channels::FAN_COUNT],
}

impl ChannelRegistry {
    /// Query temperature and fan connectivity from the device.
    ///
    /// Any failure is returned as-is; a device with unknown connectivity
    /// must not be used.
    pub fn probe<T: Transport>(link: &mut Link<T>) -> Result<Self> {
        let mut temps = [0u8; channels::TEMP_COUNT];
        {
            let reply = link.exchange(Command::GetTempConfig, 0, 0)?;
            for (slot, &raw) in temps.iter_mut().zip(reply.payload()) {
                *slot = raw;
            }
        }

        let mut fans = [0u8; channels::FAN_COUNT];
        {
            let reply = link.exchange(Command::GetFanConfig, 0, 0)?;
            for (slot, &raw) in fans.iter_mut().zip(reply.payload()) {
                *slot = raw;
            }
        }

        Ok(Self::from_config(temps, fans))
    }

    /// Build from raw GET_TEMP_CONFIG / GET_FAN_CONFIG payloads
    pub fn from_config(temps: [u8; channels::TEMP_COUNT], fans: [u8; channels::FAN_COUNT]) -> Self {
        let mut temp_connected = 0u8;
        for (i, &raw) in temps.iter().enumerate() {
            if raw != 0 {
                temp_connected |= 1 << i;
            }
        }

        let fan_modes = fans.map(FanMode::from_raw);
        let mut fan_connected = 0u8;
        for (i, mode) in fan_modes.iter().enumerate() {
            if let FanMode::Other(raw) = mode {
                warn!(fan = i + 1, mode = raw, "Unrecognised fan mode, labelling as other");
            }
            if mode.is_connected() {
                fan_connected |= 1 << i;
            }
        }

        let fan_labels = std::array::from_fn(|i| match fan_modes[i].kind() {
            Some(kind) => format!("fan{} {}", i + 1, kind),
            None => format!("fan{}", i + 1),
        });
        let temp_labels = std::array::from_fn(|i| format!("temp{}", i + 1));

        debug!(
            temps = %format!("{:04b}", temp_connected),
            fans = %format!("{:06b}", fan_connected),
            "Channel connectivity"
        );

        Self {
            temp_connected,
            fan_connected,
            temp_labels,
            fan_labels,
        }
    }

    /// Whether a physical sensor/fan is plugged into `channel`.
    ///
    /// Voltage rails are always present. Out-of-range channels are never
    /// reported connected.
    pub fn is_connected(&self, kind: ChannelKind, channel: usize) -> bool {
        if channel >= kind.count() {
            return false;
        }
        match kind {
            ChannelKind::Temperature => self.temp_connected & (1 << channel) != 0,
            ChannelKind::Fan => self.fan_connected & (1 << channel) != 0,
            ChannelKind::Voltage => true,
        }
    }

    /// Generated label, `None` for out-of-range channels
    pub fn label(&self, kind: ChannelKind, channel: usize) -> Option<&str> {
        match kind {
            ChannelKind::Temperature => self.temp_labels.get(channel).map(String::as_str),
            ChannelKind::Fan => self.fan_labels.get(channel).map(String::as_str),
            ChannelKind::Voltage => channels::VOLTAGE_LABELS.get(channel).copied(),
        }
    }

    /// Indices of connected channels in ascending order
    pub fn connected(&self, kind: ChannelKind) -> Vec<usize> {
        (0..kind.count())
            .filter(|&ch| self.is_connected(kind, ch))
            .collect()
    }
}
