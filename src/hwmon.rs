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

//! hwmon-style attribute surface
//!
//! Names follow the sysfs conventions: `temp1_input`, `fan3_label`,
//! `pwm2`, `in0_input`. temp/fan/pwm are numbered from 1, voltage rails
//! from 0. An attribute is only visible when the channel behind it is
//! connected; voltage rails are always visible.

use std::fmt;

use crate::constants::{channels, mode};
use crate::device::CommanderPro;
use crate::error::{CproError, Result};
use crate::registry::{ChannelKind, ChannelRegistry};
use crate::transport::Transport;

/// hwmon sensor class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    Temp,
    Fan,
    Pwm,
    In,
}

impl SensorType {
    /// Registry category whose connectivity gates this sensor
    pub fn channel_kind(self) -> ChannelKind {
        match self {
            SensorType::Temp => ChannelKind::Temperature,
            SensorType::Fan | SensorType::Pwm => ChannelKind::Fan,
            SensorType::In => ChannelKind::Voltage,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            SensorType::Temp => "temp",
            SensorType::Fan => "fan",
            SensorType::Pwm => "pwm",
            SensorType::In => "in",
        }
    }

    /// Offset between the 0-based channel and the number in the name
    fn base(self) -> usize {
        match self {
            SensorType::In => 0,
            _ => 1,
        }
    }
}

/// One attribute; channels are stored 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwmonAttr {
    TempInput(usize),
    TempLabel(usize),
    FanInput(usize),
    FanLabel(usize),
    FanEnable(usize),
    Pwm(usize),
    InInput(usize),
    InLabel(usize),
}

/// Parse the number between `prefix` and `suffix` in a file name
pub fn extract_index(fname: &str, prefix: &str, suffix: &str) -> Option<usize> {
    if fname.starts_with(prefix) && fname.ends_with(suffix) && fname.len() > prefix.len() + suffix.len() {
        let mid = &fname[prefix.len()..fname.len() - suffix.len()];
        if mid.bytes().all(|b| b.is_ascii_digit()) {
            return mid.parse().ok();
        }
    }
    None
}

impl HwmonAttr {
    /// Parse an attribute name. Unknown names and out-of-range channels
    /// give `None`.
    pub fn parse(name: &str) -> Option<Self> {
        type Ctor = fn(usize) -> HwmonAttr;
        const TABLE: [(SensorType, &str, Ctor); 8] = [
            (SensorType::Temp, "_input", HwmonAttr::TempInput),
            (SensorType::Temp, "_label", HwmonAttr::TempLabel),
            (SensorType::Fan, "_input", HwmonAttr::FanInput),
            (SensorType::Fan, "_label", HwmonAttr::FanLabel),
            (SensorType::Fan, "_enable", HwmonAttr::FanEnable),
            (SensorType::Pwm, "", HwmonAttr::Pwm),
            (SensorType::In, "_input", HwmonAttr::InInput),
            (SensorType::In, "_label", HwmonAttr::InLabel),
        ];

        for (sensor, suffix, ctor) in TABLE {
            let Some(n) = extract_index(name, sensor.prefix(), suffix) else {
                continue;
            };
            let channel = n.checked_sub(sensor.base())?;
            if channel >= sensor.channel_kind().count() {
                return None;
            }
            return Some(ctor(channel));
        }
        None
    }

    pub fn sensor_type(self) -> SensorType {
        match self {
            HwmonAttr::TempInput(_) | HwmonAttr::TempLabel(_) => SensorType::Temp,
            HwmonAttr::FanInput(_) | HwmonAttr::FanLabel(_) | HwmonAttr::FanEnable(_) => {
                SensorType::Fan
            }
            HwmonAttr::Pwm(_) => SensorType::Pwm,
            HwmonAttr::InInput(_) | HwmonAttr::InLabel(_) => SensorType::In,
        }
    }

    /// 0-based channel index
    pub fn channel(self) -> usize {
        match self {
            HwmonAttr::TempInput(ch)
            | HwmonAttr::TempLabel(ch)
            | HwmonAttr::FanInput(ch)
            | HwmonAttr::FanLabel(ch)
            | HwmonAttr::FanEnable(ch)
            | HwmonAttr::Pwm(ch)
            | HwmonAttr::InInput(ch)
            | HwmonAttr::InLabel(ch) => ch,
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(self, HwmonAttr::FanEnable(_) | HwmonAttr::Pwm(_))
    }

    /// Access mode if visible on a device with `registry`, `None` if hidden
    pub fn mode(self, registry: &ChannelRegistry) -> Option<u32> {
        let kind = self.sensor_type().channel_kind();
        if !registry.is_connected(kind, self.channel()) {
            return None;
        }
        Some(if self.is_writable() { mode::READ_WRITE } else { mode::READ_ONLY })
    }

    /// Every attribute name the surface knows, visible or not
    pub fn all() -> Vec<HwmonAttr> {
        let mut attrs = Vec::new();
        for ch in 0..channels::TEMP_COUNT {
            attrs.push(HwmonAttr::TempInput(ch));
            attrs.push(HwmonAttr::TempLabel(ch));
        }
        for ch in 0..channels::FAN_COUNT {
            attrs.push(HwmonAttr::FanInput(ch));
            attrs.push(HwmonAttr::FanLabel(ch));
            attrs.push(HwmonAttr::FanEnable(ch));
        }
        for ch in 0..channels::FAN_COUNT {
            attrs.push(HwmonAttr::Pwm(ch));
        }
        for ch in 0..channels::VOLTAGE_COUNT {
            attrs.push(HwmonAttr::InInput(ch));
            attrs.push(HwmonAttr::InLabel(ch));
        }
        attrs
    }
}

impl fmt::Display for HwmonAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sensor = self.sensor_type();
        let n = self.channel() + sensor.base();
        let suffix = match self {
            HwmonAttr::TempInput(_) | HwmonAttr::FanInput(_) | HwmonAttr::InInput(_) => "_input",
            HwmonAttr::TempLabel(_) | HwmonAttr::FanLabel(_) | HwmonAttr::InLabel(_) => "_label",
            HwmonAttr::FanEnable(_) => "_enable",
            HwmonAttr::Pwm(_) => "",
        };
        write!(f, "{}{}{}", sensor.prefix(), n, suffix)
    }
}

impl<T: Transport> CommanderPro<T> {
    /// Access mode of `attr` on this device, `None` if hidden
    pub fn attr_mode(&self, attr: HwmonAttr) -> Option<u32> {
        attr.mode(self.registry())
    }

    /// Visible attributes in stable order
    pub fn attributes(&self) -> Vec<HwmonAttr> {
        HwmonAttr::all()
            .into_iter()
            .filter(|a| self.attr_mode(*a).is_some())
            .collect()
    }

    fn require_visible(&self, attr: HwmonAttr) -> Result<()> {
        if self.attr_mode(attr).is_some() {
            Ok(())
        } else {
            Err(CproError::not_supported(format!("{} is not available", attr)))
        }
    }

    /// Read a numeric attribute
    pub fn read(&self, attr: HwmonAttr) -> Result<i64> {
        self.require_visible(attr)?;
        match attr {
            HwmonAttr::TempInput(ch) => self.read_temperature(ch),
            HwmonAttr::FanInput(ch) => self.read_fan_rpm(ch).map(i64::from),
            HwmonAttr::FanEnable(ch) => self.fan_enabled(ch).map(i64::from),
            HwmonAttr::Pwm(ch) => self.read_pwm(ch).map(i64::from),
            HwmonAttr::InInput(ch) => self.read_voltage(ch).map(i64::from),
            HwmonAttr::TempLabel(_) | HwmonAttr::FanLabel(_) | HwmonAttr::InLabel(_) => Err(
                CproError::not_supported(format!("{} is a string attribute", attr)),
            ),
        }
    }

    /// Read any attribute as text, the way sysfs would show it
    pub fn read_string(&self, attr: HwmonAttr) -> Result<String> {
        self.require_visible(attr)?;
        match attr {
            HwmonAttr::TempLabel(ch) => self.read_label(ch, ChannelKind::Temperature).map(str::to_owned),
            HwmonAttr::FanLabel(ch) => self.read_label(ch, ChannelKind::Fan).map(str::to_owned),
            HwmonAttr::InLabel(ch) => self.read_label(ch, ChannelKind::Voltage).map(str::to_owned),
            _ => self.read(attr).map(|v| v.to_string()),
        }
    }

    /// Write a writable attribute
    pub fn write(&self, attr: HwmonAttr, value: i64) -> Result<()> {
        self.require_visible(attr)?;
        match attr {
            HwmonAttr::Pwm(ch) => self.set_pwm(ch, value),
            HwmonAttr::FanEnable(ch) => match value {
                0 => self.set_fan_enabled(ch, false),
                1 => self.set_fan_enabled(ch, true),
                _ => Err(CproError::InvalidValue { attr: attr.to_string(), value }),
            },
            _ => Err(CproError::not_supported(format!("{} is read-only", attr))),
        }
    }
}
