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

//! cprofan - Corsair Commander Pro driver core
//!
//! This library talks to a Commander Pro fan/temperature/voltage
//! controller over its command protocol: reading temperature probes,
//! fan speeds and supply rails, and setting fan duty cycles. The device
//! handle is safe to share between threads; exchanges are serialised
//! internally.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod usb;
pub mod registry;
pub mod device;
pub mod hwmon;
pub mod sim;
pub mod config;
pub mod logger;

#[cfg(test)]
pub mod test_utils;

pub use config::DriverConfig;
pub use device::CommanderPro;
pub use error::{CproError, Result, TransportError};
pub use hwmon::HwmonAttr;
pub use registry::{ChannelKind, ChannelRegistry};
pub use transport::Transport;
