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

//! Constants for the Commander Pro driver
//!
//! Wire-level values, channel counts, USB identifiers and configuration
//! defaults live here. Other modules refer to these by name.

use std::time::Duration;

/// USB identity and link parameters
pub mod usb {
    use super::Duration;

    /// Corsair
    pub const VENDOR_ID: u16 = 0x1b1c;

    /// Commander Pro
    pub const PRODUCT_ID: u16 = 0x0c10;

    /// Interface carrying the command endpoints
    pub const INTERFACE: u8 = 0;

    /// Interrupt OUT endpoint (commands)
    pub const ENDPOINT_OUT: u8 = 0x02;

    /// Interrupt IN endpoint (responses)
    pub const ENDPOINT_IN: u8 = 0x81;

    /// Direction bit of an endpoint address
    pub const ENDPOINT_DIR_IN: u8 = 0x80;

    /// Per-transfer timeout; an exchange may take up to twice this
    pub const TIMEOUT: Duration = Duration::from_millis(1000);

    /// Upper bound accepted from configuration
    pub const MAX_TIMEOUT_MS: u64 = 10_000;
}

/// Frame geometry
pub mod frame {
    /// Outbound command frame length
    pub const OUT_SIZE: usize = 63;

    /// Inbound response frame length
    pub const IN_SIZE: usize = 16;
}

/// Command opcodes (byte 0 of an outbound frame)
pub mod opcode {
    /// Bytes 1-4 of the reply: per-sensor connectivity
    pub const GET_TEMP_CONFIG: u8 = 0x10;
    /// Byte 1 = sensor; reply bytes 1-2 = temperature (BE16)
    pub const GET_TEMP: u8 = 0x11;
    /// Byte 1 = rail; reply bytes 1-2 = millivolts (BE16)
    pub const GET_VOLTAGE: u8 = 0x12;
    /// Bytes 1-6 of the reply: per-fan mode
    pub const GET_FAN_CONFIG: u8 = 0x20;
    /// Byte 1 = fan; reply bytes 1-2 = rpm (BE16)
    pub const GET_FAN_RPM: u8 = 0x21;
    /// Byte 1 = fan, byte 2 = percentage 0-100
    pub const SET_FAN_FPWM: u8 = 0x23;
}

/// Status codes (byte 0 of an inbound frame)
pub mod status {
    pub const OK: u8 = 0x00;

    /// Reported by GET_TEMP when no probe is plugged in
    pub const SENSOR_ABSENT: u8 = 0x11;
}

/// Channel counts per category
pub mod channels {
    pub const TEMP_COUNT: usize = 4;
    pub const FAN_COUNT: usize = 6;
    pub const VOLTAGE_COUNT: usize = 3;

    /// Rail labels, indexed by rail number
    pub const VOLTAGE_LABELS: [&str; VOLTAGE_COUNT] = ["12V", "5V", "3.3V"];
}

/// Fan connection modes reported by GET_FAN_CONFIG
pub mod fan_mode {
    pub const DISCONNECTED: u8 = 0;
    pub const THREE_PIN: u8 = 1;
    pub const FOUR_PIN: u8 = 2;
}

/// PWM scales
pub mod pwm {
    /// Maximum host-side PWM value
    pub const MAX_VALUE: u8 = 255;

    /// Maximum device-side duty percentage
    pub const MAX_PERCENT: u8 = 100;

    /// Cached value before any write
    pub const DEFAULT_VALUE: u8 = 0;

    /// Scale a 0-255 PWM value to the accessory's 0-100 percentage,
    /// rounding to nearest.
    ///
    /// `round(v * 100 / 255)` computed in integers as
    /// `(2 * v * 100 + 255) / 510`; the quotient never lands on a half.
    #[inline]
    pub fn to_percent(value: u8) -> u8 {
        let v = value as u32;
        let max = MAX_VALUE as u32;
        ((2 * v * MAX_PERCENT as u32 + max) / (2 * max)) as u8
    }
}

/// Temperature units
pub mod temperature {
    /// Raw whole-degree readings are multiplied by this to give centidegrees
    pub const CENTIDEGREE_FACTOR: i64 = 10;
}

/// Configuration file locations
pub mod paths {
    /// Directory name under the user's config dir
    pub const APP_DIR: &str = "cprofan";

    /// Configuration file name
    pub const CONFIG_FILE: &str = "config.json";

    /// System-wide fallback
    pub const SYSTEM_CONFIG: &str = "/etc/cprofan/config.json";
}

/// hwmon-style access modes
pub mod mode {
    pub const READ_ONLY: u32 = 0o444;
    pub const READ_WRITE: u32 = 0o644;
}

/// Conventional errno values surfaced at the host boundary
pub mod errno {
    pub const EIO: i32 = 5;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
    pub const ENODATA: i32 = 61;
    pub const EOPNOTSUPP: i32 = 95;
    pub const ETIMEDOUT: i32 = 110;
}
