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

//! Command protocol codec
//!
//! Outbound frames are 63 bytes: opcode, two parameter bytes, zero padding.
//! Inbound frames are 16 bytes: a status byte followed by payload. A
//! non-zero status means the accessory rejected the command and the
//! payload must not be interpreted.

use std::fmt;

use crate::constants::{fan_mode, frame, opcode, status};
use crate::error::{CproError, Result, TransportError};

/// Commands understood by the accessory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    GetTempConfig = opcode::GET_TEMP_CONFIG,
    GetTemp = opcode::GET_TEMP,
    GetVoltage = opcode::GET_VOLTAGE,
    GetFanConfig = opcode::GET_FAN_CONFIG,
    GetFanRpm = opcode::GET_FAN_RPM,
    SetFanPwm = opcode::SET_FAN_FPWM,
}

impl Command {
    pub fn opcode(self) -> u8 {
        self as u8
    }

    pub fn from_opcode(op: u8) -> Option<Self> {
        match op {
            opcode::GET_TEMP_CONFIG => Some(Command::GetTempConfig),
            opcode::GET_TEMP => Some(Command::GetTemp),
            opcode::GET_VOLTAGE => Some(Command::GetVoltage),
            opcode::GET_FAN_CONFIG => Some(Command::GetFanConfig),
            opcode::GET_FAN_RPM => Some(Command::GetFanRpm),
            opcode::SET_FAN_FPWM => Some(Command::SetFanPwm),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:02x})", self, self.opcode())
    }
}

/// Write a command into `buf`, clearing every byte not used by it.
///
/// The accessory reads the whole frame, so leftovers from a previous
/// reply occupying the same buffer would be taken as parameters.
pub fn encode(buf: &mut [u8; frame::OUT_SIZE], command: Command, param1: u8, param2: u8) {
    buf.fill(0);
    buf[0] = command.opcode();
    buf[1] = param1;
    buf[2] = param2;
}

/// Decoded view of a successful response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply<'a> {
    payload: &'a [u8],
}

impl<'a> Reply<'a> {
    /// Payload bytes following the status byte
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Big-endian u16 in reply bytes 1-2
    pub fn be16(&self) -> u16 {
        u16::from_be_bytes([self.byte(0), self.byte(1)])
    }

    /// Payload byte `idx` (reply byte `idx + 1`), zero past the end
    pub fn byte(&self, idx: usize) -> u8 {
        self.payload.get(idx).copied().unwrap_or(0)
    }
}

/// Check the status byte of a response to `command` and expose its payload.
pub fn decode(command: Command, buf: &[u8]) -> Result<Reply<'_>> {
    let Some((&code, payload)) = buf.split_first() else {
        return Err(TransportError::ShortRead { expected: frame::IN_SIZE, actual: 0 }.into());
    };
    if code != status::OK {
        return Err(CproError::DeviceStatus { command: command.opcode(), status: code });
    }
    Ok(Reply { payload })
}

/// Fan connection type from GET_FAN_CONFIG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanMode {
    Disconnected,
    ThreePin,
    FourPin,
    /// Nonzero value this driver has no name for; still counts as connected
    Other(u8),
}

impl FanMode {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            fan_mode::DISCONNECTED => FanMode::Disconnected,
            fan_mode::THREE_PIN => FanMode::ThreePin,
            fan_mode::FOUR_PIN => FanMode::FourPin,
            other => FanMode::Other(other),
        }
    }

    pub fn is_connected(self) -> bool {
        !matches!(self, FanMode::Disconnected)
    }

    /// Label suffix; `None` when nothing is plugged in
    pub fn kind(self) -> Option<&'static str> {
        match self {
            FanMode::Disconnected => None,
            FanMode::ThreePin => Some("3pin"),
            FanMode::FourPin => Some("4pin"),
            FanMode::Other(_) => Some("other"),
        }
    }
}
