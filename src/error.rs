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

//! Error types for the driver
//!
//! Two layers: [`TransportError`] for failures of the physical exchange,
//! and [`CproError`] for everything a caller of the sensor operations can
//! observe. Callers that want to hide absent sensors rather than report
//! them check [`CproError::is_no_data`].

use std::io;

use crate::constants::errno;
use crate::registry::ChannelKind;

/// Result type alias using CproError
pub type Result<T> = std::result::Result<T, CproError>;

/// Failure of the physical send/receive
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Read timeout")]
    ReadTimeout,

    #[error("Short write: sent {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },

    #[error("Short read: received {actual} of {expected} bytes")]
    ShortRead { expected: usize, actual: usize },

    #[error("Device disconnected")]
    Disconnected,
}

impl TransportError {
    /// Check whether the failure was a transfer timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::ReadTimeout
                | TransportError::WriteTimeout
                | TransportError::Usb(rusb::Error::Timeout)
        )
    }
}

/// Unified error type for driver operations
#[derive(thiserror::Error, Debug)]
pub enum CproError {
    // ============================================================================
    // Link and device failures
    // ============================================================================
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Device rejected command 0x{command:02x} with status 0x{status:02x}")]
    DeviceStatus { command: u8, status: u8 },

    #[error("Device not found (vendor 0x{vendor_id:04x}, product 0x{product_id:04x})")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    // ============================================================================
    // Channel state
    // ============================================================================
    #[error("No data: nothing connected to {kind} channel {channel}")]
    NoData { kind: ChannelKind, channel: usize },

    // ============================================================================
    // Validation
    // ============================================================================
    #[error("Invalid PWM value: {value} (must be 0-255)")]
    InvalidPwm { value: i64 },

    #[error("Invalid {kind} channel: {channel}")]
    InvalidChannel { kind: ChannelKind, channel: usize },

    #[error("Invalid value for {attr}: {value}")]
    InvalidValue { attr: String, value: i64 },

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    // ============================================================================
    // Configuration
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl CproError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not-supported error from a string
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Nothing is plugged into the addressed channel
    pub fn is_no_data(&self) -> bool {
        matches!(self, CproError::NoData { .. })
    }

    /// The exchange itself failed
    pub fn is_transport(&self) -> bool {
        matches!(self, CproError::Transport(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CproError::Transport(e) if e.is_timeout())
    }

    /// Caller-supplied value rejected before any exchange
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            CproError::InvalidPwm { .. }
                | CproError::InvalidChannel { .. }
                | CproError::InvalidValue { .. }
        )
    }

    /// Conventional errno for the host-facing surface
    pub fn errno(&self) -> i32 {
        match self {
            CproError::NoData { .. } => errno::ENODATA,
            CproError::InvalidPwm { .. }
            | CproError::InvalidChannel { .. }
            | CproError::InvalidValue { .. } => errno::EINVAL,
            CproError::NotSupported(_) => errno::EOPNOTSUPP,
            CproError::DeviceNotFound { .. } => errno::ENODEV,
            CproError::Transport(TransportError::Disconnected)
            | CproError::Transport(TransportError::Usb(rusb::Error::NoDevice)) => errno::ENODEV,
            CproError::Transport(e) if e.is_timeout() => errno::ETIMEDOUT,
            _ => errno::EIO,
        }
    }
}
