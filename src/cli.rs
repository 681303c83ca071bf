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

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "cprofan")]
#[command(version)]
#[command(about = "cprofan - Corsair Commander Pro fan and sensor control")]
#[command(long_about = "cprofan - Corsair Commander Pro fan and sensor control

Reads temperatures, fan speeds and rail voltages from a Commander Pro
and sets fan duty cycles. Attribute names follow hwmon conventions.

EXAMPLES:
    cprofan status                     Show every available reading
    cprofan attrs                      List attributes and access modes
    cprofan read temp1_input           Read one attribute
    cprofan set-pwm 2 128              Set fan 2 to ~50% duty
    cprofan fan-enable 3 off           Stop reporting fan 3's speed
    cprofan --simulate status          Run against a simulated device

ENVIRONMENT VARIABLES:
    RUST_LOG=debug         Enable debug logging (overrides --log-level)
    XDG_CONFIG_HOME        Base directory for cprofan/config.json")]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/cprofan/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use a simulated device instead of USB hardware
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every visible attribute and its value
    Status,

    /// List visible attributes with their access modes
    Attrs,

    /// Read one attribute
    Read {
        /// Attribute name, e.g. fan1_input
        attr: String,
    },

    /// Write one attribute
    Write {
        /// Attribute name, e.g. pwm1
        attr: String,
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },

    /// Set a fan's duty cycle (0-255)
    ///
    /// The device cannot report its duty cycle, so `read pwmN` only shows
    /// values set earlier in the same run.
    SetPwm {
        /// Fan number, starting at 1
        fan: usize,
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },

    /// Enable or disable speed reporting for a fan (saved to the config file)
    FanEnable {
        /// Fan number, starting at 1
        fan: usize,
        state: Switch,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}
