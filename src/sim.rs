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

//! Simulated Commander Pro
//!
//! A software model of the accessory that answers every command over the
//! [`Transport`] trait. Used by the test suite and by `cprofan --simulate`
//! for bring-up without hardware.
//!
//! Clones share state, so a test can keep one clone to inspect the
//! journal and the applied duty cycles after handing the other to a
//! device handle.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::constants::{channels, fan_mode, frame, status};
use crate::error::TransportError;
use crate::protocol::Command;
use crate::transport::Transport;

/// Status the simulator answers for parameters it cannot serve
pub const STATUS_REJECTED: u8 = 0xff;

/// Which side of an exchange a journal entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

/// One frame seen by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalEntry {
    pub direction: Direction,
    pub opcode: u8,
    pub param1: u8,
    pub param2: u8,
    pub status: u8,
}

#[derive(Debug, Default)]
struct SimState {
    temps: [Option<u16>; channels::TEMP_COUNT],
    fan_modes: [u8; channels::FAN_COUNT],
    rpms: [u16; channels::FAN_COUNT],
    rails: [u16; channels::VOLTAGE_COUNT],
    applied_percent: [Option<u8>; channels::FAN_COUNT],
    forced_status: HashMap<u8, u8>,
    latency: Duration,
    pending: Option<[u8; 3]>,
    journal: Vec<JournalEntry>,
    disconnected: bool,
}

/// Software stand-in for the accessory
#[derive(Debug, Clone, Default)]
pub struct SimulatedCommander {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedCommander {
    /// A device with nothing plugged in and all rails at 0 mV
    pub fn new() -> Self {
        Self::default()
    }

    /// A plausible desk setup: two probes, three fans, nominal rails
    pub fn demo() -> Self {
        Self::new()
            .with_temperature(0, 305)
            .with_temperature(1, 412)
            .with_fan(0, fan_mode::FOUR_PIN, 1180)
            .with_fan(1, fan_mode::FOUR_PIN, 1215)
            .with_fan(3, fan_mode::THREE_PIN, 860)
            .with_rail(0, 12_096)
            .with_rail(1, 5_024)
            .with_rail(2, 3_344)
    }

    /// Plug a probe into `channel` reporting `raw` whole degrees
    pub fn with_temperature(self, channel: usize, raw: u16) -> Self {
        if let Some(slot) = self.state.lock().temps.get_mut(channel) {
            *slot = Some(raw);
        }
        self
    }

    /// Plug a fan of connection `mode` spinning at `rpm` into `channel`
    pub fn with_fan(self, channel: usize, mode: u8, rpm: u16) -> Self {
        {
            let mut st = self.state.lock();
            if channel < channels::FAN_COUNT {
                st.fan_modes[channel] = mode;
                st.rpms[channel] = rpm;
            }
        }
        self
    }

    pub fn with_rail(self, rail: usize, millivolts: u16) -> Self {
        if let Some(slot) = self.state.lock().rails.get_mut(rail) {
            *slot = millivolts;
        }
        self
    }

    /// Delay every response by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().latency = latency;
        self
    }

    /// Answer every `opcode` command with `status`
    pub fn failing_status(self, opcode: u8, status: u8) -> Self {
        self.state.lock().forced_status.insert(opcode, status);
        self
    }

    /// Make every further transfer fail as if the cable were pulled
    pub fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }

    /// Unplug the probe on `channel` after attach
    pub fn remove_temperature(&self, channel: usize) {
        if let Some(slot) = self.state.lock().temps.get_mut(channel) {
            *slot = None;
        }
    }

    /// Duty percentage last accepted for `channel`
    pub fn applied_percent(&self, channel: usize) -> Option<u8> {
        self.state.lock().applied_percent.get(channel).copied().flatten()
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().journal.clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|e| e.direction == Direction::Request)
            .count()
    }

    fn answer(st: &mut SimState, req: [u8; 3], out: &mut [u8]) -> u8 {
        let [op, p1, p2] = req;
        let ch = p1 as usize;
        if let Some(&forced) = st.forced_status.get(&op) {
            return forced;
        }
        let Some(command) = Command::from_opcode(op) else {
            return STATUS_REJECTED;
        };
        match command {
            Command::GetTempConfig => {
                for (i, t) in st.temps.iter().enumerate() {
                    out[1 + i] = t.is_some() as u8;
                }
                status::OK
            }
            Command::GetTemp => match st.temps.get(ch).copied().flatten() {
                Some(raw) => {
                    out[1..3].copy_from_slice(&raw.to_be_bytes());
                    status::OK
                }
                None => status::SENSOR_ABSENT,
            },
            Command::GetVoltage => match st.rails.get(ch) {
                Some(mv) => {
                    out[1..3].copy_from_slice(&mv.to_be_bytes());
                    status::OK
                }
                None => STATUS_REJECTED,
            },
            Command::GetFanConfig => {
                out[1..1 + channels::FAN_COUNT].copy_from_slice(&st.fan_modes);
                status::OK
            }
            Command::GetFanRpm => {
                if ch >= channels::FAN_COUNT {
                    return STATUS_REJECTED;
                }
                let rpm = if st.fan_modes[ch] == fan_mode::DISCONNECTED { 0 } else { st.rpms[ch] };
                out[1..3].copy_from_slice(&rpm.to_be_bytes());
                status::OK
            }
            Command::SetFanPwm => {
                if ch >= channels::FAN_COUNT || p2 > 100 {
                    return STATUS_REJECTED;
                }
                st.applied_percent[ch] = Some(p2);
                status::OK
            }
        }
    }
}

impl Transport for SimulatedCommander {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let mut st = self.state.lock();
        if st.disconnected {
            return Err(TransportError::Disconnected);
        }
        if frame.len() != frame::OUT_SIZE {
            return Err(TransportError::ShortWrite {
                expected: frame::OUT_SIZE,
                actual: frame.len(),
            });
        }
        let req = [frame[0], frame[1], frame[2]];
        st.pending = Some(req);
        st.journal.push(JournalEntry {
            direction: Direction::Request,
            opcode: req[0],
            param1: req[1],
            param2: req[2],
            status: 0,
        });
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let latency = self.state.lock().latency;
        if !latency.is_zero() {
            thread::sleep(latency);
        }

        let mut st = self.state.lock();
        if st.disconnected {
            return Err(TransportError::Disconnected);
        }
        let Some(req) = st.pending.take() else {
            return Err(TransportError::ReadTimeout);
        };

        let mut out = [0u8; frame::IN_SIZE];
        let code = Self::answer(&mut st, req, &mut out);
        if code != status::OK {
            out = [0u8; frame::IN_SIZE];
        }
        out[0] = code;
        st.journal.push(JournalEntry {
            direction: Direction::Response,
            opcode: req[0],
            param1: req[1],
            param2: req[2],
            status: code,
        });

        let n = buf.len().min(frame::IN_SIZE);
        buf[..n].copy_from_slice(&out[..n]);
        Ok(n)
    }
}
