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

//! Transport channel
//!
//! [`Transport`] is the raw frame pipe (USB in production, a simulator or
//! mock in tests). [`Link`] owns one transport together with the single
//! frame buffer every exchange is built in: the request is encoded into
//! it, sent, and the response is received over it in place. Because the
//! buffer is shared, and because the accessory cannot pipeline, a `Link`
//! must only ever be driven by one caller at a time; the device handle
//! keeps it behind a mutex for that reason.

use tracing::{trace, warn};

use crate::constants::frame;
use crate::error::{Result, TransportError};
use crate::protocol::{self, Command, Reply};

/// Synchronous frame pipe to the accessory
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Send one complete outbound frame
    fn send(&mut self, frame: &[u8]) -> std::result::Result<(), TransportError>;

    /// Receive one inbound frame into `frame`, returning the byte count
    fn receive(&mut self, frame: &mut [u8]) -> std::result::Result<usize, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &[u8]) -> std::result::Result<(), TransportError> {
        (**self).send(frame)
    }

    fn receive(&mut self, frame: &mut [u8]) -> std::result::Result<usize, TransportError> {
        (**self).receive(frame)
    }
}

/// A transport plus the reusable frame buffer
pub struct Link<T> {
    transport: T,
    frame: [u8; frame::OUT_SIZE],
}

impl<T: Transport> Link<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            frame: [0u8; frame::OUT_SIZE],
        }
    }

    /// Run one command/response exchange.
    ///
    /// A response is always drained after the send, even for commands
    /// whose payload the caller ignores; the next command would otherwise
    /// read a stale reply.
    pub fn exchange(&mut self, command: Command, param1: u8, param2: u8) -> Result<Reply<'_>> {
        protocol::encode(&mut self.frame, command, param1, param2);
        trace!(%command, param1, param2, "send");

        self.transport.send(&self.frame)?;

        let received = self.transport.receive(&mut self.frame[..frame::IN_SIZE])?;
        if received < frame::IN_SIZE {
            return Err(TransportError::ShortRead {
                expected: frame::IN_SIZE,
                actual: received,
            }
            .into());
        }
        trace!(%command, status = self.frame[0], "receive");

        let reply = protocol::decode(command, &self.frame[..frame::IN_SIZE]);
        if let Err(ref e) = reply {
            warn!(%command, param1, "{}", e);
        }
        reply
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::status;
    use crate::error::CproError;

    fn reply_with(status_byte: u8, b1: u8, b2: u8) -> impl FnMut(&mut [u8]) -> std::result::Result<usize, TransportError> {
        move |buf: &mut [u8]| {
            buf.fill(0);
            buf[0] = status_byte;
            buf[1] = b1;
            buf[2] = b2;
            Ok(buf.len())
        }
    }

    #[test]
    fn test_exchange_sends_full_frame_and_decodes() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|f| f.len() == frame::OUT_SIZE && f[..3] == [0x21, 2, 0])
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_receive()
            .times(1)
            .returning(reply_with(status::OK, 0x04, 0xb0));

        let mut link = Link::new(mock);
        let reply = link.exchange(Command::GetFanRpm, 2, 0).unwrap();
        assert_eq!(reply.be16(), 1200);
    }

    #[test]
    fn test_exchange_send_failure_skips_receive() {
        let mut mock = MockTransport::new();
        mock.expect_send().times(1).returning(|_| Err(TransportError::WriteTimeout));
        mock.expect_receive().times(0);

        let mut link = Link::new(mock);
        let err = link.exchange(Command::GetTemp, 0, 0).unwrap_err();
        assert!(err.is_transport());
        assert!(err.is_timeout());
    }

    #[test]
    fn test_exchange_drains_reply_for_set_command() {
        let mut mock = MockTransport::new();
        mock.expect_send().times(1).returning(|_| Ok(()));
        mock.expect_receive().times(1).returning(reply_with(status::OK, 0, 0));

        let mut link = Link::new(mock);
        assert!(link.exchange(Command::SetFanPwm, 0, 50).is_ok());
    }

    #[test]
    fn test_exchange_short_read() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| Ok(()));
        mock.expect_receive().returning(|_| Ok(4));

        let mut link = Link::new(mock);
        match link.exchange(Command::GetVoltage, 1, 0) {
            Err(CproError::Transport(TransportError::ShortRead { expected, actual })) => {
                assert_eq!(expected, frame::IN_SIZE);
                assert_eq!(actual, 4);
            }
            other => panic!("Expected ShortRead, got {:?}", other),
        }
    }

    #[test]
    fn test_exchange_device_status() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| Ok(()));
        mock.expect_receive().returning(reply_with(0x03, 0xff, 0xff));

        let mut link = Link::new(mock);
        let err = link.exchange(Command::GetFanRpm, 9, 0).unwrap_err();
        assert!(matches!(err, CproError::DeviceStatus { command: 0x21, status: 0x03 }));
    }

    #[test]
    fn test_exchange_clears_previous_reply_bytes() {
        let mut mock = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_send().times(1).in_sequence(&mut seq).returning(|_| Ok(()));
        mock.expect_receive().times(1).in_sequence(&mut seq).returning(|buf: &mut [u8]| {
            buf.fill(0xee);
            buf[0] = 0;
            Ok(buf.len())
        });
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|f| f[0] == 0x10 && f[1..].iter().all(|&b| b == 0))
            .returning(|_| Ok(()));
        mock.expect_receive().times(1).in_sequence(&mut seq).returning(reply_with(0, 1, 0));

        let mut link = Link::new(mock);
        link.exchange(Command::GetFanConfig, 0, 0).unwrap();
        link.exchange(Command::GetTempConfig, 0, 0).unwrap();
    }
}
