/*
 * Test utilities and mock helpers for cprofan
 *
 * Scripted and mocked transports, device fixtures and small assertion
 * helpers shared by the unit test modules.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::constants::frame;
    use crate::device::CommanderPro;
    use crate::error::TransportError;
    use crate::sim::SimulatedCommander;
    use crate::transport::{Link, MockTransport, Transport};
    use std::collections::VecDeque;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Transport that answers a fixed list of exchanges in order.
    ///
    /// Each entry is the opcode the next request must carry and the reply
    /// bytes (status byte first) to hand back, zero-padded to a full frame.
    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        script: VecDeque<(u8, Vec<u8>)>,
        pending: Option<Vec<u8>>,
    }

    impl ScriptedTransport {
        pub fn new(script: Vec<(u8, Vec<u8>)>) -> Self {
            Self {
                script: script.into(),
                pending: None,
            }
        }

        /// Exchanges not yet consumed
        pub fn remaining(&self) -> usize {
            self.script.len()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
            let (expected, reply) = self
                .script
                .pop_front()
                .unwrap_or_else(|| panic!("Unscripted request 0x{:02x}", frame[0]));
            assert_eq!(
                frame[0], expected,
                "Expected opcode 0x{:02x}, got 0x{:02x}",
                expected, frame[0]
            );
            self.pending = Some(reply);
            Ok(())
        }

        fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            let reply = self.pending.take().ok_or(TransportError::ReadTimeout)?;
            buf.fill(0);
            let n = reply.len().min(buf.len());
            buf[..n].copy_from_slice(&reply[..n]);
            Ok(buf.len())
        }
    }

    /// Link over a [`ScriptedTransport`]
    pub fn scripted_link(script: Vec<(u8, Vec<u8>)>) -> Link<ScriptedTransport> {
        Link::new(ScriptedTransport::new(script))
    }

    /// Successful reply carrying `payload`
    pub fn ok_reply(payload: &[u8]) -> Vec<u8> {
        let mut reply = vec![0u8];
        reply.extend_from_slice(payload);
        reply
    }

    /// Successful reply carrying a big-endian u16
    pub fn be16_reply(value: u16) -> Vec<u8> {
        ok_reply(&value.to_be_bytes())
    }

    /// Mock transport scripted for exactly the two attach-time exchanges.
    ///
    /// Any request after attach panics, so a test can prove an operation
    /// never reached the device.
    pub fn attach_mock(temps: [u8; 4], fans: [u8; 6]) -> MockTransport {
        let mut mock = MockTransport::new();
        let mut seq = mockall::Sequence::new();

        mock.expect_send()
            .withf(|f| f.len() == frame::OUT_SIZE && f[0] == 0x10)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_receive()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |buf: &mut [u8]| {
                buf.fill(0);
                buf[1..5].copy_from_slice(&temps);
                Ok(buf.len())
            });
        mock.expect_send()
            .withf(|f| f.len() == frame::OUT_SIZE && f[0] == 0x20)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_receive()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |buf: &mut [u8]| {
                buf.fill(0);
                buf[1..7].copy_from_slice(&fans);
                Ok(buf.len())
            });

        mock
    }

    /// Device attached to [`SimulatedCommander::demo`], plus an observer clone
    pub fn demo_device() -> (CommanderPro<SimulatedCommander>, SimulatedCommander) {
        let sim = SimulatedCommander::demo();
        let observer = sim.clone();
        let dev = CommanderPro::attach(sim).unwrap();
        (dev, observer)
    }

    /// Creates a temporary file with JSON content
    pub fn create_temp_json_file<T: serde::Serialize>(data: &T) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        let json = serde_json::to_string_pretty(data).unwrap();
        temp_file.write_all(json.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    /// Asserts that a slice contains a specific item
    pub fn assert_contains<T: PartialEq + std::fmt::Debug>(slice: &[T], item: &T) {
        assert!(
            slice.contains(item),
            "Slice {:?} does not contain item {:?}",
            slice, item
        );
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::protocol::Command;
    use crate::transport::Transport;

    #[test]
    fn test_scripted_link_replays_in_order() {
        let mut link = scripted_link(vec![(0x21, be16_reply(900)), (0x12, be16_reply(5000))]);
        assert_eq!(link.exchange(Command::GetFanRpm, 0, 0).unwrap().be16(), 900);
        assert_eq!(link.exchange(Command::GetVoltage, 1, 0).unwrap().be16(), 5000);
        assert_eq!(link.transport().remaining(), 0);
    }

    #[test]
    #[should_panic]
    fn test_scripted_link_rejects_wrong_opcode() {
        let mut link = scripted_link(vec![(0x21, be16_reply(900))]);
        let _ = link.exchange(Command::GetTemp, 0, 0);
    }

    #[test]
    fn test_scripted_receive_without_send() {
        let mut transport = ScriptedTransport::new(vec![]);
        let mut buf = [0u8; 16];
        assert!(transport.receive(&mut buf).is_err());
    }

    #[test]
    fn test_ok_reply_layout() {
        assert_eq!(ok_reply(&[1, 2]), vec![0, 1, 2]);
        assert_eq!(be16_reply(0x0131), vec![0, 0x01, 0x31]);
    }

    #[test]
    fn test_demo_device_fixture() {
        let (dev, sim) = demo_device();
        assert_eq!(sim.request_count(), 2);
        assert_contains(&dev.registry().connected(crate::registry::ChannelKind::Fan), &3);
    }

    #[test]
    fn test_create_temp_json_file() {
        let file = create_temp_json_file(&serde_json::json!({ "timeout_ms": 250 }));
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.contains("250"));
    }
}
