use crate::error::TransportError;
use crate::interface::serial_transport::CommandTransport;

#[derive(Default)]
pub struct MockTransport {
    // Commands received in order.
    pub commands: Vec<String>,
    // Fail every command or not.
    pub is_failed: bool,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandTransport for MockTransport {
    fn send_command(&mut self, command: &str) -> Result<(), TransportError> {
        if self.is_failed {
            return Err(TransportError::Disconnected);
        }

        self.commands.push(command.to_string());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_command() {
        let mut transport = MockTransport::new();

        transport.send_command("U:5,90").unwrap();

        transport.is_failed = true;
        assert!(transport.send_command("U:6,90").is_err());

        assert_eq!(transport.commands, vec!["U:5,90"]);
    }
}
