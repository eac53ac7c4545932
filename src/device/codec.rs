use super::models::{IndicatorGroup, StateOption};
use super::{DecodeError, ProtocolError};

/// Maps indicator options to wire commands and device reports back to
/// canonical codes. Holds no mutable state.
#[derive(Debug, Clone)]
pub struct DeviceCommandCodec {
    groups: Vec<IndicatorGroup>,
}

impl DeviceCommandCodec {
    pub fn new(groups: Vec<IndicatorGroup>) -> Self {
        Self { groups }
    }

    /// Wire bytes for an option. The serial command is already encoded for
    /// the device, so this only checks that the option is known.
    pub fn encode(&self, option: &StateOption) -> Result<Vec<u8>, ProtocolError> {
        if self.groups.iter().any(|g| g.contains(option)) {
            Ok(option.serial_command.as_bytes().to_vec())
        } else {
            Err(ProtocolError::UnknownCommand(option.serial_command.clone()))
        }
    }

    /// Find the group and option a raw serial command belongs to
    pub fn resolve(&self, command: &str) -> Result<(&IndicatorGroup, &StateOption), ProtocolError> {
        self.groups
            .iter()
            .find_map(|g| g.option_for_command(command).map(|o| (g, o)))
            .ok_or_else(|| ProtocolError::UnknownCommand(command.to_string()))
    }

    /// Canonical code carried by a raw device report
    pub fn decode(&self, report: &[u8]) -> Result<String, DecodeError> {
        let text = std::str::from_utf8(report)
            .map_err(|_| DecodeError::MalformedReport(format!("not UTF-8: {}", hex::encode(report))))?;

        report_code(text).map(str::to_string)
    }
}

/// Code carried by one report line: surrounding whitespace is dropped, and
/// the rest must be non-empty and free of control characters.
pub fn report_code(text: &str) -> Result<&str, DecodeError> {
    let code = text.trim();
    if code.is_empty() {
        return Err(DecodeError::MalformedReport("empty report".to_string()));
    }
    if code.chars().any(char::is_control) {
        return Err(DecodeError::MalformedReport(format!("control characters in {:?}", code)));
    }
    Ok(code)
}
