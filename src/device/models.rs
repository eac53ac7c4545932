use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One selectable state of an indicator group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOption {
    #[serde(rename = "ProperName")]
    pub proper_name: String,
    #[serde(rename = "ShortName")]
    pub short_name: String,
    /// Payload written to the wire
    #[serde(rename = "SerialCommand")]
    pub serial_command: String,
    /// Code the device reports while this state is active
    #[serde(rename = "CCommand")]
    pub c_command: String,
}

impl StateOption {
    pub fn new(proper_name: &str, short_name: &str, serial_command: &str, c_command: &str) -> Self {
        Self {
            proper_name: proper_name.to_string(),
            short_name: short_name.to_string(),
            serial_command: serial_command.to_string(),
            c_command: c_command.to_string(),
        }
    }
}

/// A named control with mutually exclusive states.
/// `states[0]` is the off/default state; the rest are rendered as buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorGroup {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "ProperName")]
    pub proper_name: String,
    #[serde(rename = "ShortName")]
    pub short_name: String,
    #[serde(rename = "ActiveVariant", default = "default_active_variant")]
    pub active_variant: String,
    pub states: Vec<StateOption>,
}

fn default_active_variant() -> String {
    "warning".to_string()
}

impl IndicatorGroup {
    /// The distinguished off/default option
    pub fn default_state(&self) -> Option<&StateOption> {
        self.states.first()
    }

    /// Selectable alternatives, `states[1..]`
    pub fn alternatives(&self) -> &[StateOption] {
        self.states.get(1..).unwrap_or(&[])
    }

    pub fn option_for_code(&self, code: &str) -> Option<&StateOption> {
        self.states.iter().find(|s| s.c_command == code)
    }

    pub fn option_for_command(&self, command: &str) -> Option<&StateOption> {
        self.states.iter().find(|s| s.serial_command == command)
    }

    pub fn contains(&self, option: &StateOption) -> bool {
        self.states.iter().any(|s| s == option)
    }
}

/// Authoritative device state, only ever set from a confirmed round trip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Last confirmed canonical code, `None` until the first read-back
    pub code: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl DeviceState {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn confirmed(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            confirmed_at: Some(Utc::now()),
        }
    }

    pub fn matches(&self, option: &StateOption) -> bool {
        self.code.as_deref() == Some(option.c_command.as_str())
    }
}

/// A single state change to apply, consumed once by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub target_command: String,
    pub request_id: Uuid,
}

impl CommandRequest {
    pub fn new(target_command: impl Into<String>) -> Self {
        Self {
            target_command: target_command.into(),
            request_id: Uuid::new_v4(),
        }
    }
}
