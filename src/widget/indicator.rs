use crate::bridge::{BridgeEvent, BridgeRequest};
use crate::device::catalog::CatalogError;
use crate::device::{IndicatorGroup, StateOption};

/// Variant for buttons that are not the active state
pub const INACTIVE_VARIANT: &str = "dark";

/// Pick the option to display for an authoritative code.
/// Unknown or missing codes keep the previous display.
pub fn reconcile(group: &IndicatorGroup, previous: &StateOption, incoming: Option<&str>) -> StateOption {
    incoming
        .and_then(|code| group.option_for_code(code))
        .unwrap_or(previous)
        .clone()
}

/// UI-side view of one indicator group.
///
/// Holds only a cached copy of the last broadcast; clicks never change the
/// display until the controller confirms the new state.
#[derive(Debug, Clone)]
pub struct IndicatorWidget {
    group: IndicatorGroup,
    displayed: StateOption,
    authoritative: Option<String>,
    enabled: bool,
}

impl IndicatorWidget {
    pub fn new(group: IndicatorGroup) -> Result<Self, CatalogError> {
        let displayed = group
            .default_state()
            .cloned()
            .ok_or_else(|| CatalogError::EmptyGroup(group.title.clone()))?;

        Ok(Self {
            group,
            displayed,
            authoritative: None,
            enabled: false,
        })
    }

    pub fn group(&self) -> &IndicatorGroup {
        &self.group
    }

    pub fn displayed(&self) -> &StateOption {
        &self.displayed
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Buttons rendered for this group, `states[1..]`
    pub fn buttons(&self) -> &[StateOption] {
        self.group.alternatives()
    }

    /// Apply an authoritative code. Returns true if it differed from the last one.
    pub fn observe_state(&mut self, code: Option<&str>) -> bool {
        if self.authoritative.as_deref() == code {
            return false;
        }
        self.displayed = reconcile(&self.group, &self.displayed, code);
        self.authoritative = code.map(str::to_string);
        true
    }

    pub fn observe_connection(&mut self, open: bool) {
        self.enabled = open;
    }

    /// Feed a bridge broadcast; events for other concerns are ignored
    pub fn apply(&mut self, event: &BridgeEvent) {
        match event {
            BridgeEvent::StateBroadcast(snapshot) => {
                self.observe_state(snapshot.chp_state.as_deref());
            }
            BridgeEvent::ConnectionStatusBroadcast(status) => self.observe_connection(status.com_status),
            _ => {}
        }
    }

    /// Request for a click on `option`. Clicking the active state sends the
    /// group's default command. Disabled widgets and foreign options send nothing.
    pub fn click(&self, option: &StateOption) -> Option<BridgeRequest> {
        if !self.enabled || !self.group.contains(option) {
            return None;
        }

        let command = if self.is_active(option) {
            &self.group.default_state()?.serial_command
        } else {
            &option.serial_command
        };
        Some(BridgeRequest::state_change(command.as_str()))
    }

    pub fn is_active(&self, option: &StateOption) -> bool {
        self.authoritative.as_deref() == Some(option.c_command.as_str())
    }

    pub fn variant(&self, option: &StateOption) -> &str {
        if self.is_active(option) {
            self.group.active_variant.as_str()
        } else {
            INACTIVE_VARIANT
        }
    }
}
