//! Built-in indicator definitions for the CHP light controller.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::codec::report_code;
use super::models::{IndicatorGroup, StateOption};

/// Canonical code reported while every light is off
pub const OFF_CODE: &str = "OFF";

static DEFAULT_CATALOG: Lazy<Vec<IndicatorGroup>> = Lazy::new(|| {
    vec![
        IndicatorGroup {
            title: "Hazard".to_string(),
            proper_name: "Hazard".to_string(),
            short_name: "HZ".to_string(),
            active_variant: "warning".to_string(),
            states: vec![
                StateOption::new("Off", "OFF", "0", OFF_CODE),
                StateOption::new("Hazard", "HZ", "H", "HAZARD"),
            ],
        },
        IndicatorGroup {
            title: "Lightbar".to_string(),
            proper_name: "Lightbar".to_string(),
            short_name: "LB".to_string(),
            active_variant: "danger".to_string(),
            states: vec![
                StateOption::new("Off", "OFF", "0", OFF_CODE),
                StateOption::new("Red", "RED", "R", "RED"),
                StateOption::new("Blue", "BLU", "B", "BLUE"),
                StateOption::new("Red/Blue", "RB", "A", "REDBLUE"),
            ],
        },
        IndicatorGroup {
            title: "Takedown".to_string(),
            proper_name: "Takedown".to_string(),
            short_name: "TD".to_string(),
            active_variant: "light".to_string(),
            states: vec![
                StateOption::new("Off", "OFF", "0", OFF_CODE),
                StateOption::new("Takedown", "TD", "T", "TAKEDOWN"),
                StateOption::new("Alley Left", "AL", "L", "ALLEYL"),
                StateOption::new("Alley Right", "AR", "G", "ALLEYR"),
            ],
        },
    ]
});

pub fn default_catalog() -> Vec<IndicatorGroup> {
    DEFAULT_CATALOG.clone()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Indicator group '{0}' has no states")]
    EmptyGroup(String),

    #[error("Serial command '{command}' maps to both {first} and {second}")]
    ConflictingCommand {
        command: String,
        first: String,
        second: String,
    },

    #[error("Code {code:?} of '{option}' cannot be carried by a device report")]
    UnreportableCode { option: String, code: String },
}

/// Every group needs a default state, and a serial command must always
/// resolve to the same canonical code wherever it appears. Codes must read
/// back unchanged from a report line.
pub fn validate_catalog(groups: &[IndicatorGroup]) -> Result<(), CatalogError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for group in groups {
        if group.states.is_empty() {
            return Err(CatalogError::EmptyGroup(group.title.clone()));
        }
        for option in &group.states {
            if report_code(&option.c_command).ok() != Some(option.c_command.as_str()) {
                return Err(CatalogError::UnreportableCode {
                    option: format!("{}/{}", group.title, option.proper_name),
                    code: option.c_command.clone(),
                });
            }
            match seen.get(option.serial_command.as_str()) {
                Some(code) if *code != option.c_command => {
                    return Err(CatalogError::ConflictingCommand {
                        command: option.serial_command.clone(),
                        first: code.to_string(),
                        second: option.c_command.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(&option.serial_command, &option.c_command);
                }
            }
        }
    }

    Ok(())
}
