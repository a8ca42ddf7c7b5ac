//! Platform definitions for OLT models.
//!
//! This module defines per-model configuration: prompt signatures,
//! the login and privilege graph, failure markers and output cleanup.

mod definition;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use privilege_level::PrivilegeLevel;
pub use registry::PlatformRegistry;

/// Trait for model-specific output handling.
pub trait VendorBehavior: Send + Sync {
    /// Normalize command output (strip command echo, trailing prompt).
    fn normalize_output(&self, raw: &str, command: &str) -> String;

    /// Detect command failure from normalized output.
    ///
    /// Checked before the platform's `failed_when_contains` markers.
    fn detect_failure(&self, _output: &str) -> Option<String> {
        None
    }
}

/// Default behavior: drop the echoed command and the trailing prompt line.
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {
    fn normalize_output(&self, raw: &str, command: &str) -> String {
        let output = raw
            .strip_prefix(command)
            .unwrap_or(raw)
            .trim_start_matches(['\r', '\n']);

        if let Some(pos) = output.rfind('\n') {
            output[..pos].trim_end_matches('\r').to_string()
        } else {
            String::new()
        }
    }
}
