//! Privilege level definition.

use regex::bytes::Regex;

/// A privilege level of the device CLI.
///
/// Levels form a chain: each one names its parent and the command that
/// escalates into it from there.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this privilege level (e.g., "user", "admin").
    pub name: String,

    /// Regex matching the prompt of this level at the buffer tail.
    pub pattern: Regex,

    /// Name of the parent privilege level (None for the login level).
    pub previous_priv: Option<String>,

    /// Command to escalate TO this level from the parent.
    pub escalate_command: Option<String>,

    /// Whether escalation asks for the password again.
    pub escalate_auth: bool,

    /// Pattern matching the password prompt during escalation.
    pub escalate_prompt: Option<Regex>,
}

impl PrivilegeLevel {
    /// Create a new privilege level with minimal required fields.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            previous_priv: None,
            escalate_command: None,
            escalate_auth: false,
            escalate_prompt: None,
        })
    }

    /// Set the parent privilege level.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.previous_priv = Some(parent.into());
        self
    }

    /// Set the escalation command.
    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    /// Set that escalation requires the password.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.escalate_auth = true;
        self.escalate_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_chain() {
        let admin = PrivilegeLevel::new("admin", r"#\s*$")
            .unwrap()
            .with_parent("user")
            .with_escalate("enable")
            .with_auth(r"Password:\s*$")
            .unwrap();
        assert_eq!(admin.previous_priv.as_deref(), Some("user"));
        assert!(admin.escalate_auth);
        assert!(admin.pattern.is_match(b"\r\nAdmin# "));
        assert!(!admin.pattern.is_match(b"\r\nUser> "));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(PrivilegeLevel::new("bad", "(").is_err());
    }
}
