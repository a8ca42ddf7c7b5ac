//! Platform definition for model-specific configuration.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::VendorBehavior;
use super::privilege_level::PrivilegeLevel;

static LOGIN_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Login:\s*$").expect("valid login prompt regex"));
static PASSWORD_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Password:\s*$").expect("valid password prompt regex"));

/// Platform definition containing all model-specific configuration.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Model name (e.g., "AN6000-17").
    pub name: String,

    /// Privilege levels, in escalation order. The first one is where a
    /// successful login lands.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Privilege level a session must reach before running commands.
    pub default_privilege: String,

    /// Literal strings that end any command reply.
    pub prompt_signatures: Vec<String>,

    /// Username prompt.
    pub login_prompt: Regex,

    /// Password prompt.
    pub password_prompt: Regex,

    /// Line ending appended to commands.
    pub line_ending: String,

    /// Line ending used while logging in and escalating.
    pub login_line_ending: String,

    /// Strings in normalized output that mark a failed command.
    pub failed_when_contains: Vec<String>,

    /// Commands to run once the session reaches its default privilege.
    pub on_open_commands: Vec<String>,

    /// Optional model-specific behavior.
    pub behavior: Option<Arc<dyn VendorBehavior>>,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            prompt_signatures: vec![],
            login_prompt: LOGIN_PROMPT.clone(),
            password_prompt: PASSWORD_PROMPT.clone(),
            line_ending: "\r\n".to_string(),
            login_line_ending: "\n".to_string(),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            behavior: None,
        }
    }

    /// Add a privilege level.
    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    /// Set the default privilege level.
    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    /// Add a prompt signature.
    pub fn with_prompt_signature(mut self, signature: impl Into<String>) -> Self {
        self.prompt_signatures.push(signature.into());
        self
    }

    /// Add a failure marker.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set model behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// The level a successful login lands on.
    pub fn login_privilege(&self) -> Option<&PrivilegeLevel> {
        self.privilege_levels.values().next()
    }

    /// Levels to walk after login to reach the default privilege, in order.
    ///
    /// Empty when the default is the login level or is unknown.
    pub fn escalation_path(&self) -> Vec<&PrivilegeLevel> {
        let Some(target) = self.privilege_levels.get_index_of(&self.default_privilege) else {
            return vec![];
        };
        self.privilege_levels
            .values()
            .take(target + 1)
            .skip(1)
            .collect()
    }

    /// Return the first failure marker contained in `output`.
    pub fn failure_in(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|marker| output.contains(marker.as_str()))
            .map(String::as_str)
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("privilege_levels", &self.privilege_levels)
            .field("default_privilege", &self.default_privilege)
            .field("prompt_signatures", &self.prompt_signatures)
            .field("line_ending", &self.line_ending)
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open_commands", &self.on_open_commands)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|_| "<VendorBehavior>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_levels() -> PlatformDefinition {
        PlatformDefinition::new("test")
            .with_privilege(PrivilegeLevel::new("user", r">\s*$").unwrap())
            .with_privilege(
                PrivilegeLevel::new("admin", r"#\s*$")
                    .unwrap()
                    .with_parent("user")
                    .with_escalate("enable"),
            )
    }

    #[test]
    fn test_escalation_path() {
        let platform = two_levels().with_default_privilege("admin");
        let path: Vec<_> = platform.escalation_path().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(path, vec!["admin"]);
        assert_eq!(platform.login_privilege().unwrap().name, "user");

        let platform = two_levels().with_default_privilege("user");
        assert!(platform.escalation_path().is_empty());
    }

    #[test]
    fn test_failure_in() {
        let platform = PlatformDefinition::new("test")
            .with_failure_pattern("Unknown command")
            .with_failure_pattern("failed");
        assert_eq!(platform.failure_in("% Unknown command."), Some("Unknown command"));
        assert_eq!(platform.failure_in("ok"), None);
    }

    #[test]
    fn test_debug_hides_behavior() {
        let platform = PlatformDefinition::new("test")
            .with_behavior(Arc::new(crate::platform::DefaultBehavior));
        let debug = format!("{:?}", platform);
        assert!(debug.contains("<VendorBehavior>"));
    }
}
