//! FiberHome AN6000-17 platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! Login:                    # username
//! Password:                 # password, also asked by enable
//! User>                     # after login
//! Admin#                    # after enable
//! Admin(config)#            # after config
//! Admin(config-pon-1/4/8)#  # inside a PON interface
//! ```
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐   enable    ┌───────┐
//! │ user ├─────────────► admin │
//! │  >   │  password   │   #   │
//! └──────┘             └───────┘
//! ```
//!
//! Configuration modes all end in `#`, so they share the admin level.

use std::sync::Arc;

use crate::channel::strip_ansi;
use crate::platform::{PlatformDefinition, PrivilegeLevel, VendorBehavior};

/// Model name used in device inventories.
pub const MODEL: &str = "AN6000-17";

/// Paging, cursor and screen-clear noise, removed in this order before
/// escape sequences are stripped.
const NOISE: [&str; 6] = [
    "--Press any key to continue Ctrl+c to stop--",
    "\x08",
    "                                                ",
    "\x1b[19;05H                       ",
    "\r\n   \x1b[2J",
    "\x1b[2J",
];

/// Create the AN6000-17 platform definition.
pub fn platform() -> PlatformDefinition {
    let user = PrivilegeLevel::new("user", r"User>\s*$").expect("valid user prompt regex");

    let admin = PrivilegeLevel::new("admin", r"#\s*$")
        .expect("valid admin prompt regex")
        .with_parent("user")
        .with_escalate("enable")
        .with_auth(r"Password:\s*$")
        .expect("valid enable prompt regex");

    PlatformDefinition::new(MODEL)
        .with_privilege(user)
        .with_privilege(admin)
        .with_default_privilege("admin")
        .with_prompt_signature("Login: ")
        .with_prompt_signature("Password: ")
        .with_prompt_signature("User> ")
        .with_prompt_signature("# ")
        .with_failure_pattern("Command executes failed.")
        .with_failure_pattern("% Unknown command.")
        .with_on_open_command("terminal length 0")
        .with_behavior(Arc::new(FiberhomeBehavior))
}

/// Output cleanup for the AN6000 CLI.
pub struct FiberhomeBehavior;

impl VendorBehavior for FiberhomeBehavior {
    fn normalize_output(&self, raw: &str, _command: &str) -> String {
        let mut output = raw.to_string();
        for noise in NOISE {
            output = output.replace(noise, "");
        }
        let output = strip_ansi(&output);

        // First line is the echo, last line the prompt.
        let lines: Vec<&str> = output.split("\r\n").collect();
        if lines.len() <= 2 {
            return String::new();
        }
        lines[1..lines.len() - 1].join("\r\n")
    }
}
