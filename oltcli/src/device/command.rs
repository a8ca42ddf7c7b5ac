//! Structured command text.

use std::fmt;

/// One CLI command line built from typed parts.
///
/// Keywords go in verbatim. Arguments containing whitespace are
/// double-quoted so the device reads them as one token. Optional
/// keyword/value pairs are emitted only when a value is supplied.
///
/// ```
/// use oltcli::device::CommandLine;
///
/// let cmd = CommandLine::new("manage-vlan")
///     .arg("office lan")
///     .kv("svlan", 100)
///     .opt("cvlan", None::<u16>);
/// assert_eq!(cmd.to_string(), r#"manage-vlan "office lan" svlan 100"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    /// Start a command with the given keywords.
    pub fn new(keywords: &str) -> Self {
        Self {
            tokens: vec![keywords.trim().to_string()],
        }
    }

    /// Append keywords verbatim.
    pub fn kw(mut self, keywords: &str) -> Self {
        self.tokens.push(keywords.trim().to_string());
        self
    }

    /// Append one argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.tokens.push(quote(&value.to_string()));
        self
    }

    /// Append every item of `values` as a separate argument.
    pub fn args<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        for value in values {
            self = self.arg(value);
        }
        self
    }

    /// Append `key value`.
    pub fn kv(self, key: &str, value: impl fmt::Display) -> Self {
        self.kw(key).arg(value)
    }

    /// Append `key value` only if `value` is present.
    pub fn opt<V: fmt::Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.kv(key, value),
            None => self,
        }
    }

    /// Append an argument only if it is present.
    pub fn opt_arg<V: fmt::Display>(self, value: Option<V>) -> Self {
        match value {
            Some(value) => self.arg(value),
            None => self,
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for token in self.tokens.iter().filter(|t| !t.is_empty()) {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(token)?;
            first = false;
        }
        Ok(())
    }
}

impl From<CommandLine> for String {
    fn from(cmd: CommandLine) -> String {
        cmd.to_string()
    }
}

fn quote(token: &str) -> String {
    if token.is_empty() {
        "\"\"".to_string()
    } else if token.chars().any(char::is_whitespace) {
        format!("\"{}\"", token.replace('"', "\\\""))
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_in_order() {
        let cmd = CommandLine::new("onu port vlan")
            .arg(1)
            .kv("eth", 2)
            .kv("service", 3)
            .kw("tls")
            .arg("enable");
        assert_eq!(cmd.to_string(), "onu port vlan 1 eth 2 service 3 tls enable");
    }

    #[test]
    fn test_optional_pairs() {
        let cmd = CommandLine::new("whitelist add phy-id")
            .arg("FHTT000aae64")
            .opt("checkcode", Some("fiberhome"))
            .opt("onuid", None::<u32>);
        assert_eq!(cmd.to_string(), "whitelist add phy-id FHTT000aae64 checkcode fiberhome");
        assert_eq!(
            CommandLine::new("show acl").opt_arg(Some(3)).to_string(),
            "show acl 3"
        );
    }

    #[test]
    fn test_quoting() {
        let cmd = CommandLine::new("onu wan-cfg").kv("username", "a b").arg("");
        assert_eq!(cmd.to_string(), r#"onu wan-cfg username "a b" """#);
        assert_eq!(quote(r#"say "hi" now"#), r#""say \"hi\" now""#);
    }

    #[test]
    fn test_args() {
        let cmd = CommandLine::new("entries").arg(2).args(["fe1", "ssid1"]);
        assert_eq!(String::from(cmd), "entries 2 fe1 ssid1");
    }
}
