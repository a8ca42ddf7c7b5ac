//! Prompt pattern helpers.

use regex::bytes::Regex;

/// Compile a prompt pattern string into a regex anchored to the end of
/// the buffer.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };
    Regex::new(&pattern)
}

/// Build one tail-anchored regex that matches any of the literal prompt
/// signatures.
pub fn signature_pattern<S: AsRef<str>>(signatures: &[S]) -> Result<Regex, regex::Error> {
    let alternatives: Vec<String> = signatures
        .iter()
        .map(|s| regex::escape(s.as_ref()))
        .collect();
    compile_prompt_pattern(&format!("(?:{})", alternatives.join("|")))
}
