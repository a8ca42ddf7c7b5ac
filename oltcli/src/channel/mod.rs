//! Channel layer for prompt detection and reply framing.
//!
//! This module turns the raw telnet byte stream into command replies:
//! it accumulates output in a [`PatternBuffer`], recognizes prompts at the
//! buffer tail, and strips terminal escape sequences.

mod ansi;
mod buffer;
mod patterns;
mod terminal;

pub use ansi::strip_ansi;
pub use buffer::PatternBuffer;
pub use patterns::{compile_prompt_pattern, signature_pattern};
pub use terminal::{ChannelConfig, TerminalChannel};
