//! ANSI escape removal built on the `vte` state machine.

use vte::{Parser, Perform};

/// Keeps printable characters plus CR, LF and TAB.
struct Printable {
    out: String,
}

impl Perform for Printable {
    fn print(&mut self, c: char) {
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\r' | b'\n' | b'\t') {
            self.out.push(byte as char);
        }
    }
}

/// Strip escape sequences and C0 controls other than CR, LF and TAB.
pub fn strip_ansi(text: &str) -> String {
    let mut parser = Parser::new();
    let mut performer = Printable {
        out: String::with_capacity(text.len()),
    };
    parser.advance(&mut performer, text.as_bytes());
    performer.out
}
