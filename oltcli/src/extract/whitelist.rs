//! `show whitelist` in its six printed variants.
//!
//! The device prints a different table depending on the whitelist kind and
//! on whether the command ran at `config` or inside a PON interface. The
//! first title line recognized selects the row layout for the whole output.

use once_cell::sync::Lazy;
use regex::Regex;

use super::layout::{ColumnClass, RowLayout, Table};
use super::record::Record;

use ColumnClass::{Dashed, Digits, Word};

fn table(title: &str, columns: &[(ColumnClass, usize)]) -> Table {
    let layout = columns
        .iter()
        .fold(RowLayout::new(), |layout, (class, width)| layout.column(*class, *width));
    Table::new(Regex::new(title).expect("valid whitelist title"), layout)
}

static VARIANTS: Lazy<Vec<Table>> = Lazy::new(|| {
    vec![
        // Physical Address Whitelist, config view
        table(
            r"^(Slot)\s+(Pon)\s+(Onu)\s+(Onu-Type)\s+(Phy-ID)\s+(Phy-Pwd)\s+(Used)",
            &[(Digits, 5), (Digits, 5), (Digits, 5), (Dashed, 14), (Word, 12), (Word, 10), (Word, 4)],
        ),
        // Physical SN Whitelist, PON view
        table(
            r"^(PHYID)\s+(PHYPWD)\s+(SLOT)\s+(PON)\s+(ONU)\s+(TYPE)\s+(EN)\s+(USED)",
            &[(Word, 12), (Word, 10), (Digits, 5), (Digits, 5), (Digits, 5), (Dashed, 14), (Word, 3), (Word, 4)],
        ),
        // Logic SN Whitelist, config view
        table(
            r"^(Slot)\s+(Pon)\s+(Onu)\s+(Onu-Type)\s+(Logic-Id)\s+(Logic-Pwd)\s+(En)\s+(Used)",
            &[(Digits, 5), (Digits, 5), (Digits, 5), (Dashed, 14), (Word, 24), (Word, 12), (Word, 2), (Word, 4)],
        ),
        // Logical SN Whitelist, PON view
        table(
            r"^(LOGICId)\s+(LOGICPWD)\s+(SLOT)\s+(PON)\s+(ONU)\s+(TYPE)\s+(EN)\s+(USED)",
            &[(Word, 24), (Word, 12), (Digits, 5), (Digits, 5), (Digits, 5), (Dashed, 14), (Word, 3), (Word, 4)],
        ),
        // Physical Password Whitelist, config view
        table(
            r"^(Slot)\s+(Pon)\s+(Onu)\s+(Onu-Type)\s+(Phy-Pwd)\s+(En)\s+(Used)",
            &[(Digits, 5), (Digits, 5), (Digits, 5), (Dashed, 14), (Word, 10), (Word, 2), (Word, 4)],
        ),
        // Physical Password Whitelist, PON view
        table(
            r"^(PHYPWD)\s+(SLOT)\s+(PON)\s+(ONU)\s+(TYPE)\s+(EN)\s+(USED)",
            &[(Word, 10), (Digits, 5), (Digits, 5), (Digits, 5), (Dashed, 14), (Word, 3), (Word, 4)],
        ),
    ]
});

/// Parse any whitelist table. Unrecognized output yields no records.
pub fn whitelist(text: &str) -> Vec<Record> {
    let selected = text
        .lines()
        .find_map(|line| VARIANTS.iter().find(|t| t.titles(line).is_some()));
    match selected {
        Some(table) => table.parse(text),
        None => Vec::new(),
    }
}
