//! Fixed-width table parsing.
//!
//! Most AN6000 `show` tables print one row per line with columns padded to
//! a fixed width and separated by a single space. A [`RowLayout`] describes
//! those columns and the characters each may contain; a [`Table`] pairs a
//! layout with the title line that names its fields.

use regex::Regex;

use super::record::Record;
use crate::value::coerce;

/// Characters allowed in a column (blank padding is always allowed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    /// ASCII digits.
    Digits,
    /// Letters, digits and underscores.
    Word,
    /// Like [`ColumnClass::Word`], plus `-`.
    Dashed,
    /// Anything printable.
    Any,
}

impl ColumnClass {
    fn accepts(&self, c: char) -> bool {
        if c.is_whitespace() {
            return true;
        }
        match self {
            ColumnClass::Digits => c.is_ascii_digit(),
            ColumnClass::Word => c.is_alphanumeric() || c == '_',
            ColumnClass::Dashed => c.is_alphanumeric() || c == '_' || c == '-',
            ColumnClass::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Column {
    width: usize,
    class: ColumnClass,
}

/// Column layout of one table row.
#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    columns: Vec<Column>,
}

impl RowLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column of the given width.
    pub fn column(mut self, class: ColumnClass, width: usize) -> Self {
        self.columns.push(Column { width, class });
        self
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Total width of a row, separators included.
    pub fn width(&self) -> usize {
        let widths: usize = self.columns.iter().map(|c| c.width).sum();
        widths + self.columns.len().saturating_sub(1)
    }

    /// Slice a line into trimmed column values.
    ///
    /// Short lines are padded with blanks, so trailing columns the device
    /// left empty come back as empty strings. Returns `None` if any slice
    /// holds characters outside its class, a separator is not blank, or the
    /// first column is blank.
    pub fn split(&self, line: &str) -> Option<Vec<String>> {
        let chars: Vec<char> = line.trim_end_matches(['\r', '\n']).chars().collect();
        let mut values = Vec::with_capacity(self.columns.len());
        let mut pos = 0;

        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                if chars.get(pos).is_some_and(|c| !c.is_whitespace()) {
                    return None;
                }
                pos += 1;
            }
            let end = pos + column.width;
            let cell: String = (pos..end)
                .map(|at| chars.get(at).copied().unwrap_or(' '))
                .collect();
            if !cell.chars().all(|c| column.class.accepts(c)) {
                return None;
            }
            values.push(cell.trim().to_string());
            pos = end;
        }

        match values.first() {
            Some(first) if !first.is_empty() => Some(values),
            _ => None,
        }
    }
}

/// A titled fixed-width table.
#[derive(Debug, Clone)]
pub struct Table {
    title: Regex,
    layout: RowLayout,
    null_sentinel: Option<i64>,
}

impl Table {
    /// Create a table whose field names are the capture groups of `title`.
    pub fn new(title: Regex, layout: RowLayout) -> Self {
        Self {
            title,
            layout,
            null_sentinel: None,
        }
    }

    /// Treat integers equal to `sentinel` as null.
    pub fn with_null_sentinel(mut self, sentinel: i64) -> Self {
        self.null_sentinel = Some(sentinel);
        self
    }

    /// Field names if `line` is this table's title line.
    pub fn titles(&self, line: &str) -> Option<Vec<String>> {
        self.title.captures(line).map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .collect()
        })
    }

    /// Build a record from a row line using previously seen titles.
    pub fn row(&self, titles: &[String], line: &str) -> Option<Record> {
        let values = self.layout.split(line)?;
        Some(
            titles
                .iter()
                .zip(values.iter())
                .map(|(title, value)| (title.clone(), coerce(value, self.null_sentinel)))
                .collect(),
        )
    }

    /// Parse every row of every block in `text`.
    ///
    /// A title line (re)sets the field names; rows before the first title
    /// are ignored.
    pub fn parse(&self, text: &str) -> Vec<Record> {
        let mut records = Vec::new();
        let mut titles: Option<Vec<String>> = None;
        for line in text.lines() {
            if let Some(t) = self.titles(line) {
                titles = Some(t);
                continue;
            }
            if let Some(titles) = titles.as_deref() {
                if let Some(record) = self.row(titles, line) {
                    records.push(record);
                }
            }
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn layout() -> RowLayout {
        RowLayout::new()
            .column(ColumnClass::Digits, 3)
            .column(ColumnClass::Dashed, 6)
            .column(ColumnClass::Any, 5)
    }

    #[test]
    fn test_split_pads_short_lines() {
        let values = layout().split("12  ab-c").unwrap();
        assert_eq!(values, vec!["12", "ab-c", ""]);
    }

    #[test]
    fn test_split_rejects_wrong_class() {
        assert!(layout().split("ab  abcdef 12345").is_none());
        assert!(layout().split("1   ab.def 12345").is_none());
    }

    #[test]
    fn test_split_rejects_blank_first_column() {
        assert!(layout().split("").is_none());
        assert!(layout().split("    abc").is_none());
    }

    #[test]
    fn test_split_rejects_missing_separator() {
        assert!(layout().split("123xabcdef").is_none());
    }

    #[test]
    fn test_width() {
        assert_eq!(layout().width(), 16);
    }

    #[test]
    fn test_table_requires_title() {
        let table = Table::new(Regex::new(r"^(No)\s+(Name)\s+(Val)").unwrap(), layout());
        assert!(table.parse("1   abc    x").is_empty());

        let records = table.parse("No  Name   Val\n--- ------ ----\n1   abc    x\n2   de     65535");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].int("No"), Some(1));
        assert_eq!(records[1].get("Val"), Some(&Value::Int(65535)));
    }

    #[test]
    fn test_table_sentinel() {
        let table = Table::new(Regex::new(r"^(No)\s+(Name)\s+(Val)").unwrap(), layout())
            .with_null_sentinel(65535);
        let records = table.parse("No Name Val\n2   de     65535");
        assert!(records[0].is_null("Val"));
    }
}
