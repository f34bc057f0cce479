//! Styled-line vocabulary
//!
//! A rendered receipt is a plain `Vec<PrintOp>`: content lines interleaved
//! with style directives. It carries no device bytes, so two renders of the
//! same order can be compared with `==`.

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// One styling or content call against a printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOp {
    /// Set alignment for the following lines
    Align(Alignment),
    /// Bold on/off
    Bold(bool),
    /// Double-height on/off
    DoubleHeight(bool),
    /// One line of text (newline implied)
    Line(String),
    /// Full-width horizontal rule
    Rule,
    /// Feed n blank lines
    Feed(u8),
    /// Cut the paper
    Cut,
}

impl PrintOp {
    /// Text carried by a `Line`, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            PrintOp::Line(s) => Some(s),
            _ => None,
        }
    }
}
