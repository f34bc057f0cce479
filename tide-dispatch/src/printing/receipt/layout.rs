//! Fixed-width layout primitives
//!
//! All widths are character cells, matching how the printer crate pads and
//! truncates.

use rust_decimal::{Decimal, RoundingStrategy};
use tide_printer::{pad_width, text_width, truncate_width};

/// Narrowest paper the formatter will lay out
pub const MIN_WIDTH: usize = 24;

/// Item table column widths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub name: usize,
    pub sku: usize,
    pub qty: usize,
    pub amount: usize,
}

impl Columns {
    /// Table for a paper width
    ///
    /// 58mm (32) → 14/6/4/8, 76mm (42) → 20/8/4/10, 80mm (48) → 24/8/5/11.
    /// Other widths keep the nearest fixed columns and give the rest to
    /// the name.
    pub fn for_width(width: usize) -> Self {
        let sku = if width < 42 { 6 } else { 8 };
        let qty = if width < 48 { 4 } else { 5 };
        let amount = match width {
            w if w < 42 => 8,
            w if w < 48 => 10,
            _ => 11,
        };
        Self {
            name: width.saturating_sub(sku + qty + amount),
            sku,
            qty,
            amount,
        }
    }

    pub fn total(&self) -> usize {
        self.name + self.sku + self.qty + self.amount
    }

    /// One table row; text cells keep a one-space gap, numbers are
    /// right-justified
    ///
    /// If the numeric cells outgrow their columns the text cells give way,
    /// so the row is always exactly `total()` wide.
    pub fn row(&self, name: &str, sku: &str, qty: &str, amount: &str) -> String {
        let name = pad_width(&truncate_width(name, self.name.saturating_sub(1)), self.name, false);
        let sku = pad_width(&truncate_width(sku, self.sku.saturating_sub(1)), self.sku, false);
        let left = format!("{}{}", name, sku);

        let right = format!("{}{}", right_cell(qty, self.qty), right_cell(amount, self.amount));

        let room = self.total().saturating_sub(text_width(&right));
        format!("{}{}", truncate_width(&left, room), right)
            .chars()
            .take(self.total())
            .collect()
    }
}

/// Right-justified cell that keeps oversized text whole behind one space
fn right_cell(text: &str, width: usize) -> String {
    if text_width(text) < width {
        pad_width(text, width, true)
    } else {
        format!(" {}", text)
    }
}

/// Left and right text on one line, padded to `width`
///
/// When both do not fit, the right side is capped at half the line and the
/// left side is truncated.
pub fn justify(left: &str, right: &str, width: usize) -> String {
    let mut right = right.to_string();
    if text_width(left) + text_width(&right) + 1 > width && text_width(&right) > width / 2 {
        right = truncate_width(&right, width / 2);
    }
    let right_w = text_width(&right);
    let left = truncate_width(left, width.saturating_sub(right_w + 1));
    let gap = width.saturating_sub(text_width(&left) + right_w);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

/// Left text in a fixed slot, right text starting at column `right_column`
///
/// Falls back to [`justify`] when the offset leaves no room.
pub fn fixed_column(left: &str, right: &str, right_column: usize, width: usize) -> String {
    if right_column == 0 || right_column >= width {
        return justify(left, right, width);
    }
    let left = pad_width(
        &truncate_width(left, right_column.saturating_sub(1)),
        right_column,
        false,
    );
    let right = truncate_width(right, width - right_column);
    format!("{}{}", left, right).trim_end().to_string()
}

/// Greedy word wrap
///
/// Words are packed until the next would overflow `width`. A word longer
/// than `width` is hard-split into `ceil(len / width)` chunks.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_w = text_width(word);

        if word_w > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            lines.extend(chars.chunks(width).map(|c| c.iter().collect::<String>()));
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if text_width(&current) + 1 + word_w <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Capitalize each word, lowercase the rest
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove a trailing `" - <variant>"` (ASCII case-insensitive)
pub fn strip_variant_suffix<'a>(name: &'a str, variant: &str) -> &'a str {
    let variant = variant.trim();
    if variant.is_empty() {
        return name;
    }
    let suffix = format!(" - {}", variant);
    let trimmed = name.trim_end();
    let Some(cut) = trimmed.len().checked_sub(suffix.len()) else {
        return name;
    };
    match trimmed.get(cut..) {
        Some(tail) if tail.eq_ignore_ascii_case(&suffix) => trimmed[..cut].trim_end(),
        _ => name,
    }
}

/// `$X.XX`, negative as `-$X.XX`
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}${:.2}", sign, rounded.abs())
}

/// Quantity without trailing zeros
pub fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}
