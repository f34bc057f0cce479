//! Order receipt formatter
//!
//! Lays an order out as a sequence of styled fixed-width lines. Output is a
//! pure function of the order, the paper width and the formatter settings:
//! no clock, no I/O, no hash-ordered iteration.
//!
//! Section order: venue header, order-type banner, identifiers, location,
//! guest/staff, items, totals, payment, footer, feed and cut.

mod layout;

pub use layout::{
    Columns, MIN_WIDTH, fixed_column, format_money, format_quantity, justify, strip_variant_suffix,
    title_case, wrap_words,
};

use crate::models::{Order, OrderItem};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use thiserror::Error;
use tide_printer::{Alignment, PrintOp, text_width, truncate_width};

const INDENT: &str = "  ";
const PLACEHOLDER: &str = "N/A";
const THANK_YOU: &str = "Thank you for your visit!";
const FEED_BEFORE_CUT: u8 = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Paper width {width} is below the {min}-column minimum")]
    WidthTooNarrow { width: usize, min: usize },

    #[error("Amount does not fit the receipt: {0}")]
    AmountOverflow(String),
}

pub type FormatResult<T> = Result<T, FormatError>;

/// Venue header block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueInfo {
    pub name: String,
    pub address: Vec<String>,
    pub phones: Vec<String>,
}

/// How the identifier/timestamp rows place their right column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentifierLayout {
    /// Right text flush with the right margin
    #[default]
    Justified,
    /// Right text always starts at this character offset
    FixedColumn { right_column: usize },
}

#[derive(Debug, Clone)]
pub struct ReceiptFormatter {
    venue: VenueInfo,
    timezone: Tz,
    layout: IdentifierLayout,
}

impl ReceiptFormatter {
    pub fn new(venue: VenueInfo, timezone: Tz) -> Self {
        Self {
            venue,
            timezone,
            layout: IdentifierLayout::Justified,
        }
    }

    pub fn with_layout(mut self, layout: IdentifierLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn venue(&self) -> &VenueInfo {
        &self.venue
    }

    /// Render `order` for a printer `width` characters wide
    pub fn format(&self, order: &Order, width: usize) -> FormatResult<Vec<PrintOp>> {
        if width < MIN_WIDTH {
            return Err(FormatError::WidthTooNarrow {
                width,
                min: MIN_WIDTH,
            });
        }

        let mut r = Receipt::new(width);

        self.render_header(&mut r);
        self.render_banner(&mut r, order);
        self.render_identifiers(&mut r, order);
        self.render_location(&mut r, order);
        self.render_people(&mut r, order);
        self.render_items(&mut r, order)?;
        self.render_totals(&mut r, order)?;
        self.render_payment(&mut r, order)?;
        self.render_footer(&mut r, order);

        r.ops.push(PrintOp::Feed(FEED_BEFORE_CUT));
        r.ops.push(PrintOp::Cut);
        Ok(r.ops)
    }

    fn render_header(&self, r: &mut Receipt) {
        r.ops.push(PrintOp::Align(Alignment::Center));

        let name = self.venue.name.trim();
        if !name.is_empty() {
            r.ops.push(PrintOp::Bold(true));
            r.ops.push(PrintOp::DoubleHeight(true));
            r.wrapped(name, r.width);
            r.ops.push(PrintOp::DoubleHeight(false));
            r.ops.push(PrintOp::Bold(false));
        }

        for line in self.venue.address.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
            r.wrapped(line, r.width);
        }

        let phones: Vec<&str> = self
            .venue
            .phones
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if !phones.is_empty() {
            let joined = phones.join(" / ");
            if text_width(&joined) <= r.width {
                r.line(&joined);
            } else {
                for phone in phones {
                    r.wrapped(phone, r.width);
                }
            }
        }

        r.ops.push(PrintOp::Align(Alignment::Left));
        r.ops.push(PrintOp::Rule);
    }

    fn render_banner(&self, r: &mut Receipt, order: &Order) {
        r.ops.push(PrintOp::Align(Alignment::Center));
        r.ops.push(PrintOp::Bold(true));
        r.line(order.order_type().label());
        r.ops.push(PrintOp::Bold(false));
        r.ops.push(PrintOp::Align(Alignment::Left));
        r.ops.push(PrintOp::Rule);
    }

    fn render_identifiers(&self, r: &mut Receipt, order: &Order) {
        let receipt_no: String = order.id.trim().chars().take(6).collect::<String>().to_uppercase();
        let order_no = non_blank(order.order_number.as_deref()).unwrap_or("-");

        let (date, time) = match order.created_at {
            Some(at) => {
                let local = at.with_timezone(&self.timezone);
                (
                    local.format("%d/%m/%Y").to_string(),
                    local.format("%H:%M").to_string(),
                )
            }
            None => (String::new(), String::new()),
        };

        let rows = [
            (format!("Rcpt #{}", receipt_no), date),
            (format!("Order #{}", order_no), time),
        ];
        for (left, right) in rows {
            let line = match self.layout {
                IdentifierLayout::Justified => justify(&left, &right, r.width),
                IdentifierLayout::FixedColumn { right_column } => {
                    fixed_column(&left, &right, right_column, r.width)
                }
            };
            r.line(&line);
        }
    }

    fn render_location(&self, r: &mut Receipt, order: &Order) {
        let place = non_blank(order.room_or_table.as_deref()).unwrap_or(PLACEHOLDER);
        let label = if order.order_type().is_in_room() {
            "Room"
        } else {
            "Table"
        };
        r.line(&format!("{}: {}", label, place));
        r.ops.push(PrintOp::Rule);
    }

    fn render_people(&self, r: &mut Receipt, order: &Order) {
        let guest = non_blank(order.guest_name.as_deref()).unwrap_or(PLACEHOLDER);
        let server = non_blank(order.waiter_name.as_deref()).unwrap_or(PLACEHOLDER);
        let line = justify(
            &format!("Guest: {}", guest),
            &format!("Server: {}", server),
            r.width,
        );
        r.line(&line);
        r.ops.push(PrintOp::Rule);
    }

    fn render_items(&self, r: &mut Receipt, order: &Order) -> FormatResult<()> {
        let cols = Columns::for_width(r.width);

        r.ops.push(PrintOp::Bold(true));
        r.line(&cols.row("Item", "SKU", "Qty", "Amount"));
        r.ops.push(PrintOp::Bold(false));

        for item in &order.items {
            self.render_item(r, &cols, item)?;
        }

        r.ops.push(PrintOp::Rule);
        Ok(())
    }

    fn render_item(&self, r: &mut Receipt, cols: &Columns, item: &OrderItem) -> FormatResult<()> {
        let variant_name = item
            .variant
            .as_ref()
            .and_then(|v| non_blank(v.name.as_deref()));

        let raw_name = non_blank(item.name.as_deref()).unwrap_or("Item");
        let name = title_case(strip_variant_suffix(raw_name, variant_name.unwrap_or("")));

        let name_cell = cols.name.saturating_sub(1);
        let head = truncate_width(&name, name_cell);
        let rest: String = name.chars().skip(name_cell).collect();

        let sku = match non_blank(item.sku.as_deref()) {
            Some(s) if !s.eq_ignore_ascii_case(PLACEHOLDER) => s,
            _ => "",
        };

        let quantity = item.effective_quantity();
        let amount = item
            .price
            .checked_mul(quantity)
            .ok_or_else(|| FormatError::AmountOverflow(format!("{} x {}", item.price, quantity)))?;
        let amount_text = format_money(amount);
        if text_width(&amount_text) > cols.sku + cols.amount {
            return Err(FormatError::AmountOverflow(amount_text));
        }

        r.line(&cols.row(&head, sku, &format_quantity(quantity), &amount_text));

        let name_wrap = cols.name.saturating_sub(INDENT.len());
        for chunk in wrap_words(&rest, name_wrap) {
            r.line(&format!("{}{}", INDENT, chunk));
        }

        if let (Some(variant), Some(vname)) = (&item.variant, variant_name) {
            let text = format!("( {} ){}", vname, price_suffix(variant.price));
            r.indented(&text);
        }

        for add_on in &item.add_ons {
            if let Some(aname) = non_blank(add_on.name.as_deref()) {
                let text = format!("+ {}{}", aname, price_suffix(add_on.price));
                r.indented(&text);
            }
        }

        if let Some(notes) = non_blank(item.notes.as_deref()) {
            r.indented(&format!("[{}]", notes));
        }

        Ok(())
    }

    fn render_totals(&self, r: &mut Receipt, order: &Order) -> FormatResult<()> {
        r.pair("Subtotal", order.subtotal)?;
        r.pair("Tax", order.tax)?;
        if order.discount > Decimal::ZERO {
            r.pair("Discount", -order.discount)?;
        }
        r.ops.push(PrintOp::Rule);

        r.ops.push(PrintOp::Bold(true));
        r.ops.push(PrintOp::DoubleHeight(true));
        r.pair("TOTAL", order.total_amount)?;
        r.ops.push(PrintOp::DoubleHeight(false));
        r.ops.push(PrintOp::Bold(false));
        r.ops.push(PrintOp::Rule);
        Ok(())
    }

    fn render_payment(&self, r: &mut Receipt, order: &Order) -> FormatResult<()> {
        let method = non_blank(order.payment_method.as_deref()).unwrap_or(PLACEHOLDER);
        r.line(&format!("Payment: {}", method));
        r.pair("Paid", order.paid_amount)?;
        r.pair("Due", order.due_amount)?;
        r.ops.push(PrintOp::Rule);
        Ok(())
    }

    fn render_footer(&self, r: &mut Receipt, order: &Order) {
        r.ops.push(PrintOp::Align(Alignment::Center));
        r.line(THANK_YOU);
        r.ops.push(PrintOp::Align(Alignment::Left));

        let prepared = non_blank(order.prepared_by.as_deref()).unwrap_or(PLACEHOLDER);
        let printed = non_blank(order.printed_by.as_deref()).unwrap_or(PLACEHOLDER);
        r.line(&format!("Prepared by: {}", prepared));
        r.line(&format!("Printed by: {}", printed));
    }
}

/// Ops under construction for one paper width
struct Receipt {
    width: usize,
    ops: Vec<PrintOp>,
}

impl Receipt {
    fn new(width: usize) -> Self {
        Self {
            width,
            ops: Vec::new(),
        }
    }

    /// One line, cut at the paper edge
    fn line(&mut self, text: &str) {
        self.ops.push(PrintOp::Line(truncate_width(text, self.width)));
    }

    fn wrapped(&mut self, text: &str, width: usize) {
        for chunk in wrap_words(text, width) {
            self.line(&chunk);
        }
    }

    /// Indented detail line(s) under an item
    fn indented(&mut self, text: &str) {
        for chunk in wrap_words(text, self.width - INDENT.len()) {
            self.line(&format!("{}{}", INDENT, chunk));
        }
    }

    /// Label with a right-justified amount
    fn pair(&mut self, label: &str, amount: Decimal) -> FormatResult<()> {
        let text = format_money(amount);
        if text_width(&text) + 1 > self.width {
            return Err(FormatError::AmountOverflow(text));
        }
        let line = justify(label, &text, self.width);
        self.line(&line);
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// ` +$X.XX` for positive prices only
fn price_suffix(price: Decimal) -> String {
    if price > Decimal::ZERO {
        format!(" +{}", format_money(price))
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddOn, ItemVariant};
    use chrono::{TimeZone, Utc};

    fn formatter() -> ReceiptFormatter {
        ReceiptFormatter::new(
            VenueInfo {
                name: "Tide Beach Club".to_string(),
                address: vec!["1 Shore Road".to_string()],
                phones: vec!["+30 210 000 0000".to_string(), "+30 690 000 0000".to_string()],
            },
            chrono_tz::Europe::Athens,
        )
    }

    fn lines(ops: &[PrintOp]) -> Vec<&str> {
        ops.iter().filter_map(PrintOp::text).collect()
    }

    fn scenario_order() -> Order {
        Order {
            id: "abc123xyz".to_string(),
            order_number: Some("A1".to_string()),
            items: vec![OrderItem {
                name: Some("Cola - Large".to_string()),
                variant: Some(ItemVariant {
                    name: Some("Large".to_string()),
                    price: Decimal::ONE,
                }),
                quantity: Decimal::from(2),
                price: Decimal::from(3),
                ..Default::default()
            }],
            subtotal: Decimal::from(6),
            total_amount: Decimal::from(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_narrow_paper() {
        assert_eq!(
            formatter().format(&scenario_order(), 20),
            Err(FormatError::WidthTooNarrow { width: 20, min: 24 })
        );
    }

    #[test]
    fn test_no_line_exceeds_width() {
        let mut order = scenario_order();
        order.guest_name = Some("Anastasia Papadopoulou-Konstantinidou".to_string());
        order.waiter_name = Some("Georgios".to_string());
        order.items[0].notes = Some("no ice please and a slice of lemon on the side".to_string());
        order.items[0].add_ons = vec![AddOn {
            name: Some("extra syrup with a very long add-on description".to_string()),
            price: Decimal::new(50, 2),
        }];

        for width in [24, 32, 42, 48] {
            let ops = formatter().format(&order, width).unwrap();
            for line in lines(&ops) {
                assert!(text_width(line) <= width, "{:?} exceeds {}", line, width);
            }
        }
    }

    #[test]
    fn test_long_phone_wraps_instead_of_truncating() {
        let phone = "+30 210 000 0000 ext. 4455 (front desk)";
        let f = ReceiptFormatter::new(
            VenueInfo {
                name: "Tide".to_string(),
                address: Vec::new(),
                phones: vec![phone.to_string(), "+30 690 000 0000".to_string()],
            },
            chrono_tz::UTC,
        );

        let ops = f.format(&scenario_order(), 24).unwrap();
        let all = lines(&ops);
        let start = all.iter().position(|l| l.starts_with("+30 210")).unwrap();
        let end = all.iter().position(|l| *l == "+30 690 000 0000").unwrap();

        let phone_lines = &all[start..end];
        assert!(phone_lines.len() > 1);
        assert!(phone_lines.iter().all(|l| text_width(l) <= 24));
        assert_eq!(phone_lines.join(" "), phone);
    }

    #[test]
    fn test_section_styles() {
        let ops = formatter().format(&scenario_order(), 32).unwrap();

        // Venue name is bold + double height and centered
        assert_eq!(
            &ops[..4],
            &[
                PrintOp::Align(Alignment::Center),
                PrintOp::Bold(true),
                PrintOp::DoubleHeight(true),
                PrintOp::Line("Tide Beach Club".to_string()),
            ]
        );
        // Phones too wide for one line go one per line
        assert!(lines(&ops).contains(&"+30 210 000 0000"));
        assert!(lines(&ops).contains(&"+30 690 000 0000"));

        let banner = ops
            .iter()
            .position(|op| op == &PrintOp::Line("WALK-IN".to_string()))
            .unwrap();
        assert_eq!(ops[banner - 1], PrintOp::Bold(true));

        let total = ops
            .iter()
            .position(|op| op.text().is_some_and(|t| t.starts_with("TOTAL")))
            .unwrap();
        assert_eq!(ops[total - 1], PrintOp::DoubleHeight(true));
        assert_eq!(ops[total - 2], PrintOp::Bold(true));

        assert_eq!(&ops[ops.len() - 2..], &[PrintOp::Feed(4), PrintOp::Cut]);
    }

    #[test]
    fn test_identifier_rows() {
        let mut order = scenario_order();
        order.created_at = Some(Utc.with_ymd_and_hms(2025, 7, 1, 18, 5, 0).unwrap());

        let ops = formatter().format(&order, 32).unwrap();
        let text = lines(&ops);
        assert!(text.contains(&justify("Rcpt #ABC123", "01/07/2025", 32).as_str()));
        // Athens is UTC+3 in summer
        assert!(text.contains(&justify("Order #A1", "21:05", 32).as_str()));

        let fixed = formatter()
            .with_layout(IdentifierLayout::FixedColumn { right_column: 18 })
            .format(&order, 32)
            .unwrap();
        let rows: Vec<&str> = lines(&fixed)
            .into_iter()
            .filter(|l| l.starts_with("Rcpt #") || l.starts_with("Order #"))
            .collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.chars().nth(17) == Some(' ')));
        assert_eq!(rows[0].find("01/"), Some(18));
        assert_eq!(rows[1].find("21:"), Some(18));
    }

    #[test]
    fn test_location_line() {
        let mut order = scenario_order();
        order.room_or_table = Some("12".to_string());
        let text = formatter().format(&order, 32).unwrap();
        assert!(lines(&text).contains(&"Table: 12"));

        order.order_type = Some("room service".to_string());
        order.room_or_table = Some("204".to_string());
        let ops = formatter().format(&order, 32).unwrap();
        assert!(lines(&ops).contains(&"Room: 204"));
        assert!(lines(&ops).contains(&"ROOM SERVICE"));
    }

    #[test]
    fn test_long_name_continues_on_indented_lines() {
        let mut order = scenario_order();
        order.items[0].name = Some("grilled octopus with fava and capers".to_string());
        order.items[0].variant = None;

        let ops = formatter().format(&order, 32).unwrap();
        let text = lines(&ops);
        let row = text.iter().position(|l| l.starts_with("Grilled Octop")).unwrap();
        assert!(text[row].ends_with("$6.00"));
        assert_eq!(text[row + 1], "  us With Fava");
        assert_eq!(text[row + 2], "  And Capers");
    }

    #[test]
    fn test_sku_placeholder_is_blank() {
        let mut order = scenario_order();
        order.items[0].sku = Some("n/a".to_string());
        let ops = formatter().format(&order, 32).unwrap();
        let row = lines(&ops)
            .into_iter()
            .find(|l| l.starts_with("Cola"))
            .unwrap()
            .to_string();
        assert_eq!(row, Columns::for_width(32).row("Cola", "", "2", "$6.00"));
    }

    #[test]
    fn test_discount_row() {
        let mut order = scenario_order();
        order.discount = Decimal::new(150, 2);
        let ops = formatter().format(&order, 32).unwrap();
        assert!(lines(&ops).contains(&justify("Discount", "-$1.50", 32).as_str()));
    }

    #[test]
    fn test_footer_placeholders() {
        let ops = formatter().format(&scenario_order(), 32).unwrap();
        let text = lines(&ops);
        assert!(text.contains(&"Payment: N/A"));
        assert!(text.contains(&"Prepared by: N/A"));
        assert!(text.contains(&"Printed by: N/A"));
        assert!(text.contains(&THANK_YOU));
    }

    #[test]
    fn test_amount_overflow() {
        let mut order = scenario_order();
        order.items[0].price = Decimal::MAX;
        assert!(matches!(
            formatter().format(&order, 32),
            Err(FormatError::AmountOverflow(_))
        ));
    }
}
