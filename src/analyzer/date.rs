//! Calendar date codecs
//!
//! Bulletins print dates as `dd.mm.yyyy`; the ledger stores them as
//! fixed-width `yyyy.mm.dd` strings so that lexical order is date order.

use chrono::NaiveDate;

const LEDGER_FORMAT: &str = "%Y.%m.%d";
const BULLETIN_FORMAT: &str = "%d.%m.%Y";

/// Encode a date as `yyyy.mm.dd`
pub fn format_ledger_date(date: NaiveDate) -> String {
    date.format(LEDGER_FORMAT).to_string()
}

/// Parse a strict `yyyy.mm.dd` string
pub fn parse_ledger_date(value: &str) -> Option<NaiveDate> {
    if !has_shape(value, &[4, 7]) {
        return None;
    }
    NaiveDate::parse_from_str(value, LEDGER_FORMAT).ok()
}

/// Parse a strict `dd.mm.yyyy` string as printed in bulletins
pub fn parse_bulletin_date(value: &str) -> Option<NaiveDate> {
    if !has_shape(value, &[2, 5]) {
        return None;
    }
    NaiveDate::parse_from_str(value, BULLETIN_FORMAT).ok()
}

/// Ten ASCII bytes: dots at `dots`, digits elsewhere
fn has_shape(value: &str, dots: &[usize]) -> bool {
    value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| {
            if dots.contains(&i) {
                b == b'.'
            } else {
                b.is_ascii_digit()
            }
        })
}
