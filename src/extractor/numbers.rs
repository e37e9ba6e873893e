//! Strict scanners for the odds cell formats.
//! Win odds are `digits.digits`; place odds are `digits.digits - digits.digits`
//! with optional whitespace around the dash.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::types::PlaceOdds;

/// Consume one `digits.digits` token from the front of `s`.
/// Returns the token and the unconsumed remainder.
fn scan_decimal(s: &str) -> Option<(&str, &str)> {
    let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
    if int_len == 0 {
        return None;
    }
    let after_int = &s[int_len..];
    let frac = after_int.strip_prefix('.')?;
    let frac_len = frac.bytes().take_while(u8::is_ascii_digit).count();
    if frac_len == 0 {
        return None;
    }
    let token_len = int_len + 1 + frac_len;
    Some((&s[..token_len], &s[token_len..]))
}

fn to_positive(token: &str) -> Option<Decimal> {
    Decimal::from_str(token).ok().filter(|d| *d > Decimal::ZERO)
}

/// Parse a win-odds cell. Anything other than a lone positive `digits.digits` is absent.
pub fn parse_win_odds(text: &str) -> Option<Decimal> {
    let (token, rest) = scan_decimal(text.trim())?;
    if !rest.is_empty() {
        return None;
    }
    to_positive(token)
}

/// Parse a place-odds cell such as `1.2-1.5` or `1.2 - 1.5`.
/// A reversed range (min > max) is treated as unparsable.
pub fn parse_place_odds(text: &str) -> Option<PlaceOdds> {
    let (min_token, rest) = scan_decimal(text.trim())?;
    let rest = rest.trim_start().strip_prefix('-')?.trim_start();
    let (max_token, rest) = scan_decimal(rest)?;
    if !rest.is_empty() {
        return None;
    }
    let min = to_positive(min_token)?;
    let max = to_positive(max_token)?;
    (min <= max).then_some(PlaceOdds { min, max })
}
