//! Card list normalization.
//!
//! Turns free-form pasted text into an ordered list of [`CardRequest`]s.
//! Each line holds one card name with an optional quantity:
//!
//! ```text
//! 3x Luke Skywalker        leading "N " / "Nx " / "N x "
//! Darth Vader x2           trailing "xN"
//! Boba Fett (2)            trailing "(N)"
//! Han Solo (SOR)           other parentheticals are dropped
//! # comment                ignored, as are "//" lines and blank lines
//! ```
//!
//! Normalization is pure and idempotent: re-normalizing the output of
//! [`to_text`] yields the same requests. Quantities above [`MAX_QUANTITY`]
//! are clamped.

use cardsheet_types::{CardRequest, MAX_QUANTITY};
use itertools::Itertools;
use log::{debug, trace, warn};
use nom::branch::alt;
use nom::character::complete::{char, digit1, one_of, space0, space1};
use nom::combinator::{all_consuming, map_res, recognize};
use nom::sequence::{delimited, preceded};
use nom::{IResult, Parser};

/// Characters accepted as the "times" marker in a quantity.
const MULTIPLIERS: &str = "xX×";

// --- Quantity Parsers ---

fn quantity(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>).parse(input)
}

/// `3 `, `3x `, `3 x `, `3× ` at the start of a line. Returns the rest of the line.
fn quantity_prefix(input: &str) -> IResult<&str, u32> {
    let (input, count) = quantity(input)?;
    let (input, _) = alt((recognize((space0, one_of(MULTIPLIERS), space1)), space1)).parse(input)?;
    Ok((input, count))
}

/// A whole trailing token: `x3`, `X3`, `×3` or `(3)`.
fn quantity_suffix_token(input: &str) -> IResult<&str, u32> {
    all_consuming(alt((
        preceded(one_of(MULTIPLIERS), quantity),
        delimited(char('('), quantity, char(')')),
    )))
    .parse(input)
}

// --- Line Helpers ---

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("//")
}

/// Splits `"Name x3"`, `"Name (3)"` or `"Name(3)"` into `("Name", 3)`.
fn split_quantity_suffix(line: &str) -> Option<(&str, u32)> {
    if let Some((head, tail)) = line.rsplit_once(' ')
        && let Ok((_, count)) = quantity_suffix_token(tail)
    {
        return Some((head, count));
    }

    if line.ends_with(')') {
        let open = line.rfind('(')?;
        if open > 0
            && let Ok((_, count)) = quantity_suffix_token(&line[open..])
        {
            return Some((&line[..open], count));
        }
    }
    None
}

/// Removes every parenthesized group, including nested ones. An unclosed
/// group runs to the end of the line.
fn strip_parentheticals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '(' => {
                depth += 1;
                out.push(' ');
            }
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Normalizes a single input line. Returns `None` for blank lines, comments,
/// zero quantities and lines with no name left after cleanup.
pub fn normalize_line(line: &str) -> Option<CardRequest> {
    let collapsed = collapse_whitespace(line);
    if collapsed.is_empty() || is_comment(&collapsed) {
        return None;
    }

    let (quantity, rest) = match quantity_prefix(&collapsed) {
        Ok((rest, count)) => (count, rest),
        Err(_) => match split_quantity_suffix(&collapsed) {
            Some((head, count)) => (count, head),
            None => (1, collapsed.as_str()),
        },
    };

    let name = collapse_whitespace(&strip_parentheticals(rest));
    trace!("normalized {:?} -> {:?} x{}", line, name, quantity);

    if quantity == 0 {
        debug!("Dropping zero-quantity line {:?}", line);
        return None;
    }
    if quantity > MAX_QUANTITY {
        warn!("Clamping quantity {} to {} for {:?}", quantity, MAX_QUANTITY, name);
    }
    CardRequest::new(name, quantity)
}

/// Normalizes a pasted list, preserving line order.
pub fn normalize(text: &str) -> Vec<CardRequest> {
    text.lines().filter_map(normalize_line).collect()
}

/// Renders requests back to list text, one `"{quantity}x {name}"` line each.
pub fn to_text(requests: &[CardRequest]) -> String {
    requests
        .iter()
        .map(|r| format!("{}x {}", r.quantity, r.name))
        .join("\n")
}

/// Total number of slot placements the requests expand to.
pub fn placement_count(requests: &[CardRequest]) -> usize {
    requests.iter().map(|r| r.quantity as usize).sum()
}
