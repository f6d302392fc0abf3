//! Destination templates
//!
//! A destination may reference capture groups positionally (`$1`, `$2`, ...).

use regex::Captures;

/// Segment substituted for placeholders when a template is checked statically
const SAMPLE_SEGMENT: &str = "x";

/// Expand `$n` placeholders with capture group text.
///
/// Groups that did not participate and out-of-range indices expand to an
/// empty string. A `$` not followed by a digit is copied as is.
pub fn expand(template: &str, captures: &Captures<'_>) -> String {
    substitute(template, |index| {
        captures.get(index).map_or("", |m| m.as_str())
    })
}

/// Fill every placeholder with a representative segment.
///
/// Used to decide statically which build a templated destination can reach.
pub fn sample(template: &str) -> String {
    substitute(template, |_| SAMPLE_SEGMENT)
}

fn substitute<'a>(template: &str, mut lookup: impl FnMut(usize) -> &'a str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(&(_, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits.push(d);
            chars.next();
        }

        if digits.is_empty() {
            out.push('$');
        } else {
            // Overflowing indices cannot name a real group
            let index = digits.parse::<usize>().unwrap_or(usize::MAX);
            out.push_str(lookup(index));
        }
    }

    out
}
