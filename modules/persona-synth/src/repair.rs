//! Light textual repair of near-JSON model output.
//!
//! Only touches quoting and trailing commas, and never the inside of a
//! double-quoted string. Anything structurally broken is left for the parser
//! to reject.

use std::sync::LazyLock;

use regex::Regex;

/// A complete double-quoted JSON string, escapes included.
static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).unwrap());

/// A smart/single-quoted identifier-like key followed by a colon.
static QUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([{,]\s*)[“”‘’']([A-Za-z_][A-Za-z0-9_]*)[“”‘’'](\s*):"#).unwrap()
});

/// A smart/single-quoted scalar after a colon, closed before `,` or `}`.
static QUOTED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(:\s*)[“”‘’']([^"“”‘’'\n]*)[“”‘’'](\s*[,}])"#).unwrap()
});

/// A smart/single-quoted list element, closed before `,` or `]`.
static QUOTED_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\[,]\s*)[“”‘’']([^"“”‘’'\n]*)[“”‘’'](\s*[,\]])"#).unwrap()
});

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());

/// Normalize quoting and drop trailing commas.
///
/// Runs to a fixpoint, so `repair_json(&repair_json(s)) == repair_json(s)`.
pub fn repair_json(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = repair_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Repair the text between string literals, copying the literals verbatim.
fn repair_pass(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for literal in STRING_LITERAL.find_iter(input) {
        out.push_str(&repair_outside_strings(&input[last..literal.start()]));
        out.push_str(literal.as_str());
        last = literal.end();
    }
    out.push_str(&repair_outside_strings(&input[last..]));
    out
}

fn repair_outside_strings(input: &str) -> String {
    let s = QUOTED_KEY.replace_all(input, r#"${1}"${2}"${3}:"#);
    let s = QUOTED_VALUE.replace_all(&s, r#"${1}"${2}"${3}"#);
    let s = QUOTED_ELEMENT.replace_all(&s, r#"${1}"${2}"${3}"#);
    TRAILING_COMMA.replace_all(&s, "${1}").into_owned()
}
