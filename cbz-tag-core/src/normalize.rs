use std::sync::LazyLock;

use regex::Regex;

/// Comictagger's escape character inside `-m key=value,...` metadata strings
pub const ESCAPE: char = '^';

/// Characters comictagger parses as pair/key separators, escaped with [`ESCAPE`]
pub const SEPARATORS: [char; 2] = [',', '='];

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

/// Returns `true` when `c` is rewritten or removed by [`normalize`].
#[must_use]
pub fn is_reserved(c: char) -> bool {
    c == ESCAPE
        || SEPARATORS.contains(&c)
        || c.is_control()
        || matches!(c, '\u{2018}' | '\u{2019}')
}

/// Makes raw operator or descriptor text safe to embed in a comictagger metadata string.
///
/// The substitution table is fixed:
/// - `,` and `=` get prefixed with `^`, unless they already are
/// - a `^` that doesn't directly precede `,` or `=` is deleted, so the output
///   never ends with a dangling escape that would swallow the next separator
/// - whitespace control characters (`\n`, `\r`, `\t`, ...) become a space
/// - typographic single quotes become `'`
/// - every other control character is deleted
///
/// The result is then trimmed. Applying it twice yields the same text.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => {
                if chars.peek().is_some_and(|next| SEPARATORS.contains(next)) {
                    out.push(ESCAPE);
                }
            }
            c if SEPARATORS.contains(&c) => {
                if !out.ends_with(ESCAPE) {
                    out.push(ESCAPE);
                }
                out.push(c);
            }
            '\u{2018}' | '\u{2019}' => out.push('\''),
            c if c.is_control() && c.is_whitespace() => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out.trim().to_string()
}

/// [`normalize`], then collapses whitespace runs and turns `...` into `…`.
#[must_use]
pub fn tidy(raw: &str) -> String {
    let normalized = normalize(raw);

    WHITESPACE_RUN
        .replace_all(&normalized, " ")
        .replace("...", "\u{2026}")
}
