use std::sync::LazyLock;

use regex::Regex;

/// Both alternatives live in one pattern so the leftmost candidate wins.
///
/// `designated`: `volume`, `vol`, `vol.`, `v`, `v.` or `no.` at a word start, or `#`,
/// then optional separators and digits (any length, `v2023` is a volume).
///
/// `bare`: a 1 to 3 digit token that ends the name, optionally followed by
/// bracketed groups such as `(2019)` or `[Digital]` and a file extension.
/// Four digit bare tokens are years, never volumes.
static VOLUME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)",
        r"(?:(?:^|[^\p{L}\p{N}])(?:volume|vol\.?|v\.?|no\.)|#)[\s._-]*(?P<designated>\d+)",
        r"|",
        r"(?:^|[\s_-])(?P<bare>\d{1,3})(?:[\s_-]*[(\[][^)\]]*[)\]])*\s*(?:\.[\p{L}\p{N}]{2,4})?$",
    ))
    .expect("volume regex should compile")
});

/// Looks for a volume number in a title or an archive file name.
///
/// Returns `None` when nothing matches, or when the digits don't fit a `u32`.
#[must_use]
pub fn extract_volume(source: &str) -> Option<u32> {
    let captures = VOLUME.captures(source)?;
    let digits = captures
        .name("designated")
        .or_else(|| captures.name("bare"))?;

    digits.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designated_volumes() {
        assert_eq!(extract_volume("Series Name v12.cbz"), Some(12));
        assert_eq!(extract_volume("Series Name Vol. 3"), Some(3));
        assert_eq!(extract_volume("Series Name vol 4"), Some(4));
        assert_eq!(extract_volume("Series Name Volume 05"), Some(5));
        assert_eq!(extract_volume("v09"), Some(9));
        assert_eq!(extract_volume("Series No. 8"), Some(8));
        assert_eq!(extract_volume("Series_v_10"), Some(10));
    }

    #[test]
    fn year_is_not_a_volume() {
        assert_eq!(extract_volume("Series Name 2023"), None);
        assert_eq!(extract_volume("Blade Runner 2049.cbz"), None);
        assert_eq!(extract_volume("Series Name #7 (2023)"), Some(7));
    }

    #[test]
    fn designated_four_digits_is_a_volume() {
        assert_eq!(extract_volume("Series v2023"), Some(2023));
    }

    #[test]
    fn bare_trailing_token() {
        assert_eq!(extract_volume("Series 03 (2019) [Digital].cbz"), Some(3));
        assert_eq!(extract_volume("Series_12.cbz"), Some(12));
        assert_eq!(extract_volume("Chapter 7"), Some(7));
    }

    #[test]
    fn bare_token_must_end_the_name() {
        assert_eq!(extract_volume("Mob Psycho 100 v01"), Some(1));
        assert_eq!(extract_volume("20th Century Boys"), None);
        assert_eq!(extract_volume("Ranma 1/2 v03"), Some(3));
    }

    #[test]
    fn v_inside_a_word_is_not_a_designator() {
        assert_eq!(extract_volume("Dev3loper"), None);
        assert_eq!(extract_volume("Dave 2"), Some(2));
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(extract_volume("Series v2 #5"), Some(2));
        assert_eq!(extract_volume("#5 Series v2"), Some(5));
    }

    #[test]
    fn absent_and_overflow() {
        assert_eq!(extract_volume(""), None);
        assert_eq!(extract_volume("No digits here"), None);
        assert_eq!(extract_volume("v99999999999"), None);
    }

    #[test]
    fn deterministic() {
        let source = "Series Name #7 (2023)";
        assert_eq!(extract_volume(source), extract_volume(source));
    }
}
