use std::{collections::BTreeMap, fs};

use camino::Utf8Path;
use glob::Pattern;
use serde::Deserialize;
use tracing::debug;

use crate::{
    errors::DescriptorError,
    record::{MetadataHint, SeriesInfo},
};

/// Descriptor values may be written as JSON numbers or strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(i64),
    Text(String),
}

impl Scalar {
    fn to_raw(&self) -> String {
        match self {
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntryDescriptor {
    pub year: Option<Scalar>,
    pub month: Option<Scalar>,
    pub day: Option<Scalar>,
    pub title: Option<String>,
    pub comments: Option<String>,
    pub volume: Option<u32>,
    /// Overrides the series metadata for this entry only
    pub series: Option<SeriesInfo>,
}

impl EntryDescriptor {
    /// Fills the gaps of `self` with `defaults`
    #[must_use]
    pub fn or(&self, defaults: &EntryDescriptor) -> EntryDescriptor {
        let series = match (&self.series, &defaults.series) {
            (Some(own), Some(base)) => Some(own.or(base)),
            (own, base) => own.clone().or_else(|| base.clone()),
        };

        EntryDescriptor {
            year: self.year.clone().or_else(|| defaults.year.clone()),
            month: self.month.clone().or_else(|| defaults.month.clone()),
            day: self.day.clone().or_else(|| defaults.day.clone()),
            title: self.title.clone().or_else(|| defaults.title.clone()),
            comments: self.comments.clone().or_else(|| defaults.comments.clone()),
            volume: self.volume.or(defaults.volume),
            series,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDescriptor {
    series: SeriesInfo,
    defaults: EntryDescriptor,
    entries: BTreeMap<String, EntryDescriptor>,
    books: BTreeMap<String, SeriesInfo>,
}

/// Metadata for a batch of archives, loaded from a JSON file.
///
/// `entries` keys are exact archive file names or glob patterns. An exact name
/// wins, otherwise the longest matching pattern, then the first in key order.
///
/// `books` keys are directory names, each with the series metadata of every
/// archive in that directory. A book alone doesn't provide a title, that has to
/// come from `defaults`, an entry or the console.
#[derive(Debug, Default)]
pub struct Descriptor {
    series: SeriesInfo,
    defaults: EntryDescriptor,
    exact: BTreeMap<String, EntryDescriptor>,
    patterns: Vec<(Pattern, EntryDescriptor)>,
    books: BTreeMap<String, SeriesInfo>,
}

fn is_pattern(key: &str) -> bool {
    key.contains(['*', '?', '['])
}

/// `credit=<role>:<name>` is split at the first `:`, so a role can't contain one
fn check_credits(series: &SeriesInfo) -> Result<(), DescriptorError> {
    match series.credits.keys().find(|role| role.contains(':')) {
        Some(role) => Err(DescriptorError::CreditRole { role: role.clone() }),
        None => Ok(()),
    }
}

impl Descriptor {
    /// ## Errors
    ///
    /// Fails if the file can't be read or isn't a valid descriptor
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, DescriptorError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&json, path)
    }

    /// `path` is only used in error messages
    ///
    /// ## Errors
    ///
    /// Fails on invalid JSON, unknown keys, unexpected value types, invalid glob
    /// patterns or credit roles containing `:`
    pub fn parse(json: &str, path: &Utf8Path) -> Result<Self, DescriptorError> {
        let raw: RawDescriptor =
            serde_json::from_str(json).map_err(|source| DescriptorError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let entry_series = raw
            .entries
            .values()
            .chain([&raw.defaults])
            .filter_map(|entry| entry.series.as_ref());
        for series in [&raw.series]
            .into_iter()
            .chain(raw.books.values())
            .chain(entry_series)
        {
            check_credits(series)?;
        }

        let mut exact = BTreeMap::new();
        let mut patterns = Vec::new();
        for (key, entry) in raw.entries {
            if is_pattern(&key) {
                let pattern = Pattern::new(&key).map_err(|source| DescriptorError::Pattern {
                    pattern: key.clone(),
                    source,
                })?;
                patterns.push((pattern, entry));
            } else {
                exact.insert(key, entry);
            }
        }
        // stable sort keeps key order among patterns of the same length
        patterns.sort_by_key(|(pattern, _)| std::cmp::Reverse(pattern.as_str().len()));
        debug!(
            "descriptor {path}: {} exact entries, {} patterns, {} books",
            exact.len(),
            patterns.len(),
            raw.books.len()
        );

        Ok(Self {
            series: raw.series,
            defaults: raw.defaults,
            exact,
            patterns,
            books: raw.books,
        })
    }

    /// Entries plus books
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len() + self.patterns.len() + self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn entry_for(&self, file_name: &str) -> Option<&EntryDescriptor> {
        self.exact.get(file_name).or_else(|| {
            self.patterns
                .iter()
                .find(|(pattern, _)| pattern.matches(file_name))
                .map(|(_, entry)| entry)
        })
    }

    #[must_use]
    pub fn book(&self, directory_name: &str) -> Option<&SeriesInfo> {
        self.books.get(directory_name)
    }

    /// The hint for one archive, `None` when no entry matches it
    #[must_use]
    pub fn hint_for(&self, file_name: &str) -> Option<MetadataHint> {
        self.hint(None, file_name)
    }

    /// The hint for one archive of the directory `directory_name`.
    ///
    /// Series metadata is layered: the entry's own, then the book's, then the
    /// top-level `series`. An archive with no entry still gets a hint from
    /// `defaults` when its directory has a book.
    #[must_use]
    pub fn hint_in(&self, directory_name: &str, file_name: &str) -> Option<MetadataHint> {
        self.hint(self.book(directory_name), file_name)
    }

    fn hint(&self, book: Option<&SeriesInfo>, file_name: &str) -> Option<MetadataHint> {
        let entry = match (self.entry_for(file_name), book) {
            (Some(entry), _) => entry.or(&self.defaults),
            (None, Some(_)) => self.defaults.clone(),
            (None, None) => return None,
        };

        let mut series = book.map_or_else(|| self.series.clone(), |book| book.or(&self.series));
        if let Some(own) = &entry.series {
            series = own.or(&series);
        }

        Some(MetadataHint {
            year: entry.year.as_ref().map(Scalar::to_raw),
            month: entry.month.as_ref().map(Scalar::to_raw),
            day: entry.day.as_ref().map(Scalar::to_raw),
            title: entry.title,
            comments: entry.comments,
            volume: entry.volume,
            file_name: Some(file_name.to_string()),
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "series": { "series": "Name", "credits": { "Writer": "Someone" } },
        "defaults": { "year": 2020, "comments": "Shared" },
        "entries": {
            "Name v01.cbz": { "title": "First", "month": "4", "day": 1 },
            "Name v0*.cbz": { "title": "Early" },
            "Name v*.cbz": { "title": "Any", "year": "2021" },
            "Name [ab]*.cbz": {}
        }
    }"#;

    fn descriptor() -> Descriptor {
        Descriptor::parse(JSON, Utf8Path::new("manga.json")).unwrap()
    }

    #[test]
    fn exact_key_beats_patterns() {
        let hint = descriptor().hint_for("Name v01.cbz").unwrap();

        assert_eq!(hint.title.as_deref(), Some("First"));
        assert_eq!(hint.month.as_deref(), Some("4"));
        assert_eq!(hint.day.as_deref(), Some("1"));
        assert_eq!(hint.year.as_deref(), Some("2020"));
        assert_eq!(hint.comments.as_deref(), Some("Shared"));
        assert_eq!(hint.series.series.as_deref(), Some("Name"));
        assert_eq!(hint.file_name.as_deref(), Some("Name v01.cbz"));
    }

    #[test]
    fn longest_pattern_wins() {
        let descriptor = descriptor();

        let early = descriptor.hint_for("Name v02.cbz").unwrap();
        assert_eq!(early.title.as_deref(), Some("Early"));

        let any = descriptor.hint_for("Name v12.cbz").unwrap();
        assert_eq!(any.title.as_deref(), Some("Any"));
        assert_eq!(any.year.as_deref(), Some("2021"));
    }

    #[test]
    fn unmatched_archive_has_no_hint() {
        assert!(descriptor().hint_for("Other v01.cbz").is_none());
    }

    #[test]
    fn entry_series_overrides_top_level() {
        let descriptor = Descriptor::parse(
            r#"{
                "series": { "series": "Name", "publisher": "Pub" },
                "entries": {
                    "Name v01.cbz": { "title": "A", "series": { "publisher": "Other" } }
                }
            }"#,
            Utf8Path::new("manga.json"),
        )
        .unwrap();

        let hint = descriptor.hint_for("Name v01.cbz").unwrap();
        assert_eq!(hint.series.series.as_deref(), Some("Name"));
        assert_eq!(hint.series.publisher.as_deref(), Some("Other"));
    }

    #[test]
    fn books_are_matched_by_directory_name() {
        let descriptor = Descriptor::parse(
            r#"{
                "series": { "language": "en" },
                "defaults": { "year": 2001 },
                "books": {
                    "My Manga": {
                        "publisher": "Pub",
                        "series": "My Manga",
                        "manga": "YesAndRightToLeft",
                        "black_and_white": true,
                        "credit": { "Writer": "Someone", "Artist": "Other" },
                        "characters": ["A", "B"]
                    }
                }
            }"#,
            Utf8Path::new("manga.json"),
        )
        .unwrap();

        assert_eq!(descriptor.len(), 1);
        assert!(descriptor.hint_for("My Manga v01.cbz").is_none());
        assert!(descriptor.hint_in("Elsewhere", "My Manga v01.cbz").is_none());

        let hint = descriptor.hint_in("My Manga", "My Manga v01.cbz").unwrap();
        assert_eq!(hint.title, None);
        assert_eq!(hint.year.as_deref(), Some("2001"));
        assert_eq!(hint.series.publisher.as_deref(), Some("Pub"));
        assert_eq!(hint.series.language.as_deref(), Some("en"));
        assert_eq!(hint.series.black_and_white, Some(true));
        assert_eq!(hint.series.credits.len(), 2);
        assert_eq!(hint.series.characters, vec!["A", "B"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        for json in [
            r#"{ "entries": { "A.cbz": { "titel": "A" } } }"#,
            r#"{ "series": { "publsher": "P" } }"#,
            r#"{ "entires": {} }"#,
        ] {
            assert!(
                matches!(
                    Descriptor::parse(json, Utf8Path::new("bad.json")),
                    Err(DescriptorError::Parse { .. })
                ),
                "{json}"
            );
        }
    }

    #[test]
    fn credit_role_with_colon_is_rejected() {
        let result = Descriptor::parse(
            r#"{ "books": { "B": { "credit": { "Cover: Color": "Someone" } } } }"#,
            Utf8Path::new("bad.json"),
        );

        assert!(matches!(
            result,
            Err(DescriptorError::CreditRole { role }) if role == "Cover: Color"
        ));
    }

    #[test]
    fn invalid_descriptor() {
        assert!(matches!(
            Descriptor::parse("{ not json", Utf8Path::new("bad.json")),
            Err(DescriptorError::Parse { .. })
        ));
        assert!(matches!(
            Descriptor::parse(
                r#"{ "entries": { "A.cbz": { "volume": "one" } } }"#,
                Utf8Path::new("bad.json")
            ),
            Err(DescriptorError::Parse { .. })
        ));
    }
}
