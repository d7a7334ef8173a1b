use std::{collections::BTreeMap, fmt::Display, ops::RangeInclusive};

use serde::Deserialize;

/// The fields the collector asks for, in the order it asks for them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Year,
    Month,
    Day,
    Title,
    Comments,
}

impl Field {
    pub const ORDER: [Field; 5] = [
        Field::Year,
        Field::Month,
        Field::Day,
        Field::Title,
        Field::Comments,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Title => "title",
            Self::Comments => "comments",
        }
    }

    /// Accepted range for numeric fields, `None` for text fields
    #[must_use]
    pub fn range(self) -> Option<RangeInclusive<u16>> {
        match self {
            Self::Year => Some(1900..=2100),
            Self::Month => Some(1..=12),
            Self::Day => Some(1..=31),
            Self::Title | Self::Comments => None,
        }
    }

    #[must_use]
    pub fn is_required(self) -> bool {
        self == Self::Title
    }

    #[must_use]
    pub fn next(self) -> Option<Field> {
        let position = Self::ORDER.iter().position(|field| *field == self)?;
        Self::ORDER.get(position + 1).copied()
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Series-level metadata shared by every archive of a series.
///
/// Only the batch descriptor fills it, the interactive prompt leaves it empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeriesInfo {
    pub series: Option<String>,
    pub series_group: Option<String>,
    pub publisher: Option<String>,
    pub imprint: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub maturity_rating: Option<String>,
    pub web_link: Option<String>,
    pub manga: Option<String>,
    pub black_and_white: Option<bool>,
    /// Role to name, e.g. `"Writer": "Someone"`
    #[serde(alias = "credit")]
    pub credits: BTreeMap<String, String>,
    pub characters: Vec<String>,
}

impl SeriesInfo {
    /// Fills the gaps of `self` with `base`, credits are merged by role
    #[must_use]
    pub fn or(&self, base: &SeriesInfo) -> SeriesInfo {
        let text =
            |own: &Option<String>, base: &Option<String>| own.clone().or_else(|| base.clone());

        let mut credits = base.credits.clone();
        credits.extend(self.credits.clone());

        SeriesInfo {
            series: text(&self.series, &base.series),
            series_group: text(&self.series_group, &base.series_group),
            publisher: text(&self.publisher, &base.publisher),
            imprint: text(&self.imprint, &base.imprint),
            genre: text(&self.genre, &base.genre),
            language: text(&self.language, &base.language),
            maturity_rating: text(&self.maturity_rating, &base.maturity_rating),
            web_link: text(&self.web_link, &base.web_link),
            manga: text(&self.manga, &base.manga),
            black_and_white: self.black_and_white.or(base.black_and_white),
            credits,
            characters: if self.characters.is_empty() {
                base.characters.clone()
            } else {
                self.characters.clone()
            },
        }
    }

    /// Runs every text value through `clean`, dropping values that end up empty
    #[must_use]
    pub fn cleaned(&self, clean: impl Fn(&str) -> String) -> Self {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(&clean)
                .filter(|value| !value.is_empty())
        };

        Self {
            series: text(&self.series),
            series_group: text(&self.series_group),
            publisher: text(&self.publisher),
            imprint: text(&self.imprint),
            genre: text(&self.genre),
            language: text(&self.language),
            maturity_rating: text(&self.maturity_rating),
            web_link: text(&self.web_link),
            manga: text(&self.manga),
            black_and_white: self.black_and_white,
            credits: self
                .credits
                .iter()
                .map(|(role, name)| (clean(role), clean(name)))
                .filter(|(role, name)| !role.is_empty() && !name.is_empty())
                .collect(),
            characters: self
                .characters
                .iter()
                .map(|character| clean(character))
                .filter(|character| !character.is_empty())
                .collect(),
        }
    }

    /// Text fields as comictagger keys, in a fixed order, skipping absent ones
    #[must_use]
    pub fn text_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("series", &self.series),
            ("series_group", &self.series_group),
            ("publisher", &self.publisher),
            ("imprint", &self.imprint),
            ("genre", &self.genre),
            ("language", &self.language),
            ("maturity_rating", &self.maturity_rating),
            ("web_link", &self.web_link),
            ("manga", &self.manga),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|value| (key, value)))
        .collect()
    }
}

/// Partial metadata known before collection starts.
///
/// Values are raw and go through the same validation as operator input.
#[derive(Debug, Clone, Default)]
pub struct MetadataHint {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub title: Option<String>,
    pub comments: Option<String>,
    /// An explicit volume, skips extraction when set
    pub volume: Option<u32>,
    /// Archive file name, last resort for volume extraction
    pub file_name: Option<String>,
    pub series: SeriesInfo,
}

impl MetadataHint {
    #[must_use]
    pub fn for_archive(file_name: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Year => self.year.as_deref(),
            Field::Month => self.month.as_deref(),
            Field::Day => self.day.as_deref(),
            Field::Title => self.title.as_deref(),
            Field::Comments => self.comments.as_deref(),
        }
    }
}

/// Fully validated metadata for one archive.
///
/// Only the collector builds one, nothing can change it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    year: Option<u16>,
    month: Option<u16>,
    day: Option<u16>,
    title: String,
    comments: String,
    volume: Option<u32>,
    series: SeriesInfo,
}

impl MetadataRecord {
    pub(crate) fn new(
        (year, month, day): (Option<u16>, Option<u16>, Option<u16>),
        title: String,
        comments: String,
        volume: Option<u32>,
        series: SeriesInfo,
    ) -> Self {
        Self {
            year,
            month,
            day,
            title,
            comments,
            volume,
            series,
        }
    }

    #[must_use]
    pub fn year(&self) -> Option<u16> {
        self.year
    }

    #[must_use]
    pub fn month(&self) -> Option<u16> {
        self.month
    }

    #[must_use]
    pub fn day(&self) -> Option<u16> {
        self.day
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    #[must_use]
    pub fn volume(&self) -> Option<u32> {
        self.volume
    }

    #[must_use]
    pub fn series(&self) -> &SeriesInfo {
        &self.series
    }
}

impl Display for MetadataRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(volume) = self.volume {
            write!(f, "{volume:0>2} - ")?;
        }

        write!(f, "{}", self.title)?;

        if let Some(year) = self.year {
            write!(f, " ({year}")?;
            if let Some(month) = self.month {
                write!(f, "-{month:0>2}")?;
                if let Some(day) = self.day {
                    write!(f, "-{day:0>2}")?;
                }
            }
            write!(f, ")")?;
        }

        Ok(())
    }
}
