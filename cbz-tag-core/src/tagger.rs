use std::process::Command;

use camino::Utf8Path;
use tracing::{debug, info};

use crate::{errors::TagWriteError, normalize::ESCAPE, record::MetadataRecord};

/// Boundary to whatever actually writes tags into an archive.
///
/// A write is atomic from the caller's point of view and is never retried.
pub trait TagWriter {
    /// ## Errors
    ///
    /// Fails when the tagger can't be run or rejects the archive
    fn write(&self, archive: &Utf8Path, record: &MetadataRecord) -> Result<(), TagWriteError>;

    /// Displays the tags now stored in the archive
    ///
    /// ## Errors
    ///
    /// Fails when the tagger can't be run or can't read the archive
    fn show(&self, _archive: &Utf8Path) -> Result<(), TagWriteError> {
        Ok(())
    }
}

impl<T> TagWriter for &T
where
    T: TagWriter + ?Sized,
{
    fn write(&self, archive: &Utf8Path, record: &MetadataRecord) -> Result<(), TagWriteError> {
        (**self).write(archive, record)
    }

    fn show(&self, archive: &Utf8Path) -> Result<(), TagWriteError> {
        (**self).show(archive)
    }
}

/// `key=value` pairs in the order comictagger receives them.
///
/// Text values are already normalized by the collector, so separators inside them are escaped.
/// Credit roles never contain `:`, the descriptor refuses them.
#[must_use]
pub fn metadata_pairs(record: &MetadataRecord) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();

    let numbers = [
        ("year", record.year().map(u32::from)),
        ("month", record.month().map(u32::from)),
        ("day", record.day().map(u32::from)),
        ("volume", record.volume()),
    ];
    for (key, value) in numbers {
        if let Some(value) = value {
            pairs.push((key, value.to_string()));
        }
    }

    pairs.push(("title", record.title().to_string()));
    if !record.comments().is_empty() {
        pairs.push(("comments", record.comments().to_string()));
    }

    let series = record.series();
    for (key, value) in series.text_fields() {
        pairs.push((key, value.to_string()));
    }
    if let Some(black_and_white) = series.black_and_white {
        pairs.push(("black_and_white", black_and_white.to_string()));
    }
    for (role, name) in &series.credits {
        pairs.push(("credit", format!("{role}:{name}")));
    }
    if !series.characters.is_empty() {
        pairs.push(("characters", series.characters.join(&format!("{ESCAPE},"))));
    }

    pairs
}

/// The single `-m` argument: `key=value,key=value,...`
#[must_use]
pub fn metadata_argument(record: &MetadataRecord) -> String {
    metadata_pairs(record)
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Runs the external `comictagger` program
#[derive(Debug, Clone)]
pub struct ComicTagger {
    pub program: String,
    /// Tag style, `cr` is ComicRack
    pub style: String,
}

impl Default for ComicTagger {
    fn default() -> Self {
        Self {
            program: "comictagger".to_string(),
            style: "cr".to_string(),
        }
    }
}

impl ComicTagger {
    /// `-s` saves, `--overwrite` replaces existing tags, `-m` carries the metadata
    #[must_use]
    pub fn write_args(&self, archive: &Utf8Path, record: &MetadataRecord) -> Vec<String> {
        vec![
            "-s".to_string(),
            "-t".to_string(),
            self.style.clone(),
            "--overwrite".to_string(),
            "-m".to_string(),
            metadata_argument(record),
            archive.to_string(),
        ]
    }

    #[must_use]
    pub fn show_args(&self, archive: &Utf8Path) -> Vec<String> {
        vec![
            "-p".to_string(),
            "--type".to_string(),
            self.style.to_uppercase(),
            archive.to_string(),
        ]
    }

    fn launch_error(&self, source: std::io::Error) -> TagWriteError {
        TagWriteError::Launch {
            program: self.program.clone(),
            source,
        }
    }
}

impl TagWriter for ComicTagger {
    fn write(&self, archive: &Utf8Path, record: &MetadataRecord) -> Result<(), TagWriteError> {
        let args = self.write_args(archive, record);
        debug!("running {} {args:?}", self.program);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|err| self.launch_error(err))?;

        if !output.status.success() {
            return Err(TagWriteError::Rejected {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!("{}", String::from_utf8_lossy(&output.stdout).trim());

        Ok(())
    }

    fn show(&self, archive: &Utf8Path) -> Result<(), TagWriteError> {
        let status = Command::new(&self.program)
            .args(self.show_args(archive))
            .status()
            .map_err(|err| self.launch_error(err))?;

        if !status.success() {
            return Err(TagWriteError::Rejected {
                program: self.program.clone(),
                status,
                stderr: String::new(),
            });
        }

        Ok(())
    }
}

/// Logs the command comictagger would receive and touches nothing
#[derive(Debug, Clone, Default)]
pub struct DryRun(pub ComicTagger);

impl TagWriter for DryRun {
    fn write(&self, archive: &Utf8Path, record: &MetadataRecord) -> Result<(), TagWriteError> {
        info!(
            "dry run: {} {}",
            self.0.program,
            self.0.write_args(archive, record).join(" ")
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        collector::{collect, CollectOptions, NoInput},
        record::{MetadataHint, SeriesInfo},
    };

    fn record(hint: MetadataHint) -> MetadataRecord {
        collect(&hint, &mut NoInput, CollectOptions::default()).unwrap()
    }

    #[test]
    fn pairs_skip_absent_values() {
        let record = record(MetadataHint {
            year: Some("2001".into()),
            title: Some("Plain".into()),
            ..MetadataHint::default()
        });

        assert_eq!(metadata_argument(&record), "year=2001,title=Plain");
    }

    #[test]
    fn pairs_carry_escaped_text_and_series() {
        let record = record(MetadataHint {
            year: Some("2001".into()),
            month: Some("02".into()),
            day: Some("3".into()),
            title: Some("One, Two v4".into()),
            comments: Some("a=b".into()),
            series: SeriesInfo {
                series: Some("Series".into()),
                black_and_white: Some(true),
                credits: BTreeMap::from([("Writer".into(), "Someone".into())]),
                characters: vec!["A".into(), "B".into()],
                ..SeriesInfo::default()
            },
            ..MetadataHint::default()
        });

        assert_eq!(
            metadata_argument(&record),
            "year=2001,month=2,day=3,volume=4,title=One^, Two v4,comments=a^=b,\
             series=Series,black_and_white=true,credit=Writer:Someone,characters=A^,B"
        );
    }

    #[test]
    fn trailing_caret_does_not_escape_the_next_pair() {
        let record = record(MetadataHint {
            title: Some("Ranma^".into()),
            comments: Some("hello".into()),
            series: SeriesInfo {
                credits: BTreeMap::from([("Artist".into(), "Someone^".into())]),
                characters: vec!["Akane^".into(), "Ranma".into()],
                ..SeriesInfo::default()
            },
            ..MetadataHint::default()
        });

        assert_eq!(
            metadata_argument(&record),
            "title=Ranma,comments=hello,credit=Artist:Someone,characters=Akane^,Ranma"
        );
    }

    #[test]
    fn comictagger_args() {
        let record = record(MetadataHint {
            title: Some("T".into()),
            ..MetadataHint::default()
        });
        let tagger = ComicTagger::default();
        let archive = Utf8Path::new("/books/T.cbz");

        assert_eq!(
            tagger.write_args(archive, &record),
            vec!["-s", "-t", "cr", "--overwrite", "-m", "title=T", "/books/T.cbz"]
        );
        assert_eq!(
            tagger.show_args(archive),
            vec!["-p", "--type", "CR", "/books/T.cbz"]
        );
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let record = record(MetadataHint {
            title: Some("T".into()),
            ..MetadataHint::default()
        });
        let tagger = ComicTagger {
            program: "cbz-tag-this-program-does-not-exist".into(),
            ..ComicTagger::default()
        };

        assert!(matches!(
            tagger.write(Utf8Path::new("T.cbz"), &record),
            Err(TagWriteError::Launch { .. })
        ));
    }
}
