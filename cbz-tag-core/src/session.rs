use std::fmt::Display;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{error, info, warn};

use crate::{
    collector::{collect, CollectOptions, FieldSource},
    descriptor::Descriptor,
    errors::{InputError, Result},
    listing::SessionContext,
    record::MetadataHint,
    tagger::TagWriter,
};

/// How one archive went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Written, with a short summary of the record
    Tagged(String),
    Skipped(String),
    /// The tagger refused, with its message
    Failed(String),
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tagged(summary) => write!(f, "tagged: {summary}"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Collects the metadata of one archive and writes it.
///
/// The writer is only called with a fully assembled record. Input problems
/// skip the archive and tagger errors fail it, neither stops the run.
///
/// ## Errors
///
/// Only an operator abort or an unreadable input source is returned as an error
pub fn tag_entry<S, W>(
    archive: &Utf8Path,
    hint: &MetadataHint,
    source: &mut S,
    writer: &W,
    options: CollectOptions,
) -> Result<Outcome>
where
    S: FieldSource + ?Sized,
    W: TagWriter + ?Sized,
{
    let record = match collect(hint, source, options) {
        Ok(record) => record,
        Err(err @ (InputError::Aborted | InputError::Io(_))) => return Err(err.into()),
        Err(err) => {
            warn!("Skipping file {archive} due to missing metadata: {err}");
            return Ok(Outcome::Skipped(err.to_string()));
        }
    };

    info!("tagging {archive}: {record}");
    if let Err(err) = writer.write(archive, &record) {
        error!("Error while tagging file {archive}: {err}");
        return Ok(Outcome::Failed(err.to_string()));
    }
    if let Err(err) = writer.show(archive) {
        warn!("Error while printing updated metadata for {archive}: {err}");
    }

    Ok(Outcome::Tagged(record.to_string()))
}

/// Per-archive outcomes of a run, in processing order
#[derive(Debug, Default)]
pub struct Report {
    pub entries: Vec<(Utf8PathBuf, Outcome)>,
}

impl Report {
    pub fn push(&mut self, archive: impl Into<Utf8PathBuf>, outcome: Outcome) {
        self.entries.push((archive.into(), outcome));
    }

    #[must_use]
    pub fn tagged(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Tagged(_)))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Skipped(_)))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tagged, {} skipped, {} failed",
            self.tagged(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Tags every archive of `context` from `descriptor`, one after the other.
///
/// Archives the descriptor knows nothing about are skipped. `source` fills the
/// gaps the descriptor leaves, pass [`crate::NoInput`] to never prompt. Every
/// outcome lands in `report` as soon as it is known, so it stays complete up to
/// the failing archive when this returns an error. `on_entry` is called after
/// each archive with its position, the total and its outcome.
///
/// ## Errors
///
/// Fails when the directory can't be listed, or as [`tag_entry`] does
pub fn tag_batch<S, W, F>(
    context: &SessionContext,
    descriptor: &Descriptor,
    source: &mut S,
    writer: &W,
    options: CollectOptions,
    report: &mut Report,
    mut on_entry: F,
) -> Result<()>
where
    S: FieldSource + ?Sized,
    W: TagWriter + ?Sized,
    F: FnMut(usize, usize, &Utf8Path, &Outcome),
{
    let archives = context.archives()?;
    let total = archives.len();
    let directory_name = context.directory_name().unwrap_or_default();

    for (index, archive) in archives.into_iter().enumerate() {
        let file_name = archive.file_name().unwrap_or(archive.as_str());
        let outcome = match descriptor.hint_in(&directory_name, file_name) {
            Some(hint) => tag_entry(&archive, &hint, source, writer, options)?,
            None => {
                warn!("No metadata found for {file_name} in the descriptor");
                Outcome::Skipped("no descriptor entry".to_string())
            }
        };
        on_entry(index + 1, total, &archive, &outcome);
        report.push(archive, outcome);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        collector::{NoInput, Reply, ScriptedSource},
        errors::TagWriteError,
        record::MetadataRecord,
        Error,
    };

    #[derive(Default)]
    struct Recorder {
        written: RefCell<Vec<(Utf8PathBuf, MetadataRecord)>>,
        fail: bool,
    }

    impl TagWriter for Recorder {
        fn write(&self, archive: &Utf8Path, record: &MetadataRecord) -> Result<(), TagWriteError> {
            if self.fail {
                return Err(TagWriteError::Launch {
                    program: "recorder".into(),
                    source: std::io::Error::other("refused"),
                });
            }
            self.written
                .borrow_mut()
                .push((archive.to_path_buf(), record.clone()));
            Ok(())
        }
    }

    #[test]
    fn tagged_entry_is_written_once() {
        let writer = Recorder::default();
        let mut source = ScriptedSource::new(["2000", "1", "2", "Title v5", ""]);

        let outcome = tag_entry(
            Utf8Path::new("a.cbz"),
            &MetadataHint::for_archive("a.cbz"),
            &mut source,
            &writer,
            CollectOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Tagged("05 - Title v5 (2000-01-02)".into()));
        assert_eq!(writer.written.borrow().len(), 1);
    }

    #[test]
    fn exhausted_input_skips_without_writing() {
        let writer = Recorder::default();

        let outcome = tag_entry(
            Utf8Path::new("a.cbz"),
            &MetadataHint::default(),
            &mut NoInput,
            &writer,
            CollectOptions::default(),
        )
        .unwrap();

        assert!(matches!(outcome, Outcome::Skipped(_)));
        assert!(writer.written.borrow().is_empty());
    }

    #[test]
    fn abort_is_an_error_and_writes_nothing() {
        let writer = Recorder::default();
        let mut source = ScriptedSource::new(["2000"]).then(Reply::Abort);

        let result = tag_entry(
            Utf8Path::new("a.cbz"),
            &MetadataHint::default(),
            &mut source,
            &writer,
            CollectOptions::default(),
        );

        assert!(matches!(result, Err(Error::Input(InputError::Aborted))));
        assert!(writer.written.borrow().is_empty());
    }

    #[test]
    fn writer_failure_is_reported_verbatim() {
        let writer = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let hint = MetadataHint {
            title: Some("T".into()),
            ..MetadataHint::default()
        };

        let outcome = tag_entry(
            Utf8Path::new("a.cbz"),
            &hint,
            &mut NoInput,
            &writer,
            CollectOptions::default(),
        )
        .unwrap();

        assert_eq!(
            outcome,
            Outcome::Failed("Couldn't run recorder: refused".into())
        );
    }

    #[test]
    fn report_counts() {
        let mut report = Report::default();
        report.push("a.cbz", Outcome::Tagged("a".into()));
        report.push("b.cbz", Outcome::Skipped("b".into()));
        report.push("c.cbz", Outcome::Failed("c".into()));
        report.push("d.cbz", Outcome::Tagged("d".into()));

        assert_eq!(report.to_string(), "2 tagged, 1 skipped, 1 failed");
    }
}
