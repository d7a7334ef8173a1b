use camino::Utf8PathBuf;
use cbz_tag_core::Outcome;
use cli_table::{format::Justify, Table};

#[derive(Debug, Clone, Table)]
pub struct ReportRow {
    #[table(title = "#", justify = "Justify::Right")]
    index: usize,
    #[table(title = "Archive")]
    archive: String,
    #[table(title = "Result")]
    result: &'static str,
    #[table(title = "Details")]
    details: String,
}

impl From<(usize, &(Utf8PathBuf, Outcome))> for ReportRow {
    fn from((index, (archive, outcome)): (usize, &(Utf8PathBuf, Outcome))) -> Self {
        let (result, details) = match outcome {
            Outcome::Tagged(summary) => ("tagged", summary),
            Outcome::Skipped(reason) => ("skipped", reason),
            Outcome::Failed(reason) => ("failed", reason),
        };

        ReportRow {
            index: index + 1,
            archive: archive.file_name().unwrap_or(archive.as_str()).to_string(),
            result,
            details: details.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_numbered_from_one() {
        let entry = (
            Utf8PathBuf::from("/books/a.cbz"),
            Outcome::Failed("nope".into()),
        );
        let row = ReportRow::from((0, &entry));

        assert_eq!(row.index, 1);
        assert_eq!(row.archive, "a.cbz");
        assert_eq!(row.result, "failed");
        assert_eq!(row.details, "nope");
    }
}
