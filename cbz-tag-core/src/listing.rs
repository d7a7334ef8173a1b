use std::{fmt::Display, fs};

use camino::{Utf8Path, Utf8PathBuf};
use glob::{glob_with, MatchOptions, Pattern};
use tracing::error;

use crate::{errors::Result, volume::extract_volume, Error};

pub static ARCHIVE_EXTENSION: &str = "cbz";

/// What the operator picked in a [`Listing`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Directory(Utf8PathBuf),
    Archive(Utf8PathBuf),
}

/// Subdirectories and archives of one directory
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub directory: Utf8PathBuf,
    /// Directory names, sorted, hidden ones skipped
    pub directories: Vec<String>,
    /// Archive paths, in volume order
    pub archives: Vec<Utf8PathBuf>,
}

impl Listing {
    /// ## Errors
    ///
    /// Fails when `directory` isn't a readable directory
    pub fn scan(directory: impl AsRef<Utf8Path>) -> Result<Self> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(Error::NotADirectory(directory.to_path_buf()));
        }

        let mut directories = Vec::new();
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                error!("{:?} is not a valid utf-8 path", entry.file_name());
                continue;
            };
            if !name.starts_with('.') {
                directories.push(name);
            }
        }
        directories.sort();

        Ok(Self {
            directory: directory.to_path_buf(),
            directories,
            archives: archives_in(directory)?,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.directories.len() + self.archives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maps a flat menu index (directories first, then archives) to a selection
    #[must_use]
    pub fn select(&self, index: usize) -> Option<Selection> {
        match self.directories.get(index) {
            Some(name) => Some(Selection::Directory(self.directory.join(name))),
            None => self
                .archives
                .get(index - self.directories.len())
                .cloned()
                .map(Selection::Archive),
        }
    }

    /// Menu labels, in the same order as [`Listing::select`] indices
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.directories
            .iter()
            .map(|name| format!("{name}/"))
            .chain(
                self.archives
                    .iter()
                    .map(|path| path.file_name().unwrap_or(path.as_str()).to_string()),
            )
            .collect()
    }
}

/// `.cbz` archives directly under `directory`, ordered by volume.
///
/// Archives without a volume come last, ties are ordered by name.
///
/// ## Errors
///
/// Fails when the directory can't be globbed
pub fn archives_in(directory: impl AsRef<Utf8Path>) -> Result<Vec<Utf8PathBuf>> {
    let pattern = format!(
        "{}/*.{ARCHIVE_EXTENSION}",
        Pattern::escape(directory.as_ref().as_str())
    );
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::default()
    };

    let mut archives = Vec::new();
    for path in glob_with(&pattern, options)? {
        let path = path?;
        let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
            error!("skipping archive with a non utf-8 path");
            continue;
        };
        if path.is_file() {
            archives.push(path);
        }
    }
    archives.sort_by_cached_key(|path| {
        let name = path.file_name().unwrap_or_default().to_string();
        (extract_volume(&name).unwrap_or(u32::MAX), name)
    });

    Ok(archives)
}

/// Explicit state of a run: where it works and, optionally, the one archive it targets
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub directory: Utf8PathBuf,
    pub only: Option<Utf8PathBuf>,
}

impl SessionContext {
    #[must_use]
    pub fn directory(directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            only: None,
        }
    }

    /// A context targeting a single archive inside its parent directory
    #[must_use]
    pub fn archive(archive: impl Into<Utf8PathBuf>) -> Self {
        let archive = archive.into();
        let directory = archive
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_path_buf);

        Self {
            directory,
            only: Some(archive),
        }
    }

    /// Name of the working directory, `.` and `..` are resolved first
    #[must_use]
    pub fn directory_name(&self) -> Option<String> {
        match self.directory.file_name() {
            Some(name) => Some(name.to_string()),
            None => self
                .directory
                .canonicalize_utf8()
                .ok()?
                .file_name()
                .map(str::to_string),
        }
    }

    /// The archives this context works on
    ///
    /// ## Errors
    ///
    /// Fails when the directory can't be listed
    pub fn archives(&self) -> Result<Vec<Utf8PathBuf>> {
        match &self.only {
            Some(archive) => Ok(vec![archive.clone()]),
            None => archives_in(&self.directory),
        }
    }
}

impl Display for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.only {
            Some(archive) => write!(f, "{archive}"),
            None => write!(f, "{}", self.directory),
        }
    }
}
