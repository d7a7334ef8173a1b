use std::io;

use camino::Utf8PathBuf;
use cbz_tag_core::{Field, FieldSource, Listing, Reply, Selection, SessionContext, ValidationError};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use owo_colors::OwoColorize;
use tracing::debug;

/// Ctrl-C inside a prompt reads as an abort rather than an error
fn interrupted<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
        Err(err) => Err(err),
    }
}

/// Asks the operator for each field on the terminal
#[derive(Default)]
pub struct Console {
    theme: ColorfulTheme,
}

impl FieldSource for Console {
    fn request(&mut self, field: Field) -> io::Result<Reply> {
        let prompt = match field.range() {
            Some(range) => format!(
                "Enter the {field} ({}-{}, empty to skip)",
                range.start(),
                range.end()
            ),
            None if field.is_required() => format!("Enter the {field}"),
            None => format!("Enter the {field} (optional)"),
        };

        let value = interrupted(
            Input::<String>::with_theme(&self.theme)
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text(),
        )?;

        Ok(value.map_or(Reply::Abort, Reply::Value))
    }

    fn reject(&mut self, error: &ValidationError) {
        eprintln!("{}", format!("{error}. Please enter a valid value.").red());
    }
}

/// `Some(true)` when the operator wants to skip the archive, `None` on Ctrl-C
pub fn confirm_skip() -> io::Result<Option<bool>> {
    interrupted(
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Do you want to skip to the next file?")
            .default(false)
            .interact(),
    )
}

/// Lets the operator walk down from `start` and pick what to work on.
///
/// Picking a directory enters it, picking an archive targets that archive only,
/// and the first entry targets every archive of the current directory.
/// `None` when the operator leaves with Esc, q or Ctrl-C.
pub fn browse(start: impl Into<Utf8PathBuf>) -> anyhow::Result<Option<SessionContext>> {
    let theme = ColorfulTheme::default();
    let mut current = start.into();

    loop {
        let listing = Listing::scan(&current)?;
        if listing.is_empty() {
            println!(
                "{}",
                format!("No directories or .cbz files found in {current}.").red()
            );
            return Ok(None);
        }

        let tag_all = !listing.archives.is_empty();
        let mut items = Vec::with_capacity(listing.len() + 1);
        if tag_all {
            items.push(format!(
                "* every archive in {current} ({})",
                listing.archives.len()
            ));
        }
        items.extend(listing.labels());

        let choice = interrupted(
            Select::with_theme(&theme)
                .with_prompt("Select a directory or file (Esc to quit)")
                .items(&items)
                .default(0)
                .interact_opt(),
        )?
        .flatten();
        let Some(choice) = choice else {
            return Ok(None);
        };
        debug!("picked menu entry {choice}");

        if tag_all && choice == 0 {
            return Ok(Some(SessionContext::directory(current)));
        }
        let index = if tag_all { choice - 1 } else { choice };
        match listing.select(index) {
            Some(Selection::Directory(directory)) => current = directory,
            Some(Selection::Archive(archive)) => {
                return Ok(Some(SessionContext::archive(archive)));
            }
            None => return Ok(None),
        }
    }
}
