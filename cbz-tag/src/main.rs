#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use anyhow::Result;
use camino::Utf8PathBuf;
use cbz_tag_core::{
    tag_batch, tag_entry, Descriptor, Error, FieldSource, InputError, MetadataHint, NoInput,
    Outcome, Report, SessionContext,
};
use clap::Parser;
use cli_table::{print_stdout, WithTitle};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::info;

use crate::args::{Args, Batch, Subcommands, Tag, TaggerArgs};
use crate::prompt::{browse, confirm_skip, Console};
use crate::types::ReportRow;

mod args;
mod prompt;
mod types;

fn print_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Tagged(_) => outcome.green().to_string(),
        Outcome::Skipped(_) => outcome.yellow().to_string(),
        Outcome::Failed(_) => outcome.red().to_string(),
    }
}

fn print_report(report: &Report) -> Result<()> {
    if report.entries.is_empty() {
        return Ok(());
    }

    let rows = report
        .entries
        .iter()
        .enumerate()
        .map(Into::into)
        .collect::<Vec<ReportRow>>();

    print_stdout(rows.with_title())?;
    println!("{report}");

    Ok(())
}

fn context_or_browse(directory: Option<Utf8PathBuf>) -> Result<Option<SessionContext>> {
    match directory {
        Some(directory) => Ok(Some(SessionContext::directory(directory))),
        None => browse("."),
    }
}

fn tag_archives(
    context: &SessionContext,
    archives: &[Utf8PathBuf],
    tagger: &TaggerArgs,
    report: &mut Report,
) -> Result<()> {
    let writer = tagger.writer();
    let options = tagger.collect_options();
    let mut console = Console::default();

    for (index, archive) in archives.iter().enumerate() {
        let file_name = archive.file_name().unwrap_or(archive.as_str());
        println!(
            "{}",
            format!("Working on file {}/{}: {file_name}", index + 1, archives.len())
                .red()
        );

        if context.only.is_none() {
            match confirm_skip()? {
                Some(true) => {
                    report.push(
                        archive.clone(),
                        Outcome::Skipped("skipped by the operator".into()),
                    );
                    continue;
                }
                Some(false) => {}
                None => return Err(Error::Input(InputError::Aborted).into()),
            }
        }

        let outcome = tag_entry(
            archive,
            &MetadataHint::for_archive(file_name),
            &mut console,
            writer.as_ref(),
            options,
        )?;
        println!("{}", print_outcome(&outcome));
        report.push(archive.clone(), outcome);
    }

    Ok(())
}

fn tag(Tag { directory, tagger }: Tag) -> Result<()> {
    let Some(context) = context_or_browse(directory)? else {
        println!("{}", "Exiting.".red());
        return Ok(());
    };

    let archives = context.archives()?;
    if archives.is_empty() {
        println!("{}", format!("No .cbz files found in {context}.").red());
        return Ok(());
    }

    let mut report = Report::default();
    let result = tag_archives(&context, &archives, &tagger, &mut report);
    print_report(&report)?;
    result?;
    println!("{}", "Job completed.".red());

    Ok(())
}

fn batch(
    Batch {
        directory,
        descriptor,
        ask,
        tagger,
    }: Batch,
) -> Result<()> {
    let descriptor_path = descriptor;
    let descriptor = Descriptor::load(&descriptor_path)?;
    info!(
        "loaded {} descriptor entries from {descriptor_path}",
        descriptor.len()
    );

    let Some(context) = context_or_browse(directory)? else {
        println!("{}", "Exiting.".red());
        return Ok(());
    };
    let writer = tagger.writer();
    let options = tagger.collect_options();

    let mut source: Box<dyn FieldSource> = if ask {
        Box::new(Console::default())
    } else {
        Box::new(NoInput)
    };

    let bar = if ask {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    bar.set_style(
        ProgressStyle::default_bar().template("[{elapsed_precise}] [{wide_bar}] {pos}/{len}")?,
    );

    println!("{}", format!("Updating metadata for {context}").red());
    let mut report = Report::default();
    let result = tag_batch(
        &context,
        &descriptor,
        source.as_mut(),
        writer.as_ref(),
        options,
        &mut report,
        |index, total, archive, outcome| {
            bar.set_length(total as u64);
            bar.set_position(index as u64);
            bar.println(format!(
                "{}: {}",
                archive.file_name().unwrap_or(archive.as_str()),
                print_outcome(outcome)
            ));
        },
    );
    bar.finish();

    print_report(&report)?;
    result?;
    println!("{}", "Job completed.".red());

    Ok(())
}

fn is_abort(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<Error>(),
        Some(Error::Input(InputError::Aborted))
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let result = match args.command {
        Subcommands::Tag(args) => tag(args),
        Subcommands::Batch(args) => batch(args),
    };

    match result {
        Err(err) if is_abort(&err) => {
            println!("{}", "\nExiting.".red());
            Ok(())
        }
        result => result,
    }
}
