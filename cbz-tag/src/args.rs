use camino::Utf8PathBuf;
use cbz_tag_core::{CollectOptions, ComicTagger, DryRun, TagWriter};
use clap::{Parser, Subcommand};

fn existing_directory(value: &str) -> Result<Utf8PathBuf, String> {
    let path = Utf8PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("The specified directory '{value}' does not exist."))
    }
}

#[derive(Parser, Debug)]
pub struct TaggerArgs {
    /// Program writing the tags into the archives
    #[clap(long, env = "CBZ_TAG_TAGGER", default_value = "comictagger")]
    pub tagger: String,
    /// Tag style given to the tagger, `cr` is ComicRack
    #[clap(long, env = "CBZ_TAG_STYLE", default_value = "cr")]
    pub style: String,
    /// Log the tagger command instead of running it
    #[clap(long, action)]
    pub dry_run: bool,
    /// Give up on a field after that many invalid values, asks forever by default
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,
    /// Keep repeated whitespace and "..." as typed
    #[clap(long, action)]
    pub no_tidy: bool,
}

impl TaggerArgs {
    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            max_attempts: self.max_attempts,
            tidy: !self.no_tidy,
        }
    }

    pub fn writer(&self) -> Box<dyn TagWriter> {
        let tagger = ComicTagger {
            program: self.tagger.clone(),
            style: self.style.clone(),
        };

        if self.dry_run {
            Box::new(DryRun(tagger))
        } else {
            Box::new(tagger)
        }
    }
}

#[derive(Parser, Debug)]
pub struct Tag {
    /// Directory to process, browse from the current directory when omitted
    #[clap(short, long, value_parser = existing_directory)]
    pub directory: Option<Utf8PathBuf>,
    #[clap(flatten)]
    pub tagger: TaggerArgs,
}

#[derive(Parser, Debug)]
pub struct Batch {
    /// Directory to process, browse from the current directory when omitted
    #[clap(short, long, value_parser = existing_directory)]
    pub directory: Option<Utf8PathBuf>,
    /// JSON file describing the metadata of each archive
    #[clap(long, default_value = "manga.json")]
    pub descriptor: Utf8PathBuf,
    /// Prompt for values the descriptor is missing or gets wrong instead of skipping
    #[clap(long, action)]
    pub ask: bool,
    #[clap(flatten)]
    pub tagger: TaggerArgs,
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Tag archives one by one, typing the metadata
    #[clap(alias = "t")]
    Tag(Tag),
    /// Tag a whole directory from a JSON descriptor
    #[clap(alias = "b")]
    Batch(Batch),
}

#[derive(Parser, Debug)]
#[clap(about, author, version)]
pub struct Args {
    /// Tired of the default metadata source in comictagger? Do it yourself!
    #[clap(subcommand)]
    pub command: Subcommands,
}
