#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub use crate::{
    collector::{
        collect, CollectOptions, Collection, FieldSource, NoInput, Reply, ScriptedSource, State,
    },
    descriptor::{Descriptor, EntryDescriptor},
    errors::{DescriptorError, Error, InputError, Result, TagWriteError, ValidationError},
    listing::{archives_in, Listing, Selection, SessionContext},
    normalize::{normalize, tidy},
    record::{Field, MetadataHint, MetadataRecord, SeriesInfo},
    session::{tag_batch, tag_entry, Outcome, Report},
    tagger::{ComicTagger, DryRun, TagWriter},
    volume::extract_volume,
};

pub mod collector;
pub mod descriptor;
pub mod errors;
pub mod listing;
pub mod normalize;
pub mod record;
pub mod session;
pub mod tagger;
pub mod volume;
