use std::{collections::VecDeque, io};

use tracing::{debug, warn};

use crate::{
    errors::{InputError, ValidationError},
    normalize::{normalize, tidy},
    record::{Field, MetadataHint, MetadataRecord},
    volume::extract_volume,
};

/// What a [`FieldSource`] answered for a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Value(String),
    /// Nothing left to give for this field
    Exhausted,
    /// The operator wants out, nothing gets written
    Abort,
}

/// Where field values come from: the console, a script, or nowhere at all.
pub trait FieldSource {
    /// ## Errors
    ///
    /// Fails when the underlying input can't be read
    fn request(&mut self, field: Field) -> io::Result<Reply>;

    /// Called with every rejected value, before the field is requested again
    fn reject(&mut self, error: &ValidationError) {
        warn!("{error}");
    }
}

/// Replays a fixed list of replies, then reports exhaustion
#[derive(Debug, Default)]
pub struct ScriptedSource {
    replies: VecDeque<Reply>,
    pub requests: Vec<Field>,
    pub rejections: Vec<ValidationError>,
}

impl ScriptedSource {
    #[must_use]
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: values
                .into_iter()
                .map(|value| Reply::Value(value.into()))
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn then(mut self, reply: Reply) -> Self {
        self.replies.push_back(reply);

        self
    }
}

impl FieldSource for ScriptedSource {
    fn request(&mut self, field: Field) -> io::Result<Reply> {
        self.requests.push(field);

        Ok(self.replies.pop_front().unwrap_or(Reply::Exhausted))
    }

    fn reject(&mut self, error: &ValidationError) {
        debug!("scripted value rejected: {error}");
        self.rejections.push(error.clone());
    }
}

/// A source with nothing in it, everything must come from the hint
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl FieldSource for NoInput {
    fn request(&mut self, _field: Field) -> io::Result<Reply> {
        Ok(Reply::Exhausted)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Attempts allowed per field, `None` keeps asking forever
    pub max_attempts: Option<u32>,
    /// Collapse whitespace and ellipses on top of plain normalization
    pub tidy: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_attempts: None,
            tidy: true,
        }
    }
}

impl CollectOptions {
    fn clean(&self, raw: &str) -> String {
        if self.tidy {
            tidy(raw)
        } else {
            normalize(raw)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingField(Field),
    Retrying(Field),
    Assembled,
}

#[derive(Debug, Default)]
struct Draft {
    year: Option<u16>,
    month: Option<u16>,
    day: Option<u16>,
    title: Option<String>,
    comments: String,
}

/// One run of the field state machine, driven step by step.
///
/// Fields are visited in [`Field::ORDER`]. A rejected value moves to
/// [`State::Retrying`], the next step goes back to the same field and
/// earlier fields are kept.
#[derive(Debug)]
pub struct Collection<'a> {
    hint: &'a MetadataHint,
    options: CollectOptions,
    state: State,
    attempts: u32,
    hint_tried: bool,
    rejected: bool,
    draft: Draft,
}

impl<'a> Collection<'a> {
    #[must_use]
    pub fn new(hint: &'a MetadataHint, options: CollectOptions) -> Self {
        Self {
            hint,
            options,
            state: State::AwaitingField(Field::Year),
            attempts: 0,
            hint_tried: false,
            rejected: false,
            draft: Draft::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Performs one transition and returns the new state.
    ///
    /// ## Errors
    ///
    /// Fails when the attempts for a field run out, when the source is exhausted
    /// for a required or previously rejected field, or when the operator aborts.
    pub fn step<S>(&mut self, source: &mut S) -> Result<State, InputError>
    where
        S: FieldSource + ?Sized,
    {
        match self.state {
            State::Assembled => {}
            State::Retrying(field) => self.state = State::AwaitingField(field),
            State::AwaitingField(field) => self.await_field(field, source)?,
        }

        Ok(self.state)
    }

    /// The assembled record, `None` until the state machine reached [`State::Assembled`]
    #[must_use]
    pub fn finish(self) -> Option<MetadataRecord> {
        if self.state != State::Assembled {
            return None;
        }

        let Draft {
            year,
            month,
            day,
            title,
            comments,
        } = self.draft;
        let title = title?;
        let volume = self
            .hint
            .volume
            .or_else(|| extract_volume(&title))
            .or_else(|| self.hint.file_name.as_deref().and_then(extract_volume));
        let series = self.hint.series.cleaned(|raw| self.options.clean(raw));

        Some(MetadataRecord::new(
            (year, month, day),
            title,
            comments,
            volume,
            series,
        ))
    }

    fn await_field<S>(&mut self, field: Field, source: &mut S) -> Result<(), InputError>
    where
        S: FieldSource + ?Sized,
    {
        let hinted = if self.hint_tried {
            None
        } else {
            self.hint_tried = true;
            self.hint.get(field)
        };

        let raw = match hinted {
            Some(raw) => raw.to_string(),
            None => match source.request(field)? {
                Reply::Value(raw) => raw,
                Reply::Abort => return Err(InputError::Aborted),
                Reply::Exhausted if field.is_required() || self.rejected => {
                    return Err(InputError::SourceExhausted { field });
                }
                Reply::Exhausted => {
                    debug!("no {field} given, leaving it empty");
                    self.advance(field);
                    return Ok(());
                }
            },
        };

        self.attempts += 1;

        match self.accept(field, &raw) {
            Ok(()) => {
                self.advance(field);
                Ok(())
            }
            Err(error) => {
                source.reject(&error);
                if self
                    .options
                    .max_attempts
                    .is_some_and(|max| self.attempts >= max)
                {
                    return Err(InputError::RetriesExhausted {
                        field,
                        attempts: self.attempts,
                        last: error,
                    });
                }
                self.rejected = true;
                self.state = State::Retrying(field);
                Ok(())
            }
        }
    }

    fn advance(&mut self, field: Field) {
        self.attempts = 0;
        self.hint_tried = false;
        self.rejected = false;
        self.state = field.next().map_or(State::Assembled, State::AwaitingField);
    }

    fn accept(&mut self, field: Field, raw: &str) -> Result<(), ValidationError> {
        match field {
            Field::Year => self.draft.year = parse_number(field, raw)?,
            Field::Month => self.draft.month = parse_number(field, raw)?,
            Field::Day => self.draft.day = parse_number(field, raw)?,
            Field::Title => {
                let title = self.options.clean(raw);
                if title.is_empty() {
                    return Err(ValidationError::Empty { field });
                }
                self.draft.title = Some(title);
            }
            Field::Comments => self.draft.comments = self.options.clean(raw),
        }

        Ok(())
    }
}

/// Empty input means the field is absent
fn parse_number(field: Field, raw: &str) -> Result<Option<u16>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let Some(range) = field.range() else {
        return Err(ValidationError::NotANumber {
            field,
            value: trimmed.to_string(),
        });
    };
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::NotANumber {
            field,
            value: trimmed.to_string(),
        });
    }

    // all digits, so a failed parse can only be an overflow
    match trimmed.parse::<u16>() {
        Ok(number) if range.contains(&number) => Ok(Some(number)),
        _ => Err(ValidationError::OutOfRange {
            field,
            value: trimmed.to_string(),
            min: *range.start(),
            max: *range.end(),
        }),
    }
}

/// Runs a [`Collection`] to completion.
///
/// ## Errors
///
/// Same as [`Collection::step`]
pub fn collect<S>(
    hint: &MetadataHint,
    source: &mut S,
    options: CollectOptions,
) -> Result<MetadataRecord, InputError>
where
    S: FieldSource + ?Sized,
{
    let mut collection = Collection::new(hint, options);

    while collection.step(source)? != State::Assembled {}

    collection
        .finish()
        .ok_or(InputError::SourceExhausted {
            field: Field::Title,
        })
}
