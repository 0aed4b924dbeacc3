//! XMLTV reader and writer.
//!
//! ```text
//! <tv date="20240301093000 +0530" ...>
//!   <channel id="C1">
//!     <display-name lang="en">Movies One</display-name>
//!     <icon src="https://..."/>
//!   </channel>
//!   <program channel="C1" start="20240301000000" stop="20240301003500">
//!     <title lang="en" id="P1" duration="30">Heat</title>
//!     <desc lang="en">...</desc>
//!     <genres lang="en">Crime</genres>
//!     <pc_rating lang="en">R</pc_rating>
//!     <ad_slate_length>5</ad_slate_length>
//!     <applied_rules lang="en">...</applied_rules>
//!   </program>
//! </tv>
//! ```

use epgedit_core::{Channel, ProgramEntry, ScheduleDocument, format_xmltv_time, parse_xmltv_time};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, warn};

use crate::CodecError;

/// Parse an XMLTV document.
pub fn parse_document(xml: &str) -> Result<ScheduleDocument, CodecError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = DocumentReader::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => state.open(&e)?,
            Event::Empty(e) => {
                state.open(&e)?;
                state.close(e.name().as_ref())?;
            }
            Event::Text(t) => state.push_text(&t.unescape()?),
            Event::CData(c) => state.push_text(&String::from_utf8_lossy(&c)),
            Event::End(e) => state.close(e.name().as_ref())?,
            Event::Eof => break,
            _ => {}
        }
    }

    if !state.saw_root {
        return Err(CodecError::Invalid("missing <tv> root element".into()));
    }
    debug!(
        channels = state.doc.channels.len(),
        programs = state.doc.programs.len(),
        "Parsed XMLTV document"
    );
    Ok(state.doc)
}

/// Render a document as XMLTV.
pub fn render_document(doc: &ScheduleDocument) -> Result<String, CodecError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut tv = BytesStart::new("tv");
    if let Some(date) = &doc.date {
        tv.push_attribute(("date", date.as_str()));
    }
    for (key, value) in &doc.attributes {
        tv.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(tv))?;

    for channel in &doc.channels {
        writer.write_event(Event::Start(
            BytesStart::new("channel").with_attributes([("id", channel.id.as_str())]),
        ))?;
        text_element(&mut writer, "display-name", &[("lang", "en")], &channel.display_name)?;
        if let Some(icon) = channel.icon.as_deref().filter(|src| !src.is_empty()) {
            writer.write_event(Event::Empty(
                BytesStart::new("icon").with_attributes([("src", icon)]),
            ))?;
        }
        writer.write_event(Event::End(BytesEnd::new("channel")))?;
    }

    for program in &doc.programs {
        write_program(&mut writer, program)?;
    }

    writer.write_event(Event::End(BytesEnd::new("tv")))?;
    String::from_utf8(writer.into_inner()).map_err(|e| CodecError::Invalid(e.to_string()))
}

fn write_program(writer: &mut Writer<Vec<u8>>, program: &ProgramEntry) -> Result<(), CodecError> {
    let start = format_xmltv_time(&program.start);
    let stop = format_xmltv_time(&program.stop);
    writer.write_event(Event::Start(BytesStart::new("program").with_attributes([
        ("channel", program.channel_id.as_str()),
        ("start", start.as_str()),
        ("stop", stop.as_str()),
    ])))?;

    let duration = program.duration_minutes.to_string();
    text_element(
        writer,
        "title",
        &[("lang", "en"), ("id", program.program_id.as_str()), ("duration", duration.as_str())],
        &program.title,
    )?;
    text_element(writer, "desc", &[("lang", "en")], &program.description)?;
    text_element(writer, "genres", &[("lang", "en")], &program.genre)?;
    text_element(writer, "pc_rating", &[("lang", "en")], &program.rating)?;
    text_element(writer, "ad_slate_length", &[], &program.filler_minutes.to_string())?;
    text_element(writer, "applied_rules", &[("lang", "en")], &program.rule_annotation)?;

    writer.write_event(Event::End(BytesEnd::new("program")))?;
    Ok(())
}

fn text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<(), CodecError> {
    let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
    if text.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

/// Value of one attribute, unescaped.
pub(crate) fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, CodecError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Whole minutes from a text node. Blank means zero.
pub(crate) fn parse_minutes(raw: &str, what: &str) -> Result<i64, CodecError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i64>()
        .map_err(|_| CodecError::Invalid(format!("{what} is not a whole number of minutes: '{raw}'")))
}

// ─── Reader state ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leaf {
    DisplayName,
    Title,
    Desc,
    Genres,
    Rating,
    Filler,
    Rules,
}

#[derive(Debug, Default)]
struct ProgramDraft {
    channel: String,
    start: String,
    stop: String,
    program_id: Option<String>,
    duration: Option<String>,
    title: String,
    desc: String,
    genres: String,
    rating: String,
    filler: String,
    rules: String,
}

impl ProgramDraft {
    fn finish(self) -> Result<ProgramEntry, CodecError> {
        let start = parse_xmltv_time(&self.start)?;
        let stop = parse_xmltv_time(&self.stop)?;
        let program_id = self.program_id.filter(|id| !id.is_empty()).ok_or_else(|| {
            CodecError::Invalid(format!(
                "program on channel {} at {} has no title id",
                self.channel, self.start
            ))
        })?;
        let filler_minutes = parse_minutes(&self.filler, "ad_slate_length")?;
        if filler_minutes < 0 {
            return Err(CodecError::Invalid(format!(
                "program {program_id} on channel {} has negative ad_slate_length {filler_minutes}",
                self.channel
            )));
        }

        let span = (stop - start).num_seconds().div_euclid(60) - filler_minutes;
        let duration_minutes = match self.duration.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let duration = parse_minutes(raw, "title duration")?;
                if duration != span {
                    warn!(
                        channel = %self.channel,
                        program = %program_id,
                        duration,
                        span,
                        "Title duration disagrees with stop - start - ad_slate_length"
                    );
                }
                duration
            }
            _ => span,
        };
        if duration_minutes < 0 {
            return Err(CodecError::Invalid(format!(
                "program {program_id} on channel {} has negative duration {duration_minutes}",
                self.channel
            )));
        }

        Ok(ProgramEntry {
            channel_id: self.channel,
            program_id,
            title: self.title,
            description: self.desc,
            genre: self.genres,
            rating: self.rating,
            duration_minutes,
            filler_minutes,
            rule_annotation: self.rules,
            start,
            stop,
            slot: None,
        })
    }
}

#[derive(Debug, Default)]
struct DocumentReader {
    doc: ScheduleDocument,
    saw_root: bool,
    channel: Option<Channel>,
    program: Option<ProgramDraft>,
    leaf: Option<Leaf>,
    text: String,
}

impl DocumentReader {
    fn open(&mut self, e: &BytesStart<'_>) -> Result<(), CodecError> {
        match e.name().as_ref() {
            b"tv" => {
                self.saw_root = true;
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr.unescape_value()?.into_owned();
                    if key == "date" {
                        self.doc.date = Some(value);
                    } else {
                        self.doc.attributes.push((key, value));
                    }
                }
            }
            b"channel" if self.program.is_none() => {
                let id = attribute(e, b"id")?
                    .ok_or_else(|| CodecError::Invalid("<channel> without id".into()))?;
                self.channel = Some(Channel {
                    id,
                    display_name: String::new(),
                    icon: None,
                });
            }
            b"display-name" if self.channel.is_some() => self.begin(Leaf::DisplayName),
            b"icon" => {
                let src = attribute(e, b"src")?;
                if let Some(channel) = self.channel.as_mut() {
                    channel.icon = src.filter(|s| !s.is_empty());
                }
            }
            b"program" => {
                let required = |key: &[u8]| -> Result<String, CodecError> {
                    attribute(e, key)?.ok_or_else(|| {
                        CodecError::Invalid(format!(
                            "<program> without {}",
                            String::from_utf8_lossy(key)
                        ))
                    })
                };
                self.program = Some(ProgramDraft {
                    channel: required(b"channel")?,
                    start: required(b"start")?,
                    stop: required(b"stop")?,
                    ..Default::default()
                });
            }
            b"title" => {
                if let Some(program) = self.program.as_mut() {
                    program.program_id = attribute(e, b"id")?;
                    program.duration = attribute(e, b"duration")?;
                    self.begin(Leaf::Title);
                }
            }
            b"desc" => self.begin_in_program(Leaf::Desc),
            b"genres" => self.begin_in_program(Leaf::Genres),
            b"pc_rating" => self.begin_in_program(Leaf::Rating),
            b"ad_slate_length" => self.begin_in_program(Leaf::Filler),
            b"applied_rules" => self.begin_in_program(Leaf::Rules),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<(), CodecError> {
        match name {
            b"channel" => {
                if let Some(channel) = self.channel.take() {
                    self.doc.channels.push(channel);
                }
            }
            b"program" => {
                if let Some(program) = self.program.take() {
                    self.doc.programs.push(program.finish()?);
                }
            }
            b"display-name" | b"title" | b"desc" | b"genres" | b"pc_rating"
            | b"ad_slate_length" | b"applied_rules" => self.end_leaf(),
            _ => {}
        }
        Ok(())
    }

    fn begin(&mut self, leaf: Leaf) {
        self.leaf = Some(leaf);
        self.text.clear();
    }

    fn begin_in_program(&mut self, leaf: Leaf) {
        if self.program.is_some() {
            self.begin(leaf);
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.leaf.is_some() {
            self.text.push_str(text);
        }
    }

    fn end_leaf(&mut self) {
        let Some(leaf) = self.leaf.take() else {
            return;
        };
        let text = std::mem::take(&mut self.text);
        if leaf == Leaf::DisplayName {
            if let Some(channel) = self.channel.as_mut() {
                channel.display_name = text;
            }
            return;
        }
        let Some(program) = self.program.as_mut() else {
            return;
        };
        match leaf {
            Leaf::Title => program.title = text,
            Leaf::Desc => program.desc = text,
            Leaf::Genres => program.genres = text,
            Leaf::Rating => program.rating = text,
            Leaf::Filler => program.filler = text,
            Leaf::Rules => program.rules = text,
            Leaf::DisplayName => {}
        }
    }
}
