//! Edit submissions sent by the editor on save.
//!
//! ```text
//! <ScheduleRequest>
//!   <xml_url>https://.../xmltv.xml</xml_url>
//!   <channel_id>C1</channel_id>
//!   <programs>
//!     <Program>
//!       <id>P1</id>
//!       <channel_id>C1</channel_id>
//!       <additional_ad_slate_length>5</additional_ad_slate_length>
//!     </Program>
//!   </programs>
//! </ScheduleRequest>
//! ```
//!
//! Other children of `<Program>` (start, stop, duration, ...) are display
//! data and ignored.

use epgedit_core::{EditedItem, ScheduleRequest};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::CodecError;
use crate::xmltv::parse_minutes;

#[derive(Debug, Default)]
struct ItemDraft {
    id: Option<String>,
    channel_id: Option<String>,
    extra: Option<String>,
}

impl ItemDraft {
    fn finish(self, position: usize) -> Result<EditedItem, CodecError> {
        let missing = |what: &str| CodecError::Invalid(format!("Program #{position} has no {what}"));
        let program_id = self.id.filter(|s| !s.is_empty()).ok_or_else(|| missing("id"))?;
        let channel_id = self
            .channel_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("channel_id"))?;
        let extra = parse_minutes(
            self.extra.as_deref().unwrap_or_default(),
            "additional_ad_slate_length",
        )?;
        Ok(EditedItem::new(program_id, channel_id, extra))
    }
}

/// Parse a `<ScheduleRequest>` envelope.
pub fn parse_request(xml: &str) -> Result<ScheduleRequest, CodecError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut source_url: Option<String> = None;
    let mut channel_id: Option<String> = None;
    let mut programs = Vec::new();
    let mut item: Option<ItemDraft> = None;
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.name().as_ref() == b"Program" {
                    item = Some(ItemDraft::default());
                }
                path.push(e.name().as_ref().to_vec());
                text.clear();
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"Program" {
                    programs.push(ItemDraft::default().finish(programs.len() + 1)?);
                }
            }
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::End(e) => {
                let value = std::mem::take(&mut text);
                path.pop();
                let name = e.name();
                if name.as_ref() == b"Program" {
                    if let Some(done) = item.take() {
                        programs.push(done.finish(programs.len() + 1)?);
                    }
                    continue;
                }
                match (name.as_ref(), item.as_mut()) {
                    (b"id", Some(draft)) => draft.id = Some(value),
                    (b"channel_id", Some(draft)) => draft.channel_id = Some(value),
                    (b"additional_ad_slate_length", Some(draft)) => draft.extra = Some(value),
                    (b"channel_id", None) if path.len() == 1 => channel_id = Some(value),
                    (b"xml_url", None) if path.len() == 1 => source_url = Some(value),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let channel_id = channel_id
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CodecError::Invalid("ScheduleRequest has no channel_id".into()))?;

    Ok(ScheduleRequest {
        source_url: source_url.filter(|u| !u.is_empty()),
        channel_id,
        programs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_envelope_and_ignores_display_fields() {
        let xml = r#"<ScheduleRequest>
            <xml_url>https://bucket.example/xmltv.xml</xml_url>
            <channel_id>C1</channel_id>
            <programs>
                <Program>
                    <id>P2</id>
                    <channel_id>C1</channel_id>
                    <start>20240301000000</start>
                    <duration>20</duration>
                    <additional_ad_slate_length>10</additional_ad_slate_length>
                </Program>
                <Program>
                    <id>P1</id>
                    <channel_id>C1</channel_id>
                </Program>
            </programs>
        </ScheduleRequest>"#;
        let request = parse_request(xml).unwrap();
        assert_eq!(request.channel_id, "C1");
        assert_eq!(request.source_url.as_deref(), Some("https://bucket.example/xmltv.xml"));
        assert_eq!(
            request.programs,
            vec![EditedItem::new("P2", "C1", 10), EditedItem::new("P1", "C1", 0)]
        );
    }

    #[test]
    fn negative_extra_filler_is_kept() {
        let xml = "<ScheduleRequest><channel_id>C1</channel_id><programs><Program>\
            <id>P1</id><channel_id>C1</channel_id>\
            <additional_ad_slate_length>-3</additional_ad_slate_length>\
            </Program></programs></ScheduleRequest>";
        let request = parse_request(xml).unwrap();
        assert_eq!(request.programs[0].additional_filler_minutes, -3);
    }

    #[test]
    fn missing_program_id_is_rejected() {
        let xml = "<ScheduleRequest><channel_id>C1</channel_id><programs>\
            <Program><channel_id>C1</channel_id></Program></programs></ScheduleRequest>";
        let err = parse_request(xml).unwrap_err();
        assert!(err.to_string().contains("has no id"));
    }

    #[test]
    fn missing_channel_is_rejected() {
        let xml = "<ScheduleRequest><programs/></ScheduleRequest>";
        assert!(parse_request(xml).is_err());
    }

    #[test]
    fn empty_program_list_is_allowed() {
        let xml = "<ScheduleRequest><xml_url/><channel_id>C9</channel_id><programs/></ScheduleRequest>";
        let request = parse_request(xml).unwrap();
        assert!(request.programs.is_empty());
        assert_eq!(request.source_url, None);
    }
}
