use std::borrow::Cow;
use std::cmp::Ordering;

use deunicode::deunicode;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

use crate::model::xmltv::{Channel, Programme, TVGuide, EPG_ATTRIB_CHANNEL, EPG_ATTRIB_ID, EPG_ATTRIB_SRC, EPG_ATTRIB_START,
                          EPG_ATTRIB_STOP, EPG_TAG_CHANNEL, EPG_TAG_DESC, EPG_TAG_DISPLAY_NAME, EPG_TAG_ICON, EPG_TAG_PROGRAMME,
                          EPG_TAG_TITLE, EPG_TAG_TV};
use crate::resolver_error::{create_resolver_error_result, ResolverError, ResolverErrorKind};
use crate::utils::trace_if_enabled;

/// Structural tag event delivered by [`scan_tags`].
#[derive(Debug, PartialEq, Eq)]
pub enum TagEvent<'a> {
    Open { name: &'a str, attributes: &'a [(String, String)] },
    Close { name: &'a str },
    Text(&'a str),
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn tag_attributes(e: &BytesStart) -> Vec<(String, String)> {
    e.attributes().filter_map(Result::ok)
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.as_ref()).to_string();
            let value = a.unescape_value()
                .map_or_else(|_| String::from_utf8_lossy(&a.value).to_string(), Cow::into_owned);
            (key, value)
        }).collect()
}

fn text_content(e: &BytesText) -> String {
    // unknown entities like `&nbsp;` are kept verbatim
    e.unescape().map_or_else(|_| String::from_utf8_lossy(&**e).to_string(), Cow::into_owned)
}

/// Streams the markup as open/close/text events. Self-closing elements are reported
/// as an `Open` immediately followed by a `Close`.
pub fn scan_tags<R, F>(content: R, callback: &mut F) -> Result<(), ResolverError>
where
    R: std::io::BufRead,
    F: FnMut(TagEvent),
{
    let mut reader = Reader::from_reader(content);
    let mut buf = Vec::<u8>::with_capacity(1024);
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = tag_name(&e);
                let attributes = tag_attributes(&e);
                callback(TagEvent::Open { name: &name, attributes: &attributes });
            }
            Ok(Event::Empty(e)) => {
                let name = tag_name(&e);
                let attributes = tag_attributes(&e);
                callback(TagEvent::Open { name: &name, attributes: &attributes });
                callback(TagEvent::Close { name: &name });
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                callback(TagEvent::Close { name: &name });
            }
            Ok(Event::Text(e)) => {
                let text = text_content(&e);
                callback(TagEvent::Text(&text));
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).to_string();
                callback(TagEvent::Text(&text));
            }
            Ok(_) => {}
            Err(err) => {
                return create_resolver_error_result!(ResolverErrorKind::FeedParse, "invalid broadcast grid at position {}: {err}", reader.buffer_position());
            }
        }
        buf.clear();
    }
    Ok(())
}

fn get_attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum TextTarget {
    DisplayName,
    Title,
    Desc,
}

impl TextTarget {
    const fn tag(self) -> &'static str {
        match self {
            Self::DisplayName => EPG_TAG_DISPLAY_NAME,
            Self::Title => EPG_TAG_TITLE,
            Self::Desc => EPG_TAG_DESC,
        }
    }
}

#[derive(Default)]
struct GuideCollector {
    guide: TVGuide,
    has_tv_tag: bool,
    channel: Option<(Option<String>, Option<String>, Option<String>)>,
    programme: Option<Programme>,
    capture: Option<(TextTarget, String)>,
    // only the first display-name, icon, title and desc of an element are used
    seen: Vec<TextTarget>,
    has_icon: bool,
}

impl GuideCollector {
    fn open(&mut self, name: &str, attributes: &[(String, String)]) {
        match name {
            EPG_TAG_TV => self.has_tv_tag = true,
            EPG_TAG_CHANNEL if self.channel.is_none() && self.programme.is_none() => {
                self.channel = Some((get_attribute(attributes, EPG_ATTRIB_ID).map(ToString::to_string), None, None));
                self.seen.clear();
                self.has_icon = false;
            }
            EPG_TAG_PROGRAMME if self.channel.is_none() && self.programme.is_none() => {
                self.programme = Some(Programme {
                    channel_id: get_attribute(attributes, EPG_ATTRIB_CHANNEL).unwrap_or_default().to_string(),
                    start: get_attribute(attributes, EPG_ATTRIB_START).unwrap_or_default().to_string(),
                    stop: get_attribute(attributes, EPG_ATTRIB_STOP).unwrap_or_default().to_string(),
                    title: String::new(),
                    description: String::new(),
                });
                self.seen.clear();
            }
            EPG_TAG_DISPLAY_NAME if self.channel.is_some() => self.start_capture(TextTarget::DisplayName),
            EPG_TAG_ICON => {
                if let Some((_, _, icon)) = self.channel.as_mut() {
                    if !self.has_icon {
                        self.has_icon = true;
                        *icon = get_attribute(attributes, EPG_ATTRIB_SRC).map(ToString::to_string);
                    }
                }
            }
            EPG_TAG_TITLE if self.programme.is_some() => self.start_capture(TextTarget::Title),
            EPG_TAG_DESC if self.programme.is_some() => self.start_capture(TextTarget::Desc),
            _ => {}
        }
    }

    fn start_capture(&mut self, target: TextTarget) {
        if self.capture.is_none() && !self.seen.contains(&target) {
            self.seen.push(target);
            self.capture = Some((target, String::new()));
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, value)) = self.capture.as_mut() {
            value.push_str(text);
        }
    }

    fn close(&mut self, name: &str) {
        if let Some((target, _)) = &self.capture {
            if target.tag() == name {
                if let Some((target, value)) = self.capture.take() {
                    let value = value.trim().to_string();
                    match target {
                        TextTarget::DisplayName => if let Some((_, display_name, _)) = self.channel.as_mut() { *display_name = Some(value); },
                        TextTarget::Title => if let Some(prg) = self.programme.as_mut() { prg.title = value; },
                        TextTarget::Desc => if let Some(prg) = self.programme.as_mut() { prg.description = value; },
                    }
                }
            }
            return;
        }
        match name {
            EPG_TAG_CHANNEL => {
                if let Some((id, display_name, icon)) = self.channel.take() {
                    match id {
                        Some(id) if !id.is_empty() => self.guide.channels.push(Channel {
                            id,
                            name: display_name.unwrap_or_default(),
                            icon: icon.unwrap_or_default(),
                        }),
                        _ => trace_if_enabled!("Skipping channel without id {:?}", display_name),
                    }
                }
            }
            EPG_TAG_PROGRAMME => {
                if let Some(prg) = self.programme.take() {
                    if prg.channel_id.is_empty() {
                        trace_if_enabled!("Skipping programme without channel {}", prg.title);
                    } else {
                        self.guide.programmes.push(prg);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Locale-like name ordering: accent and case insensitive first, exact value as tie breaker.
pub fn compare_channel_names(a: &str, b: &str) -> Ordering {
    deunicode(a).to_lowercase().cmp(&deunicode(b).to_lowercase()).then_with(|| a.cmp(b))
}

/// Extracts channels and programmes from a broadcast grid document.
/// Channels are sorted by name, programmes by `start` (lexical, the format is fixed-width).
pub fn parse_tvguide<R>(content: R) -> Result<TVGuide, ResolverError>
where
    R: std::io::BufRead,
{
    let mut collector = GuideCollector::default();
    scan_tags(content, &mut |event: TagEvent| match event {
        TagEvent::Open { name, attributes } => collector.open(name, attributes),
        TagEvent::Close { name } => collector.close(name),
        TagEvent::Text(text) => collector.text(text),
    })?;

    if !collector.has_tv_tag {
        return create_resolver_error_result!(ResolverErrorKind::FeedParse, "broadcast grid has no <{EPG_TAG_TV}> element");
    }

    let mut guide = collector.guide;
    guide.channels.sort_by(|a, b| compare_channel_names(&a.name, &b.name));
    guide.programmes.sort_by(|a, b| a.start.cmp(&b.start));
    Ok(guide)
}

#[cfg(test)]
mod tests {
    use crate::processing::parser::xmltv::{parse_tvguide, scan_tags, TagEvent};
    use crate::resolver_error::ResolverErrorKind;

    const GUIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE tv SYSTEM "xmltv.dtd">
<tv generator-info-name="provider">
  <channel id="zdf.de">
    <display-name>ZDF</display-name>
    <display-name>ZDF HD</display-name>
    <icon src="http://logo/zdf.png"/>
  </channel>
  <channel id="ard.de"><icon src="http://logo/ard.png" /><display-name lang="de">Das Erste &amp; ARD</display-name></channel>
  <channel id="arte.de"><display-name>Ärte</display-name></channel>
  <channel><display-name>No Id</display-name></channel>
  <programme stop="20240101130000 +0000" channel="zdf.de" start="20240101120000 +0000">
    <title lang="de">Heute</title>
    <desc><![CDATA[Nachrichten <live>]]></desc>
  </programme>
  <programme start="20240101110000 +0000" stop="20240101120000 +0000" channel="zdf.de">
    <title>Morgenmagazin</title>
    <sub-title>Teil 1</sub-title>
    <desc/>
  </programme>
  <programme start="20240101100000 +0000" stop="20240101110000 +0000">
    <title>Orphan</title>
  </programme>
</tv>"#;

    #[test]
    fn test_parse_channels_sorted_by_name() {
        let guide = parse_tvguide(GUIDE.as_bytes()).unwrap();
        let names: Vec<&str> = guide.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ärte", "Das Erste & ARD", "ZDF"]);
        let zdf = guide.channels.iter().find(|c| c.id == "zdf.de").unwrap();
        assert_eq!(zdf.icon, "http://logo/zdf.png");
        let ard = guide.channels.iter().find(|c| c.id == "ard.de").unwrap();
        assert_eq!(ard.icon, "http://logo/ard.png");
    }

    #[test]
    fn test_parse_programmes_sorted_by_start() {
        let guide = parse_tvguide(GUIDE.as_bytes()).unwrap();
        assert_eq!(guide.programmes.len(), 2);
        assert_eq!(guide.programmes[0].title, "Morgenmagazin");
        assert_eq!(guide.programmes[0].description, "");
        assert_eq!(guide.programmes[1].title, "Heute");
        assert_eq!(guide.programmes[1].description, "Nachrichten <live>");
        assert_eq!(guide.programmes[1].stop, "20240101130000 +0000");
    }

    #[test]
    fn test_parse_rejects_broken_markup() {
        let err = parse_tvguide("<tv><channel id=\"a\"></programme></tv>".as_bytes()).unwrap_err();
        assert_eq!(err.kind, ResolverErrorKind::FeedParse);
    }

    #[test]
    fn test_parse_rejects_non_guide() {
        let err = parse_tvguide("<html><body>Maintenance</body></html>".as_bytes()).unwrap_err();
        assert_eq!(err.kind, ResolverErrorKind::FeedParse);
        assert!(parse_tvguide("".as_bytes()).is_err());
    }

    #[test]
    fn test_scan_self_closing() {
        let mut events = vec![];
        scan_tags("<a x=\"1\"/>".as_bytes(), &mut |event| {
            events.push(match event {
                TagEvent::Open { name, attributes } => format!("open {name} {}", attributes.len()),
                TagEvent::Close { name } => format!("close {name}"),
                TagEvent::Text(text) => format!("text {text}"),
            });
        }).unwrap();
        assert_eq!(events, vec!["open a 1", "close a"]);
    }
}
