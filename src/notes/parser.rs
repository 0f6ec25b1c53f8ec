//! Parsing of the OSM notes XML format into structured records.
//!
//! A syntactically broken document is a page-level failure (the fetcher
//! retries it); a single bad record inside a well-formed page is either
//! dropped (no id) or surfaced as [`ImportError::MalformedNote`] so the
//! pipeline can skip it and keep going.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

use super::types::{CommentEvent, Note, NoteComment, NoteStatus, COORD_SCALE};
use crate::error::ImportError;
use crate::TARGET_WEB_REQUEST;

/// A note element as accumulated from XML events, before validation.
#[derive(Debug, Default)]
struct RawNote {
    lat: Option<String>,
    lon: Option<String>,
    id: Option<String>,
    date_created: Option<String>,
    date_closed: Option<String>,
    status: Option<String>,
    comments: Vec<RawComment>,
}

#[derive(Debug, Default)]
struct RawComment {
    date: Option<String>,
    uid: Option<String>,
    user: Option<String>,
    action: Option<String>,
    text: Option<String>,
}

/// Parse one notes API response. Returns one entry per note element
/// carrying an id: `Ok` for a valid record, `Err(MalformedNote)` for a
/// record missing another required field. Records without an id are
/// dropped with a log line.
pub fn parse_notes_page(
    xml: &str,
    tile: i64,
    country: Option<&str>,
) -> Result<Vec<Result<Note, ImportError>>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();

    let mut current_note: Option<RawNote> = None;
    let mut current_comment: Option<RawComment> = None;
    let mut current_field: Option<String> = None;
    let mut text_buf = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "note" => {
                        let mut note = RawNote::default();
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).to_string();
                            match attr.key.as_ref() {
                                b"lat" => note.lat = Some(value),
                                b"lon" => note.lon = Some(value),
                                _ => {}
                            }
                        }
                        current_note = Some(note);
                    }
                    "comment" => {
                        current_comment = Some(RawComment::default());
                    }
                    "comments" => {}
                    _ => {
                        current_field = Some(name);
                        text_buf.clear();
                    }
                }
            }
            Event::Text(ref e) => {
                if current_field.is_some() {
                    if let Ok(text) = e.unescape() {
                        text_buf.push_str(&text);
                    }
                }
            }
            Event::CData(ref e) => {
                if current_field.is_some() {
                    if let Ok(text) = String::from_utf8(e.to_vec()) {
                        text_buf.push_str(&text);
                    }
                }
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "note" => {
                        if let Some(raw) = current_note.take() {
                            if let Some(record) = finish_note(raw, tile, country) {
                                records.push(record);
                            }
                        }
                    }
                    "comment" => {
                        if let (Some(note), Some(comment)) =
                            (current_note.as_mut(), current_comment.take())
                        {
                            note.comments.push(comment);
                        }
                    }
                    "comments" => {}
                    _ => {
                        if current_field.as_deref() == Some(name.as_str()) {
                            assign_field(
                                &name,
                                text_buf.clone(),
                                current_note.as_mut(),
                                current_comment.as_mut(),
                            );
                            current_field = None;
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

fn assign_field(
    name: &str,
    value: String,
    note: Option<&mut RawNote>,
    comment: Option<&mut RawComment>,
) {
    if let Some(comment) = comment {
        match name {
            "date" => comment.date = Some(value),
            "uid" => comment.uid = Some(value),
            "user" => comment.user = Some(value),
            "action" => comment.action = Some(value),
            "text" => comment.text = Some(value),
            _ => {}
        }
    } else if let Some(note) = note {
        match name {
            "id" => note.id = Some(value),
            "date_created" => note.date_created = Some(value),
            "date_closed" => note.date_closed = Some(value),
            "status" => note.status = Some(value),
            _ => {}
        }
    }
}

/// Validate an accumulated note element. `None` means the record carried
/// no usable identity and was dropped.
fn finish_note(
    raw: RawNote,
    tile: i64,
    country: Option<&str>,
) -> Option<Result<Note, ImportError>> {
    let id = match raw
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
    {
        Some(id) => id,
        None => {
            debug!(target: TARGET_WEB_REQUEST, "Dropping note record without a usable id");
            return None;
        }
    };

    Some(validate_note(raw, id, tile, country))
}

fn validate_note(
    raw: RawNote,
    id: i64,
    tile: i64,
    country: Option<&str>,
) -> Result<Note, ImportError> {
    let lat = parse_coord(raw.lat.as_deref())
        .ok_or_else(|| ImportError::MalformedNote(format!("note {}: missing latitude", id)))?;
    let lon = parse_coord(raw.lon.as_deref())
        .ok_or_else(|| ImportError::MalformedNote(format!("note {}: missing longitude", id)))?;

    let created_at = raw
        .date_created
        .as_deref()
        .and_then(parse_timestamp)
        .ok_or_else(|| {
            ImportError::MalformedNote(format!("note {}: missing created timestamp", id))
        })?;

    let status = raw
        .status
        .as_deref()
        .and_then(NoteStatus::parse)
        .ok_or_else(|| {
            ImportError::MalformedNote(format!(
                "note {}: missing or unknown status '{}'",
                id,
                raw.status.as_deref().unwrap_or("")
            ))
        })?;

    let mut comments = Vec::with_capacity(raw.comments.len());
    for raw_comment in raw.comments {
        let timestamp = match raw_comment.date.as_deref().and_then(parse_timestamp) {
            Some(ts) => ts,
            None => {
                debug!(target: TARGET_WEB_REQUEST, "Skipping comment without a timestamp on note {}", id);
                continue;
            }
        };

        // Author is optional: anonymous comments carry neither uid nor
        // user name.
        let author_uid = raw_comment.uid.as_deref().and_then(|s| s.parse().ok());
        let author_name = raw_comment.user.filter(|name| !name.is_empty());

        comments.push(NoteComment {
            author_uid,
            author_name,
            body: raw_comment.text.unwrap_or_default(),
            created_at: timestamp,
            event: raw_comment
                .action
                .as_deref()
                .and_then(CommentEvent::parse)
                .unwrap_or(CommentEvent::Commented),
            visible: true,
        });
    }

    let updated_at = comments
        .iter()
        .map(|c| c.created_at)
        .fold(created_at, DateTime::max);

    // Prefer the explicit date_closed element; fall back to the last
    // closing action in the thread.
    let closed_at = raw.date_closed.as_deref().and_then(parse_timestamp).or_else(|| {
        if status == NoteStatus::Closed {
            comments
                .iter()
                .rev()
                .find(|c| c.event == CommentEvent::Closed)
                .map(|c| c.created_at)
        } else {
            None
        }
    });

    Ok(Note {
        id,
        lat_e7: lat,
        lon_e7: lon,
        tile,
        country: country.map(str::to_string),
        status,
        created_at,
        updated_at,
        closed_at,
        is_power_related: false,
        matched_keywords: Vec::new(),
        comments,
    })
}

fn parse_coord(value: Option<&str>) -> Option<i32> {
    let degrees: f64 = value?.trim().parse().ok()?;
    Some((degrees * COORD_SCALE).round() as i32)
}

/// Parse the timestamp formats the notes API emits: RFC 3339 plus the
/// legacy `YYYY-MM-DD HH:MM:SS UTC` form.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }

    for format in &["%Y-%m-%d %H:%M:%S UTC", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="OpenStreetMap server">
  <note lon="-74.1000000" lat="-4.6000000">
    <id>2392381</id>
    <url>https://api.openstreetmap.org/api/0.6/notes/2392381</url>
    <date_created>2024-03-02 09:15:30 UTC</date_created>
    <status>open</status>
    <comments>
      <comment>
        <date>2024-03-02 09:15:30 UTC</date>
        <uid>4417</uid>
        <user>mapera</user>
        <action>opened</action>
        <text>hay un apag&#243;n en la subestaci&#243;n</text>
      </comment>
      <comment>
        <date>2024-03-03 18:00:00 UTC</date>
        <action>commented</action>
        <text>sigue sin luz</text>
      </comment>
    </comments>
  </note>
  <note lon="12.5000000" lat="41.9000000">
    <id>911</id>
    <date_created>2024-01-10 08:00:00 UTC</date_created>
    <status>closed</status>
    <comments>
      <comment>
        <date>2024-01-10 08:00:00 UTC</date>
        <uid>77</uid>
        <user>roamer</user>
        <action>opened</action>
        <text>broken sign</text>
      </comment>
      <comment>
        <date>2024-01-12 10:30:00 UTC</date>
        <uid>78</uid>
        <user>fixer</user>
        <action>closed</action>
        <text>resolved</text>
      </comment>
    </comments>
  </note>
</osm>
"#;

    #[test]
    fn parses_a_full_page() {
        let records = parse_notes_page(SAMPLE_PAGE, 42, Some("Peru")).unwrap();
        assert_eq!(records.len(), 2);

        let note = records[0].as_ref().unwrap();
        assert_eq!(note.id, 2392381);
        assert_eq!(note.lat_e7, -46_000_000);
        assert_eq!(note.lon_e7, -741_000_000);
        assert_eq!(note.tile, 42);
        assert_eq!(note.country.as_deref(), Some("Peru"));
        assert_eq!(note.status, NoteStatus::Open);
        assert_eq!(note.comments.len(), 2);
        assert_eq!(note.comments[0].event, CommentEvent::Opened);
        assert_eq!(note.comments[0].author_uid, Some(4417));
        assert_eq!(note.comments[0].author_name.as_deref(), Some("mapera"));
        assert_eq!(note.comments[0].body, "hay un apagón en la subestación");
        // Second comment is anonymous.
        assert_eq!(note.comments[1].author_uid, None);
        assert_eq!(note.comments[1].author_name, None);
    }

    #[test]
    fn updated_at_tracks_the_latest_comment() {
        let records = parse_notes_page(SAMPLE_PAGE, 0, None).unwrap();
        let note = records[0].as_ref().unwrap();
        assert_eq!(
            note.updated_at,
            parse_timestamp("2024-03-03 18:00:00 UTC").unwrap()
        );
        assert_eq!(
            note.created_at,
            parse_timestamp("2024-03-02 09:15:30 UTC").unwrap()
        );
    }

    #[test]
    fn closed_note_takes_closed_at_from_closing_comment() {
        let records = parse_notes_page(SAMPLE_PAGE, 0, None).unwrap();
        let note = records[1].as_ref().unwrap();
        assert_eq!(note.status, NoteStatus::Closed);
        assert_eq!(
            note.closed_at,
            Some(parse_timestamp("2024-01-12 10:30:00 UTC").unwrap())
        );
    }

    #[test]
    fn explicit_date_closed_wins() {
        let xml = r#"<osm>
          <note lon="1.0" lat="2.0">
            <id>5</id>
            <date_created>2024-01-01 00:00:00 UTC</date_created>
            <date_closed>2024-02-01 00:00:00 UTC</date_closed>
            <status>closed</status>
            <comments></comments>
          </note>
        </osm>"#;
        let records = parse_notes_page(xml, 0, None).unwrap();
        let note = records[0].as_ref().unwrap();
        assert_eq!(
            note.closed_at,
            Some(parse_timestamp("2024-02-01 00:00:00 UTC").unwrap())
        );
    }

    #[test]
    fn record_without_id_is_dropped_and_rest_survive() {
        let xml = r#"<osm>
          <note lon="1.0" lat="2.0">
            <date_created>2024-01-01 00:00:00 UTC</date_created>
            <status>open</status>
            <comments></comments>
          </note>
          <note lon="3.0" lat="4.0">
            <id>99</id>
            <date_created>2024-01-02 00:00:00 UTC</date_created>
            <status>open</status>
            <comments></comments>
          </note>
        </osm>"#;
        let records = parse_notes_page(xml, 0, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap().id, 99);
    }

    #[test]
    fn record_missing_created_is_malformed() {
        let xml = r#"<osm>
          <note lon="1.0" lat="2.0">
            <id>7</id>
            <status>open</status>
            <comments></comments>
          </note>
        </osm>"#;
        let records = parse_notes_page(xml, 0, None).unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            records[0],
            Err(ImportError::MalformedNote(_))
        ));
    }

    #[test]
    fn record_missing_coordinates_is_malformed() {
        let xml = r#"<osm>
          <note>
            <id>8</id>
            <date_created>2024-01-01 00:00:00 UTC</date_created>
            <status>open</status>
            <comments></comments>
          </note>
        </osm>"#;
        let records = parse_notes_page(xml, 0, None).unwrap();
        assert!(matches!(records[0], Err(ImportError::MalformedNote(_))));
    }

    #[test]
    fn comment_without_timestamp_is_skipped_not_fatal() {
        let xml = r#"<osm>
          <note lon="1.0" lat="2.0">
            <id>12</id>
            <date_created>2024-01-01 00:00:00 UTC</date_created>
            <status>open</status>
            <comments>
              <comment>
                <action>opened</action>
                <text>no date on this one</text>
              </comment>
              <comment>
                <date>2024-01-05 00:00:00 UTC</date>
                <action>commented</action>
                <text>still here</text>
              </comment>
            </comments>
          </note>
        </osm>"#;
        let records = parse_notes_page(xml, 0, None).unwrap();
        let note = records[0].as_ref().unwrap();
        assert_eq!(note.comments.len(), 1);
        assert_eq!(note.comments[0].body, "still here");
    }

    #[test]
    fn broken_xml_is_a_page_level_error() {
        assert!(parse_notes_page("<osm><note></osm>", 0, None).is_err());
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-03-02 09:15:30 UTC").is_some());
        assert!(parse_timestamp("2024-03-02T09:15:30Z").is_some());
        assert!(parse_timestamp("2024-03-02T09:15:30+02:00").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn full_text_joins_comment_bodies() {
        let records = parse_notes_page(SAMPLE_PAGE, 0, None).unwrap();
        let note = records[0].as_ref().unwrap();
        assert_eq!(
            note.full_text(),
            "hay un apagón en la subestación sigue sin luz"
        );
    }
}
