//! Event payload for `POST /users/{id}/events`.

use serde::Serialize;

use crate::localize::LocalizedRecord;

/// Wall-clock time plus the IANA zone it is expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    pub content_type: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEvent {
    pub subject: String,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
    pub body: ItemBody,
    pub categories: Vec<String>,
}

/// The fixed parts of every published event.
#[derive(Debug, Clone)]
pub struct EventTemplate {
    pub subject_prefix: String,
    pub category: String,
    pub time_zone: String,
}

impl EventTemplate {
    pub fn render(&self, localized: &LocalizedRecord) -> GraphEvent {
        let title = &localized.record.title;
        let start = localized.interval.start_string();
        let end = localized.interval.end_string();

        let content = format!(
            "Title: {}<br>Start: {}<br>End: {}<br>Duration: {} minutes",
            escape_html(title),
            start,
            end,
            localized.record.duration_minutes
        );

        GraphEvent {
            subject: format!("{}{}", self.subject_prefix, title),
            start: DateTimeTimeZone {
                date_time: start,
                time_zone: self.time_zone.clone(),
            },
            end: DateTimeTimeZone {
                date_time: end,
                time_zone: self.time_zone.clone(),
            },
            body: ItemBody {
                content_type: "HTML".to_string(),
                content,
            },
            categories: vec![self.category.clone()],
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
