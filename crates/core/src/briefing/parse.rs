use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::briefing::{pain_points_or_placeholder, render_bullets, NO_PAIN_POINTS};
use crate::domain::brief::BriefContent;

/// A field the model may return as prose, as a list of items, or as any
/// other JSON value. Non-string items are kept in their JSON form.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldText {
    Text(String),
    Items(Vec<Value>),
    Other(Value),
}

impl FieldText {
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Items(items) => render_bullets(items.iter().map(value_text)),
            Self::Other(value) => value_text(value),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Sections recovered from an AI completion. Absent sections stay `None`
/// and receive their defaults in [`BriefPayload::into_content`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BriefPayload {
    #[serde(default, alias = "company_insights")]
    pub insights: Option<FieldText>,
    #[serde(default)]
    pub pain_points_summary: Option<FieldText>,
    #[serde(default, alias = "relevant_product_features")]
    pub relevant_features: Option<FieldText>,
    #[serde(default)]
    pub pitch_suggestions: Option<FieldText>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("completion was empty")]
    Empty,
    #[error("completion was neither JSON nor sectioned text")]
    NoRecognizableSections,
}

impl BriefPayload {
    /// Missing text sections become empty strings; a missing pain-points
    /// summary falls back to the merchant's own words.
    pub fn into_content(self, booking_pain_points: &str) -> BriefContent {
        let render = |field: Option<FieldText>| field.map(|f| f.render()).unwrap_or_default();

        let pain_points_summary = self
            .pain_points_summary
            .map(|field| field.render())
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(|| pain_points_or_placeholder(booking_pain_points, NO_PAIN_POINTS));

        BriefContent {
            insights: render(self.insights),
            pain_points_summary,
            relevant_features: render(self.relevant_features),
            pitch_suggestions: render(self.pitch_suggestions),
        }
    }

    fn is_empty(&self) -> bool {
        self.insights.is_none()
            && self.pain_points_summary.is_none()
            && self.relevant_features.is_none()
            && self.pitch_suggestions.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Insights,
    PainPoints,
    Features,
    Pitch,
}

const SECTION_TRIGGERS: &[(&str, Section)] = &[
    ("insights", Section::Insights),
    ("company analysis", Section::Insights),
    ("pain points", Section::PainPoints),
    ("features", Section::Features),
    ("pitch", Section::Pitch),
    ("suggestions", Section::Pitch),
];

/// Parses a completion as JSON first, then falls back to scanning headed
/// sections line by line.
pub fn parse_completion(raw: &str) -> Result<BriefPayload, ParseFailure> {
    let content = strip_code_fence(raw);
    if content.is_empty() {
        return Err(ParseFailure::Empty);
    }

    if let Ok(object @ Value::Object(_)) = serde_json::from_str::<Value>(content) {
        return Ok(BriefPayload::deserialize(object).unwrap_or_default());
    }

    let scanned = scan_sections(content);
    if scanned.is_empty() {
        return Err(ParseFailure::NoRecognizableSections);
    }
    Ok(scanned)
}

fn strip_code_fence(raw: &str) -> &str {
    let mut content = raw.trim();
    if let Some(rest) = content.strip_prefix("```") {
        content = rest.strip_prefix("json").or_else(|| rest.strip_prefix("JSON")).unwrap_or(rest);
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim()
}

fn section_for(line: &str) -> Option<Section> {
    let lower = line.to_lowercase();
    SECTION_TRIGGERS
        .iter()
        .find(|(trigger, _)| lower.contains(trigger))
        .map(|(_, section)| *section)
}

/// Text after the first colon of a heading line, without markdown emphasis.
fn heading_remainder(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once(':')?;
    let rest = rest.trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace());
    (!rest.is_empty()).then_some(rest)
}

/// Lines before the first heading are dropped. A heading keeps only the text
/// after its colon, as the first line of its section.
fn scan_sections(content: &str) -> BriefPayload {
    let mut current: Option<Section> = None;
    let mut insights = Vec::new();
    let mut pain_points = Vec::new();
    let mut features = Vec::new();
    let mut pitch = Vec::new();

    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let line = match section_for(line) {
            Some(section) => {
                current = Some(section);
                match heading_remainder(line) {
                    Some(rest) => rest,
                    None => continue,
                }
            }
            None => line,
        };

        match current {
            Some(Section::Insights) => insights.push(line),
            Some(Section::PainPoints) => pain_points.push(line),
            Some(Section::Features) => features.push(line),
            Some(Section::Pitch) => pitch.push(line),
            None => {}
        }
    }

    let collect = |lines: Vec<&str>| -> Option<FieldText> {
        (!lines.is_empty()).then(|| FieldText::Text(lines.join("\n")))
    };

    BriefPayload {
        insights: collect(insights),
        pain_points_summary: collect(pain_points),
        relevant_features: collect(features),
        pitch_suggestions: collect(pitch),
    }
}
