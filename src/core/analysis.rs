//! Parsing of the structured replies returned by the analysis prompts.
//!
//! Models are asked for bare JSON but regularly wrap it in a code fence or
//! prose. None of these parsers fail: each falls back to a neutral value and
//! logs a warning.

use serde::Deserialize;
use tracing::warn;

use crate::core::state::Proficiency;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedbackError {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl FeedbackError {
    /// Lowercase category used as the common-errors key.
    pub fn category(&self) -> String {
        match self.kind.as_deref().map(str::trim) {
            Some(kind) if !kind.is_empty() => kind.to_lowercase(),
            _ => "general".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FeedbackPayload {
    #[serde(default)]
    comments: Vec<String>,
    #[serde(default)]
    errors: Vec<FeedbackError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackAnalysis {
    pub comments: Vec<String>,
    pub errors: Vec<FeedbackError>,
    /// Text exactly as the provider returned it
    pub raw: String,
    pub parsed: bool,
}

impl FeedbackAnalysis {
    /// The string pushed to the feedback list.
    pub fn summary(&self) -> String {
        if self.parsed {
            self.comments.join(" ")
        } else {
            self.raw.clone()
        }
    }

    pub fn categories(&self) -> Vec<String> {
        self.errors.iter().map(FeedbackError::category).collect()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Strip a surrounding ```json fence and any prose around the outermost object.
pub fn extract_json(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        body = rest.trim();
        if let Some(end) = body.rfind("```") {
            body = body[..end].trim();
        }
    }
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    }
}

pub fn parse_feedback(raw: &str) -> FeedbackAnalysis {
    match serde_json::from_str::<FeedbackPayload>(extract_json(raw)) {
        Ok(payload) => FeedbackAnalysis {
            comments: payload.comments,
            errors: payload.errors,
            raw: raw.to_string(),
            parsed: true,
        },
        Err(err) => {
            warn!(error = %err, "feedback reply is not JSON; keeping raw text");
            FeedbackAnalysis {
                comments: Vec::new(),
                errors: Vec::new(),
                raw: raw.to_string(),
                parsed: false,
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct LevelPayload {
    #[serde(default)]
    level: Option<String>,
}

/// Level from `{"level": "..."}` or a bare label; `Beginner` otherwise.
pub fn parse_level(raw: &str) -> Proficiency {
    let label = match serde_json::from_str::<LevelPayload>(extract_json(raw)) {
        Ok(payload) => payload.level.unwrap_or_default(),
        Err(_) => raw.trim().trim_matches('"').to_string(),
    };
    let level = Proficiency::from_label(&label);
    if level == Proficiency::Beginner && !label.trim().eq_ignore_ascii_case("beginner") {
        warn!(reply = %raw, "unrecognised proficiency reply; using beginner");
    }
    level
}

#[derive(Debug, Deserialize)]
struct GoalsPayload {
    #[serde(default)]
    goals: Vec<String>,
}

pub fn parse_goals(raw: &str) -> Vec<String> {
    match serde_json::from_str::<GoalsPayload>(extract_json(raw)) {
        Ok(payload) => payload
            .goals
            .into_iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect(),
        Err(err) => {
            warn!(error = %err, "goals reply is not JSON; keeping current goals");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_json_is_parsed() {
        let raw = r#"{"comments":["Good job.","Watch accents."],"errors":[{"type":"Grammar","note":"ser/estar"},{"note":"typo"}]}"#;
        let analysis = parse_feedback(raw);
        assert!(analysis.parsed);
        assert_eq!(analysis.summary(), "Good job. Watch accents.");
        assert_eq!(analysis.categories(), vec!["grammar", "general"]);
        assert_eq!(analysis.error_count(), 2);
    }

    #[test]
    fn feedback_falls_back_to_raw_text() {
        let analysis = parse_feedback("Looks great, no mistakes!");
        assert!(!analysis.parsed);
        assert_eq!(analysis.summary(), "Looks great, no mistakes!");
        assert!(analysis.errors.is_empty());
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"comments\":[\"Nice\"],\"errors\":[]}\n```";
        assert_eq!(extract_json(raw), "{\"comments\":[\"Nice\"],\"errors\":[]}");
        assert_eq!(parse_feedback(raw).summary(), "Nice");

        let prose = "Here you go: {\"goals\":[\"Past tense\"]} hope it helps";
        assert_eq!(parse_goals(prose), vec!["Past tense"]);
    }

    #[test]
    fn level_parsing_is_tolerant() {
        assert_eq!(parse_level(r#"{"level":"Advanced"}"#), Proficiency::Advanced);
        assert_eq!(parse_level("intermediate"), Proficiency::Intermediate);
        assert_eq!(parse_level(r#"{"level":"wizard"}"#), Proficiency::Beginner);
        assert_eq!(parse_level(""), Proficiency::Beginner);
    }

    #[test]
    fn goals_fall_back_to_empty() {
        assert!(parse_goals("not json").is_empty());
        assert!(parse_goals(r#"{"goals":[" ", ""]}"#).is_empty());
        assert_eq!(
            parse_goals(r#"{"goals":["Irregular verbs","Food vocabulary"]}"#),
            vec!["Irregular verbs", "Food vocabulary"]
        );
    }
}
