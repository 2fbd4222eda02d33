//! Progress heuristics applied after every completed turn.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;

use crate::core::state::{JournalEntry, ProgressHistoryPoint, ProgressState};

pub const MAX_SCORE: u32 = 100;
pub const MAX_VOCABULARY_DELTA: u32 = 10;
pub const MIN_WORD_CHARS: usize = 4;
pub const GRAMMAR_BASELINE: u32 = 5;

/// Distinct words of four or more letters in `text`, at most ten.
///
/// Words are runs of alphabetic characters, so accented Latin and other
/// scripts count as letters while digits and punctuation split words.
pub fn vocabulary_delta(text: &str) -> u32 {
    let lowered = text.to_lowercase();
    let distinct: HashSet<&str> = lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| word.chars().count() >= MIN_WORD_CHARS)
        .collect();
    (distinct.len() as u32).min(MAX_VOCABULARY_DELTA)
}

pub fn grammar_delta(error_count: usize) -> u32 {
    GRAMMAR_BASELINE.saturating_sub(error_count.min(u32::MAX as usize) as u32)
}

pub fn should_journal(vocabulary_delta: u32, grammar_delta: u32) -> bool {
    vocabulary_delta >= 5 || grammar_delta >= 3
}

/// Whole minutes between `start` and `now`; never negative.
pub fn elapsed_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - start).num_minutes().max(0) as u64
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub vocabulary_delta: u32,
    pub grammar_delta: u32,
    pub progress: ProgressState,
    pub history_point: ProgressHistoryPoint,
    pub journal_entry: Option<JournalEntry>,
}

/// Inputs for one progress recomputation.
#[derive(Debug, Clone, Copy)]
pub struct TurnMetrics<'a> {
    pub user_text: &'a str,
    pub error_count: usize,
    pub message_count: usize,
    pub language: &'a str,
    pub session_start: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

pub fn advance(current: &ProgressState, metrics: TurnMetrics<'_>) -> ProgressUpdate {
    let vocabulary_delta = vocabulary_delta(metrics.user_text);
    let grammar_delta = grammar_delta(metrics.error_count);

    let progress = ProgressState {
        vocabulary: current.vocabulary.saturating_add(vocabulary_delta).min(MAX_SCORE),
        grammar: current.grammar.saturating_add(grammar_delta).min(MAX_SCORE),
        duration: elapsed_minutes(metrics.session_start, metrics.now),
    };

    let history_point = ProgressHistoryPoint {
        t: metrics.now.timestamp_millis(),
        vocabulary: progress.vocabulary,
        grammar: progress.grammar,
        duration: progress.duration,
    };

    let journal_entry = should_journal(vocabulary_delta, grammar_delta).then(|| JournalEntry {
        date: metrics.now.to_rfc3339_opts(SecondsFormat::Millis, true),
        summary: format!(
            "Reached {} messages in {}: +{} vocabulary, +{} grammar",
            metrics.message_count, metrics.language, vocabulary_delta, grammar_delta
        ),
    });

    ProgressUpdate {
        vocabulary_delta,
        grammar_delta,
        progress,
        history_point,
        journal_entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn metrics(text: &str, errors: usize, minutes: i64) -> TurnMetrics<'_> {
        TurnMetrics {
            user_text: text,
            error_count: errors,
            message_count: 2,
            language: "spanish",
            session_start: at(0),
            now: at(minutes),
        }
    }

    #[test]
    fn vocabulary_counts_distinct_long_words() {
        assert_eq!(vocabulary_delta("Hola amigo como estas"), 4);
        assert_eq!(vocabulary_delta("Hola hola HOLA"), 1);
        assert_eq!(vocabulary_delta("yo soy de aqui"), 1);
        assert_eq!(vocabulary_delta(""), 0);
    }

    #[test]
    fn vocabulary_splits_on_non_letters_and_keeps_accents() {
        assert_eq!(vocabulary_delta("¿Qué tal? Estás-bien, mañana123árbol"), 4);
        assert_eq!(vocabulary_delta("niño"), 1);
    }

    #[test]
    fn vocabulary_is_capped() {
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima mike";
        assert_eq!(vocabulary_delta(text), MAX_VOCABULARY_DELTA);
    }

    #[test]
    fn grammar_delta_decreases_with_errors() {
        assert_eq!(grammar_delta(0), 5);
        assert_eq!(grammar_delta(2), 3);
        assert_eq!(grammar_delta(7), 0);
    }

    #[test]
    fn journal_threshold() {
        assert!(should_journal(5, 0));
        assert!(should_journal(0, 3));
        assert!(!should_journal(4, 2));
    }

    #[test]
    fn advance_applies_deltas_and_records_history() {
        let current = ProgressState::default();
        let update = advance(&current, metrics("Hola amigo como estas", 0, 3));

        assert_eq!(update.progress.vocabulary, 24);
        assert_eq!(update.progress.grammar, 35);
        assert_eq!(update.progress.duration, 3);
        assert_eq!(update.history_point.t, at(3).timestamp_millis());
        assert_eq!(update.history_point.vocabulary, 24);

        let entry = update.journal_entry.expect("grammar delta 5 writes a journal entry");
        assert!(entry.summary.contains("spanish"));
        assert!(entry.summary.contains("+4 vocabulary"));
        assert!(entry.date.starts_with("2026-03-01T09:03:00"));
    }

    #[test]
    fn advance_clamps_and_skips_journal_below_threshold() {
        let current = ProgressState {
            vocabulary: 98,
            grammar: 100,
            duration: 0,
        };
        let update = advance(&current, metrics("si", 4, 0));
        assert_eq!(update.progress.vocabulary, 98);
        assert_eq!(update.progress.grammar, 100);
        assert!(update.journal_entry.is_none());

        let update = advance(&current, metrics("palabras nuevas", 9, 1));
        assert_eq!(update.progress.vocabulary, 100);
    }

    #[test]
    fn advance_saturates_out_of_range_scores() {
        let current = ProgressState {
            vocabulary: u32::MAX,
            grammar: 30,
            duration: 0,
        };
        let update = advance(&current, metrics("palabra", 0, 2));
        assert_eq!(update.progress.vocabulary, MAX_SCORE);
        assert_eq!(update.progress.grammar, 35);
        assert_eq!(update.history_point.vocabulary, MAX_SCORE);
    }

    #[test]
    fn elapsed_minutes_never_negative() {
        assert_eq!(elapsed_minutes(at(5), at(0)), 0);
        assert_eq!(elapsed_minutes(at(0), at(0) + Duration::seconds(119)), 1);
    }
}
