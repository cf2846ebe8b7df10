//! Transcript stores.
//!
//! Two independent append-only logs make up a session's record: the
//! strategy log (pre-session planning dialogue between the operator and the
//! moderator) and the interview log (the simulated session itself).
//! Records are immutable once appended and never reordered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of recent records handed to the generation backend as context.
///
/// The window is a deliberate token-budget control: prompts see a suffix of
/// the transcript, never the whole log.
pub const HISTORY_WINDOW: usize = 10;

/// Identity of a speaker in the interview log.
///
/// Speaker identity is a tagged variant rather than a bare string so the
/// moderator can never collide with a persona name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name")]
pub enum Speaker {
    /// The single distinguished moderator.
    Moderator,
    /// A participant persona, identified by registry name.
    Participant(String),
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Moderator => write!(f, "Moderator"),
            Speaker::Participant(name) => write!(f, "{}", name),
        }
    }
}

/// Content of one interview speech record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SpeechContent {
    /// An ordinary generated contribution.
    Remark(String),
    /// A moderator stimulus presentation: concept material introduced
    /// mid-session for reaction.
    Stimulus {
        /// Kind of material presented ("concept", "package", "ad", ...).
        stimulus_type: String,
        /// The moderator's generated framing of the material.
        framing: String,
    },
}

impl SpeechContent {
    /// Renders the content as plain log text.
    pub fn as_log_text(&self) -> String {
        match self {
            SpeechContent::Remark(text) => text.clone(),
            SpeechContent::Stimulus {
                stimulus_type,
                framing,
            } => format!("[{}] {}", stimulus_type, framing),
        }
    }
}

/// One immutable entry of the interview log.
///
/// Sequence position is implicit in append order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRecord {
    pub speaker: Speaker,
    pub content: SpeechContent,
    /// Timestamp when the record was appended (ISO 8601 format).
    pub timestamp: String,
}

impl SpeechRecord {
    /// Creates a record stamped with the current time.
    pub fn new(speaker: Speaker, content: SpeechContent) -> Self {
        Self {
            speaker,
            content,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// The append-only interview log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    records: Vec<SpeechRecord>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Existing records are never mutated.
    pub fn append(&mut self, record: SpeechRecord) {
        self.records.push(record);
    }

    /// Returns the last `window` records (fewer if the log is shorter).
    ///
    /// The result is a suffix of `full()`: relative order is preserved,
    /// never resampled.
    pub fn recent(&self, window: usize) -> &[SpeechRecord] {
        let start = self.records.len().saturating_sub(window);
        &self.records[start..]
    }

    /// Returns the entire log, used for end-of-session analysis and export.
    pub fn full(&self) -> &[SpeechRecord] {
        &self.records
    }

    /// Clears the log wholesale.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Renders records as `Speaker: content` lines for prompt context.
    pub fn render_log(records: &[SpeechRecord]) -> String {
        records
            .iter()
            .map(|r| format!("{}: {}", r.speaker, r.content.as_log_text()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Role of one strategy-log exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyRole {
    /// The human operator planning the session.
    Operator,
    /// The moderator acknowledging an instruction.
    Moderator,
}

impl fmt::Display for StrategyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyRole::Operator => write!(f, "Operator"),
            StrategyRole::Moderator => write!(f, "Moderator"),
        }
    }
}

/// One exchange of the pre-session planning dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyExchange {
    pub role: StrategyRole,
    pub content: String,
    /// Timestamp when the exchange was appended (ISO 8601 format).
    pub timestamp: String,
}

impl StrategyExchange {
    /// Creates an exchange stamped with the current time.
    pub fn new(role: StrategyRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// The append-only strategy log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyLog {
    exchanges: Vec<StrategyExchange>,
}

impl StrategyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, exchange: StrategyExchange) {
        self.exchanges.push(exchange);
    }

    /// Returns the last `window` exchanges, as an order-preserving suffix.
    pub fn recent(&self, window: usize) -> &[StrategyExchange] {
        let start = self.exchanges.len().saturating_sub(window);
        &self.exchanges[start..]
    }

    pub fn full(&self) -> &[StrategyExchange] {
        &self.exchanges
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Renders exchanges as `Role: content` lines for prompt context.
    pub fn render_log(exchanges: &[StrategyExchange]) -> String {
        exchanges
            .iter()
            .map(|e| format!("{}: {}", e.role, e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remark(speaker: Speaker, text: &str) -> SpeechRecord {
        SpeechRecord::new(speaker, SpeechContent::Remark(text.to_string()))
    }

    #[test]
    fn test_recent_is_a_suffix_of_full() {
        let mut transcript = Transcript::new();
        for i in 0..7 {
            transcript.append(remark(
                Speaker::Participant(format!("P{}", i)),
                &format!("line {}", i),
            ));
        }

        for window in 0..10 {
            let recent = transcript.recent(window);
            let expected_len = window.min(transcript.len());
            assert_eq!(recent.len(), expected_len);
            assert_eq!(recent, &transcript.full()[transcript.len() - expected_len..]);
        }
    }

    #[test]
    fn test_recent_on_empty_transcript() {
        let transcript = Transcript::new();
        assert!(transcript.recent(5).is_empty());
    }

    #[test]
    fn test_render_log_formats_speakers() {
        let mut transcript = Transcript::new();
        transcript.append(remark(Speaker::Moderator, "Welcome everyone."));
        transcript.append(remark(Speaker::Participant("Tanaka".into()), "Hello."));

        let log = Transcript::render_log(transcript.full());
        assert_eq!(log, "Moderator: Welcome everyone.\nTanaka: Hello.");
    }

    #[test]
    fn test_stimulus_log_text() {
        let content = SpeechContent::Stimulus {
            stimulus_type: "concept".to_string(),
            framing: "Here is a new coffee idea.".to_string(),
        };
        assert_eq!(content.as_log_text(), "[concept] Here is a new coffee idea.");
    }

    #[test]
    fn test_strategy_log_roundtrip() {
        let mut log = StrategyLog::new();
        log.append(StrategyExchange::new(
            StrategyRole::Operator,
            "Probe price sensitivity early.",
        ));
        log.append(StrategyExchange::new(StrategyRole::Moderator, "Understood."));

        assert_eq!(log.len(), 2);
        assert_eq!(log.recent(1)[0].role, StrategyRole::Moderator);
        assert!(StrategyLog::render_log(log.full()).starts_with("Operator: Probe"));

        log.clear();
        assert!(log.is_empty());
    }
}
