//! Transcript and report export.
//!
//! Builds the artifact bytes in memory first and only then touches the
//! filesystem, so a serialization failure never leaves a partial file
//! behind.

use fgi_core::error::{FgiError, Result};
use fgi_core::session::Session;
use std::path::{Path, PathBuf};

/// A finished export artifact: a suggested filename plus its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Export {
    /// Writes the artifact into `dir` and returns the resulting path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

fn timestamp_slug() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Serializes the interview transcript as CSV with a `speaker,content`
/// header, one row per speech record in session order.
///
/// Stimulus presentations are flattened to their log text so the CSV
/// stays two columns wide.
///
/// # Errors
///
/// `Precondition` when the interview log is empty, `Serialization` when
/// CSV encoding fails.
pub fn transcript_csv(session: &Session) -> Result<Export> {
    let records = session.interview_log.full();
    if records.is_empty() {
        return Err(FgiError::precondition(
            "nothing to export: the interview log is empty",
        ));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["speaker", "content"])
        .map_err(csv_error)?;
    for record in records {
        writer
            .write_record([record.speaker.to_string(), record.content.as_log_text()])
            .map_err(csv_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| FgiError::serialization("CSV", e.to_string()))?;

    tracing::info!(target: "fgi::export", rows = records.len(), "transcript serialized");

    Ok(Export {
        filename: format!("fgi_log_{}.csv", timestamp_slug()),
        bytes,
    })
}

/// Packages the cached insight report as a Markdown document.
///
/// # Errors
///
/// `Precondition` until the report has been synthesized.
pub fn report_markdown(session: &Session) -> Result<Export> {
    let analysis = session.analysis.as_deref().ok_or_else(|| {
        FgiError::precondition("no insight report has been synthesized yet")
    })?;

    let body = format!(
        "# Focus Group Insight Report\n\n## Topic\n\n{}\n\n## Analysis\n\n{}\n",
        session.config.topic, analysis
    );

    Ok(Export {
        filename: format!("fgi_report_{}.md", timestamp_slug()),
        bytes: body.into_bytes(),
    })
}

fn csv_error(err: csv::Error) -> FgiError {
    FgiError::serialization("CSV", err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgi_core::session::SessionConfig;
    use fgi_core::transcript::{Speaker, SpeechContent, SpeechRecord};

    fn session_with_log() -> Session {
        let mut session = Session::new(SessionConfig::new("topic", 60, 3));
        session.interview_log.append(SpeechRecord::new(
            Speaker::Moderator,
            SpeechContent::Remark("Welcome, everyone.".into()),
        ));
        session.interview_log.append(SpeechRecord::new(
            Speaker::Participant("Tanaka".into()),
            SpeechContent::Remark("Happy to be here, though I have doubts.".into()),
        ));
        session.interview_log.append(SpeechRecord::new(
            Speaker::Moderator,
            SpeechContent::Stimulus {
                stimulus_type: "concept".into(),
                framing: "Here is the product concept.".into(),
            },
        ));
        session
    }

    #[test]
    fn test_transcript_csv_rows_and_header() {
        let export = transcript_csv(&session_with_log()).unwrap();
        assert!(export.filename.starts_with("fgi_log_"));
        assert!(export.filename.ends_with(".csv"));

        let text = String::from_utf8(export.bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "speaker,content");
        assert_eq!(lines[1], "Moderator,\"Welcome, everyone.\"");
        assert!(lines[2].starts_with("Tanaka,"));
        assert_eq!(lines[3], "Moderator,[concept] Here is the product concept.");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_transcript_csv_rejects_empty_log() {
        let session = Session::new(SessionConfig::default());
        assert!(transcript_csv(&session).unwrap_err().is_precondition());
    }

    #[test]
    fn test_report_markdown_requires_analysis() {
        let mut session = session_with_log();
        assert!(report_markdown(&session).unwrap_err().is_precondition());

        session.analysis = Some("Pains: too expensive.".into());
        let export = report_markdown(&session).unwrap();
        assert!(export.filename.starts_with("fgi_report_"));
        let text = String::from_utf8(export.bytes).unwrap();
        assert!(text.contains("## Topic\n\ntopic"));
        assert!(text.contains("Pains: too expensive."));
    }

    #[test]
    fn test_write_to_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let export = transcript_csv(&session_with_log()).unwrap();
        let path = export.write_to(dir.path()).unwrap();
        assert!(path.exists());
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk, export.bytes);
    }
}
