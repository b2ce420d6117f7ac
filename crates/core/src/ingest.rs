//! Ingestion of edit proposals from JSON sources.
//!
//! Each source is a JSON document with a `suggestions` array; every entry
//! describes one proposed edit with the keys `model` (or `contributor`),
//! `file_path`, `start_line`, `end_line`, `old_content`, `new_content`,
//! `confidence`, `type`, and `description`. Missing fields fall back to
//! defaults. Proposals with malformed line ranges are excluded here, with a
//! warning, so the detector downstream can assume well-formed edits.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::edit::Edit;
use crate::errors::IngestError;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProposalFile {
    #[serde(default)]
    suggestions: Vec<Proposal>,
}

/// One proposal as serialized by a contributor.
#[derive(Debug, Deserialize)]
struct Proposal {
    #[serde(default = "default_contributor", alias = "contributor")]
    model: String,
    #[serde(default)]
    file_path: String,
    /// Signed so that absent (0) and nonsensical negative values are
    /// representable and can be excluded below.
    #[serde(default)]
    start_line: i64,
    #[serde(default)]
    end_line: i64,
    #[serde(default)]
    old_content: String,
    #[serde(default)]
    new_content: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default = "default_kind", rename = "type")]
    kind: String,
    #[serde(default)]
    description: String,
}

fn default_contributor() -> String {
    "unknown".to_string()
}

fn default_confidence() -> f64 {
    1.0
}

fn default_kind() -> String {
    "unknown".to_string()
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// The outcome of parsing one proposal source: the valid edits plus one
/// warning per excluded proposal.
#[derive(Debug, Clone, Default)]
pub struct ProposalBatch {
    pub edits: Vec<Edit>,
    pub warnings: Vec<String>,
}

/// Parse proposals from a JSON string. `source` names the origin for
/// warnings and errors.
pub fn parse_proposals(json: &str, source: &str) -> Result<ProposalBatch, IngestError> {
    let file: ProposalFile =
        serde_json::from_str(json).map_err(|e| IngestError::ParseError {
            path: source.to_string(),
            detail: e.to_string(),
        })?;

    let mut batch = ProposalBatch::default();
    for proposal in file.suggestions {
        if proposal.start_line < 1 || proposal.end_line < proposal.start_line {
            let message = format!(
                "proposal from '{}' in '{}' has invalid line range {}-{}; excluded",
                proposal.model, source, proposal.start_line, proposal.end_line
            );
            warn!("{message}");
            batch.warnings.push(message);
            continue;
        }

        batch.edits.push(Edit {
            contributor_id: proposal.model,
            artifact_path: proposal.file_path,
            start_line: proposal.start_line as usize,
            end_line: proposal.end_line as usize,
            original_text: proposal.old_content,
            replacement_text: proposal.new_content,
            confidence: proposal.confidence,
            kind: proposal.kind,
            note: proposal.description,
        });
    }

    debug!(
        source,
        edits = batch.edits.len(),
        excluded = batch.warnings.len(),
        "parsed proposal source"
    );
    Ok(batch)
}

/// Load and parse a proposal file from disk.
pub fn load_proposals(path: &Path) -> Result<ProposalBatch, IngestError> {
    let json = std::fs::read_to_string(path).map_err(|e| IngestError::ReadError {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    parse_proposals(&json, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_proposal() {
        let json = r#"{
            "suggestions": [{
                "model": "claude",
                "file_path": "src/app.py",
                "start_line": 3,
                "end_line": 5,
                "old_content": "pass",
                "new_content": "return 1",
                "confidence": 0.8,
                "type": "fix",
                "description": "return a value"
            }]
        }"#;
        let batch = parse_proposals(json, "test.json").unwrap();
        assert_eq!(batch.edits.len(), 1);
        assert!(batch.warnings.is_empty());

        let edit = &batch.edits[0];
        assert_eq!(edit.contributor_id, "claude");
        assert_eq!(edit.artifact_path, "src/app.py");
        assert_eq!((edit.start_line, edit.end_line), (3, 5));
        assert_eq!(edit.confidence, 0.8);
        assert_eq!(edit.kind, "fix");
    }

    #[test]
    fn test_contributor_alias_and_defaults() {
        let json = r#"{
            "suggestions": [{
                "contributor": "reviewer-1",
                "file_path": "a.py",
                "start_line": 1,
                "end_line": 1,
                "new_content": "x = 1"
            }]
        }"#;
        let batch = parse_proposals(json, "test.json").unwrap();
        let edit = &batch.edits[0];
        assert_eq!(edit.contributor_id, "reviewer-1");
        assert_eq!(edit.confidence, 1.0);
        assert_eq!(edit.kind, "unknown");
        assert!(edit.note.is_empty());
    }

    #[test]
    fn test_invalid_ranges_are_excluded_with_warnings() {
        let json = r#"{
            "suggestions": [
                {"model": "a", "file_path": "f.py", "start_line": 0, "end_line": 2, "new_content": "x"},
                {"model": "b", "file_path": "f.py", "start_line": 5, "end_line": 2, "new_content": "y"},
                {"model": "c", "file_path": "f.py", "start_line": 2, "end_line": 2, "new_content": "z"}
            ]
        }"#;
        let batch = parse_proposals(json, "test.json").unwrap();
        assert_eq!(batch.edits.len(), 1);
        assert_eq!(batch.edits[0].contributor_id, "c");
        assert_eq!(batch.warnings.len(), 2);
        assert!(batch.warnings[0].contains('a'));
        assert!(batch.warnings[1].contains('b'));
    }

    #[test]
    fn test_empty_and_malformed_documents() {
        assert!(parse_proposals("{}", "empty.json").unwrap().edits.is_empty());
        assert!(matches!(
            parse_proposals("not json", "bad.json"),
            Err(IngestError::ParseError { .. })
        ));
    }

    #[test]
    fn test_load_proposals_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"suggestions": [{{"model": "m", "file_path": "f.py",
                "start_line": 1, "end_line": 1, "new_content": "x"}}]}}"#
        )
        .unwrap();

        let batch = load_proposals(file.path()).unwrap();
        assert_eq!(batch.edits.len(), 1);

        let missing = load_proposals(Path::new("/nonexistent/suggestions.json"));
        assert!(matches!(missing, Err(IngestError::ReadError { .. })));
    }
}
