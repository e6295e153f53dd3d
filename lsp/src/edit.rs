//! Workspace edit application: rewrites files from a structured edit plan.
//!
//! This is the security boundary for file modifications. Generating a plan
//! (e.g. via rename) never touches disk; only an explicit pass through
//! [`apply_plan`] writes, and every written file is re-synchronized with the
//! backend afterwards.
//!
//! Edits are applied in strictly descending start-position order so that
//! already-applied edits never shift the line/character coordinates of
//! edits not yet processed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PlanError;
use crate::protocol::file_uri_to_path;
use crate::sync::DocumentSync;

/// A zero-based line/character position, ordered by line then character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextEdit {
    pub range: Range,
    #[serde(rename = "newText")]
    pub new_text: String,
}

/// Wire shape of a WorkspaceEdit, accepting both recognized formats.
#[derive(Debug, Deserialize)]
struct WorkspaceEditWire {
    changes: Option<HashMap<String, Vec<TextEdit>>>,
    #[serde(rename = "documentChanges")]
    document_changes: Option<Vec<DocumentChange>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentChange {
    Edit(TextDocumentEdit),
    /// Resource operation (create/rename/delete). Recognized but
    /// unimplemented: logged and skipped.
    Resource {
        kind: String,
    },
}

#[derive(Debug, Deserialize)]
struct TextDocumentEdit {
    #[serde(rename = "textDocument")]
    text_document: DocumentIdentifier,
    #[serde(default)]
    edits: Vec<TextEdit>,
}

#[derive(Debug, Deserialize)]
struct DocumentIdentifier {
    uri: String,
}

/// A normalized edit plan: per-file ordered edit lists.
///
/// Immutable once constructed; handed to [`apply_plan`] exactly once.
#[derive(Debug)]
pub struct EditPlan {
    files: Vec<(PathBuf, Vec<TextEdit>)>,
}

impl EditPlan {
    /// Normalize a raw WorkspaceEdit value into a plan.
    ///
    /// Accepts either the flat `changes` map or the structured
    /// `documentChanges` array. A value matching neither is a malformed
    /// plan. Resource operations inside `documentChanges` are skipped with
    /// a warning.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, PlanError> {
        let wire: WorkspaceEditWire =
            serde_json::from_value(value.clone()).map_err(|_| PlanError::Malformed)?;

        let mut files = Vec::new();

        if let Some(changes) = wire.changes {
            // Deterministic application order across runs.
            let mut entries: Vec<_> = changes.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (uri, edits) in entries {
                files.push((Self::resolve_uri(&uri)?, edits));
            }
        } else if let Some(document_changes) = wire.document_changes {
            for change in document_changes {
                match change {
                    DocumentChange::Edit(edit) => {
                        files.push((Self::resolve_uri(&edit.text_document.uri)?, edit.edits));
                    }
                    DocumentChange::Resource { kind } => {
                        tracing::warn!(
                            kind,
                            "skipping resource operation: file create/rename/delete not implemented"
                        );
                    }
                }
            }
        } else {
            return Err(PlanError::Malformed);
        }

        Ok(Self { files })
    }

    fn resolve_uri(uri: &str) -> Result<PathBuf, PlanError> {
        file_uri_to_path(uri).ok_or_else(|| PlanError::BadUri {
            uri: uri.to_string(),
        })
    }

    /// Target files in application order.
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(p, _)| p.as_path())
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Line terminator styles, tracked per line.
///
/// A single file may legitimately mix terminators; each line keeps its own
/// so untouched ranges round-trip byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Lf,
    CrLf,
    /// Final line with no trailing newline.
    None,
}

impl Terminator {
    fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::None => "",
        }
    }
}

/// One line of a file under edit: content without its terminator, plus the
/// terminator as a first-class attribute.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    terminator: Terminator,
}

impl Line {
    fn new(text: impl Into<String>, terminator: Terminator) -> Self {
        Self {
            text: text.into(),
            terminator,
        }
    }
}

fn split_lines(content: &str) -> Vec<Line> {
    content
        .split_inclusive('\n')
        .map(|chunk| {
            if let Some(body) = chunk.strip_suffix("\r\n") {
                Line::new(body, Terminator::CrLf)
            } else if let Some(body) = chunk.strip_suffix('\n') {
                Line::new(body, Terminator::Lf)
            } else {
                Line::new(chunk, Terminator::None)
            }
        })
        .collect()
}

fn join_lines(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.text);
        out.push_str(line.terminator.as_str());
    }
    out
}

/// Byte offset of character position `col` in `text`, clamped to the end.
///
/// Character offsets are interpreted as Unicode scalar positions, the same
/// unit the backend reports for the sources we target.
fn byte_offset(text: &str, col: u32) -> usize {
    text.char_indices()
        .nth(col as usize)
        .map_or(text.len(), |(i, _)| i)
}

/// Splice one edit into the line sequence.
fn apply_single_edit(lines: &mut Vec<Line>, edit: &TextEdit) {
    // An empty file is a single empty line for editing purposes.
    if lines.is_empty() {
        lines.push(Line::new("", Terminator::None));
    }

    let start = edit.range.start;
    let end = edit.range.end;
    let last_needed = start.line.max(end.line) as usize;

    // Out-of-range positions pad with empty lines rather than erroring.
    while lines.len() <= last_needed {
        lines.push(Line::new("", Terminator::Lf));
    }

    let start_line = &lines[start.line as usize];
    let end_line = &lines[end.line as usize];

    let prefix = &start_line.text[..byte_offset(&start_line.text, start.character)];
    let suffix = &end_line.text[byte_offset(&end_line.text, end.character)..];
    let start_term = start_line.terminator;
    let end_term = end_line.terminator;

    let combined = format!("{prefix}{}{suffix}", edit.new_text);

    // Re-split on internal line breaks: every produced line except the
    // last keeps the start line's terminator style, the last keeps the
    // end line's.
    let segments: Vec<&str> = combined.split('\n').collect();
    let last_index = segments.len() - 1;
    let replacement: Vec<Line> = segments
        .into_iter()
        .enumerate()
        .map(|(i, seg)| {
            let seg = seg.strip_suffix('\r').unwrap_or(seg);
            if i == last_index {
                Line::new(seg, end_term)
            } else {
                Line::new(seg, start_term)
            }
        })
        .collect();

    lines.splice(start.line as usize..=end.line as usize, replacement);
}

/// Reject edit lists with reversed or overlapping ranges.
///
/// A range whose end precedes its start would splice a backwards line
/// interval; descending-order application would silently mask an overlap.
/// Either way, better to refuse the whole file than to write a
/// half-scrambled result. Plans arrive as arbitrary caller JSON, so both
/// are input errors, not internal invariants.
fn check_ranges(path: &Path, sorted_desc: &[TextEdit]) -> Result<(), PlanError> {
    for edit in sorted_desc {
        if edit.range.end < edit.range.start {
            return Err(PlanError::ReversedRange {
                path: path.to_path_buf(),
            });
        }
    }
    for pair in sorted_desc.windows(2) {
        // pair[0] starts at or after pair[1] (descending sort).
        if pair[1].range.end > pair[0].range.start {
            return Err(PlanError::OverlappingEdits {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Apply one file's edits to `content`, returning the new content.
///
/// Pure: the same content and edit list always produce the same output,
/// regardless of the order the edits were listed in.
pub fn apply_edits(path: &Path, content: &str, edits: &[TextEdit]) -> Result<String, PlanError> {
    let mut sorted = edits.to_vec();
    sorted.sort_by(|a, b| b.range.start.cmp(&a.range.start));
    check_ranges(path, &sorted)?;

    let mut lines = split_lines(content);
    for edit in &sorted {
        apply_single_edit(&mut lines, edit);
    }
    Ok(join_lines(&lines))
}

async fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("refactor-tmp");
    tokio::fs::write(&tmp, content).await?;
    match tokio::fs::rename(&tmp, path).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = tokio::fs::remove_file(&tmp).await;
            Err(e)
        }
    }
}

/// Apply a plan to disk and return the list of modified files.
///
/// Files are processed in plan order; a failure aborts the remaining files
/// but does not roll back files already written (no cross-file
/// transaction). After each write the document sync manager is informed so
/// the backend's model tracks the new content; a sync failure is logged
/// but does not fail the apply, because the disk write already succeeded.
pub async fn apply_plan(plan: &EditPlan, sync: &DocumentSync) -> Result<Vec<PathBuf>, PlanError> {
    let mut modified = Vec::new();

    for (path, edits) in &plan.files {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| PlanError::Io {
                path: path.clone(),
                source,
            })?;
        if !exists {
            return Err(PlanError::MissingTarget { path: path.clone() });
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|source| {
            PlanError::Io {
                path: path.clone(),
                source,
            }
        })?;

        let new_content = apply_edits(path, &content, edits)?;

        write_atomic(path, &new_content)
            .await
            .map_err(|source| PlanError::Io {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), edits = edits.len(), "applied edits");

        if let Err(e) = sync.notify_changed(path, &new_content).await {
            tracing::warn!(path = %path.display(), "failed to re-sync backend after edit: {e}");
        }

        modified.push(path.clone());
    }

    Ok(modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FrameReader, FrameWriter};
    use crate::process::Supervisor;
    use crate::session::Session;
    use std::sync::Arc;
    use std::time::Duration;

    fn edit(start: (u32, u32), end: (u32, u32), text: &str) -> TextEdit {
        TextEdit {
            range: Range {
                start: Position {
                    line: start.0,
                    character: start.1,
                },
                end: Position {
                    line: end.0,
                    character: end.1,
                },
            },
            new_text: text.to_string(),
        }
    }

    fn p(path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    // ── line model ─────────────────────────────────────────────────────

    #[test]
    fn split_preserves_mixed_terminators() {
        let content = "unix\nwindows\r\nnone";
        let lines = split_lines(content);
        assert_eq!(lines.len(), 3);
        assert_eq!((lines[0].text.as_str(), lines[0].terminator), ("unix", Terminator::Lf));
        assert_eq!(
            (lines[1].text.as_str(), lines[1].terminator),
            ("windows", Terminator::CrLf)
        );
        assert_eq!(
            (lines[2].text.as_str(), lines[2].terminator),
            ("none", Terminator::None)
        );
        assert_eq!(join_lines(&lines), content);
    }

    #[test]
    fn split_empty_content_is_no_lines() {
        assert!(split_lines("").is_empty());
    }

    // ── apply_edits ────────────────────────────────────────────────────

    #[test]
    fn single_line_replacement() {
        let result = apply_edits(&p("t.py"), "hello world", &[edit((0, 0), (0, 5), "hi")]).unwrap();
        assert_eq!(result, "hi world");
    }

    #[test]
    fn multi_line_splice() {
        let content = "line one\nline two\nline three\n";
        let result = apply_edits(&p("t.py"), content, &[edit((0, 5), (1, 8), "1\n2")]).unwrap();
        assert_eq!(result, "line 1\n2\nline three\n");
    }

    #[test]
    fn empty_file_insert() {
        let result = apply_edits(&p("t.py"), "", &[edit((0, 0), (0, 0), "new content")]).unwrap();
        assert_eq!(result, "new content");
    }

    #[test]
    fn empty_edit_list_is_byte_identical() {
        let content = "a\r\nb\nc";
        assert_eq!(apply_edits(&p("t.py"), content, &[]).unwrap(), content);
    }

    #[test]
    fn crlf_terminators_survive_edits() {
        let content = "first\r\nsecond\r\nthird\r\n";
        let result = apply_edits(&p("t.py"), content, &[edit((1, 0), (1, 6), "SECOND")]).unwrap();
        assert_eq!(result, "first\r\nSECOND\r\nthird\r\n");
    }

    #[test]
    fn mixed_terminators_round_trip_outside_touched_range() {
        let content = "one\ntwo\r\nthree";
        let result = apply_edits(&p("t.py"), content, &[edit((0, 0), (0, 3), "ONE")]).unwrap();
        assert_eq!(result, "ONE\ntwo\r\nthree");
    }

    #[test]
    fn insertion_with_newline_keeps_terminator_styles() {
        // Inserting "a\nb" inside a CRLF line: first produced line keeps
        // the start line's CRLF, last keeps the end line's CRLF.
        let content = "xy\r\n";
        let result = apply_edits(&p("t.py"), content, &[edit((0, 1), (0, 1), "a\nb")]).unwrap();
        assert_eq!(result, "xa\r\nby\r\n");
    }

    #[test]
    fn multiple_edits_applied_descending_regardless_of_input_order() {
        let content = "alpha beta gamma\n";
        let edits_fwd = vec![edit((0, 0), (0, 5), "A"), edit((0, 11), (0, 16), "G")];
        let edits_rev = vec![edit((0, 11), (0, 16), "G"), edit((0, 0), (0, 5), "A")];
        let a = apply_edits(&p("t.py"), content, &edits_fwd).unwrap();
        let b = apply_edits(&p("t.py"), content, &edits_rev).unwrap();
        assert_eq!(a, "A beta G\n");
        assert_eq!(a, b);
    }

    #[test]
    fn idempotent_under_dry_reread() {
        // Applying the same plan to a fresh copy of the pre-edit content
        // always yields the same output.
        let content = "def old_name():\n    return old_name\n";
        let edits = vec![
            edit((0, 4), (0, 12), "renamed"),
            edit((1, 11), (1, 19), "renamed"),
        ];
        let first = apply_edits(&p("t.py"), content, &edits).unwrap();
        let second = apply_edits(&p("t.py"), content, &edits).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "def renamed():\n    return renamed\n");
    }

    #[test]
    fn edit_beyond_line_count_pads_with_empty_lines() {
        let result = apply_edits(&p("t.py"), "only\n", &[edit((3, 0), (3, 0), "late")]).unwrap();
        assert_eq!(result, "only\n\n\nlate\n");
    }

    #[test]
    fn multibyte_characters_use_scalar_offsets() {
        let content = "κόσμε world\n";
        let result = apply_edits(&p("t.py"), content, &[edit((0, 0), (0, 5), "hello")]).unwrap();
        assert_eq!(result, "hello world\n");
    }

    #[test]
    fn reversed_range_rejected() {
        // end line before start line
        let err = apply_edits(&p("t.py"), "a\nb\nc\n", &[edit((3, 0), (1, 0), "x")]).unwrap_err();
        assert!(matches!(err, PlanError::ReversedRange { .. }));

        // adjacent-line reversal: would degenerate to an empty splice and
        // silently mis-apply rather than panicking
        let err = apply_edits(&p("t.py"), "a\nb\nc\n", &[edit((2, 0), (1, 0), "x")]).unwrap_err();
        assert!(matches!(err, PlanError::ReversedRange { .. }));

        // same line, end character before start character
        let err = apply_edits(&p("t.py"), "abcdef\n", &[edit((0, 4), (0, 2), "x")]).unwrap_err();
        assert!(matches!(err, PlanError::ReversedRange { .. }));
    }

    #[test]
    fn overlapping_ranges_rejected() {
        let content = "abcdefgh\n";
        let edits = vec![edit((0, 0), (0, 4), "x"), edit((0, 2), (0, 6), "y")];
        let err = apply_edits(&p("t.py"), content, &edits).unwrap_err();
        assert!(matches!(err, PlanError::OverlappingEdits { .. }));
    }

    #[test]
    fn touching_ranges_are_not_overlapping() {
        let content = "abcdef\n";
        let edits = vec![edit((0, 0), (0, 3), "x"), edit((0, 3), (0, 6), "y")];
        assert_eq!(apply_edits(&p("t.py"), content, &edits).unwrap(), "xy\n");
    }

    // ── plan normalization ─────────────────────────────────────────────

    #[test]
    fn plan_from_changes_map() {
        let value = serde_json::json!({
            "changes": {
                "file:///tmp/a.py": [
                    { "range": { "start": {"line": 0, "character": 0},
                                 "end": {"line": 0, "character": 1} },
                      "newText": "x" }
                ]
            }
        });
        let plan = EditPlan::from_value(&value).unwrap();
        assert_eq!(plan.targets().collect::<Vec<_>>(), vec![Path::new("/tmp/a.py")]);
    }

    #[test]
    fn plan_from_document_changes() {
        let value = serde_json::json!({
            "documentChanges": [
                {
                    "textDocument": { "uri": "file:///tmp/b.py", "version": 4 },
                    "edits": []
                }
            ]
        });
        let plan = EditPlan::from_value(&value).unwrap();
        assert_eq!(plan.targets().collect::<Vec<_>>(), vec![Path::new("/tmp/b.py")]);
    }

    #[test]
    fn plan_skips_resource_operations() {
        let value = serde_json::json!({
            "documentChanges": [
                { "kind": "rename", "oldUri": "file:///tmp/a.py", "newUri": "file:///tmp/b.py" },
                {
                    "textDocument": { "uri": "file:///tmp/c.py" },
                    "edits": []
                },
                { "kind": "delete", "uri": "file:///tmp/d.py" }
            ]
        });
        let plan = EditPlan::from_value(&value).unwrap();
        assert_eq!(plan.targets().collect::<Vec<_>>(), vec![Path::new("/tmp/c.py")]);
    }

    #[test]
    fn plan_with_neither_shape_is_malformed() {
        let err = EditPlan::from_value(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, PlanError::Malformed));

        let err = EditPlan::from_value(&serde_json::json!({"something": "else"})).unwrap_err();
        assert!(matches!(err, PlanError::Malformed));
    }

    #[test]
    fn plan_rejects_non_file_uri() {
        let value = serde_json::json!({
            "changes": { "https://example.com/a.py": [] }
        });
        let err = EditPlan::from_value(&value).unwrap_err();
        assert!(matches!(err, PlanError::BadUri { .. }));
    }

    // ── apply_plan (disk) ──────────────────────────────────────────────

    /// Session over duplex streams with a backend that answers the
    /// handshake and swallows notifications.
    async fn stub_sync() -> DocumentSync {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        tokio::spawn(async move {
            let (read_half, write_half) = tokio::io::split(server_io);
            let mut reader = FrameReader::new(read_half);
            let mut writer = FrameWriter::new(write_half);
            while let Ok(Some(frame)) = reader.read_frame().await {
                if frame["method"] == "initialize" {
                    let reply = serde_json::json!({
                        "jsonrpc": "2.0",
                        "id": frame["id"],
                        "result": { "capabilities": {} }
                    });
                    let _ = writer.write_frame(&reply).await;
                }
            }
        });
        let (read_half, write_half) = tokio::io::split(client_io);
        let session = Session::over_streams(
            read_half,
            write_half,
            Supervisor::detached(),
            Duration::from_secs(5),
        );
        session.initialize(Path::new("/tmp")).await.unwrap();
        DocumentSync::new(Arc::new(session), "python".to_string())
    }

    fn uri_for(path: &Path) -> String {
        url::Url::from_file_path(path).unwrap().to_string()
    }

    #[tokio::test]
    async fn apply_plan_writes_files() {
        let sync = stub_sync().await;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.py");
        std::fs::write(&file, "hello world").unwrap();

        let value = serde_json::json!({
            "changes": {
                uri_for(&file): [
                    { "range": { "start": {"line": 0, "character": 0},
                                 "end": {"line": 0, "character": 5} },
                      "newText": "hi" }
                ]
            }
        });
        let plan = EditPlan::from_value(&value).unwrap();
        let modified = apply_plan(&plan, &sync).await.unwrap();

        assert_eq!(modified.len(), 1);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "hi world");
    }

    #[tokio::test]
    async fn apply_plan_missing_target_keeps_earlier_writes() {
        let sync = stub_sync().await;
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.py");
        std::fs::write(&present, "hello world").unwrap();
        let absent = dir.path().join("missing.py");

        // documentChanges preserves plan order: present first, then the
        // missing target.
        let value = serde_json::json!({
            "documentChanges": [
                {
                    "textDocument": { "uri": uri_for(&present) },
                    "edits": [
                        { "range": { "start": {"line": 0, "character": 0},
                                     "end": {"line": 0, "character": 5} },
                          "newText": "hi" }
                    ]
                },
                {
                    "textDocument": { "uri": uri_for(&absent) },
                    "edits": []
                }
            ]
        });
        let plan = EditPlan::from_value(&value).unwrap();
        let err = apply_plan(&plan, &sync).await.unwrap_err();

        assert!(matches!(err, PlanError::MissingTarget { .. }));
        // No rollback: the first file stays modified.
        assert_eq!(std::fs::read_to_string(&present).unwrap(), "hi world");
    }

    #[tokio::test]
    async fn apply_plan_unreadable_target_is_io_not_missing() {
        let sync = stub_sync().await;
        let dir = tempfile::tempdir().unwrap();
        // A regular file used as a path component: probing beneath it
        // fails with NotADirectory, which must surface as an I/O error
        // naming the path, not as a missing target.
        let blocker = dir.path().join("blocker.py");
        std::fs::write(&blocker, "x = 1\n").unwrap();
        let target = blocker.join("inner.py");

        let value = serde_json::json!({ "changes": { uri_for(&target): [] } });
        let plan = EditPlan::from_value(&value).unwrap();
        let err = apply_plan(&plan, &sync).await.unwrap_err();

        match err {
            PlanError::Io { path, .. } => assert_eq!(path, target),
            other => panic!("expected Io, got {other}"),
        }
    }

    #[tokio::test]
    async fn apply_plan_with_empty_edits_leaves_content_identical() {
        let sync = stub_sync().await;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "line\r\nmixed\nend").unwrap();

        let value = serde_json::json!({ "changes": { uri_for(&file): [] } });
        let plan = EditPlan::from_value(&value).unwrap();
        apply_plan(&plan, &sync).await.unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "line\r\nmixed\nend");
    }

    #[tokio::test]
    async fn apply_plan_multi_file() {
        let sync = stub_sync().await;
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("b.py");
        std::fs::write(&a, "old = 1\n").unwrap();
        std::fs::write(&b, "use(old)\n").unwrap();

        let value = serde_json::json!({
            "changes": {
                uri_for(&a): [
                    { "range": { "start": {"line": 0, "character": 0},
                                 "end": {"line": 0, "character": 3} },
                      "newText": "new" }
                ],
                uri_for(&b): [
                    { "range": { "start": {"line": 0, "character": 4},
                                 "end": {"line": 0, "character": 7} },
                      "newText": "new" }
                ]
            }
        });
        let plan = EditPlan::from_value(&value).unwrap();
        let modified = apply_plan(&plan, &sync).await.unwrap();

        assert_eq!(modified.len(), 2);
        assert_eq!(std::fs::read_to_string(&a).unwrap(), "new = 1\n");
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "use(new)\n");
    }
}
