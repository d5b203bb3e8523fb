//! Portable JSON export of the session in view.
//!
//! Producing the bytes and the filename is pure. Writing them somewhere is a
//! separate step ([`ExportArtifact::write_to`]) so a GUI shell can offer the
//! bytes as a download instead.

use crate::core::{Sample, SessionId, SessionSnapshot};
use crate::polling::DashboardView;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Filename prefix for exported sessions.
pub const EXPORT_PREFIX: &str = "wili-study-";

/// Shape of the exported document.
#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    session: &'a SessionId,
    dashboard: &'a SessionSnapshot,
    focus_history: &'a [Sample],
    exported_at: String,
}

/// Serialized export ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Download name, e.g. `wili-study-2024-05-01T10:00:00.000Z.json`
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Name used on disk: the download name with `:` replaced by `-`, which
    /// Windows does not allow in filenames.
    pub fn disk_filename(&self) -> String {
        self.filename.replace(':', "-")
    }

    /// Write the artifact into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir).map_err(|e| ExportError::Io(e.to_string()))?;
        let path = dir.join(self.disk_filename());
        std::fs::write(&path, &self.bytes).map_err(|e| ExportError::Io(e.to_string()))?;
        Ok(path)
    }
}

/// Export errors.
#[derive(Debug)]
pub enum ExportError {
    Serialize(String),
    Io(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Serialize(e) => write!(f, "Export serialize error: {e}"),
            ExportError::Io(e) => write!(f, "Export IO error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// `wili-study-current.json` for the live session, otherwise the selection's
/// UTC ISO-8601 instant.
pub fn filename_for(selection: &SessionId) -> String {
    format!("{EXPORT_PREFIX}{}.json", selection.file_stem())
}

/// Serialize a selection, its snapshot and its focus history.
pub fn export(
    selection: &SessionId,
    snapshot: &SessionSnapshot,
    focus_history: &[Sample],
    exported_at: DateTime<Utc>,
) -> Result<ExportArtifact, ExportError> {
    let document = ExportDocument {
        session: selection,
        dashboard: snapshot,
        focus_history,
        exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    let bytes = serde_json::to_vec_pretty(&document)
        .map_err(|e| ExportError::Serialize(e.to_string()))?;

    Ok(ExportArtifact {
        filename: filename_for(selection),
        bytes,
    })
}

/// Export whatever the dashboard currently shows.
pub fn export_view(view: &DashboardView, exported_at: DateTime<Utc>) -> Result<ExportArtifact, ExportError> {
    export(
        &view.session,
        &view.snapshot,
        &view.snapshot.focus_history,
        exported_at,
    )
}
