use serde::{Deserialize, Serialize};

/// Where a single file stands in a sketching run.
///
/// One variant per file replaces parallel progress/signature/error maps, so
/// a file can never hold both a signature and an error.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileStatus {
    /// Picked and requested, no word from the worker yet.
    Selected,
    InProgress { progress: f64 },
    Completed { signature: String },
    Failed { progress: f64, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGlyph {
    Success,
    Warning,
}

impl StatusGlyph {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusGlyph::Success => "\u{2705}",
            StatusGlyph::Warning => "\u{26a0}\u{fe0f}",
        }
    }
}

fn clamp(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 100.0)
    }
}

impl FileStatus {
    pub fn progress(&self) -> f64 {
        match self {
            FileStatus::Selected => 0.0,
            FileStatus::InProgress { progress } | FileStatus::Failed { progress, .. } => *progress,
            FileStatus::Completed { .. } => 100.0,
        }
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            FileStatus::Completed { signature } => Some(signature),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FileStatus::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed { .. } | FileStatus::Failed { .. })
    }

    pub fn glyph(&self) -> Option<StatusGlyph> {
        match self {
            FileStatus::Completed { .. } => Some(StatusGlyph::Success),
            FileStatus::Failed { .. } => Some(StatusGlyph::Warning),
            _ => None,
        }
    }

    /// Apply a `progress:read` event.
    ///
    /// A completed file ignores late progress. A failed file that reports
    /// progress again is being sketched by a newer run.
    pub fn on_progress(self, progress: f64) -> FileStatus {
        match self {
            FileStatus::Completed { .. } => self,
            _ => FileStatus::InProgress {
                progress: clamp(progress),
            },
        }
    }

    /// Apply a `signature:generated` event. Always completes the file.
    pub fn on_generated(self, signature: String) -> FileStatus {
        FileStatus::Completed { signature }
    }

    /// Apply a `signature:error` event.
    ///
    /// Signatures are never dropped once computed, so a completed file
    /// keeps its result.
    pub fn on_error(self, error: String) -> FileStatus {
        match self {
            FileStatus::Completed { .. } => {
                log::warn!("error reported for an already sketched file: {}", error);
                self
            }
            other => FileStatus::Failed {
                progress: other.progress(),
                error,
            },
        }
    }
}
