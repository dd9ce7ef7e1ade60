//! Handing an encoded export to the user.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::export::quality::ExportOutcome;
use crate::foundation::error::{GridError, GridResult};

/// Viewport width below which the preview flow is used.
pub const MOBILE_BREAKPOINT: u32 = 768;

const MOBILE_UA_MARKERS: [&str; 5] = ["Mobi", "Android", "iPhone", "iPad", "iPod"];

/// How the host should hand over the export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Save straight to a file.
    Download,
    /// Show the image so the user can long-press or share it.
    Preview,
}

/// What the host knows about its display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvironmentSignal {
    pub viewport_width: Option<u32>,
    pub user_agent: Option<String>,
}

impl DeliveryMode {
    pub fn detect(env: &EnvironmentSignal) -> Self {
        let narrow = env.viewport_width.is_some_and(|w| w < MOBILE_BREAKPOINT);
        let mobile_ua = env
            .user_agent
            .as_deref()
            .is_some_and(|ua| MOBILE_UA_MARKERS.iter().any(|m| ua.contains(m)));
        if narrow || mobile_ua {
            Self::Preview
        } else {
            Self::Download
        }
    }
}

/// `<title>.jpg` with path separators and control characters replaced, or `<fallback>.jpg`
/// when the title is blank.
pub fn export_file_name(main_title: &str, fallback: &str) -> String {
    let clean: String = main_title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = if clean.trim_matches(['_', '.', ' ']).is_empty() {
        fallback
    } else {
        clean.as_str()
    };
    if stem.to_ascii_lowercase().ends_with(".jpg") {
        stem.to_string()
    } else {
        format!("{stem}.jpg")
    }
}

/// Receives the encoded image in preview mode.
pub type PreviewFn = Box<dyn FnMut(&str, &ExportOutcome) -> GridResult<()>>;

/// Where an export goes.
pub enum Delivery {
    Download { dir: PathBuf },
    Preview(PreviewFn),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivered {
    File(PathBuf),
    Previewed { file_name: String },
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Download { dir } => f.debug_struct("Download").field("dir", dir).finish(),
            Self::Preview(_) => f.write_str("Preview(..)"),
        }
    }
}

impl Delivery {
    pub fn download(dir: impl Into<PathBuf>) -> Self {
        Self::Download { dir: dir.into() }
    }

    pub fn mode(&self) -> DeliveryMode {
        match self {
            Self::Download { .. } => DeliveryMode::Download,
            Self::Preview(_) => DeliveryMode::Preview,
        }
    }

    #[tracing::instrument(level = "info", skip(self, outcome), fields(mode = ?self.mode(), size = outcome.bytes.len()))]
    pub fn deliver(&mut self, file_name: &str, outcome: &ExportOutcome) -> GridResult<Delivered> {
        if file_name.is_empty() || Path::new(file_name).components().count() != 1 {
            return Err(GridError::validation(format!(
                "export file name '{file_name}' must be a single path component"
            )));
        }
        match self {
            Self::Download { dir } => {
                std::fs::create_dir_all(&*dir)
                    .with_context(|| format!("create export dir '{}'", dir.display()))?;
                let path = dir.join(file_name);
                std::fs::write(&path, &outcome.bytes)
                    .with_context(|| format!("write export '{}'", path.display()))?;
                tracing::info!(path = %path.display(), "export written");
                Ok(Delivered::File(path))
            }
            Self::Preview(show) => {
                show(file_name, outcome)?;
                Ok(Delivered::Previewed {
                    file_name: file_name.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/deliver.rs"]
mod tests;
