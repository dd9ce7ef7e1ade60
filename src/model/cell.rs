use std::sync::Arc;

use crate::assets::decode::DecodedImage;
use crate::foundation::error::{GridError, GridResult};

/// Stable row-major index of a grid position.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct CellId(pub u32);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded-image cache for a cell, derived from [`Cell::image`].
#[derive(Clone, Debug, Default)]
pub enum ImageSlot {
    /// Nothing decoded for the current image (or the cell has no image).
    #[default]
    Empty,
    /// Pixels decoded from `source`, which always equals the cell's current image.
    Ready {
        source: String,
        image: Arc<DecodedImage>,
    },
    /// Decoding or drawing the current image failed; not retried until the cell is mutated.
    Failed { source: String },
}

impl ImageSlot {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn ready(&self) -> Option<&Arc<DecodedImage>> {
        match self {
            Self::Ready { image, .. } => Some(image),
            _ => None,
        }
    }
}

/// One grid position.
#[derive(Clone, Debug)]
pub struct Cell {
    pub id: CellId,
    pub title: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub image_obj: ImageSlot,
}

impl Cell {
    pub fn new(id: CellId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            name: None,
            image: None,
            image_obj: ImageSlot::Empty,
        }
    }

    /// Durable fields only; the decoded image never leaves memory.
    pub fn to_persisted(&self) -> PersistedCell {
        PersistedCell {
            id: self.id,
            title: Some(self.title.clone()),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

/// Stored shape of a cell.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PersistedCell {
    pub id: CellId,
    /// Stored for completeness; merges never read it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Grid-wide settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    pub main_title: String,
}

/// Proposed replacement values for one cell. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellUpdate {
    pub title: Option<String>,
    /// `Some(None)` clears the name.
    pub name: Option<Option<String>>,
    /// `Some(None)` clears the image.
    pub image: Option<Option<String>>,
}

impl CellUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn name(name: Option<String>) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    pub fn image(image: Option<String>) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }
}

/// Ordered cells plus global configuration; the single source of truth for a grid.
#[derive(Clone, Debug)]
pub struct GridState {
    cells: Vec<Cell>,
    pub global: GlobalConfig,
}

impl GridState {
    /// Build a grid; ids must be exactly `0..cells.len()` in order.
    pub fn new(cells: Vec<Cell>, global: GlobalConfig) -> GridResult<Self> {
        for (i, cell) in cells.iter().enumerate() {
            if cell.id.index() != i {
                return Err(GridError::validation(format!(
                    "cell at position {i} has id {}; ids must be contiguous from 0",
                    cell.id
                )));
            }
        }
        Ok(Self { cells, global })
    }

    /// Default grid of `count` cells titled from `titles`, padded with empty titles.
    pub fn from_titles<S: AsRef<str>>(titles: &[S], count: usize, main_title: &str) -> Self {
        let cells = (0..count)
            .map(|i| {
                let title = titles.get(i).map(|t| t.as_ref()).unwrap_or("");
                Cell::new(CellId(i as u32), title)
            })
            .collect();
        Self {
            cells,
            global: GlobalConfig {
                main_title: main_title.to_string(),
            },
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn checked_index(&self, id: CellId) -> GridResult<usize> {
        if id.index() < self.cells.len() {
            Ok(id.index())
        } else {
            Err(GridError::validation(format!(
                "cell {id} is out of range (grid has {} cells)",
                self.cells.len()
            )))
        }
    }

    /// New state with `update` applied to cell `id`.
    ///
    /// Changing the image resets the decoded slot. Any other edit clears a `Failed` slot so the
    /// next frame retries the decode.
    pub fn apply(&self, id: CellId, update: CellUpdate) -> GridResult<Self> {
        let i = self.checked_index(id)?;
        let mut next = self.clone();
        let cell = &mut next.cells[i];
        if let Some(title) = update.title {
            cell.title = title;
        }
        if let Some(name) = update.name {
            cell.name = name.filter(|n| !n.is_empty());
        }
        match update.image {
            Some(image) if image != cell.image => {
                cell.image = image;
                cell.image_obj = ImageSlot::Empty;
            }
            _ => {
                if matches!(cell.image_obj, ImageSlot::Failed { .. }) {
                    cell.image_obj = ImageSlot::Empty;
                }
            }
        }
        Ok(next)
    }

    pub fn with_main_title(&self, main_title: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.global.main_title = main_title.into();
        next
    }

    /// Overlay stored image/name data by id. Stored titles are ignored and unknown ids skipped.
    pub fn merge_persisted(&self, stored: &[PersistedCell]) -> Self {
        let mut next = self.clone();
        for s in stored {
            let Some(cell) = next.cells.get_mut(s.id.index()) else {
                continue;
            };
            if s.image != cell.image {
                cell.image_obj = ImageSlot::Empty;
            }
            cell.image = s.image.clone();
            cell.name = s.name.clone().filter(|n| !n.is_empty());
        }
        next
    }

    /// Overlay user title overrides keyed by cell id.
    pub fn apply_title_overrides<'a>(
        &self,
        overrides: impl IntoIterator<Item = (CellId, &'a str)>,
    ) -> Self {
        let mut next = self.clone();
        for (id, title) in overrides {
            if let Some(cell) = next.cells.get_mut(id.index()) {
                cell.title = title.to_string();
            }
        }
        next
    }

    /// Attach decoded pixels if `source` still matches the cell's image.
    ///
    /// Returns `false` (and leaves the state unchanged) for stale decodes.
    pub fn attach_decoded(&mut self, id: CellId, source: &str, image: Arc<DecodedImage>) -> bool {
        let Some(cell) = self.cells.get_mut(id.index()) else {
            return false;
        };
        if cell.image.as_deref() != Some(source) {
            return false;
        }
        cell.image_obj = ImageSlot::Ready {
            source: source.to_string(),
            image,
        };
        true
    }

    /// Mark the current image of `id` as undrawable, if `source` still matches.
    pub fn mark_failed(&mut self, id: CellId, source: &str) -> bool {
        let Some(cell) = self.cells.get_mut(id.index()) else {
            return false;
        };
        if cell.image.as_deref() != Some(source) {
            return false;
        }
        cell.image_obj = ImageSlot::Failed {
            source: source.to_string(),
        };
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/cell.rs"]
mod tests;
