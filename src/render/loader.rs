//! Bookkeeping for decodes that run outside the model.

use std::collections::HashSet;
use std::sync::Arc;

use crate::assets::decode::{DecodedImage, decode_image};
use crate::assets::source::{ImageFetcher, ImageSource};
use crate::foundation::error::GridResult;
use crate::model::cell::{CellId, GridState, ImageSlot};

/// A decode the host should perform.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DecodeRequest {
    pub id: CellId,
    /// The cell's image reference at the time of the request.
    pub source: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Attached,
    /// The cell's image changed while decoding; the result was dropped.
    Stale,
    /// The slot is now `Failed` until the cell is mutated again.
    Failed,
}

/// Tracks in-flight decodes keyed by `(cell, image reference)`.
#[derive(Debug, Default)]
pub struct ImageLoader {
    pending: HashSet<DecodeRequest>,
}

impl ImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells that have an image, an `Empty` slot, and no decode in flight. Returned requests
    /// are marked pending.
    ///
    /// Pending entries whose cell no longer references the same image are forgotten first,
    /// so a request the host dropped is reissued once the cell points back at that image.
    pub fn requests(&mut self, state: &GridState) -> Vec<DecodeRequest> {
        self.pending.retain(|req| {
            state.cell(req.id).and_then(|c| c.image.as_deref()) == Some(req.source.as_str())
        });
        let mut out = Vec::new();
        for cell in state.cells() {
            let Some(source) = cell.image.as_deref() else {
                continue;
            };
            if !matches!(cell.image_obj, ImageSlot::Empty) {
                continue;
            }
            let req = DecodeRequest {
                id: cell.id,
                source: source.to_string(),
            };
            if self.pending.insert(req.clone()) {
                out.push(req);
            }
        }
        out
    }

    pub fn is_pending(&self, id: CellId, source: &str) -> bool {
        self.pending.contains(&DecodeRequest {
            id,
            source: source.to_string(),
        })
    }

    /// Forget an in-flight request the host abandoned. The next [`ImageLoader::requests`]
    /// call issues it again if the cell still needs it.
    pub fn cancel(&mut self, req: &DecodeRequest) -> bool {
        let removed = self.pending.remove(req);
        if removed {
            tracing::debug!(cell = %req.id, "decode request cancelled");
        }
        removed
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Apply a finished decode to `state`.
    pub fn complete(
        &mut self,
        state: &mut GridState,
        req: &DecodeRequest,
        result: GridResult<DecodedImage>,
    ) -> LoadOutcome {
        self.pending.remove(req);
        match result {
            Ok(image) => {
                if state.attach_decoded(req.id, &req.source, Arc::new(image)) {
                    LoadOutcome::Attached
                } else {
                    tracing::debug!(cell = %req.id, "discarding stale decode");
                    LoadOutcome::Stale
                }
            }
            Err(err) => {
                if state.mark_failed(req.id, &req.source) {
                    tracing::warn!(cell = %req.id, %err, "image decode failed");
                    LoadOutcome::Failed
                } else {
                    LoadOutcome::Stale
                }
            }
        }
    }

    /// Fetch and decode every outstanding request synchronously.
    ///
    /// Returns how many cells changed (attached or failed).
    pub fn load_all(&mut self, state: &mut GridState, fetcher: &dyn ImageFetcher) -> usize {
        let mut changed = 0;
        for req in self.requests(state) {
            let result = ImageSource::parse(&req.source)
                .and_then(|src| fetcher.fetch(&src))
                .and_then(|bytes| decode_image(&bytes));
            if self.complete(state, &req, result) != LoadOutcome::Stale {
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/loader.rs"]
mod tests;
