//! Interaction controller: turns host events into edits, decodes, redraws and exports.
//!
//! The host (a window, a browser shell, a test) forwards pointer and file events here and
//! calls [`GridController::on_animation_frame`] once per frame. Editors and notices go back out
//! through [`EditorHost`]. Clicks never mutate the grid directly; they only ask the host to open
//! an editor, and the editor's result comes back through one of the `set_*` methods.

use std::path::Path;
use std::sync::Arc;

use crate::assets::crop::{CropArea, CropOptions, crop_bytes, crop_region};
use crate::assets::decode::{DecodedImage, decode_dynamic, decode_image};
use crate::assets::source::{ImageFetcher, ImageSource, with_uniqueness_suffix};
use crate::controller::redraw::RedrawScheduler;
use crate::export::deliver::{Delivered, Delivery, export_file_name};
use crate::export::quality::{ExportEncoder, ExportOutcome, Exporter};
use crate::foundation::clock::Clock;
use crate::foundation::core::Point;
use crate::foundation::error::{GridError, GridResult};
use crate::layout::geometry::{HitTarget, SubRegion, cell_index_at, hit_test};
use crate::model::cell::{CellId, CellUpdate, GridState};
use crate::model::config::{CanvasConfig, Variant};
use crate::persist::store::{CellStore, Preferences, restore_grid};
use crate::render::grid::{FrameReport, FrameState, render_grid};
use crate::render::loader::{DecodeRequest, ImageLoader, LoadOutcome};
use crate::render::surface::{Readback, Surface};

/// Largest accepted upload or drop.
pub const MAX_UPLOAD_BYTES: u64 = 3 * 1024 * 1024;

/// Where the canvas sits on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    /// Displayed width over canvas width.
    pub display_scale: f64,
}

impl Viewport {
    /// Canvas drawn 1:1 at the origin.
    pub const IDENTITY: Self = Self {
        left: 0.0,
        top: 0.0,
        display_scale: 1.0,
    };

    /// Canvas-space point for a client-space point; `None` for a degenerate viewport.
    pub fn to_canvas(&self, client: Point) -> Option<Point> {
        if !self.display_scale.is_finite() || self.display_scale <= 0.0 {
            return None;
        }
        Some(Point::new(
            (client.x - self.left) / self.display_scale,
            (client.y - self.top) / self.display_scale,
        ))
    }
}

/// A file handed over by drag-and-drop or a file picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// User-facing rejection of a dropped or uploaded file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserNotice {
    FileTooLarge { limit: u64 },
    NotAnImage,
    Undecodable,
}

/// Editors and notices provided by the surrounding UI.
pub trait EditorHost {
    fn open_main_title_editor(&mut self, current: &str);
    fn open_title_editor(&mut self, id: CellId, current: &str);
    fn open_name_editor(&mut self, id: CellId, current: Option<&str>);
    fn open_search(&mut self, id: CellId);
    fn notify(&mut self, notice: UserNotice);
}

/// One call received by a [`RecordingHost`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    MainTitleEditor(String),
    TitleEditor(CellId, String),
    NameEditor(CellId, Option<String>),
    Search(CellId),
    Notice(UserNotice),
}

/// Host that only records what it was asked to do.
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }
}

impl EditorHost for RecordingHost {
    fn open_main_title_editor(&mut self, current: &str) {
        self.calls.push(HostCall::MainTitleEditor(current.to_string()));
    }

    fn open_title_editor(&mut self, id: CellId, current: &str) {
        self.calls.push(HostCall::TitleEditor(id, current.to_string()));
    }

    fn open_name_editor(&mut self, id: CellId, current: Option<&str>) {
        self.calls
            .push(HostCall::NameEditor(id, current.map(str::to_string)));
    }

    fn open_search(&mut self, id: CellId) {
        self.calls.push(HostCall::Search(id));
    }

    fn notify(&mut self, notice: UserNotice) {
        self.calls.push(HostCall::Notice(notice));
    }
}

/// Owns a grid and everything needed to edit, draw and export it.
pub struct GridController<H: EditorHost, C: Clock> {
    variant: Variant,
    config: CanvasConfig,
    state: GridState,
    drag_over: Option<CellId>,
    redraw: RedrawScheduler,
    loader: ImageLoader,
    cells: Box<dyn CellStore>,
    prefs: Preferences,
    host: H,
    clock: C,
    crop: CropOptions,
}

impl<H: EditorHost, C: Clock> std::fmt::Debug for GridController<H, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridController")
            .field("variant", &self.variant)
            .field("cells", &self.state.len())
            .field("drag_over", &self.drag_over)
            .field("redraw", &self.redraw)
            .finish_non_exhaustive()
    }
}

impl<H: EditorHost, C: Clock> GridController<H, C> {
    /// Restore the grid for `variant` from the stores and schedule the first frame.
    pub fn new(
        variant: Variant,
        cells: Box<dyn CellStore>,
        mut prefs: Preferences,
        host: H,
        clock: C,
    ) -> Self {
        let state = restore_grid(variant, cells.as_ref(), &mut prefs);
        let mut redraw = RedrawScheduler::new();
        redraw.request();
        Self {
            variant,
            config: variant.canvas_config(),
            state,
            drag_over: None,
            redraw,
            loader: ImageLoader::new(),
            cells,
            prefs,
            host,
            clock,
            crop: CropOptions::default(),
        }
    }

    /// Use a custom canvas configuration. Its cell count must match the grid.
    pub fn with_config(mut self, config: CanvasConfig) -> GridResult<Self> {
        config.validate()?;
        if config.cell_count() != self.state.len() {
            return Err(GridError::validation(format!(
                "config has {} cells but the grid has {}",
                config.cell_count(),
                self.state.len()
            )));
        }
        self.config = config;
        self.redraw.request();
        Ok(self)
    }

    pub fn with_crop_options(mut self, crop: CropOptions) -> Self {
        self.crop = crop;
        self
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn drag_over(&self) -> Option<CellId> {
        self.drag_over
    }

    pub fn redraw(&self) -> &RedrawScheduler {
        &self.redraw
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Resolve a click and open the matching editor. Returns what was hit.
    pub fn click(&mut self, client: Point, viewport: Viewport) -> Option<HitTarget> {
        let p = viewport.to_canvas(client)?;
        let target = hit_test(&self.config, p.x, p.y)?;
        match target {
            HitTarget::MainTitle => self.host.open_main_title_editor(&self.state.global.main_title),
            HitTarget::Cell(id, region) => {
                let cell = self.state.cell(id)?;
                match region {
                    SubRegion::Image => self.host.open_search(id),
                    SubRegion::Title => self.host.open_title_editor(id, &cell.title),
                    SubRegion::Name => self.host.open_name_editor(id, cell.name.as_deref()),
                }
            }
        }
        tracing::debug!(?target, "click resolved");
        Some(target)
    }

    /// Track the drop target under the pointer. Redraws only when it changes.
    pub fn drag_over_at(&mut self, client: Point, viewport: Viewport) {
        let target = viewport
            .to_canvas(client)
            .and_then(|p| cell_index_at(&self.config, p.x, p.y));
        self.set_drag_over(target);
    }

    pub fn drag_leave(&mut self) {
        self.set_drag_over(None);
    }

    fn set_drag_over(&mut self, target: Option<CellId>) {
        if self.drag_over != target {
            self.drag_over = target;
            self.redraw.request();
        }
    }

    /// Drop a file onto the canvas. Returns the cell that received the image.
    ///
    /// The file is checked, cropped to the cover shape and re-decoded before the cell changes;
    /// any rejection leaves the grid untouched and notifies the host.
    #[tracing::instrument(level = "info", skip(self, file), fields(file = %file.name, size = file.bytes.len()))]
    pub fn drop_file(&mut self, client: Point, viewport: Viewport, file: DroppedFile) -> Option<CellId> {
        self.set_drag_over(None);
        let id = viewport
            .to_canvas(client)
            .and_then(|p| cell_index_at(&self.config, p.x, p.y))?;

        if !file.media_type.starts_with("image/") {
            self.host.notify(UserNotice::NotAnImage);
            return None;
        }
        if !self.check_size(&file) {
            return None;
        }
        let crop = self.crop;
        let (uri, decoded) = self.prepare_cover(|| crop_bytes(&file.bytes, crop))?;
        let name = Path::new(&file.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty());
        self.commit_image(id, uri, Some(decoded), CellUpdate::default().with_name(name))
            .then_some(id)
    }

    /// Upload path: the host already ran its crop dialog and passes the chosen area.
    /// The cell's name is left unchanged.
    #[tracing::instrument(level = "info", skip(self, file), fields(cell = %id, size = file.bytes.len()))]
    pub fn upload(&mut self, id: CellId, file: DroppedFile, area: CropArea) -> bool {
        if self.state.cell(id).is_none() {
            tracing::warn!(cell = %id, "upload for unknown cell ignored");
            return false;
        }
        if !self.check_size(&file) {
            return false;
        }
        let crop = self.crop;
        let Some((uri, decoded)) =
            self.prepare_cover(|| crop_region(&decode_dynamic(&file.bytes)?, area, crop))
        else {
            return false;
        };
        self.commit_image(id, uri, Some(decoded), CellUpdate::default())
    }

    /// Apply a search pick. Without a cover only the name changes. With one, the cover is
    /// fetched, cropped and decoded into a data URI; if any step fails the URL itself is
    /// stored and decoded later.
    #[tracing::instrument(level = "info", skip(self, result, fetcher), fields(cell = %id, name = %result.name))]
    pub fn select_search_result(
        &mut self,
        id: CellId,
        result: &crate::search::stream::SearchResult,
        fetcher: &dyn ImageFetcher,
    ) -> bool {
        if self.state.cell(id).is_none() {
            tracing::warn!(cell = %id, "search selection for unknown cell ignored");
            return false;
        }
        let name = Some(result.name.clone());
        let Some(url) = result.image.as_deref() else {
            return self.commit(id, CellUpdate::name(name));
        };

        let crop = self.crop;
        let cover = ImageSource::parse(url)
            .and_then(|src| fetcher.fetch(&src))
            .and_then(|bytes| crop_bytes(&bytes, crop))
            .and_then(|c| Ok((c.to_data_uri(), decode_image(&c.bytes)?)));
        let (image, decoded) = match cover {
            Ok((uri, decoded)) => (uri, Some(decoded)),
            Err(e) => {
                tracing::warn!(error = %e, url, "cover crop failed; storing url");
                (url.to_string(), None)
            }
        };
        self.commit_image(id, image, decoded, CellUpdate::default().with_name(name))
    }

    pub fn set_title(&mut self, id: CellId, title: &str) -> bool {
        if !self.commit(id, CellUpdate::title(title)) {
            return false;
        }
        if let Err(e) = self.prefs.set_title_override(id, title) {
            tracing::warn!(cell = %id, error = %e, "failed to store title override");
        }
        true
    }

    pub fn set_name(&mut self, id: CellId, name: Option<String>) -> bool {
        self.commit(id, CellUpdate::name(name))
    }

    pub fn set_main_title(&mut self, title: &str) {
        self.state = self.state.with_main_title(title);
        if let Err(e) = self.prefs.set_global_config(&self.state.global) {
            tracing::warn!(error = %e, "failed to store global config");
        }
        self.redraw.request();
    }

    /// Decodes the host should start for cells whose image is not decoded yet.
    pub fn decode_requests(&mut self) -> Vec<DecodeRequest> {
        self.loader.requests(&self.state)
    }

    /// Report a decode started from [`GridController::decode_requests`].
    pub fn complete_decode(
        &mut self,
        req: &DecodeRequest,
        result: GridResult<DecodedImage>,
    ) -> LoadOutcome {
        let outcome = self.loader.complete(&mut self.state, req, result);
        if outcome != LoadOutcome::Stale {
            self.redraw.request();
        }
        outcome
    }

    /// Give up on a decode the host will not finish; it is requested again next time.
    pub fn cancel_decode(&mut self, req: &DecodeRequest) -> bool {
        self.loader.cancel(req)
    }

    /// Fetch and decode every outstanding image synchronously.
    pub fn load_images(&mut self, fetcher: &dyn ImageFetcher) -> usize {
        let changed = self.loader.load_all(&mut self.state, fetcher);
        if changed > 0 {
            self.redraw.request();
        }
        changed
    }

    /// Draw if a redraw is due. Covers that fail to draw are marked failed so they are not
    /// retried until the cell changes.
    pub fn on_animation_frame(&mut self, surface: &mut dyn Surface) -> GridResult<Option<FrameReport>> {
        if !self.redraw.take_due() {
            return Ok(None);
        }
        let report = render_grid(
            surface,
            &self.state,
            FrameState::interactive(self.drag_over),
            &self.config,
        )?;
        for id in &report.failed_cells {
            if let Some(source) = self.state.cell(*id).and_then(|c| c.image.clone()) {
                self.state.mark_failed(*id, &source);
            }
        }
        Ok(Some(report))
    }

    /// Render at `scale`, encode within the size budget and hand the result to `delivery`.
    pub fn export<S, E>(
        &self,
        exporter: &mut Exporter<E>,
        surface: &mut S,
        scale: f64,
        delivery: &mut Delivery,
    ) -> GridResult<(ExportOutcome, Delivered)>
    where
        S: Surface + Readback,
        E: ExportEncoder,
    {
        let outcome = exporter.export(surface, &self.state, &self.config, scale)?;
        let fallback = self.prefs.locale().bundle().default_file_stem(self.variant);
        let file_name = export_file_name(&self.state.global.main_title, fallback);
        let delivered = delivery.deliver(&file_name, &outcome)?;
        exporter.mark_delivered()?;
        Ok((outcome, delivered))
    }

    fn check_size(&mut self, file: &DroppedFile) -> bool {
        if file.bytes.len() as u64 > MAX_UPLOAD_BYTES {
            self.host.notify(UserNotice::FileTooLarge {
                limit: MAX_UPLOAD_BYTES,
            });
            return false;
        }
        true
    }

    /// Crop, then confirm the crop decodes. Notifies the host on failure.
    fn prepare_cover(
        &mut self,
        crop: impl FnOnce() -> GridResult<crate::assets::crop::CroppedImage>,
    ) -> Option<(String, DecodedImage)> {
        let checked = crop().and_then(|c| {
            let decoded = decode_image(&c.bytes)?;
            Ok((c.to_data_uri(), decoded))
        });
        match checked {
            Ok((uri, decoded)) => Some((
                with_uniqueness_suffix(&uri, self.clock.now_millis()),
                decoded,
            )),
            Err(e) => {
                tracing::warn!(error = %e, "rejected image");
                self.host.notify(UserNotice::Undecodable);
                None
            }
        }
    }

    fn commit_image(
        &mut self,
        id: CellId,
        image: String,
        decoded: Option<DecodedImage>,
        mut update: CellUpdate,
    ) -> bool {
        update.image = Some(Some(image.clone()));
        if !self.commit(id, update) {
            return false;
        }
        if let Some(decoded) = decoded {
            self.state.attach_decoded(id, &image, Arc::new(decoded));
        }
        true
    }

    /// Apply, persist (failures are logged) and schedule a redraw.
    fn commit(&mut self, id: CellId, update: CellUpdate) -> bool {
        let next = match self.state.apply(id, update) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(cell = %id, error = %e, "edit rejected");
                return false;
            }
        };
        self.state = next;
        if let Some(cell) = self.state.cell(id)
            && let Err(e) = self.cells.save(&cell.to_persisted())
        {
            tracing::warn!(cell = %id, error = %e, "failed to persist cell");
        }
        self.redraw.request();
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/controller/events.rs"]
mod tests;
