#![forbid(unsafe_code)]

pub mod foundation {
    pub mod clock;
    pub mod core;
    pub mod error;
}

pub mod model {
    pub mod cell;
    pub mod config;
}

pub mod layout {
    pub mod geometry;
}

pub mod assets {
    pub mod crop;
    pub mod decode;
    pub mod source;
}

pub mod render {
    pub mod cpu;
    pub mod grid;
    pub mod icon;
    pub mod loader;
    pub mod recording;
    pub mod surface;
    pub mod text_fit;
}

pub mod controller {
    pub mod events;
    pub mod redraw;
}

pub mod export {
    pub mod deliver;
    pub mod quality;
}

pub mod persist {
    pub mod store;
}

pub mod i18n {
    pub mod bundles;
    pub mod locales;
}

pub mod search {
    pub mod stream;
}

pub mod cache {
    pub mod ttl;
}

pub use assets::crop::{CropArea, CropOptions, CroppedImage, crop_bytes, crop_to_aspect};
pub use assets::decode::{DecodedImage, decode_image};
pub use assets::source::{FsFetcher, ImageFetcher, ImageSource};
pub use controller::events::{
    DroppedFile, EditorHost, GridController, HostCall, RecordingHost, UserNotice, Viewport,
};
pub use export::deliver::{Delivered, Delivery, DeliveryMode, EnvironmentSignal};
pub use export::quality::{ExportOutcome, ExportStatus, Exporter, JpegExportEncoder};
pub use foundation::clock::{Clock, ManualClock, SystemClock};
pub use foundation::core::{Frame, Rgba8};
pub use foundation::error::{GridError, GridResult};
pub use i18n::locales::Locale;
pub use layout::geometry::{GridLayout, HitTarget, SubRegion, hit_test};
pub use model::cell::{Cell, CellId, CellUpdate, GlobalConfig, GridState, PersistedCell};
pub use model::config::{CanvasConfig, PlaceholderIcon, Variant};
pub use persist::store::{
    CellStore, JsonCellStore, JsonKeyValueStore, KeyValueStore, MemoryCellStore,
    MemoryKeyValueStore, Preferences,
};
pub use render::cpu::CpuSurface;
pub use render::grid::{FrameReport, FrameState, render_grid};
pub use render::recording::RecordingSurface;
pub use render::surface::{Readback, Surface};
pub use search::stream::{SearchEvent, SearchFeed, SearchResult};
