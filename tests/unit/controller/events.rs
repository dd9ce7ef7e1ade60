use super::*;
use crate::foundation::clock::ManualClock;
use crate::i18n::locales::Locale;
use crate::layout::geometry::cell_rect;
use crate::model::cell::ImageSlot;
use crate::persist::store::{KeyValueStore, MemoryCellStore, MemoryKeyValueStore};
use crate::render::recording::RecordingSurface;
use crate::search::stream::{ResultId, SearchResult};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

type Ctl = GridController<RecordingHost, ManualClock>;

fn setup_with(cells: MemoryCellStore, kv: MemoryKeyValueStore) -> Ctl {
    let prefs = Preferences::new(Box::new(kv), Variant::Movie, Locale::En);
    GridController::new(
        Variant::Movie,
        Box::new(cells),
        prefs,
        RecordingHost::new(),
        ManualClock::new(1_700_000_000_000),
    )
}

fn setup() -> (Ctl, MemoryCellStore, MemoryKeyValueStore) {
    let cells = MemoryCellStore::new();
    let kv = MemoryKeyValueStore::new();
    (setup_with(cells.clone(), kv.clone()), cells, kv)
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 30, 30])));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn file(name: &str, media_type: &str, bytes: Vec<u8>) -> DroppedFile {
    DroppedFile {
        name: name.into(),
        media_type: media_type.into(),
        bytes,
    }
}

fn center_of(ctl: &Ctl, id: u32) -> Point {
    let r = cell_rect(ctl.config(), CellId(id)).unwrap();
    Point::new(r.x0 + r.width() / 2.0, r.y0 + r.height() * 0.4)
}

struct StaticFetcher(GridResult<Vec<u8>>);

impl ImageFetcher for StaticFetcher {
    fn fetch(&self, _source: &ImageSource) -> GridResult<Vec<u8>> {
        match &self.0 {
            Ok(b) => Ok(b.clone()),
            Err(e) => Err(GridError::decode(e.to_string())),
        }
    }
}

#[test]
fn click_in_title_band_opens_main_title_editor() {
    let (mut ctl, _, _) = setup();
    let hit = ctl.click(Point::new(600.0, 45.0), Viewport::IDENTITY);
    assert_eq!(hit, Some(HitTarget::MainTitle));
    assert_eq!(
        ctl.host_mut().take(),
        vec![HostCall::MainTitleEditor("Movie Preference Grid".into())]
    );
}

#[test]
fn click_maps_client_coordinates_through_viewport() {
    let (mut ctl, _, _) = setup();
    let r = cell_rect(ctl.config(), CellId(7)).unwrap();
    let canvas = Point::new(r.x0 + r.width() / 2.0, r.y0 + r.height() * 0.95);
    let vp = Viewport {
        left: 10.0,
        top: 20.0,
        display_scale: 0.5,
    };
    let client = Point::new(10.0 + canvas.x * 0.5, 20.0 + canvas.y * 0.5);
    assert_eq!(
        ctl.click(client, vp),
        Some(HitTarget::Cell(CellId(7), SubRegion::Name))
    );
    assert_eq!(ctl.host_mut().take(), vec![HostCall::NameEditor(CellId(7), None)]);

    let degenerate = Viewport {
        display_scale: 0.0,
        ..vp
    };
    assert_eq!(ctl.click(client, degenerate), None);
}

#[test]
fn image_and_title_bands_open_search_and_title_editor() {
    let (mut ctl, _, _) = setup();
    let r = cell_rect(ctl.config(), CellId(0)).unwrap();
    ctl.click(Point::new(r.x0 + 5.0, r.y0 + 5.0), Viewport::IDENTITY);
    ctl.click(
        Point::new(r.x0 + 5.0, r.y0 + r.height() * 0.8),
        Viewport::IDENTITY,
    );
    assert_eq!(
        ctl.host_mut().take(),
        vec![
            HostCall::Search(CellId(0)),
            HostCall::TitleEditor(CellId(0), "Favorite Movie".into())
        ]
    );
}

#[test]
fn drag_over_requests_redraw_only_on_change() {
    let (mut ctl, _, _) = setup();
    let mut surface = RecordingSurface::new(1200, 1610);
    ctl.on_animation_frame(&mut surface).unwrap();
    let before = ctl.redraw().requested();

    let p = center_of(&ctl, 4);
    ctl.drag_over_at(p, Viewport::IDENTITY);
    ctl.drag_over_at(p, Viewport::IDENTITY);
    assert_eq!(ctl.drag_over(), Some(CellId(4)));
    assert_eq!(ctl.redraw().requested(), before + 1);

    ctl.drag_leave();
    ctl.drag_leave();
    assert_eq!(ctl.drag_over(), None);
    assert_eq!(ctl.redraw().requested(), before + 2);
}

#[test]
fn drop_rejections_notify_and_leave_grid_untouched() {
    let (mut ctl, cells, _) = setup();
    let p = center_of(&ctl, 2);

    assert_eq!(
        ctl.drop_file(p, Viewport::IDENTITY, file("a.txt", "text/plain", b"hi".to_vec())),
        None
    );
    let big = vec![0u8; MAX_UPLOAD_BYTES as usize + 1];
    assert_eq!(ctl.drop_file(p, Viewport::IDENTITY, file("b.png", "image/png", big)), None);
    assert_eq!(
        ctl.drop_file(p, Viewport::IDENTITY, file("c.png", "image/png", b"junk".to_vec())),
        None
    );

    assert_eq!(
        ctl.host_mut().take(),
        vec![
            HostCall::Notice(UserNotice::NotAnImage),
            HostCall::Notice(UserNotice::FileTooLarge {
                limit: MAX_UPLOAD_BYTES
            }),
            HostCall::Notice(UserNotice::Undecodable),
        ]
    );
    assert!(ctl.state().cells()[2].image.is_none());
    assert!(cells.is_empty());
}

#[test]
fn drop_outside_grid_is_ignored() {
    let (mut ctl, _, _) = setup();
    let dropped = ctl.drop_file(
        Point::new(600.0, 30.0),
        Viewport::IDENTITY,
        file("a.png", "image/png", png(30, 40)),
    );
    assert_eq!(dropped, None);
    assert!(ctl.host().calls.is_empty());
}

#[test]
fn drop_crops_names_and_persists() {
    let (mut ctl, cells, _) = setup();
    let p = center_of(&ctl, 3);
    ctl.drag_over_at(p, Viewport::IDENTITY);
    let dropped = ctl.drop_file(
        p,
        Viewport::IDENTITY,
        file("Spirited Away.png", "image/png", png(400, 300)),
    );
    assert_eq!(dropped, Some(CellId(3)));
    assert_eq!(ctl.drag_over(), None);

    let cell = &ctl.state().cells()[3];
    let image = cell.image.as_deref().unwrap();
    assert!(image.starts_with("data:image/jpeg;base64,"));
    assert!(image.ends_with("#t=1700000000000"));
    assert_eq!(cell.name.as_deref(), Some("Spirited Away"));
    let decoded = cell.image_obj.ready().unwrap();
    assert_eq!((decoded.width, decoded.height), (225, 300));

    let stored = cells.get(CellId(3)).unwrap();
    assert_eq!(stored.image.as_deref(), Some(image));
}

#[test]
fn upload_uses_area_and_keeps_name() {
    let (mut ctl, _, _) = setup();
    ctl.set_name(CellId(1), Some("Keep".into()));
    let area = CropArea {
        x: 0,
        y: 0,
        width: 150,
        height: 200,
    };
    assert!(ctl.upload(CellId(1), file("x.png", "image/png", png(400, 300)), area));
    let cell = &ctl.state().cells()[1];
    assert_eq!(cell.name.as_deref(), Some("Keep"));
    let decoded = cell.image_obj.ready().unwrap();
    assert_eq!((decoded.width, decoded.height), (150, 200));

    assert!(!ctl.upload(CellId(99), file("x.png", "image/png", png(4, 4)), area));
}

#[test]
fn search_pick_without_cover_only_sets_name() {
    let (mut ctl, _, _) = setup();
    ctl.upload(
        CellId(0),
        file("x.png", "image/png", png(30, 40)),
        CropArea {
            x: 0,
            y: 0,
            width: 30,
            height: 40,
        },
    );
    let before = ctl.state().cells()[0].image.clone();
    let pick = SearchResult {
        id: None,
        name: "Heat".into(),
        image: None,
    };
    assert!(ctl.select_search_result(CellId(0), &pick, &StaticFetcher(Ok(Vec::new()))));
    assert_eq!(ctl.state().cells()[0].name.as_deref(), Some("Heat"));
    assert_eq!(ctl.state().cells()[0].image, before);
}

#[test]
fn search_pick_crops_or_falls_back_to_url() {
    let (mut ctl, _, _) = setup();
    let pick = SearchResult {
        id: None,
        name: "Alien".into(),
        image: Some("/api/proxy?url=x".into()),
    };
    assert!(ctl.select_search_result(CellId(5), &pick, &StaticFetcher(Ok(png(600, 900)))));
    let cell = &ctl.state().cells()[5];
    assert!(cell.image.as_deref().unwrap().starts_with("data:image/jpeg"));
    assert!(cell.image_obj.ready().is_some());

    let failing = StaticFetcher(Err(GridError::decode("offline")));
    assert!(ctl.select_search_result(CellId(6), &pick, &failing));
    let cell = &ctl.state().cells()[6];
    assert_eq!(cell.image.as_deref(), Some("/api/proxy?url=x"));
    assert_eq!(cell.name.as_deref(), Some("Alien"));
    assert!(cell.image_obj.is_empty());
}

#[test]
fn search_pick_with_undecodable_cover_stores_url_without_image() {
    let (mut ctl, cells, _) = setup();
    let pick = SearchResult {
        id: Some(ResultId::Number(7)),
        name: "Brazil".into(),
        image: Some("/api/proxy?url=brazil".into()),
    };
    let garbage = StaticFetcher(Ok(b"<html>not found</html>".to_vec()));
    assert!(ctl.select_search_result(CellId(1), &pick, &garbage));

    let cell = &ctl.state().cells()[1];
    assert_eq!(cell.image.as_deref(), Some("/api/proxy?url=brazil"));
    assert_eq!(cell.name.as_deref(), Some("Brazil"));
    assert!(cell.image_obj.is_empty());
    let stored = cells.get(CellId(1)).unwrap();
    assert_eq!(stored.image.as_deref(), Some("/api/proxy?url=brazil"));
    assert_eq!(ctl.decode_requests().len(), 1);
}

#[test]
fn edits_write_preferences() {
    let (mut ctl, _, kv) = setup();
    assert!(ctl.set_title(CellId(2), "Mine"));
    ctl.set_main_title("My Year");
    assert_eq!(ctl.state().cells()[2].title, "Mine");
    assert_eq!(
        kv.get("movieGridTitles_en").unwrap().as_deref(),
        Some(r#"{"2":"Mine"}"#)
    );
    assert_eq!(
        kv.get("movieGridGlobalConfig_en").unwrap().as_deref(),
        Some(r#"{"mainTitle":"My Year"}"#)
    );
    assert!(!ctl.set_title(CellId(400), "nope"));
}

#[test]
fn store_failures_never_block_edits() {
    let mut ctl = setup_with(MemoryCellStore::failing(), MemoryKeyValueStore::failing());
    assert!(ctl.set_title(CellId(0), "t"));
    assert!(ctl.set_name(CellId(0), Some("n".into())));
    ctl.set_main_title("m");
    assert_eq!(ctl.state().cells()[0].name.as_deref(), Some("n"));
    assert_eq!(ctl.state().global.main_title, "m");
}

#[test]
fn frames_are_coalesced() {
    let (mut ctl, _, _) = setup();
    let mut surface = RecordingSurface::new(1200, 1610);
    assert!(ctl.on_animation_frame(&mut surface).unwrap().is_some());
    assert!(ctl.on_animation_frame(&mut surface).unwrap().is_none());

    ctl.set_name(CellId(0), Some("a".into()));
    ctl.set_name(CellId(1), Some("b".into()));
    assert!(ctl.on_animation_frame(&mut surface).unwrap().is_some());
    assert!(ctl.on_animation_frame(&mut surface).unwrap().is_none());
}

#[test]
fn draw_failures_mark_cells_failed_until_mutation() {
    let (mut ctl, _, _) = setup();
    let p = center_of(&ctl, 3);
    ctl.drop_file(p, Viewport::IDENTITY, file("a.png", "image/png", png(30, 40)));

    let mut surface = RecordingSurface::new(1200, 1610).with_failing_images();
    let report = ctl.on_animation_frame(&mut surface).unwrap().unwrap();
    assert_eq!(report.failed_cells, vec![CellId(3)]);
    assert!(matches!(ctl.state().cells()[3].image_obj, ImageSlot::Failed { .. }));
    assert!(ctl.decode_requests().is_empty());

    ctl.set_name(CellId(3), Some("retry".into()));
    assert_eq!(ctl.decode_requests().len(), 1);
}

#[test]
fn decode_completion_requests_redraw() {
    let (mut ctl, _, _) = setup();
    let pick = SearchResult {
        id: None,
        name: "x".into(),
        image: Some("/covers/x.png".into()),
    };
    ctl.select_search_result(CellId(0), &pick, &StaticFetcher(Err(GridError::decode("no"))));
    let mut surface = RecordingSurface::new(1200, 1610);
    ctl.on_animation_frame(&mut surface).unwrap();

    let reqs = ctl.decode_requests();
    assert_eq!(reqs.len(), 1);
    let outcome = ctl.complete_decode(&reqs[0], decode_image(&png(3, 4)));
    assert_eq!(outcome, LoadOutcome::Attached);
    assert!(ctl.redraw().has_pending());
}

#[test]
fn mismatched_config_is_rejected() {
    let (ctl, _, _) = setup();
    assert!(ctl.with_config(CanvasConfig::game()).is_err());
}
