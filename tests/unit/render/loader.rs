use super::*;
use crate::assets::source::{FsFetcher, to_data_uri};
use crate::foundation::error::GridError;
use crate::model::cell::CellUpdate;

fn decoded() -> DecodedImage {
    DecodedImage {
        width: 1,
        height: 1,
        rgba8_premul: Arc::new(vec![1, 2, 3, 255]),
    }
}

fn with_image(src: &str) -> GridState {
    GridState::from_titles(&["a", "b"], 2, "M")
        .apply(CellId(1), CellUpdate::image(Some(src.into())))
        .unwrap()
}

#[test]
fn requests_are_issued_once() {
    let state = with_image("x.jpg");
    let mut loader = ImageLoader::new();
    let reqs = loader.requests(&state);
    assert_eq!(
        reqs,
        vec![DecodeRequest {
            id: CellId(1),
            source: "x.jpg".into()
        }]
    );
    assert!(loader.is_pending(CellId(1), "x.jpg"));
    assert!(loader.requests(&state).is_empty());
}

#[test]
fn stale_decode_is_discarded() {
    // Decode of A starts, the user drops B, A finishes: B must stay.
    let mut state = with_image("A");
    let mut loader = ImageLoader::new();
    let req_a = loader.requests(&state).remove(0);

    state = state
        .apply(CellId(1), CellUpdate::image(Some("B".into())))
        .unwrap();
    let req_b = loader.requests(&state).remove(0);
    assert_eq!(req_b.source, "B");

    assert_eq!(loader.complete(&mut state, &req_a, Ok(decoded())), LoadOutcome::Stale);
    assert!(state.cell(CellId(1)).unwrap().image_obj.is_empty());

    assert_eq!(loader.complete(&mut state, &req_b, Ok(decoded())), LoadOutcome::Attached);
    assert!(state.cell(CellId(1)).unwrap().image_obj.ready().is_some());
    assert_eq!(loader.pending_len(), 0);
}

#[test]
fn failures_are_not_retried_until_mutation() {
    let mut state = with_image("bad");
    let mut loader = ImageLoader::new();
    let req = loader.requests(&state).remove(0);
    let outcome = loader.complete(&mut state, &req, Err(GridError::decode("boom")));
    assert_eq!(outcome, LoadOutcome::Failed);
    assert!(loader.requests(&state).is_empty());

    let state = state
        .apply(CellId(1), CellUpdate::name(Some("retry".into())))
        .unwrap();
    assert_eq!(loader.requests(&state).len(), 1);
}

#[test]
fn load_all_decodes_data_uris() {
    let mut png = Vec::new();
    image::DynamicImage::new_rgba8(3, 4)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let mut state = with_image(&to_data_uri("image/png", &png));
    let mut loader = ImageLoader::new();
    let fetcher = FsFetcher::new(".");
    assert_eq!(loader.load_all(&mut state, &fetcher), 1);
    let img = state.cell(CellId(1)).unwrap().image_obj.ready().unwrap().clone();
    assert_eq!((img.width, img.height), (3, 4));
}

#[test]
fn cancelled_request_is_reissued() {
    let state = with_image("x.jpg");
    let mut loader = ImageLoader::new();
    let req = loader.requests(&state).remove(0);

    assert!(loader.cancel(&req));
    assert!(!loader.cancel(&req));
    assert!(!loader.is_pending(CellId(1), "x.jpg"));
    assert_eq!(loader.requests(&state), vec![req]);
}

#[test]
fn pending_entries_for_replaced_images_are_pruned() {
    // A is requested, the cell moves to B and back to A while the first decode was dropped.
    let state_a = with_image("A");
    let mut loader = ImageLoader::new();
    assert_eq!(loader.requests(&state_a).len(), 1);

    let state_b = state_a
        .apply(CellId(1), CellUpdate::image(Some("B".into())))
        .unwrap();
    let reqs = loader.requests(&state_b);
    assert_eq!(reqs.len(), 1);
    assert!(!loader.is_pending(CellId(1), "A"));
    assert_eq!(loader.pending_len(), 1);

    let back = state_b
        .apply(CellId(1), CellUpdate::image(Some("A".into())))
        .unwrap();
    let again = loader.requests(&back);
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].source, "A");
    assert_eq!(loader.pending_len(), 1);
}
