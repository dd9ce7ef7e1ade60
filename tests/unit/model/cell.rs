use super::*;

fn pixel() -> Arc<DecodedImage> {
    Arc::new(DecodedImage {
        width: 1,
        height: 1,
        rgba8_premul: Arc::new(vec![0, 0, 0, 255]),
    })
}

fn grid(n: usize) -> GridState {
    let titles: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
    GridState::from_titles(&titles, n, "Main")
}

#[test]
fn new_rejects_non_contiguous_ids() {
    let cells = vec![Cell::new(CellId(0), "a"), Cell::new(CellId(2), "b")];
    assert!(GridState::new(cells, GlobalConfig::default()).is_err());

    let cells = vec![Cell::new(CellId(0), "a"), Cell::new(CellId(1), "b")];
    assert_eq!(GridState::new(cells, GlobalConfig::default()).unwrap().len(), 2);
}

#[test]
fn from_titles_pads_short_bundles() {
    let g = GridState::from_titles(&["a", "b"], 4, "M");
    assert_eq!(g.len(), 4);
    assert_eq!(g.cells()[1].title, "b");
    assert_eq!(g.cells()[3].title, "");
    assert_eq!(g.cells()[3].id, CellId(3));
    assert_eq!(g.global.main_title, "M");
}

#[test]
fn apply_is_an_immutable_update() {
    let g = grid(3);
    let next = g.apply(CellId(1), CellUpdate::title("edited")).unwrap();
    assert_eq!(g.cells()[1].title, "t1");
    assert_eq!(next.cells()[1].title, "edited");
    assert!(g.apply(CellId(9), CellUpdate::title("x")).is_err());
}

#[test]
fn image_change_invalidates_decoded_slot() {
    let mut g = grid(2).apply(CellId(0), CellUpdate::image(Some("a.png".into()))).unwrap();
    assert!(g.attach_decoded(CellId(0), "a.png", pixel()));
    assert!(g.cells()[0].image_obj.ready().is_some());

    let same = g.apply(CellId(0), CellUpdate::image(Some("a.png".into()))).unwrap();
    assert!(same.cells()[0].image_obj.ready().is_some());

    let changed = g.apply(CellId(0), CellUpdate::image(Some("b.png".into()))).unwrap();
    assert!(changed.cells()[0].image_obj.is_empty());
}

#[test]
fn attach_rejects_stale_sources() {
    let mut g = grid(1).apply(CellId(0), CellUpdate::image(Some("B".into()))).unwrap();
    assert!(!g.attach_decoded(CellId(0), "A", pixel()));
    assert!(g.cells()[0].image_obj.is_empty());
    assert!(!g.attach_decoded(CellId(5), "B", pixel()));
}

#[test]
fn failed_slot_clears_on_next_mutation_only() {
    let mut g = grid(1).apply(CellId(0), CellUpdate::image(Some("x".into()))).unwrap();
    assert!(g.mark_failed(CellId(0), "x"));
    assert!(matches!(g.cells()[0].image_obj, ImageSlot::Failed { .. }));

    let renamed = g.apply(CellId(0), CellUpdate::name(Some("n".into()))).unwrap();
    assert!(renamed.cells()[0].image_obj.is_empty());
    assert_eq!(renamed.cells()[0].name.as_deref(), Some("n"));
}

#[test]
fn empty_names_are_normalized_to_none() {
    let g = grid(1).apply(CellId(0), CellUpdate::name(Some(String::new()))).unwrap();
    assert_eq!(g.cells()[0].name, None);
}

#[test]
fn merge_persisted_never_overrides_titles() {
    let stored = vec![
        PersistedCell {
            id: CellId(1),
            title: Some("stale title".into()),
            name: Some("Heat".into()),
            image: Some("data:image/jpeg;base64,AAAA".into()),
        },
        PersistedCell {
            id: CellId(42),
            title: None,
            name: Some("ghost".into()),
            image: None,
        },
    ];
    let g = grid(3).merge_persisted(&stored);
    assert_eq!(g.cells()[1].title, "t1");
    assert_eq!(g.cells()[1].name.as_deref(), Some("Heat"));
    assert!(g.cells()[1].image.is_some());
    assert_eq!(g.len(), 3);
}

#[test]
fn title_overrides_apply_by_id() {
    let g = grid(3).apply_title_overrides([(CellId(2), "mine"), (CellId(7), "nope")]);
    assert_eq!(g.cells()[2].title, "mine");
    assert_eq!(g.cells()[0].title, "t0");
}

#[test]
fn persisted_shape_omits_decoded_image() {
    let mut g = grid(1).apply(CellId(0), CellUpdate::image(Some("a".into()))).unwrap();
    g.attach_decoded(CellId(0), "a", pixel());
    let json = serde_json::to_value(g.cells()[0].to_persisted()).unwrap();
    assert_eq!(json, serde_json::json!({"id": 0, "title": "t0", "image": "a"}));
}

#[test]
fn global_config_uses_camel_case_keys() {
    let json = serde_json::to_string(&GlobalConfig {
        main_title: "x".into(),
    })
    .unwrap();
    assert_eq!(json, r#"{"mainTitle":"x"}"#);
}
