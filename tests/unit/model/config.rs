use super::*;

#[test]
fn movie_preset_matches_reference_values() {
    let c = CanvasConfig::movie();
    assert_eq!((c.width, c.height), (1200.0, 1610.0));
    assert_eq!((c.grid_rows, c.grid_cols), (5, 6));
    assert_eq!(c.cell_count(), 30);
    assert_eq!(c.grid_top(), 110.0);
    c.validate().unwrap();
}

#[test]
fn game_preset_is_four_rows() {
    let c = CanvasConfig::game();
    assert_eq!(c.cell_count(), 24);
    assert_eq!(c.grid_top(), 90.0);
    assert_eq!(c.placeholder_icon, PlaceholderIcon::Gamepad);
    c.validate().unwrap();
}

#[test]
fn scaled_multiplies_lengths_only() {
    let c = CanvasConfig::movie().scaled(2.0);
    assert_eq!(c.width, 2400.0);
    assert_eq!(c.padding, 80.0);
    assert_eq!(c.cell_title_font_size, 44.0);
    assert_eq!(c.grid_rows, 5);
    assert_eq!(c.cover_ratio, 0.75);
    assert_eq!(CanvasConfig::movie().pixel_size(2.0), (2400, 3220));
}

#[test]
fn validate_rejects_degenerate_configs() {
    let mut c = CanvasConfig::movie();
    c.grid_cols = 0;
    assert!(c.validate().is_err());

    let mut c = CanvasConfig::movie();
    c.cover_ratio = 0.0;
    assert!(c.validate().is_err());

    let mut c = CanvasConfig::movie();
    c.padding = 700.0;
    assert!(c.validate().is_err());
}

#[test]
fn json_fills_optional_fields() {
    let json = r#"{
        "width": 600, "height": 800, "padding": 20, "title_height": 30,
        "grid_rows": 2, "grid_cols": 3, "cell_padding": 5, "cell_border_width": 1,
        "cell_border_radius": 4, "cover_ratio": 0.75, "title_font_size": 24,
        "cell_title_font_size": 12, "cell_name_font_size": 10
    }"#;
    let c = CanvasConfig::from_json_str(json).unwrap();
    assert_eq!(c.title_bottom_margin, 0.0);
    assert_eq!(c.cell_title_margin, 6.0);
    assert_eq!(c.placeholder_icon, PlaceholderIcon::Film);
    assert!(c.watermark.is_empty());
}

#[test]
fn json_rejects_unknown_fields() {
    assert!(CanvasConfig::from_json_str(r#"{"width": 1, "bogus": 2}"#).is_err());
}

#[test]
fn variants_select_presets() {
    assert_eq!(Variant::Movie.canvas_config(), CanvasConfig::movie());
    assert_eq!(Variant::Game.canvas_config().cell_count(), 24);
    assert_eq!(serde_json::to_string(&Variant::Game).unwrap(), r#""game""#);
}
