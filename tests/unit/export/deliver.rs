use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::export::quality::ExportStatus;

fn outcome() -> ExportOutcome {
    ExportOutcome {
        bytes: vec![0xFF, 0xD8, 0xFF],
        media_type: "image/jpeg",
        width: 2,
        height: 2,
        quality: 92,
        status: ExportStatus::Success,
        attempts: Vec::new(),
    }
}

#[test]
fn detect_prefers_preview_on_narrow_or_mobile() {
    let narrow = EnvironmentSignal {
        viewport_width: Some(767),
        user_agent: None,
    };
    assert_eq!(DeliveryMode::detect(&narrow), DeliveryMode::Preview);

    let wide = EnvironmentSignal {
        viewport_width: Some(768),
        user_agent: Some("Mozilla/5.0 (X11; Linux x86_64)".into()),
    };
    assert_eq!(DeliveryMode::detect(&wide), DeliveryMode::Download);

    let phone = EnvironmentSignal {
        viewport_width: Some(1024),
        user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)".into()),
    };
    assert_eq!(DeliveryMode::detect(&phone), DeliveryMode::Preview);
    assert_eq!(
        DeliveryMode::detect(&EnvironmentSignal::default()),
        DeliveryMode::Download
    );
}

#[test]
fn file_names_are_sanitized() {
    assert_eq!(export_file_name("My Top 30", "grid"), "My Top 30.jpg");
    assert_eq!(export_file_name("a/b\\c:d", "grid"), "a_b_c_d.jpg");
    assert_eq!(export_file_name("line\nbreak", "grid"), "line_break.jpg");
    assert_eq!(export_file_name("   ", "grid"), "grid.jpg");
    assert_eq!(export_file_name("///", "grid"), "grid.jpg");
    assert_eq!(export_file_name("done.JPG", "grid"), "done.JPG");
}

#[test]
fn download_writes_into_dir() {
    let dir = std::env::temp_dir().join(format!("prefgrid-deliver-{}", std::process::id()));
    let mut d = Delivery::download(&dir);
    assert_eq!(d.mode(), DeliveryMode::Download);
    let got = d.deliver("out.jpg", &outcome()).unwrap();
    let Delivered::File(path) = got else {
        panic!("expected a file delivery");
    };
    assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xD8, 0xFF]);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn preview_invokes_callback() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut d = Delivery::Preview(Box::new(move |name, out| {
        sink.borrow_mut().push((name.to_string(), out.bytes.len()));
        Ok(())
    }));
    assert_eq!(
        d.deliver("x.jpg", &outcome()).unwrap(),
        Delivered::Previewed {
            file_name: "x.jpg".into()
        }
    );
    assert_eq!(seen.borrow().as_slice(), &[("x.jpg".to_string(), 3)]);
}

#[test]
fn rejects_names_with_directories() {
    let mut d = Delivery::download(std::env::temp_dir());
    assert!(d.deliver("../x.jpg", &outcome()).is_err());
    assert!(d.deliver("", &outcome()).is_err());
}
