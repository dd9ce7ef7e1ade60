use super::*;

#[test]
fn requests_coalesce_into_one_frame() {
    let mut r = RedrawScheduler::new();
    assert!(!r.take_due());
    for _ in 0..5 {
        r.request();
    }
    assert!(r.has_pending());
    assert!(r.take_due());
    assert!(!r.take_due());
    assert_eq!((r.requested(), r.drawn()), (5, 1));
}

#[test]
fn new_requests_after_a_frame_schedule_another() {
    let mut r = RedrawScheduler::new();
    r.request();
    r.take_due();
    r.request();
    assert!(r.take_due());
    assert_eq!(r.drawn(), 2);
}
