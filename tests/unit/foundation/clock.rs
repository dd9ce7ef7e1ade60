use super::*;
use std::rc::Rc;

#[test]
fn manual_clock_advances_and_sets() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_millis(), 1_000);
    clock.advance(Duration::from_secs(2));
    assert_eq!(clock.now_millis(), 3_000);
    clock.set(5);
    assert_eq!(clock.now_millis(), 5);
}

#[test]
fn shared_clock_observes_updates() {
    let clock = Rc::new(ManualClock::new(0));
    let handle = Rc::clone(&clock);
    clock.advance(Duration::from_millis(250));
    assert_eq!(handle.now_millis(), 250);
}

#[test]
fn system_clock_is_past_2020() {
    assert!(SystemClock.now_millis() > 1_577_836_800_000);
}
