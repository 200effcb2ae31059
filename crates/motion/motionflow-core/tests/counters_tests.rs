use motionflow_core::{
    config::CounterOptions,
    dom::{Document, HostEvent, MediaFeatures, Rect},
    roller::{CLASS_DIGIT, CLASS_ROLLER},
    CountAnimator, ElementId, Grouping, RollerAnimator,
};
use motionflow_test_fixtures::{pages, FakeDocument};

const FRAME_MS: f64 = 16.0;

fn counter(to: &str, top: f64) -> (FakeDocument, ElementId) {
    let mut doc = FakeDocument::new();
    let body = doc.body();
    let el = doc.add_with(body, "span", &[("data-mf-count-to", to)]);
    doc.set_rect(el, Rect::new(top, 0.0, 100.0, 30.0));
    (doc, el)
}

fn roller(from: &str, to: &str, top: f64) -> (FakeDocument, ElementId) {
    let mut doc = FakeDocument::new();
    let body = doc.body();
    let el = doc.add_with(
        body,
        "span",
        &[("data-mf-roller-from", from), ("data-mf-roller-to", to)],
    );
    doc.set_rect(el, Rect::new(top, 0.0, 100.0, 30.0));
    (doc, el)
}

/// Digit shown by one wheel, read back from its transform.
fn wheel_digit(doc: &FakeDocument, wheel: ElementId) -> Option<u32> {
    let t = doc.style(wheel, "transform")?;
    let pct: u32 = t
        .trim_start_matches("translateY(-")
        .trim_end_matches("%)")
        .parse()
        .ok()?;
    Some(pct / 10)
}

fn shown(doc: &FakeDocument, item: &motionflow_core::RollerItem) -> String {
    let hidden = item.total_digits - item.visible_digits();
    item.wheels[hidden..]
        .iter()
        .map(|w| wheel_digit(doc, *w).map_or('?', |d| char::from_digit(d, 10).unwrap_or('?')))
        .collect()
}

#[test]
fn count_formats_with_the_target_grouping() {
    let (mut doc, el) = counter("1,234.5", 100.0);
    let mut count = CountAnimator::new(CounterOptions::default());
    count.init(&mut doc);

    assert_eq!(doc.text(el), "0");
    let item = count.item(el).expect("item");
    assert_eq!(item.grouping, Grouping::Western);
    assert_eq!(item.to_decimals, 1);
    assert_eq!(item.anim_decimals, 1);
    assert!(item.is_animating());

    // First frame pins the start time.
    count.pump(&mut doc);
    assert_eq!(doc.text(el), "0.0");

    doc.set_now(300.0);
    count.pump(&mut doc);
    assert_eq!(doc.text(el), "308.6");

    doc.set_now(1200.0);
    count.pump(&mut doc);
    assert_eq!(doc.text(el), "1,234.5");
    assert!(!count.item(el).expect("item").is_animating());
    assert!(count.is_idle());
}

#[test]
fn count_resets_when_scrolled_back_below() {
    let (mut doc, el) = counter("500", 1000.0);
    let mut count = CountAnimator::new(CounterOptions::default());
    count.init(&mut doc);
    assert!(!count.item(el).expect("item").is_animating());

    doc.set_scroll(400.0);
    count.handle(&mut doc, &HostEvent::Scroll);
    count.pump(&mut doc);
    assert!(count.item(el).expect("item").is_animating());

    count.pump(&mut doc);
    doc.advance(600.0);
    count.pump(&mut doc);
    assert_ne!(doc.text(el), "0");

    doc.set_scroll(0.0);
    count.handle(&mut doc, &HostEvent::Scroll);
    count.pump(&mut doc);
    assert_eq!(doc.text(el), "0");
    assert!(!count.item(el).expect("item").is_animating());
}

#[test]
fn count_under_reduced_motion_jumps_to_the_target() {
    let (mut doc, el) = counter("12,34,567", 100.0);
    doc.set_media(MediaFeatures {
        reduced_motion: true,
        can_hover: false,
    });
    let mut count = CountAnimator::new(CounterOptions::default());
    count.init(&mut doc);
    assert_eq!(doc.text(el), "12,34,567");
    assert!(count.is_idle());
}

#[test]
fn count_skips_unparsable_targets_and_resets_on_destroy() {
    let mut doc = FakeDocument::new();
    let body = doc.body();
    let bad = doc.add_with(body, "span", &[("data-mf-count-to", "soon")]);
    let good = doc.add_with(
        body,
        "span",
        &[("data-mf-count-to", "40"), ("data-mf-count-from", "10")],
    );
    doc.set_text(bad, "soon");
    doc.set_rect(good, Rect::new(100.0, 0.0, 10.0, 10.0));

    let mut count = CountAnimator::new(CounterOptions::default());
    count.init(&mut doc);
    assert_eq!(count.items().len(), 1);
    assert_eq!(doc.text(bad), "soon");
    assert_eq!(doc.text(good), "10");

    count.pump(&mut doc);
    doc.advance(2000.0);
    count.pump(&mut doc);
    assert_eq!(doc.text(good), "40");

    count.destroy(&mut doc, true);
    assert_eq!(doc.text(good), "10");
    assert!(count.items().is_empty());
}

#[test]
fn roller_grows_one_slot_at_a_time() {
    let (mut doc, el) = roller("9", "100", 100.0);
    let mut rollers = RollerAnimator::new(CounterOptions::default());
    rollers.init(&mut doc);

    let wrapper = doc.children(el);
    assert_eq!(wrapper.len(), 1);
    assert!(doc.has_class(wrapper[0], CLASS_ROLLER));
    assert_eq!(doc.query_class(CLASS_DIGIT).len(), 3);

    let item = rollers.item(el).expect("item").clone();
    assert_eq!(item.initial_digits, 1);
    assert_eq!(item.target_digits, 3);
    assert_eq!(item.total_digits, 3);
    assert_eq!(item.visible_digits(), 1);
    assert_eq!(doc.style(item.slots[0], "width").as_deref(), Some("0"));
    assert_eq!(doc.style(item.slots[2], "width"), None);
    assert_eq!(shown(&doc, &item), "9");

    let mut slots_seen = vec![1];
    let mut t = 0.0;
    while t <= 1300.0 {
        doc.set_now(t);
        rollers.pump(&mut doc);
        let visible = rollers.item(el).expect("item").visible_digits();
        if slots_seen.last() != Some(&visible) {
            slots_seen.push(visible);
        }
        t += FRAME_MS;
    }
    assert_eq!(slots_seen, vec![1, 2, 3]);

    let item = rollers.item(el).expect("item");
    assert!(!item.is_animating());
    assert_eq!(item.visible_digits(), 3);
    assert_eq!(shown(&doc, item), "100");
    assert_eq!(doc.style(item.slots[0], "width"), None);
    assert!(rollers.is_idle());
}

#[test]
fn roller_shrinks_when_the_target_is_shorter() {
    let (mut doc, el) = roller("1,000", "50", 100.0);
    let mut rollers = RollerAnimator::new(CounterOptions::default());
    rollers.init(&mut doc);

    let mut t = 0.0;
    while t <= 1300.0 {
        doc.set_now(t);
        rollers.pump(&mut doc);
        t += FRAME_MS;
    }
    let item = rollers.item(el).expect("item");
    assert_eq!(item.total_digits, 4);
    assert_eq!(item.visible_digits(), 2);
    assert_eq!(shown(&doc, item), "50");
}

#[test]
fn roller_reduced_motion_and_destroy() {
    let (mut doc, el) = roller("3", "42", 100.0);
    doc.set_media(MediaFeatures {
        reduced_motion: true,
        can_hover: false,
    });
    let mut rollers = RollerAnimator::new(CounterOptions::default());
    rollers.init(&mut doc);

    let item = rollers.item(el).expect("item");
    assert_eq!(item.visible_digits(), 2);
    assert_eq!(shown(&doc, item), "42");
    assert!(rollers.is_idle());

    rollers.destroy(&mut doc, true);
    assert_eq!(doc.text(el), "3");
    assert!(doc.children(el).is_empty());
    assert!(!rollers.is_active());
}

#[test]
fn roller_without_elements_stays_inactive() {
    let mut doc = FakeDocument::new();
    let mut rollers = RollerAnimator::new(CounterOptions::default());
    rollers.init(&mut doc);
    assert!(!rollers.is_active());
    rollers.handle(&mut doc, &HostEvent::Scroll);
    assert!(rollers.is_idle());
}

#[test]
fn counters_page_fixture() {
    let mut doc = pages::load("counters").expect("fixture");
    let mut count = CountAnimator::new(CounterOptions::default());
    let mut rollers = RollerAnimator::new(CounterOptions::default());
    count.init(&mut doc);
    rollers.init(&mut doc);

    assert_eq!(count.items().len(), 2);
    assert_eq!(rollers.items().len(), 1);
    let indian = count.items()[1].element;
    assert_eq!(count.items()[1].grouping, Grouping::Indian);
    assert_eq!(doc.text(indian), "100");
    // Below the 90% line of an 800px viewport.
    assert!(count.items().iter().all(|i| !i.is_animating()));

    doc.set_scroll(300.0);
    count.handle(&mut doc, &HostEvent::Scroll);
    rollers.handle(&mut doc, &HostEvent::Scroll);
    count.pump(&mut doc);
    rollers.pump(&mut doc);
    assert!(count.items().iter().all(|i| i.is_animating()));
    assert!(rollers.items()[0].is_animating());
}
