use motionflow_core::{
    attrs,
    config::{TextOptions, TypingOptions},
    dom::{Document, MediaFeatures},
    entrance::{CLASS_ANIMATE, PROP_DISTANCE, PROP_DURATION, PROP_EASING},
    text::{CLASS_CURSOR, CLASS_CURSOR_STATIC, CLASS_SR_ONLY},
    ElementId, TextEffects, TextKind,
};
use motionflow_test_fixtures::FakeDocument;

const LOOP: &str = concat!(
    r#"<p data-mf-text-type="loop" data-mf-text-loop-easing="ease-out-cubic">"#,
    "<span>One</span><span> </span><span>Two</span><span>Three</span>",
    "</p>",
);

const TYPING: &str = r#"<h2 data-mf-text-type="typing"><span>Hi</span><span>Yo!</span></h2>"#;

fn reduced() -> MediaFeatures {
    MediaFeatures {
        reduced_motion: true,
        can_hover: false,
    }
}

/// Runs every task due up to `until`, in deadline order.
fn run_until(doc: &mut FakeDocument, fx: &mut TextEffects, until: f64) {
    while let Some(t) = fx.next_deadline().filter(|t| *t <= until) {
        doc.set_now(t);
        fx.pump(doc);
    }
    doc.set_now(until);
    fx.pump(doc);
}

/// `(live region, typed text, cursor)` of a typing element.
fn typing_parts(doc: &FakeDocument, el: ElementId) -> (ElementId, ElementId, Option<ElementId>) {
    let parts = doc.children(el);
    let visual = doc.children(parts[1]);
    (parts[0], visual[0], visual.get(1).copied())
}

#[test]
fn loop_shows_one_child_at_a_time() {
    let mut doc = FakeDocument::from_html(LOOP);
    let el = doc.query_attr(attrs::TEXT_TYPE)[0];
    let kids = doc.children(el);
    let shown = [kids[0], kids[2], kids[3]];
    let mut fx = TextEffects::new(TextOptions::default());
    fx.init(&mut doc);

    let inst = fx.instance(el).expect("instance");
    assert_eq!(inst.kind, TextKind::Loop);
    assert_eq!(inst.current_index(), Some(0));

    assert_eq!(doc.style(shown[0], "display").as_deref(), Some("inline-block"));
    assert_eq!(doc.style(shown[1], "display").as_deref(), Some("none"));
    assert_eq!(doc.style(shown[0], "white-space").as_deref(), Some("nowrap"));
    assert_eq!(doc.attr(shown[2], attrs::ANIMATION).as_deref(), Some("fade-up"));
    assert_eq!(doc.style(shown[1], PROP_DURATION).as_deref(), Some("500ms"));
    assert_eq!(doc.style(shown[1], PROP_DISTANCE).as_deref(), Some("40px"));
    assert_eq!(
        doc.style(shown[1], PROP_EASING).as_deref(),
        Some("cubic-bezier(0.215, 0.61, 0.355, 1)")
    );
    // Whitespace-only children are left alone.
    assert_eq!(doc.style(kids[1], "display"), None);
    assert!(!doc.has_class(shown[0], CLASS_ANIMATE));

    // The first entrance waits one frame.
    fx.pump(&mut doc);
    assert!(doc.has_class(shown[0], CLASS_ANIMATE));
    assert_eq!(fx.next_deadline(), Some(2000.0));

    run_until(&mut doc, &mut fx, 2000.0);
    assert_eq!(fx.instance(el).expect("instance").current_index(), Some(1));
    assert!(!doc.has_class(shown[0], CLASS_ANIMATE));
    assert_eq!(doc.style(shown[0], "display").as_deref(), Some("none"));
    assert_eq!(doc.style(shown[1], "display").as_deref(), Some("inline-block"));
    assert!(doc.has_class(shown[1], CLASS_ANIMATE));
    assert_eq!(doc.style(shown[1], "transition"), None);
    assert_eq!(doc.reflows(), 1);

    run_until(&mut doc, &mut fx, 6000.0);
    assert_eq!(fx.instance(el).expect("instance").current_index(), Some(0));
    assert!(doc.has_class(shown[0], CLASS_ANIMATE));
    assert_eq!(doc.reflows(), 3);
}

#[test]
fn loop_destroy_strips_what_setup_added() {
    let mut doc = FakeDocument::from_html(LOOP);
    let el = doc.query_attr(attrs::TEXT_TYPE)[0];
    let first = doc.children(el)[0];
    let mut fx = TextEffects::new(TextOptions::default());
    fx.init(&mut doc);
    fx.pump(&mut doc);

    fx.destroy(&mut doc, true);
    assert_eq!(doc.style(first, "display"), None);
    assert_eq!(doc.style(first, PROP_DURATION), None);
    assert!(!doc.has_attr(first, attrs::ANIMATION));
    assert!(!doc.has_class(first, CLASS_ANIMATE));
    assert!(fx.is_idle());
    assert!(!fx.is_active());
}

#[test]
fn typing_types_waits_deletes_and_moves_on() {
    let mut doc = FakeDocument::from_html(TYPING);
    let el = doc.query_attr(attrs::TEXT_TYPE)[0];
    let mut fx = TextEffects::new(TextOptions::default());
    fx.init(&mut doc);

    let (live, text, cursor) = typing_parts(&doc, el);
    let cursor = cursor.expect("cursor");
    assert!(doc.has_class(live, CLASS_SR_ONLY));
    assert_eq!(doc.attr(live, "aria-live").as_deref(), Some("polite"));
    assert_eq!(doc.text(live), "Hi");
    assert!(doc.has_class(cursor, CLASS_CURSOR));
    assert!(!doc.has_class(cursor, CLASS_CURSOR_STATIC));
    assert_eq!(doc.text(cursor), "|");

    // First character goes in synchronously.
    assert_eq!(doc.text(text), "H");
    run_until(&mut doc, &mut fx, 80.0);
    assert_eq!(doc.text(text), "Hi");

    // Full string held for the interval, then deleted at delete speed.
    run_until(&mut doc, &mut fx, 1279.0);
    assert_eq!(doc.text(text), "Hi");
    run_until(&mut doc, &mut fx, 1280.0);
    assert_eq!(doc.text(text), "H");
    run_until(&mut doc, &mut fx, 1320.0);
    assert_eq!(doc.text(text), "");
    assert_eq!(fx.instance(el).expect("instance").current_index(), Some(1));

    run_until(&mut doc, &mut fx, 1560.0);
    assert_eq!(doc.text(text), "Yo!");
    assert_eq!(doc.text(live), "Yo!");

    // And back to the first string.
    run_until(&mut doc, &mut fx, 2760.0 + 3.0 * 40.0 + 80.0);
    assert_eq!(fx.instance(el).expect("instance").current_index(), Some(0));
    assert_eq!(doc.text(text), "H");
}

#[test]
fn typing_without_repeat_stops_on_the_last_string() {
    let mut doc = FakeDocument::from_html(concat!(
        r#"<h2 data-mf-text-type="typing" data-mf-text-typing-loop="false" "#,
        r#"data-mf-text-typing-cursor-blink="false" data-mf-text-typing-cursor-char="_">"#,
        "<span>ab</span></h2>",
    ));
    let el = doc.query_attr(attrs::TEXT_TYPE)[0];
    let mut fx = TextEffects::new(TextOptions::default());
    fx.init(&mut doc);

    let (_, text, cursor) = typing_parts(&doc, el);
    let cursor = cursor.expect("cursor");
    assert!(doc.has_class(cursor, CLASS_CURSOR_STATIC));
    assert_eq!(doc.text(cursor), "_");

    run_until(&mut doc, &mut fx, 80.0);
    assert_eq!(doc.text(text), "ab");
    assert_eq!(doc.style(cursor, "display").as_deref(), Some("none"));
    assert!(fx.is_idle());
}

#[test]
fn typing_options_tune_speed_and_cursor() {
    let mut doc = FakeDocument::from_html(TYPING);
    let el = doc.query_attr(attrs::TEXT_TYPE)[0];
    let options = TextOptions {
        typing: TypingOptions {
            speed: 20.0,
            cursor: false,
            ..TypingOptions::default()
        },
        ..TextOptions::default()
    };
    let mut fx = TextEffects::new(options);
    fx.init(&mut doc);

    let (_, text, cursor) = typing_parts(&doc, el);
    assert_eq!(cursor, None);
    assert_eq!(fx.next_deadline(), Some(20.0));
    run_until(&mut doc, &mut fx, 20.0);
    assert_eq!(doc.text(text), "Hi");
}

#[test]
fn typing_destroy_restores_markup_and_refresh_rebuilds() {
    let mut doc = FakeDocument::from_html(TYPING);
    let el = doc.query_attr(attrs::TEXT_TYPE)[0];
    let before = doc.inner_html(el);
    let mut fx = TextEffects::new(TextOptions::default());
    fx.init(&mut doc);
    assert_ne!(doc.inner_html(el), before);

    fx.refresh(&mut doc);
    assert_eq!(fx.instances().len(), 1);
    assert_eq!(doc.children(el).len(), 2);
    let (live, _, _) = typing_parts(&doc, el);
    assert_eq!(doc.text(live), "Hi");

    fx.destroy(&mut doc, true);
    assert_eq!(doc.inner_html(el), before);
    assert_eq!(doc.text(el), "HiYo!");
}

#[test]
fn reduced_motion_shows_static_content() {
    let mut doc = FakeDocument::from_html(&format!("{LOOP}{TYPING}"));
    doc.set_media(reduced());
    let els = doc.query_attr(attrs::TEXT_TYPE);
    let (cycle, typing) = (els[0], els[1]);
    let kids = doc.children(cycle);
    let before = doc.inner_html(typing);

    let mut fx = TextEffects::new(TextOptions::default());
    fx.init(&mut doc);
    assert!(fx.instances().iter().all(|i| i.is_static()));
    assert!(fx.is_idle());

    assert_eq!(doc.style(kids[0], "display"), None);
    assert_eq!(doc.style(kids[2], "display").as_deref(), Some("none"));
    assert!(!doc.has_attr(kids[0], attrs::ANIMATION));
    assert_eq!(doc.text(typing), "Hi");

    fx.destroy(&mut doc, true);
    assert_eq!(doc.inner_html(typing), before);
}

#[test]
fn unknown_types_and_empty_elements_are_skipped() {
    let mut doc = FakeDocument::from_html(concat!(
        r#"<p data-mf-text-type="scramble"><span>x</span></p>"#,
        r#"<p data-mf-text-type="loop"><span> </span></p>"#,
        r#"<p data-mf-text-type="typing"></p>"#,
    ));
    let mut fx = TextEffects::new(TextOptions::default());
    fx.init(&mut doc);
    assert!(fx.instances().is_empty());
    assert!(fx.is_active());
    assert!(fx.is_idle());
}
