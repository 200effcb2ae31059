use motionflow_core::{
    attrs,
    dom::{Document, HostEvent},
    entrance::{CLASS_ANIMATE, CLASS_INIT, PROP_DURATION},
    ticker::build::CLASS_CONTENT,
    MotionFlow, Options,
};
use motionflow_test_fixtures::{options, pages};

#[test]
fn fixture_keys_resolve() {
    for key in pages::keys() {
        assert!(pages::path(&key).expect("path").exists(), "page {key}");
    }
    for key in options::keys() {
        let opts: Options = options::load(&key).expect("options");
        let raw = options::json(&key).expect("json");
        assert_eq!(Options::from_json(&raw).expect("parse"), opts);
    }
    assert!(pages::load("missing").is_err());
}

#[test]
fn tuned_options_override_sections() {
    let opts: Options = options::load("tuned").expect("options");
    assert!(opts.animation.once);
    assert_eq!(opts.animation.distance, 60.0);
    assert_eq!(opts.animation.easing, "ease-out-cubic");
    assert_eq!(opts.animation.repeat, "both");
    assert_eq!(opts.parallax.tablet_speed, 0.4);
    assert_eq!(opts.roller.trigger, "center 50%");
    assert_eq!(opts.ticker.speed, 120.0);
    assert_eq!(opts.ticker.direction, "right");
    assert!(opts.ticker.pause_on_hover);
    assert!(opts.ticker.pause_on_visibility_change);
    assert_eq!(opts.text.typing.speed, 50.0);
    assert_eq!(opts.text.typing.cursor_char, "_");
    assert_eq!(opts.text.cycle.interval, 2000.0);

    let defaults: Options = options::load("defaults").expect("options");
    assert_eq!(defaults, Options::default());
}

#[test]
fn auto_init_starts_every_effect_once() {
    let mut doc = pages::load("landing").expect("fixture");
    let mut mf = MotionFlow::new();
    assert!(mf.auto_init(&mut doc));
    assert!(mf.is_running());
    assert!(!mf.auto_init(&mut doc));

    assert!(mf.entrance().expect("entrance").items().len() >= 3);
    assert_eq!(mf.parallax().expect("parallax").items().len(), 1);
    assert_eq!(mf.count().expect("count").items().len(), 1);
    assert!(!mf.roller().expect("roller").is_active());
    assert_eq!(mf.text().expect("text").instances().len(), 1);
    assert_eq!(mf.ticker().expect("ticker").instances().len(), 1);

    let h1 = doc.query_attr(attrs::ANIMATION)[0];
    assert!(doc.has_class(h1, CLASS_ANIMATE));
    assert!(!mf.is_idle());
    assert!(mf.next_deadline().is_some());
}

#[test]
fn manual_init_disables_auto_init() {
    let mut doc = pages::load("landing").expect("fixture");
    let mut mf = MotionFlow::new();
    mf.init(&mut doc, Options::default());
    assert!(!mf.auto_init(&mut doc));
    assert!(mf.is_running());
}

#[test]
fn reinit_reconfigures_the_ticker_without_stacking() {
    let mut doc = pages::load("landing").expect("fixture");
    let mut mf = MotionFlow::new();
    mf.init(&mut doc, Options::default());
    let entrance_items = mf.entrance().expect("entrance").items().len();

    let tuned: Options = options::load("tuned").expect("options");
    mf.init(&mut doc, tuned.clone());
    assert_eq!(mf.options(), &tuned);

    let ticker = mf.ticker().expect("ticker");
    assert_eq!(ticker.instances().len(), 1);
    assert_eq!(ticker.instances()[0].config.speed, 120.0);
    assert_eq!(doc.query_class(CLASS_CONTENT).len(), 2);
    assert_eq!(mf.entrance().expect("entrance").items().len(), entrance_items);
    assert_eq!(mf.text().expect("text").instances().len(), 1);

    let body = doc.body();
    assert_eq!(doc.style(body, PROP_DURATION).as_deref(), Some("800ms"));
}

#[test]
fn events_reach_every_effect() {
    let mut doc = pages::load("landing").expect("fixture");
    let mut mf = MotionFlow::new();
    mf.init(&mut doc, Options::default());
    mf.pump(&mut doc);

    let count = mf.count().expect("count").items()[0].element;
    assert!(!mf.count().expect("count").items()[0].is_animating());

    doc.set_scroll(1200.0);
    mf.handle(&mut doc, &HostEvent::Scroll);
    mf.pump(&mut doc);
    assert!(mf.count().expect("count").item(count).expect("item").is_animating());

    mf.pause_ticker(&mut doc, None);
    assert!(mf.ticker().expect("ticker").instances()[0].is_paused());
    mf.toggle_ticker(&mut doc, None);
    assert!(!mf.ticker().expect("ticker").instances()[0].is_paused());
}

#[test]
fn per_effect_lifecycle() {
    let mut doc = pages::load("landing").expect("fixture");
    let mut mf = MotionFlow::new();
    mf.init(&mut doc, Options::default());

    mf.destroy_ticker(&mut doc);
    assert!(mf.ticker().is_none());
    mf.pause_ticker(&mut doc, None);
    mf.init_ticker(&mut doc);
    assert_eq!(mf.ticker().expect("ticker").instances().len(), 1);

    mf.destroy_entrance(&mut doc);
    assert!(mf.entrance().is_none());
    mf.refresh_entrance(&mut doc);
    assert!(mf.entrance().is_none());
    mf.init_entrance(&mut doc);
    mf.refresh_entrance(&mut doc);
    assert!(mf.entrance().expect("entrance").is_active());

    mf.refresh_parallax(&mut doc);
    mf.refresh_count(&mut doc);
    mf.refresh_text(&mut doc);
    mf.refresh_ticker(&mut doc);
    assert_eq!(mf.parallax().expect("parallax").items().len(), 1);
    assert_eq!(mf.count().expect("count").items().len(), 1);
    assert_eq!(mf.text().expect("text").instances().len(), 1);
    assert_eq!(doc.query_class(CLASS_CONTENT).len(), 2);
}

#[test]
fn destroy_restores_the_page() {
    let mut doc = pages::load("landing").expect("fixture");
    let ticker = doc.query_attr(attrs::TICKER)[0];
    let layer = doc.query_attr(attrs::PARALLAX)[0];
    let originals = doc.children(ticker);
    let mut mf = MotionFlow::new();
    mf.init(&mut doc, Options::default());
    mf.pump(&mut doc);
    doc.advance(100.0);
    mf.pump(&mut doc);

    mf.destroy(&mut doc);
    assert!(!mf.is_running());
    assert!(mf.is_idle());
    assert_eq!(mf.next_deadline(), None);
    assert!(mf.ticker().is_none());

    assert_eq!(doc.children(ticker), originals);
    assert!(doc.query_class(CLASS_INIT).is_empty());
    assert!(doc.query_class(CLASS_ANIMATE).is_empty());
    assert_eq!(doc.style(doc.body(), PROP_DURATION), None);
    assert_eq!(doc.style(layer, "transform"), None);
    // Only the authored entrance elements keep the attribute.
    assert_eq!(doc.query_attr(attrs::ANIMATION).len(), 3);
}
