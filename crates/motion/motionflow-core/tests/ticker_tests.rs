use motionflow_core::{
    config::TickerOptions,
    dom::{Document, HostEvent, MediaFeatures, MutationRecord, Rect},
    ticker::{build::CLASS_CONTENT, CLASS_PAUSED},
    ElementId, Ticker, TickerRegistry,
};
use motionflow_test_fixtures::{pages, FakeDocument};

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn row() -> (FakeDocument, ElementId) {
    let doc = pages::load("ticker-row").expect("fixture");
    let container = doc.query_attr("data-mf-ticker")[0];
    (doc, container)
}

fn frames(doc: &mut FakeDocument, ticker: &mut Ticker, n: usize, dt: f64) {
    for _ in 0..n {
        doc.advance(dt);
        ticker.pump(doc);
    }
}

fn position(ticker: &Ticker, container: ElementId) -> f64 {
    ticker.instance(container).expect("instance").position()
}

#[test]
fn strip_overfills_viewport_by_one_unit() {
    let (mut doc, container) = row();
    let originals = doc.children(container);
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);

    let inst = ticker.instance(container).expect("instance");
    let strip = &inst.strip;
    assert_eq!(strip.unit, 300.0);
    assert_eq!(strip.viewport_size, 1000.0);
    assert_eq!(strip.cycles, 4);
    assert_eq!(strip.loop_size, 1500.0);
    assert!(strip.loop_size >= strip.viewport_size + strip.unit);

    assert_eq!(doc.children(container), vec![strip.viewport]);
    assert_eq!(doc.children(strip.track).len(), 2);
    assert_eq!(doc.children(strip.content).len(), 15);
    assert_eq!(&doc.children(strip.content)[..3], &originals[..]);
    assert_eq!(doc.query_class(CLASS_CONTENT).len(), 2);
    assert_eq!(
        doc.style(strip.track, "transform").as_deref(),
        Some("translate3d(0px,0,0)")
    );
}

#[test]
fn moves_at_constant_speed_and_wraps_by_one_period() {
    let (mut doc, container) = row();
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    let track = ticker.instance(container).expect("instance").strip.track;

    ticker.pump(&mut doc);
    assert_eq!(position(&ticker, container), 0.0);

    frames(&mut doc, &mut ticker, 1, 16.0);
    approx(position(&ticker, container), -1.28, 1e-9);
    assert_eq!(doc.style(track, "transform").as_deref(), Some("translate3d(-1px,0,0)"));

    for _ in 0..1000 {
        frames(&mut doc, &mut ticker, 1, 50.0);
        let pos = position(&ticker, container);
        assert!(pos > -1500.0 && pos <= 0.0, "pos={pos}");
    }
    // 1.28 + 1000 * 4 = 4001.28 → one period is 1500.
    approx(position(&ticker, container), -(4001.28 - 3000.0), 1e-6);
}

#[test]
fn position_stays_within_one_period_for_any_speed() {
    for (speed, direction) in [("-500", "left"), ("100000", "left"), ("100000", "right"), ("NaN", "left")] {
        let (mut doc, container) = row();
        doc.set_attr(container, "data-mf-ticker-speed", speed);
        doc.set_attr(container, "data-mf-ticker-direction", direction);
        let mut ticker = Ticker::new(TickerOptions::default());
        ticker.init(&mut doc);
        ticker.pump(&mut doc);

        let loop_size = ticker.instance(container).expect("instance").loop_size();
        for _ in 0..200 {
            frames(&mut doc, &mut ticker, 1, 50.0);
            let pos = position(&ticker, container);
            assert!(
                (-loop_size..=0.0).contains(&pos) && pos.is_finite(),
                "speed={speed} direction={direction} pos={pos} loop={loop_size}"
            );
        }
    }
}

#[test]
fn unusable_speeds_fall_back() {
    let (mut doc, container) = row();
    doc.set_attr(container, "data-mf-ticker-speed", "-500");
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    assert_eq!(ticker.instance(container).expect("instance").config.speed, 80.0);

    let (mut doc, container) = row();
    let mut ticker = Ticker::new(TickerOptions {
        speed: -20.0,
        ..TickerOptions::default()
    });
    ticker.init(&mut doc);
    assert_eq!(ticker.instance(container).expect("instance").config.speed, 80.0);
}

#[test]
fn long_gaps_are_clamped_to_one_step() {
    let (mut doc, container) = row();
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    ticker.pump(&mut doc);

    frames(&mut doc, &mut ticker, 1, 10_000.0);
    approx(position(&ticker, container), -4.0, 1e-9);
}

#[test]
fn pause_sources_layer_and_resume_from_the_same_spot() {
    let (mut doc, container) = row();
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    ticker.pump(&mut doc);
    frames(&mut doc, &mut ticker, 10, 16.0);
    let held = position(&ticker, container);

    ticker.pause(&mut doc, None);
    assert!(doc.has_class(container, CLASS_PAUSED));
    frames(&mut doc, &mut ticker, 10, 16.0);
    assert_eq!(position(&ticker, container), held);

    doc.set_hidden(true);
    ticker.handle(&mut doc, &HostEvent::VisibilityChange);
    ticker.play(&mut doc, None);
    let inst = ticker.instance(container).expect("instance");
    assert!(!inst.is_paused_by_user());
    assert!(inst.is_paused());
    assert!(doc.has_class(container, CLASS_PAUSED));
    frames(&mut doc, &mut ticker, 10, 16.0);
    assert_eq!(position(&ticker, container), held);

    // The hidden period does not count as elapsed time.
    doc.advance(5_000.0);
    doc.set_hidden(false);
    ticker.handle(&mut doc, &HostEvent::VisibilityChange);
    assert!(!doc.has_class(container, CLASS_PAUSED));
    frames(&mut doc, &mut ticker, 1, 16.0);
    approx(position(&ticker, container), held - 1.28, 1e-9);
}

#[test]
fn toggle_flips_the_effective_state() {
    let (mut doc, container) = row();
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);

    ticker.toggle(&mut doc, Some(&[container]));
    assert!(ticker.instance(container).expect("instance").is_paused());
    ticker.toggle(&mut doc, None);
    assert!(!ticker.instance(container).expect("instance").is_paused());
}

#[test]
fn hover_pauses_only_when_the_pointer_can_hover() {
    let (mut doc, container) = row();
    doc.set_media(MediaFeatures {
        reduced_motion: false,
        can_hover: true,
    });
    let options = TickerOptions {
        pause_on_hover: true,
        ..TickerOptions::default()
    };
    let mut ticker = Ticker::new(options.clone());
    ticker.init(&mut doc);
    let viewport = ticker.instance(container).expect("instance").strip.viewport;
    assert!(doc.is_hover_listening(viewport));

    ticker.handle(&mut doc, &HostEvent::PointerEnter(viewport));
    assert!(ticker.instance(container).expect("instance").is_paused());
    ticker.handle(&mut doc, &HostEvent::PointerLeave(viewport));
    assert!(!ticker.instance(container).expect("instance").is_paused());

    // A user pause wins over hover.
    ticker.pause(&mut doc, None);
    ticker.handle(&mut doc, &HostEvent::PointerEnter(viewport));
    ticker.handle(&mut doc, &HostEvent::PointerLeave(viewport));
    assert!(ticker.instance(container).expect("instance").is_paused());

    ticker.destroy(&mut doc, true);
    assert!(!doc.is_hover_listening(viewport));

    let (mut touch, container) = row();
    let mut ticker = Ticker::new(options);
    ticker.init(&mut touch);
    let viewport = ticker.instance(container).expect("instance").strip.viewport;
    assert!(!touch.is_hover_listening(viewport));
}

#[test]
fn rebuild_keeps_the_user_pause() {
    let (mut doc, container) = row();
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    ticker.pause(&mut doc, None);
    let old_track = ticker.instance(container).expect("instance").strip.track;

    ticker.refresh(&mut doc);
    let inst = ticker.instance(container).expect("instance");
    assert_ne!(inst.strip.track, old_track);
    assert!(inst.is_paused_by_user());
    assert_eq!(inst.strip.loop_size, 1500.0);
    assert_eq!(doc.children(inst.strip.content).len(), 15);
}

#[test]
fn attribute_mutations_rebuild_after_a_quiet_period() {
    let (mut doc, container) = row();
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    ticker.pump(&mut doc);

    doc.set_attr(container, "data-mf-ticker-speed", "200");
    let record = MutationRecord::Attributes {
        target: container,
        name: "data-mf-ticker-speed".into(),
    };
    ticker.handle(&mut doc, &HostEvent::Mutations(vec![record]));
    assert_eq!(ticker.next_deadline(), Some(80.0));
    assert_eq!(ticker.instance(container).expect("instance").config.speed, 80.0);

    doc.advance(80.0);
    ticker.pump(&mut doc);
    assert_eq!(ticker.instance(container).expect("instance").config.speed, 200.0);
}

#[test]
fn direction_attributes() {
    let mut doc = FakeDocument::from_html(concat!(
        r#"<div data-mf-ticker data-mf-ticker-direction="up" data-test-rect="0 0 300 100">"#,
        r#"<p data-test-rect="0 0 300 30">a</p><p data-test-rect="0 0 300 30">b</p><p data-test-rect="0 0 300 30">c</p>"#,
        r#"</div>"#,
        r#"<div data-mf-ticker data-mf-ticker-direction="right" data-test-rect="0 0 1000 50">"#,
        r#"<span data-test-rect="0 0 100 50">a</span><span data-test-rect="0 0 100 50">b</span><span data-test-rect="0 0 100 50">c</span>"#,
        r#"</div>"#,
        r#"<div data-mf-ticker data-mf-ticker-direction="diagonal" data-test-rect="0 0 1000 50">"#,
        r#"<span data-test-rect="0 0 500 50">a</span>"#,
        r#"</div>"#,
    ));
    let containers = doc.query_attr("data-mf-ticker");
    let options = TickerOptions {
        direction: "down".into(),
        ..TickerOptions::default()
    };
    let mut ticker = Ticker::new(options);
    ticker.init(&mut doc);

    let up = ticker.instance(containers[0]).expect("up");
    assert_eq!(up.strip.unit, 90.0);
    assert_eq!(up.strip.cycles, 2);
    assert_eq!(up.loop_size(), 270.0);
    assert_eq!(doc.style(up.strip.track, "flex-direction").as_deref(), Some("column"));
    assert_eq!(
        doc.style(up.strip.track, "transform").as_deref(),
        Some("translate3d(0,0px,0)")
    );

    let right = ticker.instance(containers[1]).expect("right");
    assert_eq!(right.position(), -1500.0);
    assert_eq!(
        doc.style(right.strip.track, "transform").as_deref(),
        Some("translate3d(-1500px,0,0)")
    );

    // Unknown literals fall back to left, not to the global direction.
    let unknown = ticker.instance(containers[2]).expect("unknown");
    assert_eq!(unknown.position(), 0.0);
    assert!(unknown.config.direction.is_horizontal());

    frames(&mut doc, &mut ticker, 1, 50.0);
    approx(ticker.instance(containers[1]).expect("right").position(), -1496.0, 1e-9);
    approx(ticker.instance(containers[0]).expect("up").position(), -4.0, 1e-9);
}

#[test]
fn zero_size_content_is_retried_on_refresh() {
    let mut doc = FakeDocument::from_html(
        r#"<div data-mf-ticker data-test-rect="0 0 1000 50"><span>a</span><span>b</span></div>"#,
    );
    let container = doc.query_attr("data-mf-ticker")[0];
    let originals = doc.children(container);
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    assert!(ticker.instances().is_empty());

    for el in &originals {
        doc.set_rect(*el, Rect::new(0.0, 0.0, 250.0, 50.0));
    }
    ticker.refresh(&mut doc);
    let inst = ticker.instance(container).expect("instance");
    assert_eq!(inst.strip.unit, 500.0);
    assert_eq!(inst.loop_size(), 1500.0);
}

#[test]
fn images_and_fonts_trigger_one_rebuild_each() {
    let mut doc = FakeDocument::from_html(concat!(
        r#"<div data-mf-ticker data-test-rect="0 0 1000 50">"#,
        r#"<img src="logo.png" data-test-rect="0 0 400 50"><span data-test-rect="0 0 200 50">x</span>"#,
        r#"</div>"#,
    ));
    doc.set_font_api(true);
    let container = doc.query_attr("data-mf-ticker")[0];
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    assert_eq!(doc.image_waits(), &[container]);
    assert_eq!(doc.font_waits(), 1);

    let first = ticker.instance(container).expect("instance").strip.track;
    ticker.handle(&mut doc, &HostEvent::ImagesSettled(container));
    let second = ticker.instance(container).expect("instance").strip.track;
    assert_ne!(first, second);
    assert_eq!(doc.image_waits().len(), 1);

    ticker.handle(&mut doc, &HostEvent::FontsReady);
    let third = ticker.instance(container).expect("instance").strip.track;
    assert_ne!(second, third);

    // Settled sources do not rebuild again.
    ticker.handle(&mut doc, &HostEvent::FontsReady);
    assert_eq!(ticker.instance(container).expect("instance").strip.track, third);
    ticker.init(&mut doc);
    assert_eq!(doc.font_waits(), 1);
}

#[test]
fn destroy_restores_the_original_children() {
    let (mut doc, container) = row();
    let originals = doc.children(container);
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    ticker.pause(&mut doc, None);

    ticker.destroy(&mut doc, true);
    assert_eq!(doc.children(container), originals);
    assert!(!doc.has_class(container, CLASS_PAUSED));
    assert!(doc.query_class(CLASS_CONTENT).is_empty());
    assert!(ticker.is_idle());
    assert!(!ticker.is_active());
}

#[test]
fn reduced_motion_leaves_tickers_untouched() {
    let (mut doc, container) = row();
    let originals = doc.children(container);
    doc.set_media(MediaFeatures {
        reduced_motion: true,
        can_hover: true,
    });
    let mut ticker = Ticker::new(TickerOptions::default());
    ticker.init(&mut doc);
    assert!(ticker.instances().is_empty());
    assert_eq!(doc.children(container), originals);
}

#[test]
fn registry_reconfigures_instead_of_stacking() {
    let (mut doc, container) = row();
    let originals = doc.children(container);
    let mut registry = TickerRegistry::new();

    registry.activate(&mut doc, TickerOptions::default());
    let faster = TickerOptions {
        speed: 200.0,
        ..TickerOptions::default()
    };
    let ticker = registry.activate(&mut doc, faster);
    assert_eq!(ticker.instances().len(), 1);
    assert_eq!(ticker.instance(container).expect("instance").config.speed, 200.0);
    assert_eq!(doc.query_class(CLASS_CONTENT).len(), 2);

    registry.destroy(&mut doc, true);
    assert!(!registry.is_active());
    assert_eq!(doc.children(container), originals);

    let ticker = registry.activate(&mut doc, TickerOptions::default());
    let inst = ticker.instance(container).expect("instance");
    assert_eq!(&doc.children(inst.strip.content)[..3], &originals[..]);
}

#[test]
fn registry_keeps_originals_across_a_soft_destroy() {
    let (mut doc, container) = row();
    let originals = doc.children(container);
    let mut registry = TickerRegistry::new();
    registry.activate(&mut doc, TickerOptions::default());

    // The strip stays in place; the cached originals must not be replaced
    // by the built viewport.
    registry.destroy(&mut doc, false);
    let ticker = registry.activate(&mut doc, TickerOptions::default());
    let inst = ticker.instance(container).expect("instance");
    assert_eq!(inst.strip.unit, 300.0);
    assert_eq!(&doc.children(inst.strip.content)[..3], &originals[..]);
}
