use lazyimg_core::{
    Duration, ElementState, LazyLoad, LazyLoadError, Mode, Settings, SettingsOverrides, Topic,
};
use lazyimg_testing::prelude::*;
use log::Level;

#[test]
fn invalid_mode_is_logged_once_and_left_inert() {
    let logs = capture_logs();
    let page = TestPage::new(800.0);
    let broken = page.add_lazy(page.container, "img", "/a.jpg", Some("hover"), 0.0);

    let loader = page.init();

    assert_eq!(loader.pending(Mode::Scroll), 0);
    assert_eq!(loader.pending(Mode::Event), 0);
    assert!(!page.document.has_class(broken, "on-init"));
    assert_eq!(page.document.listener_count(), 0);
    assert!(page.document.requested_images().is_empty());
    for topic in Topic::ALL {
        assert_eq!(page.bus.subscriber_count(topic), 0);
    }

    let diagnostics = logs.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].level, Level::Error);
    assert!(diagnostics[0].message.contains("hover"));

    let mentions = logs
        .records()
        .iter()
        .filter(|record| record.message.contains("hover"))
        .count();
    assert_eq!(mentions, 1);
}

#[test]
fn invalid_mode_does_not_block_valid_siblings() {
    let logs = capture_logs();
    let page = TestPage::new(800.0);
    page.add_lazy(page.container, "img", "/bad.jpg", Some("lazy"), 0.0);
    page.add_image("/good.jpg", 0.0);

    let _loader = page.init();

    assert_eq!(page.document.requested_images(), vec!["/good.jpg".to_string()]);
    assert_eq!(logs.at(Level::Error).len(), 1);
}

#[test]
fn register_reports_errors() {
    let page = TestPage::new(800.0);
    let loader = LazyLoad::new(page.document.clone(), page.bus.clone(), Settings::default());
    let broken = page.add_lazy(page.container, "img", "/a.jpg", Some("Event"), 0.0);
    let img = page.add_image("/b.jpg", 5_000.0);

    assert_eq!(
        loader.register(&broken),
        Err(LazyLoadError::InvalidMode {
            value: "Event".into()
        })
    );
    assert!(loader.register(&img).is_ok());
    assert_eq!(loader.register(&img), Err(LazyLoadError::AlreadyRegistered));
    assert_eq!(loader.pending(Mode::Scroll), 1);
}

#[test]
fn stalled_probe_keeps_the_preload_state() {
    let page = TestPage::new(800.0);
    let img = page.add_image("/broken.jpg", 0.0);
    let loader = page.init();
    let id = loader.registered_ids(Mode::Scroll).first().copied();
    assert_eq!(id, None);

    assert!(page.document.fail_image("/broken.jpg"));
    page.document.advance(Duration::from_secs(60));

    assert!(page.document.has_class(img, "on-init"));
    assert!(!page.document.has_class(img, "is-hidden"));
    assert_eq!(page.document.attribute(&img, "src"), None);
    // Never re-queued.
    assert_eq!(page.document.requested_images().len(), 1);
}

#[test]
fn probe_timeout_marks_the_element_failed() {
    let logs = capture_logs();
    let page = TestPage::new(800.0);
    let loader = LazyLoad::new(
        page.document.clone(),
        page.bus.clone(),
        Settings::default()
            .with_probe_timeout(Duration::from_secs(2))
            .with_failed_class("is-broken"),
    );
    let img = page.add_image("/slow.jpg", 0.0);
    let id = loader.register(&img).unwrap();

    page.document.advance(Duration::from_millis(1_999));
    assert_eq!(loader.state(id), Some(ElementState::Probing));

    page.document.advance(Duration::from_millis(1));
    assert_eq!(loader.state(id), Some(ElementState::Failed));
    assert!(page.document.has_class(img, "is-broken"));
    assert_eq!(logs.at(Level::Warn).len(), 1);

    // A late load does not resurrect the element.
    assert!(page.document.complete_image("/slow.jpg"));
    page.document.advance(Duration::from_secs(1));
    assert_eq!(page.document.attribute(&img, "src"), None);
    assert_eq!(loader.state(id), Some(ElementState::Failed));
}

#[test]
fn probe_timeout_is_cancelled_by_a_timely_load() {
    let page = TestPage::new(800.0);
    let img = page.add_image("/a.jpg", 0.0);
    let loader = page.init_with(SettingsOverrides {
        probe_timeout: Some(Duration::from_millis(300)),
        failed_class: Some("is-broken".into()),
        ..SettingsOverrides::default()
    });

    page.document.complete_image("/a.jpg");
    page.document.advance(Duration::from_secs(5));

    assert_eq!(page.document.attribute(&img, "src").as_deref(), Some("/a.jpg"));
    assert!(!page.document.has_class(img, "is-broken"));
    assert_eq!(loader.pending(Mode::Scroll), 0);
}

#[test]
fn dispose_releases_listener_subscriptions_and_probes() {
    let page = TestPage::new(800.0);
    let near = page.add_image("/near.jpg", 0.0);
    page.add_image("/far.jpg", 5_000.0);
    let loader = page.init();
    assert_eq!(page.document.listener_count(), 1);

    loader.dispose();

    assert!(loader.is_disposed());
    assert_eq!(page.document.listener_count(), 0);
    assert_eq!(page.bus.subscriber_count(Topic::PageWrapScroll), 0);
    assert_eq!(loader.pending(Mode::Scroll), 0);

    page.document.complete_all_images();
    page.document.advance(Duration::from_secs(1));
    assert!(!page.document.has_class(near, "is-hidden"));
    assert_eq!(page.document.attribute(&near, "src"), None);

    let late = page.add_image("/late.jpg", 0.0);
    assert_eq!(loader.register(&late), Err(LazyLoadError::Disposed));
}

#[test]
fn dropping_the_last_handle_tears_down() {
    let page = TestPage::new(800.0);
    page.add_image("/far.jpg", 5_000.0);
    let loader = page.init();
    let clone = loader.clone();
    drop(loader);
    assert_eq!(page.document.listener_count(), 1);

    drop(clone);

    assert_eq!(page.document.listener_count(), 0);
    assert_eq!(page.bus.subscriber_count(Topic::PageWrapScroll), 0);
    // Scrolling a page without a dispatcher is harmless.
    page.scroll();
    page.document.advance(Duration::from_secs(1));
}

#[test]
fn dispatchers_sharing_a_bus_keep_separate_registries() {
    let page = TestPage::new(800.0);
    let menu = page.add_container(page.document.body(), "nav");
    let first = page.add_lazy(menu, "div", "/first.jpg", Some("event"), 0.0);
    let second = page.add_lazy(menu, "div", "/second.jpg", Some("event"), 0.0);
    page.document.add_class(&first, "lazy-a");
    page.document.add_class(&second, "lazy-b");

    let a = page.init_with(SettingsOverrides {
        root_selector: Some(".lazy-a".into()),
        ..SettingsOverrides::default()
    });
    let b = page.init_with(SettingsOverrides {
        root_selector: Some(".lazy-b".into()),
        ..SettingsOverrides::default()
    });
    assert_eq!(a.pending(Mode::Event), 1);
    assert_eq!(b.pending(Mode::Event), 1);

    a.dispose();
    page.menu_opened(menu);

    assert_eq!(page.document.requested_images(), vec!["/second.jpg".to_string()]);
    assert_eq!(b.pending(Mode::Event), 0);
}

#[test]
fn custom_preload_class_is_applied_and_removed() {
    let page = TestPage::new(800.0);
    let img = page.add_image("/a.jpg", 0.0);
    let _loader = page.init_with(SettingsOverrides {
        preload_class: Some("is-loading".into()),
        ..SettingsOverrides::default()
    });
    assert!(page.document.has_class(img, "is-loading"));
    assert!(!page.document.has_class(img, "on-init"));

    page.document.complete_all_images();
    page.document.advance(Duration::from_millis(250));

    assert!(!page.document.has_class(img, "is-loading"));
}
