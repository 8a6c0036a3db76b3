use lazyimg_core::{Duration, ImageTarget, Mode, SettingsOverrides, Topic};
use lazyimg_testing::prelude::*;

#[test]
fn domain_event_loads_exactly_the_elements_inside_its_container() {
    let page = TestPage::new(800.0);
    let menu = page.add_container(page.document.body(), "nav");
    let sidebar = page.add_container(page.document.body(), "aside");
    page.add_lazy(menu, "div", "/menu-1.jpg", Some("event"), 0.0);
    page.add_lazy(menu, "div", "/menu-2.jpg", Some("event"), 0.0);
    page.add_lazy(sidebar, "div", "/side.jpg", Some("event"), 0.0);

    let loader = page.init();
    assert!(page.document.requested_images().is_empty());
    assert_eq!(loader.pending(Mode::Event), 3);

    assert_eq!(page.menu_opened(menu), 1);

    assert_eq!(
        page.document.requested_images(),
        vec!["/menu-1.jpg".to_string(), "/menu-2.jpg".to_string()]
    );
    assert_eq!(loader.pending(Mode::Event), 1);
}

#[test]
fn categories_changed_is_also_a_trigger() {
    let page = TestPage::new(800.0);
    let grid = page.add_container(page.document.body(), "section");
    let nested = page.add_container(grid, "ul");
    page.add_lazy(nested, "li", "/tile.jpg", Some("event"), 9_000.0);
    let _loader = page.init();

    page.categories_changed(grid);

    // No geometry check in event mode: containment is enough.
    assert_eq!(page.document.requested_images(), vec!["/tile.jpg".to_string()]);
}

#[test]
fn event_elements_ignore_scrolling() {
    let page = TestPage::new(800.0);
    let menu = page.add_container(page.document.body(), "nav");
    page.add_lazy(menu, "div", "/menu.jpg", Some("event"), 0.0);
    page.add_image("/far.jpg", 5_000.0);
    let _loader = page.init();

    page.scroll();
    page.document.advance(Duration::from_millis(500));

    assert!(page.document.requested_images().is_empty());
}

#[test]
fn event_elements_never_install_a_scroll_listener() {
    let page = TestPage::new(800.0);
    let menu = page.add_container(page.document.body(), "nav");
    page.add_lazy(menu, "img", "/menu.jpg", Some("event"), 0.0);

    let _loader = page.init();

    assert_eq!(page.document.listener_count(), 0);
    assert_eq!(page.bus.subscriber_count(Topic::PageWrapScroll), 0);
    assert_eq!(page.bus.subscriber_count(Topic::MenuOpened), 1);
    assert_eq!(page.bus.subscriber_count(Topic::CategoriesChanged), 1);
}

#[test]
fn repeated_events_dispatch_each_element_once() {
    let page = TestPage::new(800.0);
    let menu = page.add_container(page.document.body(), "nav");
    page.add_lazy(menu, "div", "/menu.jpg", Some("event"), 0.0);
    let _loader = page.init();

    page.menu_opened(menu);
    page.menu_opened(menu);
    page.categories_changed(menu);

    assert_eq!(page.document.requested_images(), vec!["/menu.jpg".to_string()]);
}

#[test]
fn background_elements_get_a_css_image() {
    let page = TestPage::new(800.0);
    let menu = page.add_container(page.document.body(), "nav");
    let tile = page.add_lazy(menu, "div", "/bg.jpg", Some("event"), 0.0);
    let _loader = page.init();
    assert_eq!(ImageTarget::for_tag(&page.document.tag_name(&tile)), ImageTarget::Background);

    page.menu_opened(menu);
    page.document.complete_all_images();
    page.document.advance(Duration::from_millis(250));

    assert_eq!(
        page.document.style(tile, "background-image").as_deref(),
        Some("url(/bg.jpg)")
    );
    assert_eq!(page.document.attribute(&tile, "src"), None);
    assert!(page.document.classes(tile).iter().all(|c| c != "on-init"));
}

#[test]
fn animation_length_is_configurable() {
    let page = TestPage::new(800.0);
    let menu = page.add_container(page.document.body(), "nav");
    let img = page.add_lazy(menu, "img", "/menu.jpg", Some("event"), 0.0);
    let _loader = page.init_with(SettingsOverrides {
        animation_length: Some(Duration::from_millis(40)),
        hidden_class: Some("fading".into()),
        ..SettingsOverrides::default()
    });

    page.menu_opened(menu);
    page.document.complete_image("/menu.jpg");
    assert!(page.document.has_class(img, "fading"));

    page.document.advance(Duration::from_millis(40));
    assert_eq!(page.document.attribute(&img, "src").as_deref(), Some("/menu.jpg"));
    assert!(!page.document.has_class(img, "fading"));
}

#[test]
fn mixed_modes_stay_in_separate_registries() {
    let page = TestPage::new(800.0);
    let menu = page.add_container(page.document.body(), "nav");
    page.add_lazy(menu, "div", "/menu.jpg", Some("event"), 0.0);
    page.add_image("/far.jpg", 5_000.0);

    let loader = page.init();

    assert_eq!(loader.pending(Mode::Event), 1);
    assert_eq!(loader.pending(Mode::Scroll), 1);

    // A domain event on the page container reaches only event-mode elements.
    page.menu_opened(page.container);
    page.menu_opened(page.document.body());
    assert_eq!(page.document.requested_images(), vec!["/menu.jpg".to_string()]);
    assert_eq!(loader.pending(Mode::Scroll), 1);
    assert!(loader.is_listening());
}
