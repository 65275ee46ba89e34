use std::{fs, sync::Arc, time::Duration};

use config::{Document, Item};
use panel_engine::{
    Error, Failure, Field, PLACEHOLDER, Panel, PollHandler, Poller, SEARCH_TITLE, SlotKind,
    Source, TOAST_FAILED, TOAST_OK, UiEvent, Widget, WidgetState, build_item,
    test_support::Harness,
};
use parking_lot::Mutex;
use tokio::time;

/// Wrap a layout in a one-page document.
fn doc(layout: &str) -> Document {
    config::load_from_str(
        &format!(r#"{{"pages": [{{"id": "main", "title": "Main", "layout": [{layout}]}}]}}"#),
        None,
    )
    .unwrap()
}

/// Parse a single item.
fn item(json: &str) -> Item {
    doc(json).pages[0].layout[0].items()[0].clone()
}

/// Two pages: a main page with a navigation row and an audio page.
const TWO_PAGES: &str = r#"{
    "pages": [
        {
            "id": "main",
            "title": "Main",
            "layout": [
                {"type": "section", "properties": {"title": "General"}, "items": [
                    {"type": "label", "properties": {"title": "Host"}, "value": "box"},
                    {"type": "navigation", "properties": {"title": "Advanced"}, "layout": [
                        {"type": "label", "properties": {"title": "Swappiness"}, "value": "60"}
                    ]}
                ]}
            ]
        },
        {
            "id": "audio",
            "title": "Audio",
            "layout": [
                {"type": "label", "properties": {"title": "Volume level"}, "value": "40"}
            ]
        }
    ]
}"#;

#[tokio::test(start_paused = true)]
async fn slow_fetch_keeps_one_invocation_in_flight() {
    let h = Harness::new().unwrap();
    h.runner
        .script("slowcmd", Duration::from_millis(2500), Ok("7".into()));
    let state = Arc::new(WidgetState::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let poller = Poller::new(
        &h.ctx,
        &state,
        SlotKind::Value,
        Source::Command("slowcmd".into()),
        Duration::from_secs(10),
        move |out: &str| sink.lock().push(out.to_string()),
    );
    poller.start(Duration::from_secs(1), true);

    time::sleep(Duration::from_secs(10)).await;
    h.settle().await;
    assert_eq!(h.runner.peak_in_flight(), 1);
    assert!(seen.lock().len() >= 2);
    assert!(h.runner.call_count("slowcmd") <= 4);

    assert_eq!(state.teardown(&h.ctx.timers).len(), 1);
    assert_eq!(h.ctx.timers.active(), 0);
}

#[tokio::test(start_paused = true)]
async fn timeouts_never_update_the_slider() {
    let h = Harness::new().unwrap();
    h.runner
        .script("hang", Duration::from_secs(3600), Ok("99".into()));
    let w = build_item(
        &h.ctx,
        &item(
            r#"{"type": "slider", "properties": {"title": "Volume", "default": 40,
                "value_command": "hang", "interval": 1}}"#,
        ),
        &[],
    );
    let Widget::Slider(slider) = &w else {
        panic!("expected slider");
    };

    time::sleep(Duration::from_secs(30)).await;
    h.settle().await;
    assert_eq!(slider.value(), 40.0);
    assert_eq!(h.runner.peak_in_flight(), 1);
    assert!(h.runner.call_count("hang") >= 5);
    w.teardown();
}

#[tokio::test(start_paused = true)]
async fn unmapped_pollers_skip_ticks_until_mapped() {
    let h = Harness::new().unwrap();
    h.runner.reply("pollme", "1");
    let state = Arc::new(WidgetState::new());
    assert!(state.set_mapped(false));
    let poller = Poller::new(
        &h.ctx,
        &state,
        SlotKind::Value,
        Source::Command("pollme".into()),
        Duration::from_secs(10),
        |_: &str| {},
    );
    poller.start(Duration::from_secs(1), false);

    time::sleep(Duration::from_millis(5500)).await;
    h.settle().await;
    assert_eq!(h.runner.call_count("pollme"), 0);

    assert!(state.set_mapped(true));
    time::sleep(Duration::from_secs(3)).await;
    h.settle().await;
    assert_eq!(h.runner.call_count("pollme"), 3);

    assert_eq!(state.teardown(&h.ctx.timers).len(), 1);
    assert_eq!(h.ctx.timers.active(), 0);
}

#[tokio::test(start_paused = true)]
async fn absurd_intervals_keep_polling() {
    let h = Harness::new().unwrap();
    h.runner.reply("pamixer --get-volume", "40");
    let w = build_item(
        &h.ctx,
        &item(
            r#"{"type": "slider", "properties": {"title": "Volume",
                "value_command": "pamixer --get-volume", "interval": 1e30}}"#,
        ),
        &[],
    );
    let Widget::Slider(slider) = &w else {
        panic!("expected slider");
    };
    h.settle().await;
    assert_eq!(h.runner.call_count("pamixer --get-volume"), 1);
    assert_eq!(slider.value(), 40.0);
    assert_eq!(h.ctx.timers.active(), 1);

    time::sleep(Duration::from_secs(25 * 60 * 60)).await;
    h.settle().await;
    assert_eq!(h.runner.call_count("pamixer --get-volume"), 2);

    w.teardown();
    assert_eq!(h.ctx.timers.active(), 0);
}

#[tokio::test(start_paused = true)]
async fn teardown_suppresses_in_flight_completion() {
    let mut h = Harness::new().unwrap();
    h.runner
        .script("uptime -p", Duration::from_secs(2), Ok("up 3 hours".into()));
    let w = build_item(
        &h.ctx,
        &item(r#"{"type": "label", "properties": {"title": "Uptime", "interval": 1},
                 "value": {"type": "exec", "command": "uptime -p"}}"#),
        &[],
    );
    let Widget::Label(label) = &w else {
        panic!("expected label");
    };
    h.settle().await;
    assert_eq!(h.runner.call_count("uptime -p"), 1);

    w.teardown();
    w.teardown();
    assert!(w.core().state().teardown(&h.ctx.timers).is_empty());
    assert_eq!(h.ctx.timers.active(), 0);

    time::sleep(Duration::from_secs(10)).await;
    h.settle().await;
    assert_eq!(label.text(), PLACEHOLDER);
    assert!(h.changes(w.id()).is_empty());
    assert_eq!(h.runner.call_count("uptime -p"), 1);
}

#[tokio::test]
async fn labels_show_text_output_and_failures() {
    let h = Harness::new().unwrap();
    h.runner.reply("hostname", "box");
    let fixed = build_item(
        &h.ctx,
        &item(r#"{"type": "label", "properties": {"title": "Name"}, "value": "static text"}"#),
        &[],
    );
    let exec = build_item(
        &h.ctx,
        &item(r#"{"type": "label", "properties": {"title": "Host"},
                 "value": {"type": "exec", "command": "hostname"}}"#),
        &[],
    );
    let missing = build_item(
        &h.ctx,
        &item(r#"{"type": "label", "properties": {"title": "GPU"},
                 "value": {"type": "exec", "command": "missing-tool --gpu"}}"#),
        &[],
    );
    let (Widget::Label(fixed), Widget::Label(exec), Widget::Label(missing)) =
        (&fixed, &exec, &missing)
    else {
        panic!("expected labels");
    };
    assert_eq!(fixed.text(), "static text");
    assert!(
        h.wait_until(Duration::from_secs(5), || exec.text() == "box"
            && missing.text() == "Error")
            .await
    );
}

#[tokio::test]
async fn toggle_loads_then_saves_and_runs_action() {
    let h = Harness::new().unwrap();
    h.ctx.settings.save("night/enabled", &true, false).unwrap();
    let w = build_item(
        &h.ctx,
        &item(
            r#"{"type": "toggle", "properties": {"title": "Night Light", "key": "night/enabled"},
                "on_toggle": {
                    "enabled": {"type": "exec", "command": "gammastep -O 4000"},
                    "disabled": {"type": "exec", "command": "pkill gammastep"}
                }}"#,
        ),
        &["Display".into()],
    );
    let Widget::Toggle(toggle) = &w else {
        panic!("expected toggle");
    };
    assert!(
        h.wait_until(Duration::from_secs(5), || toggle.is_active())
            .await
    );
    assert!(h.runner.launches().is_empty());

    assert!(w.press(0));
    assert!(!toggle.is_active());
    assert_eq!(
        h.runner.launches(),
        vec![vec!["pkill".to_string(), "gammastep".into()]]
    );
    let path = h.settings_dir().join("night/enabled");
    assert!(
        h.wait_until(Duration::from_secs(5), || {
            fs::read_to_string(&path).is_ok_and(|s| s.trim() == "false")
        })
        .await
    );
    w.teardown();
}

#[tokio::test]
async fn selection_quotes_the_chosen_option() {
    let h = Harness::new().unwrap();
    let w = build_item(
        &h.ctx,
        &item(
            r#"{"type": "selection",
                "properties": {"title": "Profile", "options": ["balanced", "power saver"]},
                "on_change": {"type": "exec", "command": "powerprofilesctl set {value}"}}"#,
        ),
        &[],
    );
    let Widget::Selection(sel) = &w else {
        panic!("expected selection");
    };
    assert_eq!(sel.selected(), "balanced");
    assert!(!sel.select("turbo"));
    assert!(sel.select("power saver"));
    assert_eq!(
        h.runner.launches(),
        vec![vec![
            "powerprofilesctl".to_string(),
            "set".into(),
            "power saver".into()
        ]]
    );

    sel.apply_value_update("balanced");
    assert_eq!(sel.selected(), "balanced");
    assert_eq!(h.runner.launches().len(), 1);
    w.teardown();
}

#[tokio::test]
async fn presses_toast_and_redirect() {
    let mut h = Harness::new().unwrap();
    let button = build_item(
        &h.ctx,
        &item(r#"{"type": "button", "properties": {"title": "Say Hi"},
                 "on_press": {"type": "exec", "command": "notify-send hi"}}"#),
        &[],
    );
    let card = build_item(
        &h.ctx,
        &item(r#"{"type": "card", "properties": {"title": "Sound"},
                 "on_press": {"type": "redirect", "page": "audio"}}"#),
        &[],
    );
    assert!(button.press(0));
    assert!(card.press(0));
    h.runner.fail_launches(true);
    assert!(button.press(0));

    let events = h.drain_events();
    assert!(events.contains(&UiEvent::Toast {
        message: "▶ Launched: Say Hi".into(),
        timeout: TOAST_OK,
    }));
    assert!(events.contains(&UiEvent::Toast {
        message: "✖ Failed: Say Hi".into(),
        timeout: TOAST_FAILED,
    }));
    assert!(events.contains(&UiEvent::Redirect {
        page: "audio".into()
    }));
    assert_eq!(
        h.runner.launches(),
        vec![vec!["notify-send".to_string(), "hi".into()]]
    );
}

#[tokio::test]
async fn panel_pages_redirects_and_subpages() {
    let mut h = Harness::new().unwrap();
    let document = config::load_from_str(TWO_PAGES, None).unwrap();
    let mut panel = Panel::new(&h.ctx, document);
    assert_eq!(panel.visible(), 0);
    let audio = panel.pages()[1].sections[0].widgets[0].clone();
    assert!(!audio.core().state().is_mapped());

    panel.redirect("audio").unwrap();
    assert_eq!(panel.visible(), 1);
    assert!(audio.core().state().is_mapped());
    assert!(matches!(
        panel.redirect("nope"),
        Err(Error::UnknownPage(p)) if p == "nope"
    ));

    panel.show_page(0).unwrap();
    let nav = panel.current_widgets()[1].clone();
    let host = panel.current_widgets()[0].clone();
    assert!(nav.press(0));
    let navigate = h
        .drain_events()
        .into_iter()
        .find(|e| matches!(e, UiEvent::Navigate { .. }))
        .unwrap();
    if let UiEvent::Navigate { path, .. } = &navigate {
        assert_eq!(path, &vec!["Main".to_string(), "Advanced".into()]);
    }
    assert!(panel.handle_event(&navigate).unwrap());
    assert_eq!(panel.current_title(), "Advanced");
    assert!(!host.core().state().is_mapped());

    let sub = panel.current_widgets()[0].clone();
    assert_eq!(sub.title(), "Swappiness");
    assert!(panel.pop());
    assert!(sub.core().state().is_destroyed());
    assert!(host.core().state().is_mapped());
    assert!(!panel.pop());
}

#[tokio::test]
async fn panel_search_shows_results_page() {
    let h = Harness::new().unwrap();
    let document = config::load_from_str(TWO_PAGES, None).unwrap();
    let mut panel = Panel::new(&h.ctx, document);

    assert_eq!(panel.search("SWAP"), 1);
    assert_eq!(panel.current_title(), SEARCH_TITLE);
    let hit = panel.current_widgets()[0].clone();
    assert_eq!(hit.title(), "Swappiness");
    assert_eq!(
        hit.core().props().description.as_deref(),
        Some("Main > Advanced")
    );
    assert!(panel.find(hit.id()).is_some());

    panel.exit_search();
    assert!(hit.core().state().is_destroyed());
    assert_eq!(panel.current_title(), "Main");
    assert_eq!(panel.search("   "), 0);
    assert!(panel.search_query().is_none());
}

#[tokio::test]
async fn panel_reload_rolls_back_on_bad_document() {
    let h = Harness::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panel.json");
    fs::write(&path, TWO_PAGES).unwrap();
    let mut panel = Panel::load(&h.ctx, &path).unwrap();
    panel.redirect("audio").unwrap();
    let old = panel.current_widgets()[0].clone();

    fs::write(&path, "{ \"pages\": [ ").unwrap();
    assert!(matches!(panel.reload(), Err(Error::Config(_))));
    assert_eq!(panel.pages().len(), 2);
    assert!(!old.core().state().is_destroyed());

    fs::write(
        &path,
        r#"{"pages": [{"id": "audio", "title": "Audio", "layout": []},
                      {"id": "main", "title": "Main", "layout": []}]}"#,
    )
    .unwrap();
    panel.reload().unwrap();
    assert!(old.core().state().is_destroyed());
    assert_eq!(panel.pages().len(), 2);
    assert_eq!(panel.visible(), 0);
    assert_eq!(panel.current_title(), "Audio");
}

/// Records the last failure a poller reported.
struct Record(Arc<Mutex<Option<Failure>>>);

impl PollHandler for Record {
    fn on_output(&self, _output: &str) {}

    fn on_failure(&self, failure: &Failure) {
        *self.0.lock() = Some(failure.clone());
    }
}

#[tokio::test]
async fn blocking_sources_report_failures() {
    let h = Harness::new().unwrap();
    let state = Arc::new(WidgetState::new());
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();

    let poller = Poller::new(
        &h.ctx,
        &state,
        SlotKind::Misc,
        Source::blocking(|| Err(Failure::Read("gone".into()))),
        Duration::ZERO,
        Record(sink),
    );
    assert!(poller.run_once());
    assert!(
        h.wait_until(Duration::from_secs(5), || seen.lock().is_some())
            .await
    );
    assert_eq!(*seen.lock(), Some(Failure::Read("gone".into())));
    assert!(!state.lock().slot(SlotKind::Misc).running);
}

#[tokio::test]
async fn changes_are_reported_per_field() {
    let mut h = Harness::new().unwrap();
    let w = build_item(
        &h.ctx,
        &item(r#"{"type": "entry", "properties": {"title": "Hostname"},
                 "on_action": {"type": "exec", "command": "hostnamectl set-hostname {value}"}}"#),
        &[],
    );
    let Widget::Entry(entry) = &w else {
        panic!("expected entry");
    };
    assert!(!entry.apply());
    entry.set_text("newbox");
    assert!(entry.apply());
    assert_eq!(
        h.changes(w.id()),
        vec![(Field::Text, "newbox".to_string())]
    );
    assert_eq!(
        h.runner.launches(),
        vec![vec![
            "hostnamectl".to_string(),
            "set-hostname".into(),
            "newbox".into()
        ]]
    );
}
