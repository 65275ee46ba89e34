#[cfg(test)]
mod tests {
    use std::fs;

    use crate::*;

    fn parse(json: &str) -> Document {
        load_from_str(json, None).unwrap()
    }

    #[test]
    fn pages_and_sections_parse() {
        let doc = parse(
            r#"{
                "pages": [
                    {
                        "id": "audio",
                        "title": "Audio",
                        "icon": "audio-volume-high-symbolic",
                        "layout": [
                            {
                                "type": "section",
                                "properties": {"title": "Output", "description": "Speakers"},
                                "items": [
                                    {"type": "slider", "properties": {"title": "Volume", "min": 0, "max": "100", "step": "5"},
                                     "on_change": {"type": "exec", "command": "pamixer --set-volume {value}"}}
                                ]
                            }
                        ]
                    }
                ]
            }"#,
        );
        assert_eq!(doc.pages.len(), 1);
        let page = &doc.pages[0];
        assert_eq!(page.id.as_deref(), Some("audio"));
        let Section::List {
            title, description, items,
        } = &page.layout[0]
        else {
            panic!("expected list section");
        };
        assert_eq!(title.as_deref(), Some("Output"));
        assert_eq!(description.as_deref(), Some("Speakers"));
        let Item::Slider {
            properties,
            on_change,
        } = &items[0]
        else {
            panic!("expected slider");
        };
        assert_eq!(properties.max, Some(100.0));
        assert_eq!(properties.step, Some(5.0));
        assert_eq!(
            on_change.as_ref().and_then(Action::exec).map(|e| e.command.as_str()),
            Some("pamixer --set-volume {value}")
        );
    }

    #[test]
    fn page_defaults_fill_in() {
        let doc = parse(r#"{"pages": [{"layout": []}]}"#);
        assert_eq!(doc.pages[0].title, "Untitled");
        assert_eq!(doc.pages[0].icon, "application-x-executable-symbolic");
        assert!(doc.pages[0].id.is_none());
    }

    #[test]
    fn missing_pages_is_empty() {
        let doc = parse("{}");
        assert!(doc.pages.is_empty());
        assert_eq!(doc.engine, EngineOptions::default());
    }

    #[test]
    fn non_object_root_is_validation_error() {
        let err = load_from_str("[1, 2]", None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn syntax_error_reports_location() {
        let err = load_from_str("{\n  \"pages\": [\n    oops\n  ]\n}", None).unwrap_err();
        match err {
            Error::Parse { line, excerpt, .. } => {
                assert_eq!(line, 3);
                assert!(excerpt.contains('^'));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_item_type_becomes_button() {
        let doc = parse(
            r#"{"pages": [{"layout": [{"type": "section", "items": [
                {"type": "sparkle", "properties": {"title": "Odd"},
                 "on_press": {"type": "exec", "command": "true"}}
            ]}]}]}"#,
        );
        let item = &doc.pages[0].layout[0].items()[0];
        assert_eq!(item.kind(), ItemKind::Button);
        assert_eq!(item.properties().title.as_deref(), Some("Odd"));
    }

    #[test]
    fn bare_items_are_wrapped() {
        let doc = parse(
            r#"{"pages": [{"layout": [
                {"type": "warning_banner", "properties": {"title": "Careful", "message": "Root only"}},
                {"type": "expander", "properties": {"title": "More"}, "items": [
                    {"type": "label", "value": "hello"}
                ]},
                42
            ]}]}"#,
        );
        let layout = &doc.pages[0].layout;
        assert_eq!(layout.len(), 2);
        assert!(matches!(&layout[0], Section::Single(Item::WarningBanner { .. })));
        let Section::Single(Item::Expander { items, .. }) = &layout[1] else {
            panic!("expected expander");
        };
        assert_eq!(
            items[0],
            Item::Label {
                properties: RowProperties::default(),
                value: Some(ValueSpec::Text("hello".into())),
            }
        );
    }

    #[test]
    fn grid_sections_hold_cards() {
        let doc = parse(
            r#"{"pages": [{"layout": [{"type": "grid_section", "properties": {"title": "Quick"}, "items": [
                {"type": "toggle_card", "properties": {"title": "Wifi", "key": "wifi"},
                 "on_toggle": {"enabled": {"command": "nmcli radio wifi on"}, "disabled": {"command": "nmcli radio wifi off"}}},
                {"type": "button", "properties": {"title": "Lock", "badge_file": "~/.cache/n"},
                 "on_press": {"type": "exec", "command": "loginctl lock-session"}}
            ]}]}]}"#,
        );
        let Section::Grid { title, items } = &doc.pages[0].layout[0] else {
            panic!("expected grid");
        };
        assert_eq!(title.as_deref(), Some("Quick"));
        assert_eq!(items[0].kind(), ItemKind::ToggleCard);
        assert_eq!(items[1].kind(), ItemKind::Card);
        let Item::ToggleCard {
            on_toggle: Some(action),
            ..
        } = &items[0]
        else {
            panic!("expected toggle action");
        };
        assert_eq!(
            action.for_state(false).map(|e| e.command.as_str()),
            Some("nmcli radio wifi off")
        );
        assert_eq!(items[1].properties().badge_file.as_deref(), Some("~/.cache/n"));
    }

    #[test]
    fn icon_specs() {
        let doc = parse(
            r#"{"pages": [{"layout": [{"type": "section", "items": [
                {"type": "button", "properties": {"icon": "network-wireless-symbolic"}},
                {"type": "button", "properties": {"icon": {"type": "exec", "command": "icon-for wifi", "interval": "3", "name": "wifi-off"}}},
                {"type": "button", "properties": {"icon": {"type": "exec", "command": "icon-for bt", "interval": 0}}},
                {"type": "button", "properties": {"icon": {"type": "file", "path": "~/pic.png"}}},
                {"type": "button"}
            ]}]}]}"#,
        );
        let icons: Vec<IconSpec> = doc.pages[0].layout[0]
            .items()
            .iter()
            .map(|i| i.properties().icon())
            .collect();
        assert_eq!(icons[0].static_name(), "network-wireless-symbolic");
        assert_eq!(icons[1].dynamic(), Some(("icon-for wifi", 3)));
        assert_eq!(icons[1].static_name(), "wifi-off");
        assert_eq!(icons[2].dynamic(), None);
        assert_eq!(
            icons[3],
            IconSpec::File {
                path: "~/pic.png".into()
            }
        );
        assert_eq!(icons[4].static_name(), DEFAULT_ICON);
    }

    #[test]
    fn selection_actions_per_option() {
        let doc = parse(
            r#"{"pages": [{"layout": [{"type": "section", "items": [
                {"type": "selection", "properties": {"options": ["performance", "balanced", 3]},
                 "on_change": {"performance": {"command": "ppd set performance"}, "balanced": {"command": "ppd set balanced"}}}
            ]}]}]}"#,
        );
        let Item::Selection {
            properties,
            on_change: Some(action),
        } = &doc.pages[0].layout[0].items()[0]
        else {
            panic!("expected selection");
        };
        assert_eq!(properties.options, vec!["performance", "balanced", "3"]);
        assert_eq!(
            action.for_option("balanced").map(|e| e.command.as_str()),
            Some("ppd set balanced")
        );
        assert!(action.for_option("3").is_none());
    }

    #[test]
    fn redirect_and_terminal_actions() {
        let redirect = Action::from_value(&serde_json::json!({"type": "redirect", "page": "wifi"}));
        assert_eq!(
            redirect,
            Some(Action::Redirect {
                page: "wifi".into()
            })
        );
        let term = Action::from_value(
            &serde_json::json!({"type": "exec", "command": "htop", "terminal": "yes"}),
        );
        assert_eq!(
            term,
            Some(Action::Exec(ExecAction {
                command: "htop".into(),
                terminal: true
            }))
        );
    }

    #[test]
    fn engine_section_parses() {
        let doc = parse(
            r#"{"engine": {"settings_dir": "/tmp/s", "launcher": ["uwsm-app", "--"], "debounce_ms": 50}, "pages": []}"#,
        );
        assert_eq!(doc.engine.launcher, vec!["uwsm-app", "--"]);
        assert_eq!(doc.engine.debounce_ms, 50);
        assert_eq!(doc.engine.workers, 4);
        assert_eq!(doc.engine.terminal[0], "kitty");
    }

    #[test]
    fn engine_section_rejects_unknown_fields() {
        let err = load_from_str(r#"{"engine": {"debounce": 1}}"#, None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn bad_properties_fall_back() {
        let doc = parse(
            r#"{"pages": [{"layout": [{"type": "section", "items": [
                {"type": "toggle", "properties": {"interval": "soon", "key": "  ", "state_command": " cat /x "}}
            ]}]}]}"#,
        );
        let props = doc.pages[0].layout[0].items()[0].properties();
        assert_eq!(props.interval, None);
        assert_eq!(props.key(), None);
        assert_eq!(props.state_command(), Some("cat /x"));
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.json");
        fs::write(&path, r#"{"pages": [{"id": "a", "title": "A"}]}"#).unwrap();
        let doc = load_from_path(&path).unwrap();
        assert_eq!(doc.page_index("a"), Some(0));
        assert_eq!(doc.page_index("b"), None);

        let missing = load_from_path(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(missing.path(), Some(dir.path().join("nope.json").as_path()));
    }

    #[test]
    fn explicit_config_path_wins() {
        let p = std::path::Path::new("/somewhere/panel.json");
        assert_eq!(resolve_config_path(Some(p)).unwrap(), p);
    }
}
