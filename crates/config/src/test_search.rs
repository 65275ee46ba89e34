#[cfg(test)]
mod tests {
    use crate::*;

    const DOC: &str = r#"{
        "pages": [
            {"title": "Display", "layout": [
                {"type": "section", "items": [
                    {"type": "slider", "properties": {"title": "Brightness", "description": "Backlight level"}},
                    {"type": "navigation", "properties": {"title": "Night Light"}, "layout": [
                        {"type": "section", "items": [
                            {"type": "toggle", "properties": {"title": "Enable night light"}},
                            {"type": "slider", "properties": {"title": "Temperature", "description": "Warmth"}}
                        ]}
                    ]}
                ]}
            ]},
            {"title": "Network", "layout": [
                {"type": "expander", "properties": {"title": "Advanced"}, "items": [
                    {"type": "toggle", "properties": {"title": "IPv6", "description": "Enable LIGHTweight stack"}}
                ]}
            ]}
        ]
    }"#;

    fn titles(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter()
            .map(|h| h.item.properties().title.as_deref().unwrap_or_default())
            .collect()
    }

    #[test]
    fn matches_title_and_description_case_insensitively() {
        let doc = load_from_str(DOC, None).unwrap();
        let hits = doc.search("  LIGHT ");
        assert_eq!(titles(&hits), vec!["Brightness", "Enable night light", "IPv6"]);
    }

    #[test]
    fn navigation_rows_are_excluded_but_searched() {
        let doc = load_from_str(DOC, None).unwrap();
        let hits = doc.search("night");
        assert_eq!(titles(&hits), vec!["Enable night light"]);
        assert_eq!(hits[0].context, "Display > Night Light");
        assert_eq!(
            hits[0].item.properties().description.as_deref(),
            Some("Display > Night Light")
        );
    }

    #[test]
    fn description_gets_breadcrumb_prefix() {
        let doc = load_from_str(DOC, None).unwrap();
        let hits = doc.search("warmth");
        assert_eq!(
            hits[0].item.properties().description.as_deref(),
            Some("Display > Night Light • Warmth")
        );
        // the document itself is untouched
        assert!(doc.search("Display >").is_empty());
    }

    #[test]
    fn empty_query_matches_nothing() {
        let doc = load_from_str(DOC, None).unwrap();
        assert!(doc.search("   ").is_empty());
    }
}
