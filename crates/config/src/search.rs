//! Case-insensitive search over every page of a document.

use crate::{Document, Item, Section};

/// One search result: a copy of the matched item with its location folded into
/// the description.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Breadcrumb of page and sub-page titles, e.g. `Display > Night Light`.
    pub context: String,
    /// The matched item, with `description` rewritten to `context • description`.
    pub item: Item,
}

impl Document {
    /// Find every item whose title or description contains `query`.
    ///
    /// Navigation rows are never returned themselves, but their sub-layouts are
    /// searched with the row title appended to the breadcrumb. An empty query
    /// matches nothing.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();
        let mut hits = Vec::new();
        if query.is_empty() {
            return hits;
        }
        for page in &self.pages {
            search_layout(&page.layout, &query, &page.title, &mut hits);
        }
        hits
    }
}

/// Search every section of `layout` under breadcrumb `context`.
fn search_layout(layout: &[Section], query: &str, context: &str, hits: &mut Vec<SearchHit>) {
    for section in layout {
        search_items(section.items(), query, context, hits);
    }
}

/// Search `items`, descending into navigation layouts and expander children.
fn search_items(items: &[Item], query: &str, context: &str, hits: &mut Vec<SearchHit>) {
    for item in items {
        let props = item.properties();
        let title = props.title.as_deref().unwrap_or_default();
        let desc = props.description.as_deref().unwrap_or_default();

        if !matches!(item, Item::Navigation { .. })
            && (title.to_lowercase().contains(query) || desc.to_lowercase().contains(query))
        {
            let mut found = item.clone();
            found.properties_mut().description = Some(if desc.is_empty() {
                context.to_string()
            } else {
                format!("{context} • {desc}")
            });
            hits.push(SearchHit {
                context: context.to_string(),
                item: found,
            });
        }

        match item {
            Item::Navigation { layout, .. } => {
                let nested = format!("{context} > {title}");
                search_layout(layout, query, &nested, hits);
            }
            Item::Expander { items, .. } => search_items(items, query, context, hits),
            _ => {}
        }
    }
}
