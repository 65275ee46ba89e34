//! Plain-text rendering of the panel.

use std::fmt::Write as _;

use config::{Document, Item, Section};
use panel_engine::{Panel, Widget};

/// Rows the user can address on the current screen, in display order.
/// Children of expanded expanders follow their parent.
pub fn rows(panel: &Panel) -> Vec<Widget> {
    let mut out = Vec::new();
    for section in panel.current_sections() {
        for w in &section.widgets {
            push_row(&mut out, w);
        }
    }
    out
}

/// Push `w` and, when it is an expanded expander, its children.
fn push_row(out: &mut Vec<Widget>, w: &Widget) {
    out.push(w.clone());
    if let Widget::Expander(e) = w
        && e.is_expanded()
    {
        for child in e.children() {
            push_row(out, child);
        }
    }
}

/// Render the current screen with numbered rows.
pub fn screen(panel: &Panel) -> String {
    let mut out = String::new();
    let tabs = panel
        .pages()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i == panel.visible() && panel.search_query().is_none() {
                format!("[{}]", p.title)
            } else {
                p.title.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(out, "{tabs}");
    let _ = writeln!(out, "== {} ==", panel.current_title());

    let mut n = 0;
    for section in panel.current_sections() {
        if let Some(title) = &section.title {
            let _ = writeln!(out, "-- {title} --");
        }
        if let Some(desc) = &section.description {
            let _ = writeln!(out, "   {desc}");
        }
        for w in &section.widgets {
            render_row(&mut out, w, 0, &mut n);
        }
    }
    if n == 0 {
        let _ = writeln!(out, "(empty)");
    }
    out
}

/// Render one row and any visible children.
fn render_row(out: &mut String, w: &Widget, depth: usize, n: &mut usize) {
    *n += 1;
    let indent = "  ".repeat(depth);
    let summary = w.summary();
    if summary.is_empty() {
        let _ = writeln!(out, "{indent}{:>3}. {}", n, w.title());
    } else {
        let _ = writeln!(out, "{indent}{:>3}. {}: {summary}", n, w.title());
    }
    if let Some(desc) = w.core().props().description.as_deref() {
        let _ = writeln!(out, "{indent}     {desc}");
    }
    if let Widget::Expander(e) = w
        && e.is_expanded()
    {
        for child in e.children() {
            render_row(out, child, depth + 1, n);
        }
    }
}

/// Outline of a document: pages, sections and item kinds.
pub fn outline(doc: &Document) -> String {
    let mut out = String::new();
    for page in &doc.pages {
        let id = page.id.as_deref().unwrap_or("-");
        let _ = writeln!(out, "page {} (id: {id}, icon: {})", page.title, page.icon);
        outline_layout(&mut out, &page.layout, 1);
    }
    out
}

/// Outline one layout at `depth`.
fn outline_layout(out: &mut String, layout: &[Section], depth: usize) {
    let indent = "  ".repeat(depth);
    for section in layout {
        match section {
            Section::List { title, .. } => {
                let _ = writeln!(out, "{indent}section {}", title.as_deref().unwrap_or(""));
            }
            Section::Grid { title, .. } => {
                let _ = writeln!(out, "{indent}grid {}", title.as_deref().unwrap_or(""));
            }
            Section::Single(_) => {}
        }
        outline_items(out, section.items(), depth + 1);
    }
}

/// Outline items at `depth`.
fn outline_items(out: &mut String, items: &[Item], depth: usize) {
    let indent = "  ".repeat(depth);
    for item in items {
        let title = item.properties().title.as_deref().unwrap_or("");
        let _ = writeln!(out, "{indent}{} {title}", item.kind().as_str());
        match item {
            Item::Navigation { layout, .. } => outline_layout(out, layout, depth + 1),
            Item::Expander { items, .. } => outline_items(out, items, depth + 1),
            _ => {}
        }
    }
}
