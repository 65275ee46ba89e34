//! The panel shell: live pages built from a document.
//!
//! Every page is built up front. Only the layer the user is looking at is
//! mapped: the top of the visible page's navigation stack, or the search
//! results while a search is active. Pollers on unmapped widgets skip their
//! ticks. Anything removed from the tree (popped sub-pages, old search
//! results, a reloaded document) is torn down.

use std::path::{Path, PathBuf};

use config::{Document, Section};
use tracing::{debug, info, warn};

use crate::{Context, Error, Result, UiEvent, Widget, WidgetId, build_item};

/// Title of the search results page.
pub const SEARCH_TITLE: &str = "Search";

/// A built section.
pub struct SectionView {
    /// Group title.
    pub title: Option<String>,
    /// Group description.
    pub description: Option<String>,
    /// Rendered as a card grid.
    pub grid: bool,
    /// Widgets in order.
    pub widgets: Vec<Widget>,
}

/// A sub-page pushed by a navigation row.
pub struct SubPage {
    /// Sub-page title.
    pub title: String,
    /// Breadcrumb including this sub-page.
    pub path: Vec<String>,
    /// Built sections.
    pub sections: Vec<SectionView>,
}

/// A built page.
pub struct PageView {
    /// Redirect target id.
    pub id: Option<String>,
    /// Sidebar title.
    pub title: String,
    /// Sidebar icon.
    pub icon: String,
    /// Built sections.
    pub sections: Vec<SectionView>,
    /// Pushed sub-pages, innermost last.
    stack: Vec<SubPage>,
}

impl PageView {
    /// Pushed sub-pages, innermost last.
    pub fn stack(&self) -> &[SubPage] {
        &self.stack
    }

    /// Sections of the innermost layer.
    fn top(&self) -> &[SectionView] {
        self.stack
            .last()
            .map_or(self.sections.as_slice(), |s| s.sections.as_slice())
    }

    /// Every section on the page, stacked sub-pages included.
    fn all_sections(&self) -> impl Iterator<Item = &SectionView> {
        self.sections
            .iter()
            .chain(self.stack.iter().flat_map(|s| s.sections.iter()))
    }
}

/// Search results.
struct SearchView {
    /// Query that produced the results.
    query: String,
    /// One list section of hits.
    sections: Vec<SectionView>,
}

/// Build the sections of `layout`. `path` is the breadcrumb of the page.
fn build_sections(ctx: &Context, layout: &[Section], path: &[String]) -> Vec<SectionView> {
    layout
        .iter()
        .map(|section| {
            let widgets = section
                .items()
                .iter()
                .map(|item| build_item(ctx, item, path))
                .collect();
            match section {
                Section::List {
                    title, description, ..
                } => SectionView {
                    title: title.clone(),
                    description: description.clone(),
                    grid: false,
                    widgets,
                },
                Section::Grid { title, .. } => SectionView {
                    title: title.clone(),
                    description: None,
                    grid: true,
                    widgets,
                },
                Section::Single(_) => SectionView {
                    title: None,
                    description: None,
                    grid: false,
                    widgets,
                },
            }
        })
        .collect()
}

/// Map or unmap every widget in `sections`.
fn set_mapped(sections: &[SectionView], mapped: bool) {
    for w in sections.iter().flat_map(|s| &s.widgets) {
        w.set_mapped(mapped);
    }
}

/// Tear down every widget in `sections`.
fn teardown(sections: &[SectionView]) {
    for w in sections.iter().flat_map(|s| &s.widgets) {
        w.teardown();
    }
}

/// Find widget `id` in `sections`.
fn find_in(sections: &[SectionView], id: WidgetId) -> Option<&Widget> {
    sections
        .iter()
        .flat_map(|s| &s.widgets)
        .find_map(|w| w.find(id))
}

/// Live pages for one document.
pub struct Panel {
    /// Engine services.
    ctx: Context,
    /// The document the pages were built from.
    doc: Document,
    /// Where the document was loaded from, for reloads.
    source: Option<PathBuf>,
    /// Built pages.
    pages: Vec<PageView>,
    /// Index of the visible page.
    visible: usize,
    /// Active search, shown instead of the visible page.
    search: Option<SearchView>,
}

impl Panel {
    /// Build every page of `doc` and show the first.
    pub fn new(ctx: &Context, doc: Document) -> Self {
        let mut panel = Self {
            ctx: ctx.clone(),
            pages: Vec::new(),
            doc,
            source: None,
            visible: 0,
            search: None,
        };
        panel.build_pages();
        panel
    }

    /// Load the document at `path` and build it.
    pub fn load(ctx: &Context, path: &Path) -> Result<Self> {
        let doc = config::load_from_path(path)?;
        let mut panel = Self::new(ctx, doc);
        panel.set_source(path);
        Ok(panel)
    }

    /// Remember where the document came from so [`reload`](Self::reload) can
    /// read it again.
    pub fn set_source(&mut self, path: impl Into<PathBuf>) {
        self.source = Some(path.into());
    }

    /// Build pages from `self.doc` and map the visible one.
    fn build_pages(&mut self) {
        self.pages = self
            .doc
            .pages
            .iter()
            .map(|page| PageView {
                id: page.id.clone(),
                title: page.title.clone(),
                icon: page.icon.clone(),
                sections: build_sections(&self.ctx, &page.layout, &[page.title.clone()]),
                stack: Vec::new(),
            })
            .collect();
        if self.visible >= self.pages.len() {
            self.visible = 0;
        }
        self.remap();
        info!(pages = self.pages.len(), "panel_built");
    }

    /// Map exactly the layer the user is looking at.
    fn remap(&self) {
        for (i, page) in self.pages.iter().enumerate() {
            let shown = self.search.is_none() && i == self.visible;
            set_mapped(&page.sections, shown && page.stack.is_empty());
            let depth = page.stack.len();
            for (j, sub) in page.stack.iter().enumerate() {
                set_mapped(&sub.sections, shown && j + 1 == depth);
            }
        }
        if let Some(search) = &self.search {
            set_mapped(&search.sections, true);
        }
    }

    /// The document the pages were built from.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Built pages.
    pub fn pages(&self) -> &[PageView] {
        &self.pages
    }

    /// Index of the visible page.
    pub fn visible(&self) -> usize {
        self.visible
    }

    /// Active search query.
    pub fn search_query(&self) -> Option<&str> {
        self.search.as_ref().map(|s| s.query.as_str())
    }

    /// Title of what is on screen.
    pub fn current_title(&self) -> &str {
        if self.search.is_some() {
            return SEARCH_TITLE;
        }
        match self.pages.get(self.visible) {
            Some(page) => page
                .stack
                .last()
                .map_or(page.title.as_str(), |s| s.title.as_str()),
            None => "",
        }
    }

    /// Sections on screen.
    pub fn current_sections(&self) -> &[SectionView] {
        if let Some(search) = &self.search {
            return &search.sections;
        }
        self.pages.get(self.visible).map_or(&[], PageView::top)
    }

    /// Top-level widgets on screen, in order.
    pub fn current_widgets(&self) -> Vec<&Widget> {
        self.current_sections()
            .iter()
            .flat_map(|s| &s.widgets)
            .collect()
    }

    /// Find a live widget anywhere in the panel.
    pub fn find(&self, id: WidgetId) -> Option<&Widget> {
        if let Some(w) = self.search.as_ref().and_then(|s| find_in(&s.sections, id)) {
            return Some(w);
        }
        self.pages.iter().find_map(|p| {
            p.all_sections()
                .flat_map(|s| &s.widgets)
                .find_map(|w| w.find(id))
        })
    }

    /// Show page `index`, leaving any search.
    pub fn show_page(&mut self, index: usize) -> Result<()> {
        if index >= self.pages.len() {
            return Err(Error::UnknownPage(index.to_string()));
        }
        self.drop_search();
        self.visible = index;
        self.remap();
        debug!(page = index, "page_shown");
        Ok(())
    }

    /// Show the page whose id is `page`.
    pub fn redirect(&mut self, page: &str) -> Result<()> {
        let index = self
            .doc
            .page_index(page)
            .ok_or_else(|| Error::UnknownPage(page.to_string()))?;
        self.show_page(index)
    }

    /// Push a sub-page onto the visible page.
    pub fn push(&mut self, title: &str, path: Vec<String>, layout: &[Section]) {
        self.drop_search();
        let sections = build_sections(&self.ctx, layout, &path);
        let Some(page) = self.pages.get_mut(self.visible) else {
            teardown(&sections);
            return;
        };
        page.stack.push(SubPage {
            title: title.to_string(),
            path,
            sections,
        });
        debug!(title, depth = page.stack.len(), "subpage_pushed");
        self.remap();
    }

    /// Pop the innermost sub-page of the visible page and tear it down.
    /// Returns false when there was nothing to pop.
    pub fn pop(&mut self) -> bool {
        let Some(sub) = self
            .pages
            .get_mut(self.visible)
            .and_then(|p| p.stack.pop())
        else {
            return false;
        };
        teardown(&sub.sections);
        debug!(title = %sub.title, "subpage_popped");
        self.remap();
        true
    }

    /// Show the items matching `query` on a results page. An empty query
    /// leaves search. Returns the number of hits.
    pub fn search(&mut self, query: &str) -> usize {
        self.drop_search();
        let query = query.trim();
        if query.is_empty() {
            self.remap();
            return 0;
        }
        let hits = self.doc.search(query);
        let widgets = hits
            .iter()
            .map(|hit| build_item(&self.ctx, &hit.item, &[hit.context.clone()]))
            .collect::<Vec<_>>();
        let count = widgets.len();
        self.search = Some(SearchView {
            query: query.to_string(),
            sections: vec![SectionView {
                title: Some(format!("Results for \"{query}\"")),
                description: None,
                grid: false,
                widgets,
            }],
        });
        self.remap();
        debug!(query, hits = count, "search_shown");
        count
    }

    /// Leave search and show the visible page again.
    pub fn exit_search(&mut self) {
        if self.drop_search() {
            self.remap();
        }
    }

    /// Tear down the search results. Returns whether a search was active.
    fn drop_search(&mut self) -> bool {
        match self.search.take() {
            Some(search) => {
                teardown(&search.sections);
                true
            }
            None => false,
        }
    }

    /// Apply a navigation event from a widget. Returns whether the event was
    /// one the panel handles.
    pub fn handle_event(&mut self, event: &UiEvent) -> Result<bool> {
        match event {
            UiEvent::Redirect { page } => {
                self.redirect(page)?;
                Ok(true)
            }
            UiEvent::Navigate {
                title,
                path,
                layout,
            } => {
                self.push(title, path.clone(), layout);
                Ok(true)
            }
            UiEvent::Changed { .. } | UiEvent::Toast { .. } => Ok(false),
        }
    }

    /// Reload the document from disk. On failure the current pages stay up.
    pub fn reload(&mut self) -> Result<()> {
        let Some(path) = self.source.clone() else {
            debug!("reload skipped: panel was not loaded from a file");
            return Ok(());
        };
        let doc = match config::load_from_path(&path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), "reload failed, keeping current panel");
                return Err(e.into());
            }
        };
        self.replace_document(doc);
        Ok(())
    }

    /// Tear down every page and rebuild from `doc`, keeping the visible page
    /// when its id still exists.
    pub fn replace_document(&mut self, doc: Document) {
        if doc.engine != self.doc.engine {
            warn!("engine options changed; they take effect on restart");
        }
        let keep = self
            .pages
            .get(self.visible)
            .and_then(|p| p.id.as_deref())
            .and_then(|id| doc.page_index(id));
        self.teardown_all();
        self.doc = doc;
        self.visible = keep.unwrap_or(0);
        self.build_pages();
    }

    /// Tear down every widget in the panel.
    pub fn teardown_all(&mut self) {
        self.drop_search();
        for page in self.pages.drain(..) {
            for sub in page.stack.iter().rev() {
                teardown(&sub.sections);
            }
            teardown(&page.sections);
        }
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.teardown_all();
    }
}
