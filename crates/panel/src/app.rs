//! Interactive console session.
//!
//! The panel lives behind a mutex but is only ever touched from jobs posted to
//! the engine's main loop. Stdin commands and navigation events are both
//! turned into such jobs.

use std::{path::Path, result::Result as StdResult, sync::Arc};

use panel_engine::{
    Context, Error, MainLoop, NotificationDispatcher, Panel, ProcessRunner, Result, UiEvent,
    UiHandle, Widget,
};
use parking_lot::Mutex;
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::{mpsc::UnboundedReceiver, oneshot},
};
use tracing::{debug, info, warn};

use crate::{
    console::{ConsoleCommand, HELP, PageRef},
    render,
};

/// The panel shared between the stdin loop and the event printer.
type SharedPanel = Arc<Mutex<Panel>>;

/// Run `f` on the main loop and wait for its result.
async fn on_main<T, F>(ui: &UiHandle, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    ui.invoke(move || {
        let _ = tx.send(f());
    })?;
    rx.await.map_err(|_| Error::ChannelClosed)
}

/// Load `path`, build the panel and serve console commands until `quit` or EOF.
pub async fn run(path: &Path) -> Result<()> {
    let doc = config::load_from_path(path)?;
    let main_loop = MainLoop::new();
    let ui = main_loop.handle();
    let loop_task = tokio::spawn(main_loop.run());

    let (notifier, events) = NotificationDispatcher::channel();
    let ctx = Context::new(ui.clone(), Arc::new(ProcessRunner), &doc.engine, notifier)?;
    let build_ctx = ctx.clone();
    let source = path.to_path_buf();
    let panel: SharedPanel = on_main(&ui, move || {
        let mut panel = Panel::new(&build_ctx, doc);
        panel.set_source(source);
        Arc::new(Mutex::new(panel))
    })
    .await?;
    info!(path = %path.display(), "panel_ready");

    let printer = tokio::spawn(print_events(events, ui.clone(), panel.clone()));
    print_screen(&ui, &panel).await?;
    println!("type `help` for commands");

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        let command = match ConsoleCommand::parse(&line) {
            None => continue,
            Some(Ok(c)) => c,
            Some(Err(e)) => {
                println!("{e}");
                continue;
            }
        };
        if command == ConsoleCommand::Quit {
            break;
        }
        if command == ConsoleCommand::Help {
            println!("{HELP}");
            continue;
        }
        let shared = panel.clone();
        let reply = on_main(&ui, move || execute(&mut shared.lock(), command)).await?;
        println!("{reply}");
    }

    let shared = panel.clone();
    on_main(&ui, move || shared.lock().teardown_all()).await?;
    ctx.shutdown();
    printer.abort();
    ui.quit();
    let _ = loop_task.await;
    debug!("console_session_done");
    Ok(())
}

/// The row at `index` on the current screen.
fn row(panel: &Panel, index: usize) -> StdResult<Widget, String> {
    render::rows(panel)
        .into_iter()
        .nth(index)
        .ok_or_else(|| format!("no row {}", index + 1))
}

/// Apply one command on the main loop and return what to print.
fn execute(panel: &mut Panel, command: ConsoleCommand) -> String {
    match apply(panel, command) {
        Ok(Some(msg)) => msg,
        Ok(None) => render::screen(panel),
        Err(msg) => msg,
    }
}

/// Apply `command`. `Ok(None)` means "print the screen".
fn apply(panel: &mut Panel, command: ConsoleCommand) -> StdResult<Option<String>, String> {
    match command {
        ConsoleCommand::Page(PageRef::Index(i)) => {
            panel.show_page(i).map_err(|e| e.to_string())?;
        }
        ConsoleCommand::Page(PageRef::Id(id)) => {
            panel.redirect(&id).map_err(|e| e.to_string())?;
        }
        ConsoleCommand::Press(r, button) => {
            let w = row(panel, r)?;
            if !w.press(button) {
                return Err(format!("{} cannot be pressed", w.title()));
            }
            return Ok(Some(format!("{}: {}", w.title(), w.summary())));
        }
        ConsoleCommand::Toggle(r) => match row(panel, r)? {
            Widget::Toggle(t) => {
                t.set_active(!t.is_active());
                return Ok(Some(format!("{}: {}", t.core().title(), t.summary())));
            }
            Widget::ToggleCard(t) => {
                t.click();
                return Ok(Some(format!("{}: {}", t.core().title(), t.summary())));
            }
            other => return Err(format!("{} is not a toggle", other.title())),
        },
        ConsoleCommand::Slide(r, value) => match row(panel, r)? {
            Widget::Slider(s) => {
                s.set_value(value);
                return Ok(Some(format!("{}: {}", s.core().title(), s.summary())));
            }
            other => return Err(format!("{} is not a slider", other.title())),
        },
        ConsoleCommand::Select(r, option) => match row(panel, r)? {
            Widget::Selection(s) => {
                if !s.select(&option) {
                    return Err(format!("unknown option {option:?}; have {}", s.summary()));
                }
                return Ok(Some(format!("{}: {}", s.core().title(), s.summary())));
            }
            other => return Err(format!("{} is not a selection", other.title())),
        },
        ConsoleCommand::Entry(r, text) => match row(panel, r)? {
            Widget::Entry(e) => {
                e.set_text(&text);
                if !e.apply() {
                    return Err(format!("{}: nothing to apply", e.core().title()));
                }
                return Ok(Some(format!("{}: applied", e.core().title())));
            }
            other => return Err(format!("{} is not an entry", other.title())),
        },
        ConsoleCommand::Open(r) => match row(panel, r)? {
            w @ (Widget::Navigation(_) | Widget::Expander(_)) => {
                w.press(0);
                if matches!(w, Widget::Navigation(_)) {
                    return Ok(Some(format!("opening {}", w.title())));
                }
            }
            other => return Err(format!("{} cannot be opened", other.title())),
        },
        ConsoleCommand::Back => {
            if !panel.pop() {
                return Err("already at the top of the page".into());
            }
        }
        ConsoleCommand::Search(query) => {
            let hits = panel.search(&query);
            if !query.is_empty() && hits == 0 {
                return Ok(Some(format!("no results for {query:?}")));
            }
        }
        ConsoleCommand::Reload => {
            if let Err(e) = panel.reload() {
                return Err(format!("reload failed, keeping current panel:\n{e}"));
            }
        }
        ConsoleCommand::Show => {}
        ConsoleCommand::Help | ConsoleCommand::Quit => return Ok(Some(HELP.to_string())),
    }
    Ok(None)
}

/// Print the current screen.
async fn print_screen(ui: &UiHandle, panel: &SharedPanel) -> Result<()> {
    let shared = panel.clone();
    let text = on_main(ui, move || render::screen(&shared.lock())).await?;
    print!("{text}");
    Ok(())
}

/// Print widget changes and toasts; apply navigation events to the panel.
async fn print_events(mut events: UnboundedReceiver<UiEvent>, ui: UiHandle, panel: SharedPanel) {
    while let Some(event) = events.recv().await {
        match event {
            UiEvent::Changed { id, field, value } => {
                let shared = panel.clone();
                let title = on_main(&ui, move || {
                    shared.lock().find(id).map(|w| w.title().to_string())
                })
                .await
                .ok()
                .flatten()
                .unwrap_or_else(|| id.to_string());
                println!("~ {title} {field}: {value}");
            }
            UiEvent::Toast { message, .. } => println!("» {message}"),
            nav @ (UiEvent::Redirect { .. } | UiEvent::Navigate { .. }) => {
                let shared = panel.clone();
                let shown = on_main(&ui, move || {
                    let mut p = shared.lock();
                    match p.handle_event(&nav) {
                        Ok(_) => render::screen(&p),
                        Err(e) => e.to_string(),
                    }
                })
                .await;
                match shown {
                    Ok(text) => print!("{text}"),
                    Err(_) => return,
                }
            }
        }
    }
}
