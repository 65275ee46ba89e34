use std::{fmt, time::Duration};

use config::Section;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{info, trace};

use crate::{Error, Result, widgets::WidgetId};

/// Toast duration after a successful launch.
pub const TOAST_OK: Duration = Duration::from_secs(2);
/// Toast duration after a failed launch.
pub const TOAST_FAILED: Duration = Duration::from_secs(4);

/// Which visible part of a widget changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Icon name or file.
    Icon,
    /// On/off state.
    State,
    /// Slider position.
    Value,
    /// Label text.
    Label,
    /// Button caption.
    ButtonText,
    /// Button or card style.
    Style,
    /// Selection option list.
    Options,
    /// Selected option.
    Selected,
    /// Badge count; empty when hidden.
    Badge,
    /// Entry text.
    Text,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Icon => "icon",
            Self::State => "state",
            Self::Value => "value",
            Self::Label => "label",
            Self::ButtonText => "button",
            Self::Style => "style",
            Self::Options => "options",
            Self::Selected => "selected",
            Self::Badge => "badge",
            Self::Text => "text",
        };
        f.write_str(s)
    }
}

/// Messages from widgets to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A widget's visible state changed.
    Changed {
        /// Widget that changed.
        id: WidgetId,
        /// What changed.
        field: Field,
        /// New rendered value.
        value: String,
    },
    /// Show a transient message.
    Toast {
        /// Message text.
        message: String,
        /// How long to show it.
        timeout: Duration,
    },
    /// Switch the sidebar to the page with this id.
    Redirect {
        /// Target page id.
        page: String,
    },
    /// Push a sub-page onto the visible page's navigation stack.
    Navigate {
        /// Sub-page title.
        title: String,
        /// Breadcrumb of titles leading to the sub-page.
        path: Vec<String>,
        /// Sub-page layout.
        layout: Vec<Section>,
    },
}

/// Sends widget changes, toasts and navigation requests to the front end.
#[derive(Clone)]
pub struct NotificationDispatcher {
    /// Event channel.
    tx: UnboundedSender<UiEvent>,
}

impl NotificationDispatcher {
    /// Create a dispatcher from an event channel.
    pub fn new(tx: UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    /// Create a dispatcher together with the receiving end.
    pub fn channel() -> (Self, UnboundedReceiver<UiEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Send a raw event.
    fn send(&self, event: UiEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| Error::ChannelClosed)
    }

    /// Report a visible change.
    pub fn send_changed(&self, id: WidgetId, field: Field, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        trace!(widget = %id, %field, value = %value, "widget_changed");
        self.send(UiEvent::Changed { id, field, value })
    }

    /// Show a toast.
    pub fn send_toast(&self, message: impl Into<String>, timeout: Duration) -> Result<()> {
        let message = message.into();
        info!(message = %message, "toast_display");
        self.send(UiEvent::Toast { message, timeout })
    }

    /// Report the outcome of a user-launched action.
    pub fn send_launch_result(&self, title: &str, ok: bool) -> Result<()> {
        if ok {
            self.send_toast(format!("▶ Launched: {title}"), TOAST_OK)
        } else {
            self.send_toast(format!("✖ Failed: {title}"), TOAST_FAILED)
        }
    }

    /// Ask the front end to show page `page`.
    pub fn request_redirect(&self, page: &str) -> Result<()> {
        self.send(UiEvent::Redirect {
            page: page.to_string(),
        })
    }

    /// Ask the front end to push a sub-page.
    pub fn request_navigate(
        &self,
        title: &str,
        path: Vec<String>,
        layout: Vec<Section>,
    ) -> Result<()> {
        self.send(UiEvent::Navigate {
            title: title.to_string(),
            path,
            layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_results_become_toasts() {
        let (n, mut rx) = NotificationDispatcher::channel();
        n.send_launch_result("Update", true).unwrap();
        n.send_launch_result("Update", false).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            UiEvent::Toast {
                message: "▶ Launched: Update".into(),
                timeout: TOAST_OK
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            UiEvent::Toast {
                message: "✖ Failed: Update".into(),
                timeout: TOAST_FAILED
            }
        );
    }

    #[test]
    fn closed_channel_is_an_error() {
        let (n, rx) = NotificationDispatcher::channel();
        drop(rx);
        assert!(matches!(n.request_redirect("x"), Err(Error::ChannelClosed)));
    }
}
