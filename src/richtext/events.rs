// Editor Events
// Notifications flowing outward from the editor to its host.
// The listener decouples the editor from any particular UI toolkit;
// tests use a channel, headless callers use `VoidListener`.

use super::font::FontSummary;
use std::sync::mpsc::Sender;

/// Why the document content changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// Text was inserted or deleted, or a range was restyled
    Edit,
    Clear,
    Load,
}

/// Events emitted by [`RichTextEditor`](super::editor::RichTextEditor)
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ContentChanged(ChangeReason),
    /// Font under the cursor, or aggregated over the selection
    FontChanged(FontSummary),
    /// A link-styled run was pressed
    LinkActivated(String),
    /// Cursor visibility toggled or the selection changed
    RedrawRequested,
}

/// Receives editor events. Default: no-op.
pub trait EditorListener {
    fn send_event(&self, _event: EditorEvent) {}
}

/// Listener that drops every event
pub struct VoidListener;

impl EditorListener for VoidListener {}

/// Forwards events into a channel; a hung up receiver is ignored
impl EditorListener for Sender<EditorEvent> {
    fn send_event(&self, event: EditorEvent) {
        let _ = self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_channel_listener_forwards() {
        let (tx, rx) = channel();
        tx.send_event(EditorEvent::ContentChanged(ChangeReason::Load));
        tx.send_event(EditorEvent::LinkActivated("https://example.com".into()));
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                EditorEvent::ContentChanged(ChangeReason::Load),
                EditorEvent::LinkActivated("https://example.com".into()),
            ]
        );
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        tx.send_event(EditorEvent::RedrawRequested);
        VoidListener.send_event(EditorEvent::RedrawRequested);
    }
}
