// Rich Text Editor
// Owns the run store, the laid out lines, cursor and selection.
// Every stimulus runs to completion: mutate, resegment, relayout, re-anchor, notify.

use super::blink::CursorBlink;
use super::events::{ChangeReason, EditorEvent, EditorListener, VoidListener};
use super::export::{ExportFormat, export};
use super::font::{FontDescriptor, FontSummary, Link};
use super::interchange::{InterchangeError, SavedCursor, load_runs, save_runs};
use super::layout::{LayoutParams, Line, content_height, layout_runs};
use super::measure::{Segmenter, TextMeasurer};
use super::resolve::{
    Position, document_start, line_at_y, offset_to_position, position_to_location,
};
use super::runs::{
    Location, RunId, RunRecord, RunStore, next_boundary, previous_boundary,
};
use crate::config::EditorConfig;
use std::cmp::Ordering;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Result of an editing operation
pub type EditResult = Result<(), EditError>;

/// Errors that can occur during editing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("editor is read-only")]
    ReadOnly,
    #[error("location does not refer to a live run")]
    InvalidLocation,
}

/// Keys the editor handles itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
}

/// A selection, always in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Location,
    pub end: Location,
}

/// How [`RichTextEditor::load_with`] treats the current document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Replace the document instead of appending to it
    pub clear: bool,
    /// Emit `ContentChanged(Load)` afterwards
    pub notify: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            clear: true,
            notify: true,
        }
    }
}

/// The rich text editor with cursor state
pub struct RichTextEditor {
    store: RunStore,
    lines: Vec<Line>,
    config: EditorConfig,
    width: f32,
    height: f32,
    /// None only while the document has no runs
    cursor: Option<Location>,
    selection: Option<Selection>,
    /// Where a drag selection started
    drag_origin: Option<Location>,
    /// Font chosen without a selection, applied to the next input
    pending: Option<RunRecord>,
    hover: Option<RunId>,
    mouse_down: bool,
    focus: bool,
    blink: CursorBlink,
    listener: Box<dyn EditorListener>,
}

impl RichTextEditor {
    /// Create an editor with an empty document
    pub fn new(measurer: Box<dyn TextMeasurer>, config: EditorConfig) -> Self {
        let segmenter = Segmenter::new(
            measurer,
            config.measure_fallback,
            config.default_font.clone(),
        );
        let mut blink = CursorBlink::new(config.blink_interval());
        if !config.read_only {
            blink.start(Instant::now());
        }
        let mut editor = RichTextEditor {
            store: RunStore::new(segmenter),
            lines: Vec::new(),
            config,
            width: 0.0,
            height: 0.0,
            cursor: None,
            selection: None,
            drag_origin: None,
            pending: None,
            hover: None,
            mouse_down: false,
            focus: true,
            blink,
            listener: Box::new(VoidListener),
        };
        editor.relayout();
        editor
    }

    pub fn set_listener(&mut self, listener: impl EditorListener + 'static) {
        self.listener = Box::new(listener);
    }

    fn notify(&self, event: EditorEvent) {
        self.listener.send_event(event);
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn document_text(&self) -> String {
        self.store.text()
    }

    pub fn content_height(&self) -> f32 {
        content_height(&self.lines)
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    /// Lay the document out for a new viewport size
    pub fn layout(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.relayout();
        self.notify(EditorEvent::RedrawRequested);
    }

    pub fn set_word_wrap(&mut self, word_wrap: bool) {
        self.config.word_wrap = word_wrap;
        self.relayout();
        self.notify(EditorEvent::RedrawRequested);
    }

    fn relayout(&mut self) {
        let params = LayoutParams {
            width: self.width,
            word_wrap: self.config.word_wrap,
            default_line_height: self.store.segmenter().default_line_height(),
        };
        self.lines = layout_runs(self.store.runs(), params);
    }

    // --- Focus and blinking

    pub fn has_focus(&self) -> bool {
        self.focus
    }

    /// Gaining focus restarts the blink phase; losing it hides the cursor
    pub fn set_focus(&mut self, focus: bool) {
        self.focus = focus;
        self.mouse_down = false;
        if focus && !self.config.read_only {
            self.blink.reset(Instant::now());
        } else {
            self.blink.stop();
        }
        self.notify(EditorEvent::RedrawRequested);
    }

    pub fn cursor_visible(&self) -> bool {
        self.focus && self.blink.visible()
    }

    /// Advance the blink. Returns true if the cursor needs repainting.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.focus {
            return false;
        }
        let changed = self.blink.tick(now);
        if changed {
            self.notify(EditorEvent::RedrawRequested);
        }
        changed
    }

    /// When the host should call `tick` next, if at all
    pub fn next_blink_deadline(&self, now: Instant) -> Option<Instant> {
        if !self.focus {
            return None;
        }
        self.blink.next_deadline(now)
    }

    fn reset_blink(&mut self) {
        if self.focus && !self.config.read_only {
            self.blink.reset(Instant::now());
        }
    }

    // --- Cursor and selection

    pub fn cursor(&self) -> Option<Location> {
        self.cursor.and_then(|c| self.store.clamp(c))
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Position of the cursor on the laid out lines
    pub fn cursor_position(&self) -> Position {
        match self.cursor() {
            Some(location) => offset_to_position(&self.lines, &self.store, location),
            None => document_start(&self.lines),
        }
    }

    /// Move the cursor, dropping any selection
    pub fn set_cursor(&mut self, location: Location) -> EditResult {
        let location = self.store.clamp(location).ok_or(EditError::InvalidLocation)?;
        self.cursor = Some(location);
        self.selection = None;
        self.reset_blink();
        self.notify(EditorEvent::RedrawRequested);
        Ok(())
    }

    /// Move the cursor to an offset in the full document text
    pub fn set_cursor_offset(&mut self, offset: usize) -> EditResult {
        let location = self
            .store
            .location_at(offset)
            .ok_or(EditError::InvalidLocation)?;
        self.set_cursor(location)
    }

    fn normalize(&self, a: Location, b: Location) -> Option<Selection> {
        match self.store.compare(a, b)? {
            Ordering::Equal => None,
            Ordering::Less => Some(Selection { start: a, end: b }),
            Ordering::Greater => Some(Selection { start: b, end: a }),
        }
    }

    /// Select between two locations in either order; the cursor goes to `to`
    pub fn set_selection(&mut self, from: Location, to: Location) -> EditResult {
        let from = self.store.clamp(from).ok_or(EditError::InvalidLocation)?;
        let to = self.store.clamp(to).ok_or(EditError::InvalidLocation)?;
        self.selection = self.normalize(from, to);
        self.cursor = Some(to);
        self.notify_font();
        self.notify(EditorEvent::RedrawRequested);
        Ok(())
    }

    pub fn select_all(&mut self) {
        let (Some(first), Some(last)) = (self.store.runs().first(), self.store.runs().last()) else {
            return;
        };
        let start = Location::new(first.id(), 0);
        let end = Location::new(last.id(), last.len());
        self.selection = self.normalize(start, end);
        self.cursor = Some(end);
        self.notify_font();
        self.notify(EditorEvent::RedrawRequested);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Font under the cursor, aggregated over the selection if there is one
    pub fn font_at_cursor(&self) -> FontSummary {
        if let Some(selection) = self.selection {
            return self.store.describe_range_font(selection.start, selection.end);
        }
        if let Some(pending) = &self.pending {
            return FontSummary::from(&pending.font);
        }
        match self.cursor().and_then(|c| self.store.get(c.run)) {
            Some(run) => FontSummary::from(run.font()),
            None => FontSummary::from(self.store.default_font()),
        }
    }

    fn notify_font(&self) {
        self.notify(EditorEvent::FontChanged(self.font_at_cursor()));
    }

    // --- Editing

    /// Delete the selection, returning where the cursor lands
    fn remove_selection(&mut self) -> Option<Location> {
        let selection = self.selection.take()?;
        let location = self.store.delete_range(selection.start, selection.end);
        self.cursor = Some(location);
        Some(location)
    }

    /// Location new text goes to, creating or splitting runs as needed
    fn insertion_point(&mut self) -> Result<Location, EditError> {
        let pending = self.pending.take();

        let Some(location) = self.cursor() else {
            let record = pending.unwrap_or_else(|| self.store.create_run(None));
            let id = self.store.push(record);
            return Ok(Location::new(id, 0));
        };

        let Some(record) = pending else {
            return Ok(location);
        };
        let empty = self.store.get(location.run).is_some_and(|run| run.is_empty());
        if empty {
            self.store.set_run_font(location.run, record.font);
            return Ok(location);
        }
        let id = self
            .store
            .insert_at(location, record)
            .ok_or(EditError::InvalidLocation)?;
        Ok(Location::new(id, 0))
    }

    /// Drop empty runs the cursor does not sit in, then lay out again
    fn finish_edit(&mut self) {
        let keep: Vec<RunId> = self.cursor.iter().map(|c| c.run).collect();
        self.store.remove_empty_runs(&keep);
        self.relayout();
        self.reset_blink();
    }

    /// Insert text at the cursor, replacing the selection
    pub fn text_input(&mut self, text: &str) -> EditResult {
        self.text_input_with(text, true)
    }

    /// Like [`text_input`](Self::text_input), but `notify: false` skips the
    /// content changed event, for hosts filling the editor programmatically
    pub fn text_input_with(&mut self, text: &str, notify: bool) -> EditResult {
        if self.config.read_only {
            return Err(EditError::ReadOnly);
        }
        let replaced = self.remove_selection().is_some();
        if text.is_empty() {
            if replaced {
                self.finish_edit();
                if notify {
                    self.notify(EditorEvent::ContentChanged(ChangeReason::Edit));
                }
            }
            return Ok(());
        }

        let location = self.insertion_point()?;
        let location = self
            .store
            .insert_text(location, text)
            .ok_or(EditError::InvalidLocation)?;
        self.cursor = Some(location);
        self.finish_edit();
        if notify {
            self.notify(EditorEvent::ContentChanged(ChangeReason::Edit));
        }
        Ok(())
    }

    /// Delete the selection, if any
    pub fn delete_selection(&mut self) -> EditResult {
        if self.config.read_only {
            return Err(EditError::ReadOnly);
        }
        if self.remove_selection().is_some() {
            self.finish_edit();
            self.notify(EditorEvent::ContentChanged(ChangeReason::Edit));
        }
        Ok(())
    }

    pub fn key_down(&mut self, key: Key) -> EditResult {
        if self.config.read_only {
            return Err(EditError::ReadOnly);
        }
        match key {
            Key::Enter => return self.text_input("\n"),
            Key::Backspace => {
                if self.selection.is_some() {
                    return self.delete_selection();
                }
                self.backspace();
            }
            Key::ArrowLeft | Key::ArrowUp => {
                if let Some(selection) = self.selection.take() {
                    self.cursor = Some(selection.start);
                } else if key == Key::ArrowLeft {
                    self.cursor = self.cursor().map(|c| self.step_left(c));
                } else {
                    self.move_vertically(false);
                }
            }
            Key::ArrowRight | Key::ArrowDown => {
                if let Some(selection) = self.selection.take() {
                    self.cursor = Some(selection.end);
                } else if key == Key::ArrowRight {
                    self.cursor = self.cursor().map(|c| self.step_right(c));
                } else {
                    self.move_vertically(true);
                }
            }
        }
        self.reset_blink();
        self.notify(EditorEvent::RedrawRequested);
        Ok(())
    }

    /// At the start of a run, move to the end of the previous one,
    /// dropping the run left behind if it is empty
    fn leave_run_start(&mut self, location: Location) -> Location {
        if location.offset > 0 {
            return location;
        }
        let previous = self.store.previous(location.run);
        let next = self.store.next(location.run);
        let empty = self.store.get(location.run).is_some_and(|run| run.is_empty());
        let removed = empty && self.store.len() > 1 && self.store.remove(location.run).is_some();
        match previous.and_then(|id| self.store.get(id)) {
            Some(run) => Location::new(run.id(), run.len()),
            // the first run went away, so its successor now starts the document
            None if removed => next.map_or(location, |id| Location::new(id, 0)),
            None => location,
        }
    }

    fn backspace(&mut self) {
        let Some(location) = self.cursor() else {
            return;
        };
        let mut location = self.leave_run_start(location);
        let mut changed = false;

        if location.offset > 0 {
            let start = match self.store.get(location.run) {
                Some(run) => previous_boundary(run.text(), location.offset),
                None => return,
            };
            if let Some(new_location) = self.store.remove_text(location.run, start, location.offset) {
                location = new_location;
                changed = true;
            }
        }

        let location = self.leave_run_start(location);
        self.cursor = self.store.contains(location.run).then_some(location);
        self.finish_edit();
        if changed {
            self.notify(EditorEvent::ContentChanged(ChangeReason::Edit));
        }
    }

    /// One grapheme left; (previous, len) and (run, 0) are the same spot, so skip it
    fn step_left(&self, location: Location) -> Location {
        if location.offset > 0 {
            let text = self.store.get(location.run).map(|r| r.text()).unwrap_or("");
            return Location::new(location.run, previous_boundary(text, location.offset));
        }
        let mut id = location.run;
        while let Some(previous) = self.store.previous(id) {
            if let Some(run) = self.store.get(previous).filter(|r| !r.is_empty()) {
                return Location::new(previous, previous_boundary(run.text(), run.len()));
            }
            id = previous;
        }
        location
    }

    fn step_right(&self, location: Location) -> Location {
        let Some(run) = self.store.get(location.run) else {
            return location;
        };
        if location.offset < run.len() {
            return Location::new(location.run, next_boundary(run.text(), location.offset));
        }
        let mut id = location.run;
        while let Some(next) = self.store.next(id) {
            if let Some(run) = self.store.get(next).filter(|r| !r.is_empty()) {
                return Location::new(next, next_boundary(run.text(), 0));
            }
            id = next;
        }
        location
    }

    fn move_vertically(&mut self, down: bool) {
        if self.cursor().is_none() {
            return;
        }
        let position = self.cursor_position();
        let y = if down {
            position.y + position.height + 1.0
        } else {
            (position.y - position.height / 2.0).max(0.0)
        };
        let hit = position_to_location(&self.lines, &self.store, position.x, y);
        if let Some(location) = hit.location() {
            self.cursor = Some(location);
        } else if let Some(first) = self.store.first() {
            self.cursor = Some(Location::new(first, 0));
        }
    }

    /// Apply a font to the selection, or remember it for the next input
    pub fn set_font(&mut self, font: FontDescriptor) -> EditResult {
        if self.config.read_only {
            return Err(EditError::ReadOnly);
        }

        if let Some(selection) = self.selection {
            let outcome = self
                .store
                .apply_font_to_range(&font, selection.start, selection.end);
            self.selection = self.normalize(outcome.from, outcome.to);
            self.cursor = Some(outcome.cursor);
            self.relayout();
            self.reset_blink();
            self.notify(EditorEvent::ContentChanged(ChangeReason::Edit));
            self.notify_font();
            return Ok(());
        }

        let empty_run = self
            .cursor()
            .filter(|c| self.store.get(c.run).is_some_and(|run| run.is_empty()));
        match empty_run {
            Some(location) => {
                self.store.set_run_font(location.run, font);
                self.relayout();
            }
            None => self.pending = Some(RunRecord::empty(font)),
        }
        self.notify_font();
        Ok(())
    }

    // --- Pointer

    /// Run whose painted text lies under the point
    pub fn run_at_point(&self, x: f32, y: f32) -> Option<RunId> {
        if self.lines.is_empty() || y < 0.0 || y >= self.content_height() {
            return None;
        }
        let line = &self.lines[line_at_y(&self.lines, y)];
        line.words
            .iter()
            .find(|word| x >= word.x && x < word.right())
            .map(|word| word.run)
    }

    /// Link of the run under the pointer
    pub fn hovered_link(&self) -> Option<&Link> {
        self.hover
            .and_then(|id| self.store.get(id))
            .and_then(|run| run.font().link.as_ref())
    }

    pub fn mouse_down(&mut self, x: f32, y: f32) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        if let Some(url) = self
            .run_at_point(x, y)
            .and_then(|id| self.store.get(id))
            .and_then(|run| run.font().link.as_ref())
            .map(|link| link.url.clone())
        {
            self.notify(EditorEvent::LinkActivated(url));
        }

        let hit = position_to_location(&self.lines, &self.store, x, y);
        let location = hit
            .location()
            .or_else(|| self.store.first().map(|id| Location::new(id, 0)));
        self.cursor = location;
        self.drag_origin = location;
        self.selection = None;
        self.pending = None;
        self.mouse_down = true;
        self.reset_blink();
        if location.is_some() {
            self.notify_font();
        }
        self.notify(EditorEvent::RedrawRequested);
    }

    pub fn mouse_move(&mut self, x: f32, y: f32) {
        if !self.mouse_down {
            let hover = self.run_at_point(x, y);
            if hover != self.hover {
                self.hover = hover;
                self.notify(EditorEvent::RedrawRequested);
            }
            return;
        }

        let Some(origin) = self.drag_origin else {
            return;
        };
        let Some(location) = position_to_location(&self.lines, &self.store, x, y).location() else {
            return;
        };
        self.selection = self.normalize(origin, location);
        self.cursor = Some(location);
        if self.selection.is_some() {
            self.notify_font();
        }
        self.notify(EditorEvent::RedrawRequested);
    }

    pub fn mouse_up(&mut self, _x: f32, _y: f32) {
        self.mouse_down = false;
        self.drag_origin = None;
    }

    // --- Document

    /// Export the document, or only the selection
    pub fn export(&self, format: ExportFormat, selection_only: bool) -> String {
        let records = if selection_only {
            match self.selection {
                Some(selection) => self.store.get_range(selection.start, selection.end),
                None => return String::new(),
            }
        } else {
            self.store.records()
        };
        export(&records, format, &self.config.size_tags)
    }

    /// Serialize the document, optionally with the cursor
    pub fn save(&self, include_cursor: bool) -> Result<String, InterchangeError> {
        let cursor = if include_cursor {
            self.cursor().and_then(|c| {
                self.store.index_of(c.run).map(|index| SavedCursor {
                    index,
                    offset: c.offset,
                })
            })
        } else {
            None
        };
        save_runs(&self.store.records(), cursor)
    }

    /// Replace the document with saved data
    ///
    /// The current document is untouched if the data does not parse.
    pub fn load(&mut self, data: &str) -> Result<(), InterchangeError> {
        self.load_with(data, LoadOptions::default())
    }

    /// Load saved data, replacing or extending the document
    ///
    /// Without `clear` the loaded runs are appended and the cursor moves to the
    /// first of them. Loading nothing onto a document keeps its cursor.
    pub fn load_with(&mut self, data: &str, options: LoadOptions) -> Result<(), InterchangeError> {
        let loaded = load_runs(data)?;
        let base = if options.clear {
            self.store.replace_all(loaded.records);
            0
        } else {
            let base = self.store.len();
            for record in loaded.records {
                self.store.push(record);
            }
            base
        };

        let runs = self.store.runs();
        let restored = match loaded.cursor {
            Some(saved) => runs
                .get(base + saved.index)
                .map(|run| Location::new(run.id(), saved.offset)),
            None => runs.get(base).map(|run| Location::new(run.id(), 0)),
        };
        if restored.is_some() || options.clear {
            self.cursor = restored;
        }
        self.cursor = self.cursor();
        self.selection = None;
        self.pending = None;
        self.hover = None;
        self.relayout();
        self.reset_blink();
        debug!(
            runs = self.store.len(),
            lines = self.lines.len(),
            appended = !options.clear,
            "loaded document"
        );
        if options.notify {
            self.notify(EditorEvent::ContentChanged(ChangeReason::Load));
        }
        Ok(())
    }

    pub fn clear(&mut self, notify: bool) {
        self.store.clear();
        self.cursor = None;
        self.selection = None;
        self.pending = None;
        self.hover = None;
        self.drag_origin = None;
        self.relayout();
        debug!("cleared document");
        if notify {
            self.notify(EditorEvent::ContentChanged(ChangeReason::Clear));
        }
    }
}
