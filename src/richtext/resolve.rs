// Location Resolver
// Maps (run, offset) locations to positions on laid out lines and back.
// Both directions measure the same substrings so they stay exact inverses.

use super::layout::{Line, PlacedWord};
use super::runs::{Location, RunId, RunStore, clamp_offset};
use unicode_segmentation::UnicodeSegmentation;

/// Visual position of a location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    /// Top of the line
    pub y: f32,
    pub line: usize,
    pub height: f32,
}

/// Result of hit-testing a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitLocation {
    /// None when the point precedes all text
    pub run: Option<RunId>,
    pub offset: usize,
    pub line: usize,
    /// x of the resolved character boundary
    pub x: f32,
    pub y: f32,
}

impl HitLocation {
    pub fn location(&self) -> Option<Location> {
        self.run.map(|run| Location::new(run, self.offset))
    }
}

/// Index of the line whose band `[y, bottom)` contains `y`
///
/// Points above the document map to the first line, points below it to the last.
pub fn line_at_y(lines: &[Line], y: f32) -> usize {
    lines
        .iter()
        .position(|line| y < line.bottom())
        .unwrap_or(lines.len().saturating_sub(1))
}

/// Byte offset at which the painted text of a placed word starts
fn visible_start(word: &PlacedWord) -> usize {
    word.token.end_offset - word.visible_text().len()
}

fn x_in_word(word: &PlacedWord, offset: usize, store: &RunStore) -> f32 {
    let start = visible_start(word);
    if offset <= start {
        return word.x;
    }
    let Some(run) = store.get(word.run) else {
        return word.x;
    };
    let visible = word.visible_text();
    let end = clamp_offset(visible, offset - start);
    word.x + store.segmenter().measure(&visible[..end], run.font()).width
}

fn position_on(lines: &[Line], index: usize, x: f32) -> Position {
    let line = &lines[index];
    Position {
        x,
        y: line.y,
        line: index,
        height: line.max_height,
    }
}

/// Position of the very start of the document
pub fn document_start(lines: &[Line]) -> Position {
    match lines.first() {
        Some(_) => position_on(lines, 0, lines[0].offset),
        None => Position {
            x: 0.0,
            y: 0.0,
            line: 0,
            height: 0.0,
        },
    }
}

/// Position of a location on the laid out lines
///
/// The first token in layout order whose `[offset, end_offset]` holds the
/// offset wins. Locations no token covers fall back to the line a line break
/// opened, then to the end of the run's last preceding token, then to the
/// end of the previous run. Every live location resolves.
pub fn offset_to_position(lines: &[Line], store: &RunStore, location: Location) -> Position {
    let mut location = location;
    loop {
        let Some(run) = store.get(location.run) else {
            return document_start(lines);
        };
        let offset = clamp_offset(run.text(), location.offset);

        for (i, line) in lines.iter().enumerate() {
            for word in &line.words {
                if word.run == location.run
                    && word.token.offset <= offset
                    && offset <= word.token.end_offset
                {
                    return position_on(lines, i, x_in_word(word, offset, store));
                }
            }
        }

        if let Some(i) = lines
            .iter()
            .position(|line| line.anchor == Some(Location::new(location.run, offset)))
        {
            return position_on(lines, i, lines[i].offset);
        }

        let preceding = lines
            .iter()
            .enumerate()
            .flat_map(|(i, line)| line.words.iter().map(move |word| (i, word)))
            .filter(|(_, word)| word.run == location.run && word.token.end_offset <= offset)
            .last();
        if let Some((i, word)) = preceding {
            return position_on(lines, i, word.right());
        }

        match store.previous(location.run) {
            Some(previous) => {
                let len = store.get(previous).map(|run| run.len()).unwrap_or(0);
                location = Location::new(previous, len);
            }
            None => return document_start(lines),
        }
    }
}

/// Resolve a click inside a word to the nearest grapheme boundary
fn hit_in_word(word: &PlacedWord, store: &RunStore, x: f32) -> (usize, f32) {
    let start = visible_start(word);
    let Some(run) = store.get(word.run) else {
        return (start, word.x);
    };
    let visible = word.visible_text();
    let mut before_width = 0.0;
    let mut before = 0;
    for (i, grapheme) in visible.grapheme_indices(true) {
        let end = i + grapheme.len();
        let width = store.segmenter().measure(&visible[..end], run.font()).width;
        if x < word.x + (before_width + width) / 2.0 {
            return (start + before, word.x + before_width);
        }
        before_width = width;
        before = end;
    }
    (start + before, word.x + before_width)
}

/// Location under a point
pub fn position_to_location(lines: &[Line], store: &RunStore, x: f32, y: f32) -> HitLocation {
    if lines.is_empty() {
        return HitLocation {
            run: None,
            offset: 0,
            line: 0,
            x: 0.0,
            y: 0.0,
        };
    }

    let index = line_at_y(lines, y);
    let line = &lines[index];
    let hit = |run: Option<RunId>, offset: usize, x: f32| HitLocation {
        run,
        offset,
        line: index,
        x,
        y: line.y,
    };

    if let (Some(first), Some(last)) = (line.words.first(), line.words.last()) {
        if x < first.x {
            return hit(Some(first.run), visible_start(first), first.x);
        }
        for word in &line.words {
            if x >= word.x && x < word.right() {
                let (offset, boundary) = hit_in_word(word, store, x);
                return hit(Some(word.run), offset, boundary);
            }
        }
        return hit(
            Some(last.run),
            last.token.end_offset,
            line.offset + line.max_width,
        );
    }

    if let Some(anchor) = line.anchor.filter(|anchor| store.contains(anchor.run)) {
        return hit(Some(anchor.run), anchor.offset, line.offset);
    }

    // Empty line without a break of its own: step back to the last text,
    // counting one consumed character per skipped line
    let mut skipped = 1;
    for previous in lines[..index].iter().rev() {
        if let Some(word) = previous.words.last() {
            let offset = match store.get(word.run) {
                Some(run) => clamp_offset(run.text(), word.token.end_offset + skipped),
                None => word.token.end_offset,
            };
            return hit(Some(word.run), offset, line.offset);
        }
        skipped += 1;
    }
    hit(None, 0, line.offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::font::FontDescriptor;
    use crate::richtext::layout::{LayoutParams, layout_runs};
    use crate::richtext::measure::{MeasureFallback, MonospaceMeasurer, Segmenter};
    use crate::richtext::runs::RunRecord;

    fn store() -> RunStore {
        RunStore::new(Segmenter::new(
            Box::new(MonospaceMeasurer::new()),
            MeasureFallback::Zero,
            FontDescriptor::new("Mono", 10.0),
        ))
    }

    fn lay_out(store: &RunStore, width: f32) -> Vec<Line> {
        layout_runs(
            store.runs(),
            LayoutParams {
                width,
                word_wrap: true,
                default_line_height: 10.0,
            },
        )
    }

    fn mono() -> FontDescriptor {
        FontDescriptor::new("Mono", 10.0)
    }

    #[test]
    fn test_offset_to_position_inside_words() {
        let mut store = store();
        let id = store.push(RunRecord::new("ab cd", mono()));
        let lines = lay_out(&store, 200.0);
        let pos = offset_to_position(&lines, &store, Location::new(id, 0));
        assert_eq!((pos.x, pos.y, pos.line), (0.0, 0.0, 0));
        let pos = offset_to_position(&lines, &store, Location::new(id, 4));
        assert_eq!(pos.x, 20.0);
        let pos = offset_to_position(&lines, &store, Location::new(id, 5));
        assert_eq!(pos.x, 25.0);
    }

    #[test]
    fn test_offset_after_line_break_starts_next_line() {
        let mut store = store();
        let id = store.push(RunRecord::new("ab\n", mono()));
        let lines = lay_out(&store, 200.0);
        let pos = offset_to_position(&lines, &store, Location::new(id, 3));
        assert_eq!((pos.x, pos.line, pos.y), (0.0, 1, 10.0));
        let pos = offset_to_position(&lines, &store, Location::new(id, 2));
        assert_eq!((pos.x, pos.line), (10.0, 0));
    }

    #[test]
    fn test_empty_run_resolves_to_previous_run_end() {
        let mut store = store();
        store.push(RunRecord::new("abc", mono()));
        let empty = store.push(RunRecord::new("", mono().bold()));
        let lines = lay_out(&store, 200.0);
        let pos = offset_to_position(&lines, &store, Location::new(empty, 0));
        assert_eq!((pos.x, pos.line), (15.0, 0));
    }

    #[test]
    fn test_wrapped_word_positions() {
        let mut store = store();
        let id = store.push(RunRecord::new("wordword wordword", mono()));
        let lines = lay_out(&store, 40.0);
        let pos = offset_to_position(&lines, &store, Location::new(id, 11));
        assert_eq!((pos.x, pos.line), (10.0, 1));
        // The separating space belongs to the first line's end
        let pos = offset_to_position(&lines, &store, Location::new(id, 8));
        assert_eq!((pos.x, pos.line), (40.0, 0));
    }

    #[test]
    fn test_position_rounds_to_nearest_boundary() {
        let mut store = store();
        let id = store.push(RunRecord::new("abcd", mono()));
        let lines = lay_out(&store, 200.0);
        let left = position_to_location(&lines, &store, 6.0, 2.0);
        assert_eq!(left.location(), Some(Location::new(id, 1)));
        assert_eq!(left.x, 5.0);
        let right = position_to_location(&lines, &store, 8.0, 2.0);
        assert_eq!(right.location(), Some(Location::new(id, 2)));
    }

    #[test]
    fn test_position_past_line_end_snaps_to_last_word() {
        let mut store = store();
        let id = store.push(RunRecord::new("ab\ncd", mono()));
        let lines = lay_out(&store, 200.0);
        let hit = position_to_location(&lines, &store, 150.0, 3.0);
        assert_eq!(hit.location(), Some(Location::new(id, 2)));
        assert_eq!(hit.x, 10.0);
        // Below the document: last line absorbs it
        let hit = position_to_location(&lines, &store, 150.0, 500.0);
        assert_eq!((hit.offset, hit.line), (5, 1));
        // Above the document: first line
        let hit = position_to_location(&lines, &store, -3.0, -20.0);
        assert_eq!((hit.offset, hit.line), (0, 0));
    }

    #[test]
    fn test_empty_line_after_text() {
        let mut store = store();
        let id = store.push(RunRecord::new("abc\n\n", mono()));
        let lines = lay_out(&store, 200.0);
        assert_eq!(lines.len(), 3);
        let hit = position_to_location(&lines, &store, 4.0, 15.0);
        assert_eq!(hit.location(), Some(Location::new(id, 4)));
        let hit = position_to_location(&lines, &store, 4.0, 25.0);
        assert_eq!(hit.location(), Some(Location::new(id, 5)));
    }

    #[test]
    fn test_empty_document_hit() {
        let mut store = store();
        store.push(RunRecord::new("", mono()));
        let lines = lay_out(&store, 200.0);
        let hit = position_to_location(&lines, &store, 30.0, 3.0);
        assert_eq!(hit.run, None);
        assert_eq!(hit.offset, 0);
    }

    #[test]
    fn test_inverse_for_interior_offsets() {
        let mut store = store();
        let a = store.push(RunRecord::new("héllo wörld\nsecond line ", mono()));
        let b = store.push(RunRecord::new("bold words", mono().bold()));
        let lines = lay_out(&store, 60.0);

        for id in [a, b] {
            let text = store.get(id).unwrap().text().to_string();
            for (offset, _) in text.char_indices().skip(1) {
                let token = lines
                    .iter()
                    .flat_map(|l| &l.words)
                    .find(|w| w.run == id && w.token.offset < offset && offset < w.token.end_offset);
                let Some(token) = token else { continue };
                if token.token.wrapped && offset <= token.token.offset + token.token.prefix.len() {
                    continue;
                }
                let pos = offset_to_position(&lines, &store, Location::new(id, offset));
                let hit = position_to_location(&lines, &store, pos.x, pos.y);
                assert_eq!(hit.location(), Some(Location::new(id, offset)), "offset {offset}");
            }
        }
    }
}
