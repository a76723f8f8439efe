// Style Run Store
// The document as an ordered list of style runs, addressed by (run, offset) locations.
// Every text or font change resegments the affected run immediately.

use super::font::{FontDescriptor, FontSummary};
use super::measure::Segmenter;
use super::words::{Segmentation, WordToken, segment};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// Unique identifier of a run within its store
pub type RunId = u64;

/// Address of a position inside the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub run: RunId,
    /// Byte offset into the run's text, on a char boundary
    pub offset: usize,
}

impl Location {
    pub fn new(run: RunId, offset: usize) -> Self {
        Location { run, offset }
    }
}

/// Clamp an offset into `[0, text.len()]`, flooring to a char boundary
pub fn clamp_offset(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Offset of the grapheme boundary before `offset`
pub fn previous_boundary(text: &str, offset: usize) -> usize {
    let offset = clamp_offset(text, offset);
    text[..offset]
        .grapheme_indices(true)
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Offset of the grapheme boundary after `offset`
pub fn next_boundary(text: &str, offset: usize) -> usize {
    let offset = clamp_offset(text, offset);
    text[offset..]
        .graphemes(true)
        .next()
        .map(|g| offset + g.len())
        .unwrap_or(text.len())
}

/// A run that has not been segmented: plain text plus font
///
/// This is the shape used for extraction, interchange and runs that are about
/// to enter the store. It carries no word cache, so it cannot be laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub text: String,
    pub font: FontDescriptor,
}

impl RunRecord {
    pub fn new(text: impl Into<String>, font: FontDescriptor) -> Self {
        RunRecord {
            text: text.into(),
            font,
        }
    }

    pub fn empty(font: FontDescriptor) -> Self {
        Self::new(String::new(), font)
    }
}

/// A segmented style run
///
/// Text and font are only reachable through setters that resegment, so the
/// word cache always matches the current text and font.
#[derive(Debug, Clone)]
pub struct StyleRun {
    id: RunId,
    text: String,
    font: FontDescriptor,
    segmentation: Segmentation,
}

impl StyleRun {
    fn new(id: RunId, text: String, font: FontDescriptor, segmenter: &Segmenter) -> Self {
        let segmentation = segment(&text, &font, segmenter);
        StyleRun {
            id,
            text,
            font,
            segmentation,
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font(&self) -> &FontDescriptor {
        &self.font
    }

    pub fn words(&self) -> &[WordToken] {
        &self.segmentation.words
    }

    pub fn segmentation(&self) -> &Segmentation {
        &self.segmentation
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn to_record(&self) -> RunRecord {
        RunRecord::new(self.text.clone(), self.font.clone())
    }

    fn set_text(&mut self, text: String, segmenter: &Segmenter) {
        self.text = text;
        self.resegment(segmenter);
    }

    fn set_font(&mut self, font: FontDescriptor, segmenter: &Segmenter) {
        self.font = font;
        self.resegment(segmenter);
    }

    fn resegment(&mut self, segmenter: &Segmenter) {
        self.segmentation = segment(&self.text, &self.font, segmenter);
    }
}

/// Locations produced by restyling a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontRangeOutcome {
    /// Where the cursor should land: end of the restyled range
    pub cursor: Location,
    /// New start of the restyled range
    pub from: Location,
    /// New end of the restyled range
    pub to: Location,
}

/// Ordered collection of style runs
pub struct RunStore {
    runs: Vec<StyleRun>,
    index: HashMap<RunId, usize>,
    next_id: RunId,
    segmenter: Segmenter,
}

impl RunStore {
    pub fn new(segmenter: Segmenter) -> Self {
        RunStore {
            runs: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
            segmenter,
        }
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    pub fn default_font(&self) -> &FontDescriptor {
        self.segmenter.default_font()
    }

    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn get(&self, id: RunId) -> Option<&StyleRun> {
        self.index_of(id).map(|i| &self.runs[i])
    }

    pub fn contains(&self, id: RunId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn index_of(&self, id: RunId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn first(&self) -> Option<RunId> {
        self.runs.first().map(StyleRun::id)
    }

    pub fn last(&self) -> Option<RunId> {
        self.runs.last().map(StyleRun::id)
    }

    pub fn previous(&self, id: RunId) -> Option<RunId> {
        let index = self.index_of(id)?;
        index.checked_sub(1).map(|i| self.runs[i].id)
    }

    pub fn next(&self, id: RunId) -> Option<RunId> {
        let index = self.index_of(id)?;
        self.runs.get(index + 1).map(StyleRun::id)
    }

    /// Full document text
    pub fn text(&self) -> String {
        self.runs.iter().map(StyleRun::text).collect()
    }

    /// Unsegmented copies of every run
    pub fn records(&self) -> Vec<RunRecord> {
        self.runs.iter().map(StyleRun::to_record).collect()
    }

    fn allocate_id(&mut self) -> RunId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, run) in self.runs.iter().enumerate() {
            self.index.insert(run.id, i);
        }
    }

    fn make_run(&mut self, record: RunRecord) -> StyleRun {
        let id = self.allocate_id();
        StyleRun::new(id, record.text, record.font, &self.segmenter)
    }

    /// New empty run, not yet part of the store
    pub fn create_run(&self, font: Option<&FontDescriptor>) -> RunRecord {
        RunRecord::empty(font.unwrap_or(self.default_font()).clone())
    }

    /// Append a run at the end of the document
    pub fn push(&mut self, record: RunRecord) -> RunId {
        let run = self.make_run(record);
        let id = run.id;
        self.runs.push(run);
        self.reindex();
        id
    }

    /// Replace the whole document
    pub fn replace_all(&mut self, records: Vec<RunRecord>) {
        self.runs.clear();
        for record in records {
            let run = self.make_run(record);
            self.runs.push(run);
        }
        self.reindex();
    }

    pub fn clear(&mut self) {
        self.runs.clear();
        self.index.clear();
    }

    /// Remove a run, returning its contents
    pub fn remove(&mut self, id: RunId) -> Option<RunRecord> {
        let index = self.index_of(id)?;
        let run = self.runs.remove(index);
        self.reindex();
        Some(run.to_record())
    }

    /// Clamp a location to its run, or None if the run is gone
    pub fn clamp(&self, location: Location) -> Option<Location> {
        let run = self.get(location.run)?;
        Some(Location::new(
            location.run,
            clamp_offset(run.text(), location.offset),
        ))
    }

    /// Document order of two locations
    pub fn compare(&self, a: Location, b: Location) -> Option<Ordering> {
        let ai = self.index_of(a.run)?;
        let bi = self.index_of(b.run)?;
        Some(ai.cmp(&bi).then(a.offset.cmp(&b.offset)))
    }

    /// Offset of a location in the full document text
    pub fn document_offset(&self, location: Location) -> Option<usize> {
        let index = self.index_of(location.run)?;
        let before: usize = self.runs[..index].iter().map(StyleRun::len).sum();
        Some(before + clamp_offset(self.runs[index].text(), location.offset))
    }

    /// Location for an offset in the full document text
    ///
    /// Offsets on a run boundary resolve to the end of the earlier run.
    pub fn location_at(&self, document_offset: usize) -> Option<Location> {
        let mut remaining = document_offset;
        for run in &self.runs {
            if remaining <= run.len() {
                return Some(Location::new(run.id, clamp_offset(run.text(), remaining)));
            }
            remaining -= run.len();
        }
        self.runs.last().map(|run| Location::new(run.id, run.len()))
    }

    /// Split a run, moving `text[offset..]` into a new run after it
    pub fn split(&mut self, id: RunId, offset: usize) -> Option<RunId> {
        let index = self.index_of(id)?;
        let run = &self.runs[index];
        let offset = clamp_offset(run.text(), offset);
        let head = run.text()[..offset].to_string();
        let tail = RunRecord::new(&run.text()[offset..], run.font().clone());

        self.runs[index].set_text(head, &self.segmenter);
        let new_run = self.make_run(tail);
        let new_id = new_run.id;
        self.runs.insert(index + 1, new_run);
        self.reindex();
        Some(new_id)
    }

    /// Insert a run at a location, splitting the owner if the offset is interior
    pub fn insert_at(&mut self, location: Location, record: RunRecord) -> Option<RunId> {
        let index = self.index_of(location.run)?;
        let owner = &self.runs[index];
        let offset = clamp_offset(owner.text(), location.offset);
        let position = if offset == owner.len() {
            index + 1
        } else if offset == 0 {
            index
        } else {
            self.split(location.run, offset)?;
            index + 1
        };

        let run = self.make_run(record);
        let id = run.id;
        self.runs.insert(position, run);
        self.reindex();
        Some(id)
    }

    /// Insert text into a run, returning the location after it
    pub fn insert_text(&mut self, location: Location, text: &str) -> Option<Location> {
        let index = self.index_of(location.run)?;
        let run = &self.runs[index];
        let offset = clamp_offset(run.text(), location.offset);
        let mut new_text = run.text().to_string();
        new_text.insert_str(offset, text);
        self.runs[index].set_text(new_text, &self.segmenter);
        Some(Location::new(location.run, offset + text.len()))
    }

    /// Remove `[start, end)` from a single run
    pub fn remove_text(&mut self, id: RunId, start: usize, end: usize) -> Option<Location> {
        let index = self.index_of(id)?;
        let run = &self.runs[index];
        let start = clamp_offset(run.text(), start);
        let end = clamp_offset(run.text(), end).max(start);
        let mut new_text = run.text().to_string();
        new_text.replace_range(start..end, "");
        self.runs[index].set_text(new_text, &self.segmenter);
        Some(Location::new(id, start))
    }

    /// Replace one run's font
    pub fn set_run_font(&mut self, id: RunId, font: FontDescriptor) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.runs[index].set_font(font, &self.segmenter);
                true
            }
            None => false,
        }
    }

    /// Drop empty runs, except the listed ones and the last remaining run
    pub fn remove_empty_runs(&mut self, keep: &[RunId]) -> bool {
        let before = self.runs.len();
        let mut remaining = before;
        self.runs.retain(|run| {
            if run.is_empty() && !keep.contains(&run.id) && remaining > 1 {
                remaining -= 1;
                false
            } else {
                true
            }
        });
        if self.runs.len() != before {
            self.reindex();
            true
        } else {
            false
        }
    }

    /// True if `run` lies between `from` and `to` (inclusive) in store order
    pub fn is_inside_range(&self, run: RunId, from: RunId, to: RunId) -> bool {
        let (Some(from_index), Some(to_index)) = (self.index_of(from), self.index_of(to)) else {
            return false;
        };
        match self.index_of(run) {
            Some(index) => index >= from_index && index <= to_index,
            None => false,
        }
    }

    /// Resolve both ends of a range to (index, offset) pairs
    fn resolve_range(&self, from: Location, to: Location) -> Option<((usize, usize), (usize, usize))> {
        let from_index = self.index_of(from.run)?;
        let to_index = self.index_of(to.run)?;
        if from_index > to_index {
            debug!(from = from.run, to = to.run, "range ends out of order");
            return None;
        }
        let from_offset = clamp_offset(self.runs[from_index].text(), from.offset);
        let to_offset = clamp_offset(self.runs[to_index].text(), to.offset);
        if from_index == to_index && from_offset > to_offset {
            return Some(((from_index, to_offset), (to_index, from_offset)));
        }
        Some(((from_index, from_offset), (to_index, to_offset)))
    }

    /// Delete the text between two locations
    ///
    /// Runs strictly between the ends are removed and the boundary runs are
    /// truncated. Boundary runs sharing a font are merged back into one.
    pub fn delete_range(&mut self, from: Location, to: Location) -> Location {
        let Some(((fi, from_offset), (ti, to_offset))) = self.resolve_range(from, to) else {
            return from;
        };

        if fi == ti {
            return self
                .remove_text(from.run, from_offset, to_offset)
                .unwrap_or(from);
        }

        let head = self.runs[fi].text()[..from_offset].to_string();
        self.runs[fi].set_text(head, &self.segmenter);
        let tail = self.runs[ti].text()[to_offset..].to_string();
        self.runs[ti].set_text(tail, &self.segmenter);
        self.runs.drain(fi + 1..ti);

        // The two boundary runs are now adjacent at fi and fi + 1
        let mut result = Location::new(from.run, from_offset);
        if self.runs[fi].font() == self.runs[fi + 1].font() {
            let tail = self.runs.remove(fi + 1);
            let merged = format!("{}{}", self.runs[fi].text(), tail.text());
            self.runs[fi].set_text(merged, &self.segmenter);
        } else if self.runs[fi].is_empty() {
            result = Location::new(self.runs[fi + 1].id, 0);
            self.runs.remove(fi);
        } else if self.runs[fi + 1].is_empty() {
            self.runs.remove(fi + 1);
        }
        self.reindex();
        result
    }

    /// Split one run into up to three pieces with the middle restyled
    ///
    /// The first non-empty piece keeps the run's id. Returns the middle's id.
    fn carve(&mut self, index: usize, start: usize, end: usize, font: &FontDescriptor) -> RunId {
        let run = &self.runs[index];
        let id = run.id;
        let text = run.text().to_string();
        let old_font = run.font().clone();

        let mut pieces = Vec::with_capacity(3);
        if start > 0 {
            pieces.push((text[..start].to_string(), old_font.clone(), false));
        }
        pieces.push((text[start..end].to_string(), font.clone(), true));
        if end < text.len() {
            pieces.push((text[end..].to_string(), old_font, false));
        }

        let mut middle = id;
        let mut replacement = Vec::with_capacity(pieces.len());
        for (i, (piece_text, piece_font, is_middle)) in pieces.into_iter().enumerate() {
            let piece_id = if i == 0 { id } else { self.allocate_id() };
            if is_middle {
                middle = piece_id;
            }
            replacement.push(StyleRun::new(
                piece_id,
                piece_text,
                piece_font,
                &self.segmenter,
            ));
        }
        self.runs.splice(index..index + 1, replacement);
        self.reindex();
        middle
    }

    /// Apply a font to the text between two locations
    ///
    /// Interior runs are restyled whole; boundary runs are carved so only the
    /// selected part changes. A single fully selected run is restyled in place.
    pub fn apply_font_to_range(
        &mut self,
        font: &FontDescriptor,
        from: Location,
        to: Location,
    ) -> FontRangeOutcome {
        let unchanged = FontRangeOutcome {
            cursor: to,
            from,
            to,
        };
        let Some(((fi, from_offset), (ti, to_offset))) = self.resolve_range(from, to) else {
            return unchanged;
        };

        if fi == ti {
            let id = self.runs[fi].id;
            let len = self.runs[fi].len();
            if from_offset == to_offset {
                return unchanged;
            }
            if from_offset == 0 && to_offset == len {
                self.runs[fi].set_font(font.clone(), &self.segmenter);
                let end = Location::new(id, len);
                return FontRangeOutcome {
                    cursor: end,
                    from: Location::new(id, 0),
                    to: end,
                };
            }
            let middle = self.carve(fi, from_offset, to_offset, font);
            let end = Location::new(middle, to_offset - from_offset);
            return FontRangeOutcome {
                cursor: end,
                from: Location::new(middle, 0),
                to: end,
            };
        }

        // Restyled pieces in document order: (id, length)
        let mut restyled: Vec<(RunId, usize)> = Vec::new();

        // Work from the end so earlier indices stay valid while carving
        let to_piece = if to_offset == 0 {
            None
        } else if to_offset == self.runs[ti].len() {
            self.runs[ti].set_font(font.clone(), &self.segmenter);
            Some((self.runs[ti].id, to_offset))
        } else {
            Some((self.carve(ti, 0, to_offset, font), to_offset))
        };

        for run in &mut self.runs[fi + 1..ti] {
            run.set_font(font.clone(), &self.segmenter);
            restyled.push((run.id, run.len()));
        }

        let from_len = self.runs[fi].len();
        if from_offset == 0 {
            self.runs[fi].set_font(font.clone(), &self.segmenter);
            restyled.insert(0, (self.runs[fi].id, from_len));
        } else if from_offset < from_len {
            let middle = self.carve(fi, from_offset, from_len, font);
            restyled.insert(0, (middle, from_len - from_offset));
        }
        restyled.extend(to_piece);

        match (restyled.first(), restyled.last()) {
            (Some(&(first, _)), Some(&(last, last_len))) => {
                let end = Location::new(last, last_len);
                FontRangeOutcome {
                    cursor: end,
                    from: Location::new(first, 0),
                    to: end,
                }
            }
            _ => unchanged,
        }
    }

    /// Copies of the runs covering a range, boundary copies truncated
    pub fn get_range(&self, from: Location, to: Location) -> Vec<RunRecord> {
        let Some(((fi, from_offset), (ti, to_offset))) = self.resolve_range(from, to) else {
            return Vec::new();
        };

        let mut records = Vec::new();
        for (index, run) in self.runs.iter().enumerate().take(ti + 1).skip(fi) {
            let start = if index == fi { from_offset } else { 0 };
            let end = if index == ti { to_offset } else { run.len() };
            if start < end {
                records.push(RunRecord::new(&run.text()[start..end], run.font().clone()));
            }
        }
        records
    }

    /// Aggregate the fonts of the runs contributing text to a range
    pub fn describe_range_font(&self, from: Location, to: Location) -> FontSummary {
        let mut summary = FontSummary::default();
        let Some(((fi, from_offset), (ti, to_offset))) = self.resolve_range(from, to) else {
            return summary;
        };
        for (index, run) in self.runs.iter().enumerate().take(ti + 1).skip(fi) {
            let start = if index == fi { from_offset } else { 0 };
            let end = if index == ti { to_offset } else { run.len() };
            if start < end {
                summary.add(run.font());
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::font::FontField;
    use crate::richtext::measure::{MeasureFallback, MonospaceMeasurer};

    fn store() -> RunStore {
        RunStore::new(Segmenter::new(
            Box::new(MonospaceMeasurer::new()),
            MeasureFallback::Zero,
            FontDescriptor::new("Mono", 10.0),
        ))
    }

    fn plain() -> FontDescriptor {
        FontDescriptor::new("Mono", 10.0)
    }

    fn texts(store: &RunStore) -> Vec<&str> {
        store.runs().iter().map(StyleRun::text).collect()
    }

    #[test]
    fn test_create_run_uses_default_font() {
        let store = store();
        let record = store.create_run(None);
        assert_eq!(record.text, "");
        assert_eq!(&record.font, store.default_font());
        let bold = plain().bold();
        assert_eq!(store.create_run(Some(&bold)).font, bold);
    }

    #[test]
    fn test_split() {
        let mut store = store();
        let id = store.push(RunRecord::new("hello world", plain()));
        let tail = store.split(id, 5).unwrap();
        assert_eq!(texts(&store), vec!["hello", " world"]);
        assert_eq!(store.get(tail).unwrap().words()[0].text, " world");
        assert_eq!(store.get(id).unwrap().words().len(), 1);
    }

    #[test]
    fn test_split_clamps_offset() {
        let mut store = store();
        let id = store.push(RunRecord::new("abc", plain()));
        store.split(id, 99).unwrap();
        assert_eq!(texts(&store), vec!["abc", ""]);
    }

    #[test]
    fn test_insert_at_positions() {
        let mut store = store();
        let id = store.push(RunRecord::new("abcd", plain()));
        store.insert_at(Location::new(id, 4), RunRecord::new("E", plain()));
        store.insert_at(Location::new(id, 0), RunRecord::new("S", plain()));
        store.insert_at(Location::new(id, 2), RunRecord::new("M", plain()));
        assert_eq!(texts(&store), vec!["S", "ab", "M", "cd", "E"]);
        assert_eq!(store.text(), "SabMcdE");
    }

    #[test]
    fn test_is_inside_range() {
        let mut store = store();
        let a = store.push(RunRecord::new("a", plain()));
        let b = store.push(RunRecord::new("b", plain()));
        let c = store.push(RunRecord::new("c", plain()));
        assert!(store.is_inside_range(b, a, c));
        assert!(store.is_inside_range(a, a, c));
        assert!(!store.is_inside_range(c, a, b));
        assert!(!store.is_inside_range(b, a, 999));
    }

    #[test]
    fn test_delete_range_within_run() {
        let mut store = store();
        let id = store.push(RunRecord::new("Hello world", plain()));
        let loc = store.delete_range(Location::new(id, 5), Location::new(id, 11));
        assert_eq!(store.text(), "Hello");
        assert_eq!(loc, Location::new(id, 5));
    }

    #[test]
    fn test_delete_range_keeps_differing_fonts_apart() {
        let mut store = store();
        let a = store.push(RunRecord::new("First", plain()));
        store.push(RunRecord::new("Second", plain()));
        let c = store.push(RunRecord::new("Third", plain().bold()));
        let loc = store.delete_range(Location::new(a, 3), Location::new(c, 2));
        assert_eq!(texts(&store), vec!["Fir", "ird"]);
        assert_eq!(loc, Location::new(a, 3));
    }

    #[test]
    fn test_delete_range_drops_emptied_head() {
        let mut store = store();
        let a = store.push(RunRecord::new("abc", plain()));
        let b = store.push(RunRecord::new("def", plain().italic()));
        let loc = store.delete_range(Location::new(a, 0), Location::new(b, 1));
        assert_eq!(texts(&store), vec!["ef"]);
        assert_eq!(loc, Location::new(b, 0));
    }

    #[test]
    fn test_delete_range_unknown_run_is_noop() {
        let mut store = store();
        let a = store.push(RunRecord::new("abc", plain()));
        let from = Location::new(a, 1);
        assert_eq!(store.delete_range(from, Location::new(42, 0)), from);
        assert_eq!(store.text(), "abc");
    }

    #[test]
    fn test_apply_font_inside_single_run() {
        let mut store = store();
        let id = store.push(RunRecord::new("abcdef", plain()));
        let bold = plain().bold();
        let outcome = store.apply_font_to_range(&bold, Location::new(id, 2), Location::new(id, 4));
        assert_eq!(texts(&store), vec!["ab", "cd", "ef"]);
        let middle = store.runs()[1].id();
        assert_eq!(store.runs()[1].font(), &bold);
        assert_eq!(store.runs()[2].font(), &plain());
        assert_eq!(outcome.from, Location::new(middle, 0));
        assert_eq!(outcome.to, Location::new(middle, 2));
        assert_eq!(outcome.cursor, outcome.to);
    }

    #[test]
    fn test_apply_font_at_run_start_keeps_id_on_middle() {
        let mut store = store();
        let id = store.push(RunRecord::new("abcdef", plain()));
        let bold = plain().bold();
        let outcome = store.apply_font_to_range(&bold, Location::new(id, 0), Location::new(id, 3));
        assert_eq!(texts(&store), vec!["abc", "def"]);
        assert_eq!(outcome.from, Location::new(id, 0));
        assert_eq!(store.get(id).unwrap().font(), &bold);
    }

    #[test]
    fn test_apply_font_across_runs() {
        let mut store = store();
        let a = store.push(RunRecord::new("aaaa", plain()));
        let b = store.push(RunRecord::new("bbbb", plain()));
        let c = store.push(RunRecord::new("cccc", plain()));
        let bold = plain().bold();
        let outcome = store.apply_font_to_range(&bold, Location::new(a, 2), Location::new(c, 1));

        assert_eq!(texts(&store), vec!["aa", "aa", "bbbb", "c", "ccc"]);
        let fonts: Vec<bool> = store
            .runs()
            .iter()
            .map(|r| r.font().attributes.bold)
            .collect();
        assert_eq!(fonts, vec![false, true, true, true, false]);
        assert_eq!(outcome.from, Location::new(store.runs()[1].id(), 0));
        assert_eq!(outcome.to, Location::new(c, 1));
        assert_eq!(store.get(b).unwrap().font(), &bold);
        assert_eq!(store.text(), "aaaabbbbcccc");
    }

    #[test]
    fn test_get_range_does_not_mutate() {
        let mut store = store();
        let a = store.push(RunRecord::new("hello ", plain()));
        let b = store.push(RunRecord::new("world", plain().bold()));
        let range = store.get_range(Location::new(a, 2), Location::new(b, 3));
        assert_eq!(
            range,
            vec![
                RunRecord::new("llo ", plain()),
                RunRecord::new("wor", plain().bold())
            ]
        );
        assert_eq!(store.text(), "hello world");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_describe_range_font() {
        let mut store = store();
        let a = store.push(RunRecord::new("a", plain()));
        let b = store.push(RunRecord::new("b", plain().bold()));
        let summary = store.describe_range_font(Location::new(a, 0), Location::new(b, 1));
        assert!(summary.bold.is_mixed());
        assert_eq!(summary.italic, FontField::Value(false));
        assert_eq!(summary.name, FontField::Value("Mono".to_string()));
    }

    #[test]
    fn test_describe_range_font_skips_untouched_boundary_runs() {
        let mut store = store();
        let a = store.push(RunRecord::new("plain", plain()));
        store.push(RunRecord::new("bold", plain().bold()));
        let c = store.push(RunRecord::new("tail", plain()));

        let from = Location::new(a, 5);
        let to = Location::new(c, 0);
        let pieces = store.get_range(from, to);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].text, "bold");

        let summary = store.describe_range_font(from, to);
        assert_eq!(summary.bold, FontField::Value(true));
    }

    #[test]
    fn test_remove_empty_runs_keeps_last() {
        let mut store = store();
        let a = store.push(RunRecord::new("", plain()));
        let b = store.push(RunRecord::new("", plain()));
        assert!(store.remove_empty_runs(&[b]));
        assert_eq!(store.len(), 1);
        assert!(!store.contains(a));
        assert!(!store.remove_empty_runs(&[]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_document_offsets() {
        let mut store = store();
        let a = store.push(RunRecord::new("abc", plain()));
        let b = store.push(RunRecord::new("def", plain()));
        assert_eq!(store.document_offset(Location::new(b, 1)), Some(4));
        assert_eq!(store.location_at(3), Some(Location::new(a, 3)));
        assert_eq!(store.location_at(4), Some(Location::new(b, 1)));
        assert_eq!(store.location_at(100), Some(Location::new(b, 3)));
    }

    #[test]
    fn test_grapheme_boundaries() {
        let text = "ae\u{301}b";
        assert_eq!(next_boundary(text, 1), 4);
        assert_eq!(previous_boundary(text, 4), 1);
        assert_eq!(previous_boundary(text, 0), 0);
        assert_eq!(next_boundary(text, 5), 5);
    }

    #[test]
    fn test_clamp_offset_on_char_boundary() {
        assert_eq!(clamp_offset("héllo", 2), 1);
        assert_eq!(clamp_offset("héllo", 3), 3);
        assert_eq!(clamp_offset("abc", 10), 3);
    }
}
