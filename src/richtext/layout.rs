// Line Layout
// Greedy line breaking over segmented style runs.
// Layout is a pure function of its inputs and is rerun from scratch after every edit.

use super::font::Formatting;
use super::runs::{Location, RunId, StyleRun};
use super::words::WordToken;

/// Marker drawn in front of a line that starts a list item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSymbol {
    #[default]
    None,
    /// Unordered list item
    Bullet,
    /// Ordered list item, 1-based
    Ordinal(usize),
}

/// A word token placed on a line, with its owning run
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub run: RunId,
    pub token: WordToken,
    /// Left edge of the painted text; wrapped tokens start at their word
    pub x: f32,
}

impl PlacedWord {
    /// Text painted for this token
    pub fn visible_text(&self) -> &str {
        if self.token.wrapped {
            &self.token.word
        } else {
            &self.token.text
        }
    }

    /// x at which the token's `offset` would sit, prefix included
    pub fn origin_x(&self) -> f32 {
        if self.token.wrapped {
            self.x - self.token.prefix_metrics.width
        } else {
            self.x
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.token.advance()
    }
}

/// One laid out line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub words: Vec<PlacedWord>,
    /// Top of the line, in document coordinates
    pub y: f32,
    pub max_height: f32,
    pub max_ascent: f32,
    pub max_descent: f32,
    /// Width taken by the placed words
    pub max_width: f32,
    /// Left margin
    pub offset: f32,
    pub symbol: LineSymbol,
    /// Location just past the explicit line break that opened this line
    pub anchor: Option<Location>,
}

impl Line {
    fn new(offset: f32, symbol: LineSymbol, anchor: Option<Location>) -> Self {
        Line {
            offset,
            symbol,
            anchor,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.max_height
    }

    /// Visible text of the line, for debugging and the command line tool
    pub fn text(&self) -> String {
        self.words.iter().map(PlacedWord::visible_text).collect()
    }
}

/// Inputs of a layout pass besides the runs themselves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub width: f32,
    pub word_wrap: bool,
    /// Height used for lines no run could size
    pub default_line_height: f32,
}

struct LineBuilder {
    params: LayoutParams,
    lines: Vec<Line>,
    line: Line,
    remaining: f32,
    y: f32,
    ordinal: usize,
}

impl LineBuilder {
    /// Close the open line, filling missing metrics from `run`
    fn push_line(&mut self, run: Option<&StyleRun>) {
        let mut line = std::mem::take(&mut self.line);
        if let Some(run) = run {
            let seg = run.segmentation();
            if line.max_ascent == 0.0 {
                line.max_ascent = seg.max_ascent;
            }
            if line.max_descent == 0.0 {
                line.max_descent = seg.max_descent;
            }
            if line.max_height == 0.0 {
                line.max_height = seg.fallback_height();
            }
        }
        if line.max_ascent == 0.0 {
            line.max_ascent = self.params.default_line_height;
        }
        if line.max_height == 0.0 {
            line.max_height = self.params.default_line_height;
        }
        line.y = self.y;
        self.y += line.max_height;
        self.lines.push(line);
    }

    /// Start a new line inside the given block formatting, if any
    fn open_line(&mut self, formatting: Option<&Formatting>, item: bool, anchor: Option<Location>) {
        match formatting {
            Some(f) => {
                let symbol = if item { self.next_symbol(f) } else { LineSymbol::None };
                self.line = Line::new(f.left(), symbol, anchor);
                self.remaining = self.params.width - f.left() - f.right();
            }
            None => {
                self.line = Line::new(0.0, LineSymbol::None, anchor);
                self.remaining = self.params.width;
            }
        }
    }

    fn next_symbol(&mut self, formatting: &Formatting) -> LineSymbol {
        match formatting.tag.as_str() {
            "ul" => LineSymbol::Bullet,
            "ol" => {
                self.ordinal += 1;
                LineSymbol::Ordinal(self.ordinal)
            }
            _ => LineSymbol::None,
        }
    }

    fn place(&mut self, run: &StyleRun, token: &WordToken, wrapped: bool) {
        let mut token = token.clone();
        token.wrapped = wrapped;
        let advance = token.advance();
        let x = self.line.offset + self.line.max_width;
        let seg = run.segmentation();

        self.line.max_height = self.line.max_height.max(token.height);
        self.line.max_ascent = self.line.max_ascent.max(seg.max_ascent);
        self.line.max_descent = self.line.max_descent.max(seg.max_descent);
        self.line.max_width += advance;
        self.remaining -= advance;
        self.line.words.push(PlacedWord {
            run: run.id(),
            token,
            x,
        });
    }
}

/// Lay out runs into lines
///
/// Block formatting forces line boundaries: entering a formatted run opens an
/// indented line, leaving formatting closes the block with one spacer line.
/// With word wrap on, a token wider than the space left moves to a new line
/// unless the line is still empty, in which case it overflows.
pub fn layout_runs(runs: &[StyleRun], params: LayoutParams) -> Vec<Line> {
    let mut builder = LineBuilder {
        params,
        lines: Vec::new(),
        line: Line::default(),
        remaining: params.width,
        y: 0.0,
        ordinal: 0,
    };
    let mut open_tag: Option<&str> = None;

    for run in runs {
        let formatting = run.font().formatting.as_ref();

        match formatting {
            Some(f) if open_tag != Some(f.tag.as_str()) => {
                if !builder.lines.is_empty() || !builder.line.is_empty() {
                    builder.push_line(Some(run));
                }
                builder.ordinal = 0;
                builder.open_line(Some(f), true, None);
                open_tag = Some(f.tag.as_str());
            }
            None if open_tag.is_some() => {
                builder.push_line(Some(run));
                builder.open_line(None, false, None);
                builder.push_line(Some(run));
                builder.open_line(None, false, None);
                open_tag = None;
            }
            _ => {}
        }

        for token in run.words() {
            if token.line_break {
                builder.push_line(Some(run));
                let anchor = Location::new(run.id(), token.offset + 1);
                builder.open_line(formatting, true, Some(anchor));
                continue;
            }

            let wrap = params.word_wrap && !builder.line.is_empty() && token.width > builder.remaining;
            if wrap {
                builder.push_line(Some(run));
                builder.open_line(formatting, false, None);
            }
            builder.place(run, token, wrap);
        }
    }

    builder.push_line(runs.last());
    builder.lines
}

/// Total height of laid out lines
pub fn content_height(lines: &[Line]) -> f32 {
    lines.last().map(Line::bottom).unwrap_or(0.0)
}
