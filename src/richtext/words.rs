// Word Segmentation
// Splits the text of a single style run into measured prefix+word tokens

use super::font::FontDescriptor;
use super::measure::{Segmenter, TextMetrics};

/// A measured unit of a run's text
///
/// Either leading spaces (`prefix`) followed by a word, or an explicit line
/// break. Offsets are byte offsets into the owning run's text.
#[derive(Debug, Clone, PartialEq)]
pub struct WordToken {
    pub prefix: String,
    pub word: String,
    /// `prefix + word`
    pub text: String,
    pub offset: usize,
    pub end_offset: usize,
    pub width: f32,
    pub height: f32,
    pub prefix_metrics: TextMetrics,
    pub word_metrics: TextMetrics,
    pub line_break: bool,
    /// Set by layout on the copy placed at the start of a wrapped line
    pub wrapped: bool,
}

impl WordToken {
    fn line_break(offset: usize) -> Self {
        WordToken {
            prefix: String::new(),
            word: String::new(),
            text: String::new(),
            offset,
            end_offset: offset,
            width: 0.0,
            height: 0.0,
            prefix_metrics: TextMetrics::zero(),
            word_metrics: TextMetrics::zero(),
            line_break: true,
            wrapped: false,
        }
    }

    /// Width this token occupies on its line
    pub fn advance(&self) -> f32 {
        if self.wrapped {
            self.word_metrics.width
        } else {
            self.width
        }
    }
}

/// Result of segmenting one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    pub words: Vec<WordToken>,
    pub max_ascent: f32,
    pub max_descent: f32,
    pub max_height: f32,
}

impl Segmentation {
    /// Height a line gets from this run when no token sized it
    pub fn fallback_height(&self) -> f32 {
        if self.max_height > 0.0 {
            self.max_height
        } else {
            self.max_ascent
        }
    }

    fn push_word(
        &mut self,
        text: &str,
        prefix: &mut String,
        word: &mut String,
        end: usize,
        font: &FontDescriptor,
        segmenter: &Segmenter,
    ) {
        let prefix_metrics = segmenter.measure(prefix, font);
        let word_metrics = segmenter.measure(word, font);
        let offset = end - prefix.len() - word.len();
        debug_assert_eq!(&text[offset..end], format!("{prefix}{word}"));

        self.max_ascent = self.max_ascent.max(word_metrics.ascent);
        self.max_descent = self.max_descent.max(word_metrics.descent);

        let height = prefix_metrics.height.max(word_metrics.height);
        self.max_height = self.max_height.max(height);

        self.words.push(WordToken {
            text: format!("{prefix}{word}"),
            prefix: std::mem::take(prefix),
            word: std::mem::take(word),
            offset,
            end_offset: end,
            width: prefix_metrics.width + word_metrics.width,
            height,
            prefix_metrics,
            word_metrics,
            line_break: false,
            wrapped: false,
        });
    }
}

/// Segment a run's text into word tokens
pub fn segment(text: &str, font: &FontDescriptor, segmenter: &Segmenter) -> Segmentation {
    let mut seg = Segmentation::default();
    let mut prefix = String::new();
    let mut word = String::new();

    for (i, c) in text.char_indices() {
        match c {
            ' ' => {
                if !word.is_empty() {
                    seg.push_word(text, &mut prefix, &mut word, i, font, segmenter);
                }
                prefix.push(c);
            }
            '\n' => {
                if !prefix.is_empty() || !word.is_empty() {
                    seg.push_word(text, &mut prefix, &mut word, i, font, segmenter);
                }
                seg.words.push(WordToken::line_break(i));
            }
            _ => word.push(c),
        }
    }

    if !prefix.is_empty() || !word.is_empty() {
        seg.push_word(text, &mut prefix, &mut word, text.len(), font, segmenter);
    }

    seg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::measure::{MeasureFallback, MonospaceMeasurer};

    fn segmenter() -> Segmenter {
        Segmenter::new(
            Box::new(MonospaceMeasurer::new()),
            MeasureFallback::Zero,
            FontDescriptor::new("Mono", 10.0),
        )
    }

    fn texts(seg: &Segmentation) -> Vec<String> {
        seg.words
            .iter()
            .map(|w| {
                if w.line_break {
                    "\\n".to_string()
                } else {
                    w.text.clone()
                }
            })
            .collect()
    }

    #[test]
    fn test_prefix_attaches_to_next_word() {
        let font = FontDescriptor::new("Mono", 10.0);
        let seg = segment("ab  cd", &font, &segmenter());
        assert_eq!(texts(&seg), vec!["ab", "  cd"]);
        assert_eq!(seg.words[1].prefix, "  ");
        assert_eq!(seg.words[1].word, "cd");
        assert_eq!(seg.words[1].offset, 2);
        assert_eq!(seg.words[1].end_offset, 6);
        assert_eq!(seg.words[1].width, 20.0);
        assert_eq!(seg.words[1].prefix_metrics.width, 10.0);
    }

    #[test]
    fn test_newline_flushes_and_breaks() {
        let font = FontDescriptor::new("Mono", 10.0);
        let seg = segment("ab \ncd\n", &font, &segmenter());
        assert_eq!(texts(&seg), vec!["ab", " ", "\\n", "cd", "\\n"]);
        assert_eq!(seg.words[1].offset, 2);
        assert_eq!(seg.words[1].end_offset, 3);
        assert_eq!(seg.words[2].offset, 3);
        assert_eq!(seg.words[3].offset, 4);
        assert_eq!(seg.words[3].end_offset, 6);
    }

    #[test]
    fn test_leading_and_trailing_spaces() {
        let font = FontDescriptor::new("Mono", 10.0);
        let seg = segment(" a ", &font, &segmenter());
        assert_eq!(texts(&seg), vec![" a", " "]);
        assert_eq!(seg.words[1].word, "");
    }

    #[test]
    fn test_run_metrics() {
        let font = FontDescriptor::new("Mono", 10.0);
        let seg = segment("a b", &font, &segmenter());
        assert_eq!(seg.max_ascent, 8.0);
        assert_eq!(seg.max_descent, 2.0);
        assert_eq!(seg.fallback_height(), 10.0);

        let empty = segment("", &font, &segmenter());
        assert!(empty.words.is_empty());
        assert_eq!(empty.fallback_height(), 0.0);
    }

    #[test]
    fn test_multibyte_offsets() {
        let font = FontDescriptor::new("Mono", 10.0);
        let seg = segment("héllo wörld", &font, &segmenter());
        assert_eq!(seg.words[0].end_offset, "héllo".len());
        assert_eq!(seg.words[1].offset, "héllo".len());
        assert_eq!(seg.words[1].end_offset, "héllo wörld".len());
    }
}
