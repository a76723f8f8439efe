// Text Measurement
// The measuring backend used by segmentation, layout and hit-testing.
// Rendering is left to the host; this only answers "how big is this text".

use super::font::FontDescriptor;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Metrics of a measured piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    pub height: f32,
}

impl TextMetrics {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Errors reported by a text measurer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasureError {
    #[error("unknown font family: {0}")]
    UnknownFont(String),
    #[error("measurement backend unavailable")]
    Unavailable,
}

/// Measuring backend
///
/// Implementations must be deterministic: the same text and font always yield
/// the same metrics. Layout idempotence relies on it.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font: &FontDescriptor) -> Result<TextMetrics, MeasureError>;
}

/// What to do when the measurer cannot resolve a font
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureFallback {
    /// Treat the text as zero-sized
    #[default]
    Zero,
    /// Measure with the document's default font, then zero if that fails too
    DefaultFont,
}

/// Fixed-advance measurer
///
/// Every grapheme advances by `size * advance_ratio`, bold text by one extra
/// tenth. Ascent/descent are 80%/20% of the display size. Useful for tests,
/// the command line tool and terminal hosts.
#[derive(Debug, Clone)]
pub struct MonospaceMeasurer {
    advance_ratio: f32,
    families: Option<Vec<String>>,
}

impl MonospaceMeasurer {
    pub fn new() -> Self {
        MonospaceMeasurer {
            advance_ratio: 0.5,
            families: None,
        }
    }

    pub fn with_advance_ratio(mut self, ratio: f32) -> Self {
        self.advance_ratio = ratio;
        self
    }

    /// Restrict the measurer to the given families; others fail to resolve
    pub fn with_families<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.families = Some(families.into_iter().map(Into::into).collect());
        self
    }

    /// Advance of a single grapheme in the given font
    pub fn advance(&self, font: &FontDescriptor) -> f32 {
        let base = font.display_size * self.advance_ratio;
        if font.attributes.bold {
            base + font.display_size / 10.0
        } else {
            base
        }
    }
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str, font: &FontDescriptor) -> Result<TextMetrics, MeasureError> {
        if let Some(families) = &self.families {
            if !families.iter().any(|f| f == &font.name) {
                return Err(MeasureError::UnknownFont(font.name.clone()));
            }
        }

        let count = text.graphemes(true).count() as f32;
        let size = font.display_size;
        Ok(TextMetrics {
            width: count * self.advance(font),
            ascent: size * 0.8,
            descent: size * 0.2,
            height: size,
        })
    }
}

/// Measurer plus the degradation policy applied on failure
pub struct Segmenter {
    measurer: Box<dyn TextMeasurer>,
    fallback: MeasureFallback,
    default_font: FontDescriptor,
}

impl Segmenter {
    pub fn new(
        measurer: Box<dyn TextMeasurer>,
        fallback: MeasureFallback,
        default_font: FontDescriptor,
    ) -> Self {
        Segmenter {
            measurer,
            fallback,
            default_font,
        }
    }

    pub fn default_font(&self) -> &FontDescriptor {
        &self.default_font
    }

    pub fn fallback(&self) -> MeasureFallback {
        self.fallback
    }

    /// Measure text, never failing
    pub fn measure(&self, text: &str, font: &FontDescriptor) -> TextMetrics {
        match self.measurer.measure(text, font) {
            Ok(metrics) => metrics,
            Err(err) => {
                warn!(font = %font.name, error = %err, "text measurement failed, using fallback");
                match self.fallback {
                    MeasureFallback::Zero => TextMetrics::zero(),
                    MeasureFallback::DefaultFont => self
                        .measurer
                        .measure(text, &self.default_font)
                        .unwrap_or_default(),
                }
            }
        }
    }

    /// Height of a line set in the default font
    pub fn default_line_height(&self) -> f32 {
        self.measure("H", &self.default_font).height
    }
}
