// Rich Text
// Style-run document model, word segmentation, line layout and hit-testing

pub mod blink;
pub mod editor;
pub mod events;
pub mod export;
pub mod font;
pub mod interchange;
pub mod layout;
pub mod measure;
pub mod resolve;
pub mod runs;
pub mod words;

pub use editor::{EditError, EditResult, Key, LoadOptions, RichTextEditor, Selection};
pub use events::{ChangeReason, EditorEvent, EditorListener, VoidListener};
pub use export::{ExportFormat, SizeTag};
pub use font::{FontAttributes, FontDescriptor, FontField, FontSummary, Formatting, Link};
pub use layout::{LayoutParams, Line, LineSymbol, PlacedWord};
pub use measure::{MeasureError, MeasureFallback, MonospaceMeasurer, TextMeasurer, TextMetrics};
pub use runs::{Location, RunId, RunRecord, RunStore, StyleRun};
