// Font Descriptors
// The per-run style information consumed by segmentation, layout and export

use serde::{Deserialize, Serialize};

/// Inline emphasis flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontAttributes {
    pub bold: bool,
    pub italic: bool,
}

impl FontAttributes {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        FontAttributes {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        FontAttributes {
            italic: true,
            ..Default::default()
        }
    }
}

/// Block formatting carried by a run (list, heading, quote ...)
///
/// The tag is an HTML-ish element name (`ul`, `ol`, `h1`, `blockquote`).
/// `margin` is `[left, right]` in layout units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formatting {
    pub tag: String,
    pub margin: [f32; 2],
}

impl Formatting {
    pub fn new(tag: impl Into<String>, left: f32, right: f32) -> Self {
        Formatting {
            tag: tag.into(),
            margin: [left, right],
        }
    }

    pub fn left(&self) -> f32 {
        self.margin[0]
    }

    pub fn right(&self) -> f32 {
        self.margin[1]
    }

    pub fn is_list(&self) -> bool {
        self.tag == "ul" || self.tag == "ol"
    }
}

/// Link destination attached to a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_attributes: Option<FontAttributes>,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Link {
            url: url.into(),
            hover_attributes: None,
        }
    }
}

/// Font of a style run
///
/// `size_family` is the combined size/family string handed to the text
/// measurer (for example `"16px Helvetica"`), `display_size` the numeric size
/// that drives export tag selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub name: String,
    #[serde(rename = "text")]
    pub size_family: String,
    #[serde(rename = "size")]
    pub display_size: f32,
    #[serde(default)]
    pub attributes: FontAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<Formatting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl FontDescriptor {
    pub fn new(name: impl Into<String>, display_size: f32) -> Self {
        let name = name.into();
        FontDescriptor {
            size_family: format!("{}px {}", display_size, name),
            name,
            display_size,
            attributes: FontAttributes::default(),
            formatting: None,
            link: None,
        }
    }

    pub fn with_attributes(mut self, attributes: FontAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn bold(mut self) -> Self {
        self.attributes.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.attributes.italic = true;
        self
    }

    pub fn with_formatting(mut self, formatting: Formatting) -> Self {
        self.formatting = Some(formatting);
        self
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(Link::new(url));
        self
    }

    /// Tag of the block formatting, if any
    pub fn formatting_tag(&self) -> Option<&str> {
        self.formatting.as_ref().map(|f| f.tag.as_str())
    }
}

impl Default for FontDescriptor {
    fn default() -> Self {
        FontDescriptor::new("Helvetica", 16.0)
    }
}

/// Aggregated value of one font field over a range of runs
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FontField<T> {
    /// No run contributed a value yet
    #[default]
    Unset,
    /// Runs in the range disagree
    Mixed,
    Value(T),
}

impl<T: PartialEq> FontField<T> {
    /// Fold another run's value into the aggregate
    pub fn merge(&mut self, value: T) {
        match self {
            FontField::Unset => *self = FontField::Value(value),
            FontField::Value(current) if *current != value => *self = FontField::Mixed,
            _ => {}
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FontField::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, FontField::Mixed)
    }
}

/// Font description of a selection, possibly spanning several runs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontSummary {
    pub name: FontField<String>,
    pub size_family: FontField<String>,
    pub display_size: FontField<f32>,
    pub formatting: FontField<Option<String>>,
    pub bold: FontField<bool>,
    pub italic: FontField<bool>,
    /// Last link seen in the range
    pub link: Option<Link>,
}

impl FontSummary {
    pub fn add(&mut self, font: &FontDescriptor) {
        self.name.merge(font.name.clone());
        self.size_family.merge(font.size_family.clone());
        self.display_size.merge(font.display_size);
        self.formatting
            .merge(font.formatting_tag().map(|tag| tag.to_string()));
        self.bold.merge(font.attributes.bold);
        self.italic.merge(font.attributes.italic);
        if let Some(link) = &font.link {
            self.link = Some(link.clone());
        }
    }
}

impl From<&FontDescriptor> for FontSummary {
    fn from(font: &FontDescriptor) -> Self {
        let mut summary = FontSummary::default();
        summary.add(font);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_field_tristate() {
        let mut field = FontField::Unset;
        assert_eq!(field.value(), None::<&bool>);
        field.merge(true);
        assert_eq!(field, FontField::Value(true));
        field.merge(true);
        assert_eq!(field, FontField::Value(true));
        field.merge(false);
        assert!(field.is_mixed());
        field.merge(true);
        assert!(field.is_mixed());
    }

    #[test]
    fn test_summary_of_single_font() {
        let font = FontDescriptor::new("Arial", 12.0).bold();
        let summary = FontSummary::from(&font);
        assert_eq!(summary.name, FontField::Value("Arial".to_string()));
        assert_eq!(summary.bold, FontField::Value(true));
        assert_eq!(summary.italic, FontField::Value(false));
        assert_eq!(summary.formatting, FontField::Value(None));
    }

    #[test]
    fn test_font_serializes_with_interchange_names() {
        let font = FontDescriptor::new("Arial", 12.0).with_link("https://example.com");
        let json = serde_json::to_value(&font).unwrap();
        assert_eq!(json["text"], "12px Arial");
        assert_eq!(json["size"], 12.0);
        assert_eq!(json["link"]["url"], "https://example.com");
        assert!(json.get("formatting").is_none());
    }
}
