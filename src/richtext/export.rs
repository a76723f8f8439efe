// Export
// Flattens style runs into plain text, HTML or Markdown

use super::font::FontDescriptor;
use super::runs::RunRecord;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("line break pattern is valid"));

/// Output format of [`export`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Raw run text, concatenated
    #[default]
    Text,
    Html,
    Markdown,
}

/// Entry of the size to tag table used for HTML export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeTag {
    pub name: String,
    pub size: f32,
}

impl SizeTag {
    pub fn new(name: impl Into<String>, size: f32) -> Self {
        SizeTag {
            name: name.into(),
            size,
        }
    }

    /// Paragraph and heading sizes for the default 16px body font
    pub fn default_table() -> Vec<SizeTag> {
        vec![
            SizeTag::new("p", 16.0),
            SizeTag::new("h1", 32.0),
            SizeTag::new("h2", 24.0),
            SizeTag::new("h3", 19.0),
        ]
    }
}

/// Tag whose size is nearest to `size`; the earlier entry wins ties
pub fn nearest_size_tag(tags: &[SizeTag], size: f32) -> Option<&str> {
    let mut best: Option<(&SizeTag, f32)> = None;
    for tag in tags {
        let diff = (tag.size - size).abs();
        if best.is_none_or(|(_, best_diff)| diff < best_diff) {
            best = Some((tag, diff));
        }
    }
    best.map(|(tag, _)| tag.name.as_str())
}

/// Export runs in the given format
pub fn export(records: &[RunRecord], format: ExportFormat, size_tags: &[SizeTag]) -> String {
    match format {
        ExportFormat::Text => records.iter().map(|r| r.text.as_str()).collect(),
        ExportFormat::Html => export_html(records, size_tags),
        ExportFormat::Markdown => export_markdown(records, size_tags),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_list(tag: &str) -> bool {
    tag == "ul" || tag == "ol"
}

/// Emphasis and link markup around one line of escaped text
fn html_inline(text: &str, font: &FontDescriptor) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    if let Some(link) = &font.link {
        out.push_str(&format!("<a href=\"{}\">", escape_html(&link.url)));
    }
    if font.attributes.bold {
        out.push_str("<strong>");
    }
    if font.attributes.italic {
        out.push_str("<i>");
    }
    out.push_str(&escape_html(text));
    if font.attributes.italic {
        out.push_str("</i>");
    }
    if font.attributes.bold {
        out.push_str("</strong>");
    }
    if font.link.is_some() {
        out.push_str("</a>");
    }
    out
}

fn export_html(records: &[RunRecord], size_tags: &[SizeTag]) -> String {
    let mut out = String::new();
    let mut open_block: Option<&str> = None;
    let mut open_size: Option<&str> = None;

    for record in records {
        let block = record.font.formatting_tag();

        if block != open_block {
            if let Some(size) = open_size.take() {
                out.push_str(&format!("</{size}>"));
            }
            if let Some(tag) = open_block {
                if is_list(tag) {
                    out.push_str("</li>");
                }
                out.push_str(&format!("</{tag}>"));
            }
            if let Some(tag) = block {
                out.push_str(&format!("<{tag}>"));
                if is_list(tag) {
                    out.push_str("<li>");
                }
            }
            open_block = block;
        }

        // List items carry their text directly
        if block.is_some_and(is_list) {
            let lines: Vec<String> = LINE_BREAK
                .split(&record.text)
                .map(|line| html_inline(line, &record.font))
                .collect();
            out.push_str(&lines.join("</li><li>"));
            continue;
        }

        let size = nearest_size_tag(size_tags, record.font.display_size);
        if size != open_size {
            if let Some(tag) = open_size {
                out.push_str(&format!("</{tag}>"));
            }
            if let Some(tag) = size {
                out.push_str(&format!("<{tag}>"));
            }
            open_size = size;
        }

        let separator = match size {
            Some("p") => "</p><p>",
            Some(tag) if tag.starts_with('h') => "",
            _ => "<br>",
        };
        let lines: Vec<String> = LINE_BREAK
            .split(&record.text)
            .map(|line| html_inline(line, &record.font))
            .collect();
        out.push_str(&lines.join(separator));
    }

    if let Some(tag) = open_size {
        out.push_str(&format!("</{tag}>"));
    }
    if let Some(tag) = open_block {
        if is_list(tag) {
            out.push_str("</li>");
        }
        out.push_str(&format!("</{tag}>"));
    }
    out
}

fn heading_level(tag: &str) -> Option<usize> {
    let level = tag.strip_prefix('h')?.parse::<usize>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn markdown_inline(text: &str, font: &FontDescriptor) -> String {
    let mut result = text.to_string();
    if font.attributes.bold && font.attributes.italic {
        result = format!("***{}***", result);
    } else if font.attributes.bold {
        result = format!("**{}**", result);
    } else if font.attributes.italic {
        result = format!("*{}*", result);
    }
    if let Some(link) = &font.link {
        result = format!("[{}]({})", result, link.url);
    }
    result
}

fn export_markdown(records: &[RunRecord], size_tags: &[SizeTag]) -> String {
    let mut out = String::new();
    let mut open_block: Option<&str> = None;
    let mut line_start = true;
    let mut ordinal = 0;

    for record in records {
        let block = record.font.formatting_tag();
        if block != open_block {
            if !out.is_empty() {
                if !line_start {
                    out.push('\n');
                }
                out.push('\n');
                line_start = true;
            }
            ordinal = 0;
            open_block = block;
        }

        for (i, line) in LINE_BREAK.split(&record.text).enumerate() {
            if i > 0 {
                out.push('\n');
                line_start = true;
            }
            if line.is_empty() {
                continue;
            }
            if line_start {
                match block {
                    Some("ul") => out.push_str("- "),
                    Some("ol") => {
                        ordinal += 1;
                        out.push_str(&format!("{ordinal}. "));
                    }
                    Some("blockquote") => out.push_str("> "),
                    _ => {
                        let tag = block
                            .or_else(|| nearest_size_tag(size_tags, record.font.display_size));
                        if let Some(level) = tag.and_then(heading_level) {
                            out.push_str(&"#".repeat(level));
                            out.push(' ');
                        }
                    }
                }
                line_start = false;
            }
            out.push_str(&markdown_inline(line, &record.font));
        }
    }

    out
}
