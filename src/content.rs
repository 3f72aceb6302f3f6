/*!
 * Blog Content
 * Content-block model, HTML rendering, slugs and reading time
 */
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Average adult reading speed used for the reading-time estimate.
const WORDS_PER_MINUTE: usize = 200;

lazy_static! {
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n\s*\n").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

/// One block of a post body, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Heading {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtitle: Option<String>,
    },
    Text {
        content: String,
    },
    Table {
        #[serde(default)]
        rows: Vec<TableRow>,
    },
}

impl ContentBlock {
    fn word_count(&self) -> usize {
        match self {
            ContentBlock::Heading { title, subtitle } => {
                words(title) + subtitle.as_deref().map_or(0, words)
            }
            ContentBlock::Text { content } => words(content),
            ContentBlock::Table { rows } => rows
                .iter()
                .flat_map(|r| r.cells.iter())
                .map(|c| words(&c.text))
                .sum(),
        }
    }
}

fn words(s: &str) -> usize {
    s.split_whitespace().count()
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render blocks in order. Headings and table cells are escaped; text blocks
/// may carry inline markup, which is sanitised with ammonia.
pub fn render(blocks: &[ContentBlock]) -> String {
    let mut html = String::new();
    for block in blocks {
        match block {
            ContentBlock::Heading { title, subtitle } => {
                html.push_str(&format!("<h2>{}</h2>\n", escape_html(title)));
                if let Some(sub) = subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
                    html.push_str(&format!("<p class=\"subtitle\">{}</p>\n", escape_html(sub)));
                }
            }
            ContentBlock::Text { content } => {
                for paragraph in PARAGRAPH_BREAK.split(content.trim()) {
                    let paragraph = paragraph.trim();
                    if paragraph.is_empty() {
                        continue;
                    }
                    html.push_str(&format!("<p>{}</p>\n", ammonia::clean(paragraph)));
                }
            }
            ContentBlock::Table { rows } => {
                if rows.is_empty() {
                    continue;
                }
                html.push_str("<table>\n<tbody>\n");
                for row in rows {
                    html.push_str("<tr>");
                    for cell in &row.cells {
                        html.push_str(&format!("<td>{}</td>", escape_html(&cell.text)));
                    }
                    html.push_str("</tr>\n");
                }
                html.push_str("</tbody>\n</table>\n");
            }
        }
    }
    html
}

/// Minutes to read, never less than one.
pub fn reading_time_minutes(blocks: &[ContentBlock]) -> i32 {
    let total: usize = blocks.iter().map(ContentBlock::word_count).sum();
    total.div_ceil(WORDS_PER_MINUTE).max(1) as i32
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// Derive a slug from free text: lowercase, runs of other characters
/// collapsed to a single hyphen.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}
