//! Conversion of notes into Markdown text and standalone HTML documents.
//!
//! The Markdown body is produced by [`MARKDOWN_RULES`], a best-effort tag
//! substitution pipeline. It never fails: tags it does not know are stripped,
//! malformed markup is stripped mechanically, and ordered lists degrade to
//! dashes.

use std::sync::LazyLock;

use chrono::{DateTime, Local};
use log::debug;

use crate::{apply_rules, escape_html, Note, Rule};

/// HTML-to-Markdown substitutions applied to note bodies, in order.
pub static MARKDOWN_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("h1", r"(?i)<h1[^>]*>(.*?)</h1>", "# ${1}"),
        Rule::new("h2", r"(?i)<h2[^>]*>(.*?)</h2>", "## ${1}"),
        Rule::new("h3", r"(?i)<h3[^>]*>(.*?)</h3>", "### ${1}"),
        Rule::new("h4", r"(?i)<h4[^>]*>(.*?)</h4>", "#### ${1}"),
        Rule::new("h5", r"(?i)<h5[^>]*>(.*?)</h5>", "##### ${1}"),
        Rule::new("h6", r"(?i)<h6[^>]*>(.*?)</h6>", "###### ${1}"),
        Rule::new("strong", r"(?i)<strong[^>]*>(.*?)</strong>", "**${1}**"),
        Rule::new("b", r"(?i)<b[^>]*>(.*?)</b>", "**${1}**"),
        Rule::new("em", r"(?i)<em[^>]*>(.*?)</em>", "*${1}*"),
        Rule::new("i", r"(?i)<i[^>]*>(.*?)</i>", "*${1}*"),
        Rule::new("u", r"(?i)<u[^>]*>(.*?)</u>", "_${1}_"),
        Rule::new("ul-open", r"(?i)<ul[^>]*>", ""),
        Rule::new("ul-close", r"(?i)</ul>", ""),
        Rule::new("ol-open", r"(?i)<ol[^>]*>", ""),
        Rule::new("ol-close", r"(?i)</ol>", ""),
        Rule::new("li", r"(?i)<li[^>]*>(.*?)</li>", "- ${1}"),
        Rule::new(
            "blockquote",
            r"(?i)<blockquote[^>]*>(.*?)</blockquote>",
            "> ${1}",
        ),
        Rule::new("p-open", r"(?i)<p[^>]*>", ""),
        Rule::new("p-close", r"(?i)</p>", "\n\n"),
        Rule::new("br", r"(?i)<br[^>]*>", "\n"),
        Rule::new("strip-tags", r"<[^>]*>", ""),
        Rule::new("collapse-newlines", r"\n\s*\n\s*\n", "\n\n"),
    ]
});

/// How user-provided metadata is written into exported HTML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HtmlEscaping {
    /// Title, category, tags, attendees, time and id are HTML-escaped
    #[default]
    Escaped,
    /// Unescaped metadata
    Raw,
}

const GENERATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DOCUMENT_STYLE: &str = r#"    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      max-width: 800px;
      margin: 0 auto;
      padding: 2rem;
      line-height: 1.6;
      color: #333;
    }
    .metadata {
      background: #f8f9fa;
      padding: 1rem;
      border-radius: 8px;
      margin-bottom: 2rem;
      border-left: 4px solid #007bff;
    }
    .metadata p {
      margin: 0.5rem 0;
    }
    .tags {
      display: flex;
      flex-wrap: wrap;
      gap: 0.5rem;
      margin-top: 0.5rem;
    }
    .tag {
      background: #e3f2fd;
      color: #1976d2;
      padding: 0.25rem 0.5rem;
      border-radius: 12px;
      font-size: 0.875rem;
    }
    .content {
      margin-top: 2rem;
    }
    .footer {
      margin-top: 3rem;
      padding-top: 2rem;
      border-top: 1px solid #ddd;
      font-size: 0.875rem;
      color: #666;
    }
    h1, h2, h3, h4, h5, h6 {
      margin-top: 2rem;
      margin-bottom: 1rem;
    }
    h1 {
      color: #1976d2;
      border-bottom: 2px solid #e3f2fd;
      padding-bottom: 0.5rem;
    }
    ul, ol {
      padding-left: 1.5rem;
    }
    blockquote {
      border-left: 4px solid #ddd;
      padding-left: 1rem;
      margin-left: 0;
      font-style: italic;
    }
    @media print {
      body {
        padding: 1rem;
      }
      .footer {
        page-break-inside: avoid;
      }
    }
"#;

/// Converts an HTML fragment to Markdown text.
pub fn html_to_markdown(html: &str) -> String {
    apply_rules(&MARKDOWN_RULES, html).trim().to_string()
}

/// Renders a note as a Markdown document stamped with the current time.
pub fn to_markdown(note: &Note) -> String {
    to_markdown_at(note, &Local::now())
}

/// Renders a note as a Markdown document stamped with `generated_at`.
pub fn to_markdown_at(note: &Note, generated_at: &DateTime<Local>) -> String {
    debug!("Exporting note {} to Markdown", note.id);
    let mut markdown = format!("# {}\n\n", note.title);

    for (label, value) in metadata(note) {
        markdown.push_str(&format!("**{}:** {}\n", label, value));
    }

    markdown.push_str("\n---\n\n");
    markdown.push_str(&html_to_markdown(&note.content));
    markdown.push_str(&format!(
        "\n\n---\n\n*Generated on {}*\n*Note ID: {}*",
        generated_at.format(GENERATED_FORMAT),
        note.id
    ));
    markdown
}

/// Renders a note as a standalone HTML document stamped with the current time.
pub fn to_html(note: &Note, escaping: HtmlEscaping) -> String {
    to_html_at(note, escaping, &Local::now())
}

/// Renders a note as a standalone HTML document.
///
/// The body is embedded as stored. It is the editor's own serialization and
/// is never escaped; `escaping` applies to the surrounding metadata.
pub fn to_html_at(
    note: &Note,
    escaping: HtmlEscaping,
    generated_at: &DateTime<Local>,
) -> String {
    debug!("Exporting note {} to HTML", note.id);
    let text = |value: &str| match escaping {
        HtmlEscaping::Escaped => escape_html(value),
        HtmlEscaping::Raw => value.to_string(),
    };
    let title = text(&note.title);

    let mut html = String::with_capacity(DOCUMENT_STYLE.len() + note.content.len() + 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"UTF-8\">\n");
    html.push_str(
        "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!("  <title>{}</title>\n", title));
    html.push_str("  <style>\n");
    html.push_str(DOCUMENT_STYLE);
    html.push_str("  </style>\n</head>\n<body>\n");
    html.push_str(&format!("  <h1>{}</h1>\n\n", title));

    html.push_str("  <div class=\"metadata\">\n");
    html.push_str(&format!(
        "    <p><strong>Date:</strong> {}</p>\n",
        note.date.format("%Y-%m-%d")
    ));
    if let Some(time) = note.meeting_time.as_deref().filter(|t| !t.is_empty()) {
        html.push_str(&format!("    <p><strong>Time:</strong> {}</p>\n", text(time)));
    }
    html.push_str(&format!(
        "    <p><strong>Category:</strong> {}</p>\n",
        text(&note.category)
    ));
    if let Some(attendees) = note.attendees.as_ref().filter(|a| !a.is_empty()) {
        html.push_str(&format!(
            "    <p><strong>Attendees:</strong> {}</p>\n",
            text(&attendees.join(", "))
        ));
    }
    if !note.tags.is_empty() {
        html.push_str("    <p><strong>Tags:</strong></p>\n    <div class=\"tags\">\n      ");
        for tag in &note.tags {
            html.push_str(&format!("<span class=\"tag\">{}</span>", text(tag)));
        }
        html.push_str("\n    </div>\n");
    }
    html.push_str("  </div>\n\n");

    html.push_str("  <div class=\"content\">\n    ");
    html.push_str(&note.content);
    html.push_str("\n  </div>\n\n");

    html.push_str("  <div class=\"footer\">\n");
    html.push_str(&format!(
        "    <p>Generated on {}</p>\n",
        generated_at.format(GENERATED_FORMAT)
    ));
    html.push_str(&format!("    <p>Note ID: {}</p>\n", text(&note.id)));
    html.push_str("  </div>\n</body>\n</html>");
    html
}

/// Derives a download file name: the lower-cased title with every character
/// that is not an ASCII letter or digit replaced by `_`.
pub fn export_filename(title: &str, extension: &str) -> String {
    let mut stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        stem.push_str("note");
    }
    format!("{}.{}", stem, extension)
}

/// Metadata lines shared by both formats, only for fields that are set.
fn metadata(note: &Note) -> Vec<(&'static str, String)> {
    let mut lines = vec![("Date", note.date.format("%Y-%m-%d").to_string())];
    if let Some(time) = note.meeting_time.as_deref().filter(|t| !t.is_empty()) {
        lines.push(("Time", time.to_string()));
    }
    if !note.category.is_empty() {
        lines.push(("Category", note.category.clone()));
    }
    if !note.tags.is_empty() {
        lines.push(("Tags", note.tags.join(", ")));
    }
    if let Some(attendees) = note.attendees.as_ref().filter(|a| !a.is_empty()) {
        lines.push(("Attendees", attendees.join(", ")));
    }
    lines
}
