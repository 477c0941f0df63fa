//! YAML frontmatter splitting shared by agent and skill documents.
//!
//! Frontmatter must be delimited by `---` lines at the start of the file.

/// A markdown document split into its frontmatter block and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document<'a> {
    /// Raw YAML between the delimiters.
    pub frontmatter: &'a str,
    /// Markdown after the closing delimiter, trimmed.
    pub body: &'a str,
}

/// Split a document into frontmatter and body.
///
/// Returns `None` when the document does not open with `---` or the closing
/// delimiter is missing.
pub fn split(content: &str) -> Option<Document<'_>> {
    let trimmed = content.trim_start();
    let after_open = trimmed.strip_prefix("---")?;
    let after_newline = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let (close_pos, delimiter_len) = match after_newline.find("\n---") {
        Some(pos) => (pos, 4),
        None => (after_newline.find("\r\n---")?, 5),
    };

    let frontmatter = &after_newline[..close_pos];
    let after_close = &after_newline[close_pos + delimiter_len..];
    let body = after_close
        .strip_prefix('\n')
        .or_else(|| after_close.strip_prefix("\r\n"))
        .unwrap_or(after_close);

    Some(Document {
        frontmatter,
        body: body.trim(),
    })
}
