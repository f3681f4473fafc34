//! Caption templates.
//!
//! Templates are HTML with four named placeholders. `{{` and `}}` produce
//! literal braces; any other `{name}` is an error at render time.

use thiserror::Error;

/// Placeholders every caption template must contain, in reporting order.
pub const PLACEHOLDERS: [&str; 4] = ["{title}", "{season}", "{episode}", "{quality}"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("caption template is empty")]
    Empty,

    #[error("missing placeholder {0}")]
    MissingPlaceholder(&'static str),

    #[error("unknown placeholder {{{0}}} in caption template")]
    UnknownPlaceholder(String),

    #[error("unclosed '{{' at byte {0} of caption template")]
    UnclosedBrace(usize),

    #[error("single '}}' at byte {0} of caption template")]
    StrayClosingBrace(usize),
}

/// Values substituted into a caption.
#[derive(Debug, Clone, Copy)]
pub struct CaptionFields<'a> {
    pub title: &'a str,
    /// Season number, already zero-padded.
    pub season: &'a str,
    pub episode: u32,
    pub quality: &'a str,
}

/// Check that a template names every required placeholder.
///
/// Reports the first missing one in [`PLACEHOLDERS`] order.
pub fn validate_template(template: &str) -> Result<(), FormatError> {
    if template.trim().is_empty() {
        return Err(FormatError::Empty);
    }
    match PLACEHOLDERS.iter().copied().find(|p| !template.contains(p)) {
        Some(missing) => Err(FormatError::MissingPlaceholder(missing)),
        None => Ok(()),
    }
}

/// Render a caption. The episode number is always padded to two digits.
pub fn render(template: &str, fields: &CaptionFields<'_>) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len() + fields.title.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' if chars.next_if(|&(_, c)| c == '{').is_some() => out.push('{'),
            '}' if chars.next_if(|&(_, c)| c == '}').is_some() => out.push('}'),
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(FormatError::UnclosedBrace(pos)),
                        Some((_, c)) => name.push(c),
                    }
                }
                match name.as_str() {
                    "title" => out.push_str(fields.title),
                    "season" => out.push_str(fields.season),
                    "episode" => out.push_str(&format!("{:02}", fields.episode)),
                    "quality" => out.push_str(fields.quality),
                    _ => return Err(FormatError::UnknownPlaceholder(name)),
                }
            },
            '}' => return Err(FormatError::StrayClosingBrace(pos)),
            c => out.push(c),
        }
    }

    Ok(out)
}
