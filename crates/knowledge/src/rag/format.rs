//! Answer formatting.
//!
//! Model output is turned into display-ready plain text in three steps:
//! stray markup is sanitized, each remaining line is classified, and the
//! classified lines are rendered back to text.

/// Glyph prefixed to bullet lines.
pub const BULLET: &str = "• ";

/// Tag names stripped from model output.
const KNOWN_TAGS: &[&str] = &[
    "a", "abbr", "article", "aside", "b", "blockquote", "body", "br", "button", "caption",
    "center", "cite", "code", "dd", "del", "details", "div", "dl", "dt", "em", "figcaption",
    "figure", "font", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hr", "html", "i", "iframe", "img", "input", "ins", "kbd", "label", "li", "link", "main",
    "mark", "meta", "nav", "ol", "option", "p", "pre", "q", "s", "samp", "script", "section",
    "select", "small", "span", "strike", "strong", "style", "sub", "summary", "sup", "table",
    "tbody", "td", "textarea", "tfoot", "th", "thead", "title", "tr", "tt", "u", "ul", "var",
];

/// Tags replaced by a line break instead of nothing.
const LINE_BREAK_TAGS: &[&str] = &[
    "blockquote", "br", "div", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "ol", "p", "pre",
    "table", "tr", "ul",
];

/// One classified line of an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerLine {
    /// `- item`, holding the text after the marker
    Bullet(String),
    /// A line starting with a two-digit number and `.`, kept as is
    Numbered(String),
    /// Any other non-empty line, trimmed
    Plain(String),
}

impl AnswerLine {
    fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(rest) = line.strip_prefix("- ") {
            return Some(Self::Bullet(rest.to_string()));
        }

        if is_numbered(line) {
            return Some(Self::Numbered(line.to_string()));
        }

        Some(Self::Plain(line.to_string()))
    }

    fn render(&self) -> String {
        match self {
            Self::Bullet(text) => format!("{}{}", BULLET, text),
            Self::Numbered(text) | Self::Plain(text) => text.clone(),
        }
    }
}

/// Two leading digits followed by `.`.
fn is_numbered(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(a), Some(b), Some('.')) if a.is_ascii_digit() && b.is_ascii_digit()
    )
}

/// Sanitize `raw` and split it into classified lines. Empty lines are
/// dropped.
pub fn classify(raw: &str) -> Vec<AnswerLine> {
    sanitize_markup(raw)
        .lines()
        .filter_map(AnswerLine::from_line)
        .collect()
}

/// Render classified lines joined by `\n`.
pub fn render(lines: &[AnswerLine]) -> String {
    lines
        .iter()
        .map(AnswerLine::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format raw model output for display.
pub fn format_answer(raw: &str) -> String {
    render(&classify(raw))
}

/// Remove known markup tags from `text`, keeping their inner text.
///
/// Runs until a pass changes nothing, so removing one tag can never leave
/// behind another one assembled from the surrounding characters.
pub fn sanitize_markup(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let (next, changed) = strip_tags_once(&current);
        if !changed {
            return next;
        }
        current = next;
    }
}

enum TagMatch {
    /// A complete tag spanning `len` bytes
    Tag { len: usize, line_break: bool },
    /// `<name` with no closing `>` on the same line
    Unterminated,
}

fn strip_tags_once(input: &str) -> (String, bool) {
    let mut out = String::with_capacity(input.len());
    let mut changed = false;
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let candidate = &rest[lt..];

        match match_tag(candidate) {
            Some(TagMatch::Tag { len, line_break }) => {
                if line_break {
                    out.push('\n');
                }
                rest = &candidate[len..];
                changed = true;
            }
            // Prose such as `x <b then`: keep the words, split the tag shape.
            Some(TagMatch::Unterminated) => {
                out.push_str("< ");
                rest = &candidate[1..];
                changed = true;
            }
            None => {
                out.push('<');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    (out, changed)
}

/// Match a known tag at the start of `s` (which begins with `<`).
///
/// The name ends at the first char that is not ASCII alphanumeric.
fn match_tag(s: &str) -> Option<TagMatch> {
    let body = &s[1..];
    let (slash, body) = match body.strip_prefix('/') {
        Some(stripped) => (1, stripped),
        None => (0, body),
    };

    let name_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    if name_len == 0 {
        return None;
    }

    let name = body[..name_len].to_ascii_lowercase();
    if !KNOWN_TAGS.contains(&name.as_str()) {
        return None;
    }

    let after = &body[name_len..];
    match after.find(['>', '<', '\n']) {
        Some(end) if after[end..].starts_with('>') => Some(TagMatch::Tag {
            len: 1 + slash + name_len + end + 1,
            line_break: LINE_BREAK_TAGS.contains(&name.as_str()),
        }),
        _ => Some(TagMatch::Unterminated),
    }
}
