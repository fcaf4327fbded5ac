//! State structs tracking context during event processing.

use pulldown_cmark::Alignment;

/// State for tracking code block rendering.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    /// Raw fence info string (e.g. `vue live`).
    info: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional fence info.
    pub fn start(&mut self, info: Option<String>) {
        self.active = true;
        self.info = info;
        self.buffer.clear();
    }

    /// End the current code block and return (info, content).
    pub fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.info.take(), std::mem::take(&mut self.buffer))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    pub fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Alignment style attribute for the current cell.
    pub fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for capturing image alt text.
#[derive(Default)]
pub(crate) struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    pub fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level after normalization (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// State for heading level normalization and title capture.
pub(crate) struct HeadingState {
    /// Levels are shifted down by this amount.
    shift: u8,
    title: Option<String>,
    current_level: Option<u8>,
    /// Plain text of the heading (for slug and table of contents).
    text: String,
    /// HTML of the heading (with inline formatting).
    html: String,
    toc: Vec<TocEntry>,
}

impl HeadingState {
    /// Create heading state mapping `min_level` onto `initial_level`.
    ///
    /// Documents whose smallest heading level is already at or above
    /// `initial_level` are left untouched.
    pub fn new(min_level: Option<u8>, initial_level: u8) -> Self {
        let shift = min_level
            .map_or(0, |min| min.saturating_sub(initial_level.max(1)));
        Self {
            shift,
            title: None,
            current_level: None,
            text: String::new(),
            html: String::new(),
            toc: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    pub fn start_heading(&mut self, level: u8) {
        self.current_level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    /// Normalized output level.
    pub fn adjusted_level(&self, level: u8) -> u8 {
        level.saturating_sub(self.shift).clamp(1, 6)
    }

    /// Complete the heading and record the table of contents entry.
    ///
    /// `assign_id` maps the heading slug to a unique anchor id. Returns
    /// (level, id, html) or None when not in a heading.
    pub fn complete_heading(
        &mut self,
        assign_id: impl FnOnce(&str) -> String,
    ) -> Option<(u8, String, String)> {
        let raw = self.current_level.take()?;
        let level = self.adjusted_level(raw);
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let title = text.trim().to_owned();

        let id = assign_id(&slugify(&title));

        if level == 1 && self.title.is_none() {
            self.title = Some(title.clone());
        }
        self.toc.push(TocEntry {
            level,
            title,
            id: id.clone(),
        });

        Some((level, id, html))
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    pub fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// Convert text to URL-safe slug.
///
/// Lowercases ASCII letters, collapses whitespace, dashes and underscores
/// into single dashes, and drops everything else.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("snake_case"), "snake-case");
        assert_eq!(slugify("Försäkring"), "försäkring");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>"), "&lt;b&gt;");
        assert_eq!(escape_html("a & \"b\""), "a &amp; &quot;b&quot;");
    }

    #[test]
    fn test_heading_shift_to_initial_level() {
        let state = HeadingState::new(Some(3), 1);
        assert_eq!(state.adjusted_level(3), 1);
        assert_eq!(state.adjusted_level(4), 2);
    }

    #[test]
    fn test_heading_never_shifts_up() {
        let state = HeadingState::new(Some(1), 2);
        assert_eq!(state.adjusted_level(1), 1);
        assert_eq!(state.adjusted_level(2), 2);
    }

    #[test]
    fn test_complete_heading_records_toc() {
        let mut state = HeadingState::new(Some(2), 1);
        state.start_heading(2);
        state.push_text("Getting started");
        state.push_html("Getting started");
        let (level, id, html) = state.complete_heading(str::to_owned).unwrap();
        assert_eq!((level, id.as_str(), html.as_str()), (1, "getting-started", "Getting started"));
        assert_eq!(state.take_title().as_deref(), Some("Getting started"));
        assert_eq!(state.take_toc().len(), 1);
        assert_eq!(state.complete_heading(str::to_owned), None);
    }

    #[test]
    fn test_code_block_state() {
        let mut state = CodeBlockState::default();
        state.start(Some("vue live".to_owned()));
        assert!(state.is_active());
        state.push_str("<template/>");
        let (info, content) = state.end();
        assert_eq!(info.as_deref(), Some("vue live"));
        assert_eq!(content, "<template/>");
        assert!(!state.is_active());
    }

    #[test]
    fn test_table_alignment() {
        let mut state = TableState::default();
        state.start(vec![Alignment::None, Alignment::Right]);
        state.start_row();
        assert_eq!(state.current_alignment_style(), "");
        state.next_cell();
        assert_eq!(state.current_alignment_style(), r#" style="text-align:right""#);
    }
}
