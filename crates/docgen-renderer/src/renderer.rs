//! Markdown renderer with example generation and cross-document features.

use std::fmt::Write;
use std::path::PathBuf;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use tracing::debug;

use crate::container::ContainerExpander;
use crate::document::Document;
use crate::env::RenderEnv;
use crate::error::{RenderError, SoftError, SoftErrorHandler};
use crate::example::{ExampleGenerator, ExampleRequest, ExampleResult, parse_fence_info};
use crate::html;
use crate::inline_tags::InlineTagResolver;
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, TocEntry, escape_html};
use crate::util::{heading_level_to_num, is_external_url, join_paths};

/// Static file referenced by a page that must be copied next to it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resource {
    /// Destination relative to the output folder.
    pub dst: String,
    /// Source file on disk.
    pub src: PathBuf,
}

/// Result of rendering one document.
#[derive(Clone, Debug)]
pub struct RenderedPage {
    /// Rendered HTML content.
    pub html: String,
    /// Text of the first level-one heading after normalization.
    pub title: Option<String>,
    /// Table of contents entries.
    pub toc: Vec<TocEntry>,
    /// Examples generated while rendering, in document order.
    pub examples: Vec<ExampleResult>,
    /// Images registered as resources.
    pub resources: Vec<Resource>,
}

/// Markdown renderer bound to the full document set.
///
/// Every [`render`](Self::render) call starts from a fresh [`RenderEnv`],
/// so anchor ids never leak between documents. Fenced code blocks with a
/// language are handed to the configured [`ExampleGenerator`]; without one
/// they render as plain code blocks.
///
/// # Example
///
/// ```
/// use docgen_renderer::{Document, FileInfo, MarkdownRenderer};
///
/// let doc = Document {
///     id: "index".to_owned(),
///     name: "index".to_owned(),
///     file_info: FileInfo::default(),
///     attributes: Default::default(),
///     body: "## Hello\n\nWorld".to_owned(),
///     template: "default".to_owned(),
/// };
/// let docs = [doc];
/// let page = MarkdownRenderer::new(&docs).render(&docs[0]).unwrap();
/// assert_eq!(page.html, r#"<h1 id="hello">Hello</h1><p>World</p>"#);
/// ```
pub struct MarkdownRenderer<'a> {
    docs: &'a [Document],
    generator: Option<&'a mut dyn ExampleGenerator>,
    handler: SoftErrorHandler<'a>,
    initial_heading_level: u8,
}

impl<'a> MarkdownRenderer<'a> {
    /// Create a renderer resolving references against `docs`.
    ///
    /// Soft errors are re-raised until a handler is installed.
    #[must_use]
    pub fn new(docs: &'a [Document]) -> Self {
        Self {
            docs,
            generator: None,
            handler: Box::new(Err),
            initial_heading_level: 1,
        }
    }

    /// Generate examples for fenced code blocks with `generator`.
    #[must_use]
    pub fn with_example_generator(mut self, generator: &'a mut dyn ExampleGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Install the soft-error recovery callback.
    #[must_use]
    pub fn with_soft_error_handler(
        mut self,
        handler: impl FnMut(SoftError) -> Result<String, SoftError> + 'a,
    ) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Level the smallest heading of a document is mapped to (default 1).
    #[must_use]
    pub fn with_initial_heading_level(mut self, level: u8) -> Self {
        self.initial_heading_level = level.clamp(1, 6);
        self
    }

    /// Render a document's body.
    pub fn render(&mut self, doc: &Document) -> Result<RenderedPage, RenderError> {
        self.render_content(doc, &doc.body)
    }

    /// Render `content` in the context of `doc`.
    pub fn render_content(
        &mut self,
        doc: &Document,
        content: &str,
    ) -> Result<RenderedPage, RenderError> {
        debug!(document = %doc.id, "Rendering markdown");

        let mut chain = vec![doc.id.clone()];
        let expanded = ContainerExpander::new(self.docs, &mut self.handler)
            .expand(content, &mut chain)?;

        let events: Vec<Event<'_>> = Parser::new_ext(&expanded, parser_options()).collect();
        let min_level = events
            .iter()
            .filter_map(|event| match event {
                Event::Start(Tag::Heading { level, .. }) => Some(heading_level_to_num(*level)),
                _ => None,
            })
            .min();

        let mut writer = PageWriter {
            doc,
            env: RenderEnv::new(doc.file_info.clone()),
            generator: self.generator.as_deref_mut(),
            handler: &mut self.handler,
            output: String::with_capacity(expanded.len() * 2),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::new(min_level, self.initial_heading_level),
            pending_image: None,
            alert_stack: Vec::new(),
            example_index: 0,
            examples: Vec::new(),
            resources: Vec::new(),
        };
        for event in events {
            writer.process_event(event)?;
        }

        let PageWriter {
            env,
            output,
            mut heading,
            examples,
            resources,
            ..
        } = writer;
        let toc = heading.take_toc();

        let html = InlineTagResolver {
            docs: self.docs,
            env: &env,
            toc: &toc,
            document: &doc.id,
            handler: &mut self.handler,
        }
        .process(&output)?;

        Ok(RenderedPage {
            html,
            title: heading.take_title(),
            toc,
            examples,
            resources,
        })
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
}

/// Per-render event machine.
struct PageWriter<'r, 'g> {
    doc: &'r Document,
    env: RenderEnv,
    generator: Option<&'r mut (dyn ExampleGenerator + 'g)>,
    handler: &'r mut SoftErrorHandler<'g>,
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    /// Whether each open blockquote is an alert.
    alert_stack: Vec<bool>,
    example_index: usize,
    examples: Vec<ExampleResult>,
    resources: Vec<Resource>,
}

impl PageWriter<'_, '_> {
    fn process_event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(TagEnd::CodeBlock) => return self.end_code_block(),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.output.push_str(&html),
            Event::SoftBreak => self.push_inline("\n"),
            Event::HardBreak => self.push_inline("<br>"),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => {
                let checked = if checked { " checked" } else { "" };
                write!(self.output, r#"<input type="checkbox" disabled{checked}>"#).unwrap();
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
        Ok(())
    }

    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => self.heading.start_heading(heading_level_to_num(level)),
            Tag::BlockQuote(Some(kind)) => {
                self.alert_stack.push(true);
                html::alert_start(kind, &mut self.output);
            }
            Tag::BlockQuote(None) => {
                self.alert_stack.push(false);
                self.output.push_str("<blockquote>");
            }
            Tag::CodeBlock(kind) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) if !info.trim().is_empty() => {
                        Some(info.into_string())
                    }
                    _ => None,
                };
                self.code.start(info);
            }
            Tag::List(Some(1)) => self.output.push_str("<ol>"),
            Tag::List(Some(start)) => write!(self.output, r#"<ol start="{start}">"#).unwrap(),
            Tag::List(None) => self.output.push_str("<ul>"),
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output
                    .push_str(r#"<div class="table-scroll"><table class="table">"#);
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link { dest_url, .. } => {
                let link = format!(r#"<a href="{}">"#, escape_html(&dest_url));
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image.start();
                self.pending_image = Some((dest_url.into_string(), title.into_string()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                let env = &mut self.env;
                if let Some((level, id, html)) =
                    self.heading.complete_heading(|slug| env.unique_id(slug))
                {
                    write!(self.output, r#"<h{level} id="{id}">{}</h{level}>"#, html.trim())
                        .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => {
                if self.alert_stack.pop().unwrap_or(false) {
                    self.output.push_str("</div>");
                } else {
                    self.output.push_str("</blockquote>");
                }
            }
            TagEnd::List(ordered) => self.output.push_str(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::CodeBlock
            | TagEnd::FootnoteDefinition
            | TagEnd::HtmlBlock
            | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table></div>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output
                    .push_str(if self.table.is_in_head() { "</th>" } else { "</td>" });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => self.end_image(),
        }
    }

    fn end_image(&mut self) {
        let alt = self.image.end();
        let Some((src, title)) = self.pending_image.take() else {
            return;
        };

        if !is_external_url(&src) {
            let base = self
                .doc
                .file_info
                .full_path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default();
            self.resources.push(Resource {
                dst: join_paths(&[&self.doc.file_info.path, &src]),
                src: base.join(&src),
            });
        }

        let mut img = String::new();
        html::image(&src, &alt, &title, &mut img);
        self.push_inline(&img);
    }

    fn end_code_block(&mut self) -> Result<(), RenderError> {
        let (info, content) = self.code.end();
        let (language, tags, attrs) = info.as_deref().map(parse_fence_info).unwrap_or_default();

        let Some(generator) = self.generator.as_deref_mut().filter(|_| !language.is_empty())
        else {
            let lang = (!language.is_empty()).then_some(language.as_str());
            html::code_block(lang, &content, &mut self.output);
            return Ok(());
        };

        let filename = format!("{}-{}.{language}", self.doc.name, self.example_index);
        self.example_index += 1;

        let request = ExampleRequest {
            source: &content,
            language: &language,
            filename: &filename,
            tags: &tags,
            attrs: &attrs,
            parent: &self.doc.id,
        };
        match generator.generate(&request) {
            Ok(result) => {
                html::example(&result, &mut self.output);
                self.examples.push(result);
            }
            Err(source) => {
                let replacement = (self.handler)(SoftError::Example {
                    filename,
                    document: self.doc.id.clone(),
                    source,
                })?;
                self.output.push_str(&replacement);
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        let html = format!(r#"<code class="code-inline">{}</code>"#, escape_html(code));
        self.push_inline(&html);
    }
}
