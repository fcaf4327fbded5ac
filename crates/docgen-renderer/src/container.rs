//! Container preprocessing.
//!
//! Containers wrap a block of markdown in styled HTML:
//!
//! ```markdown
//! ::: warning Careful
//! Body text, rendered as **markdown**.
//! :::
//! ```
//!
//! A `src=<doc-id>` word on the opening line pulls the body of another
//! document into the container. Inclusion is recursive; the chain of
//! documents being expanded is tracked so a document can never include
//! itself, directly or through others.
//!
//! The pass runs on source lines before markdown parsing and replaces the
//! markers with HTML blocks, leaving the contents to the markdown parser.

use std::fmt::Write;

use tracing::debug;

use crate::document::Document;
use crate::error::{RenderError, SoftError, SoftErrorHandler};
use crate::fence::FenceTracker;
use crate::state::escape_html;

const MESSAGE_BOXES: &[&str] = &["info", "warning", "danger", "tip"];
const DETAILS: &str = "details";

/// Parsed opening line of a container.
#[derive(Debug, PartialEq, Eq)]
struct ContainerHeader<'a> {
    name: &'a str,
    title: String,
    src: Option<&'a str>,
}

/// Parse `::: name [title words] [src=doc-id]`.
fn parse_header(line: &str) -> Option<ContainerHeader<'_>> {
    let rest = line.trim().strip_prefix(":::")?;
    let rest = rest.trim_start_matches(':').trim();
    let mut words = rest.split_whitespace();
    let name = words.next()?;

    let mut src = None;
    let mut title = Vec::new();
    for word in words {
        match word.strip_prefix("src=") {
            Some(value) => src = Some(value.trim_matches('"').trim_matches('\'')),
            None => title.push(word),
        }
    }

    Some(ContainerHeader {
        name,
        title: title.join(" "),
        src,
    })
}

fn is_closing(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == ':')
}

/// Opening and closing HTML for a known container, or `None`.
fn container_html(name: &str, title: &str) -> Option<(String, &'static str)> {
    if MESSAGE_BOXES.contains(&name) {
        let mut open = format!("<div class=\"message-box message-box--{name}\">\n");
        if !title.is_empty() {
            writeln!(
                open,
                "<p class=\"message-box__title\">{}</p>",
                escape_html(title)
            )
            .unwrap();
        }
        open.push('\n');
        Some((open, "\n</div>\n\n"))
    } else if name == DETAILS {
        let summary = if title.is_empty() { "Details" } else { title };
        let open = format!(
            "<details class=\"details\">\n<summary>{}</summary>\n\n",
            escape_html(summary)
        );
        Some((open, "\n</details>\n\n"))
    } else {
        None
    }
}

/// Expands containers against the full document set.
pub(crate) struct ContainerExpander<'r, 'h> {
    docs: &'r [Document],
    handler: &'r mut SoftErrorHandler<'h>,
}

impl<'r, 'h> ContainerExpander<'r, 'h> {
    pub(crate) fn new(docs: &'r [Document], handler: &'r mut SoftErrorHandler<'h>) -> Self {
        Self { docs, handler }
    }

    /// Expand all containers in `body`, which belongs to the last document
    /// in `chain`.
    pub(crate) fn expand(
        &mut self,
        body: &str,
        chain: &mut Vec<String>,
    ) -> Result<String, RenderError> {
        if !body.contains(":::") {
            return Ok(body.to_owned());
        }

        let document = chain.last().cloned().unwrap_or_default();
        let mut output = String::with_capacity(body.len());
        let mut fence = FenceTracker::default();
        // `None` marks a container whose opening line was replaced.
        let mut stack: Vec<Option<&'static str>> = Vec::new();

        for line in body.split_inclusive('\n') {
            if fence.update(line) || fence.in_fence() {
                output.push_str(line);
                continue;
            }

            if is_closing(line) {
                match stack.pop() {
                    Some(Some(close)) => output.push_str(close),
                    Some(None) => {}
                    None => output.push_str(line),
                }
                continue;
            }

            let Some(header) = parse_header(line) else {
                output.push_str(line);
                continue;
            };

            if let Some((open, close)) = container_html(header.name, &header.title) {
                output.push_str(&open);
                if let Some(src) = header.src {
                    self.include(src, &document, chain, &mut output)?;
                }
                stack.push(Some(close));
            } else {
                let replacement = (self.handler)(SoftError::UnknownContainer {
                    name: header.name.to_owned(),
                    document: document.clone(),
                })?;
                output.push_str(&replacement);
                output.push('\n');
                stack.push(None);
            }
        }

        while let Some(open) = stack.pop() {
            if let Some(close) = open {
                output.push_str(close);
            }
        }

        Ok(output)
    }

    fn include(
        &mut self,
        src: &str,
        document: &str,
        chain: &mut Vec<String>,
        output: &mut String,
    ) -> Result<(), RenderError> {
        if chain.iter().any(|id| id == src) {
            let mut cycle = chain.clone();
            cycle.push(src.to_owned());
            return Err(RenderError::CircularInclusion { chain: cycle });
        }

        let Some(included) = self.docs.iter().find(|doc| doc.id == src) else {
            let replacement = (self.handler)(SoftError::UnknownDocument {
                reference: src.to_owned(),
                document: document.to_owned(),
            })?;
            output.push_str(&replacement);
            output.push_str("\n\n");
            return Ok(());
        };

        debug!(document, included = src, "Including document in container");
        chain.push(src.to_owned());
        let expanded = self.expand(&included.body, chain);
        chain.pop();

        output.push_str(&expanded?);
        if !output.ends_with('\n') {
            output.push('\n');
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::{Attributes, FileInfo};

    fn doc(id: &str, body: &str) -> Document {
        Document {
            id: id.to_owned(),
            name: id.to_owned(),
            file_info: FileInfo::default(),
            attributes: Attributes::new(),
            body: body.to_owned(),
            template: "default".to_owned(),
        }
    }

    fn reraise<'a>() -> SoftErrorHandler<'a> {
        Box::new(Err)
    }

    fn expand(docs: &[Document], id: &str) -> Result<String, RenderError> {
        let mut handler = reraise();
        let body = docs.iter().find(|d| d.id == id).unwrap().body.clone();
        ContainerExpander::new(docs, &mut handler).expand(&body, &mut vec![id.to_owned()])
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("::: warning Mind the gap src=shared/gap"),
            Some(ContainerHeader {
                name: "warning",
                title: "Mind the gap".to_owned(),
                src: Some("shared/gap"),
            })
        );
        assert_eq!(parse_header(":::"), None);
        assert_eq!(parse_header("text"), None);
    }

    #[test]
    fn test_message_box() {
        let docs = [doc("a", "::: info Note\nHello\n:::\n")];
        assert_eq!(
            expand(&docs, "a").unwrap(),
            "<div class=\"message-box message-box--info\">\n<p class=\"message-box__title\">Note</p>\n\nHello\n\n</div>\n\n"
        );
    }

    #[test]
    fn test_details_default_summary() {
        let docs = [doc("a", "::: details\nMore\n:::\n")];
        let out = expand(&docs, "a").unwrap();
        assert!(out.starts_with("<details class=\"details\">\n<summary>Details</summary>"));
        assert!(out.ends_with("</details>\n\n"));
    }

    #[test]
    fn test_markers_inside_fence_untouched() {
        let body = "```md\n::: info\n:::\n```\n";
        let docs = [doc("a", body)];
        assert_eq!(expand(&docs, "a").unwrap(), body);
    }

    #[test]
    fn test_unclosed_container_closed_at_end() {
        let docs = [doc("a", "::: tip\nDangling")];
        assert!(expand(&docs, "a").unwrap().ends_with("Dangling\n</div>\n\n"));
    }

    #[test]
    fn test_include_other_document() {
        let docs = [
            doc("a", "::: info src=b\n:::\n"),
            doc("b", "Shared **text**\n"),
        ];
        let out = expand(&docs, "a").unwrap();
        assert!(out.contains("Shared **text**\n"));
    }

    #[test]
    fn test_nested_include() {
        let docs = [
            doc("a", "::: info src=b\n:::\n"),
            doc("b", "::: details src=c\n:::\n"),
            doc("c", "Leaf\n"),
        ];
        let out = expand(&docs, "a").unwrap();
        assert!(out.contains("<details"));
        assert!(out.contains("Leaf"));
    }

    #[test]
    fn test_self_inclusion_is_fatal() {
        let docs = [doc("a", "::: info src=a\n:::\n")];
        let err = expand(&docs, "a").unwrap_err();
        assert!(matches!(
            err,
            RenderError::CircularInclusion { ref chain } if chain == &["a", "a"]
        ));
    }

    #[test]
    fn test_indirect_cycle_is_fatal() {
        let docs = [
            doc("a", "::: info src=b\n:::\n"),
            doc("b", "::: info src=a\n:::\n"),
        ];
        let err = expand(&docs, "a").unwrap_err();
        assert_eq!(err.to_string(), "circular inclusion: a -> b -> a");
    }

    #[test]
    fn test_same_document_twice_is_not_a_cycle() {
        let docs = [
            doc("a", "::: info src=b\n:::\n::: tip src=b\n:::\n"),
            doc("b", "Shared\n"),
        ];
        let out = expand(&docs, "a").unwrap();
        assert_eq!(out.matches("Shared").count(), 2);
    }

    #[test]
    fn test_unknown_container_soft_error_recovered() {
        let docs = [doc("a", "::: fancy\nBody\n:::\nAfter\n")];
        let mut seen = Vec::new();
        let mut handler: SoftErrorHandler<'_> = Box::new(|err| {
            seen.push(err.to_string());
            Ok("<!-- unknown -->".to_owned())
        });
        let out = ContainerExpander::new(&docs, &mut handler)
            .expand(&docs[0].body, &mut vec!["a".to_owned()])
            .unwrap();
        drop(handler);
        assert_eq!(out, "<!-- unknown -->\nBody\nAfter\n");
        assert_eq!(seen, vec!["a: unknown container \"fancy\""]);
    }

    #[test]
    fn test_unknown_document_reraised() {
        let docs = [doc("a", "::: info src=missing\n:::\n")];
        let err = expand(&docs, "a").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Soft(SoftError::UnknownDocument { .. })
        ));
    }
}
