//! Inline tag post pass.
//!
//! Resolves `{@link target}` and `{@link target label}` in rendered HTML
//! once all block-level rendering is done. Targets are document ids, names,
//! `id#anchor`, or `#anchor` for a heading of the page itself. Tags inside
//! `<code>` and `<pre>` elements are left as written.

use std::fmt::Write;

use crate::document::Document;
use crate::env::RenderEnv;
use crate::error::{SoftError, SoftErrorHandler};
use crate::state::{TocEntry, escape_html};
use crate::util::relative_path;

/// Elements whose content is never scanned for tags.
const VERBATIM: &[(&str, &str)] = &[("<pre", "</pre>"), ("<code", "</code>")];

pub(crate) struct InlineTagResolver<'r, 'h> {
    pub docs: &'r [Document],
    pub env: &'r RenderEnv,
    pub toc: &'r [TocEntry],
    pub document: &'r str,
    pub handler: &'r mut SoftErrorHandler<'h>,
}

impl InlineTagResolver<'_, '_> {
    pub(crate) fn process(&mut self, html: &str) -> Result<String, SoftError> {
        if !html.contains("{@") {
            return Ok(html.to_owned());
        }

        let mut output = String::with_capacity(html.len());
        let mut rest = html;

        while let Some(tag_start) = rest.find("{@") {
            if let Some((start, close)) = next_verbatim(rest).filter(|(pos, _)| *pos < tag_start) {
                let end = rest[start..]
                    .find(close)
                    .map_or(rest.len(), |pos| start + pos + close.len());
                output.push_str(&rest[..end]);
                rest = &rest[end..];
                continue;
            }

            output.push_str(&rest[..tag_start]);
            let after = &rest[tag_start + 2..];
            let Some(tag_end) = after.find('}') else {
                output.push_str(&rest[tag_start..]);
                return Ok(output);
            };

            let inner = &after[..tag_end];
            match inner.split_once(char::is_whitespace) {
                Some(("link", args)) => {
                    let replacement = self.link(args.trim())?;
                    output.push_str(&replacement);
                }
                _ => output.push_str(&rest[tag_start..tag_start + 2 + tag_end + 1]),
            }
            rest = &after[tag_end + 1..];
        }

        output.push_str(rest);
        Ok(output)
    }

    fn link(&mut self, args: &str) -> Result<String, SoftError> {
        let (target, label) = match args.split_once(char::is_whitespace) {
            Some((target, label)) => (target, Some(label.trim())),
            None => (args, None),
        };

        match self.resolve(target) {
            Some((href, default_label)) => {
                let label = label.map_or_else(|| escape_html(&default_label), str::to_owned);
                let mut html = String::new();
                write!(html, r#"<a href="{}">{label}</a>"#, escape_html(&href)).unwrap();
                Ok(html)
            }
            None => (self.handler)(SoftError::UnresolvedReference {
                reference: target.to_owned(),
                document: self.document.to_owned(),
            }),
        }
    }

    /// Resolve a target to (href, default label).
    fn resolve(&self, target: &str) -> Option<(String, String)> {
        if let Some(anchor) = target.strip_prefix('#') {
            let title = match self.toc.iter().find(|entry| entry.id == anchor) {
                Some(entry) => entry.title.clone(),
                None if self.env.has_id(anchor) => anchor.to_owned(),
                None => return None,
            };
            return Some((target.to_owned(), title));
        }

        let (reference, anchor) = match target.split_once('#') {
            Some((reference, anchor)) => (reference, Some(anchor)),
            None => (target, None),
        };

        let doc = self
            .docs
            .iter()
            .find(|doc| doc.id == reference)
            .or_else(|| self.docs.iter().find(|doc| doc.name == reference))?;
        let doc_path = doc.file_info.output_path()?;

        let mut href = relative_path(&self.env.output_path(), &doc_path);
        if let Some(anchor) = anchor {
            href.push('#');
            href.push_str(anchor);
        }
        Some((href, doc.title().to_owned()))
    }
}

/// Position and closing tag of the next verbatim element.
fn next_verbatim(html: &str) -> Option<(usize, &'static str)> {
    VERBATIM
        .iter()
        .filter_map(|(open, close)| {
            html.match_indices(open)
                .find(|(pos, _)| {
                    html[pos + open.len()..]
                        .chars()
                        .next()
                        .is_some_and(|c| c == '>' || c.is_whitespace())
                })
                .map(|(pos, _)| (pos, *close))
        })
        .min_by_key(|(pos, _)| *pos)
}
