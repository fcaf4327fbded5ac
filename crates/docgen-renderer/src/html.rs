//! HTML fragments emitted by the renderer.

use std::fmt::Write;

use pulldown_cmark::BlockQuoteKind;

use crate::example::ExampleResult;
use crate::state::escape_html;

/// Tag hiding the source panel of a runnable example.
const NO_MARKUP_TAG: &str = "nomarkup";

pub(crate) fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
    match lang {
        Some(lang) => write!(
            out,
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            escape_html(lang),
            escape_html(content)
        )
        .unwrap(),
        None => write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap(),
    }
}

/// Markup for a generated example.
///
/// Runtime examples get a live preview next to their source; everything
/// else is an inert code sample.
pub(crate) fn example(result: &ExampleResult, out: &mut String) {
    if !result.runtime {
        code_block(Some(&result.language), &result.source, out);
        return;
    }

    out.push_str(r#"<div class="code-preview">"#);
    write!(
        out,
        r#"<div class="code-preview__preview">{}</div>"#,
        result.markup
    )
    .unwrap();
    if !result.tags.iter().any(|tag| tag == NO_MARKUP_TAG) {
        for comment in &result.comments {
            write!(
                out,
                r#"<p class="code-preview__comment">{}</p>"#,
                escape_html(comment)
            )
            .unwrap();
        }
        write!(
            out,
            r#"<pre class="code-preview__source"><code class="language-{}">{}</code></pre>"#,
            escape_html(&result.language),
            escape_html(&result.source)
        )
        .unwrap();
    }
    out.push_str("</div>");
}

pub(crate) fn image(src: &str, alt: &str, title: &str, out: &mut String) {
    let title_attr = if title.is_empty() {
        String::new()
    } else {
        format!(r#" title="{}""#, escape_html(title))
    };
    write!(
        out,
        r#"<img src="{}"{title_attr} alt="{}">"#,
        escape_html(src),
        escape_html(alt)
    )
    .unwrap();
}

/// Opening tag for a GitHub-style alert, rendered as a message box.
pub(crate) fn alert_start(kind: BlockQuoteKind, out: &mut String) {
    let variant = match kind {
        BlockQuoteKind::Note | BlockQuoteKind::Important => "info",
        BlockQuoteKind::Tip => "tip",
        BlockQuoteKind::Warning => "warning",
        BlockQuoteKind::Caution => "danger",
    };
    write!(
        out,
        r#"<div class="message-box message-box--{variant}">"#
    )
    .unwrap();
}
