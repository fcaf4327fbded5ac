//! Search index generation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::context::{Asset, ProcessorContext};
use crate::error::PipelineError;
use crate::processor::{Processor, RENDER};

/// File name of the generated index.
pub const SEARCH_DATA: &str = "search-data.json";

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)\b.*?</(script|style)>").unwrap());

#[derive(Debug, Serialize, PartialEq, Eq)]
struct SearchEntry<'a> {
    title: &'a str,
    url: &'a str,
    terms: String,
}

/// Writes `search-data.json` with the text of every rendered page.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchProcessor;

impl Processor for SearchProcessor {
    fn name(&self) -> &str {
        "searchProcessor"
    }

    fn after(&self) -> Option<&str> {
        Some(RENDER)
    }

    fn handle(&self, ctx: &mut ProcessorContext) -> Result<(), PipelineError> {
        let entries: Vec<SearchEntry<'_>> = ctx
            .rendered
            .iter()
            .map(|page| SearchEntry {
                title: &page.title,
                url: &page.output_path,
                terms: extract_terms(&page.content),
            })
            .collect();
        let json = serde_json::to_string(&entries)?;
        info!(pages = entries.len(), "Generated search index");
        ctx.add_asset(Asset::new(SEARCH_DATA, json));
        Ok(())
    }
}

/// Visible text of an HTML fragment with whitespace collapsed.
fn extract_terms(html: &str) -> String {
    let without_code = SCRIPT.replace_all(html, " ");
    let text = TAG.replace_all(&without_code, " ");
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
