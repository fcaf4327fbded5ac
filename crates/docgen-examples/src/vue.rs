//! Code generation for Vue single-file component examples.
//!
//! The component is split into its `<template>`, `<script>` and `<style>`
//! blocks and turned into a self-mounting ES module. Templates are compiled
//! at runtime by Vue, so the generated module only needs `vue` (kept
//! external by the bundler) and the optional setup module.

use std::fmt::Write;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExampleError;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<script(?P<attrs>[^>]*)>(?P<body>.*?)</script>").unwrap());

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<style[^>]*>(?P<body>.*?)</style>").unwrap());

static EXPORT_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*export[ \t]+default[ \t]+").unwrap());

static LANG_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"lang\s*=\s*["']?(?P<lang>[A-Za-z]+)"#).unwrap());

/// Input to the Vue generator.
#[derive(Debug)]
pub struct VueOptions<'a> {
    /// Example filename, used in diagnostics.
    pub filename: &'a str,
    /// Slug derived from the filename.
    pub slug: &'a str,
    /// Fingerprint of the normalized source.
    pub fingerprint: &'a str,
    /// Component source.
    pub code: &'a str,
    /// Module exporting `setup({ rootComponent, selector })`.
    pub setup_path: Option<&'a Path>,
}

/// Output of the Vue generator.
#[derive(Debug, PartialEq, Eq)]
pub struct GeneratedCode {
    /// Mount token shared by every placeholder of this example.
    pub mount_id: String,
    /// Placeholder element the bundle mounts into.
    pub markup: String,
    /// Generated ES module.
    pub sourcecode: String,
    /// Output bundle name.
    pub output: String,
}

/// Parts of a single-file component.
#[derive(Debug, Default, PartialEq, Eq)]
struct SfcParts<'a> {
    template: Option<&'a str>,
    script: Option<(&'a str, &'a str)>,
    styles: Vec<&'a str>,
}

fn parse_sfc(code: &str) -> SfcParts<'_> {
    let mut parts = SfcParts::default();

    // Outermost template: first opening tag to last closing tag.
    let mut outside = code.to_owned();
    if let Some(start) = code.find("<template") {
        let open_end = code[start..].find('>').map(|pos| start + pos + 1);
        let close = code.rfind("</template>");
        if let (Some(open_end), Some(close)) = (open_end, close) {
            if close >= open_end {
                parts.template = Some(&code[open_end..close]);
                outside.replace_range(start..close + "</template>".len(), "");
            }
        }
    }

    // Blocks outside the template are located in `outside` and mapped back
    // onto `code` so the parts borrow from the input.
    if let Some(caps) = SCRIPT_BLOCK.captures(&outside) {
        let attrs = caps.name("attrs").map_or("", |m| m.as_str());
        let body = caps.name("body").map_or("", |m| m.as_str());
        parts.script = Some((find_in(code, attrs), find_in(code, body)));
    }
    for caps in STYLE_BLOCK.captures_iter(&outside) {
        if let Some(body) = caps.name("body") {
            parts.styles.push(find_in(code, body.as_str()));
        }
    }

    parts
}

/// Locate `needle` in `haystack` and return the borrowed slice.
fn find_in<'a>(haystack: &'a str, needle: &str) -> &'a str {
    haystack
        .find(needle)
        .map_or("", |pos| &haystack[pos..pos + needle.len()])
}

/// Generate markup and module source for a Vue example.
pub fn generate_vue(options: &VueOptions<'_>) -> Result<GeneratedCode, ExampleError> {
    let parts = parse_sfc(options.code);
    let mount_id = format!("example-{}", options.fingerprint);
    let invalid = |message: &str| ExampleError::InvalidComponent {
        filename: options.filename.to_owned(),
        message: message.to_owned(),
    };

    let component = match parts.script {
        Some((attrs, _)) if attrs.split_whitespace().any(|attr| attr == "setup") => {
            return Err(invalid("<script setup> is not supported in examples"));
        }
        Some((attrs, _))
            if LANG_ATTR
                .captures(attrs)
                .is_some_and(|caps| !matches!(&caps["lang"], "js" | "javascript")) =>
        {
            return Err(invalid("only JavaScript <script> blocks are supported"));
        }
        Some((_, body)) => {
            if !EXPORT_DEFAULT.is_match(body) {
                return Err(invalid("<script> block has no default export"));
            }
            EXPORT_DEFAULT
                .replace(body.trim(), "const __component = ")
                .into_owned()
        }
        None => "const __component = {};".to_owned(),
    };

    let template = parts.template.map(str::trim).unwrap_or_default();
    let styles: Vec<&str> = parts.styles.iter().map(|s| s.trim()).collect();

    let mut code = String::new();
    writeln!(code, "/* {} */", options.slug).unwrap();
    match options.setup_path {
        Some(path) => writeln!(
            code,
            "import {{ setup }} from {};",
            js_string(&path.to_string_lossy().replace('\\', "/"))
        )
        .unwrap(),
        None => code.push_str("import { createApp } from \"vue\";\n"),
    }
    code.push('\n');
    code.push_str(&component);
    code.push_str("\n\n");

    if !styles.is_empty() {
        writeln!(
            code,
            "const __style = document.createElement(\"style\");\n__style.textContent = {};\ndocument.head.appendChild(__style);\n",
            js_string(&styles.join("\n"))
        )
        .unwrap();
    }

    writeln!(
        code,
        "const rootComponent = {{ ...__component, template: {} }};",
        js_string(template)
    )
    .unwrap();
    // The same example may be placed several times on a page; mount all of them.
    let selector = js_string(&format!("[data-example=\"{mount_id}\"]"));
    writeln!(code, "for (const el of document.querySelectorAll({selector})) {{").unwrap();
    if options.setup_path.is_some() {
        code.push_str("  setup({ rootComponent, selector: `#${el.id}` });\n");
    } else {
        code.push_str("  createApp(rootComponent).mount(el);\n");
    }
    code.push_str("}\n");

    Ok(GeneratedCode {
        markup: mount_markup(&mount_id, 0),
        sourcecode: code,
        output: format!("{mount_id}.js"),
        mount_id,
    })
}

/// Placeholder for the `occurrence`th use of `mount_id` on one page.
///
/// Element ids stay unique; `data-example` is what the bundle looks for.
pub fn mount_markup(mount_id: &str, occurrence: usize) -> String {
    if occurrence == 0 {
        format!(r#"<div id="{mount_id}" data-example="{mount_id}"></div>"#)
    } else {
        format!(r#"<div id="{mount_id}-{occurrence}" data-example="{mount_id}"></div>"#)
    }
}

/// Encode a string as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
