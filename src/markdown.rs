//! Minimal markdown to HTML conversion for file previews.
//!
//! This is a fixed sequence of substitutions, not a parser. The order of the
//! steps matters, and constructs such as nested emphasis or list items that
//! span several lines come out wrong. The output is always passed through
//! [`sanitize_html`] before it is returned.

use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

const MAX_LINK_TEXT: usize = 500;
const MAX_LINK_TARGET: usize = 2000;

const ALLOWED_TAGS: &[&str] = &[
    "a", "blockquote", "br", "code", "em", "h1", "h2", "h3", "hr", "img", "li", "p", "pre",
    "strong",
];
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

struct Patterns {
    h3: Regex,
    h2: Regex,
    h1: Regex,
    bold_italic: Regex,
    bold: Regex,
    italic: Regex,
    code_block: Regex,
    inline_code: Regex,
    image: Regex,
    link: Regex,
    blockquote: Regex,
    rule: Regex,
    star_item: Regex,
    dash_item: Regex,
    tag: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("valid markdown pattern");
        Patterns {
            h3: re(r"(?mi)^### (.*)$"),
            h2: re(r"(?mi)^## (.*)$"),
            h1: re(r"(?mi)^# (.*)$"),
            bold_italic: re(r"\*\*\*(.*?)\*\*\*"),
            bold: re(r"\*\*(.*?)\*\*"),
            italic: re(r"\*(.*?)\*"),
            code_block: re(r"```(\w*)\n([\s\S]*?)```"),
            inline_code: re(r"`([^`]+)`"),
            image: re(r"!\[([^\]]*)\]\(([^)\s]+)\)"),
            link: re(r"\[([^\]]+)\]\(([^)\s]+)\)"),
            blockquote: re(r"(?mi)^&gt; (.*)$"),
            rule: re(r"(?m)^---$"),
            star_item: re(r"(?m)^\* (.*)$"),
            dash_item: re(r"(?m)^- (.*)$"),
            tag: re(r"<[^>]*>"),
        }
    })
}

/// Convert markdown to sanitized HTML.
pub fn render_markdown(markdown: &str) -> String {
    sanitize_html(&markdown_to_html(markdown))
}

/// The raw substitution pipeline, before sanitization.
pub fn markdown_to_html(markdown: &str) -> String {
    let p = patterns();

    let html = escape_html(markdown);

    let html = p.h3.replace_all(&html, r#"<h3 class="text-lg font-semibold mt-6 mb-2">$1</h3>"#);
    let html = p.h2.replace_all(&html, r#"<h2 class="text-xl font-semibold mt-8 mb-3">$1</h2>"#);
    let html = p.h1.replace_all(&html, r#"<h1 class="text-2xl font-bold mt-8 mb-4">$1</h1>"#);

    let html = p.bold_italic.replace_all(&html, "<strong><em>$1</em></strong>");
    let html = p.bold.replace_all(&html, "<strong>$1</strong>");
    let html = p.italic.replace_all(&html, "<em>$1</em>");

    let html = p.code_block.replace_all(
        &html,
        r#"<pre class="bg-gray-100 dark:bg-gray-800 rounded-lg p-4 overflow-x-auto my-4"><code>$2</code></pre>"#,
    );
    let html = p.inline_code.replace_all(
        &html,
        r#"<code class="bg-gray-100 dark:bg-gray-800 px-1.5 py-0.5 rounded text-sm">$1</code>"#,
    );

    // Images first, otherwise the link rule would swallow them.
    let html = p.image.replace_all(&html, |caps: &Captures| {
        let (alt, src) = (&caps[1], &caps[2]);
        if alt.chars().count() > MAX_LINK_TEXT || src.chars().count() > MAX_LINK_TARGET {
            return caps[0].to_string();
        }
        format!(
            r#"<img src="{}" alt="{}" class="max-w-full rounded-lg my-4" />"#,
            attribute_value(src),
            attribute_value(alt)
        )
    });
    let html = p.link.replace_all(&html, |caps: &Captures| {
        let (text, href) = (&caps[1], &caps[2]);
        if text.chars().count() > MAX_LINK_TEXT || href.chars().count() > MAX_LINK_TARGET {
            return caps[0].to_string();
        }
        format!(
            r#"<a href="{}" class="text-primary-600 dark:text-primary-400 hover:underline" target="_blank" rel="noopener">{}</a>"#,
            attribute_value(href),
            text
        )
    });

    let html = p.blockquote.replace_all(
        &html,
        r#"<blockquote class="border-l-4 border-gray-300 dark:border-gray-600 pl-4 italic my-4">$1</blockquote>"#,
    );
    let html = p.rule.replace_all(&html, r#"<hr class="my-8 border-gray-200 dark:border-gray-700" />"#);
    let html = p.star_item.replace_all(&html, r#"<li class="ml-4">$1</li>"#);
    let html = p.dash_item.replace_all(&html, r#"<li class="ml-4">$1</li>"#);

    let html = html
        .replace("\n\n", r#"</p><p class="my-4">"#)
        .replace('\n', "<br />");

    format!(r#"<p class="my-4">{}</p>"#, html)
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Earlier steps may have spliced tags into a link or image target; those
/// are dropped so attribute values only ever carry the author's text.
fn attribute_value(value: &str) -> String {
    patterns().tag.replace_all(value, "").replace('"', "&quot;")
}

/// Restrict HTML to the tags and attributes the renderer produces.
///
/// Unknown tags are removed (their text is kept), unknown attributes are
/// dropped, and `href`/`src` values with a scheme other than http, https or
/// mailto are removed. Relative references pass through.
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = ALLOWED_TAGS.iter().copied().collect();
    let tag_attributes = HashMap::from([
        ("a", HashSet::from(["href", "target"])),
        ("img", HashSet::from(["src", "alt"])),
    ]);

    ammonia::Builder::default()
        .tags(tags)
        .generic_attributes(HashSet::from(["class"]))
        .tag_attributes(tag_attributes)
        .url_schemes(SAFE_SCHEMES.iter().copied().collect())
        .link_rel(Some("noopener"))
        .clean(html)
        .to_string()
}
