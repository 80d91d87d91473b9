//! Server-side HTML: page shell, navigation and notices

use crate::pages::Page;
use serde_json::Value;

const PLOTLY_SRC: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; display: flex; min-height: 100vh; }
nav { width: 16rem; padding: 1rem; background: #f0f2f6; }
nav a { display: block; padding: .35rem 0; color: #262730; text-decoration: none; }
nav a.active { font-weight: 600; }
main { flex: 1; padding: 1.5rem 2.5rem; max-width: 90rem; }
.notice { padding: .75rem 1rem; border-radius: .4rem; margin: 1rem 0; }
.notice.error { background: #ffe2e2; color: #7d1a1a; }
.notice.warning { background: #fff6d9; color: #6b4e00; }
.notice.info { background: #e2efff; color: #1a3c7d; }
.metric { font-size: 2.2rem; font-weight: 600; }
.metric-label { color: #555; }
iframe.map { width: 100%; border: 0; }
figure img { max-width: 100%; }
"#;

/// Escape text for inclusion in HTML content or attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Warning,
    Info,
}

pub fn notice(kind: NoticeKind, message: &str) -> String {
    let class = match kind {
        NoticeKind::Error => "error",
        NoticeKind::Warning => "warning",
        NoticeKind::Info => "info",
    };
    format!(r#"<div class="notice {class}">{}</div>"#, escape(message))
}

/// Embed a Plotly figure (`{"data": [...], "layout": {...}}`)
pub fn figure(id: &str, fig: &Value) -> String {
    // Keep "</script>" inside strings from closing the tag.
    let json = fig.to_string().replace('<', "\\u003c");
    format!(
        r#"<div id="{id}"></div>
<script>(function () {{ const fig = {json}; Plotly.newPlot("{id}", fig.data, fig.layout, {{responsive: true}}); }})();</script>"#
    )
}

fn nav(active: Option<Page>) -> String {
    let mut links = String::from(r#"<a href="/">Overview</a>"#);
    for page in Page::ALL {
        let class = if Some(page) == active { " class=\"active\"" } else { "" };
        links.push_str(&format!(
            r#"<a href="/pages/{}"{class}>{}</a>"#,
            page.slug(),
            escape(page.title())
        ));
    }
    links
}

/// Wrap page content in the document shell with the navigation sidebar.
///
/// `sidebar_extra` is appended below the page links (e.g. filters).
pub fn shell(title: &str, active: Option<Page>, sidebar_extra: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<script src="{PLOTLY_SRC}"></script>
<style>{STYLE}</style>
</head>
<body>
<nav>
<h3>Navigation</h3>
{links}
{sidebar_extra}
</nav>
<main>
{content}
</main>
</body>
</html>
"#,
        title = escape(title),
        links = nav(active),
    )
}
