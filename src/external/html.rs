// Loose HTML helpers for the rate tables we scrape. Pages are not parsed into a
// DOM; rows and cells are sliced out with non-nested tag patterns, which holds
// for the flat tables these sites render.

use std::sync::LazyLock;

use regex::Regex;

static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").expect("row pattern"));

static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td\s*>").expect("cell pattern"));

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h[1-4]\b[^>]*>(.*?)</h[1-4]\s*>").expect("heading pattern")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// A heading and the markup that follows it, up to the next heading.
#[derive(Debug)]
pub struct Section<'a> {
    pub heading: String,
    pub body: &'a str,
}

/// Inner HTML of every `<tr>` in `html`, in document order.
pub fn rows(html: &str) -> Vec<&str> {
    ROW_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Plain text of every `<td>` in one row.
pub fn cells(row: &str) -> Vec<String> {
    CELL_RE
        .captures_iter(row)
        .filter_map(|cap| cap.get(1))
        .map(|m| text_of(m.as_str()))
        .collect()
}

/// Split a page at its `<h1>`..`<h4>` headings.
pub fn sections(html: &str) -> Vec<Section<'_>> {
    let headings: Vec<_> = HEADING_RE.captures_iter(html).collect();
    let mut out = Vec::with_capacity(headings.len());

    for (i, cap) in headings.iter().enumerate() {
        let (Some(whole), Some(inner)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(html.len());

        out.push(Section {
            heading: text_of(inner.as_str()),
            body: &html[whole.end()..end],
        });
    }

    out
}

/// Tags removed, entities decoded, whitespace collapsed.
pub fn text_of(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    normalize_ws(&normalize_entities(&stripped))
}

/// Decode the handful of entities these pages use around prices.
pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#8377;", "₹")
        .replace("&#x20B9;", "₹")
        .replace("&#x20b9;", "₹")
        .replace("&amp;", "&")
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
