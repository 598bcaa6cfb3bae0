//! Structural helpers for the task document micro-syntax.
//!
//! The sentinel formats below are a pinned contract with the upstream
//! documentation project. A change there is a format version change and must
//! be reflected in `fixtures/markdown/` first.
//!
//! - region:    `<!-- :::NAME::: -->` … `<!-- :::NAME-end::: -->`
//! - item:      `<!-- :::item name="X"::: -->` … `<!-- :::item-end::: -->`
//! - editable:  `<!-- :::editable-content name="X"::: -->` … `<!-- :::editable-content-end::: -->`
//! - variant:   `:::moniker range="…"` … `:::moniker-end`

use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

static EDITABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--\s*:::editable-content(?:\s+name="[^"]*")?\s*:::\s*-->(.*?)<!--\s*:::editable-content-end:::\s*-->"#,
    )
    .expect("editable-content regex")
});

/// Item opener; group 1 is the name attribute when present.
static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!--\s*:::item(?:\s+name="([^"]*)")?\s*:::\s*-->"#).expect("item regex")
});

static ITEM_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*:::item-end:::\s*-->").expect("item-end regex")
});

static YAML_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:yaml|yml)[^\n]*\n(.*?)```").expect("yaml fence regex")
});

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+?)\s*$").expect("H1 regex"));

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

/// The leading `---` … `---` block, without its fences.
pub(crate) fn front_matter(md: &str) -> Option<&str> {
    let body = md.trim_start_matches('\u{feff}').trim_start();
    let rest = body.strip_prefix("---")?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

/// A top-level `key: value` field from front matter, unquoted.
pub(crate) fn front_matter_field(front_matter: &str, key: &str) -> Option<String> {
    front_matter.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        if k.trim() != key || line.starts_with(char::is_whitespace) {
            return None;
        }
        let value = unquote(v.trim());
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    value
}

/// The first `# Title` line of the document body.
pub(crate) fn h1_title(md: &str) -> Option<String> {
    H1_RE.captures(md).map(|caps| caps[1].to_string())
}

// ---------------------------------------------------------------------------
// Regions, variants, editable blocks
// ---------------------------------------------------------------------------

/// The text between `<!-- :::name::: -->` and `<!-- :::name-end::: -->`.
///
/// A region whose end marker is missing runs to the end of the document.
pub(crate) fn region<'a>(md: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<!-- :::{name}::: -->");
    let close = format!("<!-- :::{name}-end::: -->");

    let start = md.find(&open)? + open.len();
    let rest = &md[start..];
    match rest.find(&close) {
        Some(end) => Some(&rest[..end]),
        None => Some(rest),
    }
}

fn is_variant_open(line: &str) -> bool {
    line.trim_start().starts_with(":::moniker range")
}

fn is_variant_close(line: &str) -> bool {
    line.trim_start().starts_with(":::moniker-end")
}

/// Version-conditional variants inside `text`, most current first.
///
/// Text with no variant markers is a single variant.
pub(crate) fn variants(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in text.lines() {
        if is_variant_open(line) {
            // An unclosed variant ends where the next one opens.
            if let Some(lines) = current.take() {
                found.push(lines.join("\n"));
            }
            current = Some(Vec::new());
        } else if is_variant_close(line) {
            if let Some(lines) = current.take() {
                found.push(lines.join("\n"));
            }
        } else if let Some(lines) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some(lines) = current.take() {
        found.push(lines.join("\n"));
    }

    if found.is_empty() {
        vec![text.to_string()]
    } else {
        found
    }
}

/// The first variant of `text` (or all of it when there are none).
pub(crate) fn first_variant(text: &str) -> String {
    variants(text).into_iter().next().unwrap_or_default()
}

/// Inner text of the first editable-content block.
pub(crate) fn editable_content(text: &str) -> Option<&str> {
    EDITABLE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Remove `:::moniker range` / `:::moniker-end` marker lines.
pub(crate) fn strip_variant_markers(text: &str) -> String {
    text.lines()
        .filter(|line| !is_variant_open(line) && !is_variant_close(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop the first non-blank line if it is a markdown heading.
pub(crate) fn strip_leading_heading(text: &str) -> &str {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('#') {
        return trimmed;
    }
    match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => "",
    }
}

/// Body of the first fenced YAML code block.
pub(crate) fn fenced_yaml_block(text: &str) -> Option<String> {
    YAML_FENCE_RE
        .captures(text)
        .map(|caps| caps[1].trim_end().to_string())
        .filter(|code| !code.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// One item block: its name attribute (if any) and its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ItemBlock<'a> {
    pub name: Option<&'a str>,
    pub body: &'a str,
}

/// Split a region on item openers. Each body ends at the item's end marker,
/// the next opener, or the end of the region.
pub(crate) fn items(region: &str) -> Vec<ItemBlock<'_>> {
    let openers: Vec<_> = ITEM_RE.captures_iter(region).collect();
    let mut blocks = Vec::with_capacity(openers.len());

    for (i, caps) in openers.iter().enumerate() {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let next_start = openers
            .get(i + 1)
            .and_then(|c| c.get(0))
            .map_or(region.len(), |m| m.start());
        let mut body = &region[whole.end()..next_start];
        if let Some(end) = ITEM_END_RE.find(body) {
            body = &body[..end.start()];
        }

        let name = caps
            .get(1)
            .map(|m| m.as_str().trim())
            .filter(|n| !n.is_empty());
        blocks.push(ItemBlock { name, body });
    }

    blocks
}
