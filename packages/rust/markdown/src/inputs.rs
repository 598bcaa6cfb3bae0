//! Field extraction for one input item block.
//!
//! A typical block (inside its most current variant):
//!
//! ```text
//! **`command`** - **Command**<br>
//! `string`. Required. Allowed values: `build`, `push` (nuget push). Default value: `build`.<br>
//! <!-- :::editable-content name="helpMarkDown"::: -->
//! The dotnet command to run.
//! <!-- :::editable-content-end::: -->
//! ```

use std::sync::LazyLock;

use regex::Regex;
use taskdocs_shared::{DEFAULT_INPUT_TYPE, TaskInput};

use crate::regions;

/// Type identifiers recognized in inline code. `connectedService:*` is
/// matched by prefix.
pub const KNOWN_INPUT_TYPES: &[&str] = &[
    "string",
    "boolean",
    "filePath",
    "multiLine",
    "pickList",
    "radio",
    "int",
    "secureFile",
    "identities",
];

const CONNECTED_SERVICE_PREFIX: &str = "connectedService:";

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// `**`name`** - **Label**`; group 1 name, group 2 label.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*`([^`]+)`\*\*\s*-\s*\*\*([^*]+)\*\*").expect("label regex")
});

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("inline code regex"));

/// `Required` opening a sentence: preceded by a terminator or line start.
static REQUIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\.)[ \t]*Required\b").expect("required regex"));

static DEFAULT_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Default value:\s*`([^`]*)`").expect("default value regex"));

static LOOSE_DEFAULT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Default:\s*([^.\n]+)\.").expect("loose default regex"));

/// `Allowed values: `a`, `b` (note), `c``.
static ALLOWED_VALUES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Allowed values:((?:\s*`[^`\n]*`(?:\s*\([^)\n]*\))?\s*,?)+)")
        .expect("allowed values regex")
});

/// `'a' | 'b' | 'c'`.
static PIPE_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'[^'\n]*'(?:\s*\|\s*'[^'\n]*')+").expect("pipe list regex")
});

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^'\n]*)'").expect("quoted regex"));

/// `[Input alias](link): `a`, `b`` or plain `Input alias: `a``.
static ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[?Input alias(?:es)?\]?(?:\([^)\n]*\))?:((?:\s*`[^`\n]+`\s*,?)+)")
        .expect("alias regex")
});

// ---------------------------------------------------------------------------
// Item parsing
// ---------------------------------------------------------------------------

/// Build a [`TaskInput`] from a named item block.
pub(crate) fn parse_input_item(name: &str, block: &str) -> TaskInput {
    let body = regions::first_variant(block);

    TaskInput {
        name: name.to_string(),
        label: parse_label(name, &body).unwrap_or_else(|| name.to_string()),
        input_type: parse_type(&body).unwrap_or_else(|| DEFAULT_INPUT_TYPE.to_string()),
        required: is_required(&body),
        default_value: parse_default_value(&body),
        allowed_values: parse_allowed_values(&body),
        aliases: parse_aliases(&body),
        help_text: parse_help_text(&body),
    }
}

fn parse_label(name: &str, body: &str) -> Option<String> {
    LABEL_RE
        .captures_iter(body)
        .find(|caps| &caps[1] == name)
        .map(|caps| caps[2].trim().to_string())
        .filter(|label| !label.is_empty())
}

fn is_known_type(token: &str) -> bool {
    KNOWN_INPUT_TYPES.contains(&token) || token.starts_with(CONNECTED_SERVICE_PREFIX)
}

fn parse_type(body: &str) -> Option<String> {
    INLINE_CODE_RE
        .captures_iter(body)
        .map(|caps| caps[1].trim().to_string())
        .find(|token| is_known_type(token))
}

fn is_required(body: &str) -> bool {
    REQUIRED_RE.is_match(body)
}

fn parse_default_value(body: &str) -> Option<String> {
    if let Some(caps) = DEFAULT_VALUE_RE.captures(body) {
        return non_empty(&caps[1]);
    }
    LOOSE_DEFAULT_RE
        .captures(body)
        .and_then(|caps| non_empty(&caps[1]))
}

fn parse_allowed_values(body: &str) -> Option<Vec<String>> {
    if let Some(caps) = ALLOWED_VALUES_RE.captures(body) {
        let values = backtick_tokens(&caps[1]);
        if !values.is_empty() {
            return Some(values);
        }
    }

    let list = PIPE_LIST_RE.find(body)?;
    let values: Vec<String> = QUOTED_RE
        .captures_iter(list.as_str())
        .map(|caps| caps[1].trim().to_string())
        .collect();
    (!values.is_empty()).then_some(values)
}

fn parse_aliases(body: &str) -> Option<Vec<String>> {
    let caps = ALIAS_RE.captures(body)?;
    let aliases = backtick_tokens(&caps[1]);
    (!aliases.is_empty()).then_some(aliases)
}

fn parse_help_text(body: &str) -> Option<String> {
    regions::editable_content(body).and_then(non_empty)
}

fn backtick_tokens(text: &str) -> Vec<String> {
    INLINE_CODE_RE
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMAND_BLOCK: &str = r#"
:::moniker range="<=azure-pipelines"

**`command`** - **Command**<br>
`string`. Required. Allowed values: `build`, `push` (nuget push), `pack`. Default value: `build`.<br>
<!-- :::editable-content name="helpMarkDown"::: -->
The dotnet command to run.
<!-- :::editable-content-end::: -->
<br>

:::moniker-end
"#;

    #[test]
    fn parses_full_item() {
        let input = parse_input_item("command", COMMAND_BLOCK);
        assert_eq!(input.name, "command");
        assert_eq!(input.label, "Command");
        assert_eq!(input.input_type, "string");
        assert!(input.required);
        assert_eq!(input.default_value.as_deref(), Some("build"));
        assert_eq!(
            input.allowed_values,
            Some(vec!["build".into(), "push".into(), "pack".into()])
        );
        assert!(input.aliases.is_none());
        assert_eq!(input.help_text.as_deref(), Some("The dotnet command to run."));
    }

    #[test]
    fn missing_label_defaults_to_name() {
        let input = parse_input_item("path", "`filePath`. Optional.");
        assert_eq!(input.label, "path");
        assert_eq!(input.input_type, "filePath");
        assert!(!input.required);
    }

    #[test]
    fn label_must_belong_to_this_item() {
        let input = parse_input_item("b", "**`a`** - **Label A**<br>`string`.");
        assert_eq!(input.label, "b");
    }

    #[test]
    fn unknown_type_defaults_to_string() {
        let input = parse_input_item("x", "**`x`** - **X**<br>`mystery`. Optional.");
        assert_eq!(input.input_type, DEFAULT_INPUT_TYPE);
    }

    #[test]
    fn connected_service_types_are_recognized() {
        let input = parse_input_item(
            "azureSubscription",
            "**`azureSubscription`** - **Azure subscription**<br>`connectedService:AzureRM`. Required.",
        );
        assert_eq!(input.input_type, "connectedService:AzureRM");
        assert!(input.required);
    }

    #[test]
    fn type_is_first_known_inline_code_token() {
        let input = parse_input_item(
            "flag",
            "**`flag`** - **Flag**<br>`boolean`. Optional. See `string` values.",
        );
        assert_eq!(input.input_type, "boolean");
    }

    #[test]
    fn required_follows_sentence_terminator() {
        assert!(is_required("`string`. Required. Default value: `x`."));
        assert!(is_required("`string`. Required<br>"));
        assert!(is_required("`string`. Required"));
        assert!(is_required("`string`. Required when `command = custom`."));
        assert!(!is_required("`string`. Optional. Use when `x = y`."));
        assert!(!is_required("This is NotRequired. at all"));
    }

    #[test]
    fn conditionally_required_input_is_required() {
        let input = parse_input_item(
            "projects",
            "**`projects`** - **Projects**<br>\n`string`. Required when `command = build`.<br>\n",
        );
        assert_eq!(input.input_type, "string");
        assert!(input.required);
    }

    #[test]
    fn explicit_default_beats_loose_default() {
        let body = "`string`. Optional. Default: loose. Default value: `explicit`.";
        assert_eq!(parse_default_value(body).as_deref(), Some("explicit"));
    }

    #[test]
    fn loose_default_is_fallback() {
        assert_eq!(
            parse_default_value("# boolean. Optional. Default: true.").as_deref(),
            Some("true")
        );
        assert!(parse_default_value("`string`. Optional.").is_none());
        assert!(parse_default_value("Default value: ``.").is_none());
    }

    #[test]
    fn allowed_values_from_pipe_list() {
        let body = "command: 'build' # 'build' | 'push' | 'pack'. Required.";
        assert_eq!(
            parse_allowed_values(body),
            Some(vec!["build".into(), "push".into(), "pack".into()])
        );
        assert!(parse_allowed_values("`string`. Optional.").is_none());
    }

    #[test]
    fn backtick_list_is_preferred_over_pipe_list() {
        let body = "Allowed values: `a`, `b`. Comment: 'x' | 'y'";
        assert_eq!(parse_allowed_values(body), Some(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn aliases_follow_input_alias_marker() {
        let linked = "[Input alias](index.md#input-aliases): `cwd`. `string`.";
        assert_eq!(parse_aliases(linked), Some(vec!["cwd".into()]));

        let plain = "Input alias: `a`, `b`. `string`.";
        assert_eq!(parse_aliases(plain), Some(vec!["a".into(), "b".into()]));

        assert!(parse_aliases("`string`. Optional.").is_none());
    }

    #[test]
    fn blank_help_text_is_omitted() {
        let body = "`string`.\n<!-- :::editable-content name=\"helpMarkDown\"::: -->\n   \n<!-- :::editable-content-end::: -->";
        let input = parse_input_item("p", body);
        assert!(input.help_text.is_none());
    }

    #[test]
    fn only_most_current_variant_is_read() {
        let block = ":::moniker range=\">=v2\"\n**`mode`** - **Mode**<br>`pickList`. Optional.\n:::moniker-end\n:::moniker range=\"=v1\"\n**`mode`** - **Old mode**<br>`string`. Required.\n:::moniker-end\n";
        let input = parse_input_item("mode", block);
        assert_eq!(input.label, "Mode");
        assert_eq!(input.input_type, "pickList");
        assert!(!input.required);
    }
}
