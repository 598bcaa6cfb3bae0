//! Conversion of API task definitions into [`TaskRecord`]s.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use taskdocs_shared::{DEFAULT_INPUT_TYPE, TaskCategory, TaskInput, TaskRecord};

use crate::definition::{TaskDefinition, TaskDefinitionInput};

/// Markdown link with an absolute http(s) target; group 1 is the URL.
static HELP_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]\((https?://[^)\s]+)\)").expect("help link regex")
});

/// Normalize one API definition into the shared record shape.
///
/// Output variables are not exposed by the listing endpoint and are left
/// empty. Deprecated definitions are converted like any other.
pub fn to_task_record(def: &TaskDefinition, public_docs_url: &Url) -> TaskRecord {
    let version = def.version.major.to_string();
    let inputs: Vec<TaskInput> = def.inputs.iter().map(to_task_input).collect();
    let syntax = synthesize_syntax(&def.name, def.version.major, &inputs);

    let display_name = if def.friendly_name.trim().is_empty() {
        def.name.clone()
    } else {
        def.friendly_name.trim().to_string()
    };

    TaskRecord {
        full_name: format!("{}@{}", def.name, version),
        name: def.name.clone(),
        version,
        display_name,
        description: def.description.trim().to_string(),
        category: TaskCategory::from_label_or_default(&def.category),
        documentation_path: documentation_link(def, public_docs_url),
        inputs,
        output_variables: Vec::new(),
        syntax: Some(syntax),
        remarks: None,
        examples: None,
    }
}

fn to_task_input(input: &TaskDefinitionInput) -> TaskInput {
    let label = input.label.trim();
    let input_type = input.input_type.trim();

    TaskInput {
        name: input.name.clone(),
        label: if label.is_empty() { input.name.clone() } else { label.to_string() },
        input_type: if input_type.is_empty() {
            DEFAULT_INPUT_TYPE.to_string()
        } else {
            input_type.to_string()
        },
        required: input.required,
        default_value: non_empty(input.default_value.as_deref()),
        allowed_values: (!input.options.is_empty())
            .then(|| input.options.keys().cloned().collect()),
        aliases: (!input.aliases.is_empty()).then(|| input.aliases.clone()),
        help_text: non_empty(input.help_mark_down.as_deref()),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Documentation link
// ---------------------------------------------------------------------------

/// An absolute link from the help text, else `{public_docs_url}{kebab-name}-v{major}`.
pub fn documentation_link(def: &TaskDefinition, public_docs_url: &Url) -> String {
    if let Some(caps) = HELP_LINK_RE.captures(&def.help_mark_down) {
        return caps[1].to_string();
    }

    let slug = format!("{}-v{}", kebab_case(&def.name), def.version.major);
    match public_docs_url.join(&slug) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{public_docs_url}{slug}"),
    }
}

/// `DotNetCoreCLI` -> `dot-net-core-cli`, `XMLParser` -> `xml-parser`.
///
/// A hyphen goes before an uppercase letter that follows a lowercase letter
/// or digit, and before the last letter of an uppercase run that is followed
/// by a lowercase letter.
pub fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                out.push('-');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out
}

// ---------------------------------------------------------------------------
// Syntax
// ---------------------------------------------------------------------------

/// A YAML step skeleton: one line per input, the default value or a
/// `<name>` placeholder, optional inputs marked with a comment.
pub fn synthesize_syntax(name: &str, major: u64, inputs: &[TaskInput]) -> String {
    let mut out = format!("- task: {name}@{major}");
    if inputs.is_empty() {
        return out;
    }

    out.push_str("\n  inputs:");
    for input in inputs {
        let value = match &input.default_value {
            Some(default) => default.clone(),
            None => format!("<{}>", input.name),
        };
        let _ = write!(out, "\n    {}: {}", input.name, value);
        if !input.required {
            out.push_str(" # Optional");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TaskVersion;
    use std::collections::BTreeMap;

    fn docs_url() -> Url {
        Url::parse("https://learn.example.com/tasks/reference/").unwrap()
    }

    fn definition() -> TaskDefinition {
        TaskDefinition {
            name: "DotNetCoreCLI".into(),
            friendly_name: ".NET Core".into(),
            description: "Build, test, package, or publish a dotnet application.".into(),
            category: "Build".into(),
            version: TaskVersion { major: 2, minor: 231, patch: 1 },
            help_mark_down: "[Learn more about this task](https://aka.ms/dotnet-core-cli-task)".into(),
            inputs: vec![
                TaskDefinitionInput {
                    name: "command".into(),
                    label: "Command".into(),
                    input_type: "pickList".into(),
                    required: true,
                    default_value: Some("build".into()),
                    help_mark_down: Some("The dotnet command to run.".into()),
                    options: BTreeMap::from([
                        ("test".to_string(), "test".to_string()),
                        ("build".to_string(), "build".to_string()),
                    ]),
                    aliases: Vec::new(),
                },
                TaskDefinitionInput {
                    name: "workingDirectory".into(),
                    label: String::new(),
                    input_type: String::new(),
                    required: false,
                    default_value: Some(String::new()),
                    help_mark_down: Some("  ".into()),
                    options: BTreeMap::new(),
                    aliases: vec!["cwd".into()],
                },
            ],
            deprecated: false,
        }
    }

    #[test]
    fn kebab_case_transliteration() {
        assert_eq!(kebab_case("DotNetCoreCLI"), "dot-net-core-cli");
        assert_eq!(kebab_case("XMLParser"), "xml-parser");
        assert_eq!(kebab_case("AzureCLI"), "azure-cli");
        assert_eq!(kebab_case("Bash"), "bash");
        assert_eq!(kebab_case("Use7Zip"), "use7-zip");
        assert_eq!(kebab_case("PublishTestResults"), "publish-test-results");
        assert_eq!(kebab_case(""), "");
    }

    #[test]
    fn record_fields_follow_definition() {
        let record = to_task_record(&definition(), &docs_url());
        assert_eq!(record.full_name, "DotNetCoreCLI@2");
        assert_eq!(record.version, "2");
        assert_eq!(record.display_name, ".NET Core");
        assert_eq!(record.category, TaskCategory::Build);
        assert_eq!(record.documentation_path, "https://aka.ms/dotnet-core-cli-task");
        assert!(record.output_variables.is_empty());
        assert!(record.remarks.is_none());
    }

    #[test]
    fn inputs_are_normalized() {
        let record = to_task_record(&definition(), &docs_url());
        let command = &record.inputs[0];
        assert_eq!(command.input_type, "pickList");
        assert_eq!(
            command.allowed_values,
            Some(vec!["build".to_string(), "test".to_string()])
        );
        assert_eq!(command.help_text.as_deref(), Some("The dotnet command to run."));

        let cwd = &record.inputs[1];
        assert_eq!(cwd.label, "workingDirectory");
        assert_eq!(cwd.input_type, DEFAULT_INPUT_TYPE);
        assert!(cwd.default_value.is_none());
        assert!(cwd.help_text.is_none());
        assert!(cwd.allowed_values.is_none());
        assert_eq!(cwd.aliases, Some(vec!["cwd".to_string()]));
    }

    #[test]
    fn unknown_category_defaults_to_utility() {
        let mut def = definition();
        def.category = "Azure Pipelines".into();
        assert_eq!(to_task_record(&def, &docs_url()).category, TaskCategory::Utility);

        def.category = "DEPLOY".into();
        assert_eq!(to_task_record(&def, &docs_url()).category, TaskCategory::Deploy);
    }

    #[test]
    fn documentation_link_is_synthesized_without_help_link() {
        let mut def = definition();
        def.help_mark_down = "See [the docs](relative/path.md).".into();
        assert_eq!(
            documentation_link(&def, &docs_url()),
            "https://learn.example.com/tasks/reference/dot-net-core-cli-v2"
        );
    }

    #[test]
    fn syntax_lists_every_input() {
        let record = to_task_record(&definition(), &docs_url());
        assert_eq!(
            record.syntax.as_deref(),
            Some(
                "- task: DotNetCoreCLI@2\n  inputs:\n    command: build\n    workingDirectory: <workingDirectory> # Optional"
            )
        );
    }

    #[test]
    fn syntax_without_inputs_is_single_line() {
        assert_eq!(synthesize_syntax("Bash", 3, &[]), "- task: Bash@3");
    }

    #[test]
    fn friendly_name_falls_back_to_name() {
        let mut def = definition();
        def.friendly_name = " ".into();
        assert_eq!(to_task_record(&def, &docs_url()).display_name, "DotNetCoreCLI");
    }
}
