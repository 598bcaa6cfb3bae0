//! Task detail extraction.
//!
//! Parses one per-task reference document into a structured record. The
//! document is plain markdown plus a private sentinel syntax (see
//! [`regions`] for the exact formats). All structure is recovered by pattern
//! matching; a missing or malformed region yields an empty field, never an
//! error.

mod inputs;
mod regions;

use tracing::{debug, instrument};

use taskdocs_shared::{TaskInput, TaskRecord};

pub use inputs::KNOWN_INPUT_TYPES;

// ---------------------------------------------------------------------------
// Region names
// ---------------------------------------------------------------------------

const DESCRIPTION_REGION: &str = "description";
const SYNTAX_REGION: &str = "syntax";
const INPUTS_REGION: &str = "inputs";
const OUTPUT_VARIABLES_REGION: &str = "outputVariables";
const REMARKS_REGION: &str = "remarks";
const EXAMPLES_REGION: &str = "examples";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Everything extracted from a single task document.
///
/// Fields are independent: each one is filled from its own region and left
/// empty when that region is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDocument {
    /// Text of the first `# ` heading, used as a display-name fallback.
    pub title: Option<String>,
    pub description: String,
    pub syntax: Option<String>,
    pub inputs: Vec<TaskInput>,
    pub output_variables: Vec<String>,
    pub remarks: Option<String>,
    pub examples: Option<String>,
}

// ---------------------------------------------------------------------------
// Region parsers
// ---------------------------------------------------------------------------

/// Front-matter `description`, else the description region's editable block,
/// else an empty string.
pub fn parse_description(md: &str) -> String {
    if let Some(description) =
        regions::front_matter(md).and_then(|fm| regions::front_matter_field(fm, "description"))
    {
        return description;
    }

    regions::region(md, DESCRIPTION_REGION)
        .and_then(regions::editable_content)
        .map(|text| regions::strip_variant_markers(text).trim().to_string())
        .unwrap_or_default()
}

/// The first YAML code block of the most current syntax variant.
///
/// Older variants are never consulted, even when the current one has no code
/// block.
pub fn parse_syntax(md: &str) -> Option<String> {
    let region = regions::region(md, SYNTAX_REGION)?;
    regions::fenced_yaml_block(&regions::first_variant(region))
}

/// Input items in document order. Items without a name are dropped.
pub fn parse_inputs(md: &str) -> Vec<TaskInput> {
    let Some(region) = regions::region(md, INPUTS_REGION) else {
        return Vec::new();
    };

    regions::items(region)
        .into_iter()
        .filter_map(|item| {
            let name = item.name?;
            Some(inputs::parse_input_item(name, item.body))
        })
        .collect()
}

/// Output variable names in document order.
pub fn parse_output_variables(md: &str) -> Vec<String> {
    let Some(region) = regions::region(md, OUTPUT_VARIABLES_REGION) else {
        return Vec::new();
    };

    regions::items(region)
        .into_iter()
        .filter_map(|item| item.name.map(str::to_string))
        .collect()
}

/// Remarks region text, without its heading.
pub fn parse_remarks(md: &str) -> Option<String> {
    prose_region(md, REMARKS_REGION)
}

/// Examples region text, without its heading.
pub fn parse_examples(md: &str) -> Option<String> {
    prose_region(md, EXAMPLES_REGION)
}

/// Free-form region text: the editable block (or the bare region when there
/// is none) with variant markers and the leading heading removed.
fn prose_region(md: &str, name: &str) -> Option<String> {
    let region = regions::region(md, name)?;
    let content = regions::editable_content(region).unwrap_or(region);
    let stripped = regions::strip_variant_markers(content);
    let body = regions::strip_leading_heading(&stripped).trim();
    (!body.is_empty()).then(|| body.to_string())
}

// ---------------------------------------------------------------------------
// Whole-document extraction
// ---------------------------------------------------------------------------

/// Run every region parser over `md`.
pub fn parse_task_document(md: &str) -> TaskDocument {
    TaskDocument {
        title: regions::h1_title(md),
        description: parse_description(md),
        syntax: parse_syntax(md),
        inputs: parse_inputs(md),
        output_variables: parse_output_variables(md),
        remarks: parse_remarks(md),
        examples: parse_examples(md),
    }
}

/// Complete an index stub with the contents of its documentation page.
///
/// Identity fields (name, version, category, path) always come from the
/// stub. The document's description wins when non-empty; the stub's display
/// name is kept unless it is blank, in which case the page title is used.
#[instrument(skip_all, fields(task = %stub.full_name))]
pub fn extract_task(stub: &TaskRecord, md: &str) -> TaskRecord {
    let doc = parse_task_document(md);
    debug!(
        inputs = doc.inputs.len(),
        outputs = doc.output_variables.len(),
        has_syntax = doc.syntax.is_some(),
        "task document parsed"
    );

    let display_name = if stub.display_name.trim().is_empty() {
        doc.title
            .as_deref()
            .map(display_name_from_title)
            .unwrap_or_else(|| stub.name.clone())
    } else {
        stub.display_name.clone()
    };

    let description = if doc.description.is_empty() {
        stub.description.clone()
    } else {
        doc.description
    };

    TaskRecord {
        name: stub.name.clone(),
        version: stub.version.clone(),
        full_name: stub.full_name.clone(),
        display_name,
        description,
        category: stub.category,
        documentation_path: stub.documentation_path.clone(),
        inputs: doc.inputs,
        output_variables: doc.output_variables,
        syntax: doc.syntax,
        remarks: doc.remarks,
        examples: doc.examples,
    }
}

/// `DotNetCoreCLI@2 - .NET Core v2 task` -> `.NET Core v2 task`.
fn display_name_from_title(title: &str) -> String {
    match title.split_once(" - ") {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => title.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdocs_shared::TaskCategory;

    fn fixture() -> String {
        std::fs::read_to_string("../../../fixtures/markdown/dotnet-core-cli-v2.md")
            .expect("read task fixture")
    }

    fn stub() -> TaskRecord {
        TaskRecord::stub(
            "DotNetCoreCLI",
            "2",
            ".NET Core",
            "Build a .NET app.",
            TaskCategory::Build,
            "dotnet-core-cli-v2.md",
        )
    }

    #[test]
    fn description_prefers_front_matter() {
        assert_eq!(
            parse_description(&fixture()),
            "Build, test, package, or publish a .NET application, or run a custom .NET CLI command."
        );
    }

    #[test]
    fn description_falls_back_to_editable_region() {
        let md = "# T\n<!-- :::description::: -->\n:::moniker range=\"<=x\"\n<!-- :::editable-content name=\"description\"::: -->\nFrom the body.\n<!-- :::editable-content-end::: -->\n:::moniker-end\n<!-- :::description-end::: -->\n";
        assert_eq!(parse_description(md), "From the body.");
        assert_eq!(parse_description("# Nothing here"), "");
    }

    #[test]
    fn syntax_uses_most_current_variant_only() {
        let syntax = parse_syntax(&fixture()).expect("syntax");
        assert!(syntax.starts_with("# .NET Core v2\n"));
        assert!(!syntax.contains("(2020)"));
        assert!(syntax.contains("- task: DotNetCoreCLI@2"));
        assert!(!syntax.contains("```"));
    }

    #[test]
    fn syntax_never_falls_back_to_older_variant() {
        let md = "<!-- :::syntax::: -->\n:::moniker range=\">=new\"\nNo code here.\n:::moniker-end\n:::moniker range=\"=old\"\n```yaml\n- task: Old@1\n```\n:::moniker-end\n<!-- :::syntax-end::: -->\n";
        assert!(parse_syntax(md).is_none());
    }

    #[test]
    fn inputs_from_fixture() {
        let inputs = parse_inputs(&fixture());
        let names: Vec<_> = inputs.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["command", "publishWebProjects", "projects", "workingDirectory"]
        );

        let command = &inputs[0];
        assert_eq!(command.label, "Command");
        assert_eq!(command.input_type, "string");
        assert!(command.required);
        assert_eq!(command.default_value.as_deref(), Some("build"));
        let allowed: Vec<String> =
            ["build", "push", "pack", "publish", "restore", "run", "test", "custom"]
                .iter()
                .map(|v| v.to_string())
                .collect();
        assert_eq!(command.allowed_values, Some(allowed));
        assert!(
            command
                .help_text
                .as_deref()
                .unwrap_or_default()
                .starts_with("The dotnet command to run.")
        );

        let publish = &inputs[1];
        assert_eq!(publish.input_type, "boolean");
        assert!(!publish.required);
        assert_eq!(publish.default_value.as_deref(), Some("true"));

        let projects = &inputs[2];
        assert_eq!(projects.label, "Path to project(s) or solution(s)");
        assert!(projects.help_text.is_none());
        assert!(projects.default_value.is_none());

        let cwd = &inputs[3];
        assert_eq!(cwd.aliases, Some(vec!["cwd".to_string()]));
        assert_eq!(cwd.input_type, "string");
    }

    #[test]
    fn output_variables_in_order() {
        assert_eq!(
            parse_output_variables(&fixture()),
            vec!["DOTNET_CLI_EXIT_CODE".to_string(), "DOTNET_CLI_LOG".to_string()]
        );
    }

    #[test]
    fn remarks_strip_heading_and_variant_markers() {
        let remarks = parse_remarks(&fixture()).expect("remarks");
        assert!(remarks.starts_with("The `DotNetCoreCLI@2` task wraps"));
        assert!(!remarks.contains("## Remarks"));
        assert!(!remarks.contains(":::moniker"));
        assert!(remarks.ends_with("expects web projects by default."));
    }

    #[test]
    fn examples_keep_subheadings() {
        let examples = parse_examples(&fixture()).expect("examples");
        assert!(examples.starts_with("### Build a project"));
        assert!(examples.contains("command: 'build'"));
    }

    #[test]
    fn heading_only_region_is_none() {
        let md = "<!-- :::remarks::: -->\n<!-- :::editable-content name=\"remarks\"::: -->\n## Remarks\n\n<!-- :::editable-content-end::: -->\n<!-- :::remarks-end::: -->";
        assert!(parse_remarks(md).is_none());
        assert!(parse_examples(md).is_none());
    }

    #[test]
    fn front_matter_only_document() {
        let md = "---\ndescription: Foo.\n---\n<!-- :::syntax::: -->\n<!-- :::syntax-end::: -->\n<!-- :::inputs::: -->\n<!-- :::inputs-end::: -->\n<!-- :::outputVariables::: -->\n<!-- :::outputVariables-end::: -->\n";
        let doc = parse_task_document(md);
        assert_eq!(doc.description, "Foo.");
        assert!(doc.syntax.is_none());
        assert!(doc.inputs.is_empty());
        assert!(doc.output_variables.is_empty());
        assert!(doc.remarks.is_none());
        assert!(doc.examples.is_none());
    }

    #[test]
    fn garbage_degrades_to_empty_document() {
        let doc =
            parse_task_document("<!-- :::inputs::: -->\n<!-- :::item name=\"\"::: -->\nnothing");
        assert_eq!(doc, TaskDocument::default());
    }

    #[test]
    fn extract_task_keeps_identity_from_stub() {
        let record = extract_task(&stub(), &fixture());
        assert_eq!(record.full_name, "DotNetCoreCLI@2");
        assert_eq!(record.category, TaskCategory::Build);
        assert_eq!(record.display_name, ".NET Core");
        assert_eq!(record.documentation_path, "dotnet-core-cli-v2.md");
        assert!(record.description.contains(".NET CLI command"));
        assert_eq!(record.inputs.len(), 4);
        assert_eq!(record.output_variables.len(), 2);
        assert!(record.syntax.is_some());
        assert!(record.remarks.is_some());
        assert!(record.examples.is_some());
    }

    #[test]
    fn extract_task_falls_back_to_title_and_stub_description() {
        let mut bare = stub();
        bare.display_name = String::new();
        let record = extract_task(&bare, "# Foo@1 - Foo v1 task\n");
        assert_eq!(record.display_name, "Foo v1 task");
        assert_eq!(record.description, "Build a .NET app.");
        assert!(record.inputs.is_empty());
    }
}
