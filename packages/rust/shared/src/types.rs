//! Core domain types for task documentation records.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskDocsError};

// ---------------------------------------------------------------------------
// TaskCategory
// ---------------------------------------------------------------------------

/// The closed set of task categories shared by the public index and the inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Build,
    Deploy,
    Package,
    Test,
    Tool,
    #[default]
    Utility,
}

/// Lowercase label → category. Index headings and API category strings are
/// both looked up here.
pub const CATEGORY_TABLE: &[(&str, TaskCategory)] = &[
    ("build", TaskCategory::Build),
    ("deploy", TaskCategory::Deploy),
    ("package", TaskCategory::Package),
    ("test", TaskCategory::Test),
    ("tool", TaskCategory::Tool),
    ("utility", TaskCategory::Utility),
];

impl TaskCategory {
    /// Every category, in display order.
    pub const ALL: [TaskCategory; 6] = [
        Self::Build,
        Self::Deploy,
        Self::Package,
        Self::Test,
        Self::Tool,
        Self::Utility,
    ];

    /// Look up a label case-insensitively in `table`.
    ///
    /// Accepts the bare name (`Build`) and the pluralized heading form the
    /// documentation project uses (`Build tasks`).
    pub fn lookup(table: &[(&str, TaskCategory)], label: &str) -> Option<TaskCategory> {
        let lowered = label.trim().to_lowercase();
        let key = lowered
            .strip_suffix(" tasks")
            .or_else(|| lowered.strip_suffix(" task"))
            .unwrap_or(&lowered)
            .trim();
        table
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, category)| *category)
    }

    /// Look up a label in [`CATEGORY_TABLE`].
    pub fn from_label(label: &str) -> Option<TaskCategory> {
        Self::lookup(CATEGORY_TABLE, label)
    }

    /// Look up a label, falling back to [`TaskCategory::Utility`].
    pub fn from_label_or_default(label: &str) -> TaskCategory {
        Self::from_label(label).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Deploy => "deploy",
            Self::Package => "package",
            Self::Test => "test",
            Self::Tool => "tool",
            Self::Utility => "utility",
        }
    }
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskCategory {
    type Err = TaskDocsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_label(s)
            .ok_or_else(|| TaskDocsError::malformed(format!("unknown task category '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// TaskId
// ---------------------------------------------------------------------------

static TASK_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]+)@(\d+)$").expect("task id regex")
});

/// A validated `Name@MajorVersion` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId {
    pub name: String,
    pub version: String,
}

impl TaskId {
    /// Validate and split an identifier. No network activity happens here.
    pub fn parse(identifier: &str) -> Result<Self> {
        let caps = TASK_ID_RE.captures(identifier).ok_or_else(|| {
            TaskDocsError::malformed(format!(
                "'{identifier}' is not a task identifier of the form Name@MajorVersion"
            ))
        })?;
        Ok(Self {
            name: caps[1].to_string(),
            version: caps[2].to_string(),
        })
    }

    /// `name@version`.
    pub fn full_name(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Whether `major` denotes the same major version, ignoring leading zeros.
    pub fn matches_major(&self, major: u64) -> bool {
        match self.version.parse::<u64>() {
            Ok(v) => v == major,
            Err(_) => self.version == major.to_string(),
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl std::str::FromStr for TaskId {
    type Err = TaskDocsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// TaskInput / TaskRecord
// ---------------------------------------------------------------------------

/// Type assigned to inputs whose documentation names no known type.
pub const DEFAULT_INPUT_TYPE: &str = "string";

/// One configurable parameter of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl TaskInput {
    /// An input with only a name; label and type take their defaults.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            input_type: DEFAULT_INPUT_TYPE.to_string(),
            required: false,
            default_value: None,
            allowed_values: None,
            aliases: None,
            help_text: None,
        }
    }
}

/// Which source produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "api")]
    Api,
    #[serde(rename = "public-docs")]
    PublicDocs,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api => f.write_str("api"),
            Self::PublicDocs => f.write_str("public-docs"),
        }
    }
}

/// Everything known about one task at one major version.
///
/// Stubs from the index leave the detail fields empty; the detail extractor
/// and the inventory adapter produce fully populated records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub name: String,
    pub version: String,
    pub full_name: String,
    pub display_name: String,
    pub description: String,
    pub category: TaskCategory,
    pub documentation_path: String,
    #[serde(default)]
    pub inputs: Vec<TaskInput>,
    #[serde(default)]
    pub output_variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<String>,
}

impl TaskRecord {
    /// A minimally populated record as discovered in the task index.
    pub fn stub(
        name: impl Into<String>,
        version: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        category: TaskCategory,
        documentation_path: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        Self {
            full_name: format!("{name}@{version}"),
            name,
            version,
            display_name: display_name.into(),
            description: description.into(),
            category,
            documentation_path: documentation_path.into(),
            inputs: Vec::new(),
            output_variables: Vec::new(),
            syntax: None,
            remarks: None,
            examples: None,
        }
    }

    /// Case-insensitive substring match against name, display name,
    /// description, and full name.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        [
            &self.name,
            &self.display_name,
            &self.description,
            &self.full_name,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
