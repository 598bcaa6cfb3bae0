//! Wire types for the `distributedtask/tasks` listing.
//!
//! Only the fields the adapter reads are modelled; everything else in the
//! response is ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `{ "count": n, "value": [...] }` envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDefinitionList {
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub value: Vec<TaskDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub name: String,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub version: TaskVersion,
    #[serde(default)]
    pub help_mark_down: String,
    #[serde(default)]
    pub inputs: Vec<TaskDefinitionInput>,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskVersion {
    #[serde(default)]
    pub major: u64,
    #[serde(default)]
    pub minor: u64,
    #[serde(default)]
    pub patch: u64,
}

impl std::fmt::Display for TaskVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionInput {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub help_mark_down: Option<String>,
    /// Allowed value -> display text. Ordered by key.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_definition_deserializes() {
        let def: TaskDefinition = serde_json::from_str(r#"{"name":"Bash"}"#).unwrap();
        assert_eq!(def.name, "Bash");
        assert_eq!(def.version, TaskVersion::default());
        assert!(def.inputs.is_empty());
        assert!(!def.deprecated);
    }

    #[test]
    fn input_fields_use_api_names() {
        let input: TaskDefinitionInput = serde_json::from_str(
            r#"{"name":"command","label":"Command","type":"pickList","required":true,
                "defaultValue":"build","helpMarkDown":"Run it.",
                "options":{"test":"Test","build":"Build"},"aliases":["cmd"]}"#,
        )
        .unwrap();
        assert_eq!(input.input_type, "pickList");
        assert!(input.required);
        assert_eq!(input.default_value.as_deref(), Some("build"));
        assert_eq!(input.options.keys().collect::<Vec<_>>(), vec!["build", "test"]);
        assert_eq!(input.aliases, vec!["cmd"]);
    }

    #[test]
    fn version_orders_by_component() {
        let older = TaskVersion { major: 2, minor: 10, patch: 0 };
        let newer = TaskVersion { major: 2, minor: 231, patch: 1 };
        assert!(newer > older);
        assert_eq!(newer.to_string(), "2.231.1");
    }
}
