//! Tool item definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ItemError, RegistryItem};

const KIND: &str = "Tool";
const RESERVED_KEYS: &[&str] = &["id", "description", "type", "commands", "schema", "env", "workingDir"];

/// How a tool is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ToolType {
    /// Runs a sequence of commands.
    Run,
    /// Issues a sequence of HTTP requests.
    Http,
    /// Any other type, kept verbatim for the executor to interpret.
    Other(String),
}

impl ToolType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "run" => ToolType::Run,
            "http" => ToolType::Http,
            other => ToolType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ToolType::Run => "run",
            ToolType::Http => "http",
            ToolType::Other(other) => other,
        }
    }
}

impl From<ToolType> for String {
    fn from(tool_type: ToolType) -> Self {
        tool_type.as_str().to_string()
    }
}

/// A command argument: either a literal or a flag emitted only when the
/// named condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArg {
    Plain(String),
    Conditional {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        when: Option<String>,
    },
}

/// One command of a `run` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCommand {
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<ToolArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// A validated tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<ToolCommand>,
    /// Input schema, always an object schema.
    pub schema: Value,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Type-specific keys, such as `requests` for HTTP tools.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolDefinition {
    pub fn parse(config: &Value) -> Result<Self, ItemError> {
        let map = config.as_object().ok_or(ItemError::NotAMapping { kind: KIND })?;

        let id = non_empty_str(map, "id")?;
        let description = non_empty_str(map, "description")?;
        let tool_type = match map.get("type") {
            None | Some(Value::Null) => ToolType::Run,
            Some(Value::String(raw)) => ToolType::parse(raw),
            Some(other) => return Err(ItemError::invalid(KIND, "type", format!("expected a string, got {other}"))),
        };

        let mut extra: Map<String, Value> = map
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let default_dir = map.get("workingDir").and_then(Value::as_str);
        let commands = match (&tool_type, map.get("commands")) {
            (ToolType::Run, Some(Value::Array(commands))) if !commands.is_empty() => {
                parse_commands(commands, default_dir)?
            }
            (ToolType::Run, _) => {
                return Err(ItemError::invalid(
                    KIND,
                    "commands",
                    "run-type tool must have a non-empty commands list",
                ));
            }
            (_, Some(commands @ Value::Array(_))) => {
                extra.insert("commands".to_string(), commands.clone());
                Vec::new()
            }
            _ => Vec::new(),
        };

        if tool_type == ToolType::Http {
            match map.get("requests") {
                Some(Value::Array(requests)) if !requests.is_empty() => {}
                _ => {
                    return Err(ItemError::invalid(KIND, "requests", "HTTP tool must have a non-empty requests list"));
                }
            }
        }

        Ok(Self {
            id,
            description,
            tool_type,
            commands,
            schema: normalize_schema(map.get("schema")),
            env: parse_env(map.get("env"), "env")?,
            extra,
        })
    }
}

impl RegistryItem for ToolDefinition {
    const SECTION: &'static str = "tools";
    const KIND: &'static str = KIND;

    fn from_config(config: &Value) -> Result<Self, ItemError> {
        Self::parse(config)
    }

    fn id(&self) -> &str {
        &self.id
    }
}

fn non_empty_str(map: &Map<String, Value>, field: &'static str) -> Result<String, ItemError> {
    match map.get(field) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        _ => Err(ItemError::MissingField { kind: KIND, field }),
    }
}

fn parse_commands(commands: &[Value], default_dir: Option<&str>) -> Result<Vec<ToolCommand>, ItemError> {
    commands
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let field = format!("commands[{index}]");
            if !raw.is_object() {
                return Err(ItemError::invalid(KIND, field, "command must be a mapping"));
            }

            let mut command: ToolCommand =
                serde_json::from_value(raw.clone()).map_err(|e| ItemError::invalid(KIND, field.clone(), e.to_string()))?;

            if command.cmd.is_empty() {
                return Err(ItemError::invalid(KIND, field, "cmd must not be empty"));
            }

            let inherits_dir = matches!(command.working_dir.as_deref(), None | Some("") | Some("."));
            if inherits_dir && let Some(dir) = default_dir {
                command.working_dir = Some(dir.to_string());
            }

            Ok(command)
        })
        .collect()
}

/// Environment variables must be string pairs.
pub(crate) fn parse_env(raw: Option<&Value>, field: &str) -> Result<BTreeMap<String, String>, ItemError> {
    let Some(Value::Object(map)) = raw else {
        return Ok(BTreeMap::new());
    };

    map.iter()
        .map(|(key, value)| match value {
            Value::String(value) => Ok((key.clone(), value.clone())),
            _ => Err(ItemError::invalid(
                KIND,
                format!("{field}.{key}"),
                "environment variables must be string key-value pairs",
            )),
        })
        .collect()
}

fn normalize_schema(raw: Option<&Value>) -> Value {
    let mut schema = match raw {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    schema.entry("type").or_insert_with(|| json!("object"));
    schema.entry("properties").or_insert_with(|| json!({}));
    Value::Object(schema)
}
