//! Prompt and prompt-template item definitions.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{ItemError, RegistryItem};

const KIND: &str = "Prompt";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    /// Served to clients.
    #[default]
    Prompt,
    /// Only used as a base for other prompts.
    Template,
}

impl PromptType {
    /// Unknown values fall back to [`PromptType::Prompt`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("template") => PromptType::Template,
            _ => PromptType::Prompt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Where a message's text comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageContent {
    Text(String),
    /// Loaded from a file relative to the configuration file.
    File(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Reference to a template this prompt builds on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptExtension {
    pub template_id: String,
    pub arguments: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
}

/// A validated prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptDefinition {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    pub messages: Vec<PromptMessage>,
    pub extensions: Vec<PromptExtension>,
    pub tags: Vec<String>,
    pub arguments: Vec<PromptArgument>,
}

impl PromptDefinition {
    pub fn parse(config: &Value) -> Result<Self, ItemError> {
        let map = config.as_object().ok_or(ItemError::NotAMapping { kind: KIND })?;

        let id = match map.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            _ => return Err(ItemError::MissingField { kind: KIND, field: "id" }),
        };

        let prompt_type = PromptType::parse(map.get("type").and_then(Value::as_str));
        let messages = match map.get("messages") {
            Some(Value::Array(messages)) => parse_messages(messages)?,
            _ => Vec::new(),
        };
        let extensions = match map.get("extend") {
            Some(Value::Array(extensions)) => parse_extensions(extensions)?,
            _ => Vec::new(),
        };
        let tags = match map.get("tags") {
            Some(Value::Array(tags)) => parse_tags(tags)?,
            _ => Vec::new(),
        };

        match prompt_type {
            PromptType::Prompt if messages.is_empty() && extensions.is_empty() => {
                return Err(ItemError::invalid(
                    KIND,
                    "messages",
                    format!("prompt \"{id}\" must have either messages or extend a template"),
                ));
            }
            PromptType::Template if messages.is_empty() => {
                return Err(ItemError::invalid(
                    KIND,
                    "messages",
                    format!("template \"{id}\" must have messages to be extended by prompts"),
                ));
            }
            _ => {}
        }

        Ok(Self {
            id,
            description: map.get("description").and_then(Value::as_str).map(str::to_string),
            prompt_type,
            messages,
            extensions,
            tags,
            arguments: arguments_from_schema(map.get("schema")),
        })
    }

    pub fn is_template(&self) -> bool {
        self.prompt_type == PromptType::Template
    }
}

impl RegistryItem for PromptDefinition {
    const SECTION: &'static str = "prompts";
    const KIND: &'static str = KIND;

    fn from_config(config: &Value) -> Result<Self, ItemError> {
        Self::parse(config)
    }

    fn id(&self) -> &str {
        &self.id
    }
}

fn parse_messages(messages: &[Value]) -> Result<Vec<PromptMessage>, ItemError> {
    messages
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let field = format!("messages[{index}]");
            let map = raw
                .as_object()
                .ok_or_else(|| ItemError::invalid(KIND, field.clone(), "message must be a mapping"))?;

            let role = match map.get("role").and_then(Value::as_str) {
                Some("user") => Role::User,
                Some("assistant") => Role::Assistant,
                Some(other) => return Err(ItemError::invalid(KIND, field, format!("invalid role \"{other}\""))),
                None => return Err(ItemError::invalid(KIND, field, "message must have a valid role")),
            };

            let content = match (map.get("content"), map.get("file")) {
                (Some(Value::String(text)), _) => MessageContent::Text(text.clone()),
                (_, Some(Value::String(file))) if !file.is_empty() => MessageContent::File(file.clone()),
                _ => {
                    return Err(ItemError::invalid(
                        KIND,
                        field,
                        "message must have either a \"content\" or \"file\" property",
                    ));
                }
            };

            Ok(PromptMessage { role, content })
        })
        .collect()
}

fn parse_extensions(extensions: &[Value]) -> Result<Vec<PromptExtension>, ItemError> {
    extensions
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let field = format!("extend[{index}]");
            let map = raw
                .as_object()
                .ok_or_else(|| ItemError::invalid(KIND, field.clone(), "extension must be a mapping"))?;

            let template_id = match map.get("id") {
                Some(Value::String(id)) if !id.is_empty() => id.clone(),
                _ => return Err(ItemError::invalid(KIND, field, "extension must have a template id")),
            };

            let arguments = match map.get("arguments") {
                None | Some(Value::Null) => BTreeMap::new(),
                Some(Value::Object(arguments)) => string_pairs(arguments)
                    .ok_or_else(|| ItemError::invalid(KIND, field.clone(), "extension arguments must be strings"))?,
                Some(_) => return Err(ItemError::invalid(KIND, field, "extension arguments must be a mapping")),
            };

            Ok(PromptExtension { template_id, arguments })
        })
        .collect()
}

fn string_pairs(map: &Map<String, Value>) -> Option<BTreeMap<String, String>> {
    map.iter()
        .map(|(key, value)| value.as_str().map(|value| (key.clone(), value.to_string())))
        .collect()
}

fn parse_tags(tags: &[Value]) -> Result<Vec<String>, ItemError> {
    let mut parsed = Vec::with_capacity(tags.len());
    for (index, tag) in tags.iter().enumerate() {
        match tag {
            Value::String(tag) if tag.is_empty() => {}
            Value::String(tag) => parsed.push(tag.clone()),
            _ => return Err(ItemError::invalid(KIND, format!("tags[{index}]"), "tag must be a string")),
        }
    }
    Ok(parsed)
}

fn arguments_from_schema(schema: Option<&Value>) -> Vec<PromptArgument> {
    let Some(properties) = schema.and_then(|s| s.get("properties")).and_then(Value::as_object) else {
        return Vec::new();
    };

    let required: Vec<&str> = schema
        .and_then(|s| s.get("required"))
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, property)| PromptArgument {
            name: name.clone(),
            description: property.get("description").and_then(Value::as_str).map(str::to_string),
            required: required.contains(&name.as_str()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_with_messages_and_schema() {
        let prompt = PromptDefinition::parse(&json!({
            "id": "review",
            "description": "Review code",
            "schema": {
                "properties": {
                    "file": {"description": "File to review"},
                    "depth": {}
                },
                "required": ["file"]
            },
            "messages": [
                {"role": "user", "content": "Review {{file}}"},
                {"role": "assistant", "file": "prompts/ack.md"}
            ],
            "tags": ["code", "", "review"]
        }))
        .unwrap();

        assert_eq!(prompt.prompt_type, PromptType::Prompt);
        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[1].content, MessageContent::File("prompts/ack.md".to_string()));
        assert_eq!(prompt.tags, vec!["code", "review"]);
        assert_eq!(prompt.arguments.len(), 2);
        assert!(prompt.arguments.iter().any(|a| a.name == "file" && a.required));
        assert!(prompt.arguments.iter().any(|a| a.name == "depth" && !a.required));
    }

    #[test]
    fn test_prompt_extending_template() {
        let prompt = PromptDefinition::parse(&json!({
            "id": "rust-review",
            "extend": [{"id": "review-base", "arguments": {"language": "rust"}}]
        }))
        .unwrap();
        assert!(prompt.messages.is_empty());
        assert_eq!(prompt.extensions[0].template_id, "review-base");
        assert_eq!(prompt.extensions[0].arguments["language"], "rust");
    }

    #[test]
    fn test_prompt_needs_instructions() {
        let err = PromptDefinition::parse(&json!({"id": "empty"})).unwrap_err();
        assert!(matches!(err, ItemError::InvalidField { ref field, .. } if field == "messages"));

        let err = PromptDefinition::parse(&json!({
            "id": "base", "type": "template", "extend": [{"id": "other"}]
        }))
        .unwrap_err();
        assert!(matches!(err, ItemError::InvalidField { ref field, .. } if field == "messages"));
    }

    #[test]
    fn test_template_type() {
        let prompt = PromptDefinition::parse(&json!({
            "id": "base",
            "type": "Template",
            "messages": [{"role": "user", "content": "Hello"}]
        }))
        .unwrap();
        assert!(prompt.is_template());
    }

    #[test]
    fn test_invalid_entries() {
        assert_eq!(
            PromptDefinition::parse(&json!({"messages": []})),
            Err(ItemError::MissingField { kind: "Prompt", field: "id" })
        );

        let err = PromptDefinition::parse(&json!({
            "id": "p", "messages": [{"role": "system", "content": "x"}]
        }))
        .unwrap_err();
        assert!(matches!(err, ItemError::InvalidField { ref field, .. } if field == "messages[0]"));

        let err = PromptDefinition::parse(&json!({
            "id": "p", "messages": [{"role": "user", "content": "x"}], "tags": ["ok", 3]
        }))
        .unwrap_err();
        assert!(matches!(err, ItemError::InvalidField { ref field, .. } if field == "tags[1]"));
    }
}
