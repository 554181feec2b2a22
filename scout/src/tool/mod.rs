//! Tool definitions, typed invocations and invocation outcomes.
//!
//! The set of tools is closed: [`ToolName`] enumerates every registered tool
//! and is the single source the advertised [`ToolDefinition`]s are generated
//! from. Incoming tool calls are parsed into a [`ToolInvocation`] before any
//! handler runs, and every handler reports back through a [`ToolOutcome`],
//! which always serializes into valid tool-message content.

mod invoker;

pub use invoker::ToolInvoker;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ToolError;

/// Static schema advertised to the model for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    /// Registered tool name.
    pub name: String,
    /// What the tool does, as shown to the model.
    pub description: String,
    /// JSON schema of the argument object (without the `required` list).
    pub parameters: Value,
    /// Argument fields the model must supply.
    pub required: Vec<String>,
}

impl ToolDefinition {
    /// Render the definition in the Chat Completions `tools[]` shape.
    ///
    /// The `required` list is placed inside the parameter schema, which is
    /// where the API enforces it.
    #[must_use]
    pub fn to_openai_tool(&self) -> Value {
        let mut parameters = self.parameters.clone();
        if let Some(schema) = parameters.as_object_mut() {
            schema.insert("required".to_owned(), json!(self.required));
        }
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": parameters,
            }
        })
    }
}

/// The registered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// `search_web(query)`
    SearchWeb,
    /// `get_url_raw_content(url)`
    GetUrlRawContent,
}

impl ToolName {
    /// Every registered tool, in advertisement order.
    pub const ALL: [Self; 2] = [Self::SearchWeb, Self::GetUrlRawContent];

    /// The wire name of the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchWeb => "search_web",
            Self::GetUrlRawContent => "get_url_raw_content",
        }
    }

    /// The definition advertised to the model for this tool.
    #[must_use]
    pub fn definition(self) -> ToolDefinition {
        let (description, field, field_description) = match self {
            Self::SearchWeb => (
                "Search the web for information",
                "query",
                "The query to search the web for",
            ),
            Self::GetUrlRawContent => (
                "Get the cleaned text content of a webpage. This extracts the main content \
                 while removing ads, navigation, headers, footers, and other unwanted elements. \
                 Use this to read detailed information from specific URLs.",
                "url",
                "The URL of the webpage to extract content from",
            ),
        };

        ToolDefinition {
            name: self.as_str().to_owned(),
            description: description.to_owned(),
            parameters: json!({
                "type": "object",
                "properties": {
                    field: {"type": "string", "description": field_description}
                }
            }),
            required: vec![field.to_owned()],
        }
    }

    /// Definitions for every registered tool.
    #[must_use]
    pub fn definitions() -> Vec<ToolDefinition> {
        Self::ALL.into_iter().map(Self::definition).collect()
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ToolError::not_found(s))
    }
}

#[derive(Deserialize)]
struct SearchWebArgs {
    #[serde(default)]
    query: String,
}

#[derive(Deserialize)]
struct GetUrlRawContentArgs {
    #[serde(default)]
    url: String,
}

/// A parsed, strongly-typed tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    /// Search the web for `query`.
    SearchWeb {
        /// The search query; may be empty.
        query: String,
    },
    /// Fetch and clean the page at `url`.
    GetUrlRawContent {
        /// The page URL; may be empty.
        url: String,
    },
}

impl ToolInvocation {
    /// Parse a tool call from its name and JSON argument string.
    ///
    /// Missing argument fields default to the empty string; an empty argument
    /// string is treated as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] for an unregistered name and
    /// [`ToolError::InvalidArguments`] for malformed argument JSON.
    pub fn parse(function_name: &str, arguments: &str) -> Result<Self, ToolError> {
        let name: ToolName = function_name.parse()?;
        let arguments = if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        };

        Ok(match name {
            ToolName::SearchWeb => {
                let args: SearchWebArgs = serde_json::from_str(arguments)?;
                Self::SearchWeb { query: args.query }
            }
            ToolName::GetUrlRawContent => {
                let args: GetUrlRawContentArgs = serde_json::from_str(arguments)?;
                Self::GetUrlRawContent { url: args.url }
            }
        })
    }

    /// The tool this invocation targets.
    #[must_use]
    pub const fn name(&self) -> ToolName {
        match self {
            Self::SearchWeb { .. } => ToolName::SearchWeb,
            Self::GetUrlRawContent { .. } => ToolName::GetUrlRawContent,
        }
    }
}

/// The result of invoking a tool. Never an `Err`: failures are data.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The tool produced a value.
    Success(Value),
    /// The tool degraded to an empty sequence (missing key, empty query,
    /// provider failure).
    DegradedEmpty,
    /// The tool failed; the message is surfaced to the model as `{error: ...}`.
    ErrorPayload(String),
}

impl ToolOutcome {
    /// Create an error payload outcome.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::ErrorPayload(message.into())
    }

    /// The JSON value embedded in the tool message.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success(value) => value.clone(),
            Self::DegradedEmpty => Value::Array(Vec::new()),
            Self::ErrorPayload(message) => json!({ "error": message }),
        }
    }

    /// The JSON-serialized content for a tool-role message.
    #[must_use]
    pub fn to_content(&self) -> String {
        self.to_value().to_string()
    }

    /// Whether this outcome is an error payload.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::ErrorPayload(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_cover_every_tool() {
        let defs = ToolName::definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["search_web", "get_url_raw_content"]);
        assert_eq!(defs[0].required, ["query"]);
        assert_eq!(defs[1].required, ["url"]);
    }

    #[test]
    fn test_openai_tool_shape() {
        let tool = ToolName::SearchWeb.definition().to_openai_tool();
        assert_eq!(tool["type"], "function");
        assert_eq!(tool["function"]["name"], "search_web");
        assert_eq!(tool["function"]["parameters"]["type"], "object");
        assert_eq!(tool["function"]["parameters"]["required"], json!(["query"]));
        assert_eq!(
            tool["function"]["parameters"]["properties"]["query"]["type"],
            "string"
        );
    }

    #[test]
    fn test_tool_name_round_trip_and_unknown() {
        for name in ToolName::ALL {
            assert_eq!(name.as_str().parse::<ToolName>().unwrap(), name);
        }
        assert!(matches!(
            "delete_everything".parse::<ToolName>(),
            Err(ToolError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_invocation_defaults_missing_fields() {
        assert_eq!(
            ToolInvocation::parse("search_web", "{}").unwrap(),
            ToolInvocation::SearchWeb {
                query: String::new()
            }
        );
        assert_eq!(
            ToolInvocation::parse("get_url_raw_content", "").unwrap(),
            ToolInvocation::GetUrlRawContent { url: String::new() }
        );
    }

    #[test]
    fn test_parse_invocation_rejects_malformed_json() {
        let err = ToolInvocation::parse("search_web", "{not json").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_outcome_content() {
        assert_eq!(ToolOutcome::DegradedEmpty.to_content(), "[]");
        assert_eq!(
            ToolOutcome::error("Unknown function").to_content(),
            r#"{"error":"Unknown function"}"#
        );
        assert_eq!(
            ToolOutcome::Success(Value::String("hi \"there\"".into())).to_content(),
            r#""hi \"there\"""#
        );
        assert!(ToolOutcome::error("x").is_error());
        assert!(!ToolOutcome::DegradedEmpty.is_error());
    }
}
