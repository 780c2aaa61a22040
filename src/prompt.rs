//! Chat prompt templates with `{name}` placeholders.
//!
//! Literal braces are written `{{` and `}}`. Substituted values are inserted
//! as-is and never scanned for further placeholders.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TRANSLATION_SYSTEM_TEMPLATE: &str = "Translate the following into {language}:";
pub const TRANSLATION_USER_TEMPLATE: &str = "{text}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Missing value for prompt variable '{0}'")]
    MissingVariable(String),

    #[error("Malformed template '{template}': {reason}")]
    Malformed { template: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

/// A single chat message as sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// One message skeleton, parsed once at construction.
#[derive(Debug, Clone)]
struct MessageTemplate {
    role: Role,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    fn parse(role: Role, template: &str) -> Result<Self, PromptError> {
        let malformed = |reason: &str| PromptError::Malformed {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) if c.is_alphanumeric() || c == '_' => name.push(c),
                            Some(_) => return Err(malformed("invalid character in placeholder")),
                            None => return Err(malformed("unclosed '{'")),
                        }
                    }
                    if name.is_empty() {
                        return Err(malformed("empty placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Variable(name));
                }
                '}' => return Err(malformed("single '}' outside a placeholder")),
                _ => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { role, segments })
    }

    fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    fn format(&self, vars: &HashMap<&str, &str>) -> Result<ChatMessage, PromptError> {
        let mut content = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => content.push_str(text),
                Segment::Variable(name) => {
                    let value = vars
                        .get(name.as_str())
                        .ok_or_else(|| PromptError::MissingVariable(name.clone()))?;
                    content.push_str(value);
                }
            }
        }
        Ok(ChatMessage::new(self.role, content))
    }
}

/// Ordered list of message templates rendered into a chat conversation.
#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    messages: Vec<MessageTemplate>,
}

impl ChatPromptTemplate {
    pub fn from_messages<'a, I>(messages: I) -> Result<Self, PromptError>
    where
        I: IntoIterator<Item = (Role, &'a str)>,
    {
        let messages = messages
            .into_iter()
            .map(|(role, template)| MessageTemplate::parse(role, template))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { messages })
    }

    /// The fixed system + user prompt used by the translation chain.
    pub fn translation() -> Result<Self, PromptError> {
        Self::from_messages([
            (Role::System, TRANSLATION_SYSTEM_TEMPLATE),
            (Role::User, TRANSLATION_USER_TEMPLATE),
        ])
    }

    /// Sorted, de-duplicated placeholder names.
    pub fn input_variables(&self) -> Vec<String> {
        self.messages
            .iter()
            .flat_map(|m| m.variables())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn format_messages(&self, vars: &HashMap<&str, &str>) -> Result<Vec<ChatMessage>, PromptError> {
        self.messages.iter().map(|m| m.format(vars)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_prompt_has_two_turns() {
        let prompt = ChatPromptTemplate::translation().unwrap();
        let vars = HashMap::from([("language", "French"), ("text", "Hello")]);

        let messages = prompt.format_messages(&vars).unwrap();

        assert_eq!(
            messages,
            vec![
                ChatMessage::new(Role::System, "Translate the following into French:"),
                ChatMessage::new(Role::User, "Hello"),
            ]
        );
        assert_eq!(prompt.input_variables(), vec!["language", "text"]);
    }

    #[test]
    fn missing_variable_is_reported() {
        let prompt = ChatPromptTemplate::translation().unwrap();
        let vars = HashMap::from([("text", "Hello")]);

        let err = prompt.format_messages(&vars).unwrap_err();
        assert_eq!(err, PromptError::MissingVariable("language".to_string()));
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let prompt = ChatPromptTemplate::translation().unwrap();
        let vars = HashMap::from([("language", "{text}"), ("text", "literal {braces}")]);

        let messages = prompt.format_messages(&vars).unwrap();
        assert_eq!(messages[0].content, "Translate the following into {text}:");
        assert_eq!(messages[1].content, "literal {braces}");
    }

    #[test]
    fn doubled_braces_are_literals() {
        let prompt = ChatPromptTemplate::from_messages([(Role::User, "{{raw}} {name}")]).unwrap();
        let messages = prompt
            .format_messages(&HashMap::from([("name", "x")]))
            .unwrap();
        assert_eq!(messages[0].content, "{raw} x");
        assert_eq!(prompt.input_variables(), vec!["name"]);
    }

    #[test]
    fn rejects_unclosed_placeholder() {
        let err = ChatPromptTemplate::from_messages([(Role::System, "Translate into {language")])
            .unwrap_err();
        assert!(matches!(err, PromptError::Malformed { .. }));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::new(Role::System, "hi")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"hi"}"#);
    }
}
