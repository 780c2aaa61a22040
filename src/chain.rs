//! The translation chain: prompt template → hosted model → string output parser.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::llm::{LlmError, StatelessLLMInterface};
use crate::prompt::{ChatMessage, ChatPromptTemplate, PromptError};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Chain input: the fields substituted into the translation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationInput {
    pub language: String,
    pub text: String,
}

impl TranslationInput {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Narrow collaborator interface for anything that can translate text.
#[async_trait]
pub trait Translator: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn translate(&self, text: &str, language: &str) -> Result<String, Self::Error>;
}

/// Extracts plain text from the model reply. The reply is already text, so this is a pass-through.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrOutputParser;

impl StrOutputParser {
    pub fn parse(&self, reply: String) -> String {
        reply
    }
}

pub type ChainStream = BoxStream<'static, Result<String, ChainError>>;

pub struct TranslationChain {
    prompt: ChatPromptTemplate,
    llm: Arc<dyn StatelessLLMInterface>,
    parser: StrOutputParser,
}

impl TranslationChain {
    pub fn new(llm: Arc<dyn StatelessLLMInterface>) -> Result<Self, ChainError> {
        Ok(Self {
            prompt: ChatPromptTemplate::translation()?,
            llm,
            parser: StrOutputParser,
        })
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    fn render(&self, input: &TranslationInput) -> Result<Vec<ChatMessage>, ChainError> {
        let vars = HashMap::from([
            ("language", input.language.as_str()),
            ("text", input.text.as_str()),
        ]);
        Ok(self.prompt.format_messages(&vars)?)
    }

    pub async fn invoke(&self, input: &TranslationInput) -> Result<String, ChainError> {
        let messages = self.render(input)?;
        debug!(
            "Invoking chain: language={}, text_len={}",
            input.language,
            input.text.chars().count()
        );
        let reply = self.llm.chat_completion(&messages).await?;
        Ok(self.parser.parse(reply))
    }

    /// Run every input concurrently; outputs keep the input order and the first failure wins.
    pub async fn batch(&self, inputs: &[TranslationInput]) -> Result<Vec<String>, ChainError> {
        info!("Running batch of {} translations", inputs.len());
        futures::future::try_join_all(inputs.iter().map(|input| self.invoke(input))).await
    }

    pub async fn stream(&self, input: &TranslationInput) -> Result<ChainStream, ChainError> {
        let messages = self.render(input)?;
        let parser = self.parser;
        let stream = self
            .llm
            .chat_completion_stream(&messages)
            .await?
            .map_ok(move |chunk| parser.parse(chunk))
            .map_err(ChainError::from)
            .boxed();
        Ok(stream)
    }

    pub fn input_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .prompt
            .input_variables()
            .into_iter()
            .map(|name| {
                let title = title_case(&name);
                (name, json!({"title": title, "type": "string"}))
            })
            .collect();
        json!({
            "title": "PromptInput",
            "type": "object",
            "properties": properties,
            "required": self.prompt.input_variables(),
        })
    }

    pub fn output_schema(&self) -> Value {
        json!({"title": "StrOutputParserOutput", "type": "string"})
    }

    pub fn config_schema(&self) -> Value {
        json!({"title": "RunnableSequenceConfig", "type": "object", "properties": {}})
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl Translator for TranslationChain {
    type Error = ChainError;

    async fn translate(&self, text: &str, language: &str) -> Result<String, ChainError> {
        self.invoke(&TranslationInput::new(text, language)).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::LlmStream;
    use crate::prompt::Role;
    use std::sync::Mutex;

    /// Echoes the prompt back as `"<language>|<text>"`; fails when the text is `"boom"`.
    pub(crate) struct EchoLLM {
        pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl EchoLLM {
        pub(crate) fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    fn echo(messages: &[ChatMessage]) -> Result<String, LlmError> {
        let language = messages[0]
            .content
            .trim_start_matches("Translate the following into ")
            .trim_end_matches(':')
            .to_string();
        let text = &messages[1].content;
        if text == "boom" {
            return Err(LlmError::Upstream {
                status: 500,
                message: "model exploded".to_string(),
            });
        }
        Ok(format!("{}|{}", language, text))
    }

    #[async_trait]
    impl StatelessLLMInterface for EchoLLM {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            echo(messages)
        }

        async fn chat_completion_stream(&self, messages: &[ChatMessage]) -> Result<LlmStream, LlmError> {
            let reply = echo(messages)?;
            let parts: Vec<Result<String, LlmError>> =
                reply.split('|').map(|p| Ok(p.to_string())).collect();
            Ok(futures::stream::iter(parts).boxed())
        }
    }

    fn chain() -> (Arc<EchoLLM>, TranslationChain) {
        let llm = Arc::new(EchoLLM::new());
        let chain = TranslationChain::new(llm.clone()).unwrap();
        (llm, chain)
    }

    #[tokio::test]
    async fn translate_sends_system_and_user_turns() {
        let (llm, chain) = chain();

        let out = chain.translate("Hello", "French").await.unwrap();

        assert_eq!(out, "French|Hello");
        let seen = llm.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            vec![
                ChatMessage::new(Role::System, "Translate the following into French:"),
                ChatMessage::new(Role::User, "Hello"),
            ]
        );
    }

    #[tokio::test]
    async fn language_is_passed_verbatim() {
        let (_, chain) = chain();
        let out = chain.translate("hi", "Klingon (formal)").await.unwrap();
        assert_eq!(out, "Klingon (formal)|hi");
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let (_, chain) = chain();
        let inputs = vec![
            TranslationInput::new("one", "German"),
            TranslationInput::new("two", "Hindi"),
            TranslationInput::new("three", "Chinese"),
        ];

        let out = chain.batch(&inputs).await.unwrap();
        assert_eq!(out, vec!["German|one", "Hindi|two", "Chinese|three"]);
    }

    #[tokio::test]
    async fn batch_fails_on_first_error() {
        let (_, chain) = chain();
        let inputs = vec![
            TranslationInput::new("fine", "German"),
            TranslationInput::new("boom", "German"),
        ];
        let err = chain.batch(&inputs).await.unwrap_err();
        assert!(matches!(err, ChainError::Llm(LlmError::Upstream { .. })));
    }

    #[tokio::test]
    async fn stream_yields_parsed_chunks() {
        let (_, chain) = chain();
        let parts: Vec<String> = chain
            .stream(&TranslationInput::new("Hola", "Spanish"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(parts, vec!["Spanish", "Hola"]);
    }

    #[test]
    fn input_schema_lists_prompt_variables() {
        let (_, chain) = chain();
        let schema = chain.input_schema();
        assert_eq!(schema["required"], json!(["language", "text"]));
        assert_eq!(schema["properties"]["language"]["title"], "Language");
        assert_eq!(chain.output_schema()["type"], "string");
    }

    #[test]
    fn input_deserializes_from_wire_shape() {
        let input: TranslationInput =
            serde_json::from_value(json!({"language": "French", "text": "Hello"})).unwrap();
        assert_eq!(input, TranslationInput::new("Hello", "French"));
    }
}
