use std::sync::Arc;
use std::time::Duration;

use ai_client::ChatModel;
use persona_common::{AttributeField, PersonaError};
use tracing::{info, warn};

use crate::corpus::Corpus;

const ANALYSIS_GUIDANCE: &str = "Please analyze the content carefully and provide insights based on:
1. Language patterns and vocabulary used
2. Topics and subreddits they engage with
3. Timing and frequency of posts
4. Interaction style with other users
5. Interests and expertise areas
6. Geographic or cultural references
7. Professional or academic mentions
8. Personal challenges or goals mentioned

IMPORTANT: Respond with ONLY valid JSON. No additional text, explanations, or markdown formatting.";

fn field_hint(field: AttributeField) -> &'static str {
    match field {
        AttributeField::Name => "Persona name (e.g., 'Tech-Savvy Gamer' or 'Aspiring Developer')",
        AttributeField::AgeRange => "Estimated age range (e.g., '25-35')",
        AttributeField::Location => "Estimated location/region if mentioned",
        AttributeField::Occupation => "Estimated profession/occupation",
        AttributeField::Interests => "List of interests and hobbies",
        AttributeField::PersonalityTraits => "List of personality characteristics",
        AttributeField::CommunicationStyle => "Description of how they communicate",
        AttributeField::GoalsMotivations => "List of goals and motivations",
        AttributeField::PainPoints => "List of challenges and frustrations",
        AttributeField::TechnicalProficiency => "Level of technical skills",
        AttributeField::SocialBehavior => "How they interact socially online",
        AttributeField::ContentPreferences => "Types of content they engage with",
        AttributeField::ActivityPatterns => "When and how often they post",
    }
}

/// The JSON shape the model must answer with, one line per field.
fn response_shape() -> String {
    let lines: Vec<String> = AttributeField::ALL
        .iter()
        .map(|field| {
            let hint = field_hint(*field);
            if field.is_list() {
                format!("    \"{}\": [\"{hint}\"]", field.key())
            } else {
                format!("    \"{}\": \"{hint}\"", field.key())
            }
        })
        .collect();
    format!("{{\n{}\n}}", lines.join(",\n"))
}

/// Single-shot attribute extraction against a generative model.
pub struct AttributeExtractor {
    model: Arc<dyn ChatModel>,
    timeout: Option<Duration>,
}

impl AttributeExtractor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            timeout: None,
        }
    }

    /// Bound the model call. Without one the call may take as long as the provider does.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model()
    }

    pub fn build_prompt(username: &str, corpus: &Corpus) -> String {
        format!(
            "Analyze the following Reddit user's posts and comments to create a detailed user persona.\n\
             Username: {username}\n\n\
             Based on the content below, provide a JSON response with the following structure:\n\
             {shape}\n\n\
             Reddit Data:\n\
             {data}\n\n\
             {ANALYSIS_GUIDANCE}\n",
            shape = response_shape(),
            data = corpus.text,
        )
    }

    /// Call the model exactly once and return its raw text.
    ///
    /// An empty reply comes back as `""` for the recoverer to default. Every
    /// other failure is a transport error.
    pub async fn extract(&self, username: &str, corpus: &Corpus) -> Result<String, PersonaError> {
        let prompt = Self::build_prompt(username, corpus);
        info!(
            username,
            model = self.model.model(),
            items = corpus.item_count,
            prompt_chars = prompt.chars().count(),
            "Sending corpus to model for analysis"
        );

        let call = self.model.complete(&prompt);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                PersonaError::ModelTransport(format!(
                    "model call timed out after {}s",
                    limit.as_secs()
                ))
            })?,
            None => call.await,
        };

        match result {
            Ok(text) => Ok(text),
            Err(e) if e.is_transport() => Err(PersonaError::ModelTransport(e.to_string())),
            Err(e) => {
                warn!(username, error = %e, "Model returned no content");
                Ok(String::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::build_corpus;
    use crate::testing::{post_item, MockChatModel};

    fn corpus() -> Corpus {
        build_corpus(&[post_item("https://reddit.com/r/a/1", "Hello", "World")])
    }

    #[test]
    fn prompt_names_every_field_once() {
        let prompt = AttributeExtractor::build_prompt("spez", &corpus());
        for field in AttributeField::ALL {
            assert_eq!(
                prompt.matches(&format!("\"{}\":", field.key())).count(),
                1,
                "{field}"
            );
        }
        assert!(prompt.contains("Username: spez\n"));
        assert!(prompt.contains("Reddit Data:\nPost 1:\n"));
        assert!(prompt.contains("\"interests\": [\"List of interests and hobbies\"]"));
        assert!(prompt.trim_end().ends_with("markdown formatting."));
    }

    #[test]
    fn response_shape_is_valid_json() {
        let shape: serde_json::Value = serde_json::from_str(&response_shape()).unwrap();
        assert_eq!(shape.as_object().unwrap().len(), AttributeField::ALL.len());
    }

    #[tokio::test]
    async fn calls_model_exactly_once() {
        let model = Arc::new(MockChatModel::replying("{}"));
        let extractor = AttributeExtractor::new(model.clone());

        let reply = extractor.extract("spez", &corpus()).await.unwrap();
        assert_eq!(reply, "{}");
        assert_eq!(model.calls(), 1);
        assert!(model.last_prompt().unwrap().contains("URL: https://reddit.com/r/a/1"));
    }

    #[tokio::test]
    async fn empty_reply_is_content_not_transport() {
        let model = Arc::new(MockChatModel::empty());
        let extractor = AttributeExtractor::new(model);
        assert_eq!(extractor.extract("spez", &corpus()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn transport_error_propagates() {
        let model = Arc::new(MockChatModel::failing("connection refused"));
        let extractor = AttributeExtractor::new(model.clone());

        let err = extractor.extract("spez", &corpus()).await.unwrap_err();
        assert!(matches!(err, PersonaError::ModelTransport(_)));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn timeout_is_transport_error() {
        let model = Arc::new(MockChatModel::replying("{}").with_delay(Duration::from_millis(200)));
        let extractor =
            AttributeExtractor::new(model).with_timeout(Some(Duration::from_millis(10)));

        let err = extractor.extract("spez", &corpus()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
