// Test mocks for the persona pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockChatModel (ChatModel): scripted replies, records prompts
// - MockItemSource (ItemSource): fixed items or a fixed acquisition error
//
// Plus builders for NormalizedItem.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use ai_client::{AiError, ChatModel};
use async_trait::async_trait;
use chrono::DateTime;
use persona_common::{ItemKind, NormalizedItem, PersonaError};

use crate::traits::{Acquired, ItemSource, ScrapeStats};

/// 2023-11-14T22:13:20Z, the timestamp every built item carries.
pub const TEST_CREATED_UTC: i64 = 1_700_000_000;

// ---------------------------------------------------------------------------
// MockChatModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    /// Provider answered with no content.
    Empty,
    /// Transport failure with this message.
    Fail(String),
}

/// Replies are served in order; the last one repeats.
pub struct MockChatModel {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockChatModel {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Reply::Text(text.to_string())])
    }

    pub fn empty() -> Self {
        Self::new(vec![Reply::Empty])
    }

    pub fn failing(message: &str) -> Self {
        Self::new(vec![Reply::Fail(message.to_string())])
    }

    /// Sleep before answering, for timeout tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap_or(Reply::Empty)
        } else {
            replies.front().cloned().unwrap_or(Reply::Empty)
        }
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, prompt: &str) -> ai_client::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply() {
            Reply::Text(text) => Ok(text),
            Reply::Empty => Err(AiError::EmptyResponse),
            Reply::Fail(message) => Err(AiError::Network(message)),
        }
    }
}

// ---------------------------------------------------------------------------
// MockItemSource
// ---------------------------------------------------------------------------

pub struct MockItemSource {
    items: Vec<NormalizedItem>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockItemSource {
    pub fn new(items: Vec<NormalizedItem>) -> Self {
        Self {
            items,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Every `acquire` fails with an acquisition error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            items: Vec::new(),
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemSource for MockItemSource {
    async fn acquire(&self, _username: &str) -> Result<Acquired, PersonaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(PersonaError::Acquisition(message.clone()));
        }

        let posts = self.items.iter().filter(|i| i.kind == ItemKind::Post).count() as u32;
        Ok(Acquired {
            items: self.items.clone(),
            stats: ScrapeStats {
                posts,
                comments: self.items.len() as u32 - posts,
                skipped: 0,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Item builders
// ---------------------------------------------------------------------------

/// A post in r/test with score 1.
pub fn post_item(url: &str, title: &str, body: &str) -> NormalizedItem {
    NormalizedItem {
        title: title.to_string(),
        body: body.to_string(),
        community: "test".to_string(),
        score: 1,
        created_at: DateTime::from_timestamp(TEST_CREATED_UTC, 0).unwrap_or_default(),
        source_url: url.to_string(),
        kind: ItemKind::Post,
        parent_context: None,
    }
}

pub fn comment_item(url: &str, body: &str, parent: Option<&str>) -> NormalizedItem {
    NormalizedItem {
        title: "Comment in r/test".to_string(),
        body: body.to_string(),
        community: "test".to_string(),
        score: 1,
        created_at: DateTime::from_timestamp(TEST_CREATED_UTC, 0).unwrap_or_default(),
        source_url: url.to_string(),
        kind: ItemKind::Comment,
        parent_context: parent.map(str::to_string),
    }
}
