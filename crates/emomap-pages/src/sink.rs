//! Where page controllers hand newly created or deleted emotions

use async_trait::async_trait;
use emomap_core::{EmotionId, EmotionRecord, SessionContext};
use emomap_map::{MapController, MapResult};
use parking_lot::Mutex;

/// Receiver of emotion changes made on a page
#[async_trait]
pub trait EmotionSink: Send + Sync {
    /// Show a freshly created record
    async fn publish(&self, record: EmotionRecord, session: &SessionContext) -> MapResult<()>;

    /// Forget a deleted record
    fn withdraw(&self, id: EmotionId);
}

#[async_trait]
impl EmotionSink for MapController {
    async fn publish(&self, record: EmotionRecord, session: &SessionContext) -> MapResult<()> {
        self.add_emotion(record, session).await
    }

    fn withdraw(&self, id: EmotionId) {
        self.remove_emotion(id);
    }
}

/// Sink that only remembers what it was given
#[derive(Debug, Default)]
pub struct RecordingSink {
    published: Mutex<Vec<EmotionRecord>>,
    withdrawn: Mutex<Vec<EmotionId>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<EmotionRecord> {
        self.published.lock().clone()
    }

    pub fn withdrawn(&self) -> Vec<EmotionId> {
        self.withdrawn.lock().clone()
    }
}

#[async_trait]
impl EmotionSink for RecordingSink {
    async fn publish(&self, record: EmotionRecord, _session: &SessionContext) -> MapResult<()> {
        self.published.lock().push(record);
        Ok(())
    }

    fn withdraw(&self, id: EmotionId) {
        self.withdrawn.lock().push(id);
    }
}
