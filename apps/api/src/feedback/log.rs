//! Append-only JSONL feedback log.
//!
//! One JSON object per line; lines are never rewritten. Appends are serialized
//! by an async mutex so concurrent submissions stay line-atomic. Reads scan
//! the whole file and skip unparseable lines.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::feedback::types::{
    FeedbackListing, FeedbackRecord, FeedbackRequest, FeedbackStats, Rating,
};

pub const DEFAULT_LIST_LIMIT: usize = 50;

pub struct FeedbackLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FeedbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamps the submission with an id, timestamp, and requester metadata,
    /// then appends it as one line. Returns the stored record.
    pub async fn append(
        &self,
        submission: FeedbackRequest,
        user_agent: String,
        ip: String,
    ) -> Result<FeedbackRecord> {
        let record = FeedbackRecord {
            submission,
            feedback_id: generate_feedback_id(),
            timestamp: Utc::now().to_rfc3339(),
            user_agent,
            ip,
        };

        let mut line = serde_json::to_string(&record).context("Failed to serialize feedback")?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .context("Failed to append feedback line")?;
        file.flush().await.context("Failed to flush feedback log")?;

        Ok(record)
    }

    /// Reads every record in the log. A missing file is an empty log;
    /// corrupt lines are skipped.
    pub async fn read_all(&self) -> Result<Vec<FeedbackRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    /// Admin listing: stats over the full log, then the most recent `limit`
    /// records (optionally filtered by rating), newest first.
    pub async fn list(&self, rating: Option<Rating>, limit: usize) -> Result<FeedbackListing> {
        let all = self.read_all().await?;

        let stats = FeedbackStats {
            satisfied: all
                .iter()
                .filter(|r| r.submission.rating == Rating::Satisfied)
                .count(),
            needs_improvement: all
                .iter()
                .filter(|r| r.submission.rating == Rating::NeedsImprovement)
                .count(),
        };
        let total = all.len();

        let mut feedbacks: Vec<FeedbackRecord> = match rating {
            Some(rating) => all
                .into_iter()
                .filter(|r| r.submission.rating == rating)
                .collect(),
            None => all,
        };
        // RFC 3339 timestamps in UTC sort lexicographically
        feedbacks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        feedbacks.truncate(limit);

        Ok(FeedbackListing {
            feedbacks,
            total,
            stats,
        })
    }
}

fn generate_feedback_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("fb_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}
