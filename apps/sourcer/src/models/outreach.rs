//! Outreach bookkeeping — one record per (fingerprint, job, channel) enforces
//! at-most-once contact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outbound contact channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Greet,
    Reply,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Greet => "greet",
            Channel::Reply => "reply",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachStatus {
    Success,
    Duplicate,
    Failed,
}

/// Persistent record of an outreach attempt. Created on the first attempt
/// for a key and updated in place on retries — never replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachRecord {
    pub candidate_fingerprint: String,
    pub job_id: Uuid,
    pub channel: Channel,
    pub last_attempt_at: DateTime<Utc>,
    pub attempts: u32,
    pub status: OutreachStatus,
}

impl OutreachRecord {
    pub fn key(&self) -> String {
        outreach_key(&self.candidate_fingerprint, self.job_id, self.channel)
    }
}

/// Map key for the (fingerprint, job, channel) tuple.
pub fn outreach_key(fingerprint: &str, job_id: Uuid, channel: Channel) -> String {
    format!("{fingerprint}|{job_id}|{}", channel.as_str())
}
