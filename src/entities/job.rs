//! Job postings

use crate::core::field::{FieldValue, parse_instant};
use crate::core::item::Listable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Label rendered when a posting has no usable date
pub const DATE_UNAVAILABLE: &str = "Date unavailable";

/// A job posted by an employer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    #[serde(rename = "jobCategory", alias = "category")]
    pub category: String,
    pub location: String,
    /// Pay in KSH per `pay_period`
    #[serde(default)]
    pub pay: Option<i64>,
    #[serde(default)]
    pub pay_period: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub employer_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Posting time as stored, RFC 3339 or `YYYY-MM-DD`
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Job {
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_instant)
    }

    /// Human label for the posting date relative to `now`
    ///
    /// "Today", "Yesterday" and "N days ago" within a week, the calendar
    /// date after that. Postings dated in the future read as "Today".
    pub fn posted_label(&self, now: DateTime<Utc>) -> String {
        let Some(posted) = self.posted_at() else {
            return DATE_UNAVAILABLE.to_string();
        };
        match (now - posted).num_days() {
            days if days <= 0 => "Today".to_string(),
            1 => "Yesterday".to_string(),
            days if days < 7 => format!("{} days ago", days),
            _ => posted.format("%Y-%m-%d").to_string(),
        }
    }
}

impl Listable for Job {
    fn collection() -> &'static str {
        "jobs"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        let text = |s: &str| Some(FieldValue::String(s.to_string()));
        match field {
            "title" => text(&self.title),
            "category" => text(&self.category),
            "location" => text(&self.location),
            "pay" => self.pay.map(FieldValue::Integer),
            "status" => self.status.as_deref().and_then(text),
            "employer_id" => self.employer_id.as_deref().and_then(text),
            "created_at" => self.created_at.as_deref().and_then(text),
            _ => None,
        }
    }

    fn search_text(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.location.as_str()]
    }
}

/// Payload for posting a new job
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    #[validate(length(min = 3, max = 120, message = "title must be 3 to 120 characters"))]
    pub title: String,

    #[serde(rename = "jobCategory", alias = "category")]
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,

    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,

    #[validate(range(min = 1, message = "pay must be positive"))]
    pub pay: i64,

    #[serde(default)]
    pub pay_period: Option<String>,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    #[validate(length(max = 2000, message = "description is too long"))]
    pub description: Option<String>,

    #[serde(default)]
    pub employer_id: Option<String>,
}

impl NewJob {
    /// Turn the payload into an open posting stamped at `now`
    pub fn into_job(self, id: impl Into<String>, now: DateTime<Utc>) -> Job {
        Job {
            id: id.into(),
            title: self.title.trim().to_string(),
            category: self.category,
            location: self.location.trim().to_string(),
            pay: Some(self.pay),
            pay_period: Some(self.pay_period.unwrap_or_else(|| "daily".to_string())),
            requirements: self.requirements,
            description: self.description,
            employer_id: self.employer_id,
            status: Some("open".to_string()),
            created_at: Some(now.to_rfc3339()),
        }
    }
}
