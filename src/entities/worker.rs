//! Worker profiles

use crate::core::field::FieldValue;
use crate::core::item::Listable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Value of `user_type` marking a worker account
pub const WORKER_USER_TYPE: &str = "worker";

/// Self-declared experience level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl ExperienceLevel {
    /// Numeric rank used by the "most experienced" order
    pub fn rank(&self) -> i64 {
        match self {
            ExperienceLevel::Beginner => 1,
            ExperienceLevel::Intermediate => 2,
            ExperienceLevel::Expert => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "Beginner",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Expert => "Expert",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(ExperienceLevel::Beginner),
            "intermediate" => Ok(ExperienceLevel::Intermediate),
            "expert" => Ok(ExperienceLevel::Expert),
            other => Err(format!("unknown experience level '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerProfile {
    pub skills: Vec<String>,
    /// Free text as stored; see [`Worker::experience_level`]
    pub experience: Option<String>,
    pub location: Option<String>,
    pub rating: Option<f64>,
    pub bio: Option<String>,
}

/// A user document of a worker account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub user_type: String,
    #[serde(default)]
    pub profile: WorkerProfile,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Worker {
    pub fn experience_level(&self) -> Option<ExperienceLevel> {
        self.profile.experience.as_deref()?.parse().ok()
    }
}

impl Listable for Worker {
    /// Workers live in the shared users collection
    fn collection() -> &'static str {
        "users"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        let text = |s: &str| Some(FieldValue::String(s.to_string()));
        match field {
            "name" => text(&self.name),
            "user_type" => text(&self.user_type),
            "skills" => Some(FieldValue::List(self.profile.skills.clone())),
            "experience" => self.profile.experience.as_deref().and_then(text),
            "location" => self.profile.location.as_deref().and_then(text),
            "rating" => self.profile.rating.map(FieldValue::Float),
            "experience_rank" => self
                .experience_level()
                .map(|level| FieldValue::Integer(level.rank())),
            "created_at" => self.created_at.as_deref().and_then(text),
            _ => None,
        }
    }

    fn search_text(&self) -> Vec<&str> {
        let mut text = vec![self.name.as_str()];
        text.extend(self.profile.location.as_deref());
        text
    }
}
