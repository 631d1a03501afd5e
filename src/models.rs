use serde::{Deserialize, Serialize};

/// A tracked study topic with its current results and past review cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub id: i64,
    pub name: String,
    // None for records saved before keys were introduced
    pub name_key: Option<String>,
    // Unix millis of the last revision
    pub revised_at: Option<i64>,
    // RFC 3339 or plain YYYY-MM-DD
    pub revision_date: Option<String>,
    pub result_before: String,
    pub result_after: String,
    pub percent_before: f64,
    pub percent_after: f64,
    pub confidence: String,
    pub tags: Vec<String>,
    pub history: Vec<CycleSnapshot>,
    pub cycle_count: usize,
}

impl TopicRecord {
    pub fn confidence_level(&self) -> Confidence {
        Confidence::from_label(&self.confidence)
    }
}

/// The state of a topic right before it was re-submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSnapshot {
    pub date: String,
    pub result_before: String,
    pub result_after: String,
    pub confidence: String,
}

/// One study-and-self-test event as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub name: String,
    pub result_before: String,
    pub result_after: String,
    pub confidence: String,
    pub tags: Vec<String>,
}

// Self-reported confidence, parsed from a free-text label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    Neutral,
}

impl Confidence {
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "baixo" | "baixa" | "low" => Confidence::Low,
            "médio" | "média" | "medio" | "media" | "medium" => Confidence::Medium,
            _ => Confidence::Neutral,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::Neutral => "Neutral",
        }
    }
}

// Urgency tier, always derived from a record and "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuraTier {
    Urgent,
    Unstable,
    Consolidated,
}

impl AuraTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuraTier::Urgent => "urgent",
            AuraTier::Unstable => "unstable",
            AuraTier::Consolidated => "consolidated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "urgent" | "u" => Some(AuraTier::Urgent),
            "unstable" | "i" => Some(AuraTier::Unstable),
            "consolidated" | "c" => Some(AuraTier::Consolidated),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuraTier::Urgent => "Urgent",
            AuraTier::Unstable => "Unstable",
            AuraTier::Consolidated => "Consolidated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub topic_count: i64,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
