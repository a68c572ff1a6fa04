use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default response stored for a phrase the first time it is seen.
pub fn echo_response(phrase: &str) -> String {
    format!("You said: \"{}\"", phrase)
}

/// Learned phrases and their responses, kept as two parallel lists.
///
/// `phrases[i]` maps to `responses[i]`; both lists always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    phrases: Vec<String>,
    responses: Vec<String>,
}

impl Memory {
    /// Builds a memory from persisted lists, truncating the longer one if they disagree.
    pub fn from_parts(mut phrases: Vec<String>, mut responses: Vec<String>) -> Self {
        let len = phrases.len().min(responses.len());
        phrases.truncate(len);
        responses.truncate(len);
        Self { phrases, responses }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Exact-text lookup of a phrase.
    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.iter().any(|p| p == phrase)
    }

    /// Appends a new pair. Returns `false` (and changes nothing) if the phrase is already known.
    pub fn learn(&mut self, phrase: &str, response: String) -> bool {
        if self.contains(phrase) {
            return false;
        }
        self.phrases.push(phrase.to_string());
        self.responses.push(response);
        true
    }

    /// Keeps only the newest `max_len` pairs, preserving order. Returns how many were evicted.
    pub fn trim(&mut self, max_len: usize) -> usize {
        if self.phrases.len() <= max_len {
            return 0;
        }
        let excess = self.phrases.len() - max_len;
        self.phrases.drain(..excess);
        self.responses.drain(..excess);
        excess
    }

    /// Phrase/response pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.phrases
            .iter()
            .zip(self.responses.iter())
            .map(|(p, r)| (p.as_str(), r.as_str()))
    }
}

/// One exchange recorded in the chat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub prompt: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatEntry {
    pub fn now(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            timestamp: Some(Utc::now()),
        }
    }
}

/// Confidence of the classifier in each known response for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub input: String,
    pub labels: Vec<String>,
    pub probabilities: Vec<f32>,
    pub best_index: usize,
}

/// What the brain answered to a submission.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub text: String,
    /// `true` when this submission taught a new phrase (and retrained the model).
    pub learned: bool,
    pub prediction: Option<Prediction>,
}

/// Outcome of one unattended self-thought cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Thought {
    pub phrase: String,
    pub text: String,
    pub prediction: Option<Prediction>,
}
