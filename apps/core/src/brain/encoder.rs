//! Text → scalar feature encoding.
//!
//! Both policies are deliberately lossy hashes; many phrases share a feature.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a phrase is reduced to the single input feature of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingPolicy {
    /// Number of whitespace-separated tokens, modulo 10.
    WordCount,
    /// Sum of the lowercase character codes, modulo 100.
    CharSum,
}

impl EncodingPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            EncodingPolicy::WordCount => "word_count",
            EncodingPolicy::CharSum => "char_sum",
        }
    }

    /// Encodes `text` into the classifier's input feature.
    pub fn encode(&self, text: &str) -> f32 {
        let lowered = text.to_lowercase();
        match self {
            EncodingPolicy::WordCount => (token_count(&lowered) % 10) as f32,
            EncodingPolicy::CharSum => {
                let sum = lowered
                    .encode_utf16()
                    .fold(0u64, |acc, unit| acc + u64::from(unit));
                (sum % 100) as f32
            }
        }
    }
}

/// Number of pieces a split on whitespace runs produces. Empty leading and
/// trailing pieces count, so `""` is one token and `" a"` is two.
fn token_count(text: &str) -> usize {
    let mut runs = 0;
    let mut in_gap = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_gap {
                runs += 1;
                in_gap = true;
            }
        } else {
            in_gap = false;
        }
    }
    runs + 1
}

impl fmt::Display for EncodingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for EncodingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "word_count" | "wordcount" | "words" => Ok(EncodingPolicy::WordCount),
            "char_sum" | "charsum" | "chars" => Ok(EncodingPolicy::CharSum),
            other => Err(format!("unknown encoding policy '{}'", other)),
        }
    }
}
