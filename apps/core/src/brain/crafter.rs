//! Keyword-driven post-processing of the classifier's answer.
//!
//! Rules are checked in a fixed order and the first match wins:
//! arithmetic, advice, joke, factual question, mood, then a plain echo.

use super::arithmetic::Expression;
use crate::actors::traits::AdviceActor;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const JOKE: &str =
    "Why did the neural network break up with the dataset? It found too many outliers.";
pub const FACTUAL_DEFLECTION: &str =
    "I don't know many facts yet. I only know what you've taught me!";
pub const MOOD_SUPPORT: &str =
    "I'm sorry you're feeling that way. I'm here if you want to talk.";
pub const ADVICE_FALLBACK: &str = "Sorry, I couldn't reach my advice source right now.";
pub const ARITHMETIC_ERROR: &str = "Hmm, I couldn't compute that.";

// NOTE: expect() is acceptable here: patterns are compile-time constants.
static ADVICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)advice").expect("Invalid regex: advice keyword"),
        Regex::new(r"(?i)what should i do").expect("Invalid regex: advice question"),
        Regex::new(r"(?i)any tips").expect("Invalid regex: tips request"),
    ]
});

static JOKE_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| vec![Regex::new(r"(?i)joke").expect("Invalid regex: joke keyword")]);

static FACTUAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?i)^\s*(what is|who is|where is)").expect("Invalid regex: factual prefixes")]
});

static MOOD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)sad").expect("Invalid regex: sad keyword"),
        Regex::new(r"(?i)lonely").expect("Invalid regex: lonely keyword"),
    ]
});

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Which rule applies to an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CraftRule {
    Arithmetic(Expression),
    Advice,
    Joke,
    Factual,
    Mood,
    Echo,
}

impl CraftRule {
    /// Selects the first matching rule for `input`.
    pub fn select(input: &str) -> Self {
        if let Some(expression) = Expression::find(input) {
            return CraftRule::Arithmetic(expression);
        }
        if any_match(&ADVICE_PATTERNS, input) {
            return CraftRule::Advice;
        }
        if any_match(&JOKE_PATTERNS, input) {
            return CraftRule::Joke;
        }
        if any_match(&FACTUAL_PATTERNS, input) {
            return CraftRule::Factual;
        }
        if any_match(&MOOD_PATTERNS, input) {
            return CraftRule::Mood;
        }
        CraftRule::Echo
    }

    pub fn label(&self) -> &'static str {
        match self {
            CraftRule::Arithmetic(_) => "arithmetic",
            CraftRule::Advice => "advice",
            CraftRule::Joke => "joke",
            CraftRule::Factual => "factual",
            CraftRule::Mood => "mood",
            CraftRule::Echo => "echo",
        }
    }
}

/// Turns the classifier's `base` response into the final reply for `input`.
///
/// Only the advice rule does I/O; its failures become [`ADVICE_FALLBACK`].
pub async fn craft<A>(base: &str, input: &str, advice: &A) -> String
where
    A: AdviceActor + ?Sized,
{
    let rule = CraftRule::select(input);
    debug!(rule = rule.label(), "Crafting reply");
    match rule {
        CraftRule::Arithmetic(expression) => match expression.evaluate() {
            Ok(value) => format!("The answer is {}.", value),
            Err(e) => {
                warn!("Could not evaluate '{}': {}", input, e);
                ARITHMETIC_ERROR.to_string()
            }
        },
        CraftRule::Advice => match advice.fetch_advice().await {
            Ok(text) => format!("Here's some advice: {}", text),
            Err(e) => {
                warn!("Advice fetch failed: {}", e);
                ADVICE_FALLBACK.to_string()
            }
        },
        CraftRule::Joke => JOKE.to_string(),
        CraftRule::Factual => FACTUAL_DEFLECTION.to_string(),
        CraftRule::Mood => MOOD_SUPPORT.to_string(),
        CraftRule::Echo => format!("{} (and now you said \"{}\")", base, input),
    }
}
