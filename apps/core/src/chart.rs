//! Text bar chart of the classifier's confidence in each response.

use crate::models::Prediction;
use std::fmt::Write;

const LABEL_WIDTH: usize = 32;
const BAR_WIDTH: usize = 40;

fn fit_label(label: &str) -> String {
    let count = label.chars().count();
    if count <= LABEL_WIDTH {
        format!("{:<width$}", label, width = LABEL_WIDTH)
    } else {
        let cut: String = label.chars().take(LABEL_WIDTH - 3).collect();
        format!("{}...", cut)
    }
}

/// One row per response: label, `#` bar scaled to the confidence, percentage.
/// The selected response is marked with `*`.
pub fn render(prediction: &Prediction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Confidence in responses for \"{}\"", prediction.input);

    for (i, (label, p)) in prediction
        .labels
        .iter()
        .zip(&prediction.probabilities)
        .enumerate()
    {
        let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        let filled = (p * BAR_WIDTH as f32).round() as usize;
        let marker = if i == prediction.best_index { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {} |{:<bar$}| {:>5.1}%",
            marker,
            fit_label(label),
            "#".repeat(filled),
            p * 100.0,
            bar = BAR_WIDTH
        );
    }

    out
}
