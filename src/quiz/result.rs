//! Outcome selection and the result-screen view built from it.

use serde::Serialize;

use super::model::{QuizConfig, QuizOption};
use super::state::Scores;

/// Id of the highest-scoring option.
///
/// Options are scanned in configured order and replaced only on a strictly
/// greater score, so ties go to the earlier option. Missing scores count as 0.
pub fn pick_result<'a>(options: &'a [QuizOption], scores: &Scores) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for option in options {
        let score = scores.get(&option.id).copied().unwrap_or(0.0);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((option.id.as_str(), score));
        }
    }
    best.map(|(id, _)| id)
}

/// A call-to-action link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cta {
    pub url: String,
    pub label: String,
}

/// Terminal outcome of a run, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub id: String,
    pub label: String,
    pub text: Option<String>,
    pub photo_url: Option<String>,
    pub cta: Cta,
    pub secondary_cta: Option<Cta>,
    /// True when chosen by a `next` directive instead of by score.
    pub forced: bool,
}

/// Resolve the outcome for a run, either the forced id or the score winner.
///
/// An unknown forced id resolves to a stub whose label is the id.
pub fn resolve_outcome(config: &QuizConfig, forced: Option<&str>, scores: &Scores) -> Outcome {
    let id = match forced {
        Some(id) => id.to_string(),
        None => pick_result(&config.options, scores)
            .unwrap_or_default()
            .to_string(),
    };
    let option = config
        .option(&id)
        .cloned()
        .unwrap_or_else(|| QuizOption::stub(&id));
    let note = config.result_note(&id).cloned().unwrap_or_default();

    let cta = Cta {
        url: first_of([
            note.cta_url.as_deref(),
            option.cta.as_deref(),
            config.cta_url.as_deref(),
        ])
        .unwrap_or("#")
        .to_string(),
        label: first_of([
            note.cta_label.as_deref(),
            option.cta_label.as_deref(),
            config.cta_label.as_deref(),
        ])
        .unwrap_or("Continue")
        .to_string(),
    };

    let secondary_cta = match (
        first_of([note.cta2_url.as_deref(), config.cta2_url.as_deref()]),
        first_of([note.cta2_label.as_deref(), config.cta2_label.as_deref()]),
    ) {
        (Some(url), Some(label)) => Some(Cta {
            url: url.to_string(),
            label: label.to_string(),
        }),
        _ => None,
    };

    let label = if option.label.is_empty() {
        "Result".to_string()
    } else {
        option.label
    };

    Outcome {
        id,
        label,
        text: note.text.filter(|t| !t.is_empty()),
        photo_url: note.photo_url.filter(|p| !p.is_empty()),
        cta,
        secondary_cta,
        forced: forced.is_some(),
    }
}

/// First non-empty candidate.
fn first_of<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates.into_iter().flatten().find(|c| !c.is_empty())
}
