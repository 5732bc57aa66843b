//! Evaluation attacher: turns caller criteria into an [`Evaluation`].

use scriptorium_core::{Evaluation, EvaluationCriteria, EvaluationMethod, GenerationRun};
use scriptorium_error::PipelineError;
use tracing::debug;

const PRODUCT_HEADING: &str = "## Product";
const DETAILS_HEADING: &str = "## Details";
const SCRIPT_HEADING: &str = "## Script";

/// Script length (in words) that reads comfortably as a short spoken ad.
const COMFORTABLE_WORDS: std::ops::RangeInclusive<usize> = 12..=80;

/// Computes or validates evaluations against a run.
///
/// Stateless: the result depends only on the run and the criteria (apart from
/// the `evaluatedAt` timestamp). Persisting the result is the caller's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationAttacher;

impl EvaluationAttacher {
    /// Create an attacher.
    pub fn new() -> Self {
        Self
    }

    /// Build the evaluation described by `criteria` for `run`.
    ///
    /// The evaluated variant defaults to the run's selected variant. A supplied
    /// score is kept as is; a missing score is computed with [`heuristic_score`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the criteria name a variant outside the run, or
    /// supply a score that is not a finite number within `[0, 100]`.
    pub fn evaluate(
        &self,
        run: &GenerationRun,
        criteria: &EvaluationCriteria,
    ) -> Result<Evaluation, PipelineError> {
        let variant_id = criteria
            .evaluated_variant_id()
            .as_deref()
            .unwrap_or(run.selected_variant_id());

        let variant = run.variant(variant_id).ok_or_else(|| {
            PipelineError::invalid_request(format!(
                "evaluatedVariantId '{}' is not part of run '{}'",
                variant_id,
                run.id()
            ))
        })?;

        let evaluation = match criteria.score() {
            Some(score) if !score.is_finite() || !(0.0..=100.0).contains(score) => {
                return Err(PipelineError::invalid_request(format!(
                    "score must be a number within [0, 100], got {}",
                    score
                )));
            }
            Some(score) => Evaluation::new(
                *score,
                criteria.notes().clone().unwrap_or_default(),
                variant.id(),
                EvaluationMethod::Provided,
            ),
            None => {
                let score = heuristic_score(variant.content());
                let notes = criteria.notes().clone().unwrap_or_else(|| {
                    "Scored from content structure, script length and product mention".to_string()
                });
                Evaluation::new(score, notes, variant.id(), EvaluationMethod::Heuristic)
            }
        };

        debug!(
            run_id = %run.id(),
            variant_id = %variant.id(),
            score = evaluation.score(),
            method = %evaluation.method(),
            "Evaluation computed"
        );
        Ok(evaluation)
    }
}

/// Deterministic quality score in `[0, 100]` for sectioned variant content.
///
/// Rewards a named `## Product` block, a `## Details` block, a non-empty
/// `## Script` block of comfortable length, and a script that mentions the
/// product by name.
pub fn heuristic_score(content: &str) -> f64 {
    let sections = Sections::parse(content);
    let mut score = 10.0;

    let product = sections.product.as_deref().map(str::trim).unwrap_or("");
    if !product.is_empty() {
        score += 20.0;
    }
    if sections.details {
        score += 10.0;
    }

    let words = sections.script.split_whitespace().count();
    if words > 0 {
        score += 20.0;
        score += if COMFORTABLE_WORDS.contains(&words) {
            20.0
        } else {
            10.0
        };
    }

    if !product.is_empty()
        && sections
            .script
            .to_lowercase()
            .contains(&product.to_lowercase())
    {
        score += 20.0;
    }

    f64::min(score, 100.0)
}

#[derive(Debug, Default)]
struct Sections {
    product: Option<String>,
    details: bool,
    script: String,
}

impl Sections {
    fn parse(content: &str) -> Self {
        let mut sections = Sections::default();
        let mut current = "";

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("## ") {
                current = trimmed;
                if current == DETAILS_HEADING {
                    sections.details = true;
                }
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }
            match current {
                PRODUCT_HEADING if sections.product.is_none() => {
                    sections.product = Some(trimmed.to_string());
                }
                SCRIPT_HEADING => {
                    if !sections.script.is_empty() {
                        sections.script.push(' ');
                    }
                    sections.script.push_str(trimmed);
                }
                _ => {}
            }
        }
        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_core::{GeneratorInfo, ScriptVariant};

    fn run() -> GenerationRun {
        GenerationRun::new(
            "run_1",
            "p1",
            vec![
                ScriptVariant::new(
                    "v1",
                    "Variant A",
                    "## Product\nGlow Serum\n\n## Script\nSay hello to Glow Serum!",
                ),
                ScriptVariant::new("v2", "Variant B", "plain text"),
            ],
            GeneratorInfo::new("template", true),
        )
        .expect("valid run")
    }

    #[test]
    fn defaults_to_selected_variant() {
        let criteria = EvaluationCriteria::builder()
            .score(85.0)
            .notes("ok")
            .build()
            .expect("criteria");
        let evaluation = EvaluationAttacher::new()
            .evaluate(&run(), &criteria)
            .expect("evaluated");

        assert_eq!(*evaluation.score(), 85.0);
        assert_eq!(evaluation.notes(), "ok");
        assert_eq!(evaluation.evaluated_variant_id(), "v1");
        assert_eq!(*evaluation.method(), EvaluationMethod::Provided);
    }

    #[test]
    fn rejects_foreign_variant_and_bad_scores() {
        let attacher = EvaluationAttacher::new();

        let foreign = EvaluationCriteria::builder()
            .evaluated_variant_id("elsewhere")
            .build()
            .expect("criteria");
        assert!(attacher.evaluate(&run(), &foreign).is_err());

        for score in [-1.0, 100.5, f64::NAN, f64::INFINITY] {
            let criteria = EvaluationCriteria::builder()
                .score(score)
                .build()
                .expect("criteria");
            assert!(attacher.evaluate(&run(), &criteria).is_err(), "{}", score);
        }
    }

    #[test]
    fn missing_score_is_computed() {
        let criteria = EvaluationCriteria::builder()
            .evaluated_variant_id("v2")
            .build()
            .expect("criteria");
        let evaluation = EvaluationAttacher::new()
            .evaluate(&run(), &criteria)
            .expect("evaluated");

        assert_eq!(*evaluation.method(), EvaluationMethod::Heuristic);
        assert_eq!(*evaluation.score(), heuristic_score("plain text"));
        assert!(!evaluation.notes().is_empty());
    }

    #[test]
    fn heuristic_rewards_structure() {
        assert_eq!(heuristic_score("plain text"), 10.0);

        let full = "## Product\nGlow Serum\n\n## Details\n- size: 30ml\n\n## Script\n\
                    Meet Glow Serum, the lightweight daily serum that leaves your skin \
                    soft, bright and ready for whatever the day brings.";
        assert_eq!(heuristic_score(full), 100.0);

        let short = "## Product\nGlow Serum\n\n## Script\nBuy now!";
        assert_eq!(heuristic_score(short), 60.0);
    }
}
