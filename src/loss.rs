//! Pairwise ranking losses.
//!
//! Both losses consume a pair of compatibility scores per example, one
//! for the positive and one for the sampled negative item, and produce
//! one loss value per example. No reduction is applied; averaging a
//! batch is the caller's responsibility. The losses never fail for
//! finite inputs; non-finite scores must be caught upstream.
use ndarray::{Array1, ArrayView1};

/// The logistic sigmoid.
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Bayesian Personalised Ranking loss for a single example:
/// the negated sigmoid of the score difference.
///
/// Strictly within (-1, 0) for finite scores, and decreasing as the
/// positive item pulls ahead of the negative.
pub fn bpr_loss(positive_score: f32, negative_score: f32) -> f32 {
    -sigmoid(positive_score - negative_score)
}

/// Pairwise hinge loss for a single example.
///
/// Zero once the positive score exceeds the negative score by at least
/// a margin of one; a linear penalty otherwise.
pub fn hinge_loss(positive_score: f32, negative_score: f32) -> f32 {
    (1.0 + negative_score - positive_score).max(0.0)
}

/// BPR loss over a batch of score pairs, one loss value per example.
///
/// # Panics
///
/// Panics if the two views differ in length.
pub fn bpr_loss_batch(
    positive_scores: ArrayView1<f32>,
    negative_scores: ArrayView1<f32>,
) -> Array1<f32> {
    assert_eq!(positive_scores.len(), negative_scores.len());

    Array1::from_vec(
        positive_scores
            .iter()
            .zip(negative_scores.iter())
            .map(|(&positive, &negative)| bpr_loss(positive, negative))
            .collect(),
    )
}

/// Hinge loss over a batch of score pairs, one loss value per example.
///
/// # Panics
///
/// Panics if the two views differ in length.
pub fn hinge_loss_batch(
    positive_scores: ArrayView1<f32>,
    negative_scores: ArrayView1<f32>,
) -> Array1<f32> {
    assert_eq!(positive_scores.len(), negative_scores.len());

    Array1::from_vec(
        positive_scores
            .iter()
            .zip(negative_scores.iter())
            .map(|(&positive, &negative)| hinge_loss(positive, negative))
            .collect(),
    )
}
