//! Models module.
pub mod factorization;

use loss;

/// The loss used for training a model.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Loss {
    /// Bayesian Personalised Ranking.
    BPR,
    /// Pairwise hinge loss.
    Hinge,
}

impl Loss {
    /// The per-example loss value for a pair of compatibility scores.
    pub fn value(&self, positive_score: f32, negative_score: f32) -> f32 {
        match *self {
            Loss::BPR => loss::bpr_loss(positive_score, negative_score),
            Loss::Hinge => loss::hinge_loss(positive_score, negative_score),
        }
    }
}
