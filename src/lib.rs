#![deny(missing_docs)]
//! # entice
//!
//! `entice` implements pairwise-ranking ("triplet loss") recommender
//! algorithms over implicit feedback data. Observed (user, item)
//! interactions are turned into (user, positive item, negative item)
//! triplets; a scoring function maps one-hot user and item features to
//! latent vectors whose inner product is the compatibility score, and is
//! trained so that positive items outscore sampled negatives under a BPR
//! or hinge ranking loss. Ranking quality is measured with a per-user
//! AUC metric.
//!
//! The scoring function is an abstract trait: any differentiable or
//! hand-trained model can plug into the sampler, the losses, and the
//! evaluator. A reference matrix factorization implementation lives in
//! [`models::factorization`].
//!
//! ## Example
//! Fit a model on the Movielens 100K dataset and evaluate it:
//!
//! ```no_run
//! # extern crate entice;
//! # extern crate rand;
//! # use rand::{SeedableRng, XorShiftRng};
//! let mut data = entice::datasets::download_movielens_100k().unwrap();
//!
//! let mut rng = XorShiftRng::from_seed([42; 16]);
//!
//! let (train, test) = entice::data::train_test_split(&mut data, &mut rng, 0.2);
//! let train_matrix = train.to_matrix();
//! let test_matrix = test.to_matrix();
//!
//! let mut model = entice::models::factorization::Hyperparameters::new(32)
//!     .learning_rate(0.05)
//!     .loss(entice::models::Loss::BPR)
//!     .num_epochs(10)
//!     .rng(rng)
//!     .build();
//!
//! let loss = model.fit(&train_matrix).unwrap();
//! let auc = entice::evaluation::filtered_auc_score(&model, &train_matrix, &test_matrix).unwrap();
//!
//! println!("Loss {}, test AUC {}", loss, auc.mean());
//! ```
#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate failure;

#[cfg(feature = "default")]
extern crate csv;
extern crate itertools;
extern crate ndarray;
extern crate rand;
extern crate rayon;
extern crate serde;

#[cfg(feature = "default")]
extern crate reqwest;

pub mod data;
#[cfg(feature = "default")]
pub mod datasets;
pub mod evaluation;
pub mod features;
pub mod loss;
pub mod models;
pub mod sampling;

use ndarray::{Array1, ArrayView1};

/// Alias for user indices.
pub type UserId = usize;
/// Alias for item indices.
pub type ItemId = usize;
/// Alias for timestamps.
pub type Timestamp = usize;

/// Prediction error types.
#[derive(Debug, Fail)]
pub enum PredictionError {
    /// Failed prediction due to numerical issues.
    #[fail(display = "Invalid prediction value: non-finite or not a number.")]
    InvalidPredictionValue,
    /// The model has not been fitted yet.
    #[fail(display = "Model must be fitted first.")]
    ModelNotFitted,
}

/// Errors raised when drawing training triplets.
#[derive(Debug, Fail)]
pub enum SamplingError {
    /// The interaction matrix has no nonzero entries.
    #[fail(display = "No interactions to sample from.")]
    NoInteractions,
    /// Every item has zero total interactions, so drawing a negative
    /// item cannot terminate.
    #[fail(display = "No items with nonzero interaction counts.")]
    NoActiveItems,
}

/// Errors raised during model fitting.
#[derive(Debug, Fail)]
pub enum FittingError {
    /// No interactions were supplied.
    #[fail(display = "No interactions were supplied.")]
    NoInteractions,
    /// Every item in the supplied interactions has zero interactions.
    #[fail(display = "No items with nonzero interaction counts.")]
    NoActiveItems,
}

impl From<SamplingError> for FittingError {
    fn from(error: SamplingError) -> Self {
        match error {
            SamplingError::NoInteractions => FittingError::NoInteractions,
            SamplingError::NoActiveItems => FittingError::NoActiveItems,
        }
    }
}

/// Trait describing models that map one-hot user and item features to
/// latent vectors.
///
/// The compatibility score of a (user, item) pair is the inner product
/// of the two latent vectors. The trait implementor is responsible for
/// constructing and training the model; the sampler, losses, and
/// evaluator in this crate only consume its scores.
pub trait ScoreFunction {
    /// Compute the latent representations of a user and an item from
    /// their one-hot feature vectors.
    fn representations(
        &self,
        user_features: ArrayView1<f32>,
        item_features: ArrayView1<f32>,
    ) -> Result<(Array1<f32>, Array1<f32>), PredictionError>;

    /// Compute the compatibility score of a user and an item: the inner
    /// product of their latent representations.
    fn score(
        &self,
        user_features: ArrayView1<f32>,
        item_features: ArrayView1<f32>,
    ) -> Result<f32, PredictionError> {
        let (user_latent, item_latent) = self.representations(user_features, item_features)?;

        Ok(user_latent.dot(&item_latent))
    }
}
