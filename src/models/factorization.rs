//! A latent-factor scoring model trained on sampled triplets.
//!
//! Users and items get low-dimensional embeddings, items additionally a
//! scalar bias; the compatibility score is the embedding inner product
//! plus the item bias. Fitting runs plain stochastic gradient descent
//! over the triplets drawn by [`sampling::TripletSampler`], with the
//! gradients of the configured ranking loss derived by hand.
use rand;
use rand::distributions::{Distribution, Normal};
use rand::{Rng, SeedableRng, XorShiftRng};

use ndarray::{Array1, Array2, ArrayView1};

use data::InteractionMatrix;
use loss::sigmoid;
use models::Loss;
use sampling::{Triplet, TripletSampler};
use {FittingError, PredictionError, ScoreFunction};

fn embedding_init<T: Rng>(rows: usize, cols: usize, rng: &mut T) -> Array2<f32> {
    let normal = Normal::new(0.0, 1.0 / cols as f64);

    Array2::<f32>::zeros((rows, cols)).map(|_| normal.sample(rng) as f32)
}

/// Hyperparameters for the factorization model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hyperparameters {
    latent_dim: usize,
    learning_rate: f32,
    l2_penalty: f32,
    loss: Loss,
    num_epochs: usize,
    rng: XorShiftRng,
}

impl Hyperparameters {
    /// Build new hyperparameters with the given latent dimensionality.
    pub fn new(latent_dim: usize) -> Self {
        Hyperparameters {
            latent_dim: latent_dim,
            learning_rate: 0.05,
            l2_penalty: 0.0,
            loss: Loss::BPR,
            num_epochs: 10,
            rng: XorShiftRng::from_seed(rand::thread_rng().gen()),
        }
    }

    /// Set the learning rate.
    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the L2 penalty applied to embeddings touched by an update.
    pub fn l2_penalty(mut self, l2_penalty: f32) -> Self {
        self.l2_penalty = l2_penalty;
        self
    }

    /// Set the ranking loss.
    pub fn loss(mut self, loss: Loss) -> Self {
        self.loss = loss;
        self
    }

    /// Set the number of epochs to run per `fit` call.
    pub fn num_epochs(mut self, num_epochs: usize) -> Self {
        self.num_epochs = num_epochs;
        self
    }

    /// Set the random number generator.
    pub fn rng(mut self, rng: XorShiftRng) -> Self {
        self.rng = rng;
        self
    }

    /// Build the model.
    pub fn build(self) -> ImplicitFactorizationModel {
        ImplicitFactorizationModel {
            hyper: self,
            model: None,
        }
    }
}

#[derive(Debug)]
struct ModelData {
    num_users: usize,
    num_items: usize,
    user_embedding: Array2<f32>,
    item_embedding: Array2<f32>,
    item_biases: Array1<f32>,
}

/// An implicit-feedback factorization model.
///
/// The embedding tables are allocated lazily on the first `fit` call,
/// sized to the dimensions of the fitted matrix.
#[derive(Debug)]
pub struct ImplicitFactorizationModel {
    hyper: Hyperparameters,
    model: Option<ModelData>,
}

impl ImplicitFactorizationModel {
    /// The user dimension of the fitted model, if fitted.
    pub fn num_users(&self) -> Option<usize> {
        match self.model {
            Some(ref model) => Some(model.num_users),
            None => None,
        }
    }

    /// The item dimension of the fitted model, if fitted.
    pub fn num_items(&self) -> Option<usize> {
        match self.model {
            Some(ref model) => Some(model.num_items),
            None => None,
        }
    }

    fn build_model(
        hyper: &mut Hyperparameters,
        num_users: usize,
        num_items: usize,
    ) -> ModelData {
        ModelData {
            num_users: num_users,
            num_items: num_items,
            user_embedding: embedding_init(num_users, hyper.latent_dim, &mut hyper.rng),
            item_embedding: embedding_init(num_items, hyper.latent_dim, &mut hyper.rng),
            item_biases: Array1::zeros(num_items),
        }
    }

    /// Fit the model, running the configured number of epochs over
    /// freshly sampled triplets.
    ///
    /// Returns the mean per-example loss across all epochs.
    pub fn fit(&mut self, interactions: &InteractionMatrix) -> Result<f32, FittingError> {
        if self.model.is_none() {
            let model = Self::build_model(
                &mut self.hyper,
                interactions.num_users(),
                interactions.num_items(),
            );
            self.model = Some(model);
        }

        let sampler = TripletSampler::new(interactions)?;

        let hyper = &mut self.hyper;
        let model = self.model.as_mut().unwrap();

        let learning_rate = hyper.learning_rate;
        let l2_penalty = hyper.l2_penalty;
        let loss = hyper.loss.clone();

        let mut loss_value = 0.0;
        let mut num_observations = 0;

        for _ in 0..hyper.num_epochs {
            for triplet in sampler.triplets(&mut hyper.rng) {
                loss_value += sgd_step(model, &loss, learning_rate, l2_penalty, &triplet);
                num_observations += 1;
            }
        }

        Ok(loss_value / num_observations as f32)
    }
}

fn sgd_step(
    model: &mut ModelData,
    loss: &Loss,
    learning_rate: f32,
    l2_penalty: f32,
    triplet: &Triplet,
) -> f32 {
    let user_vector = model.user_embedding.row(triplet.user_id).to_owned();
    let positive_vector = model.item_embedding.row(triplet.positive_item_id).to_owned();
    let negative_vector = model.item_embedding.row(triplet.negative_item_id).to_owned();

    let positive_score =
        user_vector.dot(&positive_vector) + model.item_biases[triplet.positive_item_id];
    let negative_score =
        user_vector.dot(&negative_vector) + model.item_biases[triplet.negative_item_id];

    let loss_value = loss.value(positive_score, negative_score);

    // The derivative of the loss with respect to the positive score;
    // the negative-score derivative is its negation.
    let gradient = match *loss {
        Loss::BPR => {
            let p = sigmoid(positive_score - negative_score);
            -p * (1.0 - p)
        }
        Loss::Hinge => {
            if loss_value > 0.0 {
                -1.0
            } else {
                0.0
            }
        }
    };

    if gradient != 0.0 {
        let user_gradient = &positive_vector - &negative_vector;

        {
            let mut user_row = model.user_embedding.row_mut(triplet.user_id);
            user_row *= 1.0 - learning_rate * l2_penalty;
            user_row.scaled_add(-learning_rate * gradient, &user_gradient);
        }
        {
            let mut positive_row = model.item_embedding.row_mut(triplet.positive_item_id);
            positive_row *= 1.0 - learning_rate * l2_penalty;
            positive_row.scaled_add(-learning_rate * gradient, &user_vector);
        }
        {
            let mut negative_row = model.item_embedding.row_mut(triplet.negative_item_id);
            negative_row *= 1.0 - learning_rate * l2_penalty;
            negative_row.scaled_add(learning_rate * gradient, &user_vector);
        }

        model.item_biases[triplet.positive_item_id] -= learning_rate * gradient;
        model.item_biases[triplet.negative_item_id] += learning_rate * gradient;
    }

    loss_value
}

impl ScoreFunction for ImplicitFactorizationModel {
    /// Latent representations of a user and an item.
    ///
    /// The item bias is folded into the returned pair by appending a
    /// constant coordinate to the user vector and the bias to the item
    /// vector, so the compatibility score stays a plain inner product.
    ///
    /// # Panics
    ///
    /// Panics if the feature vectors do not match the fitted user and
    /// item dimensions.
    fn representations(
        &self,
        user_features: ArrayView1<f32>,
        item_features: ArrayView1<f32>,
    ) -> Result<(Array1<f32>, Array1<f32>), PredictionError> {
        let model = match self.model {
            Some(ref model) => model,
            None => return Err(PredictionError::ModelNotFitted),
        };

        let user_latent = user_features.dot(&model.user_embedding);
        let item_latent = item_features.dot(&model.item_embedding);
        let item_bias = item_features.dot(&model.item_biases);

        let mut user_latent = user_latent.into_raw_vec();
        user_latent.push(1.0);

        let mut item_latent = item_latent.into_raw_vec();
        item_latent.push(item_bias);

        Ok((Array1::from_vec(user_latent), Array1::from_vec(item_latent)))
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, XorShiftRng};

    use super::*;
    use data::{Interaction, Interactions};
    use evaluation::auc_score;
    use features::one_hot;

    /// Two groups of users with disjoint tastes.
    fn block_interactions() -> Interactions {
        let mut interactions = Interactions::new(20, 20);
        let mut timestamp = 0;

        for user_id in 0..10 {
            for item_id in 0..10 {
                interactions.push(Interaction::new(user_id, item_id, timestamp));
                timestamp += 1;
            }
        }

        for user_id in 10..20 {
            for item_id in 10..20 {
                interactions.push(Interaction::new(user_id, item_id, timestamp));
                timestamp += 1;
            }
        }

        interactions
    }

    #[test]
    fn bpr_learns_block_structure() {
        let matrix = block_interactions().to_matrix();

        let mut model = Hyperparameters::new(8)
            .learning_rate(0.1)
            .num_epochs(30)
            .rng(XorShiftRng::from_seed([42; 16]))
            .build();

        let loss = model.fit(&matrix).unwrap();
        assert!(loss.is_finite());

        let auc = auc_score(&model, &matrix).unwrap();
        assert!(auc.mean() > 0.7, "AUC {}", auc.mean());
    }

    #[test]
    fn hinge_learns_block_structure() {
        let matrix = block_interactions().to_matrix();

        let mut model = Hyperparameters::new(8)
            .learning_rate(0.1)
            .loss(Loss::Hinge)
            .num_epochs(30)
            .rng(XorShiftRng::from_seed([42; 16]))
            .build();

        let loss = model.fit(&matrix).unwrap();
        assert!(loss.is_finite());

        let auc = auc_score(&model, &matrix).unwrap();
        assert!(auc.mean() > 0.7, "AUC {}", auc.mean());
    }

    #[test]
    fn fitting_sets_dimensions() {
        let matrix = block_interactions().to_matrix();

        let mut model = Hyperparameters::new(4)
            .num_epochs(1)
            .rng(XorShiftRng::from_seed([42; 16]))
            .build();

        assert_eq!(model.num_users(), None);

        model.fit(&matrix).unwrap();

        assert_eq!(model.num_users(), Some(20));
        assert_eq!(model.num_items(), Some(20));
    }

    #[test]
    fn unfitted_models_cannot_score() {
        let model = Hyperparameters::new(4).build();

        let user_features = one_hot(0, 2).unwrap();
        let item_features = one_hot(1, 3).unwrap();

        match model.score(user_features.view(), item_features.view()) {
            Err(PredictionError::ModelNotFitted) => {}
            _ => panic!("expected a not-fitted error"),
        }
    }

    #[test]
    fn fitting_an_empty_matrix_fails() {
        let matrix = Interactions::new(3, 3).to_matrix();

        let mut model = Hyperparameters::new(4).build();

        match model.fit(&matrix) {
            Err(FittingError::NoInteractions) => {}
            _ => panic!("expected a no-interactions error"),
        }
    }

    #[test]
    fn l2_penalty_keeps_scores_finite() {
        let matrix = block_interactions().to_matrix();

        let mut penalized = Hyperparameters::new(8)
            .learning_rate(0.1)
            .l2_penalty(0.1)
            .num_epochs(10)
            .rng(XorShiftRng::from_seed([42; 16]))
            .build();

        penalized.fit(&matrix).unwrap();

        let user_features = one_hot(0, 20).unwrap();
        let item_features = one_hot(0, 20).unwrap();

        let score = penalized
            .score(user_features.view(), item_features.view())
            .unwrap();

        assert!(score.is_finite());
    }
}
