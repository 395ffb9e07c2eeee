//! Ranking-quality evaluation.
//!
//! Estimates, for each user with held-out positives, the probability
//! that a positive item outscores a non-interacted item, and averages
//! the estimate over users.
use std;

use itertools::Itertools;
use ndarray::Array1;
use rayon::prelude::*;

use data::{InteractionMatrix, MatrixUser};
use features;
use {PredictionError, ScoreFunction, UserId};

/// Per-user and aggregate AUC values for one evaluation pass.
#[derive(Clone, Debug)]
pub struct AucScore {
    per_user: Vec<(UserId, f32)>,
    mean: f32,
}

impl AucScore {
    /// The mean AUC over qualifying users.
    ///
    /// NaN when no user qualified: every user had an empty positive or
    /// an empty negative pool.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// The per-user AUC values of qualifying users. Users with an
    /// empty positive or negative pool are absent, not counted as zero.
    pub fn per_user(&self) -> &[(UserId, f32)] {
        &self.per_user
    }
}

/// Compute per-user AUC scores on a test matrix.
///
/// For every user, the positive pool is the user's test row and the
/// negative pool is every other item. A (positive, negative) pair
/// counts as correctly ordered when the positive scores strictly
/// higher; ties are credited one half.
pub fn auc_score<T: ScoreFunction + Sync>(
    model: &T,
    test: &InteractionMatrix,
) -> Result<AucScore, PredictionError> {
    auc(model, test, None)
}

/// Like [`auc_score`], but additionally excludes the user's train
/// positives from the negative pool, so the model is not penalised for
/// ranking already-seen items highly.
pub fn filtered_auc_score<T: ScoreFunction + Sync>(
    model: &T,
    train: &InteractionMatrix,
    test: &InteractionMatrix,
) -> Result<AucScore, PredictionError> {
    auc(model, test, Some(train))
}

fn auc<T: ScoreFunction + Sync>(
    model: &T,
    test: &InteractionMatrix,
    train: Option<&InteractionMatrix>,
) -> Result<AucScore, PredictionError> {
    let num_users = test.num_users();
    let num_items = test.num_items();

    let item_features: Vec<Array1<f32>> = (0..num_items)
        .map(|item_id| features::one_hot(item_id, num_items).expect("item ids within bounds"))
        .collect();

    let users: Vec<MatrixUser> = test.iter_users().collect();

    let per_user: Vec<Option<(UserId, f32)>> = users
        .par_iter()
        .map(|user| user_auc(model, user, train, &item_features, num_users))
        .collect::<Result<Vec<_>, PredictionError>>()?;

    let per_user: Vec<(UserId, f32)> = per_user.into_iter().filter_map(|x| x).collect();

    let mean = if per_user.is_empty() {
        std::f32::NAN
    } else {
        per_user.iter().map(|&(_, value)| value).sum::<f32>() / per_user.len() as f32
    };

    Ok(AucScore {
        per_user: per_user,
        mean: mean,
    })
}

fn user_auc<T: ScoreFunction>(
    model: &T,
    user: &MatrixUser,
    train: Option<&InteractionMatrix>,
    item_features: &[Array1<f32>],
    num_users: usize,
) -> Result<Option<(UserId, f32)>, PredictionError> {
    if user.item_ids.is_empty() {
        return Ok(None);
    }

    let user_features =
        features::one_hot(user.user_id, num_users).expect("user ids within bounds");

    let mut scored = Vec::with_capacity(item_features.len());

    for (item_id, item) in item_features.iter().enumerate() {
        let is_positive = user.item_ids.binary_search(&item_id).is_ok();

        // Items seen during training are neither positives nor
        // candidate negatives.
        if !is_positive && train.map_or(false, |matrix| matrix.contains(user.user_id, item_id)) {
            continue;
        }

        let score = model.score(user_features.view(), item.view())?;

        if !score.is_finite() {
            return Err(PredictionError::InvalidPredictionValue);
        }

        scored.push((score, is_positive));
    }

    let num_positives = scored
        .iter()
        .filter(|&&(_, is_positive)| is_positive)
        .count();
    let num_negatives = scored.len() - num_positives;

    if num_positives == 0 || num_negatives == 0 {
        return Ok(None);
    }

    scored.sort_unstable_by(|x, y| x.0.partial_cmp(&y.0).unwrap());

    // Rank-sum AUC, assigning tied scores the average of the ranks
    // they span. Equivalent to counting pairs with half credit for
    // ties, in O(n log n).
    let mut rank_sum = 0.0;
    let mut rank = 1;

    let groups = scored.iter().group_by(|&&(score, _)| score);

    for (_, group) in &groups {
        let mut group_size = 0;
        let mut group_positives = 0;

        for &(_, is_positive) in group {
            group_size += 1;

            if is_positive {
                group_positives += 1;
            }
        }

        let average_rank = (2 * rank + group_size - 1) as f64 / 2.0;
        rank_sum += average_rank * group_positives as f64;
        rank += group_size;
    }

    let positives = num_positives as f64;
    let negatives = num_negatives as f64;

    let auc = (rank_sum - positives * (positives + 1.0) / 2.0) / (positives * negatives);

    Ok(Some((user.user_id, auc as f32)))
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2, ArrayView1};

    use super::*;
    use data::{Interaction, InteractionMatrix, Interactions};
    use {PredictionError, ScoreFunction};

    /// Scores every (user, item) pair from a fixed table.
    struct FixedScores {
        scores: Array2<f32>,
    }

    impl ScoreFunction for FixedScores {
        fn representations(
            &self,
            user_features: ArrayView1<f32>,
            item_features: ArrayView1<f32>,
        ) -> Result<(Array1<f32>, Array1<f32>), PredictionError> {
            Ok((user_features.to_owned(), self.scores.dot(&item_features)))
        }
    }

    fn matrix(num_users: usize, num_items: usize, entries: &[(usize, usize)]) -> InteractionMatrix {
        let mut interactions = Interactions::new(num_users, num_items);

        for (idx, &(user_id, item_id)) in entries.iter().enumerate() {
            interactions.push(Interaction::new(user_id, item_id, idx));
        }

        interactions.to_matrix()
    }

    #[test]
    fn all_tied_scores_give_one_half() {
        let test = matrix(2, 4, &[(0, 0), (1, 1), (1, 2)]);
        let model = FixedScores {
            scores: Array2::from_elem((2, 4), 0.5),
        };

        let auc = auc_score(&model, &test).unwrap();

        assert_eq!(auc.mean(), 0.5);

        for &(_, value) in auc.per_user() {
            assert_eq!(value, 0.5);
        }
    }

    #[test]
    fn perfect_ranking_gives_one() {
        let test = matrix(2, 4, &[(0, 0), (0, 2), (1, 3)]);

        let mut scores = Array2::zeros((2, 4));
        scores[[0, 0]] = 2.0;
        scores[[0, 2]] = 3.0;
        scores[[1, 3]] = 1.0;

        let model = FixedScores { scores: scores };

        let auc = auc_score(&model, &test).unwrap();

        assert_eq!(auc.mean(), 1.0);
        assert_eq!(auc.per_user().len(), 2);
    }

    #[test]
    fn scores_rank_both_positives_above_both_negatives() {
        // User 0 has test positives {1, 2} and non-interacted {0, 3}.
        let test = matrix(3, 4, &[(0, 1), (0, 2)]);

        let mut scores = Array2::zeros((3, 4));
        scores[[0, 0]] = 0.1;
        scores[[0, 1]] = 0.9;
        scores[[0, 2]] = 0.8;
        scores[[0, 3]] = 0.2;

        let model = FixedScores { scores: scores };

        let auc = auc_score(&model, &test).unwrap();

        // Users 1 and 2 have no test positives and drop out.
        assert_eq!(auc.per_user(), &[(0, 1.0)]);
        assert_eq!(auc.mean(), 1.0);
    }

    #[test]
    fn mean_is_the_unweighted_average_of_user_aucs() {
        let test = matrix(3, 4, &[(0, 0), (1, 0), (2, 0), (2, 1)]);

        let mut scores = Array2::zeros((3, 4));

        // User 0: the positive beats every negative; AUC 1.
        scores[[0, 0]] = 1.0;

        // User 1: everything tied; AUC 0.5.
        for item_id in 0..4 {
            scores[[1, item_id]] = 0.5;
        }

        // User 2: positives {0, 1} against negatives {2, 3}; three of
        // four pairs ordered correctly; AUC 0.75.
        scores[[2, 0]] = 1.0;
        scores[[2, 1]] = 0.2;
        scores[[2, 2]] = 0.5;
        scores[[2, 3]] = 0.0;

        let auc = auc_score(&model_from(scores), &test).unwrap();

        assert_eq!(auc.per_user(), &[(0, 1.0), (1, 0.5), (2, 0.75)]);
        assert_eq!(auc.mean(), 0.75);
    }

    #[test]
    fn no_qualifying_users_yields_nan() {
        // The single user's positives cover every item, so the
        // negative pool is empty.
        let test = matrix(1, 2, &[(0, 0), (0, 1)]);
        let model = FixedScores {
            scores: Array2::from_elem((1, 2), 0.0),
        };

        let auc = auc_score(&model, &test).unwrap();

        assert!(auc.mean().is_nan());
        assert!(auc.per_user().is_empty());
    }

    #[test]
    fn train_positives_are_excluded_from_the_negative_pool() {
        let train = matrix(1, 3, &[(0, 0)]);
        let test = matrix(1, 3, &[(0, 1)]);

        let mut scores = Array2::zeros((1, 3));
        scores[[0, 0]] = 5.0;
        scores[[0, 1]] = 2.0;
        scores[[0, 2]] = 1.0;

        let unfiltered = auc_score(&model_from(scores.clone()), &test).unwrap();
        let filtered = filtered_auc_score(&model_from(scores), &train, &test).unwrap();

        assert_eq!(unfiltered.mean(), 0.5);
        assert_eq!(filtered.mean(), 1.0);
    }

    #[test]
    fn non_finite_scores_are_an_error() {
        let test = matrix(1, 2, &[(0, 0)]);
        let model = FixedScores {
            scores: Array2::from_elem((1, 2), ::std::f32::NAN),
        };

        match auc_score(&model, &test) {
            Err(PredictionError::InvalidPredictionValue) => {}
            _ => panic!("expected an invalid prediction error"),
        }
    }

    fn model_from(scores: Array2<f32>) -> FixedScores {
        FixedScores { scores: scores }
    }
}
