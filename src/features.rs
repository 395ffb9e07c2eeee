//! One-hot encoding of user and item indices into the dense feature
//! vectors consumed by a scoring function.
use ndarray::{Array1, Array2};

use sampling::Triplet;
use {ItemId, UserId};

/// Errors raised when encoding indices into dense features.
#[derive(Debug, Fail)]
pub enum EncodingError {
    /// An id fell outside the declared feature-space dimension.
    #[fail(display = "Id {} out of range for dimension {}.", id, dim)]
    IndexOutOfBounds {
        /// The offending id.
        id: usize,
        /// The feature-space dimension.
        dim: usize,
    },
}

/// One-hot encode a single id into a dense vector of length `dim`.
pub fn one_hot(id: usize, dim: usize) -> Result<Array1<f32>, EncodingError> {
    if id >= dim {
        return Err(EncodingError::IndexOutOfBounds { id: id, dim: dim });
    }

    let mut features = Array1::zeros(dim);
    features[id] = 1.0;

    Ok(features)
}

/// One-hot encode a sequence of ids into a dense matrix of shape
/// (len, dim), one row per id.
pub fn one_hot_batch(ids: &[usize], dim: usize) -> Result<Array2<f32>, EncodingError> {
    let mut features = Array2::zeros((ids.len(), dim));

    for (row, &id) in ids.iter().enumerate() {
        if id >= dim {
            return Err(EncodingError::IndexOutOfBounds { id: id, dim: dim });
        }

        features[[row, id]] = 1.0;
    }

    Ok(features)
}

/// Encode three parallel id sequences (users, positive items, negative
/// items) into the three feature matrices consumed by a scoring
/// function: shapes (N, num_users), (N, num_items), and (N, num_items).
///
/// # Panics
///
/// Panics if the three sequences differ in length.
pub fn encode_triplets(
    user_ids: &[UserId],
    positive_item_ids: &[ItemId],
    negative_item_ids: &[ItemId],
    num_users: usize,
    num_items: usize,
) -> Result<(Array2<f32>, Array2<f32>, Array2<f32>), EncodingError> {
    assert_eq!(user_ids.len(), positive_item_ids.len());
    assert_eq!(user_ids.len(), negative_item_ids.len());

    Ok((
        one_hot_batch(user_ids, num_users)?,
        one_hot_batch(positive_item_ids, num_items)?,
        one_hot_batch(negative_item_ids, num_items)?,
    ))
}

/// Encode a batch of sampled triplets.
pub fn encode_triplet_batch(
    triplets: &[Triplet],
    num_users: usize,
    num_items: usize,
) -> Result<(Array2<f32>, Array2<f32>, Array2<f32>), EncodingError> {
    let user_ids: Vec<UserId> = triplets.iter().map(|x| x.user_id).collect();
    let positive_item_ids: Vec<ItemId> = triplets.iter().map(|x| x.positive_item_id).collect();
    let negative_item_ids: Vec<ItemId> = triplets.iter().map(|x| x.negative_item_id).collect();

    encode_triplets(
        &user_ids,
        &positive_item_ids,
        &negative_item_ids,
        num_users,
        num_items,
    )
}
