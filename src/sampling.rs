//! Sampling of (user, positive item, negative item) training triplets.
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use data::{InteractionMatrix, MatrixNonzeroIterator};
use {ItemId, SamplingError, UserId};

/// A single training example for a pairwise ranking loss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triplet {
    /// The user.
    pub user_id: UserId,
    /// An item the user has interacted with.
    pub positive_item_id: ItemId,
    /// A randomly drawn item with nonzero total activity.
    pub negative_item_id: ItemId,
}

/// Draws one triplet per nonzero entry of an interaction matrix.
///
/// Negative items are drawn uniformly from the full item range,
/// redrawing while the candidate has zero total interactions. This
/// guards against items with degenerate all-zero feature vectors; it
/// deliberately does not exclude the user's own positives, so a
/// negative may coincide with another item the user has interacted
/// with.
pub struct TripletSampler<'a> {
    interactions: &'a InteractionMatrix,
    item_counts: Vec<usize>,
}

impl<'a> TripletSampler<'a> {
    /// Create a sampler using the matrix's own per-item interaction
    /// counts to decide which items are active.
    pub fn new(interactions: &'a InteractionMatrix) -> Result<Self, SamplingError> {
        let item_counts = interactions.item_counts().to_owned();

        TripletSampler::with_item_counts(interactions, item_counts)
    }

    /// Create a sampler with externally supplied per-item counts,
    /// making items that only occur outside the sampled matrix (in a
    /// held-out split, say) count as active.
    ///
    /// # Panics
    ///
    /// Panics if the length of `item_counts` does not match the item
    /// dimension of the matrix.
    pub fn with_item_counts(
        interactions: &'a InteractionMatrix,
        item_counts: Vec<usize>,
    ) -> Result<Self, SamplingError> {
        assert_eq!(item_counts.len(), interactions.num_items());

        if interactions.nnz() == 0 {
            return Err(SamplingError::NoInteractions);
        }

        if item_counts.iter().all(|&count| count == 0) {
            return Err(SamplingError::NoActiveItems);
        }

        Ok(TripletSampler {
            interactions: interactions,
            item_counts: item_counts,
        })
    }

    /// Draw a fresh set of triplets, one per nonzero entry of the
    /// matrix, following the matrix's row-major entry order.
    ///
    /// Each call starts a new independent pass, so the sampler can be
    /// re-invoked once per training epoch.
    pub fn triplets<'s, R: Rng>(&'s self, rng: &'s mut R) -> Triplets<'s, R> {
        Triplets {
            nonzero: self.interactions.iter_nonzero(),
            item_counts: &self.item_counts,
            negative_items: Uniform::new(0, self.interactions.num_items()),
            rng: rng,
        }
    }
}

/// Iterator over freshly sampled triplets.
pub struct Triplets<'a, R: Rng + 'a> {
    nonzero: MatrixNonzeroIterator<'a>,
    item_counts: &'a [usize],
    negative_items: Uniform<usize>,
    rng: &'a mut R,
}

impl<'a, R: Rng + 'a> Iterator for Triplets<'a, R> {
    type Item = Triplet;
    fn next(&mut self) -> Option<Self::Item> {
        let (user_id, positive_item_id) = self.nonzero.next()?;

        let mut negative_item_id = self.negative_items.sample(self.rng);

        while self.item_counts[negative_item_id] == 0 {
            negative_item_id = self.negative_items.sample(self.rng);
        }

        Some(Triplet {
            user_id: user_id,
            positive_item_id: positive_item_id,
            negative_item_id: negative_item_id,
        })
    }
}
