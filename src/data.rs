//! Interaction data structures: raw interaction lists, train/test
//! splitting, and the sparse matrix form consumed by the sampler and
//! the evaluator.
use std::cmp::Ordering;

use rand::Rng;

use super::{ItemId, Timestamp, UserId};

/// A single observed positive (user, item) interaction.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Interaction {
    user_id: UserId,
    item_id: ItemId,
    timestamp: Timestamp,
}

impl Interaction {
    /// Create a new interaction.
    pub fn new(user_id: UserId, item_id: ItemId, timestamp: Timestamp) -> Self {
        Interaction {
            user_id,
            item_id,
            timestamp,
        }
    }

    /// The id of the interacting user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The id of the item interacted with.
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// When the interaction was observed.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Randomly split interactions into a train and a test set.
///
/// Both halves share the dimensions of the input, so matrices built
/// from them are compatible.
pub fn train_test_split<R: Rng>(
    interactions: &mut Interactions,
    rng: &mut R,
    test_fraction: f32,
) -> (Interactions, Interactions) {
    interactions.shuffle(rng);

    let (test, train) = interactions.split_at((test_fraction * interactions.len() as f32) as usize);

    (train, test)
}

/// A collection of individual interactions.
pub struct Interactions {
    num_users: usize,
    num_items: usize,
    interactions: Vec<Interaction>,
}

impl Interactions {
    /// Create an empty collection with the given dimensions.
    pub fn new(num_users: usize, num_items: usize) -> Self {
        Interactions {
            num_users: num_users,
            num_items: num_items,
            interactions: Vec::new(),
        }
    }

    /// Add a single interaction.
    pub fn push(&mut self, interaction: Interaction) {
        self.interactions.push(interaction);
    }

    /// The interactions in this collection.
    pub fn data(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Number of interactions.
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Shuffle the interactions in place.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        rng.shuffle(&mut self.interactions);
    }

    /// Split into two collections at `idx`.
    pub fn split_at(&self, idx: usize) -> (Self, Self) {
        let head = Interactions {
            num_users: self.num_users,
            num_items: self.num_items,
            interactions: self.interactions[..idx].to_owned(),
        };
        let tail = Interactions {
            num_users: self.num_users,
            num_items: self.num_items,
            interactions: self.interactions[idx..].to_owned(),
        };

        (head, tail)
    }

    /// Convert to a sparse interaction matrix.
    pub fn to_matrix(&self) -> InteractionMatrix {
        InteractionMatrix::from(self)
    }

    /// Number of distinct users in the dataset.
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Number of distinct items in the dataset.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The (num_users, num_items) shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_users, self.num_items)
    }
}

impl From<Vec<Interaction>> for Interactions {
    fn from(data: Vec<Interaction>) -> Interactions {
        let num_users = data.iter().map(|x| x.user_id()).max().unwrap() + 1;
        let num_items = data.iter().map(|x| x.item_id()).max().unwrap() + 1;

        Interactions {
            num_users: num_users,
            num_items: num_items,
            interactions: data,
        }
    }
}

fn cmp_user_item(x: &Interaction, y: &Interaction) -> Ordering {
    let uid_comparison = x.user_id().cmp(&y.user_id());

    if uid_comparison == Ordering::Equal {
        x.item_id().cmp(&y.item_id())
    } else {
        uid_comparison
    }
}

/// A sparse user-item matrix of observed positive interactions, in
/// compressed sparse row form.
///
/// Rows are users; within each row, item ids are kept in ascending
/// order so membership checks are logarithmic. The matrix is immutable
/// once constructed.
pub struct InteractionMatrix {
    num_users: usize,
    num_items: usize,
    user_pointers: Vec<usize>,
    item_ids: Vec<ItemId>,
    item_counts: Vec<usize>,
}

impl<'a> From<&'a Interactions> for InteractionMatrix {
    fn from(interactions: &Interactions) -> InteractionMatrix {
        let mut data = interactions.data().to_owned();

        data.sort_by(cmp_user_item);

        let mut user_pointers = vec![0; interactions.num_users + 1];
        let mut item_ids = Vec::with_capacity(data.len());
        let mut item_counts = vec![0; interactions.num_items];

        for datum in &data {
            item_ids.push(datum.item_id());
            item_counts[datum.item_id()] += 1;

            user_pointers[datum.user_id() + 1] += 1;
        }

        for idx in 1..user_pointers.len() {
            user_pointers[idx] += user_pointers[idx - 1];
        }

        InteractionMatrix {
            num_users: interactions.num_users,
            num_items: interactions.num_items,
            user_pointers: user_pointers,
            item_ids: item_ids,
            item_counts: item_counts,
        }
    }
}

impl InteractionMatrix {
    /// Iterate over the users of the matrix.
    pub fn iter_users(&self) -> MatrixUserIterator {
        MatrixUserIterator {
            matrix: &self,
            idx: 0,
        }
    }

    /// Iterate over the nonzero entries of the matrix in row-major
    /// order. The order is deterministic for a fixed matrix.
    pub fn iter_nonzero(&self) -> MatrixNonzeroIterator {
        MatrixNonzeroIterator {
            matrix: &self,
            user_id: 0,
            idx: 0,
        }
    }

    /// The items the user has interacted with, in ascending order.
    /// None if the user id is out of range.
    pub fn get_user(&self, user_id: UserId) -> Option<&[ItemId]> {
        if user_id >= self.num_users {
            return None;
        }

        let start = self.user_pointers[user_id];
        let stop = self.user_pointers[user_id + 1];

        Some(&self.item_ids[start..stop])
    }

    /// Whether (user_id, item_id) is a nonzero entry.
    pub fn contains(&self, user_id: UserId, item_id: ItemId) -> bool {
        match self.get_user(user_id) {
            Some(item_ids) => item_ids.binary_search(&item_id).is_ok(),
            None => false,
        }
    }

    /// Per-item interaction counts within this matrix.
    pub fn item_counts(&self) -> &[usize] {
        &self.item_counts
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        self.item_ids.len()
    }

    /// Number of users (rows).
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Number of items (columns).
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The (num_users, num_items) shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_users, self.num_items)
    }
}

/// Iterator over the users of an interaction matrix.
pub struct MatrixUserIterator<'a> {
    matrix: &'a InteractionMatrix,
    idx: usize,
}

/// A single user's row of an interaction matrix.
#[derive(Debug)]
pub struct MatrixUser<'a> {
    /// The user id.
    pub user_id: UserId,
    /// The user's positive items, in ascending order.
    pub item_ids: &'a [ItemId],
}

impl<'a> Iterator for MatrixUserIterator<'a> {
    type Item = MatrixUser<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        let value = if self.idx >= self.matrix.num_users {
            None
        } else {
            let start = self.matrix.user_pointers[self.idx];
            let stop = self.matrix.user_pointers[self.idx + 1];

            Some(MatrixUser {
                user_id: self.idx,
                item_ids: &self.matrix.item_ids[start..stop],
            })
        };

        self.idx += 1;

        value
    }
}

/// Iterator over the nonzero entries of an interaction matrix.
pub struct MatrixNonzeroIterator<'a> {
    matrix: &'a InteractionMatrix,
    user_id: UserId,
    idx: usize,
}

impl<'a> Iterator for MatrixNonzeroIterator<'a> {
    type Item = (UserId, ItemId);
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.matrix.item_ids.len() {
            return None;
        }

        while self.matrix.user_pointers[self.user_id + 1] <= self.idx {
            self.user_id += 1;
        }

        let value = (self.user_id, self.matrix.item_ids[self.idx]);

        self.idx += 1;

        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, XorShiftRng};

    use super::*;

    fn sample_interactions() -> Interactions {
        let mut interactions = Interactions::new(3, 4);

        interactions.push(Interaction::new(0, 1, 0));
        interactions.push(Interaction::new(0, 3, 1));
        interactions.push(Interaction::new(1, 0, 2));
        interactions.push(Interaction::new(2, 1, 3));
        interactions.push(Interaction::new(2, 2, 4));

        interactions
    }

    #[test]
    fn matrix_construction() {
        let matrix = sample_interactions().to_matrix();

        assert_eq!(matrix.shape(), (3, 4));
        assert_eq!(matrix.nnz(), 5);
        assert_eq!(matrix.item_counts(), &[1, 2, 1, 1]);

        assert_eq!(matrix.get_user(0), Some(&[1, 3][..]));
        assert_eq!(matrix.get_user(1), Some(&[0][..]));
        assert_eq!(matrix.get_user(2), Some(&[1, 2][..]));
        assert_eq!(matrix.get_user(3), None);

        assert!(matrix.contains(0, 3));
        assert!(!matrix.contains(0, 2));
        assert!(!matrix.contains(5, 0));
    }

    #[test]
    fn nonzero_iteration_is_row_major() {
        let matrix = sample_interactions().to_matrix();

        let entries: Vec<_> = matrix.iter_nonzero().collect();

        assert_eq!(entries, vec![(0, 1), (0, 3), (1, 0), (2, 1), (2, 2)]);
    }

    #[test]
    fn rows_are_sorted_regardless_of_insertion_order() {
        let mut interactions = Interactions::new(2, 5);

        interactions.push(Interaction::new(0, 4, 0));
        interactions.push(Interaction::new(0, 1, 1));
        interactions.push(Interaction::new(0, 3, 2));

        let matrix = interactions.to_matrix();

        assert_eq!(matrix.get_user(0), Some(&[1, 3, 4][..]));
        assert_eq!(matrix.get_user(1), Some(&[][..]));
    }

    #[test]
    fn split_preserves_dimensions() {
        let mut interactions = sample_interactions();
        let mut rng = XorShiftRng::from_seed([42; 16]);

        let (train, test) = train_test_split(&mut interactions, &mut rng, 0.4);

        assert_eq!(train.shape(), test.shape());
        assert_eq!(train.len() + test.len(), 5);
    }

    #[test]
    fn dimensions_inferred_from_data() {
        let interactions = Interactions::from(vec![
            Interaction::new(0, 7, 0),
            Interaction::new(4, 2, 1),
        ]);

        assert_eq!(interactions.shape(), (5, 8));
        assert_eq!(interactions.data()[0].timestamp(), 0);
    }
}
