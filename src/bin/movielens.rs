extern crate entice;
extern crate rand;

use rand::{Rng, SeedableRng, XorShiftRng};

use entice::data::train_test_split;
use entice::evaluation::filtered_auc_score;
use entice::models::factorization::Hyperparameters;
use entice::models::Loss;

fn main() {
    let mut data = entice::datasets::download_movielens_100k().unwrap();
    let mut rng = XorShiftRng::from_seed([42; 16]);

    let (train, test) = train_test_split(&mut data, &mut rng, 0.2);

    println!("Train: {}, test: {}", train.len(), test.len());

    let train_matrix = train.to_matrix();
    let test_matrix = test.to_matrix();

    for loss in [Loss::BPR, Loss::Hinge].iter().cloned() {
        let mut model = Hyperparameters::new(32)
            .learning_rate(0.05)
            .loss(loss.clone())
            .num_epochs(10)
            .rng(XorShiftRng::from_seed(rng.gen()))
            .build();

        let loss_value = model.fit(&train_matrix).unwrap();
        let auc = filtered_auc_score(&model, &train_matrix, &test_matrix).unwrap();

        println!(
            "{:?}: loss {:.4}, test AUC {:.4}",
            loss,
            loss_value,
            auc.mean()
        );
    }
}
