//! All classifiers on the same 2D point-labelling task the interactive
//! demos use: two populations of screen points, models trained on one half
//! and scored on the other.

use cvkit_ml::*;

fn point_dataset() -> (Vec<Vec<f32>>, Vec<i32>, Vec<Vec<f32>>, Vec<i32>) {
    let mut train_s = Vec::new();
    let mut train_l = Vec::new();
    let mut test_s = Vec::new();
    let mut test_l = Vec::new();

    // Class 1 in the left third of a 512x512 canvas, class 2 in the right
    // third, deterministic jitter.
    for i in 0..60 {
        let jx = ((i * 29) % 37) as f32;
        let jy = ((i * 31) % 41) as f32 * 10.0;
        let left = vec![40.0 + jx * 3.0, 50.0 + jy];
        let right = vec![360.0 + jx * 3.0, 50.0 + jy];
        if i % 2 == 0 {
            train_s.push(left);
            train_l.push(1);
            train_s.push(right);
            train_l.push(2);
        } else {
            test_s.push(left);
            test_l.push(1);
            test_s.push(right);
            test_l.push(2);
        }
    }
    (train_s, train_l, test_s, test_l)
}

fn accuracy(predict: impl Fn(&[f32]) -> i32, samples: &[Vec<f32>], labels: &[i32]) -> f32 {
    let correct = samples
        .iter()
        .zip(labels)
        .filter(|(s, &l)| predict(s) == l)
        .count();
    correct as f32 / samples.len() as f32
}

#[test]
fn knn_generalizes_to_held_out_points() {
    let (train_s, train_l, test_s, test_l) = point_dataset();
    let mut knn = KNearest::new(5);
    knn.train(&train_s, &train_l).unwrap();
    let acc = accuracy(|s| knn.predict(s).unwrap(), &test_s, &test_l);
    assert!(acc > 0.98, "accuracy {acc}");
}

#[test]
fn svm_generalizes_to_held_out_points() {
    let (train_s, train_l, test_s, test_l) = point_dataset();
    let mut svm = SvmLinear::new(1.0);
    svm.train(&train_s, &train_l).unwrap();
    let acc = accuracy(|s| svm.predict(s).unwrap(), &test_s, &test_l);
    assert!(acc > 0.98, "accuracy {acc}");
}

#[test]
fn decision_tree_generalizes_to_held_out_points() {
    let (train_s, train_l, test_s, test_l) = point_dataset();
    let mut tree = DecisionTree::new(8, 2);
    tree.train(&train_s, &train_l).unwrap();
    let acc = accuracy(|s| tree.predict(s).unwrap(), &test_s, &test_l);
    assert!(acc > 0.98, "accuracy {acc}");
}

#[test]
fn naive_bayes_generalizes_to_held_out_points() {
    let (train_s, train_l, test_s, test_l) = point_dataset();
    let mut nb = NormalBayes::new();
    nb.train(&train_s, &train_l).unwrap();
    let acc = accuracy(|s| nb.predict(s).unwrap(), &test_s, &test_l);
    assert!(acc > 0.98, "accuracy {acc}");
}

#[test]
fn kmeans_rediscovers_the_two_classes() {
    let (train_s, train_l, _, _) = point_dataset();
    let res = kmeans(
        &train_s,
        2,
        TermCriteria::new(50, 1e-4),
        5,
        KMeansInit::PlusPlus,
    )
    .unwrap();

    // Cluster assignment must agree with the labels up to permutation.
    let mut agree = 0;
    let mut disagree = 0;
    for (cluster, &label) in res.labels.iter().zip(&train_l) {
        if (*cluster == 0) == (label == 1) {
            agree += 1;
        } else {
            disagree += 1;
        }
    }
    let score = agree.max(disagree) as f32 / train_l.len() as f32;
    assert!(score > 0.98, "cluster agreement {score}");
}
