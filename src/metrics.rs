use burn::prelude::*;
use burn::tensor::ElementConversion;

/// Fraction of exact class-index matches.
///
/// # Shapes
///   - predictions: `[batch_size]`
///   - labels: `[batch_size]`
pub fn accuracy<B: Backend>(predictions: Tensor<B, 1, Int>, labels: Tensor<B, 1, Int>) -> f32 {
    predictions.equal(labels).float().mean().into_scalar().elem()
}

/// Rank-based (Mann-Whitney) AUC of positive-class scores against binary
/// labels, with midranks for tied scores.
///
/// Returns `None` when the batch contains only one class, where the
/// statistic is undefined.
///
/// # Shapes
///   - scores: `[batch_size]`, higher means more positive
///   - labels: `[batch_size]`, 0 or 1
pub fn binary_auc<B: Backend>(scores: Tensor<B, 1>, labels: Tensor<B, 1, Int>) -> Option<f32> {
    let scores: Vec<f32> = scores.into_data().convert::<f32>().to_vec().unwrap();
    let labels: Vec<i64> = labels.into_data().convert::<i64>().to_vec().unwrap();

    let n = scores.len();
    let positives = labels.iter().filter(|&&l| l > 0).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // 1-based ranks, tied scores sharing their midrank
    let mut ranks = vec![0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let midrank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = midrank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|&(&label, _)| label > 0)
        .map(|(_, &rank)| rank)
        .sum();

    let auc = (positive_rank_sum - (positives * (positives + 1)) as f64 / 2.0)
        / (positives * negatives) as f64;
    Some(auc as f32)
}
