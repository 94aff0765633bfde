//! Binary cross-entropy with logits for multi-label targets
//!
//! Each label is an independent binary decision, so multiple labels can be
//! active at once. Numerically stable form:
//!
//! ```text
//! L_i = max(x_i, 0) - x_i * t_i + ln(1 + exp(-|x_i|))
//! L = mean(L_i), ∂L/∂x_i = (σ(x_i) - t_i) / N
//! ```

use ndarray::Array2;

/// Numerically stable element-wise sigmoid.
fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn stable_bce(logit: f32, target: f32) -> f32 {
    logit.max(0.0) - logit * target + (1.0 + (-logit.abs()).exp()).ln()
}

/// Mean BCE-with-logits loss and its gradient w.r.t. the logits.
///
/// `logits` and `targets` are `(batch, num_class)`; the mean runs over every
/// element, matching the reduction the reference pipeline trains with.
pub fn bce_with_logits(logits: &Array2<f32>, targets: &Array2<f32>) -> (f32, Array2<f32>) {
    assert_eq!(logits.dim(), targets.dim(), "logits and targets must have same shape");

    let n = logits.len() as f32;
    let mut total = 0.0f32;
    let mut grad = Array2::zeros(logits.dim());
    for ((index, &logit), &target) in logits.indexed_iter().zip(targets.iter()) {
        total += stable_bce(logit, target);
        grad[index] = (sigmoid(logit) - target) / n;
    }
    (total / n, grad)
}

/// Label scores: element-wise sigmoid over the logits.
pub fn sigmoid_scores(logits: &Array2<f32>) -> Array2<f32> {
    logits.mapv(sigmoid)
}
