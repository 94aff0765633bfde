//! XML-CNN style text classifier with an explicit backward pass
//!
//! Architecture: embedding lookup → inverted dropout → per-width 1-d
//! convolution banks with tanh → max-pool over positions → concat → linear
//! output, one logit per label. The max-pool argmax positions recorded in the
//! forward pass route the gradients back through the winning windows only.

use super::loss::sigmoid_scores;
use super::param::Parameter;
use crate::data::{Batch, PAD};
use ndarray::{Array1, Array2, Array3, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sentinel argmax for filters that saw no valid position.
const NO_POSITION: usize = usize::MAX;

/// The convolutional classifier.
pub struct TextCnn {
    vocab_size: usize,
    embed_dim: usize,
    num_class: usize,
    widths: Vec<usize>,
    num_filter_map: usize,
    dropout: f32,
    params: Vec<Parameter>,
}

/// Activations recorded by one forward pass, consumed by `backward`.
pub struct ForwardPass {
    tokens: Array2<usize>,
    /// Embedded sequence after dropout, `(batch, seq, embed_dim)`
    dropped: Array3<f32>,
    /// Inverted-dropout mask (scale included), same shape
    mask: Array3<f32>,
    /// Per width: pooled tanh activations, `(batch, num_filter_map)`
    pooled: Vec<Array2<f32>>,
    /// Per width: winning positions, `NO_POSITION` where no window fit
    argmax: Vec<Array2<usize>>,
    /// Output logits, `(batch, num_class)`
    pub logits: Array2<f32>,
}

impl TextCnn {
    /// Build the network around a pre-resolved embedding matrix.
    ///
    /// Convolution and output weights are xavier-uniform initialized from a
    /// generator seeded with `seed`.
    pub fn new(
        embedding: Array2<f32>,
        num_class: usize,
        widths: Vec<usize>,
        num_filter_map: usize,
        dropout: f32,
        seed: u64,
    ) -> Self {
        let (vocab_size, embed_dim) = embedding.dim();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut params = Vec::with_capacity(2 * widths.len() + 3);
        params.push(Parameter::new("embedding", flatten(embedding)));
        for &width in &widths {
            let fan_in = width * embed_dim;
            params.push(Parameter::new(
                format!("conv{width}.weight"),
                xavier_uniform(num_filter_map * fan_in, fan_in, num_filter_map, &mut rng),
            ));
            params.push(Parameter::new(
                format!("conv{width}.bias"),
                Array1::zeros(num_filter_map),
            ));
        }
        let features = widths.len() * num_filter_map;
        params.push(Parameter::new(
            "out.weight",
            xavier_uniform(num_class * features, features, num_class, &mut rng),
        ));
        params.push(Parameter::new("out.bias", Array1::zeros(num_class)));

        Self { vocab_size, embed_dim, num_class, widths, num_filter_map, dropout, params }
    }

    pub fn num_class(&self) -> usize {
        self.num_class
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [Parameter] {
        &mut self.params
    }

    // Parameter layout: embedding, then (weight, bias) per width, then the
    // output pair.
    fn conv_weight_index(&self, width_index: usize) -> usize {
        1 + 2 * width_index
    }

    fn conv_bias_index(&self, width_index: usize) -> usize {
        2 + 2 * width_index
    }

    fn out_weight_index(&self) -> usize {
        1 + 2 * self.widths.len()
    }

    fn out_bias_index(&self) -> usize {
        self.out_weight_index() + 1
    }

    fn embed_view(&self) -> ArrayView2<'_, f32> {
        view2(&self.params[0], (self.vocab_size, self.embed_dim))
    }

    /// Run the network forward over a batch.
    ///
    /// With a generator, inverted dropout is applied to the embedded sequence
    /// (training); without one the pass is deterministic (evaluation).
    pub fn forward(&self, batch: &Batch, dropout_rng: Option<&mut StdRng>) -> ForwardPass {
        let (batch_size, seq_len) = batch.tokens.dim();
        let embed_dim = self.embed_dim;
        let filters = self.num_filter_map;

        let mut mask = Array3::from_elem((batch_size, seq_len, embed_dim), 1.0f32);
        if let Some(rng) = dropout_rng {
            if self.dropout > 0.0 {
                let keep_scale = 1.0 / (1.0 - self.dropout);
                for value in mask.iter_mut() {
                    *value = if rng.random::<f32>() < self.dropout { 0.0 } else { keep_scale };
                }
            }
        }

        let embed = self.embed_view();
        let mut dropped = Array3::zeros((batch_size, seq_len, embed_dim));
        for i in 0..batch_size {
            for t in 0..seq_len {
                let row = embed.row(batch.tokens[[i, t]]);
                for k in 0..embed_dim {
                    dropped[[i, t, k]] = row[k] * mask[[i, t, k]];
                }
            }
        }

        let mut pooled = Vec::with_capacity(self.widths.len());
        let mut argmax = Vec::with_capacity(self.widths.len());
        for (wi, &width) in self.widths.iter().enumerate() {
            let weight = view2(&self.params[self.conv_weight_index(wi)], (filters, width * embed_dim));
            let bias = &self.params[self.conv_bias_index(wi)].data;

            let mut pool = Array2::zeros((batch_size, filters));
            let mut arg = Array2::from_elem((batch_size, filters), NO_POSITION);
            if seq_len >= width {
                for i in 0..batch_size {
                    for f in 0..filters {
                        let mut best = f32::NEG_INFINITY;
                        let mut best_t = 0;
                        for t in 0..=(seq_len - width) {
                            let mut z = bias[f];
                            for j in 0..width {
                                for k in 0..embed_dim {
                                    z += weight[[f, j * embed_dim + k]] * dropped[[i, t + j, k]];
                                }
                            }
                            let a = z.tanh();
                            if a > best {
                                best = a;
                                best_t = t;
                            }
                        }
                        pool[[i, f]] = best;
                        arg[[i, f]] = best_t;
                    }
                }
            }
            pooled.push(pool);
            argmax.push(arg);
        }

        let out_weight =
            view2(&self.params[self.out_weight_index()], (self.num_class, self.feature_len()));
        let out_bias = &self.params[self.out_bias_index()].data;
        let mut logits = Array2::zeros((batch_size, self.num_class));
        for i in 0..batch_size {
            for c in 0..self.num_class {
                let mut u = out_bias[c];
                for (wi, pool) in pooled.iter().enumerate() {
                    for f in 0..filters {
                        u += out_weight[[c, wi * filters + f]] * pool[[i, f]];
                    }
                }
                logits[[i, c]] = u;
            }
        }

        ForwardPass { tokens: batch.tokens.clone(), dropped, mask, pooled, argmax, logits }
    }

    /// Evaluation-mode label scores for a batch.
    pub fn predict(&self, batch: &Batch) -> Array2<f32> {
        sigmoid_scores(&self.forward(batch, None).logits)
    }

    /// Accumulate parameter gradients for a recorded pass.
    ///
    /// `dlogits` is the loss gradient w.r.t. the output logits.
    pub fn backward(&mut self, pass: &ForwardPass, dlogits: &Array2<f32>) {
        let grads = self.compute_grads(pass, dlogits);
        for (param, grad) in self.params.iter_mut().zip(grads) {
            param.grad.scaled_add(1.0, &grad);
        }
    }

    fn compute_grads(&self, pass: &ForwardPass, dlogits: &Array2<f32>) -> Vec<Array1<f32>> {
        let (batch_size, _) = pass.tokens.dim();
        let embed_dim = self.embed_dim;
        let filters = self.num_filter_map;
        let features = self.feature_len();

        let mut g_embed = Array2::<f32>::zeros((self.vocab_size, embed_dim));
        let mut g_conv_w: Vec<Array2<f32>> = self
            .widths
            .iter()
            .map(|&w| Array2::zeros((filters, w * embed_dim)))
            .collect();
        let mut g_conv_b: Vec<Array1<f32>> =
            self.widths.iter().map(|_| Array1::zeros(filters)).collect();
        let mut g_out_w = Array2::<f32>::zeros((self.num_class, features));
        let mut g_out_b = Array1::<f32>::zeros(self.num_class);

        let out_weight = view2(&self.params[self.out_weight_index()], (self.num_class, features));

        // Output layer, plus the pooled-feature gradient flowing back.
        let mut g_pooled: Vec<Array2<f32>> =
            self.widths.iter().map(|_| Array2::zeros((batch_size, filters))).collect();
        for i in 0..batch_size {
            for c in 0..self.num_class {
                let d = dlogits[[i, c]];
                if d == 0.0 {
                    continue;
                }
                g_out_b[c] += d;
                for wi in 0..self.widths.len() {
                    for f in 0..filters {
                        g_out_w[[c, wi * filters + f]] += d * pass.pooled[wi][[i, f]];
                        g_pooled[wi][[i, f]] += d * out_weight[[c, wi * filters + f]];
                    }
                }
            }
        }

        // Through max-pool (winning window only) and tanh into the conv
        // parameters and the embedding rows; PAD rows stay frozen.
        for (wi, &width) in self.widths.iter().enumerate() {
            let weight = view2(&self.params[self.conv_weight_index(wi)], (filters, width * embed_dim));
            for i in 0..batch_size {
                for f in 0..filters {
                    let t = pass.argmax[wi][[i, f]];
                    if t == NO_POSITION {
                        continue;
                    }
                    let a = pass.pooled[wi][[i, f]];
                    let ga = g_pooled[wi][[i, f]] * (1.0 - a * a);
                    if ga == 0.0 {
                        continue;
                    }
                    g_conv_b[wi][f] += ga;
                    for j in 0..width {
                        for k in 0..embed_dim {
                            let col = j * embed_dim + k;
                            g_conv_w[wi][[f, col]] += ga * pass.dropped[[i, t + j, k]];
                            let token = pass.tokens[[i, t + j]];
                            if token != PAD {
                                g_embed[[token, k]] +=
                                    ga * weight[[f, col]] * pass.mask[[i, t + j, k]];
                            }
                        }
                    }
                }
            }
        }

        let mut grads = Vec::with_capacity(self.params.len());
        grads.push(flatten(g_embed));
        for (w, b) in g_conv_w.into_iter().zip(g_conv_b) {
            grads.push(flatten(w));
            grads.push(b);
        }
        grads.push(flatten(g_out_w));
        grads.push(g_out_b);
        grads
    }

    fn feature_len(&self) -> usize {
        self.widths.len() * self.num_filter_map
    }

    /// Snapshot of all parameter values.
    pub fn export_params(&self) -> Vec<Vec<f32>> {
        self.params.iter().map(|p| p.data.to_vec()).collect()
    }

    /// Restore parameter values from a snapshot of this model.
    pub fn import_params(&mut self, sources: &[Vec<f32>]) {
        assert_eq!(sources.len(), self.params.len(), "snapshot does not match model layout");
        for (param, source) in self.params.iter_mut().zip(sources) {
            assert_eq!(param.len(), source.len(), "snapshot does not match parameter {}", param.name);
            param.data = Array1::from_vec(source.clone());
        }
    }
}

fn flatten(matrix: Array2<f32>) -> Array1<f32> {
    let len = matrix.len();
    matrix.into_shape_with_order(len).expect("matrix is contiguous")
}

fn view2(param: &Parameter, shape: (usize, usize)) -> ArrayView2<'_, f32> {
    ArrayView2::from_shape(shape, param.data.as_slice().expect("parameter is contiguous"))
        .expect("parameter sized at construction")
}

fn xavier_uniform(len: usize, fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Array1<f32> {
    let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
    Array1::from_shape_simple_fn(len, || rng.random_range(-limit..limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::loss::bce_with_logits;
    use approx::assert_relative_eq;
    use ndarray::arr2;

    fn tiny_model(seed: u64) -> TextCnn {
        let embedding = crate::data::random_embedding(7, 4, seed);
        TextCnn::new(embedding, 3, vec![2, 3], 2, 0.0, seed)
    }

    fn tiny_batch() -> Batch {
        Batch {
            tokens: arr2(&[[2, 3, 4, 5, 0], [6, 2, 2, 0, 0]]),
            targets: arr2(&[[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]]),
            label_sets: vec![vec![0, 2], vec![1]],
        }
    }

    #[test]
    fn test_forward_shapes() {
        let model = tiny_model(1);
        let pass = model.forward(&tiny_batch(), None);
        assert_eq!(pass.logits.dim(), (2, 3));
        assert_eq!(pass.pooled.len(), 2);
        assert_eq!(pass.pooled[0].dim(), (2, 2));
    }

    #[test]
    fn test_construction_is_seeded() {
        let a = tiny_model(5);
        let b = tiny_model(5);
        let c = tiny_model(6);
        assert_eq!(a.export_params(), b.export_params());
        assert_ne!(a.export_params(), c.export_params());
    }

    #[test]
    fn test_eval_forward_is_deterministic() {
        let model = tiny_model(2);
        let batch = tiny_batch();
        let a = model.predict(&batch);
        let b = model.predict(&batch);
        assert_eq!(a, b);
    }

    #[test]
    fn test_predict_scores_in_unit_interval() {
        let model = tiny_model(3);
        let scores = model.predict(&tiny_batch());
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_dropout_uses_seeded_rng() {
        let model = TextCnn::new(crate::data::random_embedding(7, 4, 0), 3, vec![2], 2, 0.5, 0);
        let batch = tiny_batch();
        let mut rng_a = StdRng::seed_from_u64(9);
        let mut rng_b = StdRng::seed_from_u64(9);
        let a = model.forward(&batch, Some(&mut rng_a));
        let b = model.forward(&batch, Some(&mut rng_b));
        assert_eq!(a.logits, b.logits);
    }

    #[test]
    fn test_output_layer_gradient_matches_finite_difference() {
        // The output layer sits after the pooling argmax, so a small
        // perturbation cannot flip the pooled positions.
        let mut model = tiny_model(11);
        let batch = tiny_batch();

        let pass = model.forward(&batch, None);
        let (_, dlogits) = bce_with_logits(&pass.logits, &batch.targets);
        model.backward(&pass, &dlogits);

        let out_w = model.out_weight_index();
        let analytic = model.params()[out_w].grad.clone();

        let eps = 1e-2f32;
        for col in [0usize, 3, 7] {
            let original = model.params()[out_w].data[col];

            model.params_mut()[out_w].data[col] = original + eps;
            let plus = bce_with_logits(&model.forward(&batch, None).logits, &batch.targets).0;
            model.params_mut()[out_w].data[col] = original - eps;
            let minus = bce_with_logits(&model.forward(&batch, None).logits, &batch.targets).0;
            model.params_mut()[out_w].data[col] = original;

            let numeric = (plus - minus) / (2.0 * eps);
            assert_relative_eq!(analytic[col], numeric, epsilon = 1e-3, max_relative = 0.05);
        }
    }

    #[test]
    fn test_backward_touches_conv_and_embedding() {
        let mut model = tiny_model(4);
        let batch = tiny_batch();
        let pass = model.forward(&batch, None);
        let (_, dlogits) = bce_with_logits(&pass.logits, &batch.targets);
        model.backward(&pass, &dlogits);

        assert!(model.params()[1].grad.iter().any(|g| *g != 0.0), "conv weight grad empty");
        assert!(model.params()[0].grad.iter().any(|g| *g != 0.0), "embedding grad empty");
    }

    #[test]
    fn test_pad_embedding_row_never_updates() {
        let mut model = tiny_model(8);
        let batch = tiny_batch();
        let pass = model.forward(&batch, None);
        let (_, dlogits) = bce_with_logits(&pass.logits, &batch.targets);
        model.backward(&pass, &dlogits);

        let embed_grad = &model.params()[0].grad;
        let embed_dim = 4;
        assert!(embed_grad.iter().take(embed_dim).all(|g| *g == 0.0));
    }

    #[test]
    fn test_small_step_along_negative_gradient_reduces_loss() {
        let mut model = tiny_model(13);
        let batch = tiny_batch();

        let pass = model.forward(&batch, None);
        let (before, dlogits) = bce_with_logits(&pass.logits, &batch.targets);
        model.backward(&pass, &dlogits);

        let updates: Vec<Array1<f32>> = model.params().iter().map(|p| p.grad.clone()).collect();
        for (param, grad) in model.params_mut().iter_mut().zip(&updates) {
            param.data.scaled_add(-0.1, grad);
        }

        let after = bce_with_logits(&model.forward(&batch, None).logits, &batch.targets).0;
        assert!(after < before, "loss should drop: {before} -> {after}");
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut model = tiny_model(21);
        let snapshot = model.export_params();
        let batch = tiny_batch();
        let before = model.predict(&batch);

        // Perturb, then restore
        model.params_mut()[0].data[10] += 1.0;
        assert_ne!(model.predict(&batch), before);
        model.import_params(&snapshot);
        assert_eq!(model.predict(&batch), before);
    }

    #[test]
    fn test_sequence_shorter_than_widest_kernel() {
        let embedding = crate::data::random_embedding(7, 4, 0);
        let model = TextCnn::new(embedding, 2, vec![2, 6], 2, 0.0, 0);
        let batch = Batch {
            tokens: arr2(&[[2, 3, 4]]),
            targets: arr2(&[[1.0, 0.0]]),
            label_sets: vec![vec![0]],
        };
        // Width 6 never fits a length-3 sequence; the pass must still work.
        let pass = model.forward(&batch, None);
        assert!(pass.logits.iter().all(|v| v.is_finite()));
    }
}
