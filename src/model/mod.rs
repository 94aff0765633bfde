//! Convolutional text classifier
//!
//! An XML-CNN style network over word embeddings: embedding lookup with
//! dropout, one 1-d convolution bank per kernel width, tanh nonlinearity,
//! max-pooling over positions, and a linear output layer producing one logit
//! per label. Gradients are computed by an explicit backward pass; parameters
//! are flat arrays consumed by the optimizers.

mod cnn;
mod loss;
mod param;

pub use cnn::{ForwardPass, TextCnn};
pub use loss::{bce_with_logits, sigmoid_scores};
pub use param::Parameter;
