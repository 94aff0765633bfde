//! Stochastic gradient descent with momentum and weight decay

use super::Optimizer;
use crate::model::Parameter;
use ndarray::Array1;

/// SGD optimizer: `g = grad + λ·θ`, `v = μ·v + g`, `θ -= lr·v`.
pub struct Sgd {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    velocities: Vec<Option<Array1<f32>>>,
}

impl Sgd {
    /// Create a new SGD optimizer.
    pub fn new(lr: f32, momentum: f32, weight_decay: f32) -> Self {
        Self { lr, momentum, weight_decay, velocities: Vec::new() }
    }

    fn ensure_velocities(&mut self, params: &[Parameter]) {
        if self.velocities.is_empty() {
            self.velocities = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [Parameter]) {
        self.ensure_velocities(params);

        for (i, param) in params.iter_mut().enumerate() {
            if self.momentum > 0.0 {
                if self.velocities[i].is_none() {
                    self.velocities[i] = Some(Array1::zeros(param.len()));
                }
                let velocity = self.velocities[i].as_mut().expect("velocity initialized above");
                for j in 0..param.len() {
                    let g = param.grad[j] + self.weight_decay * param.data[j];
                    velocity[j] = self.momentum * velocity[j] + g;
                    param.data[j] -= self.lr * velocity[j];
                }
            } else {
                for j in 0..param.len() {
                    let g = param.grad[j] + self.weight_decay * param.data[j];
                    param.data[j] -= self.lr * g;
                }
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
