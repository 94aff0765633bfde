//! Optimizer trait

use crate::model::Parameter;

/// Trait for gradient-based update rules over flat parameters.
pub trait Optimizer {
    /// Apply one update step from the accumulated gradients.
    fn step(&mut self, params: &mut [Parameter]);

    /// Zero out all gradient buffers.
    fn zero_grad(&mut self, params: &mut [Parameter]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    struct PlainSgd {
        learning_rate: f32,
    }

    impl Optimizer for PlainSgd {
        fn step(&mut self, params: &mut [Parameter]) {
            for param in params {
                let update = &param.grad * self.learning_rate;
                param.data = &param.data - &update;
            }
        }

        fn lr(&self) -> f32 {
            self.learning_rate
        }

        fn set_lr(&mut self, lr: f32) {
            self.learning_rate = lr;
        }
    }

    #[test]
    fn test_default_zero_grad() {
        let mut opt = PlainSgd { learning_rate: 0.1 };
        let mut params = vec![Parameter::new("w", arr1(&[1.0, 2.0]))];
        params[0].grad = arr1(&[0.5, 0.5]);

        opt.zero_grad(&mut params);
        assert!(params[0].grad.iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_set_lr() {
        let mut opt = PlainSgd { learning_rate: 0.1 };
        opt.set_lr(0.01);
        assert_eq!(opt.lr(), 0.01);
    }
}
