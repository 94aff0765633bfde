//! Flat model parameter with its gradient buffer

use ndarray::Array1;

/// One named parameter tensor, stored flat; shape bookkeeping lives with the
/// model that owns it.
#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub data: Array1<f32>,
    pub grad: Array1<f32>,
}

impl Parameter {
    /// Create a parameter with a zeroed gradient buffer.
    pub fn new(name: impl Into<String>, data: Array1<f32>) -> Self {
        let grad = Array1::zeros(data.len());
        Self { name: name.into(), data, grad }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reset the gradient buffer to zero.
    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_new_zeroes_grad() {
        let p = Parameter::new("w", arr1(&[1.0, 2.0, 3.0]));
        assert_eq!(p.len(), 3);
        assert!(p.grad.iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_zero_grad() {
        let mut p = Parameter::new("w", arr1(&[1.0, 2.0]));
        p.grad[0] = 5.0;
        p.zero_grad();
        assert!(p.grad.iter().all(|g| *g == 0.0));
    }
}
