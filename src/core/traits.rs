//! Core linear-algebra traits for parlu.

/// Matrix–vector product: y ← A x.
pub trait MatVec<V: ?Sized> {
    /// Compute y = A · x.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Induced 1-norm: the largest absolute column sum.
pub trait Norm1 {
    fn norm1(&self) -> f64;
}
