/// A quantity computed once per member of an index set.
///
/// Keys are fixed at construction; only the values change during a run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorValuedQuantity {
    keys: Vec<u32>,
    values: Vec<f64>,
}

impl VectorValuedQuantity {
    /// Creates a quantity with one zero-initialized value per key.
    #[must_use]
    pub fn new(keys: Vec<u32>) -> Self {
        let values = vec![0.0; keys.len()];
        Self { keys, values }
    }

    #[must_use]
    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the position of `key`, if present.
    #[must_use]
    pub fn position(&self, key: u32) -> Option<usize> {
        self.keys.iter().position(|&k| k == key)
    }

    /// Returns the value stored for `key`, if present.
    #[must_use]
    pub fn get(&self, key: u32) -> Option<f64> {
        self.position(key).map(|pos| self.values[pos])
    }

    /// Returns the value at `position`, if in range.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<f64> {
        self.values.get(position).copied()
    }

    /// Sets the value at `position`. Out-of-range positions are ignored.
    pub fn set_at(&mut self, position: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(position) {
            *slot = value;
        }
    }
}
