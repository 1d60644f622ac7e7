//! Shared mutable tensors and named parameters.

use ndarray::Array1;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A flat `f32` buffer shared between the model and the optimizer.
///
/// Cloning is cheap and yields another handle to the same storage, so the
/// optimizer's in-place updates are visible through every handle the model
/// holds.
#[derive(Clone, Debug)]
pub struct Tensor {
    data: Arc<RwLock<Array1<f32>>>,
}

impl Tensor {
    /// Create a tensor from an ndarray buffer.
    pub fn new(data: Array1<f32>) -> Self {
        Self { data: Arc::new(RwLock::new(data)) }
    }

    /// Create a tensor from a plain vector.
    pub fn from_vec(values: Vec<f32>) -> Self {
        Self::new(Array1::from_vec(values))
    }

    /// Create a zero-filled tensor of the given length.
    pub fn zeros(len: usize) -> Self {
        Self::new(Array1::zeros(len))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Whether the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read access to the underlying buffer.
    pub fn data(&self) -> RwLockReadGuard<'_, Array1<f32>> {
        self.data.read().expect("tensor lock poisoned")
    }

    /// Write access to the underlying buffer.
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Array1<f32>> {
        self.data.write().expect("tensor lock poisoned")
    }

    /// Copy the values out as a vector.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data().to_vec()
    }
}

/// A named trainable tensor owned by the model.
///
/// The optimizer mutates the value in place on each update but does not own
/// its lifetime. `device_resident` is an explicit capability flag decided by
/// the model; the optimizer never infers residency from the value itself.
#[derive(Clone, Debug)]
pub struct Parameter {
    name: String,
    value: Tensor,
    device_resident: bool,
}

impl Parameter {
    /// Create a host-resident parameter.
    pub fn new(name: impl Into<String>, value: Tensor) -> Self {
        Self { name: name.into(), value, device_resident: false }
    }

    /// Mark the parameter as living in device memory.
    #[must_use]
    pub fn with_device_resident(mut self, device_resident: bool) -> Self {
        self.device_resident = device_resident;
        self
    }

    /// Parameter name, unique within a model.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared value tensor.
    pub fn value(&self) -> &Tensor {
        &self.value
    }

    /// Whether the backing storage lives in device memory.
    pub fn is_device_resident(&self) -> bool {
        self.device_resident
    }

    /// Number of elements in the value.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether the value holds no elements.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}
