use std::sync::Arc;

use parking_lot::Mutex;

/// A mutable value owned outside the engine that animations write into.
///
/// The engine never inspects a property beyond these two operations.
pub trait Property<T>: Send + 'static {
    fn get(&self) -> T;
    fn set(&self, value: T);
}

/// A shareable value cell that implements [`Property`].
#[derive(Debug, Default)]
pub struct SharedValue<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for SharedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> SharedValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value).into(),
        }
    }
}

impl<T: Clone + Send + 'static> Property<T> for SharedValue<T> {
    fn get(&self) -> T {
        self.inner.lock().clone()
    }

    fn set(&self, value: T) {
        *self.inner.lock() = value;
    }
}
