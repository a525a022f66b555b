//! Compute-once value with explicit reset.

/// A lazily computed value.
///
/// The value is computed on first access and kept until [`Memo::reset`]
/// is called. Failed computations leave the memo empty.
#[derive(Debug, Clone)]
pub struct Memo<T> {
    value: Option<T>,
}

impl<T> Memo<T> {
    /// Create an empty memo.
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Get the value if it has been computed.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Mutable access to the value if it has been computed.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Store a value computed elsewhere.
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Check whether a value is held.
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Get the value, computing it with `f` if absent.
    pub fn get_or_init(&mut self, f: impl FnOnce() -> T) -> &T {
        self.value.get_or_insert_with(f)
    }

    /// Get the value, computing it with the fallible `f` if absent.
    pub fn get_or_try_init<E>(&mut self, f: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        let value = match self.value.take() {
            Some(value) => value,
            None => f()?,
        };
        Ok(self.value.insert(value))
    }

    /// Drop the held value so the next access recomputes it.
    pub fn reset(&mut self) {
        self.value = None;
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}
