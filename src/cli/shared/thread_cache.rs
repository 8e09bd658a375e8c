use std::cell::RefCell;
use std::sync::{Mutex, PoisonError};

use thread_local::ThreadLocal;

/// Lazily built per-thread copy of a worker context.
pub struct ThreadCache<Builder, Type>
where
    Builder: Fn() -> RefCell<Type>,
    Type: Send,
{
    mutex: Mutex<Builder>,
    thrlocal: ThreadLocal<RefCell<Type>>,
}

impl<Builder, Type> ThreadCache<Builder, Type>
where
    Builder: Fn() -> RefCell<Type>,
    Type: Send,
{
    pub fn new(builder: Builder) -> Self {
        Self { mutex: Mutex::new(builder), thrlocal: Default::default() }
    }

    pub fn get(&self) -> &RefCell<Type> {
        // Builders never panic halfway, a poisoned lock is still usable
        self.thrlocal.get_or(|| self.mutex.lock().unwrap_or_else(PoisonError::into_inner)())
    }

    pub fn dissolve(self) -> impl Iterator<Item = Type> {
        self.thrlocal.into_iter().map(RefCell::into_inner)
    }
}
