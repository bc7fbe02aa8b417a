//! Thread-shared client
//!
//! A client correlates replies by verb only, so two calls in flight on one
//! connection can swap replies. `SharedClient` holds a lock across the whole
//! call, session transition and follow-up fetch included.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::client::Client;
use crate::network::{TcpTransport, Transport};

/// A [`Client`] behind a mutex
pub struct SharedClient<T = TcpTransport> {
    inner: Arc<Mutex<Client<T>>>,
}

impl<T: Transport> SharedClient<T> {
    pub fn new(client: Client<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// Run `f` with exclusive access to the client
    pub fn with<R>(&self, f: impl FnOnce(&mut Client<T>) -> R) -> R {
        let mut client = self.inner.lock();
        f(&mut *client)
    }

    /// Lock the client for a sequence of calls
    pub fn lock(&self) -> MutexGuard<'_, Client<T>> {
        self.inner.lock()
    }
}

impl<T> Clone for SharedClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> From<Client<T>> for SharedClient<T> {
    fn from(client: Client<T>) -> Self {
        Self::new(client)
    }
}
