use std::sync::Arc;

use mohtaref_core::ServiceHandle;

use crate::cache::CachePolicy;

/// Router state for one REST-exposed service.
pub struct RestState<R, P> {
    pub handle: Arc<ServiceHandle<R, P>>,
    pub policy: CachePolicy,
}

impl<R, P> Clone for RestState<R, P> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
            policy: self.policy,
        }
    }
}

impl<R, P> RestState<R, P> {
    pub fn new(handle: Arc<ServiceHandle<R, P>>, policy: CachePolicy) -> Self {
        Self { handle, policy }
    }
}
