//! Field subscription handles

use std::sync::Weak;

use playdeck_common::MediaField;

use super::Shared;
use crate::disposal::Dispose;
use crate::error::Result;

/// Live subscription to one store field
///
/// Unsubscribes on [`Subscription::unsubscribe`] or when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    shared: Weak<Shared>,
    field: MediaField,
    id: u64,
    active: bool,
}

impl Subscription {
    pub(super) fn new(shared: Weak<Shared>, field: MediaField, id: u64) -> Self {
        Self {
            shared,
            field,
            id,
            active: true,
        }
    }

    pub fn field(&self) -> MediaField {
        self.field
    }

    pub fn is_active(&self) -> bool {
        self.active && self.shared.strong_count() > 0
    }

    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(shared) = self.shared.upgrade() {
            shared.remove_subscriber(self.field, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl Dispose for Subscription {
    fn dispose(&mut self) -> Result<()> {
        self.detach();
        Ok(())
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("field", &self.field)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
