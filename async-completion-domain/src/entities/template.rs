// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Template
//!
//! A completion callback binding, created at owner (device/driver/USB
//! instance) initialization and destroyed only once no task references it
//! anymore. Destruction while `use_count > 0` fails with
//! [`crate::error::CompletionError::Busy`].

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::CompletionError;
use crate::value_objects::{CompletionStatus, TemplateId, TemplateKind};

/// The event handed to a template's completion callback.
pub struct CompletionEvent {
    /// The task's own consumer payload.
    pub user_data: Option<Arc<dyn Any + Send + Sync>>,
    /// The template's per-kind argument (populated for DRIVER/INTERNAL
    /// templates per [`TemplateKind::passes_template_argument`]).
    pub template_argument: Option<Arc<dyn Any + Send + Sync>>,
    pub status: CompletionStatus,
}

impl fmt::Debug for CompletionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionEvent").field("status", &self.status).finish()
    }
}

/// A completion callback, boxed so templates of different owner kinds share
/// one field type.
pub type CompletionCallback = Arc<dyn Fn(CompletionEvent) + Send + Sync>;

/// A completion binding owned by a device, driver, internal, or USB
/// instance.
///
/// The owner is identified by an opaque id rather than a raw pointer; the
/// owning device/driver/USB object is resolved by the consumer's own
/// registry, not by this crate.
pub struct Template {
    id: TemplateId,
    kind: TemplateKind,
    owner: u64,
    callback: CompletionCallback,
    template_argument: Option<Arc<dyn Any + Send + Sync>>,
    use_count: AtomicUsize,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("owner", &self.owner)
            .field("use_count", &self.use_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Template {
    pub fn new(
        kind: TemplateKind,
        owner: u64,
        callback: CompletionCallback,
        template_argument: Option<Arc<dyn Any + Send + Sync>>,
    ) -> Self {
        Self {
            id: TemplateId::next(),
            kind,
            owner,
            callback,
            template_argument,
            use_count: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> TemplateId {
        self.id
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn owner(&self) -> u64 {
        self.owner
    }

    pub fn use_count(&self) -> usize {
        self.use_count.load(Ordering::Acquire)
    }

    /// Called when a task is bound to this template.
    pub fn acquire(&self) {
        self.use_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Called once a task bound to this template has fired its completion
    /// callback.
    pub fn release(&self) {
        let prev = self.use_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "template use-count underflow");
    }

    /// Fails with [`CompletionError::Busy`] unless `use_count == 0`. The
    /// caller performs the actual unlink/free; this only validates the
    /// precondition.
    pub fn check_destroyable(&self) -> Result<(), CompletionError> {
        if self.use_count() > 0 {
            Err(CompletionError::busy(format!(
                "template {} still has {} outstanding task(s)",
                self.id,
                self.use_count()
            )))
        } else {
            Ok(())
        }
    }

    /// Invokes the completion callback with the given status, supplying the
    /// template's own argument only for kinds that pass one through.
    pub fn fire(&self, user_data: Option<Arc<dyn Any + Send + Sync>>, status: CompletionStatus) {
        let template_argument = if self.kind.passes_template_argument() {
            self.template_argument.clone()
        } else {
            None
        };
        (self.callback)(CompletionEvent { user_data, template_argument, status });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize as Counter;

    #[test]
    fn busy_until_use_count_drops_to_zero() {
        let fired = Arc::new(Counter::new(0));
        let fired_clone = fired.clone();
        let t = Template::new(
            TemplateKind::Device,
            1,
            Arc::new(move |_event| {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }),
            None,
        );
        t.acquire();
        assert!(t.check_destroyable().is_err());
        t.release();
        assert!(t.check_destroyable().is_ok());

        t.fire(None, CompletionStatus::Success);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
