//! Disposal bin: scoped cleanup collector
//!
//! Everything registered while an adapter is connected (store subscriptions,
//! timers, detach callbacks) goes into one bin; disconnecting disposes the
//! bin, running each item exactly once in registration order.

use crate::error::{Error, Result};
use tracing::warn;

/// Object that releases a resource when disposed
pub trait Dispose: Send {
    fn dispose(&mut self) -> Result<()>;
}

/// One registered cleanup item
pub enum Disposer {
    /// Plain callback
    Callback(Box<dyn FnOnce() -> Result<()> + Send>),
    /// Object implementing [`Dispose`]
    Object(Box<dyn Dispose>),
}

impl Disposer {
    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Disposer::Callback(Box::new(move || {
            f();
            Ok(())
        }))
    }

    pub fn fallible<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Disposer::Callback(Box::new(f))
    }

    pub fn object<D>(object: D) -> Self
    where
        D: Dispose + 'static,
    {
        Disposer::Object(Box::new(object))
    }

    fn run(self) -> Result<()> {
        match self {
            Disposer::Callback(f) => f(),
            Disposer::Object(mut object) => object.dispose(),
        }
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposer::Callback(_) => write!(f, "Disposer::Callback"),
            Disposer::Object(_) => write!(f, "Disposer::Object"),
        }
    }
}

/// Collects cleanup items for one session
#[derive(Debug, Default)]
pub struct DisposalBin {
    items: Vec<Disposer>,
}

impl DisposalBin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one item; `None` is ignored
    pub fn add(&mut self, item: impl Into<Option<Disposer>>) {
        if let Some(item) = item.into() {
            self.items.push(item);
        }
    }

    /// Register several items; `None` entries are ignored
    pub fn extend<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = Option<Disposer>>,
    {
        self.items.extend(items.into_iter().flatten());
    }

    pub fn add_callback<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.items.push(Disposer::callback(f));
    }

    pub fn add_object<D>(&mut self, object: D)
    where
        D: Dispose + 'static,
    {
        self.items.push(Disposer::object(object));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Run every item in registration order, then clear
    ///
    /// Every item runs exactly once even when an earlier one fails; the first
    /// failure is returned. No-op on an empty bin.
    pub fn dispose(&mut self) -> Result<()> {
        let mut first_error: Option<Error> = None;

        for item in std::mem::take(&mut self.items) {
            if let Err(err) = item.run() {
                warn!(error = %err, "Cleanup callback failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Flag(Arc<Mutex<Vec<&'static str>>>);

    impl Dispose for Flag {
        fn dispose(&mut self) -> Result<()> {
            self.0.lock().unwrap().push("object");
            Ok(())
        }
    }

    #[test]
    fn test_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bin = DisposalBin::new();

        let l = log.clone();
        bin.add_callback(move || l.lock().unwrap().push("first"));
        bin.add_object(Flag(log.clone()));
        let l = log.clone();
        bin.add(Disposer::callback(move || l.lock().unwrap().push("third")));

        bin.dispose().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "object", "third"]);
        assert!(bin.is_empty());
    }

    #[test]
    fn test_none_entries_ignored() {
        let mut bin = DisposalBin::new();
        bin.add(None::<Disposer>);
        bin.extend(vec![None, Some(Disposer::callback(|| {})), None]);
        assert_eq!(bin.len(), 1);
    }

    #[test]
    fn test_dispose_twice_on_empty_bin_is_noop() {
        let mut bin = DisposalBin::new();
        assert!(bin.dispose().is_ok());
        assert!(bin.dispose().is_ok());
    }

    #[test]
    fn test_each_item_runs_exactly_once() {
        let count = Arc::new(Mutex::new(0));
        let mut bin = DisposalBin::new();
        let c = count.clone();
        bin.add_callback(move || *c.lock().unwrap() += 1);

        bin.dispose().unwrap();
        bin.dispose().unwrap();
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_error_propagates_after_all_items_run() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bin = DisposalBin::new();
        bin.add(Disposer::fallible(|| Err(Error::Disposal("first failed".into()))));
        let l = log.clone();
        bin.add_callback(move || l.lock().unwrap().push("second"));
        bin.add(Disposer::fallible(|| Err(Error::Disposal("third failed".into()))));

        let err = bin.dispose().unwrap_err();
        assert_eq!(err, Error::Disposal("first failed".into()));
        assert_eq!(*log.lock().unwrap(), vec!["second"]);
        assert!(bin.is_empty());
    }

    #[test]
    fn test_bin_reusable_after_dispose() {
        let count = Arc::new(Mutex::new(0));
        let mut bin = DisposalBin::new();
        let c = count.clone();
        bin.add_callback(move || *c.lock().unwrap() += 1);
        bin.dispose().unwrap();

        let c = count.clone();
        bin.add_callback(move || *c.lock().unwrap() += 10);
        bin.dispose().unwrap();
        assert_eq!(*count.lock().unwrap(), 11);
    }
}
