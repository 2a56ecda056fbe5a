//! Process-wide provider registry: name → factory, guarded by a mutex.
//!
//! Mirrors the teacher's `OnceLock<Mutex<...>>` singleton pattern for
//! process-wide configuration state.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use driftnet_core::{Error, Result};

use crate::provider::{Provider, ProviderFactory};

fn registry() -> &'static Mutex<HashMap<String, ProviderFactory>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, ProviderFactory>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

fn lock() -> std::sync::MutexGuard<'static, HashMap<String, ProviderFactory>> {
    registry().lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sorted list of every currently registered provider name.
pub fn available() -> Vec<String> {
    let mut names: Vec<String> = lock().keys().cloned().collect();
    names.sort();
    names
}

pub fn has(name: &str) -> bool {
    lock().contains_key(&name.to_ascii_lowercase())
}

/// Registers a factory under `name`. Fails with `AlreadyRegistered` unless
/// `override_existing` is set.
pub fn register(name: &str, factory: ProviderFactory, override_existing: bool) -> Result<()> {
    let key = name.to_ascii_lowercase();
    let mut guard = lock();
    if guard.contains_key(&key) && !override_existing {
        return Err(Error::AlreadyRegistered(key));
    }
    guard.insert(key.clone(), factory);
    tracing::debug!(target: "driftnet_providers", provider = %key, "registered");
    Ok(())
}

pub fn unregister(name: &str) -> Result<()> {
    let key = name.to_ascii_lowercase();
    let mut guard = lock();
    if guard.remove(&key).is_none() {
        return Err(Error::NotRegistered(key));
    }
    tracing::debug!(target: "driftnet_providers", provider = %key, "unregistered");
    Ok(())
}

/// Produces a fresh provider instance for `name`.
pub fn resolve(name: &str) -> Result<Box<dyn Provider>> {
    let key = name.to_ascii_lowercase();
    let guard = lock();
    let factory = guard.get(&key).ok_or_else(|| {
        tracing::warn!(target: "driftnet_providers", provider = %key, "resolve failed: not registered");
        Error::NotRegistered(key.clone())
    })?;
    Ok(factory())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Batch, Filters, ProviderOptions, Session};
    use async_trait::async_trait;
    use serial_test::serial;

    struct NoopProvider;

    #[async_trait]
    impl Provider for NoopProvider {
        async fn configure(&mut self, _options: ProviderOptions) -> Result<Session> {
            unimplemented!("not exercised by registry tests")
        }

        async fn fetch_since(
            &self,
            _cursor: Option<String>,
            _limit: u32,
            _filters: &Filters,
        ) -> Result<Batch> {
            Ok(Batch::empty())
        }
    }

    fn noop_factory() -> ProviderFactory {
        Box::new(|| Box::new(NoopProvider))
    }

    #[test]
    #[serial]
    fn register_resolve_unregister_round_trip() {
        register("test-noop", noop_factory(), true).unwrap();
        assert!(has("test-noop"));
        assert!(resolve("test-noop").is_ok());
        unregister("test-noop").unwrap();
        assert!(!has("test-noop"));
    }

    #[test]
    #[serial]
    fn duplicate_register_without_override_fails() {
        register("test-dup", noop_factory(), true).unwrap();
        let err = register("test-dup", noop_factory(), false).unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered(_)));
        unregister("test-dup").unwrap();
    }

    #[test]
    #[serial]
    fn unregister_missing_name_fails() {
        let err = unregister("does-not-exist").unwrap_err();
        assert!(matches!(err, Error::NotRegistered(_)));
    }

    #[test]
    #[serial]
    fn resolve_missing_name_fails() {
        let err = resolve("does-not-exist-either").unwrap_err();
        assert!(matches!(err, Error::NotRegistered(_)));
    }
}
