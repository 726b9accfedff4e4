//! Type-keyed service provider.
//!
//! Services are registered once during startup on a [`ServiceCollection`] and
//! resolved by type afterwards through the frozen [`ServiceProvider`].
//!
//! - Key = `type_name::<T>()`, which works for `T = dyn Trait`.
//! - Value = a typed entry stored as `Box<dyn Any + Send + Sync>` (downcast on read).
//! - Factories (lazy singleton and transient) run outside of any lock, so they
//!   may resolve their own dependencies from the same provider.
//! - A factory that re-enters resolution of a type already being built on the
//!   same thread fails with [`ResolveError::Cycle`].
//! - Two threads racing on an unbuilt lazy singleton may both run the factory;
//!   the first stored instance wins and is returned to both.

use parking_lot::Mutex;
use std::{any::Any, cell::RefCell, collections::HashMap, fmt, sync::Arc};

use crate::observability::logging::Logger;

/// Stable type key — fully-qualified `type_name::<T>()`.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no service registered for type {type_key}")]
    NotRegistered { type_key: TypeKey },

    #[error("type mismatch in provider for type {type_key}")]
    TypeMismatch { type_key: TypeKey },

    #[error("dependency cycle while resolving type {type_key}")]
    Cycle { type_key: TypeKey },
}

type Factory<T> = Arc<dyn Fn(&ServiceProvider) -> Result<Arc<T>, ResolveError> + Send + Sync>;

enum Entry<T: ?Sized> {
    Instance(Arc<T>),
    Lazy {
        factory: Factory<T>,
        cell: Mutex<Option<Arc<T>>>,
    },
    Transient(Factory<T>),
}

type Boxed = Box<dyn Any + Send + Sync>;

thread_local! {
    /// Factories currently running on this thread, keyed by provider address.
    static RESOLVING: RefCell<Vec<(usize, TypeKey)>> = const { RefCell::new(Vec::new()) };
}

/// Marks `type_key` as in flight until dropped.
struct ResolveGuard {
    slot: (usize, TypeKey),
}

impl ResolveGuard {
    fn enter(provider: &ServiceProvider, type_key: TypeKey) -> Result<Self, ResolveError> {
        let slot = (provider as *const ServiceProvider as usize, type_key);
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&slot) {
                return Err(ResolveError::Cycle { type_key });
            }
            stack.push(slot);
            Ok(ResolveGuard { slot })
        })
    }
}

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|s| *s == self.slot) {
                stack.remove(pos);
            }
        });
    }
}

/// Mutable registration surface, consumed by [`ServiceCollection::build`].
#[derive(Default)]
pub struct ServiceCollection {
    map: HashMap<TypeKey, Boxed>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already constructed instance under type `T`.
    pub fn add_singleton<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert::<T>(Entry::Instance(instance))
    }

    /// Register a singleton built on first resolution.
    pub fn add_singleton_with<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        self.insert::<T>(Entry::Lazy {
            factory: Arc::new(factory),
            cell: Mutex::new(None),
        })
    }

    /// Register a factory invoked on every resolution of `T`.
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        self.insert::<T>(Entry::Transient(Arc::new(factory)))
    }

    /// Register a [`Logger`] whose category is `C`.
    pub fn add_logger<C: ?Sized + 'static>(&mut self) -> &mut Self {
        self.add_singleton::<Logger<C>>(Arc::new(Logger::new()))
    }

    /// Re-registering a type replaces the previous registration.
    fn insert<T>(&mut self, entry: Entry<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        if self.map.insert(key, Box::new(entry)).is_some() {
            tracing::debug!(service = %key, "Replaced existing service registration");
        }
        self
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Freeze the registrations into a shareable provider.
    pub fn build(self) -> Arc<ServiceProvider> {
        tracing::debug!(services = self.map.len(), "Service provider built");
        Arc::new(ServiceProvider { map: self.map })
    }
}

/// Resolves registered services by type.
pub struct ServiceProvider {
    map: HashMap<TypeKey, Boxed>,
}

impl ServiceProvider {
    /// Resolve `T`, failing if it was never registered.
    pub fn get_required<T>(&self) -> Result<Arc<T>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::of::<T>();
        let entry = self
            .map
            .get(&type_key)
            .ok_or(ResolveError::NotRegistered { type_key })?
            .downcast_ref::<Entry<T>>()
            .ok_or(ResolveError::TypeMismatch { type_key })?;

        match entry {
            Entry::Instance(instance) => Ok(instance.clone()),
            Entry::Lazy { factory, cell } => {
                if let Some(instance) = cell.lock().clone() {
                    return Ok(instance);
                }
                let _guard = ResolveGuard::enter(self, type_key)?;
                let instance = factory(self)?;
                Ok(cell.lock().get_or_insert(instance).clone())
            }
            Entry::Transient(factory) => {
                let _guard = ResolveGuard::enter(self, type_key)?;
                factory(self)
            }
        }
    }

    /// Resolve `T` if registered.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_required::<T>().ok()
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.map.contains_key(&TypeKey::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.map.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    };
    use std::time::Duration;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[derive(Debug)]
    struct Counter(usize);

    #[test]
    fn test_resolve_trait_object_singleton() {
        let mut services = ServiceCollection::new();
        services.add_singleton::<dyn Greeter>(Arc::new(English));
        let provider = services.build();

        let a = provider.get_required::<dyn Greeter>().unwrap();
        let b = provider.get_required::<dyn Greeter>().unwrap();
        assert_eq!(a.greet(), "hello");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_transient_is_fresh_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();

        let mut services = ServiceCollection::new();
        services.add_transient::<Counter, _>(move |_| {
            Ok(Arc::new(Counter(c.fetch_add(1, Ordering::SeqCst))))
        });
        let provider = services.build();

        let a = provider.get_required::<Counter>().unwrap();
        let b = provider.get_required::<Counter>().unwrap();
        assert_eq!(a.0, 0);
        assert_eq!(b.0, 1);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lazy_singleton_built_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();

        let mut services = ServiceCollection::new();
        services.add_singleton_with::<Counter, _>(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Counter(7)))
        });
        let provider = services.build();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let a = provider.get_required::<Counter>().unwrap();
        let b = provider.get_required::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_service() {
        let provider = ServiceCollection::new().build();
        let err = provider.get_required::<Counter>().unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotRegistered {
                type_key: TypeKey::of::<Counter>()
            }
        );
        assert!(err.to_string().contains("Counter"));
        assert!(provider.get::<Counter>().is_none());
    }

    #[test]
    fn test_transient_dependency_failure_propagates() {
        let mut services = ServiceCollection::new();
        services.add_transient::<Counter, _>(|sp| {
            let greeter = sp.get_required::<dyn Greeter>()?;
            Ok(Arc::new(Counter(greeter.greet().len())))
        });
        let provider = services.build();

        let err = provider.get_required::<Counter>().unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotRegistered {
                type_key: TypeKey::of::<dyn Greeter>()
            }
        );
    }

    #[test]
    fn test_reregister_overwrites() {
        let mut services = ServiceCollection::new();
        services.add_singleton(Arc::new(Counter(1)));
        services.add_singleton(Arc::new(Counter(2)));
        assert_eq!(services.len(), 1);

        let provider = services.build();
        assert_eq!(provider.get_required::<Counter>().unwrap().0, 2);
    }

    #[test]
    fn test_add_logger_registers_typed_category() {
        let mut services = ServiceCollection::new();
        services.add_logger::<Counter>();
        let provider = services.build();

        assert!(provider.contains::<Logger<Counter>>());
        assert!(!provider.contains::<Logger<English>>());
    }

    #[test]
    fn test_lazy_self_cycle_fails_instead_of_hanging() {
        let mut services = ServiceCollection::new();
        services.add_singleton_with::<Counter, _>(|sp| {
            let inner = sp.get_required::<Counter>()?;
            Ok(Arc::new(Counter(inner.0 + 1)))
        });
        let provider = services.build();

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(provider.get_required::<Counter>().map(|c| c.0));
        });

        let result = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("resolution deadlocked");
        assert_eq!(
            result,
            Err(ResolveError::Cycle {
                type_key: TypeKey::of::<Counter>()
            })
        );
    }

    #[test]
    fn test_transient_cycle_between_two_types() {
        let mut services = ServiceCollection::new();
        services.add_transient::<Counter, _>(|sp| {
            let greeter = sp.get_required::<dyn Greeter>()?;
            Ok(Arc::new(Counter(greeter.greet().len())))
        });
        services.add_transient::<dyn Greeter, _>(|sp| {
            sp.get_required::<Counter>()?;
            Ok(Arc::new(English) as Arc<dyn Greeter>)
        });
        let provider = services.build();

        let err = provider.get_required::<Counter>().unwrap_err();
        assert_eq!(
            err,
            ResolveError::Cycle {
                type_key: TypeKey::of::<Counter>()
            }
        );
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_failed_cycle_leaves_no_in_flight_state() {
        let mut services = ServiceCollection::new();
        services.add_transient::<Counter, _>(|sp| {
            sp.get_required::<Counter>()?;
            Ok(Arc::new(Counter(0)))
        });
        let cyclic = services.build();
        assert!(cyclic.get_required::<Counter>().is_err());

        let mut services = ServiceCollection::new();
        services.add_singleton::<dyn Greeter>(Arc::new(English));
        services.add_transient::<Counter, _>(|sp| {
            let greeter = sp.get_required::<dyn Greeter>()?;
            Ok(Arc::new(Counter(greeter.greet().len())))
        });
        let provider = services.build();

        // Shared dependency resolved twice in one chain is not a cycle.
        assert_eq!(provider.get_required::<Counter>().unwrap().0, 5);
        assert_eq!(provider.get_required::<Counter>().unwrap().0, 5);
        RESOLVING.with(|stack| assert!(stack.borrow().is_empty()));
    }
}
