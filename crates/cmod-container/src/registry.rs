//! Dependency registry for resolved instances.
//!
//! The registry owns the [`TypeCatalog`] and every instance constructed or
//! provided during boot, in registration order. Lookups go by name: an
//! instance matches a name when it is assignable to it (see
//! [`Instance::is_assignable_to`]).

use crate::catalog::{CodeBundle, CodeOrigin, TypeCatalog};
use crate::error::{ContainerError, ContainerResult};
use crate::instance::Instance;
use crate::session::{Session, SessionContext};
use std::sync::Arc;
use tracing::{debug, info};

/// Registry length at a point in time, used to undo a failed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Registry of resolved instances.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    /// Injected definitions.
    catalog: TypeCatalog,

    /// Resolved instances in registration order.
    instances: Vec<Instance>,
}

impl DependencyRegistry {
    /// Create an empty registry with an empty catalog.
    pub fn new() -> Self {
        Self {
            catalog: TypeCatalog::new(),
            instances: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Register `bundle`'s definitions, once per origin.
    pub fn inject(&mut self, origin: CodeOrigin, bundle: &CodeBundle) -> ContainerResult<()> {
        self.catalog.inject(origin, bundle)
    }

    /// Register an already constructed instance.
    ///
    /// Fails with [`ContainerError::CapabilityAlreadyBound`] if the instance
    /// exposes an exclusive capability some other instance already exposes.
    pub fn add_resolved(&mut self, instance: Instance) -> ContainerResult<()> {
        for view in instance.view_names() {
            let exclusive = self
                .catalog
                .capability(view)
                .map(|c| c.is_exclusive())
                .unwrap_or(false);

            if exclusive && self.is_bound(view) {
                return Err(ContainerError::CapabilityAlreadyBound {
                    capability: view.to_string(),
                    type_name: instance.type_name().to_string(),
                });
            }
        }

        debug!("Registered instance of {}", instance.type_name());
        self.instances.push(instance);
        Ok(())
    }

    /// Exactly one instance assignable to `name`.
    pub fn find_single(&self, name: &str) -> ContainerResult<Instance> {
        self.lookup_single(None, name)
    }

    /// Every instance assignable to `name`, in registration order.
    pub fn find_all(&self, name: &str) -> Vec<Instance> {
        self.lookup_all(None, name)
    }

    /// [`find_single`](Self::find_single) viewed as `Arc<T>`.
    pub fn find_single_as<T>(&self, name: &str) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.find_single(name)?.require::<T>(name)
    }

    /// Whether any registered instance is assignable to `name`.
    pub fn is_bound(&self, name: &str) -> bool {
        self.instances.iter().any(|i| i.is_assignable_to(name))
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.instances.len())
    }

    /// Drop every instance registered after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        let discarded = self.instances.len().saturating_sub(checkpoint.0);
        if discarded > 0 {
            info!("Discarding {} instance(s) of a failed batch", discarded);
        }
        self.instances.truncate(checkpoint.0);
    }

    /// Open a session; its markers are dropped with the returned guard.
    pub fn open_session(&mut self, context: SessionContext) -> Session<'_> {
        Session::new(self, context)
    }

    /// Run `f` inside a session that is closed when `f` returns.
    pub fn with_session<R>(
        &mut self,
        context: SessionContext,
        f: impl FnOnce(&mut Session<'_>) -> R,
    ) -> R {
        let mut session = self.open_session(context);
        f(&mut session)
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Implementation names of all registered instances, in registration order.
    pub fn registered_types(&self) -> Vec<&str> {
        self.instances.iter().map(Instance::type_name).collect()
    }

    pub(crate) fn lookup_single(
        &self,
        context: Option<&SessionContext>,
        name: &str,
    ) -> ContainerResult<Instance> {
        let tags = self.catalog.tags_for(name);
        if tags.is_multi_valued() {
            return Err(ContainerError::MultiValued(name.to_string()));
        }

        if let Some(context) = context {
            let markers: Vec<_> = context.assignable_to(name).collect();
            match markers.as_slice() {
                [] => {}
                [single] => return Ok((*single).clone()),
                many => {
                    return Err(ContainerError::Ambiguous {
                        type_name: name.to_string(),
                        count: many.len(),
                    })
                }
            }
        }

        if tags.special().is_some() {
            return Err(ContainerError::NotResolved(name.to_string()));
        }

        let matches: Vec<_> = self
            .instances
            .iter()
            .filter(|i| i.is_assignable_to(name))
            .collect();

        match matches.as_slice() {
            [] => Err(ContainerError::NotResolved(name.to_string())),
            [single] => Ok((*single).clone()),
            many => Err(ContainerError::Ambiguous {
                type_name: name.to_string(),
                count: many.len(),
            }),
        }
    }

    pub(crate) fn lookup_all(&self, context: Option<&SessionContext>, name: &str) -> Vec<Instance> {
        let mut found: Vec<Instance> = context
            .map(|c| c.assignable_to(name).cloned().collect())
            .unwrap_or_default();

        if self.catalog.tags_for(name).special().is_none() {
            found.extend(
                self.instances
                    .iter()
                    .filter(|i| i.is_assignable_to(name))
                    .cloned(),
            );
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CapabilityDef;
    use crate::tags::{SpecialKind, Tag};

    trait Plugin: Send + Sync {}

    struct Echo;
    impl Plugin for Echo {}

    fn plugin(type_name: &str, capability: &str) -> Instance {
        let value = Arc::new(Echo);
        let view: Arc<dyn Plugin> = value.clone();
        Instance::new(type_name, value).with_view(capability, view)
    }

    fn registry() -> DependencyRegistry {
        let mut registry = DependencyRegistry::new();
        let bundle = CodeBundle::new("core")
            .with_capability(CapabilityDef::new("app::IExclusive"))
            .with_capability(CapabilityDef::new("app::IPlugin").tag(Tag::MultiValued))
            .with_capability(
                CapabilityDef::new("app::IModule").tag(Tag::Special(SpecialKind::Module)),
            );
        registry.inject(CodeOrigin::Core, &bundle).unwrap();
        registry
    }

    #[test]
    fn test_registry_find_single() {
        let mut registry = registry();
        registry.add_resolved(plugin("app::A", "app::IExclusive")).unwrap();

        let found = registry.find_single("app::IExclusive").unwrap();
        assert_eq!(found.type_name(), "app::A");
        assert!(registry.find_single_as::<dyn Plugin>("app::IExclusive").is_ok());
        assert!(matches!(
            registry.find_single("app::Missing"),
            Err(ContainerError::NotResolved(_))
        ));
    }

    #[test]
    fn test_registry_ambiguous() {
        let mut registry = registry();
        registry.add_resolved(plugin("app::A", "app::IShared")).unwrap();
        registry.add_resolved(plugin("app::B", "app::IShared")).unwrap();

        assert!(matches!(
            registry.find_single("app::IShared"),
            Err(ContainerError::Ambiguous { count: 2, .. })
        ));
        assert_eq!(registry.find_all("app::IShared").len(), 2);
    }

    #[test]
    fn test_registry_exclusive_capability() {
        let mut registry = registry();
        registry.add_resolved(plugin("app::A", "app::IExclusive")).unwrap();

        let second = registry.add_resolved(plugin("app::B", "app::IExclusive"));
        assert!(matches!(
            second,
            Err(ContainerError::CapabilityAlreadyBound { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_multi_valued() {
        let mut registry = registry();
        registry.add_resolved(plugin("app::A", "app::IPlugin")).unwrap();
        registry.add_resolved(plugin("app::B", "app::IPlugin")).unwrap();

        assert!(matches!(
            registry.find_single("app::IPlugin"),
            Err(ContainerError::MultiValued(_))
        ));
        assert_eq!(registry.find_all("app::IPlugin").len(), 2);
        assert!(registry.find_all("app::Nothing").is_empty());
    }

    #[test]
    fn test_session_markers() {
        let mut registry = registry();
        registry.add_resolved(plugin("app::Global", "app::IShared")).unwrap();

        // Special names never come from the registry itself.
        registry.add_resolved(plugin("app::Stray", "app::IModule")).unwrap();
        assert!(matches!(
            registry.find_single("app::IModule"),
            Err(ContainerError::NotResolved(_))
        ));

        let context = SessionContext::new()
            .with_marker(SpecialKind::Module, plugin("app::Self", "app::IModule"))
            .with_marker(SpecialKind::Locale, plugin("app::Local", "app::IShared"));

        registry.with_session(context, |session| {
            assert_eq!(
                session.find_single("app::IModule").unwrap().type_name(),
                "app::Self"
            );
            assert_eq!(
                session.find_single("app::IShared").unwrap().type_name(),
                "app::Local"
            );
            assert_eq!(session.find_all("app::IShared").len(), 2);
        });

        assert_eq!(
            registry.find_single("app::IShared").unwrap().type_name(),
            "app::Global"
        );
    }

    #[test]
    fn test_checkpoint_rollback() {
        let mut registry = registry();
        registry.add_resolved(plugin("app::A", "app::IPlugin")).unwrap();

        let checkpoint = registry.checkpoint();
        registry.add_resolved(plugin("app::B", "app::IPlugin")).unwrap();
        registry.add_resolved(plugin("app::C", "app::IPlugin")).unwrap();
        registry.rollback(checkpoint);

        assert_eq!(registry.registered_types(), ["app::A"]);
    }
}
