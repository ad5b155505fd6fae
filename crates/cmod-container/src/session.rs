//! Resolution sessions.
//!
//! A [`SessionContext`] holds the special markers of one module's resolution
//! pass (the module's self-reference and its locale lookup). Markers are only
//! visible through the [`Session`] guard that owns them and disappear when the
//! guard is dropped, whether resolution succeeded or not.

use crate::error::ContainerResult;
use crate::instance::Instance;
use crate::registry::DependencyRegistry;
use crate::tags::SpecialKind;
use std::sync::Arc;
use tracing::debug;

/// Special markers for one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    markers: Vec<(SpecialKind, Instance)>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `instance` as the marker of `kind`, replacing an earlier one.
    pub fn with_marker(mut self, kind: SpecialKind, instance: Instance) -> Self {
        self.markers.retain(|(k, _)| *k != kind);
        self.markers.push((kind, instance));
        self
    }

    pub fn marker(&self, kind: SpecialKind) -> Option<&Instance> {
        self.markers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, instance)| instance)
    }

    /// Markers that can stand in for `name`.
    pub fn assignable_to<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Instance> {
        self.markers
            .iter()
            .map(|(_, instance)| instance)
            .filter(move |instance| instance.is_assignable_to(name))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Registry access with a session's markers visible.
///
/// Created by [`DependencyRegistry::open_session`]. Dropping the guard closes
/// the session.
pub struct Session<'r> {
    registry: &'r mut DependencyRegistry,
    context: SessionContext,
}

impl<'r> Session<'r> {
    pub(crate) fn new(registry: &'r mut DependencyRegistry, context: SessionContext) -> Self {
        debug!("Opening session with {} marker(s)", context.len());
        Self { registry, context }
    }

    /// Exactly one instance for `name`; session markers win over the registry.
    pub fn find_single(&self, name: &str) -> ContainerResult<Instance> {
        self.registry.lookup_single(Some(&self.context), name)
    }

    /// Every instance for `name`, session markers first.
    pub fn find_all(&self, name: &str) -> Vec<Instance> {
        self.registry.lookup_all(Some(&self.context), name)
    }

    /// [`find_single`](Self::find_single) viewed as `Arc<T>`.
    pub fn find_single_as<T>(&self, name: &str) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.find_single(name)?.require::<T>(name)
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn registry(&self) -> &DependencyRegistry {
        &*self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DependencyRegistry {
        &mut *self.registry
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        debug!("Closing session, discarding {} marker(s)", self.context.len());
    }
}
