//! Type-erased instances and constructor arguments.
//!
//! An [`Instance`] is one constructed object seen through a set of named
//! views. The view registered under the implementation name holds the
//! concrete `Arc<C>`; every capability view holds the same object upcast to
//! the capability's trait object (`Arc<dyn I>`). An instance is assignable to
//! a name iff it has a view under that name.

use crate::error::{ContainerError, ContainerResult};
use std::any::{type_name, Any};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

pub(crate) type View = Arc<dyn Any + Send + Sync>;

/// A constructed object and its named views.
#[derive(Clone)]
pub struct Instance {
    type_name: Arc<str>,
    views: Arc<HashMap<String, View>>,
}

impl Instance {
    /// Wrap `value` as an instance of `type_name`.
    pub fn new<T>(type_name: impl Into<String>, value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        let mut views: HashMap<String, View> = HashMap::new();
        views.insert(type_name.clone(), Arc::new(value));

        Self {
            type_name: type_name.into(),
            views: Arc::new(views),
        }
    }

    /// Add a view under `name`.
    pub fn with_view<T>(mut self, name: impl Into<String>, view: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.views).insert(name.into(), Arc::new(view));
        self
    }

    pub(crate) fn with_erased_view(mut self, name: String, view: View) -> Self {
        Arc::make_mut(&mut self.views).insert(name, view);
        self
    }

    /// Implementation name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether this instance can stand in for `name`.
    pub fn is_assignable_to(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    /// The view registered under `name`, if it has type `Arc<T>`.
    pub fn get<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.views.get(name)?.downcast_ref::<Arc<T>>().cloned()
    }

    /// Like [`get`](Self::get), failing with [`ContainerError::TypeMismatch`].
    pub fn require<T>(&self, name: &str) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>(name).ok_or_else(|| ContainerError::TypeMismatch {
            type_name: name.to_string(),
            expected: type_name::<T>(),
        })
    }

    /// Names of all views, unordered.
    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    /// Whether both handles refer to the same constructed object.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.views, &other.views)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut views: Vec<_> = self.view_names().collect();
        views.sort_unstable();
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("views", &views)
            .finish()
    }
}

/// Resolved constructor arguments, consumed in declaration order.
pub struct Arguments {
    type_name: String,
    values: VecDeque<(String, Instance)>,
    position: usize,
}

impl Arguments {
    /// `values` pairs each parameter name with the instance resolved for it.
    pub fn new(type_name: impl Into<String>, values: Vec<(String, Instance)>) -> Self {
        Self {
            type_name: type_name.into(),
            values: values.into(),
            position: 0,
        }
    }

    /// Take the next argument, viewed as the parameter it was resolved for.
    pub fn next<T>(&mut self) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let (param, instance) = self.next_entry()?;
        instance.require::<T>(&param)
    }

    /// Take the next argument without choosing a view.
    pub fn next_instance(&mut self) -> ContainerResult<Instance> {
        self.next_entry().map(|(_, instance)| instance)
    }

    /// Arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    fn next_entry(&mut self) -> ContainerResult<(String, Instance)> {
        let entry = self
            .values
            .pop_front()
            .ok_or_else(|| ContainerError::MissingArgument {
                type_name: self.type_name.clone(),
                position: self.position,
            })?;
        self.position += 1;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Speaker: Send + Sync {
        fn speak(&self) -> String;
    }

    struct Parrot;

    impl Speaker for Parrot {
        fn speak(&self) -> String {
            "hello".to_string()
        }
    }

    fn parrot() -> Instance {
        let value = Arc::new(Parrot);
        let view: Arc<dyn Speaker> = value.clone();
        Instance::new("zoo::Parrot", value).with_view("zoo::ISpeaker", view)
    }

    #[test]
    fn test_views() {
        let instance = parrot();

        assert!(instance.is_assignable_to("zoo::Parrot"));
        assert!(instance.is_assignable_to("zoo::ISpeaker"));
        assert!(!instance.is_assignable_to("zoo::Cat"));

        let speaker = instance.get::<dyn Speaker>("zoo::ISpeaker").unwrap();
        assert_eq!(speaker.speak(), "hello");
        assert!(instance.get::<Parrot>("zoo::Parrot").is_some());
        assert!(instance.get::<Parrot>("zoo::ISpeaker").is_none());
    }

    #[test]
    fn test_require_reports_mismatch() {
        let result = parrot().require::<String>("zoo::Parrot");
        assert!(matches!(result, Err(ContainerError::TypeMismatch { .. })));
    }

    #[test]
    fn test_clones_share_identity() {
        let a = parrot();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&parrot()));
    }

    #[test]
    fn test_arguments_in_order() {
        let mut args = Arguments::new(
            "zoo::Keeper",
            vec![
                ("zoo::ISpeaker".to_string(), parrot()),
                ("zoo::Parrot".to_string(), parrot()),
            ],
        );

        assert_eq!(args.next::<dyn Speaker>().unwrap().speak(), "hello");
        assert_eq!(args.remaining(), 1);
        assert!(args.next::<Parrot>().is_ok());
        assert!(matches!(
            args.next_instance(),
            Err(ContainerError::MissingArgument { position: 2, .. })
        ));
    }
}
