//! Explicit type metadata.
//!
//! A [`TypeDef`] tells the container everything it would otherwise learn by
//! inspecting a type at runtime: its implementation name, the capabilities
//! it can be viewed as, its dependency tags and its constructors. Each
//! constructor lists the names it needs, in order, and a factory that turns
//! resolved [`Arguments`] into a value.
//!
//! ```ignore
//! let def = TypeDef::of::<LocaleGreeter>("base::Greeter")
//!     .implements::<dyn Greeter>("base::IGreeter", |g| g)
//!     .constructor(&["core::ILocaleService"], |args| {
//!         Ok(LocaleGreeter::new(args.next::<dyn LocaleLookup>()?))
//!     })
//!     .build();
//! ```

use crate::error::{ContainerError, ContainerResult};
use crate::instance::{Arguments, Instance};
use crate::tags::{Tag, TagSet};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type Factory = Arc<dyn Fn(&mut Arguments) -> anyhow::Result<Instance> + Send + Sync>;
type TypedFactory<C> = Arc<dyn Fn(&mut Arguments) -> anyhow::Result<C> + Send + Sync>;
type ViewFn<C> = Arc<dyn Fn(&Arc<C>) -> Arc<dyn Any + Send + Sync> + Send + Sync>;
type Wrap = Arc<dyn Fn(Arc<dyn Any + Send + Sync>) -> Option<Instance> + Send + Sync>;

/// A constructor: parameter names and the factory they are passed to.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<String>,
    factory: Factory,
}

impl Constructor {
    /// Parameter names in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Run the factory with one resolved instance per parameter.
    pub fn invoke(&self, type_name: &str, values: Vec<Instance>) -> anyhow::Result<Instance> {
        let pairs = self.params.iter().cloned().zip(values).collect();
        let mut args = Arguments::new(type_name, pairs);
        (self.factory)(&mut args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Metadata of one implementation type.
#[derive(Clone)]
pub struct TypeDef {
    name: String,
    capabilities: Vec<String>,
    tags: TagSet,
    constructors: Vec<Constructor>,
    implicit: Option<Constructor>,
    wrap: Wrap,
}

impl TypeDef {
    /// Start describing the concrete type `C` under `name`.
    pub fn of<C>(name: impl Into<String>) -> TypeDefBuilder<C>
    where
        C: Send + Sync + 'static,
    {
        TypeDefBuilder {
            name: name.into(),
            views: Vec::new(),
            tags: TagSet::new(),
            constructors: Vec::new(),
            implicit: None,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capability names this type can be viewed as.
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn implements(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Explicitly declared constructors.
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// The constructor the engine would use.
    ///
    /// Fails with [`ContainerError::InvalidConstructorShape`] when the type is
    /// tagged [`Tag::NoDependency`], declares more than one constructor, or
    /// declares none and has no implicit one.
    pub fn constructor(&self) -> ContainerResult<&Constructor> {
        let shape_error = |reason: &str| ContainerError::InvalidConstructorShape {
            type_name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.tags.is_no_dependency() {
            return Err(shape_error("type is only ever provided explicitly"));
        }

        match self.constructors.as_slice() {
            [] => self
                .implicit
                .as_ref()
                .ok_or_else(|| shape_error("no constructor and no default")),
            [single] => Ok(single),
            many => Err(shape_error(&format!(
                "{} public constructors, at most one allowed",
                many.len()
            ))),
        }
    }

    /// Wrap an explicitly created value with this type's views.
    pub fn instance<C>(&self, value: C) -> ContainerResult<Instance>
    where
        C: Send + Sync + 'static,
    {
        let value: Arc<dyn Any + Send + Sync> = Arc::new(value);
        (self.wrap)(value).ok_or_else(|| ContainerError::TypeMismatch {
            type_name: self.name.clone(),
            expected: std::any::type_name::<C>(),
        })
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("tags", &self.tags)
            .field("constructors", &self.constructors)
            .field("implicit", &self.implicit.is_some())
            .finish()
    }
}

/// Builder for a [`TypeDef`] of the concrete type `C`.
pub struct TypeDefBuilder<C> {
    name: String,
    views: Vec<(String, ViewFn<C>)>,
    tags: TagSet,
    constructors: Vec<(Vec<String>, TypedFactory<C>)>,
    implicit: Option<Arc<dyn Fn() -> C + Send + Sync>>,
    _marker: PhantomData<fn() -> C>,
}

impl<C> TypeDefBuilder<C>
where
    C: Send + Sync + 'static,
{
    /// Expose the type as `capability`, viewed through `upcast`.
    pub fn implements<I>(
        mut self,
        capability: impl Into<String>,
        upcast: fn(Arc<C>) -> Arc<I>,
    ) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let view: ViewFn<C> = Arc::new(move |value: &Arc<C>| {
            let view: Arc<dyn Any + Send + Sync> = Arc::new(upcast(Arc::clone(value)));
            view
        });
        self.views.push((capability.into(), view));
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.add(tag);
        self
    }

    /// Declare a public constructor taking `params` in order.
    pub fn constructor<F>(mut self, params: &[&str], factory: F) -> Self
    where
        F: Fn(&mut Arguments) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        let params = params.iter().map(|p| p.to_string()).collect();
        let factory: TypedFactory<C> = Arc::new(factory);
        self.constructors.push((params, factory));
        self
    }

    pub fn build(self) -> TypeDef {
        let name = self.name;
        let views = Arc::new(self.views);
        let capabilities = views.iter().map(|(cap, _)| cap.clone()).collect();

        let make = {
            let name = name.clone();
            let views = Arc::clone(&views);
            Arc::new(move |value: Arc<C>| make_instance(&name, value, &views))
        };

        let constructors = self
            .constructors
            .into_iter()
            .map(|(params, factory)| {
                let make = Arc::clone(&make);
                let factory: Factory = Arc::new(move |args: &mut Arguments| {
                    let value = factory(args)?;
                    Ok(make(Arc::new(value)))
                });
                Constructor { params, factory }
            })
            .collect();

        let implicit = self.implicit.map(|default| {
            let make = Arc::clone(&make);
            let factory: Factory =
                Arc::new(move |_: &mut Arguments| Ok(make(Arc::new(default()))));
            Constructor {
                params: Vec::new(),
                factory,
            }
        });

        let wrap: Wrap = Arc::new(move |value: Arc<dyn Any + Send + Sync>| {
            value.downcast::<C>().ok().map(|value| make(value))
        });

        TypeDef {
            name,
            capabilities,
            tags: self.tags,
            constructors,
            implicit,
            wrap,
        }
    }
}

impl<C> TypeDefBuilder<C>
where
    C: Default + Send + Sync + 'static,
{
    /// Allow construction through `C::default()` when no constructor is declared.
    pub fn default_constructor(mut self) -> Self {
        let default: Arc<dyn Fn() -> C + Send + Sync> = Arc::new(C::default);
        self.implicit = Some(default);
        self
    }
}

fn make_instance<C>(name: &str, value: Arc<C>, views: &[(String, ViewFn<C>)]) -> Instance
where
    C: Send + Sync + 'static,
{
    views
        .iter()
        .fold(Instance::new(name, Arc::clone(&value)), |instance, (cap, view)| {
            instance.with_erased_view(cap.clone(), view(&value))
        })
}
