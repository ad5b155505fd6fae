//! # module-base
//!
//! The base demo module.
//!
//! It contributes a single capability, `base::IGreeter`, implemented by a
//! greeter that reads its phrases from the module's locale messages. Other
//! modules depend on `base` and receive the greeter through their
//! constructors.

use cmod_container::contract::LOCALE_SERVICE;
use cmod_container::{CapabilityDef, CodeBundle, LocaleLookup, TypeDef};
use cmod_runtime::{ArchiveBuilder, ModuleName, ModuleSource, RuntimeResult};
use std::sync::Arc;

/// Manifest shipped in the module archive.
pub const MANIFEST: &str = include_str!("../cmod.yml");

/// Locale messages shipped in the module archive.
pub const MESSAGES: &str = include_str!("../resources/base.yml");

/// Capability name of [`Greeter`].
pub const GREETER: &str = "base::IGreeter";

/// Implementation name of [`LocaleGreeter`].
pub const LOCALE_GREETER: &str = "base::Greeter";

/// Greets people.
pub trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
    fn farewell(&self, name: &str) -> String;
}

/// A [`Greeter`] whose phrases come from the module's messages.
pub struct LocaleGreeter {
    locale: Arc<dyn LocaleLookup>,
}

impl LocaleGreeter {
    pub fn new(locale: Arc<dyn LocaleLookup>) -> Self {
        Self { locale }
    }
}

impl Greeter for LocaleGreeter {
    fn greet(&self, name: &str) -> String {
        self.locale.format("greeting", &[name])
    }

    fn farewell(&self, name: &str) -> String {
        self.locale.format("farewell", &[name])
    }
}

/// Code linked for this module.
pub fn bundle() -> CodeBundle {
    CodeBundle::new("base")
        .with_capability(CapabilityDef::new(GREETER))
        .with_type(
            TypeDef::of::<LocaleGreeter>(LOCALE_GREETER)
                .implements::<dyn Greeter>(GREETER, |g| g)
                .constructor(&[LOCALE_SERVICE], |args| {
                    Ok(LocaleGreeter::new(args.next::<dyn LocaleLookup>()?))
                })
                .build(),
        )
}

/// In-memory module source, bypassing archive discovery.
pub fn source() -> RuntimeResult<ModuleSource> {
    ModuleSource::manifest_with_messages("base", MANIFEST, MESSAGES)
}

/// Archive contents of this module.
pub fn archive() -> RuntimeResult<ArchiveBuilder> {
    Ok(ArchiveBuilder::new(MANIFEST).messages(&ModuleName::parse("base")?, MESSAGES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmod_container::Instance;
    use cmod_runtime::{parse_messages, ModuleDescriptor};
    use std::collections::HashMap;

    struct Table(HashMap<String, String>);

    impl LocaleLookup for Table {
        fn get(&self, key: &str) -> String {
            self.0.get(key).cloned().unwrap_or_else(|| key.to_string())
        }
    }

    fn locale_instance() -> Instance {
        let locale: Arc<dyn LocaleLookup> = Arc::new(Table(parse_messages(MESSAGES).unwrap()));
        Instance::new("test::Locale", Arc::clone(&locale)).with_view(LOCALE_SERVICE, locale)
    }

    #[test]
    fn test_manifest_matches_bundle() {
        let descriptor = ModuleDescriptor::from_yaml(MANIFEST).unwrap();
        assert_eq!(descriptor.name(), &"base");
        assert!(descriptor.boot_class().is_none());

        let bundle = bundle();
        assert_eq!(bundle.id(), descriptor.name().as_str());
        for declared in descriptor.types() {
            let def = bundle
                .types()
                .iter()
                .find(|def| def.name() == declared.type_name)
                .unwrap();
            if let Some(capability) = &declared.capability {
                assert!(def.implements(capability));
            }
        }
    }

    #[test]
    fn test_greeter_uses_messages() {
        let bundle = bundle();
        let ctor = bundle.types()[0].constructor().unwrap();
        assert_eq!(ctor.params(), [LOCALE_SERVICE]);

        let instance = ctor
            .invoke(LOCALE_GREETER, vec![locale_instance()])
            .unwrap();
        let greeter = instance.get::<dyn Greeter>(GREETER).unwrap();
        assert_eq!(greeter.greet("Ada"), "Hello, Ada!");
        assert_eq!(greeter.farewell("Ada"), "Goodbye, Ada.");
    }

    #[test]
    fn test_source_carries_messages() {
        let source = source().unwrap();
        let descriptor = source.load_descriptor().unwrap();
        let messages = source.load_messages(&descriptor).unwrap();
        assert_eq!(messages.get("greeting").map(String::as_str), Some("Hello, {0}!"));
    }
}
