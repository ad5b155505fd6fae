//! # module-hello
//!
//! The hello demo module. Its boot class greets the running application
//! through the base module's greeter.

use cmod_container::contract::{BOOT_MODULE, CORE_INFO, LOCALE_SERVICE};
use cmod_container::{BootModule, CodeBundle, CoreInfo, LocaleLookup, TypeDef};
use cmod_runtime::{ArchiveBuilder, ModuleName, ModuleSource, RuntimeResult};
use module_base::{Greeter, GREETER};
use std::sync::Arc;
use tracing::info;

/// Manifest shipped in the module archive.
pub const MANIFEST: &str = include_str!("../cmod.yml");

/// Locale messages shipped in the module archive.
pub const MESSAGES: &str = include_str!("../resources/hello.yml");

/// Implementation name of [`HelloApp`], also the module's boot class.
pub const HELLO_APP: &str = "hello::HelloApp";

/// Boot class of the hello module.
pub struct HelloApp {
    greeter: Arc<dyn Greeter>,
    info: Arc<dyn CoreInfo>,
    locale: Arc<dyn LocaleLookup>,
}

impl HelloApp {
    pub fn new(
        greeter: Arc<dyn Greeter>,
        info: Arc<dyn CoreInfo>,
        locale: Arc<dyn LocaleLookup>,
    ) -> Self {
        Self {
            greeter,
            info,
            locale,
        }
    }

    /// The greeting printed on boot.
    pub fn greeting(&self) -> String {
        self.greeter.greet(self.info.application_name())
    }
}

impl BootModule for HelloApp {
    fn boot(&self) -> anyhow::Result<()> {
        let module_dir = self.info.module_dir().display().to_string();
        info!(
            "{}",
            self.locale
                .format("started", &[self.info.application_name(), module_dir.as_str()])
        );
        println!("{}", self.greeting());
        Ok(())
    }
}

/// Code linked for this module.
pub fn bundle() -> CodeBundle {
    CodeBundle::new("hello").with_type(
        TypeDef::of::<HelloApp>(HELLO_APP)
            .implements::<dyn BootModule>(BOOT_MODULE, |app| app)
            .constructor(&[GREETER, CORE_INFO, LOCALE_SERVICE], |args| {
                Ok(HelloApp::new(
                    args.next::<dyn Greeter>()?,
                    args.next::<dyn CoreInfo>()?,
                    args.next::<dyn LocaleLookup>()?,
                ))
            })
            .build(),
    )
}

/// In-memory module source, bypassing archive discovery.
pub fn source() -> RuntimeResult<ModuleSource> {
    ModuleSource::manifest_with_messages("hello", MANIFEST, MESSAGES)
}

/// Archive contents of this module.
pub fn archive() -> RuntimeResult<ArchiveBuilder> {
    Ok(ArchiveBuilder::new(MANIFEST).messages(&ModuleName::parse("hello")?, MESSAGES))
}
