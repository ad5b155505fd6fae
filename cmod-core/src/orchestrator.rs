//! Module orchestrator.
//!
//! The orchestrator drives the whole boot pipeline:
//!
//! 1. discover module sources
//! 2. load and validate every descriptor
//! 3. check the inter-module dependency graph
//! 4. inject the union of all libraries, each once
//! 5. inject each module's code, once
//! 6. resolve all modules in rounds
//! 7. run the entry module's boot class
//!
//! Resolution rounds do not depend on discovery order. A round first checks
//! every pending module against the registry as it stood when the round
//! began, then resolves the modules that passed. A module resolved in round
//! `n` therefore only uses instances from earlier rounds.

use crate::config_service::YAML_CONFIG_SERVICE;
use crate::core_info::{runtime_info_def, RuntimeInfo};
use crate::error::{BootError, BootResult, StuckModule};
use crate::locale::ModuleLocale;
use crate::module::{Module, ModuleState};
use cmod_container::contract::{BOOT_MODULE, CONFIG_SERVICE, MODULE};
use cmod_container::{
    BootModule, CodeBundle, CodeOrigin, ConstructionEngine, DependencyRegistry, Instance, Linker,
    SessionContext, SpecialKind,
};
use cmod_runtime::{discover_modules, ModuleDescriptor, ModuleName, ModuleSource};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Implementation name of the module self-reference marker.
pub const MODULE_REF: &str = "core::ModuleRef";

/// Which modules were resolved in which round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    rounds: Vec<Vec<String>>,
}

impl ResolutionReport {
    /// Module names per round, in resolution order.
    pub fn rounds(&self) -> &[Vec<String>] {
        &self.rounds
    }

    /// 1-based round in which `module` was resolved.
    pub fn round_of(&self, module: &str) -> Option<usize> {
        self.rounds
            .iter()
            .position(|round| round.iter().any(|m| m == module))
            .map(|i| i + 1)
    }

    pub fn resolved_count(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }
}

/// Drives modules from discovery to boot.
pub struct ModuleOrchestrator {
    registry: DependencyRegistry,
    linker: Linker,
    modules: Vec<Module>,
    libraries_dir: Option<PathBuf>,
    injected_libraries: Vec<String>,
    report: ResolutionReport,
}

impl ModuleOrchestrator {
    /// Create an orchestrator with the core code injected, `info` registered
    /// and the config service built from it.
    pub fn new(linker: Linker, info: RuntimeInfo) -> BootResult<Self> {
        let mut registry = DependencyRegistry::new();
        registry.inject(CodeOrigin::Core, &crate::core_info::core_bundle())?;

        let libraries_dir = info.library_dir.clone();
        registry.add_resolved(runtime_info_def().instance(info)?)?;
        registry.with_session(SessionContext::new(), |session| {
            ConstructionEngine::resolve_type(session, YAML_CONFIG_SERVICE, Some(CONFIG_SERVICE))
        })?;

        Ok(Self {
            registry,
            linker,
            modules: Vec::new(),
            libraries_dir,
            injected_libraries: Vec::new(),
            report: ResolutionReport::default(),
        })
    }

    /// Add every module archive found in `dir`.
    pub fn discover(&mut self, dir: &Path) -> BootResult<usize> {
        info!("Discovering modules in {:?}", dir);
        let sources = discover_modules(dir)?;
        let count = sources.len();
        self.modules.extend(sources.into_iter().map(Module::new));
        Ok(count)
    }

    /// Add one module source, bypassing discovery.
    pub fn add_source(&mut self, source: ModuleSource) {
        debug!("Added module source: {}", source);
        self.modules.push(Module::new(source));
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = ModuleSource>) -> Self {
        for source in sources {
            self.add_source(source);
        }
        self
    }

    /// Run the whole pipeline on the added sources and boot `entry`.
    pub fn boot(&mut self, entry: &str) -> BootResult<()> {
        self.load_descriptors()?;
        self.check_graph()?;
        self.inject_libraries()?;
        self.inject_module_code()?;
        self.resolve_all()?;
        self.run_entry(entry)
    }

    /// Load the descriptor of every discovered module.
    pub fn load_descriptors(&mut self) -> BootResult<()> {
        let mut names = HashSet::new();

        for module in &mut self.modules {
            if module.state() == ModuleState::Discovered {
                module.load_descriptor()?;
            }
            if !names.insert(module.name()) {
                return Err(BootError::DuplicateModule(module.name()));
            }
        }

        info!("Loaded {} module descriptor(s)", self.modules.len());
        Ok(())
    }

    /// Every dependency must exist and satisfy its version constraints.
    pub fn check_graph(&self) -> BootResult<()> {
        for module in &self.modules {
            let descriptor = descriptor_of(module)?;

            for dependency in descriptor.dependencies() {
                let target = self
                    .find_descriptor(&dependency.name)
                    .ok_or_else(|| BootError::MissingDependency {
                        module: descriptor.name().to_string(),
                        dependency: dependency.name.to_string(),
                    })?;

                if let Some(constraint) = dependency.unmet_constraint(target.version()) {
                    return Err(BootError::UnmetConstraint {
                        module: descriptor.name().to_string(),
                        dependency: dependency.name.to_string(),
                        constraint: constraint.to_string(),
                        found: target.version().to_string(),
                    });
                }
            }
        }

        debug!("Dependency graph of {} module(s) is consistent", self.modules.len());
        Ok(())
    }

    /// Inject every library declared by any module, each exactly once.
    pub fn inject_libraries(&mut self) -> BootResult<usize> {
        let mut wanted: Vec<(String, String)> = Vec::new();
        for module in &self.modules {
            let descriptor = descriptor_of(module)?;
            for library in descriptor.libraries() {
                if !wanted.iter().any(|(l, _)| l == library) {
                    wanted.push((library.clone(), descriptor.name().to_string()));
                }
            }
        }

        for (library, module) in &wanted {
            if let Some(dir) = &self.libraries_dir {
                let path = dir.join(library);
                if !path.is_file() {
                    return Err(BootError::LibraryNotFound {
                        module: module.clone(),
                        library: library.clone(),
                        path,
                    });
                }
            }

            let bundle = self
                .linker
                .get(library)
                .cloned()
                .unwrap_or_else(|| CodeBundle::new(library.as_str()));
            self.registry
                .inject(CodeOrigin::Library(library.clone()), &bundle)?;
            self.injected_libraries.push(library.clone());
        }

        info!("Injected {} librar(y/ies)", wanted.len());
        Ok(wanted.len())
    }

    /// Inject the code of every module whose descriptor is loaded.
    pub fn inject_module_code(&mut self) -> BootResult<()> {
        let names: Vec<String> = self
            .modules
            .iter()
            .filter(|m| m.state() == ModuleState::DescriptorLoaded)
            .map(Module::name)
            .collect();

        for name in names {
            self.inject_module(&name)?;
        }
        Ok(())
    }

    /// Inject one module's code. A second injection fails.
    pub fn inject_module(&mut self, name: &str) -> BootResult<()> {
        let index = self.index_of(name)?;

        let bundle = match self.linker.get(name) {
            Some(bundle) => bundle.clone(),
            None => {
                debug!("Module {} has no linked code", name);
                CodeBundle::new(name)
            }
        };

        self.registry
            .inject(CodeOrigin::Module(name.to_string()), &bundle)?;
        self.modules[index].mark_injected()
    }

    /// Resolve every injected module, in as many rounds as needed.
    pub fn resolve_all(&mut self) -> BootResult<&ResolutionReport> {
        loop {
            let pending: Vec<usize> = (0..self.modules.len())
                .filter(|&i| self.modules[i].state() == ModuleState::CodeInjected)
                .collect();
            if pending.is_empty() {
                break;
            }

            let round = self.report.rounds.len() + 1;
            debug!("Resolution round {}: {} module(s) pending", round, pending.len());

            let mut ready = Vec::new();
            let mut stuck = Vec::new();
            for &index in &pending {
                let module = &self.modules[index];
                let descriptor = descriptor_of(module)?;
                let context = session_for(module)?;

                let checked = self.registry.with_session(context, |session| {
                    ConstructionEngine::validate(session, descriptor.types())
                });

                match checked {
                    Ok(_) => ready.push(index),
                    Err(e) if e.is_retryable() => stuck.push(StuckModule {
                        module: module.name(),
                        unresolved: e.unresolved().to_vec(),
                    }),
                    Err(source) => {
                        return Err(BootError::ResolutionFailed {
                            module: module.name(),
                            source,
                        })
                    }
                }
            }

            if ready.is_empty() {
                return Err(BootError::Unresolvable(stuck));
            }

            let mut resolved = Vec::with_capacity(ready.len());
            for index in ready {
                let module = &self.modules[index];
                let descriptor = descriptor_of(module)?;
                let context = session_for(module)?;

                self.registry
                    .with_session(context, |session| {
                        ConstructionEngine::resolve(session, descriptor.types())
                    })
                    .map_err(|source| BootError::ResolutionFailed {
                        module: module.name(),
                        source,
                    })?;

                let name = module.name();
                self.modules[index].mark_resolved()?;
                resolved.push(name);
            }

            info!("Round {} resolved: {}", round, resolved.join(", "));
            self.report.rounds.push(resolved);
        }

        Ok(&self.report)
    }

    /// Start the boot class of the resolved module `name`.
    pub fn run_entry(&mut self, name: &str) -> BootResult<()> {
        let index = self.index_of(name)?;
        let module = &self.modules[index];

        match module.state() {
            ModuleState::Resolved => {}
            ModuleState::Booted => {
                return Err(BootError::InvalidState {
                    module: module.name(),
                    actual: ModuleState::Booted,
                    expected: ModuleState::Resolved,
                })
            }
            _ => return Err(BootError::ModuleNotResolved(module.name())),
        }

        let descriptor = descriptor_of(module)?;
        let class = descriptor
            .boot_class()
            .ok_or_else(|| BootError::NoBootClass(module.name()))?;

        let not_bootable = || BootError::NotBootable {
            module: module.name(),
            class: class.to_string(),
        };
        let boot = self
            .registry
            .find_single(class)
            .ok()
            .and_then(|instance| instance.get::<dyn BootModule>(BOOT_MODULE))
            .ok_or_else(not_bootable)?;

        info!("Booting {} via {}", descriptor.display_name(), class);
        boot.boot().map_err(|source| BootError::BootFailed {
            module: module.name(),
            source,
        })?;

        self.modules[index].mark_booted()
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// The module named `name`, once its descriptor is loaded.
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.index_of(name).ok().map(|i| &self.modules[i])
    }

    pub fn registry(&self) -> &DependencyRegistry {
        &self.registry
    }

    pub fn report(&self) -> &ResolutionReport {
        &self.report
    }

    /// Libraries injected so far, in injection order.
    pub fn injected_libraries(&self) -> &[String] {
        &self.injected_libraries
    }

    fn find_descriptor(&self, name: &ModuleName) -> Option<&ModuleDescriptor> {
        self.modules
            .iter()
            .filter_map(Module::descriptor)
            .find(|d| d.name() == name)
    }

    fn index_of(&self, name: &str) -> BootResult<usize> {
        let name = ModuleName::parse(name)?;
        self.modules
            .iter()
            .position(|m| m.descriptor().is_some_and(|d| d.name() == &name))
            .ok_or_else(|| BootError::ModuleNotFound(name.to_string()))
    }
}

fn descriptor_of(module: &Module) -> BootResult<&ModuleDescriptor> {
    module.descriptor().ok_or_else(|| BootError::InvalidState {
        module: module.name(),
        actual: module.state(),
        expected: ModuleState::DescriptorLoaded,
    })
}

/// Session markers for resolving `module`: its descriptor and its locale.
fn session_for(module: &Module) -> BootResult<SessionContext> {
    let descriptor = Arc::new(descriptor_of(module)?.clone());
    let locale = ModuleLocale::new(descriptor.name().clone(), module.messages().clone());

    Ok(SessionContext::new()
        .with_marker(
            SpecialKind::Module,
            Instance::new(MODULE_REF, Arc::clone(&descriptor)).with_view(MODULE, descriptor),
        )
        .with_marker(SpecialKind::Locale, locale.into_marker()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmod_container::ContainerError;

    fn orchestrator(sources: Vec<ModuleSource>) -> ModuleOrchestrator {
        let info = RuntimeInfo::for_module_dir("test", Path::new("/tmp/modules"));
        ModuleOrchestrator::new(Linker::new(), info)
            .unwrap()
            .with_sources(sources)
    }

    fn source(name: &str, version: &str, deps: &[&str]) -> ModuleSource {
        let mut builder = ModuleDescriptor::builder(name, version);
        for dep in deps {
            builder = builder.dependency(dep);
        }
        ModuleSource::prepared(builder.build().unwrap())
    }

    #[test]
    fn test_graph_missing_dependency() {
        let mut orch = orchestrator(vec![source("addon", "1.0.0", &["base"])]);
        orch.load_descriptors().unwrap();

        assert!(matches!(
            orch.check_graph(),
            Err(BootError::MissingDependency { ref dependency, .. }) if dependency == "base"
        ));
    }

    #[test]
    fn test_graph_unmet_constraint() {
        let mut orch = orchestrator(vec![
            source("base", "2.0.0", &[]),
            source("addon", "1.0.0", &["base:>2.0.0"]),
        ]);
        orch.load_descriptors().unwrap();

        match orch.check_graph() {
            Err(BootError::UnmetConstraint {
                constraint, found, ..
            }) => {
                assert_eq!(constraint, ">2.0.0");
                assert_eq!(found, "2.0.0");
            }
            other => panic!("expected UnmetConstraint, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_module_names() {
        let mut orch = orchestrator(vec![
            source("Base", "1.0.0", &[]),
            source("base", "1.1.0", &[]),
        ]);
        assert!(matches!(
            orch.load_descriptors(),
            Err(BootError::DuplicateModule(_))
        ));
    }

    #[test]
    fn test_library_dedup_without_directory() {
        let base = ModuleDescriptor::builder("base", "1.0.0")
            .library("json.jar")
            .build()
            .unwrap();
        let addon = ModuleDescriptor::builder("addon", "1.0.0")
            .library("json.jar")
            .library("xml.jar")
            .build()
            .unwrap();

        let mut orch = orchestrator(vec![
            ModuleSource::prepared(base),
            ModuleSource::prepared(addon),
        ]);
        orch.load_descriptors().unwrap();

        assert_eq!(orch.inject_libraries().unwrap(), 2);
        assert_eq!(orch.injected_libraries(), ["json.jar", "xml.jar"]);
        assert!(matches!(
            orch.inject_libraries(),
            Err(BootError::Container(ContainerError::AlreadyInjected(_)))
        ));
    }

    #[test]
    fn test_run_entry_requires_resolution() {
        let mut orch = orchestrator(vec![source("base", "1.0.0", &[])]);
        orch.load_descriptors().unwrap();

        assert!(matches!(
            orch.run_entry("base"),
            Err(BootError::ModuleNotResolved(_))
        ));
        assert!(matches!(
            orch.run_entry("ghost"),
            Err(BootError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn test_no_boot_class() {
        let mut orch = orchestrator(vec![source("base", "1.0.0", &[])]);
        orch.load_descriptors().unwrap();
        orch.inject_module_code().unwrap();
        let report = orch.resolve_all().unwrap();
        assert_eq!(report.round_of("base"), Some(1));

        assert!(matches!(
            orch.run_entry("base"),
            Err(BootError::NoBootClass(_))
        ));
    }

    #[test]
    fn test_core_info_is_registered() {
        let orch = orchestrator(Vec::new());
        let info = orch
            .registry()
            .find_single_as::<dyn cmod_container::CoreInfo>(cmod_container::contract::CORE_INFO)
            .unwrap();
        assert_eq!(info.application_name(), "test");
    }

    #[test]
    fn test_config_service_is_built_from_core_info() {
        let orch = orchestrator(Vec::new());
        assert_eq!(
            orch.registry().registered_types(),
            [crate::core_info::RUNTIME_INFO, YAML_CONFIG_SERVICE]
        );
        assert!(orch
            .registry()
            .find_single_as::<dyn cmod_container::ConfigLookup>(CONFIG_SERVICE)
            .is_ok());
    }
}
