use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{ContractRegistry, ExportedTypes, TypeCatalog, TypeSource};
use crate::container::{IocContainer, ServiceScope};
use crate::errors::CoreError;
use crate::registrar::bulk::{self, Mode};

/// Environment variable overriding `default_lifetime`
pub const DEFAULT_LIFETIME_ENV: &str = "SERVICE_SCAN_DEFAULT_LIFETIME";

/// How the types of an entry are registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationMode {
    /// All implementations under the contract
    #[default]
    UnderContract,
    /// Each implementation under its own type, forwarded to the contract
    Separately,
}

/// One bulk registration: a named contract, where to scan, and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    /// Contract name, looked up in a [`ContractRegistry`]
    pub contract: String,
    /// Module path to scan; every exported type when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Lifetime name; the configuration default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<String>,
    #[serde(default)]
    pub mode: RegistrationMode,
}

impl ScanEntry {
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            module: None,
            lifetime: None,
            mode: RegistrationMode::default(),
        }
    }

    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_lifetime(mut self, lifetime: impl Into<String>) -> Self {
        self.lifetime = Some(lifetime.into());
        self
    }

    pub fn separately(mut self) -> Self {
        self.mode = RegistrationMode::Separately;
        self
    }
}

/// Declarative bulk registration, loaded from YAML or JSON.
///
/// ```yaml
/// default_lifetime: singleton
/// registrations:
///   - contract: Service
///     module: my_app::services
///     lifetime: scoped
///     mode: under_contract
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "default_lifetime")]
    pub default_lifetime: String,
    #[serde(default)]
    pub registrations: Vec<ScanEntry>,
}

fn default_lifetime() -> String {
    ServiceScope::default().to_string()
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            default_lifetime: default_lifetime(),
            registrations: Vec::new(),
        }
    }
}

impl RegistrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: ScanEntry) -> Self {
        self.registrations.push(entry);
        self
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, CoreError> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents)?,
            Some("json") => Self::from_json_str(&contents)?,
            _ => {
                return Err(CoreError::configuration(format!(
                    "unsupported configuration file format: {}",
                    path.display()
                )))
            }
        };

        tracing::debug!(
            path = %path.display(),
            entries = config.registrations.len(),
            "registration configuration loaded"
        );
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(mut self) -> Result<Self, CoreError> {
        if let Ok(lifetime) = env::var(DEFAULT_LIFETIME_ENV) {
            lifetime.parse::<ServiceScope>()?;
            self.default_lifetime = lifetime;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.default_lifetime.parse::<ServiceScope>()?;

        for (position, entry) in self.registrations.iter().enumerate() {
            if entry.contract.trim().is_empty() {
                return Err(CoreError::configuration(format!(
                    "registration #{} has an empty contract name",
                    position + 1
                )));
            }
            if entry.module.as_deref().is_some_and(|m| m.trim().is_empty()) {
                return Err(CoreError::configuration(format!(
                    "registration #{} ({}) has an empty module path",
                    position + 1,
                    entry.contract
                )));
            }
            self.lifetime_for(entry).parse::<ServiceScope>()?;
        }
        Ok(())
    }

    /// Lifetime name an entry registers with
    pub fn lifetime_for<'a>(&'a self, entry: &'a ScanEntry) -> &'a str {
        entry.lifetime.as_deref().unwrap_or(&self.default_lifetime)
    }

    /// Register every entry into `container`.
    ///
    /// All entries are scanned before anything is registered, so a failing
    /// entry leaves the container untouched.
    pub fn apply<'c>(
        &self,
        container: &'c mut IocContainer,
        contracts: &ContractRegistry,
    ) -> Result<&'c mut IocContainer, CoreError> {
        self.validate()?;

        let mut planned = Vec::with_capacity(self.registrations.len());
        for entry in &self.registrations {
            let contract = contracts.get(&entry.contract).ok_or_else(|| {
                CoreError::invalid_argument(
                    "contract",
                    format!("unknown contract `{}`", entry.contract),
                )
            })?;
            let source = match &entry.module {
                Some(module) => ExportedTypes::under(module)
                    .map(Scanned::Module)
                    .ok_or_else(|| {
                        CoreError::invalid_argument(
                            "source",
                            format!("module `{}` exports no types", module),
                        )
                    })?,
                None => Scanned::All(ExportedTypes::global()),
            };
            planned.push((entry, contract, source));
        }

        let mut descriptors = Vec::new();
        for (entry, contract, source) in &planned {
            let source = source.as_source();
            let lifetime = self.lifetime_for(entry).parse::<ServiceScope>()?;
            let plan = bulk::plan(contract, source, lifetime, entry.mode.into())?;

            tracing::debug!(
                contract = %contract,
                source = source.name(),
                lifetime = %lifetime,
                registered = plan.candidates,
                "configuration entry planned"
            );
            descriptors.extend(plan.descriptors);
        }

        let registrations = descriptors.len();
        container.add_descriptors(descriptors)?;

        tracing::info!(
            entries = planned.len(),
            registrations,
            "registration configuration applied"
        );
        Ok(container)
    }
}

enum Scanned {
    All(&'static TypeCatalog),
    Module(TypeCatalog),
}

impl Scanned {
    fn as_source(&self) -> &dyn TypeSource {
        match self {
            Scanned::All(catalog) => *catalog,
            Scanned::Module(catalog) => catalog,
        }
    }
}

impl From<RegistrationMode> for Mode {
    fn from(mode: RegistrationMode) -> Self {
        match mode {
            RegistrationMode::UnderContract => Mode::UnderContract,
            RegistrationMode::Separately => Mode::Separately,
        }
    }
}
