//! Choosing and opening the record store named on the command line.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::repository::{RecordStore, StoreError};

/// Where taxpayer records live, and optionally which backend reads them.
///
/// With no explicit backend the store file's extension decides:
///
/// | extension                    | backend  |
/// |------------------------------|----------|
/// | `.csv`                       | `csv`    |
/// | `.db`, `.sqlite`, `.sqlite3` | `sqlite` |
///
/// Locations without a file, such as SQLite's `:memory:` or the `memory`
/// backend, need the backend named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: Option<String>,
    /// File path, or a backend-specific location such as `:memory:`.
    pub location: String,
}

impl StoreConfig {
    /// A store whose backend is inferred from `location`.
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            backend: None,
            location: location.into(),
        }
    }

    /// A store read by the named backend regardless of file extension.
    pub fn new(
        backend: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            backend: Some(backend.into()),
            location: location.into(),
        }
    }

    fn extension(&self) -> Option<&str> {
        Path::new(self.location.trim())
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::at("tax_records.csv")
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.backend {
            Some(backend) => write!(f, "{backend} store '{}'", self.location),
            None => write!(f, "store '{}'", self.location),
        }
    }
}

/// Opens one kind of record store. Each backend crate exports a unit struct
/// implementing this, registered with a [`StoreRegistry`] at startup.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Lowercase name accepted by `--backend`.
    fn backend_name(&self) -> &'static str;

    /// Extensions, without the dot, of store files this backend reads.
    fn file_extensions(&self) -> &'static [&'static str] {
        &[]
    }

    /// Open (or create) the store at `location`.
    async fn open(
        &self,
        location: &str,
    ) -> Result<Box<dyn RecordStore>, StoreError>;
}

/// The backends the binary ships with, in registration order.
#[derive(Default)]
pub struct StoreRegistry {
    factories: Vec<Box<dyn StoreFactory>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend. A later factory with the same name replaces the
    /// earlier one.
    pub fn register(
        &mut self,
        factory: Box<dyn StoreFactory>,
    ) {
        self.factories
            .retain(|f| f.backend_name() != factory.backend_name());
        self.factories.push(factory);
    }

    /// Names of every registered backend, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.iter().map(|f| f.backend_name()).collect();
        names.sort_unstable();
        names
    }

    /// Pick the factory for `config`: the named backend if there is one,
    /// otherwise the backend claiming the location's extension.
    ///
    /// # Errors
    /// [`StoreError::Configuration`] naming the store location when the
    /// backend is unknown or cannot be told from the extension.
    pub fn resolve(
        &self,
        config: &StoreConfig,
    ) -> Result<&dyn StoreFactory, StoreError> {
        let found = match &config.backend {
            Some(name) => {
                let name = name.trim();
                self.factories
                    .iter()
                    .find(|f| f.backend_name().eq_ignore_ascii_case(name))
            }
            None => config.extension().and_then(|ext| {
                self.factories.iter().find(|f| {
                    f.file_extensions()
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(ext))
                })
            }),
        };

        found.map(|f| &**f).ok_or_else(|| {
            let available = self.available_backends().join(", ");
            StoreError::Configuration(match &config.backend {
                Some(name) => format!(
                    "unknown backend '{name}' for store '{}'; available: {available}",
                    config.location
                ),
                None => format!(
                    "cannot tell the backend of store '{}' from its extension; \
                     name one of: {available}",
                    config.location
                ),
            })
        })
    }

    /// Resolve the backend for `config` and open the store.
    pub async fn open(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn RecordStore>, StoreError> {
        let factory = self.resolve(config)?;
        debug!(
            backend = factory.backend_name(),
            location = %config.location,
            "opening record store"
        );
        factory.open(config.location.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::{RecordStore, StoreConfig, StoreError, StoreFactory, StoreRegistry};
    use crate::store::MemoryStore;

    /// Records every location it is asked to open.
    struct RecordingFactory {
        name: &'static str,
        extensions: &'static [&'static str],
        opened: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl StoreFactory for RecordingFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        fn file_extensions(&self) -> &'static [&'static str] {
            self.extensions
        }

        async fn open(
            &self,
            location: &str,
        ) -> Result<Box<dyn RecordStore>, StoreError> {
            self.opened.lock().unwrap().push(location.to_string());
            Ok(Box::new(MemoryStore::new()))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl StoreFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        async fn open(
            &self,
            _location: &str,
        ) -> Result<Box<dyn RecordStore>, StoreError> {
            Err(StoreError::Connection("intentional failure".to_string()))
        }
    }

    type Opened = Arc<Mutex<Vec<String>>>;

    /// csv, sqlite and memory lookalikes plus the locations each opened.
    fn registry() -> (StoreRegistry, Opened, Opened) {
        let csv_opened = Opened::default();
        let sqlite_opened = Opened::default();
        let mut reg = StoreRegistry::new();
        reg.register(Box::new(RecordingFactory {
            name: "sqlite",
            extensions: &["db", "sqlite"],
            opened: sqlite_opened.clone(),
        }));
        reg.register(Box::new(RecordingFactory {
            name: "csv",
            extensions: &["csv"],
            opened: csv_opened.clone(),
        }));
        reg.register(Box::new(RecordingFactory {
            name: "memory",
            extensions: &[],
            opened: Opened::default(),
        }));
        (reg, csv_opened, sqlite_opened)
    }

    fn configuration_message(result: Result<&dyn StoreFactory, StoreError>) -> String {
        match result {
            Err(StoreError::Configuration(msg)) => msg,
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(f) => panic!("expected Configuration error, got {}", f.backend_name()),
        }
    }

    // =========================================================================
    // StoreConfig tests
    // =========================================================================

    #[test]
    fn default_config_is_inferred_csv_file() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.backend, None);
        assert_eq!(cfg.location, "tax_records.csv");
    }

    #[test]
    fn display_names_backend_and_location() {
        assert_eq!(StoreConfig::new("sqlite", ":memory:").to_string(), "sqlite store ':memory:'");
        assert_eq!(StoreConfig::at("records.csv").to_string(), "store 'records.csv'");
    }

    // =========================================================================
    // registration tests
    // =========================================================================

    #[test]
    fn available_backends_is_sorted() {
        let (reg, _, _) = registry();
        assert_eq!(reg.available_backends(), vec!["csv", "memory", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let (mut reg, _, _) = registry();
        reg.register(Box::new(FailingFactory));
        reg.register(Box::new(RecordingFactory {
            name: "csv",
            extensions: &["txt"],
            opened: Opened::default(),
        }));

        assert_eq!(reg.available_backends(), vec!["csv", "failing", "memory", "sqlite"]);
        let picked = reg.resolve(&StoreConfig::at("records.txt")).unwrap();
        assert_eq!(picked.backend_name(), "csv");
    }

    // =========================================================================
    // resolve tests
    // =========================================================================

    #[test]
    fn extension_picks_backend() {
        let (reg, _, _) = registry();

        let csv = reg.resolve(&StoreConfig::at("records.csv")).unwrap();
        let sqlite = reg.resolve(&StoreConfig::at("data/records.DB")).unwrap();

        assert_eq!(csv.backend_name(), "csv");
        assert_eq!(sqlite.backend_name(), "sqlite");
    }

    #[test]
    fn named_backend_wins_over_extension() {
        let (reg, _, _) = registry();

        let picked = reg
            .resolve(&StoreConfig::new(" SQLite ", "records.csv"))
            .unwrap();

        assert_eq!(picked.backend_name(), "sqlite");
    }

    #[test]
    fn unknown_backend_error_names_store_and_backends() {
        let (reg, _, _) = registry();

        let msg = configuration_message(reg.resolve(&StoreConfig::new("postgres", "tax.csv")));

        assert_eq!(
            msg,
            "unknown backend 'postgres' for store 'tax.csv'; available: csv, memory, sqlite"
        );
    }

    #[test]
    fn unrecognised_extension_error_names_the_file() {
        let (reg, _, _) = registry();

        let msg = configuration_message(reg.resolve(&StoreConfig::at("records.json")));

        assert!(msg.contains("'records.json'"), "error should name the file: {msg}");
        assert!(msg.contains("csv, memory, sqlite"), "error should list backends: {msg}");
    }

    #[test]
    fn memory_location_needs_a_named_backend() {
        let (reg, _, _) = registry();

        let msg = configuration_message(reg.resolve(&StoreConfig::at(":memory:")));

        assert!(msg.contains("':memory:'"));
    }

    // =========================================================================
    // open tests
    // =========================================================================

    #[tokio::test]
    async fn open_hands_trimmed_location_to_chosen_factory_only() {
        let (reg, csv_opened, sqlite_opened) = registry();

        let result = reg.open(&StoreConfig::at(" records.csv ")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert_eq!(*csv_opened.lock().unwrap(), vec!["records.csv".to_string()]);
        assert!(sqlite_opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_propagates_factory_error() {
        let mut reg = StoreRegistry::new();
        reg.register(Box::new(FailingFactory));

        let err = reg.open(&StoreConfig::new("failing", "x")).await.err();

        assert_eq!(
            err,
            Some(StoreError::Connection("intentional failure".to_string()))
        );
    }
}
