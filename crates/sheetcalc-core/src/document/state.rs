use sheetcalc_engine::engine::{CellName, DependencyGraph};
use std::fmt;
use std::sync::Arc;

use super::store::CellStore;

/// Version tag used when the caller does not pick one.
pub const DEFAULT_VERSION: &str = "default";

type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type Normalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How a document turns user-supplied names into cell names.
///
/// Every name (edited cells and formula references alike) is normalized
/// first; the result must then be letters-followed-by-digits and satisfy the
/// validator.
#[derive(Clone)]
pub struct NamePolicy {
    validator: Validator,
    normalizer: Normalizer,
}

impl NamePolicy {
    /// Accept every syntactic cell name, unchanged.
    pub fn new() -> Self {
        NamePolicy {
            validator: Arc::new(|_: &str| true),
            normalizer: Arc::new(|s: &str| s.to_string()),
        }
    }

    /// Upper-case names before use.
    pub fn uppercase() -> Self {
        Self::new().with_normalizer(|s| s.to_uppercase())
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.normalizer = Arc::new(normalizer);
        self
    }

    pub fn normalize(&self, raw: &str) -> String {
        (self.normalizer)(raw)
    }

    pub fn is_valid(&self, normalized: &str) -> bool {
        (self.validator)(normalized)
    }

    /// Normalize and validate `raw`.
    pub fn resolve(&self, raw: &str) -> Option<CellName> {
        CellName::parse(raw, |s| self.normalize(s), |s| self.is_valid(s)).ok()
    }
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NamePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamePolicy").finish_non_exhaustive()
    }
}

/// A spreadsheet document: cells, the dependency graph between them, and the
/// rules for naming cells.
///
/// Edits go through [`Spreadsheet::edit_cell`], which keeps the store and the
/// graph consistent and rejects changes that would create a circular
/// reference. Values are computed lazily on read.
#[derive(Debug)]
pub struct Spreadsheet {
    pub(crate) store: CellStore,
    pub(crate) graph: DependencyGraph,
    pub(crate) policy: NamePolicy,
    pub(crate) version: String,
    /// Whether the document changed since it was created, loaded or saved
    pub(crate) changed: bool,
}

impl Spreadsheet {
    /// Empty spreadsheet accepting every cell name unchanged, with the
    /// default version tag.
    pub fn new() -> Self {
        Self::with_policy(NamePolicy::new(), DEFAULT_VERSION)
    }

    pub fn with_policy(policy: NamePolicy, version: impl Into<String>) -> Self {
        Spreadsheet {
            store: CellStore::new(),
            graph: DependencyGraph::new(),
            policy,
            version: version.into(),
            changed: false,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn policy(&self) -> &NamePolicy {
        &self.policy
    }

    /// True if the document was modified since it was created, loaded or
    /// last saved.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::new()
    }
}
