//! Durable storage for cell data, title overrides and the global configuration.
//!
//! Two stores back a grid: a [`CellStore`] for per-cell image/name records and a small
//! [`KeyValueStore`] for locale-scoped preferences. Both have a JSON-file implementation
//! and an in-memory one for tests and ephemeral sessions.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;

use crate::foundation::error::{GridError, GridResult};
use crate::i18n::locales::Locale;
use crate::model::cell::{CellId, GlobalConfig, GridState, PersistedCell};
use crate::model::config::Variant;

/// Per-cell record store.
pub trait CellStore {
    fn save(&mut self, cell: &PersistedCell) -> GridResult<()>;
    /// Every stored record, ordered by id. An empty store yields an empty list.
    fn load_all(&self) -> GridResult<Vec<PersistedCell>>;
}

/// String key/value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> GridResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> GridResult<()>;
    fn remove(&mut self, key: &str) -> GridResult<()>;
}

fn read_json_doc<T: serde::de::DeserializeOwned + Default>(path: &Path) -> GridResult<T> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("read store '{}'", path.display()))
                .into());
        }
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| GridError::persistence(format!("corrupt store '{}': {e}", path.display())))
}

/// Write through a sibling temp file so readers never see a torn document.
fn write_json_doc<T: serde::Serialize>(path: &Path, doc: &T) -> GridResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store dir '{}'", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(doc)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, json).with_context(|| format!("write '{}'", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("replace store '{}'", path.display()))?;
    Ok(())
}

/// All cells in one JSON document, keyed by id.
#[derive(Clone, Debug)]
pub struct JsonCellStore {
    path: PathBuf,
}

impl JsonCellStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> GridResult<BTreeMap<CellId, PersistedCell>> {
        let cells: Vec<PersistedCell> = read_json_doc(&self.path)?;
        Ok(cells.into_iter().map(|c| (c.id, c)).collect())
    }
}

impl CellStore for JsonCellStore {
    fn save(&mut self, cell: &PersistedCell) -> GridResult<()> {
        let mut cells = self.read()?;
        cells.insert(cell.id, cell.clone());
        let doc: Vec<&PersistedCell> = cells.values().collect();
        write_json_doc(&self.path, &doc)?;
        tracing::debug!(id = %cell.id, path = %self.path.display(), "cell saved");
        Ok(())
    }

    fn load_all(&self) -> GridResult<Vec<PersistedCell>> {
        Ok(self.read()?.into_values().collect())
    }
}

/// In-memory cell store. Clones share the same records.
#[derive(Clone, Debug, Default)]
pub struct MemoryCellStore {
    cells: Rc<RefCell<BTreeMap<CellId, PersistedCell>>>,
    fail_saves: bool,
}

impl MemoryCellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `save` always fails; loads still work.
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn get(&self, id: CellId) -> Option<PersistedCell> {
        self.cells.borrow().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.cells.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.borrow().is_empty()
    }
}

impl CellStore for MemoryCellStore {
    fn save(&mut self, cell: &PersistedCell) -> GridResult<()> {
        if self.fail_saves {
            return Err(GridError::persistence("memory store rejects writes"));
        }
        self.cells.borrow_mut().insert(cell.id, cell.clone());
        Ok(())
    }

    fn load_all(&self) -> GridResult<Vec<PersistedCell>> {
        Ok(self.cells.borrow().values().cloned().collect())
    }
}

/// Key/value pairs in one flat JSON object.
#[derive(Clone, Debug)]
pub struct JsonKeyValueStore {
    path: PathBuf,
}

impl JsonKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> GridResult<BTreeMap<String, String>> {
        read_json_doc(&self.path)
    }
}

impl KeyValueStore for JsonKeyValueStore {
    fn get(&self, key: &str) -> GridResult<Option<String>> {
        Ok(self.read()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> GridResult<()> {
        let mut map = self.read()?;
        map.insert(key.to_string(), value.to_string());
        write_json_doc(&self.path, &map)
    }

    fn remove(&mut self, key: &str) -> GridResult<()> {
        let mut map = self.read()?;
        if map.remove(key).is_some() {
            write_json_doc(&self.path, &map)?;
        }
        Ok(())
    }
}

/// In-memory key/value store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyValueStore {
    map: Rc<RefCell<BTreeMap<String, String>>>,
    fail_writes: bool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.map.borrow().keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> GridResult<Option<String>> {
        Ok(self.map.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> GridResult<()> {
        if self.fail_writes {
            return Err(GridError::persistence("memory store rejects writes"));
        }
        self.map
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> GridResult<()> {
        if self.fail_writes {
            return Err(GridError::persistence("memory store rejects writes"));
        }
        self.map.borrow_mut().remove(key);
        Ok(())
    }
}

/// Key names for one product variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: &'static str,
}

impl StorageKeys {
    pub fn for_variant(variant: Variant) -> Self {
        let prefix = match variant {
            Variant::Movie => "movieGrid",
            Variant::Game => "gameGrid",
        };
        Self { prefix }
    }

    /// JSON object mapping cell id (as a string) to an overridden title.
    pub fn titles(&self, locale: Locale) -> String {
        format!("{}Titles_{}", self.prefix, locale.tag())
    }

    pub fn global_config(&self, locale: Locale) -> String {
        format!("{}GlobalConfig_{}", self.prefix, locale.tag())
    }

    /// Un-suffixed key written before global config became per-locale.
    pub fn legacy_global_config(&self) -> String {
        format!("{}GlobalConfig", self.prefix)
    }
}

/// Locale-scoped preferences on top of a [`KeyValueStore`].
pub struct Preferences {
    store: Box<dyn KeyValueStore>,
    keys: StorageKeys,
    locale: Locale,
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("keys", &self.keys)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl Preferences {
    pub fn new(store: Box<dyn KeyValueStore>, variant: Variant, locale: Locale) -> Self {
        Self {
            store,
            keys: StorageKeys::for_variant(variant),
            locale,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Title overrides for the current locale. Entries with non-numeric ids are skipped.
    pub fn title_overrides(&self) -> GridResult<BTreeMap<CellId, String>> {
        let Some(raw) = self.store.get(&self.keys.titles(self.locale))? else {
            return Ok(BTreeMap::new());
        };
        let map: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        Ok(map
            .into_iter()
            .filter_map(|(k, v)| match k.parse::<u32>() {
                Ok(id) => Some((CellId(id), v)),
                Err(_) => {
                    tracing::warn!(key = %k, "skipping title override with non-numeric id");
                    None
                }
            })
            .collect())
    }

    pub fn set_title_override(&mut self, id: CellId, title: &str) -> GridResult<()> {
        let mut map: BTreeMap<String, String> =
            match self.store.get(&self.keys.titles(self.locale))? {
                Some(raw) => serde_json::from_str(&raw)?,
                None => BTreeMap::new(),
            };
        map.insert(id.to_string(), title.to_string());
        let json = serde_json::to_string(&map)?;
        self.store.set(&self.keys.titles(self.locale), &json)
    }

    /// Global config for the current locale.
    ///
    /// When only the legacy key exists its value is moved to the locale key first.
    pub fn global_config(&mut self) -> GridResult<Option<GlobalConfig>> {
        let key = self.keys.global_config(self.locale);
        let raw = match self.store.get(&key)? {
            Some(raw) => raw,
            None => {
                let legacy = self.keys.legacy_global_config();
                let Some(raw) = self.store.get(&legacy)? else {
                    return Ok(None);
                };
                self.store.set(&key, &raw)?;
                self.store.remove(&legacy)?;
                tracing::info!(from = %legacy, to = %key, "migrated legacy global config");
                raw
            }
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn set_global_config(&mut self, config: &GlobalConfig) -> GridResult<()> {
        let json = serde_json::to_string(config)?;
        self.store.set(&self.keys.global_config(self.locale), &json)
    }
}

/// Startup grid: locale defaults, then stored cells, then title overrides, then the stored
/// main title. Each failing layer is logged and skipped.
#[tracing::instrument(skip_all, fields(variant = ?variant, locale = %prefs.locale()))]
pub fn restore_grid(variant: Variant, cells: &dyn CellStore, prefs: &mut Preferences) -> GridState {
    let mut state = prefs.locale().bundle().default_grid(variant);

    match cells.load_all() {
        Ok(stored) => state = state.merge_persisted(&stored),
        Err(e) => tracing::warn!(error = %e, "failed to load stored cells"),
    }
    match prefs.title_overrides() {
        Ok(overrides) => {
            state = state.apply_title_overrides(overrides.iter().map(|(id, t)| (*id, t.as_str())))
        }
        Err(e) => tracing::warn!(error = %e, "failed to load title overrides"),
    }
    match prefs.global_config() {
        Ok(Some(global)) => state = state.with_main_title(global.main_title),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "failed to load global config"),
    }
    state
}

#[cfg(test)]
#[path = "../../tests/unit/persist/store.rs"]
mod tests;
