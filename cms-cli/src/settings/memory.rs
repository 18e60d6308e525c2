//! Process-local preferences, used when no data directory is available.

use async_trait::async_trait;
use dashmap::DashMap;

use super::Pref;
use super::PrefStore;
use super::SettingsError;

#[derive(Default)]
pub struct MemoryPrefs {
    values: DashMap<Pref, Vec<u8>>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrefStore for MemoryPrefs {
    async fn load(&self, pref: Pref) -> Result<Option<Vec<u8>>, SettingsError> {
        Ok(self.values.get(&pref).map(|v| v.clone()))
    }

    async fn store(&self, pref: Pref, value: Vec<u8>) -> Result<(), SettingsError> {
        self.values.insert(pref, value);
        Ok(())
    }

    async fn clear_scope(&self, scope: &str) -> Result<usize, SettingsError> {
        let before = self.values.len();
        self.values.retain(|pref, _| pref.scope() != scope);
        Ok(before - self.values.len())
    }
}
