use super::DeskStore;
use crate::{
    config::GlobalSettings,
    error::DeskResult,
    types::{AgentDirectory, OperativeAgentIds},
};

impl DeskStore {
    // ── Roster caches ──────────────────────────────────────────────

    pub fn save_agent_directory(&self, directory: &AgentDirectory) -> DeskResult<()> {
        self.write_json(&self.files.agent_directory, directory)?;
        log::info!("Agent directory cache saved: {} agents", directory.len());
        Ok(())
    }

    pub fn load_agent_directory(&self) -> AgentDirectory {
        self.read_json(&self.files.agent_directory)
    }

    pub fn save_operative_agents(&self, ids: &OperativeAgentIds) -> DeskResult<()> {
        self.write_json(&self.files.operative_agents, ids)?;
        log::info!("Operative agents cache saved: {} agents", ids.len());
        Ok(())
    }

    pub fn load_operative_agents(&self) -> OperativeAgentIds {
        self.read_json(&self.files.operative_agents)
    }

    // ── Global settings cache ──────────────────────────────────────

    pub fn save_global_settings(&self, settings: &GlobalSettings) -> DeskResult<()> {
        self.write_json(&self.files.global_settings, settings)?;
        log::info!("Global settings cache saved: {} entries", settings.raw.len());
        Ok(())
    }

    pub fn load_global_settings(&self) -> GlobalSettings {
        self.read_json(&self.files.global_settings)
    }
}

#[cfg(test)]
mod tests {
    use crate::{config::StateFilesConfig, store::DeskStore, types::AgentDirectory};

    #[test]
    fn directory_cache_is_a_plain_json_object() {
        let root = tempfile::tempdir().unwrap();
        let store = DeskStore::open(root.path(), StateFilesConfig::default()).unwrap();
        let mut directory = AgentDirectory::new();
        directory.insert("12".into(), "Lucía".into());
        store.save_agent_directory(&directory).unwrap();

        let raw = std::fs::read_to_string(root.path().join("cache_mapa_agentes.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["12"], "Lucía");
        assert!(raw.contains("Lucía"), "non-ASCII names are stored unescaped");
        assert_eq!(store.load_agent_directory(), directory);
    }

    #[test]
    fn missing_caches_load_empty() {
        let root = tempfile::tempdir().unwrap();
        let store = DeskStore::open(root.path(), StateFilesConfig::default()).unwrap();
        assert!(store.load_agent_directory().is_empty());
        assert!(store.load_operative_agents().is_empty());
        assert!(store.load_global_settings().is_empty());
    }
}
