use crate::{clock::Zone, roster::{RosterSettings, DEFAULT_BREAK_MINUTES}};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── config.json ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    pub domain: String,
    pub api_key: String,
    /// Overrides `https://{domain}.freshdesk.com/api/v2` when set.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl HelpdeskConfig {
    pub fn api_base(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.freshdesk.com/api/v2", self.domain),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSourceConfig {
    pub agents_file: String,
    pub settings_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFilesConfig {
    #[serde(default = "default_directory_cache")]
    pub agent_directory: String,
    #[serde(default = "default_operative_cache")]
    pub operative_agents: String,
    #[serde(default = "default_settings_cache")]
    pub global_settings: String,
    #[serde(default = "default_rotation_cursor")]
    pub rotation_cursor: String,
    #[serde(default = "default_after_hours_ledger")]
    pub after_hours_ledger: String,
}

fn default_directory_cache() -> String { "cache_mapa_agentes.json".into() }
fn default_operative_cache() -> String { "cache_agentes_operativos.json".into() }
fn default_settings_cache() -> String { "cache_configuracion_global.json".into() }
fn default_rotation_cursor() -> String { "ultimo_agente_asignado.txt".into() }
fn default_after_hours_ledger() -> String { "fuera_horario_procesados.txt".into() }

impl Default for StateFilesConfig {
    fn default() -> Self {
        Self {
            agent_directory: default_directory_cache(),
            operative_agents: default_operative_cache(),
            global_settings: default_settings_cache(),
            rotation_cursor: default_rotation_cursor(),
            after_hours_ledger: default_after_hours_ledger(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsConfig {
    /// How far back the after-hours search looks for new tickets.
    #[serde(default = "default_after_hours_lookback")]
    pub after_hours_lookback_minutes: i64,
    /// Surveys target tickets created on the date of `now - this`.
    #[serde(default = "default_survey_lookback")]
    pub survey_lookback_minutes: i64,
    #[serde(default = "default_break_minutes")]
    pub break_duration_minutes: i64,
    #[serde(default = "default_survey_max_pages")]
    pub survey_max_pages: u32,
    /// Page size the search API returns; a shorter page ends pagination.
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
}

fn default_after_hours_lookback() -> i64 { 60 }
fn default_survey_lookback() -> i64 { 240 }
fn default_break_minutes() -> i64 { DEFAULT_BREAK_MINUTES }
fn default_survey_max_pages() -> u32 { 34 }
fn default_search_page_size() -> usize { 30 }

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            after_hours_lookback_minutes: default_after_hours_lookback(),
            survey_lookback_minutes: default_survey_lookback(),
            break_duration_minutes: default_break_minutes(),
            survey_max_pages: default_survey_max_pages(),
            search_page_size: default_search_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    pub helpdesk: HelpdeskConfig,
    pub schedule_source: ScheduleSourceConfig,
    #[serde(default)]
    pub state_files: StateFilesConfig,
    #[serde(default)]
    pub params: ParamsConfig,
}

impl DeskConfig {
    /// Load from a `config.json` file.
    /// In tests, use DeskConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.helpdesk.domain.trim().is_empty() && config.helpdesk.base_url.is_none() {
            anyhow::bail!("{path}: helpdesk.domain is required");
        }
        if config.helpdesk.api_key.trim().is_empty() {
            anyhow::bail!("{path}: helpdesk.api_key is required");
        }
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self {
            helpdesk: HelpdeskConfig {
                domain: "testdesk".into(),
                api_key: "test-key".into(),
                base_url: None,
            },
            schedule_source: ScheduleSourceConfig {
                agents_file: "agents.json".into(),
                settings_file: "settings.json".into(),
            },
            state_files: StateFilesConfig::default(),
            params: ParamsConfig::default(),
        }
    }
}

// ── Global settings sheet ──────────────────────────────────────────

pub const KEY_ATTENDANCE_START: &str = "HORARIO_ATENCION_INICIO";
pub const KEY_ATTENDANCE_END: &str = "HORARIO_ATENCION_FIN";
pub const KEY_TIMEZONE: &str = "TIMEZONE_APP";
pub const KEY_OPENING_MESSAGE: &str = "MENSAJE_APERTURA";
pub const KEY_SURVEY_MESSAGE: &str = "MENSAJE_CIERRE_ENCUESTA";
pub const KEY_AFTER_HOURS_MESSAGE: &str = "MENSAJE_FUERA_HORARIO";

const REQUIRED_KEYS: [&str; 5] = [
    KEY_ATTENDANCE_START,
    KEY_ATTENDANCE_END,
    KEY_OPENING_MESSAGE,
    KEY_SURVEY_MESSAGE,
    KEY_AFTER_HOURS_MESSAGE,
];

/// Typed view of the settings sheet. `raw` is what gets cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalSettings {
    pub raw: BTreeMap<String, String>,
}

impl GlobalSettings {
    pub fn from_map(raw: BTreeMap<String, String>) -> Self {
        for key in REQUIRED_KEYS {
            if !raw.contains_key(key) {
                log::warn!("Required setting '{key}' missing from the settings sheet");
            }
        }
        Self { raw }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn attendance_start(&self) -> Option<&str> { self.get(KEY_ATTENDANCE_START) }
    pub fn attendance_end(&self) -> Option<&str> { self.get(KEY_ATTENDANCE_END) }
    pub fn timezone(&self) -> Option<&str> { self.get(KEY_TIMEZONE) }

    pub fn opening_message(&self) -> Option<&str> { self.get(KEY_OPENING_MESSAGE) }
    pub fn survey_message(&self) -> Option<&str> { self.get(KEY_SURVEY_MESSAGE) }
    pub fn after_hours_message(&self) -> Option<&str> { self.get(KEY_AFTER_HOURS_MESSAGE) }

    pub fn zone(&self) -> Zone {
        Zone::resolve(self.timezone())
    }

    pub fn roster_settings(&self, params: &ParamsConfig) -> RosterSettings {
        RosterSettings {
            zone: self.zone(),
            break_minutes: params.break_duration_minutes,
        }
    }
}
