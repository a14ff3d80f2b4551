use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use featbot_bedrock::chat::ChatModelSettings;
use featbot_bedrock::knowledge_base::KnowledgeBaseSettings;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "FEATBOT_CONFIG";
/// Overrides `history.path`.
pub const HISTORY_FILE_ENV: &str = "FEATBOT_HISTORY_FILE";
/// Overrides `region`.
pub const REGION_ENV: &str = "AWS_REGION";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatbotConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    pub region: String,
    pub credentials: CredentialSource,
    #[serde(default)]
    pub chat: ChatModelSettings,
    /// `null` disables the knowledge base entirely.
    #[serde(default = "default_knowledge_base")]
    pub knowledge_base: Option<KnowledgeBaseSettings>,
    /// Initial state of the "use knowledge base" toggle.
    #[serde(default = "default_true")]
    pub use_knowledge_base: bool,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub memory: MemorySettings,
    #[serde(default = "jiff::Timestamp::now")]
    pub created_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialSource {
    Inline {
        access_key_id: String,
        secret_access_key: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        session_token: Option<String>,
    },
    Profile {
        profile_name: String,
    },
    DefaultChain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub path: PathBuf,
    pub session_id: String,
    /// How many turns to show at startup.
    pub recent_turns: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("chat_history.json"),
            session_id: "server_1234".to_string(),
            recent_turns: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    pub max_token_limit: usize,
    /// Seed the conversation memory with the turns shown at startup.
    pub prime_from_history: bool,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_token_limit: featbot_chat::memory::DEFAULT_TOKEN_LIMIT,
            prime_from_history: true,
        }
    }
}

impl Default for FeatbotConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            region: "us-east-1".to_string(),
            credentials: CredentialSource::Profile {
                profile_name: "default".to_string(),
            },
            chat: ChatModelSettings::default(),
            knowledge_base: default_knowledge_base(),
            use_knowledge_base: true,
            history: HistorySettings::default(),
            memory: MemorySettings::default(),
            created_at: jiff::Timestamp::now(),
        }
    }
}

fn default_knowledge_base() -> Option<KnowledgeBaseSettings> {
    Some(KnowledgeBaseSettings::default())
}

fn default_true() -> bool {
    true
}

/// Redacted config info safe to print.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigInfo {
    pub region: String,
    pub credential_type: String,
    pub profile_name: Option<String>,
    pub access_key_hint: Option<String>,
    pub model_id: String,
    pub knowledge_base_id: Option<String>,
    pub history_path: String,
    pub session_id: String,
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("featbot"))
}

/// `$FEATBOT_CONFIG` if set, otherwise `<config dir>/featbot/config.json`.
pub fn config_path() -> eyre::Result<PathBuf> {
    resolve_config_path(std::env::var_os(CONFIG_PATH_ENV))
}

/// The explicit path if given, otherwise the default location.
pub fn resolve_config_path(explicit: Option<OsString>) -> eyre::Result<PathBuf> {
    match explicit.filter(|p| !p.is_empty()) {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(config_dir()?.join("config.json")),
    }
}

/// Load the config file if there is one, otherwise write out and use the
/// defaults, then apply environment overrides.
pub fn load_or_default() -> eyre::Result<FeatbotConfig> {
    let mut config = load_or_init(&config_path()?)?;
    config.apply_env_overrides();
    Ok(config)
}

/// Load the config at `path`, or write the defaults there if it does not
/// exist. A failure to write the defaults is logged and ignored.
pub fn load_or_init(path: &Path) -> eyre::Result<FeatbotConfig> {
    if path.exists() {
        return load_config_from(path);
    }

    tracing::info!(path = %path.display(), "no config file found, using defaults");
    let defaults = FeatbotConfig::default();
    if let Err(e) = save_config_to(&defaults, path) {
        tracing::warn!(error = %e, "failed to write default config");
    }
    Ok(defaults)
}

pub fn load_config_from(path: &Path) -> eyre::Result<FeatbotConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: FeatbotConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update featbot."
        ));
    }

    // v0 → v1: an unversioned file has the v1 shape; only the stamp is added.
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("stamped unversioned config as v1");
    }

    Ok(json)
}

impl FeatbotConfig {
    /// Apply `FEATBOT_HISTORY_FILE` and `AWS_REGION` when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides looked up by environment variable name. Blank values
    /// are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());
        if let Some(path) = value(HISTORY_FILE_ENV) {
            self.history.path = PathBuf::from(path);
        }
        if let Some(region) = value(REGION_ENV) {
            self.region = region;
        }
    }
}

pub fn save_config_to(config: &FeatbotConfig, path: &Path) -> eyre::Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let json = serde_json::to_string_pretty(&stamped)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    // Set restrictive permissions on Unix before renaming
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

pub fn config_info(config: &FeatbotConfig) -> ConfigInfo {
    let (credential_type, profile_name, access_key_hint) = match &config.credentials {
        CredentialSource::Inline {
            access_key_id,
            session_token,
            ..
        } => {
            let cred_type = if session_token.is_some() {
                "temporary".to_string()
            } else {
                "inline".to_string()
            };
            let hint = redact_access_key(access_key_id);
            (cred_type, None, Some(hint))
        }
        CredentialSource::Profile { profile_name } => {
            ("profile".to_string(), Some(profile_name.clone()), None)
        }
        CredentialSource::DefaultChain => ("default_chain".to_string(), None, None),
    };

    ConfigInfo {
        region: config.region.clone(),
        credential_type,
        profile_name,
        access_key_hint,
        model_id: config.chat.model_id.clone(),
        knowledge_base_id: config
            .knowledge_base
            .as_ref()
            .map(|kb| kb.knowledge_base_id.clone()),
        history_path: config.history.path.display().to_string(),
        session_id: config.history.session_id.clone(),
    }
}

fn redact_access_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 8 {
        return "****".to_string();
    }
    let prefix: String = key.chars().take(4).collect();
    let suffix: String = key.chars().skip(len - 4).collect();
    format!("{prefix}...{suffix}")
}
