//! Configuration for running this bot.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::GuildId;
use serenity::UserId;

use crate::calendar::CalendarSettings;
use crate::error::ConfigError;
use crate::guild::select::SelectionSettings;
use crate::serenity;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Default tracking start, 2024-01-01T00:00:00Z.
const DEFAULT_TRACKING_START: i64 = 1_704_067_200;

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account.
    discord_token: String,

    /// See [PerscomConfig]
    perscom: PerscomConfig,

    /// See [AttendanceConfig]
    attendance: AttendanceConfig,

    /// See [SelectionConfig]
    selection: SelectionConfig,

    /// See [LoggingConfig]
    logging: LoggingConfig,

    /// Useful developer specific configs.
    dev_utils: DevConfig,
}

impl Config {
    /// Tries to read [CONFIG_PATH] to extract a [Config].
    /// If a file doesn't exists, create the default config file and returns error.
    /// If a file exists but is empty, re-write the default values and return error.
    /// If a file exists but is incomplete, show error and don't change files.
    /// If a file exists and is complete, read file to create a config.
    pub fn read() -> Result<Config, ConfigError> {
        Self::read_from(CONFIG_PATH)
    }

    /// [Config::read] with a custom path.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::read_to_string(path);

        match file {
            // Config file found
            Ok(content) => {
                // Write default values to file if it's empty.
                if content.trim().is_empty() {
                    write_file(path, Config::default())?;
                    Err(ConfigError::InvalidConfig {
                        reason: format!("Empty config file! Rewriting {} ...", path.display()),
                    })
                } else {
                    Self::parse(&content)
                }
            }
            // File not found or other filesystem error
            Err(file_error) => match file_error.kind() {
                std::io::ErrorKind::NotFound => {
                    let action = format!("Creating {}...", path.display());
                    write_file(path, Config::default())?;
                    Err(ConfigError::MissingConfig { action_msg: action })
                }
                _ => Err(ConfigError::IoError(file_error)),
            },
        }
    }

    /// Deserialize a config, describing where it went wrong if it fails.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let to_toml = toml::Deserializer::new(content);
        serde_path_to_error::deserialize(to_toml).map_err(|error| ConfigError::InvalidConfig {
            reason: error.to_string(),
        })
    }

    /// Basic sanity check for if a token was given.
    pub fn token(&self) -> Result<&String, ConfigError> {
        sanity_check(
            &self.discord_token,
            &Config::default().discord_token,
            "discord token",
        )
    }

    /// Bearer token for the PERSCOM api.
    pub fn perscom_token(&self) -> Result<&String, ConfigError> {
        sanity_check(
            &self.perscom.api_token,
            &Config::default().perscom.api_token,
            "PERSCOM api token",
        )
    }

    pub fn perscom_url(&self) -> &str {
        &self.perscom.api_url
    }

    pub fn perscom_id(&self) -> &str {
        &self.perscom.perscom_id
    }

    /// Page the submission walk starts from.
    pub fn submissions_start_page(&self) -> u32 {
        self.perscom.submissions_start_page
    }

    /// Statuses whose applicants get removed.
    pub fn purge_statuses(&self) -> &[String] {
        &self.perscom.purge_statuses
    }

    pub fn calendar_settings(&self) -> CalendarSettings {
        CalendarSettings {
            tracking_start: self.attendance.tracking_start,
        }
    }

    pub fn attendance_store(&self) -> &str {
        &self.attendance.store_path
    }

    pub fn selection_settings(&self) -> SelectionSettings {
        SelectionSettings {
            page_size: self.selection.page_size,
            timeout: Duration::from_secs(self.selection.timeout_secs),
        }
    }

    /// Construct a bug notification notify list based on the config.
    /// Wrapper for [NotifyConfig::notify_list]
    pub fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        self.dev_utils.notifications.notify_list(&fw.options().owners)
    }

    /// Directory log files are written to.
    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }

    pub fn dev_guild(&self) -> Option<GuildId> {
        self.dev_utils.dev_guild
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: "put_token_here".to_string(),

            perscom: PerscomConfig {
                api_url: "https://api.perscom.io/v2/".to_string(),
                api_token: "put_perscom_token_here".to_string(),
                perscom_id: String::new(),
                submissions_start_page: 1,
                purge_statuses: vec!["Denied".to_string()],
            },

            attendance: AttendanceConfig {
                tracking_start: DateTime::from_timestamp(DEFAULT_TRACKING_START, 0)
                    .unwrap_or_default(),
                store_path: "attendance.json".to_string(),
            },

            selection: SelectionConfig {
                page_size: 24,
                timeout_secs: 60,
            },

            logging: LoggingConfig {
                console_debug: false,
                logs_enabled: true,
                log_dir: "logs".to_string(),
            },

            dev_utils: DevConfig {
                dev_guild: None,
                notifications: NotifyConfig {
                    enabled: false,
                    add_owners: true,
                    userids: vec![],
                },
            },
        }
    }
}

/// Reject empty values and values still containing the placeholder.
fn sanity_check<'a>(
    given: &'a String,
    default: &str,
    name: &str,
) -> Result<&'a String, ConfigError> {
    if !given.is_empty() && !given.contains(default) {
        Ok(given)
    } else {
        Err(ConfigError::InvalidConfig {
            reason: format!("Missing {name}"),
        })
    }
}

/// Connection to the PERSCOM api.
#[derive(Debug, Serialize, Deserialize)]
struct PerscomConfig {
    /// Root of the api, requests are relative to it.
    api_url: String,
    /// Bearer token.
    api_token: String,
    /// Sent as the `X-Perscom-Id` header.
    perscom_id: String,
    /// First page of submissions to look at.
    submissions_start_page: u32,
    /// Applicants whose latest status is one of these are removed.
    purge_statuses: Vec<String>,
}

/// Where attendance comes from and since when it counts.
#[derive(Debug, Serialize, Deserialize)]
struct AttendanceConfig {
    /// Raid days before this are never counted. RFC 3339, expected to be a
    /// UTC midnight: with a later time of day, that day's raid isn't counted.
    tracking_start: DateTime<Utc>,
    /// JSON file mapping display names to attendance timestamps.
    store_path: String,
}

/// Member selection menu.
#[derive(Debug, Serialize, Deserialize)]
struct SelectionConfig {
    /// Members per page, at most 24.
    page_size: usize,
    /// Seconds to wait for a choice.
    timeout_secs: u64,
}

/// Configs for logging.
#[derive(Debug, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to automatically update commands quickly.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Serialize, Deserialize)]
struct NotifyConfig {
    /// Enable this behavior or not. (bot sends a private message)
    enabled: bool,
    /// Whether to automatically add owners to the notify list.
    add_owners: bool,
    /// Additional users to add to the notify list.
    userids: Vec<UserId>,
}

impl NotifyConfig {
    /// Construct a bug notification notify list from the config and the bot owners.
    fn notify_list(&self, owners: &HashSet<UserId>) -> HashSet<UserId> {
        let mut notify_list = HashSet::new();

        // If disabled, don't add anyone to the list.
        if !self.enabled {
            return notify_list;
        }

        if self.add_owners {
            notify_list.extend(owners.iter().copied());
        }

        notify_list.extend(self.userids.iter().copied());

        notify_list
    }
}

/// Write the given config to `path`.
fn write_file(path: &Path, config: Config) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(&config).expect("config serialization can't fail");
    std::fs::write(path, content).map_err(ConfigError::IoError)
}

fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<GuildId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_str(OptVisitor)
}

fn serialize_opt<T, S>(val: &Option<T>, ser: S) -> Result<S::Ok, S::Error>
where
    T: serde::Serialize,
    S: serde::Serializer,
{
    match val {
        Some(v) => v.serialize(ser),
        None => ser.serialize_str(""),
    }
}

/// Reads an empty string as no guild.
struct OptVisitor;

impl<'de> serde::de::Visitor<'de> for OptVisitor {
    type Value = Option<GuildId>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a valid guild id")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v {
            "" => Ok(None),
            _ => {
                let num: u64 = v.parse().map_err(|_| E::custom("not u64"))?;
                Ok(Some(GuildId::new(num)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap()
    }

    #[test]
    fn default_config_round_trips() {
        let config = Config::parse(&default_toml()).unwrap();
        assert_eq!(config.selection_settings().page_size, 24);
        assert_eq!(config.selection_settings().timeout, Duration::from_secs(60));
        assert_eq!(config.submissions_start_page(), 1);
        assert_eq!(config.dev_guild(), None);
        assert_eq!(
            config.calendar_settings().tracking_start,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn placeholder_tokens_are_rejected() {
        let config = Config::default();
        assert!(config.token().is_err());
        assert!(config.perscom_token().is_err());
    }

    #[test]
    fn real_tokens_are_accepted() {
        let content = default_toml()
            .replace("put_token_here", "abc.def")
            .replace("put_perscom_token_here", "xyz");
        let config = Config::parse(&content).unwrap();
        assert_eq!(config.token().unwrap(), "abc.def");
        assert_eq!(config.perscom_token().unwrap(), "xyz");
    }

    #[test]
    fn bad_values_name_their_path() {
        let content = default_toml().replace("timeout_secs = 60", "timeout_secs = \"soon\"");
        match Config::parse(&content) {
            Err(ConfigError::InvalidConfig { reason }) => {
                assert!(reason.contains("selection.timeout_secs"), "{reason}")
            }
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn dev_guild_parses_from_string() {
        let content = default_toml().replace("dev_guild = \"\"", "dev_guild = \"1234\"");
        let config = Config::parse(&content).unwrap();
        assert_eq!(config.dev_guild(), Some(GuildId::new(1234)));
    }

    #[test]
    fn missing_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(matches!(
            Config::read_from(&path),
            Err(ConfigError::MissingConfig { .. })
        ));
        // The written default parses but still has placeholder tokens.
        let config = Config::read_from(&path).unwrap();
        assert!(config.token().is_err());
    }

    #[test]
    fn notify_list_respects_switches() {
        let owners: HashSet<_> = [UserId::new(1)].into_iter().collect();
        let mut notify = NotifyConfig {
            enabled: false,
            add_owners: true,
            userids: vec![UserId::new(2)],
        };
        assert!(notify.notify_list(&owners).is_empty());

        notify.enabled = true;
        assert_eq!(notify.notify_list(&owners).len(), 2);

        notify.add_owners = false;
        let list = notify.notify_list(&owners);
        assert_eq!(list.len(), 1);
        assert!(list.contains(&UserId::new(2)));
    }
}
