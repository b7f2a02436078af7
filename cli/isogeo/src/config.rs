use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use isogeo_api::{Credentials, IsogeoClientConfig, Lang, Platform};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use xdg::BaseDirectories;

pub const ISOGEO_DIR_NAME: &str = "isogeo";
pub const ISOGEO_CONFIG_FILE: &str = "isogeo.toml";
const ISOGEO_CONFIG_DIR_VAR: &str = "ISOGEO_CONFIG_DIR";
const ISOGEO_ENV_PREFIX: &str = "ISOGEO_";

/// Settings of the command line client.
///
/// Read from `isogeo.toml` in the config directory, then from `ISOGEO_*`
/// variables, e.g. `ISOGEO_CLIENT_SECRET`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    pub config_dir: PathBuf,
    pub platform: Platform,
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    /// With a password, the client authenticates on behalf of this user.
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub lang: Lang,
    pub api_url: Option<Url>,
    pub id_url: Option<Url>,
    /// Seconds.
    pub timeout: u64,
    /// Minutes before expiration at which tokens are renewed.
    pub token_margin: u64,
}

impl Config {
    fn config_dir() -> Result<PathBuf> {
        match env::var(ISOGEO_CONFIG_DIR_VAR) {
            Ok(v) => {
                debug!("`${ISOGEO_CONFIG_DIR_VAR}` set: {v}");
                Ok(v.into())
            },
            Err(_) => {
                let config_dir = BaseDirectories::with_prefix(ISOGEO_DIR_NAME)
                    .get_config_home()
                    .context("Could not determine the config directory")?;
                debug!("`${ISOGEO_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                Ok(config_dir)
            },
        }
    }

    fn raw_config() -> Result<HierarchicalConfig> {
        let config_dir = Self::config_dir()?;
        let config_dir_str = config_dir
            .to_str()
            .context("Config directory is not valid unicode")?;

        let builder = HierarchicalConfig::builder()
            .set_default("platform", "prod")?
            .set_default("lang", "en")?
            .set_default("timeout", 60)?
            .set_default("token_margin", 30)?
            // the config file cannot change the directory it is read from
            .set_override("config_dir", config_dir_str)?
            .add_source(
                config::File::from(config_dir.join(ISOGEO_CONFIG_FILE))
                    .format(config::FileFormat::Toml)
                    .required(false),
            );

        // override via env variables
        let isogeo_envs = env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(ISOGEO_ENV_PREFIX)
                    .filter(|k| *k != "CONFIG_DIR")
                    .map(|k| (k.to_owned(), v))
            })
            .collect::<HashMap<_, _>>();

        let final_config = builder
            .add_source(
                Environment::default()
                    .source(Some(isogeo_envs))
                    .try_parsing(true),
            )
            .build()?;
        Ok(final_config)
    }

    /// Creates a [Config] from the environment and config file
    pub fn parse() -> Result<Config> {
        Self::raw_config()?
            .try_deserialize()
            .context("Could not parse config")
    }

    pub fn credentials(&self) -> Result<Credentials> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            bail!(
                "No API credentials configured, set 'client_id' and 'client_secret' in {} or the ISOGEO_CLIENT_ID and ISOGEO_CLIENT_SECRET variables",
                self.config_dir.join(ISOGEO_CONFIG_FILE).display()
            );
        };
        match (&self.username, &self.password) {
            (None, None) => Ok(Credentials::ClientCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            (Some(username), Some(password)) => Ok(Credentials::Password {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                username: username.clone(),
                password: password.clone(),
            }),
            _ => bail!("'username' and 'password' must be set together"),
        }
    }

    pub fn client_config(&self) -> Result<IsogeoClientConfig> {
        let mut client_config = IsogeoClientConfig::new(self.platform, self.credentials()?);
        client_config.api_url = self.api_url.clone();
        client_config.id_url = self.id_url.clone();
        client_config.lang = self.lang;
        client_config.timeout = Duration::from_secs(self.timeout);
        client_config.token_margin = Duration::from_secs(self.token_margin * 60);
        Ok(client_config)
    }
}
