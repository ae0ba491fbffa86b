use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "community-board", about = "A community bulletin board API")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Insert demo users, posts and comments into an empty database
    #[arg(long)]
    pub seed: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub seed: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens. Generated and persisted in the data
    /// directory when not set.
    pub jwt_secret: Option<String>,
    /// Used as both issuer and audience of issued tokens.
    pub issuer: String,
    pub token_days: i64,
    pub bcrypt_cost: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5160,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: "CommunityBoardAPI".to_string(),
            token_days: 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if cli.seed {
            config.database.seed = true;
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("communityboard.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".community-board")
        })
    }

    pub fn db_path(&self) -> &Path {
        self.database
            .path
            .as_deref()
            .unwrap_or_else(|| Path::new("communityboard.db"))
    }

    /// Returns the configured signing secret, or loads (creating on first
    /// run) a random one stored under `data_dir`.
    pub fn jwt_secret(&self, data_dir: &Path) -> anyhow::Result<String> {
        if let Some(secret) = self.auth.jwt_secret.as_ref().filter(|s| !s.is_empty()) {
            return Ok(secret.clone());
        }

        let path = data_dir.join("jwt_secret");
        if path.exists() {
            let secret = std::fs::read_to_string(&path)?.trim().to_string();
            if !secret.is_empty() {
                return Ok(secret);
            }
        }

        let bytes: [u8; 32] = rand::random();
        let secret = hex::encode(bytes);
        std::fs::write(&path, &secret)?;
        tracing::info!("Generated new token signing secret at {}", path.display());
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_for(data_dir: &Path) -> Cli {
        Cli {
            config: None,
            host: None,
            port: None,
            data_dir: Some(data_dir.to_path_buf()),
            seed: false,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5160);
        assert_eq!(config.auth.issuer, "CommunityBoardAPI");
        assert_eq!(config.auth.token_days, 7);
        assert_eq!(config.auth.bcrypt_cost, 12);
        assert!(config.auth.jwt_secret.is_none());
        assert!(config.database.path.is_none());
        assert!(!config.database.seed);
        assert_eq!(config.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli_for(Path::new("/tmp/test-board"));
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-board"));
    }

    #[test]
    fn data_dir_defaults_to_home_dot_community_board() {
        let mut cli = cli_for(Path::new("/unused"));
        cli.data_dir = None;
        assert!(Config::data_dir(&cli).ends_with(".community-board"));
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&cli_for(tmp.path())).unwrap();
        assert_eq!(config.server.port, 5160);
        assert_eq!(config.db_path(), tmp.path().join("communityboard.db"));
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000

[database]
seed = true

[auth]
jwt_secret = "from-file"
token_days = 1

[cors]
allowed_origins = ["https://board.example"]
"#,
        )
        .unwrap();

        let mut cli = cli_for(tmp.path());
        cli.config = Some(config_path);
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert!(config.database.seed);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-file"));
        assert_eq!(config.auth.token_days, 1);
        assert_eq!(config.auth.issuer, "CommunityBoardAPI");
        assert_eq!(config.cors.allowed_origins, vec!["https://board.example"]);
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "[server]\nhost = \"192.168.1.1\"\nport = 9000\n",
        )
        .unwrap();

        let mut cli = cli_for(tmp.path());
        cli.host = Some("10.0.0.1".to_string());
        cli.port = Some(4000);
        cli.seed = true;
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert!(config.database.seed);
    }

    #[test]
    fn jwt_secret_prefers_configured_value() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.auth.jwt_secret = Some("configured".to_string());
        assert_eq!(config.jwt_secret(tmp.path()).unwrap(), "configured");
        assert!(!tmp.path().join("jwt_secret").exists());
    }

    #[test]
    fn jwt_secret_is_generated_once_and_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::default();
        let first = config.jwt_secret(tmp.path()).unwrap();
        let second = config.jwt_secret(tmp.path()).unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, second);
    }
}
