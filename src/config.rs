use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub cards: CardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Tokens are issued by the hosted auth provider; we only verify them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConfig {
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: u32,
    #[serde(default = "default_max_expiry_days")]
    pub max_expiry_days: i64,
}

fn default_code_length() -> usize {
    12
}

fn default_max_batch_size() -> u32 {
    500
}

fn default_max_expiry_days() -> i64 {
    3650
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            max_batch_size: default_max_batch_size(),
            max_expiry_days: default_max_expiry_days(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // no file: build from environment and defaults
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        audience: get_env("JWT_AUDIENCE"),
                    },
                    cards: CardConfig {
                        code_length: get_env_parse("CARD_CODE_LENGTH", default_code_length()),
                        max_batch_size: get_env_parse(
                            "CARD_MAX_BATCH_SIZE",
                            default_max_batch_size(),
                        ),
                        max_expiry_days: get_env_parse(
                            "CARD_MAX_EXPIRY_DAYS",
                            default_max_expiry_days(),
                        ),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        // environment always wins over the file
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_AUDIENCE") {
            config.jwt.audience = Some(v);
        }
        if let Ok(v) = env::var("CARD_CODE_LENGTH")
            && let Ok(n) = v.parse()
        {
            config.cards.code_length = n;
        }
        if let Ok(v) = env::var("CARD_MAX_BATCH_SIZE")
            && let Ok(n) = v.parse()
        {
            config.cards.max_batch_size = n;
        }
        if let Ok(v) = env::var("CARD_MAX_EXPIRY_DAYS")
            && let Ok(n) = v.parse()
        {
            config.cards.max_expiry_days = n;
        }

        Ok(config)
    }
}
