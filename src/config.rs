use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Built-in language catalog: ISO 639-1 code and display name.
/// Seeded into the `language` table at startup.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("de", "German"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("it", "Italian"),
    ("nl", "Dutch"),
    ("pt", "Portuguese"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub loglevel: String,
    /// Key material for the private session cookie. Must be at least
    /// 32 bytes; when unset a fresh key is generated at startup and all
    /// sessions are invalidated on restart.
    pub secret_key: Option<String>,
    pub posts_per_page: u32,
    pub vocables_per_page: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:polypivot.sqlite".to_string(),
            bind_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            secret_key: None,
            posts_per_page: 5,
            vocables_per_page: 25,
        }
    }
}

impl Config {
    /// Defaults merged with `PIVOT_`-prefixed environment variables,
    /// e.g. `PIVOT_DATABASE_URL`, `PIVOT_SECRET_KEY`.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("PIVOT_"))
            .extract()
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| {
        eprintln!("invalid configuration: {e}");
        std::process::exit(1);
    })
});
