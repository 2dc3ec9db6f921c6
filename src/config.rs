use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "card-wallet")]
#[command(about = "Local card wallet backend: stored cards, primary card and QR payloads")]
#[command(version)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://wallet.db?mode=rwc")]
    pub database_url: String,

    /// Key the card collection is stored under
    #[arg(long, env = "STORAGE_KEY", default_value = "cards")]
    pub storage_key: String,

    /// Token derivation key as 32 hex chars (random per run if unset)
    #[arg(long, env = "TOKEN_KEY", hide_env_values = true)]
    pub token_key: Option<String>,
}

impl Config {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config =
            Config::try_parse_from(["card-wallet", "--host", "0.0.0.0", "--port", "1234"]).unwrap();
        assert_eq!(config.socket_addr(), "0.0.0.0:1234");
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "card-wallet",
            "--port",
            "9000",
            "--storage-key",
            "wallet",
            "--token-key",
            "000102030405060708090a0b0c0d0e0f",
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.storage_key, "wallet");
        assert!(config.token_key.is_some());
    }
}
