use dotenv::dotenv;

pub const DEFAULT_INVEST_API_URL: &str = "https://invest-public-api.tinkoff.ru/rest";

pub struct Config {
    pub database_path: String,
    pub api_base_url: String,
    pub api_token: String,
    pub instruments_file: String,
    pub update_on_start: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        Ok(Config {
            database_path: std::env::var("CANDLES_DB_PATH")
                .unwrap_or_else(|_| "./candles.db".to_string()),
            api_base_url: std::env::var("INVEST_API_URL")
                .unwrap_or_else(|_| DEFAULT_INVEST_API_URL.to_string()),
            api_token: std::env::var("INVEST_TOKEN")?,
            instruments_file: std::env::var("INSTRUMENTS_FILE")
                .unwrap_or_else(|_| "./instruments.json".to_string()),
            update_on_start: std::env::var("CANDLES_UPDATE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        })
    }
}
