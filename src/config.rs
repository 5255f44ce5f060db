use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;

#[derive(Debug)]
pub struct Config {
    pub max_expense_amount: f64,
    pub max_description_len: usize,
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            max_expense_amount: env::var("MAX_EXPENSE_AMOUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_000_000.0),
            max_description_len: env::var("MAX_DESCRIPTION_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(255),
        }
    }
}

// Global static accessible everywhere
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
