pub mod allocation;
pub mod amount;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod matrix;
pub mod product_allocation;

pub use error::AllocationError;

pub mod config {
    use anyhow::Context;

    const DEFAULT_MATRIX_DIR: &str = "data";
    const DEFAULT_PRODUCT_CATALOG_PATH: &str = "data/products.json";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub matrix_dir: Option<String>,
        pub matrix_base_url: Option<String>,
        pub matrix_api_key: Option<String>,
        pub product_catalog_path: Option<String>,
        pub cors_allowed_origin: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                matrix_dir: std::env::var("MATRIX_DIR").ok(),
                matrix_base_url: std::env::var("MATRIX_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                matrix_api_key: std::env::var("MATRIX_API_KEY").ok(),
                product_catalog_path: std::env::var("PRODUCT_CATALOG_PATH").ok(),
                cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn matrix_dir(&self) -> &str {
            self.matrix_dir.as_deref().unwrap_or(DEFAULT_MATRIX_DIR)
        }

        pub fn product_catalog_path(&self) -> &str {
            self.product_catalog_path
                .as_deref()
                .unwrap_or(DEFAULT_PRODUCT_CATALOG_PATH)
        }

        pub fn require_matrix_base_url(&self) -> anyhow::Result<&str> {
            self.matrix_base_url
                .as_deref()
                .context("MATRIX_BASE_URL is required")
        }
    }
}
