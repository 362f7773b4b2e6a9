use axum::http::HeaderValue;
use std::env;
use std::path::PathBuf;

/// 16 MiB. The upload ceiling can be raised with `MAX_CONTENT_LENGTH`.
const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_content_length: usize,
    pub model_path: PathBuf,
    pub model_fallback_paths: Vec<PathBuf>,
    pub upload_dir: PathBuf,
    pub image_size: u32,
    pub allowed_extensions: Vec<String>,
    pub cors_allowed_origins: Vec<HeaderValue>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid PORT value: {}", e))?;

        let max_content_length = match lookup("MAX_CONTENT_LENGTH") {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid MAX_CONTENT_LENGTH value: {}", e))?,
            None => DEFAULT_MAX_CONTENT_LENGTH,
        };
        if max_content_length == 0 {
            anyhow::bail!("MAX_CONTENT_LENGTH must be greater than zero");
        }

        let model_path = lookup("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("my_banknote_model.onnx"));

        let model_fallback_paths = lookup("MODEL_FALLBACK_PATHS")
            .map(|raw| split_list(&raw).map(PathBuf::from).collect())
            .unwrap_or_else(|| vec![PathBuf::from("models/my_banknote_model.onnx")]);

        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("uploads"));

        let image_size: u32 = lookup("IMAGE_SIZE")
            .unwrap_or_else(|| "224".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid IMAGE_SIZE value: {}", e))?;
        if image_size == 0 {
            anyhow::bail!("IMAGE_SIZE must be greater than zero");
        }

        let allowed_extensions: Vec<String> = lookup("ALLOWED_EXTENSIONS")
            .map(|raw| {
                split_list(&raw)
                    .map(|ext| ext.trim_start_matches('.').to_lowercase())
                    .collect()
            })
            .unwrap_or_else(|| {
                ["jpg", "jpeg", "png", "gif"]
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect()
            });
        if allowed_extensions.is_empty() {
            anyhow::bail!("ALLOWED_EXTENSIONS must list at least one extension");
        }

        let cors_allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => split_list(&raw)
                .map(|origin| {
                    HeaderValue::from_str(origin).map_err(|e| {
                        anyhow::anyhow!("Invalid CORS_ALLOWED_ORIGINS entry {:?}: {}", origin, e)
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Config {
            host,
            port,
            max_content_length,
            model_path,
            model_fallback_paths,
            upload_dir,
            image_size,
            allowed_extensions,
            cors_allowed_origins,
        })
    }

    /// Model artifact candidates in the order they are tried.
    pub fn model_candidates(&self) -> Vec<PathBuf> {
        std::iter::once(self.model_path.clone())
            .chain(self.model_fallback_paths.iter().cloned())
            .collect()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}
