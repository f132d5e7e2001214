use tracing::debug;

use crate::api::ModelsResponse;
use crate::core::backend::BackendError;
use crate::utils::url::construct_api_url;

pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<ModelsResponse, BackendError> {
    let tags_url = construct_api_url(base_url, "api/tags");
    debug!(url = %tags_url, "fetching installed models");

    let response = client.get(tags_url).send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(BackendError::from_status(status, &error_text));
    }

    Ok(response.json::<ModelsResponse>().await?)
}

/// Formats a byte count the way `ollama list` does (decimal units).
pub fn format_model_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1000 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for candidate in UNITS {
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = candidate;
    }
    format!("{value:.1} {unit}")
}
