//! `l4m models`: list the models installed on the Ollama server.

use std::error::Error;

use chrono::{DateTime, FixedOffset, Utc};

use crate::api::models::{fetch_models, format_model_size};
use crate::api::ModelInfo;
use crate::core::config::Config;

fn modified_at(model: &ModelInfo) -> Option<DateTime<FixedOffset>> {
    model
        .modified_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
}

/// Newest first, then by name so the output is stable.
pub fn sort_models(models: &mut [ModelInfo]) {
    models.sort_by(|a, b| {
        modified_at(b)
            .cmp(&modified_at(a))
            .then_with(|| a.id().cmp(b.id()))
    });
}

/// Detail lines printed under a model's name.
pub fn describe_model(model: &ModelInfo) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(details) = &model.details {
        let mut parts = Vec::new();
        if let Some(size) = details.parameter_size.as_deref().filter(|s| !s.is_empty()) {
            parts.push(size.to_string());
        }
        if let Some(quant) = details
            .quantization_level
            .as_deref()
            .filter(|q| !q.is_empty())
        {
            parts.push(quant.to_string());
        }
        if !parts.is_empty() {
            lines.push(format!("Parameters: {}", parts.join(", ")));
        }
    }
    if let Some(size) = model.size {
        lines.push(format!("Size: {}", format_model_size(size)));
    }
    if let Some(modified) = modified_at(model) {
        lines.push(format!(
            "Modified: {}",
            modified.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    lines
}

pub async fn list_models(ollama_url: Option<String>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let base_url = ollama_url.unwrap_or_else(|| config.ollama_url().to_string());

    println!("Models on {base_url}");
    println!();

    let client = reqwest::Client::new();
    let mut models = fetch_models(&client, &base_url).await?.models;

    if models.is_empty() {
        println!("No models installed. Pull one with `ollama pull <model>`.");
        return Ok(());
    }

    sort_models(&mut models);
    let default_model = config.default_model();
    for model in &models {
        let marker = if model.id() == default_model {
            " (default)"
        } else {
            ""
        };
        println!("  • {}{marker}", model.id());
        for line in describe_model(model) {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ModelDetails;

    fn model(name: &str, modified: Option<&str>) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            model: None,
            modified_at: modified.map(str::to_string),
            size: Some(3_300_000_000),
            details: Some(ModelDetails {
                parameter_size: Some("4.3B".into()),
                quantization_level: Some("Q4_K_M".into()),
            }),
        }
    }

    #[test]
    fn newest_models_come_first() {
        let mut models = vec![
            model("old", Some("2024-01-01T00:00:00Z")),
            model("undated", None),
            model("new", Some("2025-03-01T12:00:00.5-07:00")),
        ];
        sort_models(&mut models);
        let names: Vec<&str> = models.iter().map(|m| m.id()).collect();
        assert_eq!(names, vec!["new", "old", "undated"]);
    }

    #[test]
    fn details_include_size_and_parameters() {
        let lines = describe_model(&model("gemma3:4b", Some("2025-03-01T12:00:00Z")));
        assert_eq!(
            lines,
            vec![
                "Parameters: 4.3B, Q4_K_M".to_string(),
                "Size: 3.3 GB".to_string(),
                "Modified: 2025-03-01 12:00:00 UTC".to_string(),
            ]
        );
    }
}
