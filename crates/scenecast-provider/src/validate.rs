//! API key validation by minimal live request.

use reqwest::Client;

/// Test an API key by making a minimal request.
///
/// Mock-path providers have no validation endpoint; a non-empty key is
/// accepted for them.
pub async fn validate_key(provider: &str, api_key: &str) -> Result<(), String> {
    if api_key.trim().is_empty() {
        return Err("API key is empty".into());
    }

    let client = Client::new();

    match provider {
        "official" => {
            let resp = client
                .get("https://generativelanguage.googleapis.com/v1beta/models")
                .header("x-goog-api-key", api_key)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if resp.status().is_success() {
                Ok(())
            } else {
                Err(format!("API returned status {}", resp.status()))
            }
        }
        "fal.ai" | "kie.ai" => Ok(()),
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}
