//! HTTP plumbing shared by the vendor adapters.

use serde::{Deserialize, Serialize};

use super::LlmError;

/// Error envelope used by all three vendors: `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct VendorErrorResponse {
    error: VendorError,
}

#[derive(Debug, Deserialize)]
struct VendorError {
    message: String,
}

/// Send a JSON request and return the body of a successful response.
pub(super) async fn send_json<T>(
    request: reqwest::RequestBuilder,
    body: &T,
) -> Result<String, LlmError>
where
    T: Serialize + ?Sized,
{
    let response = request
        .header("content-type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

    let status = response.status().as_u16();

    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(LlmError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

    if status != 200 {
        return Err(api_error(status, text));
    }

    Ok(text)
}

fn api_error(status: u16, body: String) -> LlmError {
    match serde_json::from_str::<VendorErrorResponse>(&body) {
        Ok(parsed) => LlmError::ApiError {
            status,
            message: parsed.error.message,
        },
        Err(_) => LlmError::ApiError {
            status,
            message: body,
        },
    }
}
