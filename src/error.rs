use thiserror::Error;

#[derive(Error, Debug)]
pub enum CavizError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Graph API error: {0}")]
    GraphApiError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(
        "Access token not found. Pass --token, set CAVIZ_ACCESS_TOKEN, or add ACCESS_TOKEN to the .env file in the config directory"
    )]
    TokenNotFound,

    #[error("User '{0}' not found")]
    UserNotFound(String),
}

pub type Result<T> = std::result::Result<T, CavizError>;

pub use CavizError as Error;

/// Parse a Graph API error body and append a hint for the common failure codes
pub fn enhance_graph_error(error_response: &str) -> String {
    if let Ok(error_json) = serde_json::from_str::<serde_json::Value>(error_response) {
        if let Some(error_obj) = error_json.get("error") {
            let code = error_obj
                .get("code")
                .and_then(|c| c.as_str())
                .unwrap_or("Unknown");
            let message = error_obj
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("No message");

            let hint = match code {
                "Unauthorized" | "InvalidAuthenticationToken" => {
                    "\nHint: The access token is missing or expired. Acquire a new token and pass it with --token or CAVIZ_ACCESS_TOKEN."
                }
                "Forbidden" | "Authorization_RequestDenied" | "InsufficientPrivileges" => {
                    "\nHint: Reading policies and memberships needs Policy.Read.All, User.Read.All, Group.Read.All and Directory.Read.All."
                }
                "NotFound" | "Request_ResourceNotFound" => {
                    "\nHint: The requested object doesn't exist. Check the user id or UPN."
                }
                "TooManyRequests" => "\nHint: Graph throttled the request. Wait a moment and try again.",
                _ => "",
            };

            return format!("{}: {}{}", code, message, hint);
        }
    }

    error_response.to_string()
}
