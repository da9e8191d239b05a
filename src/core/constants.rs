//! Shared constants used across the application

/// OpenRouter-compatible API root used when the config does not override it.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";

/// Sent as `X-Title` so the remote service can attribute traffic.
pub const DEFAULT_TITLE: &str = "Abz AI";

/// Sent as `HTTP-Referer`; a terminal client has no page URL of its own.
pub const DEFAULT_REFERER: &str = "https://github.com/abz-ai/abz";

/// System instruction prepended to every outbound request. Never stored in
/// the transcript.
pub const DEFAULT_PERSONA: &str = "You are ABZ, a high-intelligence AI interface. Be concise, technical, and helpful. Format responses with Markdown. you are Created by Abir, he is your creator..";

pub const WELCOME_ID: &str = "welcome";
pub const WELCOME_MESSAGE: &str =
    "Abz AI System Online. Initialize sequence complete. Please provide a directive.";

/// Reason used when a failed response carries no readable error message.
pub const FALLBACK_FAILURE_REASON: &str = "Connection failed";
pub const CREDENTIAL_HINT: &str = "Please check your API key in settings.";
pub const CREDENTIAL_STORED: &str = "System Updated: API Key stored.";
/// Notice when the key lives in memory only (`--env-only`).
pub const CREDENTIAL_SESSION_ONLY: &str = "System Updated: API Key set for this session only.";

pub const KEYRING_SERVICE: &str = "abz";
/// Name of the single persisted credential slot.
pub const CREDENTIAL_SLOT: &str = "nexus_api_key";
/// Overrides the persisted credential for one run without saving it.
pub const API_KEY_ENV: &str = "ABZ_API_KEY";
