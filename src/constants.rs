//! Constants for the dashboard data core
//!
//! Defaults for everything the dashboard needs live here. `DashboardConfig`
//! starts from these values and lets a few of them be overridden from the
//! environment.

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Quote currency for every market request
pub const VS_CURRENCY: &str = "usd";

/// How long a cached response stays fresh (in seconds)
pub const CACHE_TIMEOUT_SECS: u64 = 5 * 60;

/// How often the controller refreshes the current view (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// HTTP request timeout (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Number of coins requested for the list view
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Coin pinned to the top of the list
pub const FEATURED_COIN_ID: &str = "vanar-chain";

/// Ticker of the featured coin
pub const FEATURED_COIN_SYMBOL: &str = "vanry";

/// Capacity of the render update broadcast channel
pub const RENDER_CHANNEL_CAPACITY: usize = 64;

/// OpenAI chat completions endpoint
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default OpenAI model
pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Key value shipped in sample configs; treated as "no key"
pub const OPENAI_KEY_PLACEHOLDER: &str = "your-openai-api-key-here";

/// Gemini generateContent endpoint
pub const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1/models/gemini-pro:generateContent";

/// Key value shipped in sample configs; treated as "no key"
pub const GEMINI_KEY_PLACEHOLDER: &str = "your-gemini-api-key-here";

/// Completion length cap for insight requests
pub const INSIGHT_MAX_TOKENS: u32 = 150;

/// Sampling temperature for insight requests
pub const INSIGHT_TEMPERATURE: f32 = 0.7;

/// Key under which the theme preference is stored
pub const THEME_PREFERENCE_KEY: &str = "darkMode";

/// Default preferences file name
pub const PREFERENCES_FILE: &str = ".crypto-pulse-prefs.json";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "crypto-pulse-sdk/0.1.0";
