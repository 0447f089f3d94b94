//! Client constants
//!
//! Centralized location for limits, storage keys and the industry catalog
//! shared by the search service UI.

// Search parameter limits
pub const MIN_MAX_RESULTS: u32 = 10;
pub const MAX_MAX_RESULTS: u32 = 10_000;
pub const DEFAULT_MAX_RESULTS: u32 = 1_000;

// Durable credential storage keys
pub const ACCESS_TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

// Default endpoints and timings
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "risma.api";

/// Industry codes offered by the search service, with display labels.
pub const INDUSTRY_CATALOG: &[(&str, &str)] = &[
    ("233", "IT・情報通信"),
    ("210", "メーカー"),
    ("220", "商社"),
    ("221", "小売"),
    ("240", "金融"),
    ("241", "保険"),
    ("250", "不動産"),
    ("251", "建設"),
    ("260", "運輸・物流"),
    ("270", "マスコミ"),
    ("271", "広告・マーケティング"),
    ("280", "コンサルティング"),
    ("290", "人材・教育"),
    ("300", "医療・福祉"),
    ("310", "飲食・宿泊"),
    ("320", "サービス"),
    ("330", "公的機関"),
    ("999", "その他"),
];

/// Display label for an industry code; unknown codes are shown as-is.
pub fn industry_label(code: &str) -> &str {
    INDUSTRY_CATALOG
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .unwrap_or(code)
}
