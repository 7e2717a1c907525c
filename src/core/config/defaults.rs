//! Built-in defaults for every optional config key.

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_TITLE: &str = "SEGES-GPT \u{1F33B}";
pub const DEFAULT_WELCOME: &str = "Velkommen til SEGES-GPT - en chatbot der kan besvare spørgsmål<br>om indholdet i artikler på Landsbrugsinfo.dk.";
pub const DEFAULT_STYLESHEET: &str = "style.css";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60 * 12;

pub const DEFAULT_AGENT_ENDPOINT: &str = "https://adb-3134335201692067.7.azuredatabricks.net/serving-endpoints/agents_raw_dev-segesgpt-SEGESGPTdev/invocations";

pub const DEFAULT_CHROMA_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_COLLECTION: &str = "landsforsoeg";
pub const DEFAULT_N_RESULTS: usize = 5;
pub const DEFAULT_CHAT_MODEL: &str = "gpt4";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_API_VERSION: &str = "2024-05-01-preview";

pub(crate) fn host() -> String {
    DEFAULT_HOST.to_string()
}

pub(crate) fn port() -> u16 {
    DEFAULT_PORT
}

pub(crate) fn title() -> String {
    DEFAULT_TITLE.to_string()
}

pub(crate) fn welcome() -> String {
    DEFAULT_WELCOME.to_string()
}

pub(crate) fn stylesheet() -> String {
    DEFAULT_STYLESHEET.to_string()
}

pub(crate) fn timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

pub(crate) fn session_idle_secs() -> u64 {
    DEFAULT_SESSION_IDLE_SECS
}

pub(crate) fn agent_endpoint() -> String {
    DEFAULT_AGENT_ENDPOINT.to_string()
}

pub(crate) fn chroma_url() -> String {
    DEFAULT_CHROMA_URL.to_string()
}

pub(crate) fn collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

pub(crate) fn n_results() -> usize {
    DEFAULT_N_RESULTS
}

pub(crate) fn chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

pub(crate) fn embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

pub(crate) fn api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}
