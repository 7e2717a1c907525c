use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;

use crate::core::config::UiConfig;
use crate::state::AppState;

/// Chat page shell; the client script drives everything through the
/// session API.
const CHAT_HTML: &str = include_str!("../../../assets/chat.html");

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(&state.config.ui, &state.stylesheet))
}

/// The title is escaped; the welcome text is trusted config and may carry
/// inline markup such as `<br>`.
pub fn render_page(ui: &UiConfig, stylesheet: &str) -> String {
    CHAT_HTML
        .replace("{{stylesheet}}", stylesheet)
        .replace("{{welcome}}", &ui.welcome)
        .replace("{{title}}", &escape_html(&ui.title))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui() -> UiConfig {
        UiConfig {
            title: "SEGES-GPT \u{1F33B}".to_string(),
            welcome: "Velkommen<br>til SEGES-GPT".to_string(),
            stylesheet: "style.css".to_string(),
        }
    }

    #[test]
    fn page_carries_title_welcome_and_stylesheet() {
        let html = render_page(&ui(), "h1 { color: darkgreen; }");

        assert!(html.contains("<title>SEGES-GPT \u{1F33B}</title>"));
        assert!(html.contains("Velkommen<br>til SEGES-GPT"));
        assert!(html.contains("h1 { color: darkgreen; }"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn title_is_escaped() {
        let mut ui = ui();
        ui.title = "<script>x</script>".to_string();

        let html = render_page(&ui, "");

        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    }
}
