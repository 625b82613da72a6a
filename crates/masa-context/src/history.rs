use masa_types::Exchange;

const HEADER: &str = "📜 Historial de conversación reciente:\n";
const TRUNCATED_MARKER: &str = " [truncado]";

/// Renders the tail of a conversation for inclusion in the prompt.
///
/// Every length here is counted in characters, never bytes, so accented
/// text and emoji are never split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub max_exchanges: usize,
    pub max_chars: usize,
    pub response_preview: usize,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            max_exchanges: 5,
            max_chars: 1000,
            response_preview: 200,
        }
    }
}

impl HistoryWindow {
    pub fn new(max_exchanges: usize, max_chars: usize) -> Self {
        Self {
            max_exchanges,
            max_chars,
            ..Self::default()
        }
    }

    /// The exchanges that would be rendered, oldest first
    pub fn recent<'a>(&self, exchanges: &'a [Exchange]) -> &'a [Exchange] {
        let start = exchanges.len().saturating_sub(self.max_exchanges);
        &exchanges[start..]
    }

    pub fn render(&self, exchanges: &[Exchange]) -> String {
        let recent = self.recent(exchanges);
        if recent.is_empty() {
            return String::new();
        }

        let mut context = String::from(HEADER);
        for (i, exchange) in recent.iter().enumerate() {
            let (preview, cut) = take_chars(&exchange.response, self.response_preview);
            context.push_str(&format!(
                "{}. Usuario: {}\n   Asistente: {}{}\n",
                i + 1,
                exchange.query,
                preview,
                if cut { "..." } else { "" }
            ));
        }

        match take_chars(&context, self.max_chars) {
            (head, true) => format!("{}{}", head, TRUNCATED_MARKER),
            (_, false) => context,
        }
    }
}

/// First `n` characters of `s`, and whether anything was dropped.
fn take_chars(s: &str, n: usize) -> (&str, bool) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => (&s[..idx], true),
        None => (s, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(query: &str, response: &str) -> Exchange {
        Exchange::new("user_1", query, response, vec![])
    }

    #[test]
    fn test_empty_history_renders_nothing() {
        assert_eq!(HistoryWindow::default().render(&[]), "");
    }

    #[test]
    fn test_render_format() {
        let rendered = HistoryWindow::default().render(&[
            exchange("¿Tienen cestas de ratán?", "¡Sí! 🍞"),
            exchange("¿De qué tamaño?", "500 g y 1 kg"),
        ]);
        assert_eq!(
            rendered,
            "📜 Historial de conversación reciente:\n\
             1. Usuario: ¿Tienen cestas de ratán?\n   Asistente: ¡Sí! 🍞\n\
             2. Usuario: ¿De qué tamaño?\n   Asistente: 500 g y 1 kg\n"
        );
    }

    #[test]
    fn test_only_last_exchanges_are_kept() {
        let exchanges: Vec<_> = (1..=7).map(|i| exchange(&format!("q{}", i), "r")).collect();
        let window = HistoryWindow::default();
        let rendered = window.render(&exchanges);
        assert!(!rendered.contains("q2"));
        assert!(rendered.contains("1. Usuario: q3"));
        assert!(rendered.contains("5. Usuario: q7"));
        assert_eq!(window.recent(&exchanges).len(), 5);
    }

    #[test]
    fn test_long_responses_are_previewed() {
        let response = "á".repeat(250);
        let rendered = HistoryWindow::default().render(&[exchange("q", &response)]);
        let expected = format!("Asistente: {}...\n", "á".repeat(200));
        assert!(rendered.ends_with(&expected));
    }

    #[test]
    fn test_truncation_is_char_safe() {
        let exchanges: Vec<_> = (0..5).map(|_| exchange(&"ñ".repeat(150), &"😊".repeat(150))).collect();
        let rendered = HistoryWindow::default().render(&exchanges);
        assert!(rendered.ends_with(" [truncado]"));
        assert_eq!(rendered.chars().count(), 1000 + " [truncado]".chars().count());
    }
}
