//! Heuristics the widget uses to decide when to ask for feedback.

use masa_types::DifficultySignal;

const FRUSTRATION_KEYWORDS: [&str; 10] = [
    "no entiendo",
    "repetir",
    "no funciona",
    "error",
    "mal",
    "incorrecto",
    "frustrado",
    "confundido",
    "ayuda",
    "problema",
];

const SHORT_RESPONSE_CHARS: usize = 50;
const LONG_CONVERSATION_EXCHANGES: usize = 4;

/// `history_len` counts the session's exchanges including the current one.
pub fn detect_difficulties(query: &str, response: &str, history_len: usize) -> DifficultySignal {
    let mut signals = Vec::new();

    let query = query.to_lowercase();
    if FRUSTRATION_KEYWORDS.iter().any(|k| query.contains(k)) {
        signals.push("frustration_keyword_in_query");
    }
    if response.chars().count() < SHORT_RESPONSE_CHARS {
        signals.push("short_response");
    }
    if history_len > LONG_CONVERSATION_EXCHANGES {
        signals.push("long_conversation");
    }

    if signals.is_empty() {
        DifficultySignal::none()
    } else {
        DifficultySignal {
            detected: true,
            reason: signals.join(", "),
        }
    }
}
