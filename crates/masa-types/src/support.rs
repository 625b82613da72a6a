use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::Exchange;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContactError {
    #[error("Se requiere información de contacto")]
    Missing,

    #[error("Información de contacto inválida: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContactDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// How the customer wants to be reached.
///
/// The widget may send a single free-text field ("ana@correo.com") or a
/// structured form; structured forms are validated field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ContactInfo {
    Structured(ContactDetails),
    Text(String),
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
    })
}

impl ContactInfo {
    /// Check the contact info, collecting every failed rule.
    pub fn validate(&self) -> Result<(), ContactError> {
        match self {
            ContactInfo::Text(text) => {
                if text.trim().is_empty() {
                    Err(ContactError::Missing)
                } else {
                    Ok(())
                }
            }
            ContactInfo::Structured(details) => {
                let errors = details.validation_errors();
                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(ContactError::Invalid(errors))
                }
            }
        }
    }

    /// Address the customer can be written to, if one was given
    pub fn email(&self) -> Option<&str> {
        let candidate = match self {
            ContactInfo::Text(text) => text.trim(),
            ContactInfo::Structured(d) => d.email.trim(),
        };
        email_regex().is_match(candidate).then_some(candidate)
    }

    pub fn is_blank(&self) -> bool {
        match self {
            ContactInfo::Text(text) => text.trim().is_empty(),
            ContactInfo::Structured(d) => {
                d.name.trim().is_empty() && d.email.trim().is_empty() && d.phone.trim().is_empty()
            }
        }
    }
}

impl std::fmt::Display for ContactInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactInfo::Text(text) => f.write_str(text.trim()),
            ContactInfo::Structured(d) => {
                write!(f, "{} <{}>, tel. {}", d.name.trim(), d.email.trim(), d.phone.trim())
            }
        }
    }
}

impl ContactDetails {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let name_len = self.name.trim().chars().count();
        if name_len < 2 {
            errors.push("El nombre debe tener al menos 2 caracteres".to_string());
        } else if name_len > 100 {
            errors.push("El nombre es demasiado largo".to_string());
        }

        if !email_regex().is_match(self.email.trim()) {
            errors.push("El formato del email no es válido".to_string());
        }

        let digits: String = self
            .phone
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
            .collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            errors.push("El teléfono solo debe contener números".to_string());
        } else if digits.len() < 10 {
            errors.push("El teléfono debe tener al menos 10 dígitos".to_string());
        } else if digits.len() > 15 {
            errors.push("El teléfono es demasiado largo".to_string());
        }

        errors
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Alta,
    #[default]
    Media,
    Baja,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Abierto,
    EnProceso,
    Cerrado,
}

/// Escalation of a conversation to a human representative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SupportTicket {
    pub ticket_id: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub query: String,
    pub last_response: String,
    pub conversation: Vec<Exchange>,
    pub contact_info: ContactInfo,
    pub priority: Priority,
    pub reason: String,
    pub status: TicketStatus,
}

impl SupportTicket {
    /// Open a ticket for a session. `conversation` must hold at least one
    /// exchange; the last one becomes the ticket's query/response.
    pub fn open(
        session_id: impl Into<String>,
        conversation: Vec<Exchange>,
        contact_info: ContactInfo,
        priority: Priority,
        reason: impl Into<String>,
    ) -> Option<Self> {
        let last = conversation.last()?;
        let now = Utc::now();
        let suffix = uuid::Uuid::new_v4().simple().to_string();

        Some(Self {
            ticket_id: format!("TICKET-{}-{}", now.timestamp(), &suffix[..8]),
            session_id: session_id.into(),
            created_at: now,
            query: last.query.clone(),
            last_response: last.response.clone(),
            contact_info,
            priority,
            reason: reason.into(),
            status: TicketStatus::Abierto,
            conversation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str, email: &str, phone: &str) -> ContactInfo {
        ContactInfo::Structured(ContactDetails {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        })
    }

    #[test]
    fn test_valid_structured_contact() {
        let contact = details("Ana López", "ana@correo.mx", "(81) 1234-5678");
        assert_eq!(contact.validate(), Ok(()));
    }

    #[test]
    fn test_invalid_structured_contact_collects_all_errors() {
        let contact = details("A", "no-es-email", "12ab");
        match contact.validate() {
            Err(ContactError::Invalid(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors[0].contains("nombre"));
                assert!(errors[1].contains("email"));
                assert!(errors[2].contains("números"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_phone_length_rules() {
        let short = details("Ana", "ana@correo.mx", "81 1234");
        let long = details("Ana", "ana@correo.mx", "1234567890123456");
        assert!(matches!(short.validate(), Err(ContactError::Invalid(e)) if e[0].contains("10 dígitos")));
        assert!(matches!(long.validate(), Err(ContactError::Invalid(e)) if e[0].contains("demasiado largo")));
    }

    #[test]
    fn test_free_text_contact() {
        assert_eq!(ContactInfo::Text("ana@correo.mx".into()).validate(), Ok(()));
        assert_eq!(ContactInfo::Text("   ".into()).validate(), Err(ContactError::Missing));
    }

    #[test]
    fn test_contact_email_lookup() {
        let structured = details("Ana", " ana@correo.mx ", "8112345678");
        assert_eq!(structured.email(), Some("ana@correo.mx"));
        assert_eq!(ContactInfo::Text("ana@correo.mx".into()).email(), Some("ana@correo.mx"));
        assert_eq!(ContactInfo::Text("8112345678".into()).email(), None);
        assert_eq!(details("Ana", "", "8112345678").email(), None);
    }

    #[test]
    fn test_contact_display() {
        let structured = details("Ana López", "ana@correo.mx", "8112345678");
        assert_eq!(structured.to_string(), "Ana López <ana@correo.mx>, tel. 8112345678");
        assert_eq!(ContactInfo::Text(" 8112345678 ".into()).to_string(), "8112345678");
    }

    #[test]
    fn test_contact_info_deserializes_both_shapes() {
        let text: ContactInfo = serde_json::from_str(r#""8112345678""#).unwrap();
        assert_eq!(text, ContactInfo::Text("8112345678".into()));

        let structured: ContactInfo =
            serde_json::from_str(r#"{"name":"Ana","email":"ana@correo.mx","phone":"8112345678"}"#).unwrap();
        assert!(matches!(structured, ContactInfo::Structured(_)));
    }

    #[test]
    fn test_ticket_uses_last_exchange() {
        let history = vec![
            Exchange::new("s1", "primera", "uno", vec![]),
            Exchange::new("s1", "segunda", "dos", vec![]),
        ];
        let ticket = SupportTicket::open(
            "s1",
            history,
            ContactInfo::Text("ana@correo.mx".into()),
            Priority::default(),
            "Solicitud de soporte humano",
        )
        .unwrap();

        assert!(ticket.ticket_id.starts_with("TICKET-"));
        assert_eq!(ticket.query, "segunda");
        assert_eq!(ticket.last_response, "dos");
        assert_eq!(ticket.priority, Priority::Media);
        assert_eq!(ticket.status, TicketStatus::Abierto);
        assert_eq!(ticket.conversation.len(), 2);
    }

    #[test]
    fn test_ticket_requires_history() {
        let ticket = SupportTicket::open("s1", vec![], ContactInfo::Text("x".into()), Priority::Baja, "r");
        assert!(ticket.is_none());
    }
}
