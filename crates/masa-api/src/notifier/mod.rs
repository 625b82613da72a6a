mod email;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use masa_types::SupportTicket;

use crate::config::Config;

pub use email::{confirmation_draft, team_draft, EmailDraft, EmailNotifier};

/// Tells the support team a ticket was opened
#[async_trait]
pub trait TicketNotifier: Send + Sync {
    async fn notify(&self, ticket: &SupportTicket) -> Result<()>;
}

/// Writes the ticket to the service log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl TicketNotifier for LogNotifier {
    async fn notify(&self, ticket: &SupportTicket) -> Result<()> {
        tracing::info!(
            ticket_id = %ticket.ticket_id,
            session_id = %ticket.session_id,
            priority = ?ticket.priority,
            exchanges = ticket.conversation.len(),
            "Support ticket opened"
        );
        Ok(())
    }
}

/// POSTs the ticket as JSON to a webhook (helpdesk, chat channel, ...)
pub struct WebhookNotifier {
    http_client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TicketNotifier for WebhookNotifier {
    async fn notify(&self, ticket: &SupportTicket) -> Result<()> {
        let response = self
            .http_client
            .post(&self.url)
            .json(ticket)
            .send()
            .await
            .context("Failed to send ticket webhook")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ticket webhook error ({}): {}", status, error_text);
        }

        tracing::info!(ticket_id = %ticket.ticket_id, "Support ticket forwarded to webhook");
        Ok(())
    }
}

/// Every configured channel, tried in order. One failing channel does not
/// keep the ticket from reaching the others.
pub struct NotifierSet {
    notifiers: Vec<Arc<dyn TicketNotifier>>,
}

impl NotifierSet {
    pub fn new(notifiers: Vec<Arc<dyn TicketNotifier>>) -> Self {
        Self { notifiers }
    }

    /// Log, plus the webhook and SMTP channels `config.support` enables
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut notifiers: Vec<Arc<dyn TicketNotifier>> = vec![Arc::new(LogNotifier)];

        if let Some(url) = &config.support.webhook_url {
            notifiers.push(Arc::new(WebhookNotifier::new(url.clone())?));
        }

        let email = &config.support.email;
        if email.is_configured() {
            if config.support_email_user.trim().is_empty() || config.support_email_password.is_empty() {
                tracing::warn!(
                    "Support email is configured but SUPPORT_EMAIL_USER / SUPPORT_EMAIL_PASSWORD are missing; tickets will not be emailed"
                );
            } else {
                tracing::info!(server = %email.smtp_server, port = email.smtp_port, "Support tickets will be emailed");
                notifiers.push(Arc::new(EmailNotifier::smtp(
                    email,
                    &config.support_email_user,
                    &config.support_email_password,
                )?));
            }
        }

        Ok(Self::new(notifiers))
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl TicketNotifier for NotifierSet {
    async fn notify(&self, ticket: &SupportTicket) -> Result<()> {
        let mut failures = Vec::new();
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(ticket).await {
                failures.push(format!("{:#}", e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "{} of {} ticket notifications failed: {}",
                failures.len(),
                self.notifiers.len(),
                failures.join("; ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masa_types::{ContactInfo, Exchange, Priority};
    use mockito::Matcher;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl TicketNotifier for Counting {
        async fn notify(&self, _ticket: &SupportTicket) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn ticket() -> SupportTicket {
        SupportTicket::open(
            "user_1",
            vec![Exchange::new("user_1", "quiero hablar con alguien", "Claro", vec![])],
            ContactInfo::Text("ana@example.com".into()),
            Priority::Media,
            "Solicitud de soporte humano desde el widget de chat",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_webhook_posts_ticket() {
        let mut server = mockito::Server::new_async().await;
        let ticket = ticket();
        let mock = server
            .mock("POST", "/hooks/support")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "ticket_id": ticket.ticket_id,
                "priority": "media",
                "status": "abierto",
                "contact_info": "ana@example.com"
            })))
            .with_status(204)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hooks/support", server.url())).unwrap();
        notifier.notify(&ticket).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hooks/support")
            .with_status(500)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hooks/support", server.url())).unwrap();
        let err = notifier.notify(&ticket()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_failing_channel_does_not_block_the_rest() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hooks/support")
            .with_status(502)
            .create_async()
            .await;

        let counting = Arc::new(Counting::default());
        let channels: Vec<Arc<dyn TicketNotifier>> = vec![
            Arc::new(WebhookNotifier::new(format!("{}/hooks/support", server.url())).unwrap()),
            counting.clone(),
        ];
        let set = NotifierSet::new(channels);

        let err = set.notify(&ticket()).await.unwrap_err();
        assert!(err.to_string().starts_with("1 of 2 ticket notifications failed"));
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_channels_follow_config() {
        let mut config = Config::default();
        assert_eq!(NotifierSet::from_config(&config).unwrap().len(), 1);

        config.support.webhook_url = Some("http://localhost:9/hooks".into());
        assert_eq!(NotifierSet::from_config(&config).unwrap().len(), 2);

        config.support.email.smtp_server = "smtp.example.com".into();
        config.support.email.sender = "bot@example.com".into();
        config.support.email.recipient = "soporte@example.com".into();
        // No credentials yet
        assert_eq!(NotifierSet::from_config(&config).unwrap().len(), 2);

        config.support_email_user = "bot@example.com".into();
        config.support_email_password = "secreto".into();
        assert_eq!(NotifierSet::from_config(&config).unwrap().len(), 3);
    }
}
