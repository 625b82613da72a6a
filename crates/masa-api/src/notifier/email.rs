use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use masa_types::{ContactInfo, Priority, SupportTicket};

use super::TicketNotifier;
use crate::config::EmailConfig;

/// Subject and plain-text body of one outgoing mail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

/// Mails new tickets to the support inbox and, when the customer left an
/// address, a confirmation to the customer.
pub struct EmailNotifier<T = AsyncSmtpTransport<Tokio1Executor>> {
    transport: T,
    sender: Mailbox,
    team: Mailbox,
    send_confirmation: bool,
}

impl EmailNotifier {
    /// SMTP with STARTTLS and login. No connection is made until the first send.
    pub fn smtp(config: &EmailConfig, username: &str, password: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(config.smtp_server.trim())
            .with_context(|| format!("Invalid SMTP server: {}", config.smtp_server))?
            .port(config.smtp_port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .timeout(Some(Duration::from_secs(15)))
            .build();

        Ok(Self::with_transport(transport, &config.sender, &config.recipient)?
            .with_confirmation(config.send_confirmation))
    }
}

impl<T> EmailNotifier<T> {
    pub fn with_transport(transport: T, sender: &str, team: &str) -> Result<Self> {
        Ok(Self {
            transport,
            sender: sender.trim().parse().context("Invalid support email sender")?,
            team: team.trim().parse().context("Invalid support email recipient")?,
            send_confirmation: true,
        })
    }

    pub fn with_confirmation(mut self, enabled: bool) -> Self {
        self.send_confirmation = enabled;
        self
    }

    fn compose(&self, to: Mailbox, reply_to: Option<Mailbox>, draft: EmailDraft) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(draft.subject)
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to);
        }
        builder.body(draft.body).context("Failed to build support email")
    }
}

#[async_trait]
impl<T> TicketNotifier for EmailNotifier<T>
where
    T: AsyncTransport + Send + Sync,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    async fn notify(&self, ticket: &SupportTicket) -> Result<()> {
        let customer: Option<Mailbox> = ticket
            .contact_info
            .email()
            .and_then(|address| address.parse().ok());

        let message = self.compose(self.team.clone(), customer.clone(), team_draft(ticket))?;
        self.transport
            .send(message)
            .await
            .context("Failed to email the support team")?;
        tracing::info!(ticket_id = %ticket.ticket_id, "Support ticket emailed to the team");

        if let (true, Some(customer)) = (self.send_confirmation, customer) {
            let message = self.compose(customer, Some(self.team.clone()), confirmation_draft(ticket))?;
            self.transport
                .send(message)
                .await
                .context("Failed to email the ticket confirmation")?;
            tracing::info!(ticket_id = %ticket.ticket_id, "Ticket confirmation emailed to the customer");
        }
        Ok(())
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Alta => "alta",
        Priority::Media => "media",
        Priority::Baja => "baja",
    }
}

/// Mail for the support inbox: ticket header, contact and the full conversation.
pub fn team_draft(ticket: &SupportTicket) -> EmailDraft {
    let mut body = String::from("Nuevo ticket de soporte creado:\n\n");
    body.push_str(&format!("ID: {}\n", ticket.ticket_id));
    body.push_str(&format!("Fecha: {}\n", ticket.created_at.format("%Y-%m-%d %H:%M:%S UTC")));
    body.push_str(&format!("Prioridad: {}\n", priority_label(ticket.priority)));
    body.push_str(&format!("Razón: {}\n", ticket.reason));
    body.push_str(&format!("Sesión: {}\n\n", ticket.session_id));
    body.push_str(&format!("Información de contacto:\n{}\n\n", ticket.contact_info));

    body.push_str("Historial de conversación:\n");
    for (i, exchange) in ticket.conversation.iter().enumerate() {
        body.push_str(&format!(
            "{}. Usuario: {}\n   Asistente: {}\n\n",
            i + 1,
            exchange.query,
            exchange.response
        ));
    }

    body.push_str(&format!("Última consulta: {}\n", ticket.query));
    body.push_str(&format!("Última respuesta: {}\n\n", ticket.last_response));
    body.push_str("Por favor, atiende este ticket lo antes posible.\n");

    EmailDraft {
        subject: format!(
            "[{}] Nuevo ticket de soporte - {}",
            priority_label(ticket.priority).to_uppercase(),
            ticket.ticket_id
        ),
        body,
    }
}

/// Acknowledgement for the customer.
pub fn confirmation_draft(ticket: &SupportTicket) -> EmailDraft {
    let greeting = match &ticket.contact_info {
        ContactInfo::Structured(details) if !details.name.trim().is_empty() => {
            format!("Hola {}:", details.name.trim())
        }
        _ => "Hola:".to_string(),
    };

    let body = format!(
        "{greeting}\n\n\
         Hemos recibido tu solicitud de soporte.\n\n\
         Número de ticket: {id}\n\
         Prioridad: {priority}\n\n\
         Te contactaremos en un plazo máximo de 24 horas hábiles. Si necesitas \
         agregar información, responde a este correo mencionando tu número de ticket.\n\n\
         Gracias por tu paciencia,\n\
         Equipo de Masa Madre Monterrey\n",
        id = ticket.ticket_id,
        priority = priority_label(ticket.priority),
    );

    EmailDraft {
        subject: "Confirmación de tu solicitud de soporte - Masa Madre Monterrey".to_string(),
        body,
    }
}
