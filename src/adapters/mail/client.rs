//! Mail notification via Microsoft Graph
//!
//! Thin collaborator that sends the "report ready" notification from a
//! configured mailbox, optionally attaching the merged deck. Uses the same
//! client-credentials token flow as the export client, with the Graph
//! scope.

use crate::adapters::powerbi::auth::AccessToken;
use crate::config::EmailConfig;
use crate::domain::{EaselError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;
use std::path::Path;

const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Client for the notification mail
pub struct Mailer {
    http: reqwest::Client,
    config: EmailConfig,
    /// Endpoint override for tests; None means the public Graph endpoint
    base_url: Option<String>,
}

impl Mailer {
    /// Create a mailer from delivery configuration, reusing the caller's
    /// HTTP connection pool
    pub fn new(config: EmailConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config,
            base_url: None,
        }
    }

    /// Point the mailer at a different endpoint (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Send the notification mail for a finished report run
    ///
    /// # Errors
    ///
    /// Returns a delivery error when Graph rejects the request and a
    /// configuration error when no sender is configured.
    pub async fn send_report_notification(
        &self,
        token: &AccessToken,
        report_name: &str,
        attachment: Option<&Path>,
    ) -> Result<()> {
        let sender = self.config.sender.as_deref().ok_or_else(|| {
            EaselError::Configuration(
                "delivery.email.sender is required to send notifications".to_string(),
            )
        })?;

        let attachment = match attachment {
            Some(path) => Some(read_attachment(path).await?),
            None => None,
        };
        let message = notification_message(&self.config, report_name, attachment);

        let base = self
            .base_url
            .as_deref()
            .unwrap_or(GRAPH_BASE_URL)
            .trim_end_matches('/');
        let url = format!("{base}/users/{sender}/sendMail");

        tracing::info!(
            recipients = self.config.recipients.len(),
            report = %report_name,
            "Sending notification mail"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.as_str())
            .json(&message)
            .send()
            .await
            .map_err(|e| EaselError::Delivery(format!("sendMail request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EaselError::Delivery(format!(
                "sendMail returned {status}: {body}"
            )));
        }

        tracing::info!("Notification mail accepted");

        Ok(())
    }
}

/// Read a file into an attachment payload (name + base64 content)
async fn read_attachment(path: &Path) -> Result<(String, String)> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| EaselError::Io(format!("Failed to read {}: {e}", path.display())))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.pptx".to_string());
    Ok((name, BASE64.encode(bytes)))
}

/// Build the Graph sendMail body
fn notification_message(
    config: &EmailConfig,
    report_name: &str,
    attachment: Option<(String, String)>,
) -> serde_json::Value {
    let recipients: Vec<serde_json::Value> = config
        .recipients
        .iter()
        .map(|address| json!({"emailAddress": {"address": address}}))
        .collect();

    let mut message = json!({
        "subject": config.subject,
        "body": {
            "contentType": "HTML",
            "content": format!(
                "<p>The report <b>{report_name}</b> has been generated and is ready.</p>"
            ),
        },
        "toRecipients": recipients,
    });

    if let Some((name, content_bytes)) = attachment {
        message["attachments"] = json!([{
            "@odata.type": "#microsoft.graph.fileAttachment",
            "name": name,
            "contentType":
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "contentBytes": content_bytes,
        }]);
    }

    json!({"message": message, "saveToSentItems": false})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            sender: Some("reports@example.org".to_string()),
            recipients: vec!["a@example.org".to_string(), "b@example.org".to_string()],
            subject: "Report ready".to_string(),
            attach_report: false,
        }
    }

    #[test]
    fn test_notification_message_recipients() {
        let message = notification_message(&mail_config(), "Full Report", None);

        let recipients = message["message"]["toRecipients"].as_array().unwrap();
        assert_eq!(recipients.len(), 2);
        assert_eq!(
            recipients[0]["emailAddress"]["address"],
            "a@example.org"
        );
        assert_eq!(message["message"]["subject"], "Report ready");
        assert!(message["message"].get("attachments").is_none());
    }

    #[test]
    fn test_notification_message_with_attachment() {
        let message = notification_message(
            &mail_config(),
            "Full Report",
            Some(("Full Report.pptx".to_string(), "QUJD".to_string())),
        );

        let attachments = message["message"]["attachments"].as_array().unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0]["name"], "Full Report.pptx");
        assert_eq!(attachments[0]["contentBytes"], "QUJD");
    }

    #[tokio::test]
    async fn test_send_report_notification() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/users/reports@example.org/sendMail")
            .match_header("authorization", "Bearer graph-token")
            .with_status(202)
            .create_async()
            .await;

        let mailer =
            Mailer::new(mail_config(), reqwest::Client::new()).with_base_url(server.url());
        mailer
            .send_report_notification(&AccessToken::for_tests("graph-token"), "Full Report", None)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_rejection_is_delivery_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock1 = server
            .mock("POST", "/users/reports@example.org/sendMail")
            .with_status(403)
            .with_body("insufficient privileges")
            .create_async()
            .await;

        let mailer =
            Mailer::new(mail_config(), reqwest::Client::new()).with_base_url(server.url());
        let result = mailer
            .send_report_notification(&AccessToken::for_tests("graph-token"), "Full Report", None)
            .await;

        match result {
            Err(EaselError::Delivery(message)) => {
                assert!(message.contains("insufficient privileges"));
            }
            other => panic!("expected delivery error, got {other:?}"),
        }
    }
}
