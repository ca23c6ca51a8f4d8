use std::time::Duration;

use anyhow::Context as _;
use serde::Serialize;

use crate::domain::repository::Notifier;
use crate::domain::types::{OtpCode, OtpKind};

/// Mail job accepted by the relay. Rendering and SMTP are the relay's concern.
#[derive(Debug, Serialize)]
struct MailJob<'a> {
    to: &'a str,
    kind: OtpKind,
    display_name: &'a str,
    code: &'a str,
    expires_in_minutes: i64,
}

/// Hands issued codes to an HTTP mail relay. The code is sent in the request
/// body only and is not retained here.
#[derive(Clone)]
pub struct HttpMailNotifier {
    client: reqwest::Client,
    endpoint: String,
    expires_in_minutes: i64,
}

impl HttpMailNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        ttl: chrono::Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build mail relay client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            expires_in_minutes: minutes_rounded_up(ttl),
        })
    }
}

/// A partial minute counts as a whole one, so the mail never understates validity.
fn minutes_rounded_up(ttl: chrono::Duration) -> i64 {
    let secs = ttl.num_seconds().max(0);
    (secs + 59) / 60
}

impl Notifier for HttpMailNotifier {
    async fn send(
        &self,
        identity: &str,
        code: &OtpCode,
        kind: OtpKind,
        display_name: &str,
    ) -> anyhow::Result<()> {
        let job = MailJob {
            to: identity,
            kind,
            display_name,
            code: code.expose(),
            expires_in_minutes: self.expires_in_minutes,
        };
        self.client
            .post(&self.endpoint)
            .json(&job)
            .send()
            .await
            .context("post mail job to relay")?
            .error_for_status()
            .context("mail relay rejected job")?;
        Ok(())
    }
}
