//! Template broadcast with a fixed pause between recipients

use std::time::Duration;

use shared::models::{CampaignRecipient, WhatsAppCampaign};
use tracing::{info, instrument, warn};

use super::{WhatsAppClient, WhatsAppError};
use crate::BoxError;

/// Anything that can deliver a template message
#[allow(async_fn_in_trait)]
pub trait TemplateSender {
    async fn send_template(
        &self,
        to: &str,
        template_name: &str,
        language: &str,
        parameters: &[String],
    ) -> Result<String, WhatsAppError>;
}

impl TemplateSender for WhatsAppClient {
    async fn send_template(
        &self,
        to: &str,
        template_name: &str,
        language: &str,
        parameters: &[String],
    ) -> Result<String, WhatsAppError> {
        WhatsAppClient::send_template(self, to, template_name, language, parameters).await
    }
}

/// Persistence of campaign progress
#[allow(async_fn_in_trait)]
pub trait CampaignStore {
    async fn mark_running(&self, campaign_id: i64) -> Result<(), BoxError>;

    async fn record_sent(
        &self,
        campaign: &WhatsAppCampaign,
        recipient: &CampaignRecipient,
        wa_message_id: &str,
    ) -> Result<(), BoxError>;

    async fn record_failed(
        &self,
        campaign: &WhatsAppCampaign,
        recipient: &CampaignRecipient,
        error: &str,
    ) -> Result<(), BoxError>;

    /// Finalize counters and mark the campaign completed
    async fn complete(&self, campaign_id: i64) -> Result<(), BoxError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CampaignTally {
    pub sent: u32,
    pub failed: u32,
}

pub struct CampaignRunner<S> {
    sender: S,
    delay: Duration,
}

impl<S: TemplateSender> CampaignRunner<S> {
    pub fn new(sender: S, delay: Duration) -> Self {
        Self { sender, delay }
    }

    /// Send to every pending recipient in order, pausing between sends.
    ///
    /// Recipients already sent or failed are skipped, so an interrupted
    /// campaign can be resumed.
    #[instrument(skip_all, fields(campaign_id = campaign.id, template = %campaign.template_name))]
    pub async fn run<R: CampaignStore>(
        &self,
        store: &R,
        campaign: &WhatsAppCampaign,
        recipients: &[CampaignRecipient],
    ) -> Result<CampaignTally, BoxError> {
        store.mark_running(campaign.id).await?;

        let mut tally = CampaignTally::default();
        let pending = recipients.iter().filter(|r| r.status == "pending");
        for (i, recipient) in pending.enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self
                .sender
                .send_template(
                    &recipient.phone,
                    &campaign.template_name,
                    &campaign.language,
                    &campaign.parameters,
                )
                .await
            {
                Ok(wa_message_id) => {
                    store.record_sent(campaign, recipient, &wa_message_id).await?;
                    tally.sent += 1;
                }
                Err(e) => {
                    warn!(phone = %recipient.phone, error = %e, "Campaign send failed");
                    store.record_failed(campaign, recipient, &e.to_string()).await?;
                    tally.failed += 1;
                }
            }
        }

        store.complete(campaign.id).await?;
        info!(sent = tally.sent, failed = tally.failed, "Campaign completed");
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeSender {
        failing: &'static str,
    }

    impl TemplateSender for FakeSender {
        async fn send_template(
            &self,
            to: &str,
            _template_name: &str,
            _language: &str,
            _parameters: &[String],
        ) -> Result<String, WhatsAppError> {
            if to == self.failing {
                return Err(WhatsAppError::Api {
                    status: 400,
                    code: Some(131026),
                    message: "Message undeliverable".into(),
                });
            }
            Ok(format!("wamid.{to}"))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        log: Mutex<Vec<String>>,
    }

    impl CampaignStore for MemoryStore {
        async fn mark_running(&self, campaign_id: i64) -> Result<(), BoxError> {
            self.log.lock().unwrap().push(format!("running {campaign_id}"));
            Ok(())
        }

        async fn record_sent(
            &self,
            _campaign: &WhatsAppCampaign,
            recipient: &CampaignRecipient,
            wa_message_id: &str,
        ) -> Result<(), BoxError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("sent {} {wa_message_id}", recipient.id));
            Ok(())
        }

        async fn record_failed(
            &self,
            _campaign: &WhatsAppCampaign,
            recipient: &CampaignRecipient,
            _error: &str,
        ) -> Result<(), BoxError> {
            self.log.lock().unwrap().push(format!("failed {}", recipient.id));
            Ok(())
        }

        async fn complete(&self, campaign_id: i64) -> Result<(), BoxError> {
            self.log.lock().unwrap().push(format!("completed {campaign_id}"));
            Ok(())
        }
    }

    fn campaign() -> WhatsAppCampaign {
        WhatsAppCampaign {
            id: 9,
            name: "Monsoon offers".into(),
            template_name: "monsoon_offer".into(),
            language: "en".into(),
            parameters: vec!["20%".into()],
            status: "pending".into(),
            total: 4,
            sent: 0,
            failed: 0,
            created_by: Some(1),
            created_at: 0,
            completed_at: None,
        }
    }

    fn recipient(id: i64, phone: &str, status: &str) -> CampaignRecipient {
        CampaignRecipient {
            id,
            campaign_id: 9,
            phone: phone.into(),
            status: status.into(),
            wa_message_id: None,
            error: None,
            sent_at: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_paces_and_records() {
        let runner = CampaignRunner::new(
            FakeSender {
                failing: "919000000002",
            },
            Duration::from_millis(1000),
        );
        let store = MemoryStore::default();
        let recipients = vec![
            recipient(1, "919000000001", "pending"),
            recipient(2, "919000000002", "pending"),
            recipient(3, "919000000003", "sent"),
            recipient(4, "919000000004", "pending"),
        ];

        let start = tokio::time::Instant::now();
        let tally = runner.run(&store, &campaign(), &recipients).await.unwrap();

        assert_eq!(tally, CampaignTally { sent: 2, failed: 1 });
        // Three sends, two pauses
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
        assert_eq!(
            *store.log.lock().unwrap(),
            vec![
                "running 9",
                "sent 1 wamid.919000000001",
                "failed 2",
                "sent 4 wamid.919000000004",
                "completed 9",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_without_pending_recipients_completes() {
        let runner = CampaignRunner::new(FakeSender { failing: "" }, Duration::ZERO);
        let store = MemoryStore::default();
        let tally = runner
            .run(&store, &campaign(), &[recipient(1, "919000000001", "failed")])
            .await
            .unwrap();
        assert_eq!(tally, CampaignTally::default());
        assert_eq!(store.log.lock().unwrap().len(), 2);
    }
}
