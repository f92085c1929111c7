//! Integration tests for the campaign processor

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use courier_common::{
    BatchProgress, CampaignResult, MessageDraft, OutcomeSink, OutcomeStatus, Recipient,
    RecipientList, SendOutcome, StoreError, TransportConfig, ValidationError,
};
use courier_delivery::{
    BatchSettings, CampaignError, CampaignProcessor, DeliveryClient, TestTransport,
};
use courier_store::MemoryStore;
use tokio::{sync::mpsc, time::Instant};

fn config() -> TransportConfig {
    TransportConfig {
        host: "smtp.example.net".to_string(),
        port: 587,
        username: "campaigns".to_string(),
        password: "hunter2".to_string(),
        from_email: "news@example.net".to_string(),
        from_name: "Example News".to_string(),
        use_tls: true,
    }
}

fn recipients(count: usize) -> RecipientList {
    (0..count)
        .map(|i| Recipient::new(&format!("reader{i}@example.org"), None).unwrap())
        .collect::<Vec<_>>()
        .into()
}

fn draft() -> MessageDraft {
    MessageDraft {
        subject: "Autumn newsletter".to_string(),
        text: Some("Leaves are falling".to_string()),
        campaign: "autumn".to_string(),
        ..MessageDraft::default()
    }
}

fn processor(transport: &TestTransport) -> CampaignProcessor {
    let client = DeliveryClient::new().with_transport(Arc::new(transport.clone()));
    CampaignProcessor::new(Arc::new(client), BatchSettings::default())
}

#[tokio::test(start_paused = true)]
async fn test_single_recipient_has_no_pause() {
    let transport = TestTransport::new();
    let store = MemoryStore::new();
    let start = Instant::now();

    let summary = processor(&transport)
        .run(Some(&config()), &recipients(1), &draft(), &store, None)
        .await
        .unwrap();

    assert_eq!(summary.batches, 1);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.result, CampaignResult::FullSuccess);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_fifty_one_recipients_make_two_batches() {
    let transport = TestTransport::new();
    let store = MemoryStore::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let start = Instant::now();

    let summary = processor(&transport)
        .run(Some(&config()), &recipients(51), &draft(), &store, Some(tx))
        .await
        .unwrap();

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.sent, 51);
    assert_eq!(start.elapsed(), Duration::from_millis(2000));

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }

    assert_eq!(updates.len(), 51);
    assert!(updates[..50].iter().all(|u| u.batch == 0));
    assert_eq!(updates[50].batch, 1);
    assert_eq!(
        updates[50],
        BatchProgress {
            total: 51,
            batch_size: 50,
            batch: 1,
            batches: 2,
            sent: 51,
            failed: 0,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_every_recipient_attempted_exactly_once() {
    let transport = TestTransport::new()
        .fail_recipient("reader7@example.org")
        .fail_recipient("reader64@example.org")
        .fail_recipient("reader119@example.org");
    let store = MemoryStore::new();

    let summary = processor(&transport)
        .run(Some(&config()), &recipients(120), &draft(), &store, None)
        .await
        .unwrap();

    assert_eq!(summary.total, 120);
    assert_eq!(summary.sent + summary.failed, 120);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.result, CampaignResult::PartialFailure);

    let outcomes = store.outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 120);

    let mut seen: Vec<_> = outcomes.iter().map(SendOutcome::recipient).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 120);

    let mut delivered = transport.delivered();
    delivered.sort_unstable();
    delivered.dedup();
    assert_eq!(delivered.len(), 117);
}

#[tokio::test(start_paused = true)]
async fn test_counts_are_cumulative_across_batches() {
    // One failure in the first batch, none in the last
    let transport = TestTransport::new().fail_recipient("reader3@example.org");
    let store = MemoryStore::new();

    let summary = processor(&transport)
        .run(Some(&config()), &recipients(60), &draft(), &store, None)
        .await
        .unwrap();

    assert_eq!(summary.sent, 59);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.to_string(), "Campaign 'autumn' partially sent: 59 sent, 1 failed");
}

#[tokio::test(start_paused = true)]
async fn test_failure_outcome_carries_delivery_error() {
    let transport = TestTransport::new().fail_recipient("reader0@example.org");
    let store = MemoryStore::new();

    processor(&transport)
        .run(Some(&config()), &recipients(1), &draft(), &store, None)
        .await
        .unwrap();

    let outcomes = store.outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status(), OutcomeStatus::Failed);
    assert_eq!(outcomes[0].campaign(), Some("autumn"));
    assert!(
        outcomes[0]
            .error()
            .unwrap()
            .starts_with("Send failed after 2 attempts")
    );
}

#[tokio::test(start_paused = true)]
async fn test_flaky_verification_records_no_failure() {
    let transport = TestTransport::new().fail_verifications(2);
    let store = MemoryStore::new();

    let summary = processor(&transport)
        .run(Some(&config()), &recipients(1), &draft(), &store, None)
        .await
        .unwrap();

    assert_eq!(summary.failed, 0);
    assert_eq!(transport.verifies(), 3);
    assert!(store.outcomes().await.unwrap()[0].is_success());
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_server_fails_every_recipient() {
    let transport = TestTransport::new().always_fail_verification();
    let store = MemoryStore::new();

    let summary = processor(&transport)
        .run(Some(&config()), &recipients(4), &draft(), &store, None)
        .await
        .unwrap();

    assert_eq!(summary.result, CampaignResult::FullFailure);
    assert_eq!(summary.failed, 4);
    assert_eq!(transport.verifies(), 12);
    assert_eq!(transport.open_sessions(), 0);

    for outcome in store.outcomes().await.unwrap() {
        assert!(
            outcome
                .error()
                .unwrap()
                .starts_with("Connection failed after 3 attempts")
        );
    }
}

#[tokio::test]
async fn test_missing_body_rejected_before_delivery() {
    let transport = TestTransport::new();
    let store = MemoryStore::new();
    let draft = MessageDraft {
        text: None,
        html: None,
        ..draft()
    };

    let error = processor(&transport)
        .run(Some(&config()), &recipients(3), &draft, &store, None)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        CampaignError::Validation(ValidationError::MissingBody)
    ));
    assert_eq!(transport.opens(), 0);
    assert!(store.outcomes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_config_and_recipients_rejected() {
    let transport = TestTransport::new();
    let store = MemoryStore::new();

    let error = processor(&transport)
        .run(None, &recipients(3), &draft(), &store, None)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        CampaignError::Validation(ValidationError::MissingTransportConfig)
    ));

    let error = processor(&transport)
        .run(Some(&config()), &RecipientList::new(), &draft(), &store, None)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        CampaignError::Validation(ValidationError::NoRecipients)
    ));

    assert_eq!(transport.opens(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_progress_receiver_does_not_abort() {
    let transport = TestTransport::new();
    let store = MemoryStore::new();
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    let summary = processor(&transport)
        .run(Some(&config()), &recipients(5), &draft(), &store, Some(tx))
        .await
        .unwrap();

    assert_eq!(summary.sent, 5);
}

/// Sink that accepts a fixed number of outcomes and then fails
#[derive(Default)]
struct FailingSink {
    accepted: AtomicUsize,
    limit: usize,
}

#[async_trait]
impl OutcomeSink for FailingSink {
    async fn append(&self, _outcome: SendOutcome) -> Result<(), StoreError> {
        if self.accepted.fetch_add(1, Ordering::SeqCst) >= self.limit {
            Err(StoreError::Internal("disk full".to_string()))
        } else {
            Ok(())
        }
    }

    async fn outcomes(&self) -> Result<Vec<SendOutcome>, StoreError> {
        Ok(Vec::new())
    }

    async fn clear_outcomes(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_sink_failure_aborts_remaining_batches() {
    let transport = TestTransport::new();
    let sink = FailingSink {
        limit: 10,
        ..FailingSink::default()
    };

    let error = processor(&transport)
        .run(Some(&config()), &recipients(120), &draft(), &sink, None)
        .await
        .unwrap_err();

    assert!(matches!(error, CampaignError::Sink(_)));
    // Nothing beyond the first batch was attempted
    assert!(transport.sends() <= 50);
}

#[tokio::test(start_paused = true)]
async fn test_custom_batch_settings() {
    let transport = TestTransport::new();
    let store = MemoryStore::new();
    let client = DeliveryClient::new().with_transport(Arc::new(transport.clone()));
    let processor = CampaignProcessor::new(
        Arc::new(client),
        BatchSettings {
            batch_size: 4,
            batch_delay_ms: 500,
        },
    );
    let start = Instant::now();

    let summary = processor
        .run(Some(&config()), &recipients(10), &draft(), &store, None)
        .await
        .unwrap();

    assert_eq!(summary.batches, 3);
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
}
