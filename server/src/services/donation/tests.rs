use crate::{
    action::Decision,
    campaign::Campaign,
    config::CampaignConfig,
    messenger::{Keyboard, MessageRef, MockMessenger},
    notify::Notifier,
    services::donation::{DonationService, DonationServiceImpl, Donor},
    session::SessionStore,
    telegram,
};
use chrono::Utc;
use donation_status::Code;
use donation_storage::{models::donation::DonationRow, DonationStatus, Error};
use donation_storage_mocks::*;
use mockall::Sequence;
use rust_decimal::Decimal;
use std::sync::Arc;

const ADMIN_ID: i64 = 1000;
const DONOR_ID: i64 = 42;

type TestService = DonationServiceImpl<MockDatabaseClient, MockStore, MockStore, MockMessenger>;

fn campaign(photo_url: Option<&str>) -> Arc<Campaign> {
    Arc::new(
        Campaign::from_config(&CampaignConfig {
            title: "Air conditioner".to_string(),
            description: String::new(),
            target: Decimal::new(1000, 0),
            currency: "GEL".to_string(),
            symbol: Some("₾".to_string()),
            photo_url: photo_url.map(str::to_string),
            accounts: Vec::new(),
            bar_length: 10,
        })
        .expect("valid campaign"),
    )
}

fn service(
    database: MockDatabaseClient,
    messenger: MockMessenger,
    sessions: Arc<SessionStore>,
    campaign: Arc<Campaign>,
) -> TestService {
    let notifier = Notifier::new(Arc::new(messenger), campaign.unit().clone());
    DonationServiceImpl::new(Arc::new(database), notifier, campaign, sessions, ADMIN_ID)
}

fn donor() -> Donor {
    Donor {
        user_id: DONOR_ID,
        username: Some("donor".to_string()),
    }
}

fn donation(donation_id: i64, status: DonationStatus) -> DonationRow {
    DonationRow {
        donation_id,
        user_id: DONOR_ID,
        amount: Decimal::new(150, 0),
        status,
        create_time: Utc::now(),
    }
}

fn admin_alert() -> MessageRef {
    MessageRef {
        chat_id: ADMIN_ID,
        message_id: 77,
    }
}

fn sent(chat_id: i64) -> Result<MessageRef, telegram::Error> {
    Ok(MessageRef {
        chat_id,
        message_id: 1,
    })
}

#[tokio::test]
async fn start_posts_campaign_with_progress() -> Result<(), anyhow::Error> {
    let mut database = MockDatabaseClient::new();
    database.expect_on_demand().times(1).returning(|| {
        let mut store = MockStore::new();
        store
            .expect_total_confirmed()
            .times(1)
            .returning(|| Ok(Decimal::new(250, 0)));
        store
    });

    let mut messenger = MockMessenger::new();
    let mut seq = Sequence::new();
    messenger
        .expect_send_photo()
        .withf(|chat_id, photo| *chat_id == DONOR_ID && photo == "https://example.com/banner.jpg")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|chat_id, _| sent(chat_id));
    messenger
        .expect_send_text()
        .withf(|chat_id, text, keyboard| {
            *chat_id == DONOR_ID
                && text.contains("[▓▓░░░░░░░░] 25%  Raised: 250.00 ₾ of 1000.00 ₾")
                && keyboard.as_ref() == Some(&Keyboard::campaign())
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|chat_id, _, _| sent(chat_id));

    let service = service(
        database,
        messenger,
        Arc::new(SessionStore::default()),
        campaign(Some("https://example.com/banner.jpg")),
    );
    service.start(DONOR_ID).await?;
    Ok(())
}

#[tokio::test]
async fn refresh_edits_post_in_place() -> Result<(), anyhow::Error> {
    let mut database = MockDatabaseClient::new();
    database.expect_on_demand().times(1).returning(|| {
        let mut store = MockStore::new();
        store
            .expect_total_confirmed()
            .times(1)
            .returning(|| Ok(Decimal::new(1200, 0)));
        store
    });

    let post = MessageRef {
        chat_id: DONOR_ID,
        message_id: 5,
    };
    let mut messenger = MockMessenger::new();
    messenger
        .expect_edit_text()
        .withf(move |message, text, keyboard| {
            *message == post
                && text.contains("100%")
                && keyboard.as_ref() == Some(&Keyboard::campaign())
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let service = service(
        database,
        messenger,
        Arc::new(SessionStore::default()),
        campaign(None),
    );
    service.refresh(post).await?;
    Ok(())
}

#[tokio::test]
async fn begin_donation_awaits_amount() -> Result<(), anyhow::Error> {
    let mut database = MockDatabaseClient::new();
    database.expect_on_demand().times(1).returning(|| {
        let mut store = MockStore::new();
        store
            .expect_latest_pending_id()
            .withf(|user_id| *user_id == DONOR_ID)
            .times(1)
            .returning(|_| Ok(Some(3)));
        store
    });

    let mut messenger = MockMessenger::new();
    messenger
        .expect_send_text()
        .withf(|chat_id, text, keyboard| {
            *chat_id == DONOR_ID
                && text.contains("#3")
                && text.contains("amount")
                && keyboard.is_none()
        })
        .times(1)
        .returning(|chat_id, _, _| sent(chat_id));

    let sessions = Arc::new(SessionStore::default());
    let service = service(database, messenger, sessions.clone(), campaign(None));
    service.begin_donation(donor(), DONOR_ID).await?;

    assert!(sessions.is_awaiting_amount(DONOR_ID));
    Ok(())
}

#[tokio::test]
async fn submit_amount_creates_pending_donation() -> Result<(), anyhow::Error> {
    let mut database = MockDatabaseClient::new();
    database.expect_on_demand().times(1).returning(|| {
        let mut store = MockStore::new();
        store
            .expect_add_donation()
            .withf(|new_row| new_row.user_id == DONOR_ID && new_row.amount == Decimal::new(1505, 1))
            .times(1)
            .returning(|new_row| {
                Ok(DonationRow {
                    donation_id: 7,
                    user_id: new_row.user_id,
                    amount: new_row.amount,
                    status: DonationStatus::Pending,
                    create_time: new_row.create_time,
                })
            });
        store
    });

    let mut messenger = MockMessenger::new();
    messenger
        .expect_send_text()
        .withf(|chat_id, text, keyboard| {
            *chat_id == DONOR_ID && text.contains("#7") && keyboard.is_none()
        })
        .times(1)
        .returning(|chat_id, _, _| sent(chat_id));
    messenger
        .expect_send_text()
        .withf(|chat_id, text, keyboard| {
            *chat_id == ADMIN_ID
                && text.contains("@donor")
                && text.contains("150.50 ₾")
                && keyboard.as_ref() == Some(&Keyboard::disposition(7))
        })
        .times(1)
        .returning(|chat_id, _, _| sent(chat_id));

    let sessions = Arc::new(SessionStore::default());
    sessions.await_amount(DONOR_ID);
    let service = service(database, messenger, sessions.clone(), campaign(None));

    let donation = service
        .submit_amount(donor(), DONOR_ID, "150,5".to_string())
        .await?
        .expect("donation created");

    assert_eq!(donation.donation_id, 7);
    assert_eq!(donation.status, DonationStatus::Pending);
    assert!(!sessions.is_awaiting_amount(DONOR_ID));
    Ok(())
}

#[tokio::test]
async fn invalid_amount_keeps_awaiting() -> Result<(), anyhow::Error> {
    // No store expectations: nothing may be written.
    let database = MockDatabaseClient::new();

    let mut messenger = MockMessenger::new();
    messenger
        .expect_send_text()
        .withf(|chat_id, text, _| *chat_id == DONOR_ID && text.contains("valid amount"))
        .times(3)
        .returning(|chat_id, _, _| sent(chat_id));

    let sessions = Arc::new(SessionStore::default());
    sessions.await_amount(DONOR_ID);
    let service = service(database, messenger, sessions.clone(), campaign(None));

    for input in ["-5", "abc", "0"] {
        let status = service
            .submit_amount(donor(), DONOR_ID, input.to_string())
            .await
            .expect_err("invalid amount");
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(sessions.is_awaiting_amount(DONOR_ID));
    }
    Ok(())
}

#[tokio::test]
async fn text_is_ignored_when_not_awaiting() -> Result<(), anyhow::Error> {
    let service = service(
        MockDatabaseClient::new(),
        MockMessenger::new(),
        Arc::new(SessionStore::default()),
        campaign(None),
    );

    let donation = service
        .submit_amount(donor(), DONOR_ID, "150".to_string())
        .await?;
    assert!(donation.is_none());
    Ok(())
}

#[tokio::test]
async fn storage_failure_is_internal_and_keeps_session() -> Result<(), anyhow::Error> {
    let mut database = MockDatabaseClient::new();
    database.expect_on_demand().times(1).returning(|| {
        let mut store = MockStore::new();
        store
            .expect_add_donation()
            .times(1)
            .returning(|_| Err(Error::Other(anyhow::anyhow!("connection refused"))));
        store
    });

    let sessions = Arc::new(SessionStore::default());
    sessions.await_amount(DONOR_ID);
    let service = service(
        database,
        MockMessenger::new(),
        sessions.clone(),
        campaign(None),
    );

    let status = service
        .submit_amount(donor(), DONOR_ID, "150".to_string())
        .await
        .expect_err("storage failure");
    assert_eq!(status.code(), Code::Internal);
    assert!(sessions.is_awaiting_amount(DONOR_ID));
    Ok(())
}

#[tokio::test]
async fn non_admin_cannot_dispose() -> Result<(), anyhow::Error> {
    // No begin() expectation: the store must not be touched.
    let database = MockDatabaseClient::new();

    let mut messenger = MockMessenger::new();
    messenger
        .expect_send_text()
        .withf(|chat_id, text, _| *chat_id == DONOR_ID && text.contains("Only the admin"))
        .times(1)
        .returning(|chat_id, _, _| sent(chat_id));

    let service = service(
        database,
        messenger,
        Arc::new(SessionStore::default()),
        campaign(None),
    );

    let message = MessageRef {
        chat_id: DONOR_ID,
        message_id: 3,
    };
    let status = service
        .dispose(DONOR_ID, message, 7, Decision::Confirm)
        .await
        .expect_err("not the admin");
    assert_eq!(status.code(), Code::PermissionDenied);
    Ok(())
}

#[tokio::test]
async fn dispose_unknown_donation() -> Result<(), anyhow::Error> {
    let mut database = MockDatabaseClient::new();
    let mut txn = MockStore::new();
    txn.expect_find_donation_for_update()
        .withf(|donation_id| *donation_id == 99)
        .times(1)
        .returning(|_| Ok(None));
    // No update or commit expectations: nothing may be written.
    database.expect_begin().times(1).return_once(|| Ok(txn));

    let mut messenger = MockMessenger::new();
    messenger
        .expect_send_text()
        .withf(|chat_id, text, _| *chat_id == ADMIN_ID && text.contains("#99 does not exist"))
        .times(1)
        .returning(|chat_id, _, _| sent(chat_id));

    let service = service(
        database,
        messenger,
        Arc::new(SessionStore::default()),
        campaign(None),
    );

    let status = service
        .dispose(ADMIN_ID, admin_alert(), 99, Decision::Confirm)
        .await
        .expect_err("unknown donation");
    assert_eq!(status.code(), Code::NotFound);
    Ok(())
}

#[tokio::test]
async fn dispose_confirms_and_notifies_donor() -> Result<(), anyhow::Error> {
    let mut database = MockDatabaseClient::new();
    let mut txn = MockStore::new();

    // Transaction
    {
        let mut seq = Sequence::new();
        txn.expect_find_donation_for_update()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|donation_id| Ok(Some(donation(donation_id, DonationStatus::Pending))));
        txn.expect_update_donation_status()
            .withf(|donation_id, status| *donation_id == 7 && *status == DonationStatus::Confirmed)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|donation_id, status| Ok(Some(donation(donation_id, status))));
        txn.expect_commit()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|| Ok(()));
    }

    // Begin transaction.
    database.expect_begin().times(1).return_once(|| Ok(txn));

    let mut messenger = MockMessenger::new();
    messenger
        .expect_send_text()
        .withf(|chat_id, text, _| {
            *chat_id == DONOR_ID && text.contains("150.00 ₾") && text.contains("confirmed")
        })
        .times(1)
        .returning(|chat_id, _, _| sent(chat_id));
    // A failed edit must not undo the committed status.
    messenger
        .expect_edit_text()
        .withf(|message, text, keyboard| {
            *message == admin_alert() && text == "Request #7 confirmed." && keyboard.is_none()
        })
        .times(1)
        .returning(|_, _, _| {
            Err(telegram::Error::Api {
                code: 400,
                description: "Bad Request: message to edit not found".to_string(),
            })
        });

    let service = service(
        database,
        messenger,
        Arc::new(SessionStore::default()),
        campaign(None),
    );

    let donation = service
        .dispose(ADMIN_ID, admin_alert(), 7, Decision::Confirm)
        .await?;
    assert_eq!(donation.status, DonationStatus::Confirmed);
    assert_eq!(donation.user_id, DONOR_ID);
    Ok(())
}

#[tokio::test]
async fn dispose_twice_is_rejected_without_notifying() -> Result<(), anyhow::Error> {
    let mut database = MockDatabaseClient::new();
    let mut txn = MockStore::new();
    txn.expect_find_donation_for_update()
        .times(1)
        .returning(|donation_id| Ok(Some(donation(donation_id, DonationStatus::Confirmed))));
    database.expect_begin().times(1).return_once(|| Ok(txn));

    // Only the admin hears about it; the donor gets nothing.
    let mut messenger = MockMessenger::new();
    messenger
        .expect_send_text()
        .withf(|chat_id, text, _| *chat_id == ADMIN_ID && text.contains("#7 was already confirmed"))
        .times(1)
        .returning(|chat_id, _, _| sent(chat_id));

    let service = service(
        database,
        messenger,
        Arc::new(SessionStore::default()),
        campaign(None),
    );

    let status = service
        .dispose(ADMIN_ID, admin_alert(), 7, Decision::Reject)
        .await
        .expect_err("already decided");
    assert_eq!(status.code(), Code::FailedPrecondition);
    Ok(())
}
