use anyhow::Result;
use chrono::NaiveDate;
use serial_test::serial;
use tempfile::TempDir;

use campuswallet::amount::Amount;
use campuswallet::database::models::{
    BudgetLimits, Category, Direction, Month, NewTransaction, NewUser, NotificationDraft,
    NotificationKind, TransactionFilter, TransactionStatus, UserProfile,
};
use campuswallet::database::DatabaseOperations;
use campuswallet::error::LedgerError;
use campuswallet::ledger::{
    BudgetStore, NotificationInbox, NotificationSink, ProfileStore, TransactionRecorder,
    WalletStore,
};

// The directory must outlive the connection.
async fn create_test_db() -> Result<(TempDir, DatabaseOperations)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("wallet.db");
    let db = DatabaseOperations::new(path.to_str().unwrap()).await?;
    Ok((dir, db))
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        full_name: "Test Student".to_string(),
        student_id: "201912345".to_string(),
        contact_number: "01711000000".to_string(),
        pin: "12345".to_string(),
    }
}

async fn register(db: &DatabaseOperations, username: &str) -> Result<UserProfile> {
    Ok(db.register_user(&new_user(username)).await?)
}

fn entry(cents: i64, direction: Direction, category: Category, date: Option<NaiveDate>) -> NewTransaction {
    NewTransaction {
        amount: Amount::from_cents(cents),
        direction,
        category,
        detail: None,
        description: String::new(),
        date,
        external_ref: None,
    }
}

fn day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

#[tokio::test]
#[serial]
async fn test_registration_creates_empty_wallet() -> Result<()> {
    let (_dir, db) = create_test_db().await?;

    let profile = register(&db, "rahim").await?;
    assert_eq!(profile.id.len(), 32);
    assert_eq!(profile.username, "rahim");

    let wallet = db.get_balance(&profile.id).await?;
    assert_eq!(wallet.balance, Amount::ZERO);
    assert_eq!(wallet.user_id, profile.id);

    let found = db.find_profile_by_username("rahim").await?;
    assert_eq!(found.id, profile.id);
    assert_eq!(db.get_profile(&profile.id).await?.pin, "12345");

    println!("✅ Registration test passed");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_registration_rejects_bad_input() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    register(&db, "rahim").await?;

    let duplicate = db.register_user(&new_user("rahim")).await;
    assert!(matches!(duplicate, Err(LedgerError::InvalidInput { .. })));

    let mut short_pin = new_user("karim");
    short_pin.pin = "1234".to_string();
    assert!(matches!(
        db.register_user(&short_pin).await,
        Err(LedgerError::InvalidInput { .. })
    ));

    let mut bad_student_id = new_user("karim");
    bad_student_id.student_id = "12345".to_string();
    assert!(db.register_user(&bad_student_id).await.is_err());

    assert!(matches!(
        db.find_profile_by_username("karim").await,
        Err(LedgerError::NotFound { entity: "User", .. })
    ));
    assert!(matches!(
        db.get_profile("missing").await,
        Err(LedgerError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_adjust_balance() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    let user = register(&db, "rahim").await?;

    let wallet = db
        .adjust_balance(&user.id, Amount::from_cents(10_000), Direction::Credit)
        .await?;
    assert_eq!(wallet.balance, Amount::from_cents(10_000));

    let wallet = db
        .adjust_balance(&user.id, Amount::from_cents(3_000), Direction::Debit)
        .await?;
    assert_eq!(wallet.balance, Amount::from_cents(7_000));

    // Draining to exactly zero is allowed.
    let wallet = db
        .adjust_balance(&user.id, Amount::from_cents(7_000), Direction::Debit)
        .await?;
    assert_eq!(wallet.balance, Amount::ZERO);

    println!("✅ Balance adjustment test passed");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_insufficient_funds_leaves_balance_unchanged() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    let user = register(&db, "rahim").await?;
    db.adjust_balance(&user.id, Amount::from_cents(2_000), Direction::Credit)
        .await?;

    let err = db
        .adjust_balance(&user.id, Amount::from_cents(5_000), Direction::Debit)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds { available, requested }
            if available == Amount::from_cents(2_000) && requested == Amount::from_cents(5_000)
    ));
    assert_eq!(db.get_balance(&user.id).await?.balance, Amount::from_cents(2_000));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_adjust_balance_rejections() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    let user = register(&db, "rahim").await?;

    assert!(matches!(
        db.adjust_balance(&user.id, Amount::ZERO, Direction::Credit).await,
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert!(matches!(
        db.adjust_balance(&user.id, Amount::from_cents(-500), Direction::Debit).await,
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert!(matches!(
        db.adjust_balance("ghost", Amount::from_cents(100), Direction::Credit).await,
        Err(LedgerError::WalletNotFound { .. })
    ));
    assert!(matches!(db.get_balance("ghost").await, Err(LedgerError::WalletNotFound { .. })));

    db.adjust_balance(&user.id, Amount::MAX, Direction::Credit).await?;
    assert!(matches!(
        db.adjust_balance(&user.id, Amount::from_cents(1), Direction::Credit).await,
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert_eq!(db.get_balance(&user.id).await?.balance, Amount::MAX);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_debits_never_overdraw() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    let user = register(&db, "rahim").await?;
    db.adjust_balance(&user.id, Amount::from_cents(10_000), Direction::Credit)
        .await?;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let db = db.clone();
        let user_id = user.id.clone();
        handles.push(tokio::spawn(async move {
            db.adjust_balance(&user_id, Amount::from_cents(1_000), Direction::Debit)
                .await
        }));
    }

    let mut succeeded = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await? {
            Ok(wallet) => {
                assert!(wallet.balance >= Amount::ZERO);
                succeeded += 1;
            }
            Err(LedgerError::InsufficientFunds { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(rejected, 10);
    assert_eq!(db.get_balance(&user.id).await?.balance, Amount::ZERO);

    println!("✅ Concurrent debit test passed");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_record_and_list_transactions() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    let user = register(&db, "rahim").await?;

    db.record(&user.id, &entry(50_000, Direction::Credit, Category::TopUp, day(2024, 9, 1)))
        .await?;
    db.record(&user.id, &entry(3_000, Direction::Debit, Category::Canteen, day(2024, 9, 3)))
        .await?;
    db.record(&user.id, &entry(12_000, Direction::Debit, Category::Library, day(2024, 9, 2)))
        .await?;
    db.record(&user.id, &entry(4_500, Direction::Debit, Category::Canteen, day(2024, 10, 1)))
        .await?;

    let all = db.list(&user.id, &TransactionFilter::default()).await?;
    assert_eq!(all.len(), 4);
    let dates: Vec<_> = all.iter().map(|t| t.date).collect();
    assert_eq!(
        dates,
        vec![
            day(2024, 10, 1).unwrap(),
            day(2024, 9, 3).unwrap(),
            day(2024, 9, 2).unwrap(),
            day(2024, 9, 1).unwrap()
        ]
    );
    assert_eq!(db.count_for(&user.id).await?, 4);

    let canteen = db.list(&user.id, &TransactionFilter::category(Category::Canteen)).await?;
    assert_eq!(canteen.len(), 2);
    assert!(canteen.iter().all(|t| t.category == Category::Canteen));

    let september = Month::new(2024, 9).unwrap();
    let in_september = db.list(&user.id, &TransactionFilter::month(september)).await?;
    assert_eq!(in_september.len(), 3);

    let debits = TransactionFilter {
        direction: Some(Direction::Debit),
        ..TransactionFilter::default()
    };
    assert_eq!(db.list(&user.id, &debits).await?.len(), 3);

    let page = TransactionFilter {
        limit: Some(2),
        offset: Some(1),
        ..TransactionFilter::default()
    };
    let page = db.list(&user.id, &page).await?;
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].date, day(2024, 9, 3).unwrap());

    let skip_only = TransactionFilter {
        offset: Some(3),
        ..TransactionFilter::default()
    };
    assert_eq!(db.list(&user.id, &skip_only).await?.len(), 1);

    // Recording never touches the wallet.
    assert_eq!(db.get_balance(&user.id).await?.balance, Amount::ZERO);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_record_defaults_and_status() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    let user = register(&db, "rahim").await?;

    let mut card_top_up = entry(50_000, Direction::Credit, Category::TopUp, None);
    card_top_up.external_ref = Some("pi_3Nabc".to_string());
    let pending = db.record(&user.id, &card_top_up).await?;
    assert_eq!(pending.status, TransactionStatus::Pending);
    assert_eq!(pending.external_ref.as_deref(), Some("pi_3Nabc"));
    assert_eq!(pending.date, chrono::Utc::now().date_naive());

    let mut other = entry(700, Direction::Debit, Category::Other, None);
    other.detail = Some("Photocopy".to_string());
    let completed = db.record(&user.id, &other).await?;
    assert_eq!(completed.status, TransactionStatus::Completed);
    assert_eq!(completed.detail.as_deref(), Some("Photocopy"));
    assert!(completed.id > pending.id);

    assert!(matches!(
        db.record(&user.id, &entry(0, Direction::Debit, Category::Lab, None)).await,
        Err(LedgerError::InvalidAmount { .. })
    ));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_sum_by_category() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    let user = register(&db, "rahim").await?;
    let other_user = register(&db, "karim").await?;

    db.record(&user.id, &entry(3_000, Direction::Debit, Category::Canteen, day(2024, 9, 1)))
        .await?;
    db.record(&user.id, &entry(2_050, Direction::Debit, Category::Canteen, day(2024, 9, 30)))
        .await?;
    db.record(&user.id, &entry(9_900, Direction::Debit, Category::Lab, day(2024, 9, 15)))
        .await?;
    // Credits, other months and other users are excluded.
    db.record(&user.id, &entry(50_000, Direction::Credit, Category::TopUp, day(2024, 9, 2)))
        .await?;
    db.record(&user.id, &entry(1_000, Direction::Debit, Category::Canteen, day(2024, 10, 1)))
        .await?;
    db.record(&other_user.id, &entry(8_000, Direction::Debit, Category::Canteen, day(2024, 9, 5)))
        .await?;

    let september = Month::new(2024, 9).unwrap();
    let totals = db.sum_by_category(&user.id, september).await?;
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[&Category::Canteen], Amount::from_cents(5_050));
    assert_eq!(totals[&Category::Lab], Amount::from_cents(9_900));
    assert!(!totals.contains_key(&Category::TopUp));

    let again = db.sum_by_category(&user.id, september).await?;
    assert_eq!(totals, again);

    let empty = db.sum_by_category(&user.id, Month::new(2024, 8).unwrap()).await?;
    assert!(empty.is_empty());
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_budget_upsert() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    let user = register(&db, "rahim").await?;
    let month = Month::new(2024, 9).unwrap();

    assert!(db.get_budget(&user.id, month).await?.is_none());

    let first = BudgetLimits {
        canteen: Amount::from_cents(50_000),
        ..BudgetLimits::default()
    };
    let created = db.upsert_budget(&user.id, month, &first).await?;
    assert_eq!(created.month, month);
    assert_eq!(created.limits, first);

    let second = BudgetLimits {
        canteen: Amount::from_cents(40_000),
        lab: Amount::from_cents(10_000),
        ..BudgetLimits::default()
    };
    let updated = db.upsert_budget(&user.id, month, &second).await?;
    assert_eq!(updated.id, created.id);

    let stored = db.get_budget(&user.id, month).await?.unwrap();
    assert_eq!(stored.limits, second);
    assert_eq!(stored.limits.total(), Amount::from_cents(50_000));

    assert!(db
        .get_budget(&user.id, Month::new(2024, 10).unwrap())
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_notifications_inbox() -> Result<()> {
    let (_dir, db) = create_test_db().await?;
    let user = register(&db, "rahim").await?;
    let stranger = register(&db, "karim").await?;

    let draft = |title: &str| NotificationDraft {
        title: title.to_string(),
        message: "message".to_string(),
        kind: NotificationKind::Transaction,
        related_entity_id: Some("1".to_string()),
    };

    let first = db.create(&user.id, &draft("first")).await?;
    let second = db.create(&user.id, &draft("second")).await?;
    let foreign = db.create(&stranger.id, &draft("foreign")).await?;
    assert!(!first.read_status);
    assert_eq!(first.kind, NotificationKind::Transaction);

    let listed = db.list_notifications(&user.id, None).await?;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(db.unread_count(&user.id).await?, 2);

    db.mark_read(&user.id, first.id).await?;
    assert_eq!(db.unread_count(&user.id).await?, 1);
    assert_eq!(db.list_notifications(&user.id, Some(true)).await?.len(), 1);
    assert_eq!(db.list_notifications(&user.id, Some(false)).await?[0].id, second.id);

    assert!(matches!(
        db.mark_read(&user.id, foreign.id).await,
        Err(LedgerError::NotFound { entity: "Notification", .. })
    ));
    assert!(db.mark_read(&user.id, 9_999).await.is_err());

    assert_eq!(db.mark_all_read(&user.id).await?, 1);
    assert_eq!(db.unread_count(&user.id).await?, 0);

    assert_eq!(db.delete_all(&user.id).await?, 2);
    assert!(db.list_notifications(&user.id, None).await?.is_empty());
    assert_eq!(db.unread_count(&stranger.id).await?, 1);
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_data_survives_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("wallet.db");
    let path = path.to_str().unwrap();

    let user_id = {
        let db = DatabaseOperations::new(path).await?;
        let user = register(&db, "rahim").await?;
        db.adjust_balance(&user.id, Amount::from_cents(12_345), Direction::Credit)
            .await?;
        user.id
    };

    let db = DatabaseOperations::new(path).await?;
    assert_eq!(db.get_balance(&user_id).await?.balance, Amount::from_cents(12_345));
    assert_eq!(db.find_profile_by_username("rahim").await?.id, user_id);
    Ok(())
}
