mod common;

use common::Household;
use engine::{
    AccountKind, AccountScope, CategoryKind, EngineError, InviteUserCmd, MoneyCents,
    NewAccountCmd, UpdateAccountCmd, UpdateUserCmd, UserFilter, UserRole, UserStatus,
};

#[tokio::test]
async fn first_user_is_an_active_admin() {
    let h = Household::new().await;

    let admin = h.engine.user(h.family_id, h.user_id).await.unwrap();
    assert_eq!(admin.role, UserRole::Admin);
    assert_eq!(admin.status, UserStatus::Active);
    assert_eq!(admin.email, "ana@example.com");
}

#[tokio::test]
async fn emails_are_unique_ignoring_case() {
    let h = Household::new().await;

    let err = h
        .engine
        .register_family("  ANA@Example.com ", "Outra Ana")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = h
        .engine
        .register_family("not-an-email", "Sem Email")
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("email"));
}

#[tokio::test]
async fn invitation_lifecycle() {
    let h = Household::new().await;

    let invited = h
        .engine
        .invite_user(InviteUserCmd::new(
            h.user_id,
            "Carla@Example.com",
            "Carla",
            UserRole::Member,
        ))
        .await
        .unwrap();
    assert_eq!(invited.family_id, h.family_id);
    assert_eq!(invited.status, UserStatus::Invited);
    assert_eq!(invited.email, "carla@example.com");

    let active = h.engine.accept_invitation(invited.id).await.unwrap();
    assert_eq!(active.status, UserStatus::Active);
    let stored = h.engine.user(h.family_id, invited.id).await.unwrap();
    assert_eq!(stored.status, UserStatus::Active);

    // Members cannot manage users.
    let err = h
        .engine
        .invite_user(InviteUserCmd::new(
            invited.id,
            "dora@example.com",
            "Dora",
            UserRole::Member,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = h
        .engine
        .update_user(UpdateUserCmd::new(invited.id, h.user_id).status(UserStatus::Blocked))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn admin_updates_and_lists_users() {
    let h = Household::new().await;
    let member = h
        .engine
        .invite_user(InviteUserCmd::new(
            h.user_id,
            "carla@example.com",
            "Carla",
            UserRole::Member,
        ))
        .await
        .unwrap();

    let promoted = h
        .engine
        .update_user(
            UpdateUserCmd::new(h.user_id, member.id)
                .name("Carla Souza")
                .role(UserRole::Admin),
        )
        .await
        .unwrap();
    assert_eq!(promoted.name, "Carla Souza");
    assert_eq!(promoted.role, UserRole::Admin);

    let admins = h
        .engine
        .list_users(
            h.user_id,
            &UserFilter {
                role: Some(UserRole::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(admins.len(), 2);

    let by_name = h
        .engine
        .list_users(
            h.user_id,
            &UserFilter {
                name: Some("Souza".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, member.id);

    // Another family's users stay out of reach.
    let stranger = h
        .engine
        .register_family("bruno@example.com", "Bruno")
        .await
        .unwrap();
    let err = h
        .engine
        .update_user(UpdateUserCmd::new(stranger.id, member.id).name("X Y Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn new_account_uses_type_defaults() {
    let h = Household::new().await;

    let investment = h
        .engine
        .new_account(
            NewAccountCmd::new(h.family_id, "  Corretora ", AccountKind::Investment)
                .initial_balance(MoneyCents::new(250_000)),
        )
        .await
        .unwrap();
    assert_eq!(investment.name, "Corretora");
    assert_eq!(investment.icon, AccountKind::Investment.default_icon());
    assert_eq!(investment.color, AccountKind::Investment.default_color());
    assert_eq!(investment.balance, MoneyCents::new(250_000));

    let err = h
        .engine
        .new_account(NewAccountCmd::new(h.family_id, "   ", AccountKind::Checking))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn changing_initial_balance_recalculates() {
    let h = Household::new().await;
    h.engine
        .create_transaction(h.expense(2_000, common::date(2025, 1, 1), "Táxi"))
        .await
        .unwrap();

    let account = h
        .engine
        .update_account(
            UpdateAccountCmd::new(h.family_id, h.account_id)
                .initial_balance(MoneyCents::new(10_000))
                .color("#111111"),
        )
        .await
        .unwrap();
    assert_eq!(account.initial_balance, MoneyCents::new(10_000));
    assert_eq!(account.balance, MoneyCents::new(8_000));
    assert_eq!(account.color, "#111111");
    assert_eq!(account.kind, AccountKind::Checking);
}

#[tokio::test]
async fn archive_scopes_the_account_list() {
    let h = Household::new().await;
    let savings = h.second_account("Poupança").await;

    h.engine.archive_account(h.family_id, savings).await.unwrap();
    let active = h
        .engine
        .accounts(h.family_id, AccountScope::Active)
        .await
        .unwrap();
    let archived = h
        .engine
        .accounts(h.family_id, AccountScope::Archived)
        .await
        .unwrap();
    let all = h
        .engine
        .accounts(h.family_id, AccountScope::All)
        .await
        .unwrap();
    assert_eq!(active.iter().map(|a| a.id).collect::<Vec<_>>(), vec![h.account_id]);
    assert_eq!(archived.iter().map(|a| a.id).collect::<Vec<_>>(), vec![savings]);
    assert_eq!(all.len(), 2);

    let restored = h
        .engine
        .unarchive_account(h.family_id, savings)
        .await
        .unwrap();
    assert!(!restored.is_archived());
}

#[tokio::test]
async fn category_rules() {
    let h = Household::new().await;

    let err = h
        .engine
        .new_category("Transferência", CategoryKind::Transfer)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // "Mercado" exists already.
    let err = h
        .engine
        .new_category("  MERCADO ", CategoryKind::Expense)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let lazer = h
        .engine
        .new_category("Lazer", CategoryKind::Expense)
        .await
        .unwrap();
    let err = h
        .engine
        .new_category("lázer", CategoryKind::Expense)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = h
        .engine
        .archive_category(h.engine.transfer_category_id())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    h.engine.archive_category(lazer.id).await.unwrap();
    let visible = h.engine.categories(false).await.unwrap();
    assert!(visible.iter().all(|c| c.id != lazer.id));
    assert!(visible.iter().any(|c| c.is_transfer()));
    let every = h.engine.categories(true).await.unwrap();
    assert!(every.iter().any(|c| c.id == lazer.id));
}
