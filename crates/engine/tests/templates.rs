mod common;

use common::{Household, date, engine_at};
use engine::{
    EngineError, Frequency, MoneyCents, RoleFilter, TransactionFilter, TransactionRole,
    UpdateTransactionCmd,
};

#[tokio::test]
async fn monthly_template_expands_one_year_ahead() {
    let h = Household::new().await;

    let template = h
        .engine
        .create_transaction(
            h.expense(15_000, date(2025, 1, 1), "Aluguel")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();
    assert!(template.is_template());
    assert_eq!(template.date, date(2025, 1, 1));

    let instances = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap();
    let dates: Vec<_> = instances.iter().map(|tx| tx.date).collect();
    let expected: Vec<_> = (1..=12).map(|month| date(2025, month, 1)).collect();
    assert_eq!(dates, expected);

    for instance in &instances {
        assert!(!instance.is_template());
        assert_eq!(instance.parent().map(|p| p.template_id()), Some(template.id));
        assert_eq!(instance.amount, template.amount);
        assert_eq!(instance.description, "Aluguel");
    }
}

#[tokio::test]
async fn end_date_bounds_the_expansion() {
    let h = Household::new().await;

    let template = h
        .engine
        .create_transaction(
            h.expense(5_000, date(2025, 1, 10), "Academia")
                .recurring(Frequency::Quarterly)
                .end_date(date(2025, 7, 10)),
        )
        .await
        .unwrap();

    let dates: Vec<_> = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap()
        .into_iter()
        .map(|tx| tx.date)
        .collect();
    assert_eq!(dates, vec![date(2025, 1, 10), date(2025, 4, 10), date(2025, 7, 10)]);
}

#[tokio::test]
async fn end_before_start_is_rejected() {
    let h = Household::new().await;

    let err = h
        .engine
        .create_transaction(
            h.expense(5_000, date(2025, 3, 1), "Academia")
                .recurring(Frequency::Monthly)
                .end_date(date(2025, 2, 1)),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("end_date"));
    assert!(h.all_transactions().await.is_empty());
}

#[tokio::test]
async fn templates_do_not_move_the_balance() {
    let h = Household::new().await;

    h.engine
        .create_transaction(
            h.expense(1_000, date(2025, 1, 1), "Streaming")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();

    // Twelve instances count, the template itself does not.
    assert_eq!(h.balance(h.account_id).await, -12_000);
}

#[tokio::test]
async fn editing_an_instance_detaches_it() {
    let h = Household::new().await;
    let template = h
        .engine
        .create_transaction(
            h.expense(20_000, date(2025, 1, 5), "Escola")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();
    let instances = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap();

    let edited = h
        .engine
        .update_transaction(
            UpdateTransactionCmd::new(h.family_id, instances[2].id, h.user_id)
                .amount(MoneyCents::new(21_000)),
        )
        .await
        .unwrap();
    assert_eq!(edited.role, TransactionRole::OneTime);
    assert_eq!(edited.editor_id, Some(h.user_id));
    assert!(edited.edited_at.is_some());

    let moved = h
        .engine
        .update_transaction(
            UpdateTransactionCmd::new(h.family_id, instances[3].id, h.user_id)
                .date(date(2025, 4, 6)),
        )
        .await
        .unwrap();
    assert!(moved.parent().is_none());

    let remaining = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 10);
}

#[tokio::test]
async fn marking_an_instance_paid_keeps_it_attached() {
    let h = Household::new().await;
    let template = h
        .engine
        .create_transaction(
            h.expense(20_000, date(2025, 1, 5), "Escola")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();
    let instances = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap();

    let paid = h
        .engine
        .mark_as_paid(h.family_id, instances[1].id, h.user_id)
        .await
        .unwrap();
    assert!(paid.manually_effectuated());
    assert_eq!(paid.parent().map(|p| p.template_id()), Some(template.id));
}

#[tokio::test]
async fn template_edit_rebuilds_pending_instances_only() {
    let h = Household::new().await;
    let template = h
        .engine
        .create_transaction(
            h.expense(10_000, date(2025, 1, 1), "Internet")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();
    let before = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap();
    h.engine
        .mark_as_paid(h.family_id, before[1].id, h.user_id)
        .await
        .unwrap();

    h.engine
        .update_transaction(
            UpdateTransactionCmd::new(h.family_id, template.id, h.user_id)
                .amount(MoneyCents::new(12_000)),
        )
        .await
        .unwrap();

    let after = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap();
    assert_eq!(after.len(), 12);
    // January is effectuated by date and February was marked paid: both kept.
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[0].amount, MoneyCents::new(10_000));
    assert_eq!(after[1].id, before[1].id);
    assert_eq!(after[1].amount, MoneyCents::new(10_000));
    assert!(after[2..].iter().all(|tx| tx.amount == MoneyCents::new(12_000)));
    assert!(after[2..].iter().all(|tx| before.iter().all(|old| old.id != tx.id)));
}

#[tokio::test]
async fn frequency_change_reshapes_the_schedule() {
    let h = Household::new().await;
    let template = h
        .engine
        .create_transaction(
            h.expense(10_000, date(2025, 2, 1), "Seguro")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();

    h.engine
        .update_transaction(
            UpdateTransactionCmd::new(h.family_id, template.id, h.user_id)
                .frequency(Frequency::Semiannual),
        )
        .await
        .unwrap();

    let dates: Vec<_> = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap()
        .into_iter()
        .map(|tx| tx.date)
        .collect();
    assert_eq!(dates, vec![date(2025, 2, 1), date(2025, 8, 1)]);
}

#[tokio::test]
async fn recurrence_fields_only_apply_to_templates() {
    let h = Household::new().await;
    let one_time = h
        .engine
        .create_transaction(h.expense(3_000, date(2025, 1, 2), "Padaria"))
        .await
        .unwrap();

    let err = h
        .engine
        .update_transaction(
            UpdateTransactionCmd::new(h.family_id, one_time.id, h.user_id)
                .frequency(Frequency::Monthly),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("frequency"));
}

#[tokio::test]
async fn deleting_a_template_prunes_pending_instances() {
    let h = Household::new().await;
    let template = h
        .engine
        .create_transaction(
            h.expense(8_000, date(2025, 1, 1), "Condomínio")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();
    let instances = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap();
    let marked = instances[2].id;
    h.engine
        .mark_as_paid(h.family_id, marked, h.user_id)
        .await
        .unwrap();

    h.engine
        .delete_transaction(h.family_id, template.id)
        .await
        .unwrap();

    let left = h.all_transactions().await;
    let mut ids: Vec<_> = left.iter().map(|tx| tx.id).collect();
    ids.sort();
    let mut expected = vec![instances[0].id, marked];
    expected.sort();
    assert_eq!(ids, expected);
    assert!(left.iter().all(|tx| tx.role == TransactionRole::OneTime));

    let generated = h
        .engine
        .list_transactions(
            h.family_id,
            &TransactionFilter {
                role: Some(RoleFilter::Generated),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(generated.is_empty());
    assert_eq!(h.balance(h.account_id).await, -16_000);
}

#[tokio::test]
async fn regeneration_rolls_the_window_forward() {
    let h = Household::new().await;
    let template = h
        .engine
        .create_transaction(
            h.expense(4_000, date(2025, 1, 1), "Celular")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();

    // Half a year later the window reaches into 2026.
    let later = engine_at(&h.db, common::new_year_noon() + chrono::Duration::days(181)).await;
    let instances = later
        .regenerate_template(h.family_id, template.id)
        .await
        .unwrap();
    assert_eq!(instances.first().map(|tx| tx.date), Some(date(2025, 1, 1)));
    assert_eq!(instances.last().map(|tx| tx.date), Some(date(2026, 6, 1)));
    assert_eq!(instances.len(), 18);

    let mut dates: Vec<_> = instances.iter().map(|tx| tx.date).collect();
    dates.dedup();
    assert_eq!(dates.len(), 18);
}

#[tokio::test]
async fn regenerating_a_one_time_transaction_fails() {
    let h = Household::new().await;
    let one_time = h
        .engine
        .create_transaction(h.expense(3_000, date(2025, 1, 2), "Padaria"))
        .await
        .unwrap();

    let err = h
        .engine
        .regenerate_template(h.family_id, one_time.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn archived_account_blocks_regeneration() {
    let h = Household::new().await;
    let template = h
        .engine
        .create_transaction(
            h.expense(4_000, date(2025, 1, 1), "Celular")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();
    h.engine
        .archive_account(h.family_id, h.account_id)
        .await
        .unwrap();

    let later = engine_at(&h.db, common::new_year_noon() + chrono::Duration::days(59)).await;
    let err = later
        .regenerate_template(h.family_id, template.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ArchivedAccount(_)));

    let instances = h
        .engine
        .template_instances(h.family_id, template.id)
        .await
        .unwrap();
    assert_eq!(instances.len(), 12);
    assert_eq!(instances.last().map(|tx| tx.date), Some(date(2025, 12, 1)));
}

#[tokio::test]
async fn archived_category_blocks_regeneration() {
    let h = Household::new().await;
    let template = h
        .engine
        .create_transaction(
            h.expense(4_000, date(2025, 1, 1), "Celular")
                .recurring(Frequency::Monthly),
        )
        .await
        .unwrap();
    h.engine
        .archive_category(h.expense_category)
        .await
        .unwrap();

    let err = h
        .engine
        .regenerate_template(h.family_id, template.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ArchivedCategory(_)));
    assert_eq!(
        h.engine
            .template_instances(h.family_id, template.id)
            .await
            .unwrap()
            .len(),
        12
    );
}
