// Concurrent collections against one ledger must never overshoot its total

#[macro_use]
#[path = "../helpers/mod.rs"]
mod helpers;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use helpers::{TestContext, COLLECTOR};
use smlekha::core::AppError;
use smlekha::modules::payments::models::{PaymentMethod, PaymentStatus};
use smlekha::modules::payments::repositories::PaymentRepository;
use smlekha::modules::payments::services::{CreatePaymentCommand, InstallmentCommand};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_installments_stop_at_the_total() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let opened = ctx
        .collect(&seeded.student.id, "A12", dec!(100), PaymentMethod::Cash)
        .await
        .unwrap();
    let payment_id = opened.payment.id.clone();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let payments = ctx.services.payments.clone();
        let payment_id = payment_id.clone();
        handles.push(tokio::spawn(async move {
            payments
                .add_installment(
                    &payment_id,
                    InstallmentCommand::new(dec!(300), PaymentMethod::Online),
                    COLLECTOR,
                )
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => accepted += 1,
            Err(AppError::Validation(message)) => {
                assert!(message.contains("exceeds remaining balance"), "{}", message)
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    // 1500 left after the opening 100 fits exactly five 300s
    assert_eq!(accepted, 5);

    let stored = PaymentRepository::find_by_id(&*ctx.store, &payment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_collected, dec!(1600));
    assert_eq!(stored.balance_amount, Decimal::ZERO);
    assert_eq!(stored.status, PaymentStatus::Completed);
    assert_eq!(stored.installments.len(), 6);

    let sequences: Vec<i32> = stored.installments.iter().map(|i| i.sequence).collect();
    assert_eq!(sequences, (1..=6).collect::<Vec<i32>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_first_collections_share_one_ledger() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let payments = ctx.services.payments.clone();
        let student_id = seeded.student.id.clone();
        handles.push(tokio::spawn(async move {
            payments
                .create_payment(
                    CreatePaymentCommand {
                        student_id,
                        seat_number: "A12".to_string(),
                        installment: InstallmentCommand::new(dec!(400), PaymentMethod::Cash),
                    },
                    COLLECTOR,
                )
                .await
        }));
    }

    let mut ledger_ids = Vec::new();
    for handle in handles {
        if let Ok(recorded) = handle.await.expect("task panicked") {
            ledger_ids.push(recorded.payment.id);
        }
    }

    assert_eq!(ledger_ids.len(), 4);
    ledger_ids.dedup();
    assert_eq!(ledger_ids.len(), 1, "every accepted installment lands on one ledger");

    let ledgers = PaymentRepository::find_by_student(&*ctx.store, &seeded.student.id)
        .await
        .unwrap();
    assert_eq!(ledgers.len(), 1);
    assert_eq!(ledgers[0].total_collected, dec!(1600));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_complete_racing_an_installment_never_overshoots() {
    for _ in 0..20 {
        let ctx = TestContext::new();
        let seeded = ctx.seed().await;
        let ledger = ctx
            .insert_ledger(
                &seeded,
                &seeded.assignment.id,
                dec!(1600),
                chrono::Utc::now() + chrono::Duration::days(10),
            )
            .await;

        let payments = ctx.services.payments.clone();
        let id = ledger.id.clone();
        let complete = tokio::spawn(async move {
            payments
                .complete_payment(&id, PaymentMethod::Cash, COLLECTOR)
                .await
        });

        let payments = ctx.services.payments.clone();
        let id = ledger.id.clone();
        let installment = tokio::spawn(async move {
            payments
                .add_installment(
                    &id,
                    InstallmentCommand::new(dec!(600), PaymentMethod::Online),
                    COLLECTOR,
                )
                .await
        });

        let completed = complete.await.expect("task panicked");
        let collected = installment.await.expect("task panicked");
        assert!(
            completed.is_ok() != collected.is_ok(),
            "exactly one of the two changes lands"
        );
        for rejected in [completed.err(), collected.err()].into_iter().flatten() {
            assert!(matches!(rejected, AppError::Validation(_)), "{:?}", rejected);
        }

        let stored = PaymentRepository::find_by_id(&*ctx.store, &ledger.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.installments.len(), 1);
        assert!(stored.total_collected <= dec!(1600));
    }
}
