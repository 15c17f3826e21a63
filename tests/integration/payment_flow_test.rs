// Payment ledger lifecycle through the payment service:
// find-or-create, installments, completion, refunds and receipts

#[macro_use]
#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use helpers::{TestContext, COLLECTOR};
use smlekha::core::{AppError, PageRequest};
use smlekha::modules::payments::models::{
    FeeType, PaymentMethod, PaymentStatus, PaymentUpdate, UiPaymentMethod,
};
use smlekha::modules::payments::repositories::PaymentRepository;
use smlekha::modules::payments::services::{CreatePaymentCommand, InstallmentCommand};

#[tokio::test]
async fn test_installments_settle_the_monthly_fee() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;

    let first = ctx
        .collect(&seeded.student.id, "A12", dec!(600), PaymentMethod::Online)
        .await
        .expect("first installment");
    assert_eq!(first.payment.total_amount, dec!(1600));
    assert_eq!(first.payment.total_collected, dec!(600));
    assert_eq!(first.payment.balance_amount, dec!(1000));
    assert_eq!(first.payment.status, PaymentStatus::Partial);
    assert!(first.payment.payment_date.is_none());
    assert_eq!(first.payment.assignment_id, seeded.assignment.id);
    assert_eq!(first.progress.installments_count, 1);

    let second = ctx
        .collect(&seeded.student.id, "a12", dec!(1000), PaymentMethod::Cash)
        .await
        .expect("second installment");
    assert_eq!(second.payment.id, first.payment.id, "same ledger is reused");
    assert_eq!(second.payment.total_collected, dec!(1600));
    assert_eq!(second.payment.balance_amount, Decimal::ZERO);
    assert_eq!(second.payment.status, PaymentStatus::Completed);
    assert!(second.payment.payment_date.is_some());
    assert_eq!(second.payment.installments.len(), 2);
    assert_eq!(second.payment.installments[1].sequence, 2);

    let err = ctx
        .collect(&seeded.student.id, "A12", dec!(1), PaymentMethod::Cash)
        .await
        .unwrap_err();
    match err {
        AppError::Validation(message) => {
            assert!(message.contains("exceeds remaining balance of 0"), "{}", message);
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    let stored = PaymentRepository::find_by_id(&*ctx.store, &first.payment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.installments.len(), 2);
}

#[tokio::test]
async fn test_receipt_describes_the_recorded_installment() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;

    let recorded = ctx
        .collect(&seeded.student.id, "A12", dec!(600), PaymentMethod::Online)
        .await
        .unwrap();

    let receipt = &recorded.receipt;
    assert!(receipt.receipt_number.starts_with("RCPT-"));
    assert_eq!(receipt.amount, dec!(600));
    assert_eq!(receipt.payment_method, UiPaymentMethod::Upi);
    assert_eq!(receipt.collected_by, COLLECTOR);
    assert_eq!(receipt.balance_amount, dec!(1000));
    assert_eq!(receipt.student_name.as_deref(), Some("Asha Verma"));
    assert_eq!(receipt.seat_number.as_deref(), Some("A12"));
    assert_eq!(receipt.property_name.as_deref(), Some("Central Library"));

    let fetched = ctx
        .services
        .payments
        .receipt(&recorded.payment.id, Some(receipt.receipt_number.as_str()))
        .await
        .unwrap();
    assert_eq!(fetched.installment_number, 1);
    assert_eq!(fetched.total_collected, dec!(600));

    let missing = ctx
        .services
        .payments
        .receipt(&recorded.payment.id, Some("RCPT-0-0000"))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_payment_date_and_details_are_kept() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let paid_on = Utc.with_ymd_and_hms(2025, 3, 2, 10, 30, 0).unwrap();

    let mut installment = InstallmentCommand::new(dec!(1600), PaymentMethod::BankTransfer);
    installment.payment_date = Some(paid_on);
    installment.transaction_id = Some("NEFT-99812".to_string());
    installment.notes = Some("paid by parent".to_string());

    let recorded = ctx
        .services
        .payments
        .create_payment(
            CreatePaymentCommand {
                student_id: seeded.student.id.clone(),
                seat_number: "A12".to_string(),
                installment,
            },
            COLLECTOR,
        )
        .await
        .unwrap();

    let stored = &recorded.payment.installments[0];
    assert_eq!(stored.payment_date, paid_on);
    assert_eq!(stored.transaction_id.as_deref(), Some("NEFT-99812"));
    assert_eq!(stored.notes.as_deref(), Some("paid by parent"));
    assert_eq!(recorded.payment.payment_date, Some(paid_on));
}

#[tokio::test]
async fn test_unresolvable_references_are_not_found() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let other = ctx.create_student("Ravi Kumar", "9123456780").await;

    let unknown_student = ctx
        .collect("missing", "A12", dec!(100), PaymentMethod::Cash)
        .await;
    assert!(matches!(unknown_student, Err(AppError::NotFound(_))));

    let unknown_seat = ctx
        .collect(&seeded.student.id, "Z99", dec!(100), PaymentMethod::Cash)
        .await;
    assert!(matches!(unknown_seat, Err(AppError::NotFound(_))));

    match ctx.collect(&other.id, "A12", dec!(100), PaymentMethod::Cash).await {
        Err(AppError::NotFound(message)) => assert!(message.contains("No active assignment")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_seat_number_resolves_to_the_students_property() {
    let ctx = TestContext::new();
    let first = ctx.create_property("Central Library").await;
    let second = ctx.create_property("North Campus").await;
    // Seat numbers repeat across properties; sit the student in the one that sorts last
    let (earlier, later) = if first.id < second.id {
        (first, second)
    } else {
        (second, first)
    };

    let shift = ctx.create_shift(&later.id, "Morning", 6, 12).await;
    ctx.create_seat(&earlier.id, "A12").await;
    let seat = ctx.create_seat(&later.id, "A12").await;
    let student = ctx.create_student("Asha Verma", "9876543210").await;
    let assignment = ctx
        .assign(&student.id, &seat.id, &shift.id, Some(dec!(1400)))
        .await;

    let recorded = ctx
        .collect(&student.id, "a12", dec!(400), PaymentMethod::Cash)
        .await
        .unwrap();

    assert_eq!(recorded.payment.seat_id, seat.id);
    assert_eq!(recorded.payment.property_id, later.id);
    assert_eq!(recorded.payment.assignment_id, assignment.id);
    assert_eq!(recorded.payment.total_amount, dec!(1400));
    assert_eq!(recorded.receipt.property_name.as_deref(), Some(later.name.as_str()));
}

#[tokio::test]
async fn test_assignment_without_rent_opens_at_the_default() {
    let ctx = TestContext::with_settings(smlekha::app::ledger_settings(dec!(1750), 30));
    let seeded = ctx.seed().await;
    ctx.store
        .edit_assignment(&seeded.assignment.id, |a| a.monthly_rent = Decimal::ZERO)
        .await;

    let recorded = ctx
        .collect(&seeded.student.id, "A12", dec!(750), PaymentMethod::Cash)
        .await
        .unwrap();

    assert_eq!(recorded.payment.total_amount, dec!(1750));
    assert_eq!(recorded.payment.balance_amount, dec!(1000));
}

#[tokio::test]
async fn test_each_assignment_gets_its_own_ledger() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let evening = ctx
        .create_shift(&seeded.property.id, "Evening", 14, 20)
        .await;
    let seat = ctx.create_seat(&seeded.property.id, "B03").await;
    ctx.assign(&seeded.student.id, &seat.id, &evening.id, Some(dec!(1200)))
        .await;

    let a12 = ctx
        .collect(&seeded.student.id, "A12", dec!(100), PaymentMethod::Cash)
        .await
        .unwrap();
    let b03 = ctx
        .collect(&seeded.student.id, "B03", dec!(100), PaymentMethod::Cash)
        .await
        .unwrap();

    assert_ne!(a12.payment.id, b03.payment.id);
    assert_eq!(b03.payment.total_amount, dec!(1200));

    let ledgers = ctx
        .services
        .payments
        .student_payments(&seeded.student.id)
        .await
        .unwrap();
    assert_eq!(ledgers.len(), 2);
}

#[tokio::test]
async fn test_overdue_lists_open_ledgers_past_due() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let yesterday = Utc::now() - Duration::days(1);

    let pending = ctx
        .insert_ledger(&seeded, "assignment-pending", dec!(1600), yesterday)
        .await;
    let settled = ctx
        .insert_ledger(&seeded, "assignment-settled", dec!(1600), yesterday)
        .await;
    ctx.insert_ledger(&seeded, "assignment-future", dec!(1600), Utc::now() + Duration::days(3))
        .await;

    ctx.services
        .payments
        .add_installment(
            &settled.id,
            InstallmentCommand::new(dec!(1600), PaymentMethod::Cash),
            COLLECTOR,
        )
        .await
        .unwrap();

    let page = ctx
        .services
        .payments
        .overdue_payments(None, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.payments[0].id, pending.id);
    assert_eq!(
        page.payments[0].effective_status(Utc::now()),
        PaymentStatus::Overdue
    );
    assert_eq!(page.payments[0].status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_complete_pays_off_a_pending_ledger() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let ledger = ctx
        .insert_ledger(&seeded, "assignment-x", dec!(1600), Utc::now() + Duration::days(10))
        .await;

    let recorded = ctx
        .services
        .payments
        .complete_payment(&ledger.id, PaymentMethod::Card, COLLECTOR)
        .await
        .unwrap();

    assert_eq!(recorded.payment.status, PaymentStatus::Completed);
    let last = recorded.payment.installments.last().unwrap();
    assert_eq!(last.amount, dec!(1600));
    assert_eq!(last.payment_method, PaymentMethod::Card);
    assert_eq!(last.description.as_deref(), Some("Remaining balance"));

    let again = ctx
        .services
        .payments
        .complete_payment(&ledger.id, PaymentMethod::Cash, COLLECTOR)
        .await;
    match again {
        Err(AppError::Validation(message)) => assert!(message.contains("status: completed")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_complete_rejects_partially_paid_ledgers() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let recorded = ctx
        .collect(&seeded.student.id, "A12", dec!(600), PaymentMethod::Cash)
        .await
        .unwrap();

    let result = ctx
        .services
        .payments
        .complete_payment(&recorded.payment.id, PaymentMethod::Cash, COLLECTOR)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_refund_marks_completed_ledger() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let recorded = ctx
        .collect(&seeded.student.id, "A12", dec!(1600), PaymentMethod::Online)
        .await
        .unwrap();

    let refunded = ctx
        .services
        .payments
        .refund_payment(&recorded.payment.id, "Seat closed".to_string(), "manager")
        .await
        .unwrap();

    assert_eq!(refunded.status, PaymentStatus::Refunded);
    let refund = refunded.refund.expect("refund info");
    assert_eq!(refund.reason, "Seat closed");
    assert_eq!(refund.refunded_by, "manager");
    assert_eq!(refunded.total_collected, dec!(1600), "installments stay on record");

    let twice = ctx
        .services
        .payments
        .refund_payment(&recorded.payment.id, "again".to_string(), "manager")
        .await;
    assert!(matches!(twice, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_updates_apply_only_to_open_ledgers() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let recorded = ctx
        .collect(&seeded.student.id, "A12", dec!(600), PaymentMethod::Cash)
        .await
        .unwrap();
    let new_due = Utc::now() + Duration::days(45);

    let updated = ctx
        .services
        .payments
        .update_payment(
            &recorded.payment.id,
            PaymentUpdate {
                due_date: Some(new_due),
                fee_type: Some(FeeType::Other),
                notes: Some("extended".to_string()),
                ..PaymentUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.due_date, new_due);
    assert_eq!(updated.fee_type, FeeType::Other);
    assert_eq!(updated.total_amount, dec!(1600));

    ctx.collect(&seeded.student.id, "A12", dec!(1000), PaymentMethod::Cash)
        .await
        .unwrap();

    let frozen = ctx
        .services
        .payments
        .update_payment(
            &recorded.payment.id,
            PaymentUpdate {
                notes: Some("too late".to_string()),
                ..PaymentUpdate::default()
            },
        )
        .await;
    match frozen {
        Err(AppError::Validation(message)) => {
            assert!(message.contains("can no longer be modified"))
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_payment_includes_references() {
    let ctx = TestContext::new();
    let seeded = ctx.seed().await;
    let recorded = ctx
        .collect(&seeded.student.id, "A12", dec!(600), PaymentMethod::Cash)
        .await
        .unwrap();

    let details = ctx
        .services
        .payments
        .get_payment(&recorded.payment.id)
        .await
        .unwrap();
    assert_eq!(details.student.unwrap().id, seeded.student.id);
    assert_eq!(details.seat.unwrap().seat_number, "A12");
    assert_eq!(details.shift.unwrap().name, "Morning");
    assert_eq!(details.property.unwrap().name, "Central Library");

    let missing = ctx.services.payments.get_payment("nope").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}
