pub mod payment_service;

pub use payment_service::{
    CreatePaymentCommand, InstallmentCommand, LedgerSettings, PaymentDetails, PaymentService,
    RecordedPayment,
};
