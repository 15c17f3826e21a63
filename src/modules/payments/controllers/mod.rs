pub mod payment_controller;
pub mod payment_response;

pub use payment_controller::configure;
pub use payment_response::{InstallmentResponse, PaymentResponse, RecordedPaymentResponse};
