pub mod filter;
pub mod installment;
pub mod payment;
pub mod payment_method;
pub mod receipt;

pub use filter::{
    PaymentFilter, PaymentPage, PaymentSearch, PaymentSort, PaymentSummary, SortField, SortOrder,
    StatusFilter,
};
pub use installment::{Installment, NewInstallment};
pub use payment::{
    validate_amount, BillingPeriod, FeeType, LedgerChange, NewPayment, Payment, PaymentProgress,
    PaymentStatus, PaymentUpdate, RefundInfo,
};
pub use payment_method::{PaymentMethod, UiPaymentMethod};
pub use receipt::{generate_receipt_number, Receipt};
