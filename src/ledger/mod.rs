pub mod coordinator;
pub mod payment;
pub mod pin;
pub mod session;
pub mod traits;

pub use coordinator::{LedgerCoordinator, LedgerRequest, LedgerState};
pub use payment::{PaymentFlow, PaymentOutcome};
pub use pin::PinGate;
pub use session::StaticSession;
pub use traits::{
    BudgetStore, NotificationInbox, NotificationSink, ProfileStore, SessionProvider,
    TransactionRecorder, WalletStore,
};
