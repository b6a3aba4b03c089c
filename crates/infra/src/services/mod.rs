mod billing;
mod notifications;

pub use billing::{BillingError, IBillingProvider, PayPalBillingProvider};
pub use notifications::{HttpNotificationSender, INotificationSender, NotificationError};
