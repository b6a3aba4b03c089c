mod appointment;
mod reminder;
mod shared;
mod status;
mod subscription;

pub use crate::appointment::api::*;
pub use crate::reminder::api::*;
pub use crate::shared::ErrorResponse;
pub use crate::status::api::*;
pub use crate::subscription::api::*;
