pub mod alert;
pub mod notification;
pub mod session;
pub mod status;
