pub mod store;

pub use store::{AlertStore, LogReloader, Reloader, MAINTENANCE_TITLE};
