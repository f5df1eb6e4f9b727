pub mod defaults;
pub mod flag_service;
pub mod flag_store;

pub use flag_service::FlagService;
pub use flag_store::FlagStore;
