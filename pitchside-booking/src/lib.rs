pub mod admin;
pub mod dispatch;
pub mod manager;
pub mod memory;
pub mod payments;
pub mod reaper;
pub mod signature;

pub use admin::AdminManager;
pub use dispatch::SideEffectWorker;
pub use manager::ReservationManager;
pub use memory::MemoryReservationStore;
pub use payments::PaymentManager;
pub use reaper::ExpiryReaper;
pub use signature::SignatureVerifier;
