pub mod batch;
pub mod destination;
pub mod eligibility;
pub mod privacy;
pub mod processor;
pub mod reconciler;
pub mod scheduler;

pub use processor::PaymentProcessor;
pub use scheduler::PaymentScheduler;
