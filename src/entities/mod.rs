//! SeaORM entities for the settlement engine.
//!
//! Offerings and enrollments are read-side collaborators owned by the
//! catalog/admissions workflows; payments are the only table this engine
//! writes to.

pub mod enrollment;
pub mod offering;
pub mod payment;

pub use enrollment::Entity as Enrollment;
pub use offering::Entity as Offering;
pub use payment::Entity as Payment;
