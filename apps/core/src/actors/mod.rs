//! Actor system: the supervisor that owns the session, and the advice
//! actor it calls out to.

pub mod advice;
pub mod messages;
pub mod supervisor;
pub mod traits;
