pub mod reconcile;
pub mod sweep;
pub mod template;
pub mod types;

pub use reconcile::Reconciler;
pub use types::ReconcileOutcome;
