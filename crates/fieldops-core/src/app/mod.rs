//! App - デスク（ミューテーション境界）
//!
//! - **DispatchDesk**: owns tasks, engineers, the ledger and the decision log
//! - **DeskBuilder**: wiring of config and ports
//! - **DeskSnapshot**: immutable read view published after every mutation

pub mod builder;
pub mod desk;
pub mod snapshot;
mod state;

pub use self::builder::DeskBuilder;
pub use self::desk::DispatchDesk;
pub use self::snapshot::DeskSnapshot;
