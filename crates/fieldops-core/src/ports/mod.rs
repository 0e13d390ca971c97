//! Ports - 抽象化レイヤー
//!
//! The engine's seams to the outside world: wall clock, id generation and
//! operational alerts. Persistence is not a port here; the desk is loaded
//! from snapshots and its state is read back through `DeskSnapshot`.

pub mod alert_sink;
pub mod clock;
pub mod id_generator;

pub use self::alert_sink::{AlertSink, DispatchAlert};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
