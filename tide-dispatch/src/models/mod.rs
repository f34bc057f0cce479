//! Data model shared by the store and the print engine

pub mod order;
pub mod print_state;
pub mod target;
pub mod watch;

pub use order::{AddOn, ItemVariant, Order, OrderItem, OrderType};
pub use print_state::{AuditCounter, AuditField, OrderPatch, PrintFlag};
pub use target::{PrintTarget, normalize_target_name};
pub use watch::{ChangeKind, FlagFilter, FlagTransition, JobKind, WatchDefinition};
