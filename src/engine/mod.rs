// The engine: shared alert state, the two watcher loops, outbound alert
// delivery and the console command surface.
pub mod commands;
pub mod messages;
pub mod state;
pub mod watcher;

pub use commands::handle_command;
pub use messages::{AlertSink, LogAlertSink};
pub use state::AlertBook;
pub use watcher::{EngineCtx, run_setup_watcher, run_tp_watcher, scan_once};
