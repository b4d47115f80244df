pub mod dispatcher;

pub use dispatcher::{CommandDispatcher, CommandSink, DispatchOutcome};
