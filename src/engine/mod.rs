mod batch_writer;
mod import_engine;
mod parser;
mod table_lock;
mod validator;

pub use batch_writer::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
pub use import_engine::{ImportEngine, ImportRequest, ImportSummary};
