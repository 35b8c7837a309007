pub mod import_tasks;
pub mod initdb;
pub mod migrate_and_serve;
pub mod resolve_withdrawal;
pub mod serve;

pub use import_tasks::import_tasks;
pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use resolve_withdrawal::resolve_withdrawal;
pub use serve::serve;
