//! Relational storage support

pub mod migrations;
mod postgres;

pub use migrations::{run_schema_migrations, schema_migrations, Migration, PostgresMigrator};
pub use postgres::PostgresConfig;
pub(crate) use postgres::map_write_error;
