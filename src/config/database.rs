//! Database configuration module for `SlipBuddy`.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.

use crate::entities::{Slip, Transaction, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::info;

/// Used when `DATABASE_URL` is unset; `mode=rwc` creates the file on first start.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/slipbuddy.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// For the default URL the `data/` directory is created first, since `SQLite` only
/// creates the file itself.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if database_url == DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }
    info!(url = %database_url, "Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the users, transactions and slips tables if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut user_table = schema.create_table_from_entity(User);
    let mut transaction_table = schema.create_table_from_entity(Transaction);
    let mut slip_table = schema.create_table_from_entity(Slip);
    user_table.if_not_exists();
    transaction_table.if_not_exists();
    slip_table.if_not_exists();

    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&transaction_table)).await?;
    db.execute(builder.build(&slip_table)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{SlipModel, TransactionModel, UserModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;
        let _: Vec<SlipModel> = Slip::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_twice_is_harmless() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
