//! Shared key-value table and its change feed.
//!
//! Every insert or update on `t1t_system_data` notifies the
//! `t1t_system_data_changes` channel with the row key.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SYSTEM_DATA_SQL).await?;
        db.execute_unprepared(NOTIFY_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TRIGGER IF EXISTS trg_system_data_notify ON t1t_system_data;
             DROP FUNCTION IF EXISTS notify_system_data_change();
             DROP TABLE IF EXISTS t1t_system_data CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const SYSTEM_DATA_SQL: &str = r"
-- One JSON document per key, shared by every device
CREATE TABLE t1t_system_data (
    key TEXT PRIMARY KEY,
    value JSONB,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Index for change polling by recency
CREATE INDEX idx_system_data_updated ON t1t_system_data(updated_at DESC);
";

const NOTIFY_SQL: &str = r"
CREATE OR REPLACE FUNCTION notify_system_data_change()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at := now();
    PERFORM pg_notify('t1t_system_data_changes', NEW.key);
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_system_data_notify
    BEFORE INSERT OR UPDATE ON t1t_system_data
    FOR EACH ROW EXECUTE FUNCTION notify_system_data_change();
";
