//! Postgres record store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{NewRecord, RecordStore};
use crate::error::StoreResult;

pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the crate's migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Every record for an owner, oldest first.
    pub async fn find_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<NewRecord>> {
        let records = sqlx::query_as::<_, NewRecord>(
            r#"
            SELECT id, owner_id, name, description, company_info, website,
                   funding_amount, funding_round, funding_date, investors, location,
                   industry_tags, source_url, metadata, created_at
            FROM funding_records
            WHERE owner_id = $1
            ORDER BY created_at ASC, name ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn existing_names(&self, owner_id: Uuid) -> StoreResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM funding_records WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(owner_id = %owner_id, count = names.len(), "Loaded existing record names");
        Ok(names)
    }

    async fn insert_batch(&self, records: &[NewRecord]) -> StoreResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO funding_records (id, owner_id, name, description, company_info, website, \
             funding_amount, funding_round, funding_date, investors, location, industry_tags, \
             source_url, metadata, created_at) ",
        );
        builder.push_values(records, |mut row, record| {
            row.push_bind(record.id)
                .push_bind(record.owner_id)
                .push_bind(record.name.clone())
                .push_bind(record.description.clone())
                .push_bind(record.company_info.clone())
                .push_bind(record.website.clone())
                .push_bind(record.funding_amount.clone())
                .push_bind(record.funding_round.clone())
                .push_bind(record.funding_date.clone())
                .push_bind(record.investors.clone())
                .push_bind(record.location.clone())
                .push_bind(record.industry_tags.clone())
                .push_bind(record.source_url.clone())
                .push_bind(record.metadata.clone())
                .push_bind(record.created_at);
        });

        let mut tx = self.pool.begin().await?;
        let result = builder.build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }
}
