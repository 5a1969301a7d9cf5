use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres, migrate::Migrator, postgres::PgPoolOptions};

use crate::{
    application::services::health::HealthProbe,
    domain::{
        models::{
            Destination, DestinationId, DestinationType, Message, MessageId, MessageStatus,
            UserId,
        },
        repositories::{DestinationRepository, MessageRepository},
    },
};

pub type PgPool = Pool<Postgres>;

pub static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .context("failed to connect to postgres")?;

    if config.run_migrations {
        MIGRATOR
            .run(&pool)
            .await
            .context("failed to run database migrations")?;
    }

    Ok(pool)
}

#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn get(&self, id: MessageId) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, user_id, destination_id, title, body, status, datetime_created, datetime_send_attempt
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(Message::try_from).transpose()
    }

    async fn update(&self, message: Message) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            UPDATE messages
            SET user_id = $2,
                destination_id = $3,
                title = $4,
                body = $5,
                status = $6,
                datetime_created = $7,
                datetime_send_attempt = $8
            WHERE id = $1
              AND status = 'PENDING'
            RETURNING id, user_id, destination_id, title, body, status, datetime_created, datetime_send_attempt
            "#,
        )
        .bind(message.id)
        .bind(message.user_id)
        .bind(message.destination_id)
        .bind(&message.title)
        .bind(&message.body)
        .bind(message.status.as_str())
        .bind(message.datetime_created)
        .bind(message.datetime_send_attempt)
        .fetch_optional(&self.pool)
        .await?;

        record.map(Message::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PostgresDestinationRepository {
    pool: PgPool,
}

impl PostgresDestinationRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl DestinationRepository for PostgresDestinationRepository {
    async fn get_for_user(
        &self,
        destination_id: DestinationId,
        user_id: UserId,
    ) -> anyhow::Result<Option<Destination>> {
        let record = sqlx::query_as::<_, DestinationRecord>(
            r#"
            SELECT id, user_id, type, identifier, datetime_created, datetime_updated
            FROM destinations
            WHERE id = $1
              AND user_id = $2
            "#,
        )
        .bind(destination_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(Destination::from))
    }
}

#[derive(Clone)]
pub struct PostgresHealth {
    pool: PgPool,
}

impl PostgresHealth {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl HealthProbe for PostgresHealth {
    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: i64,
    user_id: i64,
    destination_id: i64,
    title: String,
    body: String,
    status: String,
    datetime_created: DateTime<Utc>,
    datetime_send_attempt: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = anyhow::Error;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let status = MessageStatus::from_str(&value.status)
            .ok_or_else(|| anyhow::anyhow!("unknown message status {}", value.status))?;
        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            destination_id: value.destination_id,
            title: value.title,
            body: value.body,
            status,
            datetime_created: value.datetime_created,
            datetime_send_attempt: value.datetime_send_attempt,
        })
    }
}

#[derive(FromRow)]
struct DestinationRecord {
    id: i64,
    user_id: i64,
    #[sqlx(rename = "type")]
    destination_type: String,
    identifier: String,
    datetime_created: DateTime<Utc>,
    datetime_updated: DateTime<Utc>,
}

impl From<DestinationRecord> for Destination {
    fn from(value: DestinationRecord) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            destination_type: DestinationType::from(value.destination_type),
            identifier: value.identifier,
            datetime_created: value.datetime_created,
            datetime_updated: value.datetime_updated,
        }
    }
}
