//! PostgreSQL adapter for club storage.
//!
//! Enumerations are stored as their snake_case names in TEXT columns. Points
//! increments, contribution edits and registrations lock the affected row
//! with `FOR UPDATE` so concurrent writers serialize inside the database.

use crate::model::{ContributionRevision, ContributionUpdate, NewContribution};
use crate::traits::{ActivityStore, ContributionStore, MemberStore, QueryWindow};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use club_types::{
    Activity, ActivityId, ActivityType, Contribution, ContributionId, ContributionType, Level,
    LevelTable, Member, MemberId, Participant, ParticipantStatus, PointsBalance, Role,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::str::FromStr;

/// PostgreSQL-backed storage adapter.
#[derive(Clone)]
pub struct PostgresClubStorage {
    pool: PgPool,
}

impl PostgresClubStorage {
    /// Connect to PostgreSQL and initialize required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Unavailable(format!("failed to connect postgres: {e}")))?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS club_members (
                member_id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                full_name TEXT,
                role TEXT NOT NULL,
                points BIGINT NOT NULL CHECK (points >= 0),
                level TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS club_activities (
                activity_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                date DATE NOT NULL,
                activity_type TEXT NOT NULL,
                max_participants INTEGER,
                created_by TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS club_contributions (
                contribution_id TEXT PRIMARY KEY,
                member_id TEXT NOT NULL REFERENCES club_members(member_id) ON DELETE CASCADE,
                recorded_by TEXT NOT NULL,
                description TEXT NOT NULL,
                points BIGINT NOT NULL,
                contribution_type TEXT NOT NULL,
                activity_id TEXT,
                idempotency_key TEXT UNIQUE,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS club_activity_participants (
                activity_id TEXT NOT NULL REFERENCES club_activities(activity_id) ON DELETE CASCADE,
                member_id TEXT NOT NULL REFERENCES club_members(member_id) ON DELETE CASCADE,
                status TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (activity_id, member_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS club_contributions_member_idx ON club_contributions (member_id, created_at DESC)",
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl MemberStore for PostgresClubStorage {
    async fn insert_member(&self, member: Member) -> StorageResult<Member> {
        if member.username.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO club_members
                (member_id, username, full_name, role, points, level, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(member.id.as_str())
        .bind(&member.username)
        .bind(member.full_name.as_deref())
        .bind(member.role.as_str())
        .bind(member.points)
        .bind(member.level.as_str())
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(member)
    }

    async fn get_member(&self, member_id: &MemberId) -> StorageResult<Option<Member>> {
        let row = sqlx::query("SELECT * FROM club_members WHERE member_id = $1")
            .bind(member_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(member_from_row).transpose()
    }

    async fn list_members(&self) -> StorageResult<Vec<Member>> {
        let rows = sqlx::query("SELECT * FROM club_members ORDER BY points DESC, username ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter().map(member_from_row).collect()
    }

    async fn update_member_role(
        &self,
        member_id: &MemberId,
        role: Role,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Member> {
        let row = sqlx::query(
            "UPDATE club_members SET role = $2, updated_at = $3 WHERE member_id = $1 RETURNING *",
        )
        .bind(member_id.as_str())
        .bind(role.as_str())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| StorageError::NotFound(format!("member {member_id} not found")))?;
        member_from_row(row)
    }

    async fn increment_member_points(
        &self,
        member_id: &MemberId,
        delta: i64,
        levels: &LevelTable,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<PointsBalance> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let current: i64 =
            sqlx::query("SELECT points FROM club_members WHERE member_id = $1 FOR UPDATE")
                .bind(member_id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
                .ok_or_else(|| StorageError::NotFound(format!("member {member_id} not found")))?
                .try_get("points")
                .map_err(|e| StorageError::Backend(e.to_string()))?;

        let points = current.checked_add(delta).ok_or_else(|| {
            StorageError::InvariantViolation(format!("points overflow for member {member_id}"))
        })?;
        if points < 0 {
            return Err(StorageError::InvariantViolation(format!(
                "member {member_id} would drop to {points} points"
            )));
        }
        let level = levels.level_of(points);

        sqlx::query(
            "UPDATE club_members SET points = $2, level = $3, updated_at = $4 WHERE member_id = $1",
        )
        .bind(member_id.as_str())
        .bind(points)
        .bind(level.as_str())
        .bind(updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(PointsBalance {
            member_id: member_id.clone(),
            points,
            level,
        })
    }

    async fn delete_member(&self, member_id: &MemberId) -> StorageResult<usize> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM club_activity_participants WHERE member_id = $1")
            .bind(member_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let removed = sqlx::query("DELETE FROM club_contributions WHERE member_id = $1")
            .bind(member_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM club_members WHERE member_id = $1")
            .bind(member_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        if deleted == 0 {
            // dropping the transaction rolls back
            return Err(StorageError::NotFound(format!(
                "member {member_id} not found"
            )));
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(removed as usize)
    }
}

#[async_trait]
impl ContributionStore for PostgresClubStorage {
    async fn insert_contribution(&self, record: NewContribution) -> StorageResult<Contribution> {
        let contribution = Contribution {
            id: ContributionId::generate(),
            member_id: record.member_id,
            recorded_by: record.recorded_by,
            description: record.description,
            points: record.points,
            contribution_type: record.contribution_type,
            activity_id: record.activity_id,
            idempotency_key: record.idempotency_key,
            created_at: record.created_at,
            updated_at: record.created_at,
        };

        sqlx::query(
            r#"
            INSERT INTO club_contributions
                (contribution_id, member_id, recorded_by, description, points, contribution_type,
                 activity_id, idempotency_key, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            "#,
        )
        .bind(contribution.id.as_str())
        .bind(contribution.member_id.as_str())
        .bind(contribution.recorded_by.as_str())
        .bind(&contribution.description)
        .bind(contribution.points)
        .bind(contribution.contribution_type.as_str())
        .bind(contribution.activity_id.as_ref().map(|id| id.as_str()))
        .bind(contribution.idempotency_key.as_deref())
        .bind(contribution.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(contribution)
    }

    async fn get_contribution(
        &self,
        contribution_id: &ContributionId,
    ) -> StorageResult<Option<Contribution>> {
        let row = sqlx::query("SELECT * FROM club_contributions WHERE contribution_id = $1")
            .bind(contribution_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(contribution_from_row).transpose()
    }

    async fn find_contribution_by_key(&self, key: &str) -> StorageResult<Option<Contribution>> {
        let row = sqlx::query("SELECT * FROM club_contributions WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(contribution_from_row).transpose()
    }

    async fn update_contribution(
        &self,
        contribution_id: &ContributionId,
        update: ContributionUpdate,
    ) -> StorageResult<ContributionRevision> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let previous_points: i64 = sqlx::query(
            "SELECT points FROM club_contributions WHERE contribution_id = $1 FOR UPDATE",
        )
        .bind(contribution_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| StorageError::NotFound(format!("contribution {contribution_id} not found")))?
        .try_get("points")
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        let row = sqlx::query(
            r#"
            UPDATE club_contributions
               SET description = $2,
                   points = $3,
                   contribution_type = $4,
                   activity_id = $5,
                   updated_at = $6
             WHERE contribution_id = $1
            RETURNING *
            "#,
        )
        .bind(contribution_id.as_str())
        .bind(&update.description)
        .bind(update.points)
        .bind(update.contribution_type.as_str())
        .bind(update.activity_id.as_ref().map(|id| id.as_str()))
        .bind(update.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let contribution = contribution_from_row(row)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(ContributionRevision {
            previous_points,
            contribution,
        })
    }

    async fn delete_contribution(
        &self,
        contribution_id: &ContributionId,
    ) -> StorageResult<Contribution> {
        let row = sqlx::query("DELETE FROM club_contributions WHERE contribution_id = $1 RETURNING *")
            .bind(contribution_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| {
                StorageError::NotFound(format!("contribution {contribution_id} not found"))
            })?;
        contribution_from_row(row)
    }

    async fn list_contributions(&self, window: QueryWindow) -> StorageResult<Vec<Contribution>> {
        let limit = if window.limit == 0 {
            i64::MAX
        } else {
            window.limit as i64
        };
        let rows = sqlx::query(
            r#"
            SELECT * FROM club_contributions
            ORDER BY created_at DESC, contribution_id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(window.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        rows.into_iter().map(contribution_from_row).collect()
    }

    async fn list_contributions_for_member(
        &self,
        member_id: &MemberId,
    ) -> StorageResult<Vec<Contribution>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM club_contributions
            WHERE member_id = $1
            ORDER BY created_at DESC, contribution_id DESC
            "#,
        )
        .bind(member_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        rows.into_iter().map(contribution_from_row).collect()
    }
}

#[async_trait]
impl ActivityStore for PostgresClubStorage {
    async fn insert_activity(&self, activity: Activity) -> StorageResult<Activity> {
        sqlx::query(
            r#"
            INSERT INTO club_activities
                (activity_id, title, description, date, activity_type, max_participants, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(activity.id.as_str())
        .bind(&activity.title)
        .bind(activity.description.as_deref())
        .bind(activity.date)
        .bind(activity.activity_type.as_str())
        .bind(activity.max_participants.map(|n| n as i32))
        .bind(activity.created_by.as_str())
        .bind(activity.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(activity)
    }

    async fn get_activity(&self, activity_id: &ActivityId) -> StorageResult<Option<Activity>> {
        let row = sqlx::query("SELECT * FROM club_activities WHERE activity_id = $1")
            .bind(activity_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(activity_from_row).transpose()
    }

    async fn list_activities(&self) -> StorageResult<Vec<Activity>> {
        let rows = sqlx::query("SELECT * FROM club_activities ORDER BY date DESC, title ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.into_iter().map(activity_from_row).collect()
    }

    async fn register_participant(
        &self,
        activity_id: &ActivityId,
        member_id: &MemberId,
        at: DateTime<Utc>,
    ) -> StorageResult<Participant> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Locking the activity row serializes registrations for it.
        let capacity: Option<i32> = sqlx::query(
            "SELECT max_participants FROM club_activities WHERE activity_id = $1 FOR UPDATE",
        )
        .bind(activity_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| StorageError::NotFound(format!("activity {activity_id} not found")))?
        .try_get("max_participants")
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        let existing = sqlx::query(
            "SELECT * FROM club_activity_participants WHERE activity_id = $1 AND member_id = $2",
        )
        .bind(activity_id.as_str())
        .bind(member_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .map(participant_from_row)
        .transpose()?;
        if let Some(existing) = existing {
            if existing.is_registered() {
                return Ok(existing);
            }
        }

        if let Some(capacity) = capacity {
            let registered: i64 = sqlx::query(
                "SELECT COUNT(*) AS n FROM club_activity_participants WHERE activity_id = $1 AND status = 'registered'",
            )
            .bind(activity_id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .try_get("n")
            .map_err(|e| StorageError::Backend(e.to_string()))?;
            if registered >= i64::from(capacity) {
                return Err(StorageError::CapacityExceeded(format!(
                    "activity {activity_id} is full ({capacity} participants)"
                )));
            }
        }

        let row = sqlx::query(
            r#"
            INSERT INTO club_activity_participants (activity_id, member_id, status, updated_at)
            VALUES ($1, $2, 'registered', $3)
            ON CONFLICT (activity_id, member_id)
            DO UPDATE SET status = 'registered', updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(activity_id.as_str())
        .bind(member_id.as_str())
        .bind(at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        participant_from_row(row)
    }

    async fn cancel_participant(
        &self,
        activity_id: &ActivityId,
        member_id: &MemberId,
        at: DateTime<Utc>,
    ) -> StorageResult<Participant> {
        let row = sqlx::query(
            r#"
            UPDATE club_activity_participants
               SET status = 'cancelled', updated_at = $3
             WHERE activity_id = $1 AND member_id = $2
            RETURNING *
            "#,
        )
        .bind(activity_id.as_str())
        .bind(member_id.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| {
            StorageError::NotFound(format!(
                "member {member_id} is not registered for activity {activity_id}"
            ))
        })?;
        participant_from_row(row)
    }

    async fn list_participants(&self, activity_id: &ActivityId) -> StorageResult<Vec<Participant>> {
        let rows = sqlx::query(
            "SELECT * FROM club_activity_participants WHERE activity_id = $1 ORDER BY updated_at ASC",
        )
        .bind(activity_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        rows.into_iter().map(participant_from_row).collect()
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StorageResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StorageError::Backend(format!("column {column}: {e}")))
}

fn parse_column<T>(row: &PgRow, column: &str) -> StorageResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = get(row, column)?;
    raw.parse()
        .map_err(|e: T::Err| StorageError::Serialization(format!("column {column}: {e}")))
}

fn member_from_row(row: PgRow) -> StorageResult<Member> {
    Ok(Member {
        id: MemberId::new(get::<String>(&row, "member_id")?),
        username: get(&row, "username")?,
        full_name: get(&row, "full_name")?,
        role: parse_column::<Role>(&row, "role")?,
        points: get(&row, "points")?,
        level: parse_column::<Level>(&row, "level")?,
        created_at: get(&row, "created_at")?,
        updated_at: get(&row, "updated_at")?,
    })
}

fn contribution_from_row(row: PgRow) -> StorageResult<Contribution> {
    let activity_id: Option<String> = get(&row, "activity_id")?;
    Ok(Contribution {
        id: ContributionId::new(get::<String>(&row, "contribution_id")?),
        member_id: MemberId::new(get::<String>(&row, "member_id")?),
        recorded_by: MemberId::new(get::<String>(&row, "recorded_by")?),
        description: get(&row, "description")?,
        points: get(&row, "points")?,
        contribution_type: parse_column::<ContributionType>(&row, "contribution_type")?,
        activity_id: activity_id.map(ActivityId::new),
        idempotency_key: get(&row, "idempotency_key")?,
        created_at: get(&row, "created_at")?,
        updated_at: get(&row, "updated_at")?,
    })
}

fn activity_from_row(row: PgRow) -> StorageResult<Activity> {
    let capacity: Option<i32> = get(&row, "max_participants")?;
    Ok(Activity {
        id: ActivityId::new(get::<String>(&row, "activity_id")?),
        title: get(&row, "title")?,
        description: get(&row, "description")?,
        date: get(&row, "date")?,
        activity_type: parse_column::<ActivityType>(&row, "activity_type")?,
        max_participants: capacity.map(|n| n.max(0) as u32),
        created_by: MemberId::new(get::<String>(&row, "created_by")?),
        created_at: get(&row, "created_at")?,
    })
}

fn participant_from_row(row: PgRow) -> StorageResult<Participant> {
    let status: String = get(&row, "status")?;
    Ok(Participant {
        activity_id: ActivityId::new(get::<String>(&row, "activity_id")?),
        member_id: MemberId::new(get::<String>(&row, "member_id")?),
        status: parse_participant_status(&status)?,
        updated_at: get(&row, "updated_at")?,
    })
}

fn parse_participant_status(value: &str) -> StorageResult<ParticipantStatus> {
    match value {
        "registered" => Ok(ParticipantStatus::Registered),
        "cancelled" => Ok(ParticipantStatus::Cancelled),
        other => Err(StorageError::Serialization(format!(
            "unknown participant status: {other}"
        ))),
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StorageError::Conflict(db_err.message().to_string()),
            Some("23503") => StorageError::NotFound(db_err.message().to_string()),
            Some("23514") => StorageError::InvariantViolation(db_err.message().to_string()),
            _ => StorageError::Backend(err.to_string()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(err.to_string())
        }
        _ => StorageError::Backend(err.to_string()),
    }
}
