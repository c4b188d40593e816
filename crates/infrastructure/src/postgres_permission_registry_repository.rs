use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use permbit_application::{
    NewPermission, PermissionRegistryRepository, PermissionSyncPlan, PermissionSyncReport,
};
use permbit_core::{AppError, AppResult};
use permbit_domain::{PermissionBitfield, PermissionCode, PermissionDefinition};

mod sync;

/// PostgreSQL-backed permission registry.
#[derive(Clone)]
pub struct PostgresPermissionRegistryRepository {
    pool: PgPool,
}

impl PostgresPermissionRegistryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: uuid::Uuid,
    code: String,
    category: String,
    name: String,
    description: Option<String>,
    sort_order: i32,
    bitfield: String,
    is_deprecated: bool,
}

impl TryFrom<PermissionRow> for PermissionDefinition {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        Ok(PermissionDefinition {
            permission_id: row.id.to_string(),
            code: parse_stored_code(row.code.as_str())?,
            category: row.category,
            name: row.name,
            description: row.description,
            sort_order: row.sort_order,
            bitfield: parse_stored_bitfield(row.code.as_str(), row.bitfield.as_str())?,
            is_deprecated: row.is_deprecated,
        })
    }
}

pub(crate) fn parse_stored_code(value: &str) -> AppResult<PermissionCode> {
    PermissionCode::new(value).map_err(|error| {
        AppError::Internal(format!("invalid stored permission code '{value}': {error}"))
    })
}

pub(crate) fn parse_stored_bitfield(code: &str, value: &str) -> AppResult<PermissionBitfield> {
    PermissionBitfield::from_decimal(value).map_err(|error| {
        AppError::Internal(format!(
            "invalid stored bitfield for permission '{code}': {error}"
        ))
    })
}

#[async_trait]
impl PermissionRegistryRepository for PostgresPermissionRegistryRepository {
    async fn list_permissions(&self) -> AppResult<Vec<PermissionDefinition>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, code, category, name, description, sort_order, bitfield, is_deprecated
            FROM permissions
            ORDER BY category, sort_order, code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?
        .into_iter()
        .map(PermissionDefinition::try_from)
        .collect()
    }

    async fn find_permission_by_code(&self, code: &str) -> AppResult<Option<PermissionDefinition>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, code, category, name, description, sort_order, bitfield, is_deprecated
            FROM permissions
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find permission '{code}': {error}"))
        })?
        .map(PermissionDefinition::try_from)
        .transpose()
    }

    async fn highest_bitfield(&self) -> AppResult<Option<PermissionBitfield>> {
        // Decimal strings without leading zeros order numerically by length first.
        let highest = sqlx::query_scalar::<_, String>(
            r#"
            SELECT bitfield
            FROM permissions
            ORDER BY length(bitfield) DESC, bitfield COLLATE "C" DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to read highest permission bitfield: {error}"))
        })?;

        highest
            .map(|value| parse_stored_bitfield("<highest>", value.as_str()))
            .transpose()
    }

    async fn create_permission(&self, input: NewPermission) -> AppResult<PermissionDefinition> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (code, category, name, description, sort_order, bitfield)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, code, category, name, description, sort_order, bitfield, is_deprecated
            "#,
        )
        .bind(input.code.as_str())
        .bind(input.category.as_str())
        .bind(input.name.as_str())
        .bind(input.description.as_deref())
        .bind(input.sort_order)
        .bind(input.bitfield.to_decimal())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_permission_conflict(error, &input.code))?;

        PermissionDefinition::try_from(row)
    }

    async fn apply_sync(&self, plan: PermissionSyncPlan) -> AppResult<PermissionSyncReport> {
        self.apply_sync_impl(plan).await
    }
}

fn map_permission_conflict(error: sqlx::Error, code: &PermissionCode) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "permission '{code}' or its bitfield already exists"
        ));
    }

    AppError::Internal(format!("failed to create permission '{code}': {error}"))
}
