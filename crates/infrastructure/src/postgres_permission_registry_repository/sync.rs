use permbit_domain::SUPER_ADMIN_ROLE_NAME;
use tracing::debug;

use super::*;

impl PostgresPermissionRegistryRepository {
    pub(super) async fn apply_sync_impl(
        &self,
        plan: PermissionSyncPlan,
    ) -> AppResult<PermissionSyncReport> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let mut report = PermissionSyncReport::default();
        let mut inserted_ids = Vec::with_capacity(plan.to_insert.len());

        for permission in &plan.to_insert {
            let inserted_id = sqlx::query_scalar::<_, uuid::Uuid>(
                r#"
                INSERT INTO permissions (code, category, name, description, sort_order, bitfield)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (code) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(permission.code.as_str())
            .bind(permission.category.as_str())
            .bind(permission.name.as_str())
            .bind(permission.description.as_deref())
            .bind(permission.sort_order)
            .bind(permission.bitfield.to_decimal())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to insert permission '{}': {error}",
                    permission.code
                ))
            })?;

            if let Some(inserted_id) = inserted_id {
                inserted_ids.push(inserted_id);
                report.inserted.push(permission.code.clone());
            }
        }

        let super_admin_role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE name = $1
            "#,
        )
        .bind(SUPER_ADMIN_ROLE_NAME)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve super-admin role: {error}")))?;

        if let Some(role_id) = super_admin_role_id {
            for permission_id in &inserted_ids {
                let granted = sqlx::query(
                    r#"
                    INSERT INTO role_permissions (role_id, permission_id)
                    VALUES ($1, $2)
                    ON CONFLICT (role_id, permission_id) DO NOTHING
                    "#,
                )
                .bind(role_id)
                .bind(permission_id)
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to grant permission to super-admin: {error}"))
                })?
                .rows_affected();

                report.super_admin_grants += usize::try_from(granted).unwrap_or(0);
            }
        }

        let declared: Vec<String> = plan
            .declared_codes
            .iter()
            .map(|code| code.as_str().to_owned())
            .collect();

        let deprecated = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE permissions
            SET is_deprecated = true, updated_at = now()
            WHERE is_deprecated = false
                AND NOT (code = ANY($1))
            RETURNING code
            "#,
        )
        .bind(&declared)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to deprecate permissions: {error}")))?;

        let restored = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE permissions
            SET is_deprecated = false, updated_at = now()
            WHERE is_deprecated = true
                AND code = ANY($1)
            RETURNING code
            "#,
        )
        .bind(&declared)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to restore permissions: {error}")))?;

        let changed_codes: Vec<String> =
            deprecated.iter().chain(restored.iter()).cloned().collect();
        let mut affected_role_ids = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT DISTINCT role_permissions.role_id
            FROM role_permissions
            INNER JOIN permissions ON permissions.id = role_permissions.permission_id
            WHERE permissions.code = ANY($1)
            "#,
        )
        .bind(&changed_codes)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve roles affected by sync: {error}"))
        })?;

        if report.super_admin_grants > 0 {
            affected_role_ids.extend(super_admin_role_id);
        }
        affected_role_ids.sort();
        affected_role_ids.dedup();

        report.deprecated = parse_codes(deprecated)?;
        report.restored = parse_codes(restored)?;
        report.affected_role_ids = affected_role_ids
            .into_iter()
            .map(|role_id| role_id.to_string())
            .collect();

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        debug!(
            declared = declared.len(),
            inserted = report.inserted.len(),
            affected_roles = report.affected_role_ids.len(),
            "permission sync transaction committed"
        );

        Ok(report)
    }
}

fn parse_codes(values: Vec<String>) -> AppResult<Vec<PermissionCode>> {
    let mut codes = values
        .iter()
        .map(|value| parse_stored_code(value.as_str()))
        .collect::<AppResult<Vec<_>>>()?;
    codes.sort();
    Ok(codes)
}
