use super::*;

impl PostgresRoleRepository {
    pub(super) async fn list_roles_impl(
        &self,
        role_id: Option<uuid::Uuid>,
    ) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.description,
                roles.is_system,
                roles.sort_order,
                permissions.code AS permission
            FROM roles
            LEFT JOIN role_permissions
                ON role_permissions.role_id = roles.id
            LEFT JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE ($1::uuid IS NULL OR roles.id = $1)
            ORDER BY roles.sort_order, roles.name, permissions.code
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    pub(super) async fn create_role_impl(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let (role_id, sort_order) = sqlx::query_as::<_, (uuid::Uuid, i32)>(
            r#"
            INSERT INTO roles (name, description, is_system, sort_order)
            SELECT $1, $2, false, COALESCE(MAX(sort_order), 0) + 1
            FROM roles
            RETURNING id, sort_order
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.description.as_deref())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, input.name.as_str()))?;

        for permission in &input.permissions {
            let granted = sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT $1, id
                FROM permissions
                WHERE code = $2
                ON CONFLICT (role_id, permission_id) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role grants: {error}"))
            })?;

            if granted.rows_affected() == 0 {
                return Err(AppError::NotFound(format!(
                    "permission '{permission}' was not found"
                )));
            }
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(RoleDefinition {
            role_id: role_id.to_string(),
            name: input.name,
            description: input.description,
            is_system: false,
            sort_order,
            permissions: input.permissions,
        })
    }

    pub(super) async fn update_role_impl(
        &self,
        role_id: uuid::Uuid,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let role_name = input.name.clone().unwrap_or_default();
        let rows_affected = sqlx::query(
            r#"
            UPDATE roles
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(role_id)
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, role_name.as_str()))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        self.list_roles_impl(Some(role_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    pub(super) async fn delete_role_impl(&self, role_id: uuid::Uuid) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let rows_affected = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        sqlx::query(
            r#"
            UPDATE roles
            SET sort_order = ordered.position
            FROM (
                SELECT id, (ROW_NUMBER() OVER (ORDER BY sort_order, name))::int AS position
                FROM roles
            ) AS ordered
            WHERE roles.id = ordered.id
                AND roles.sort_order <> ordered.position
            "#,
        )
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to renumber roles: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn toggle_role_permission_impl(
        &self,
        role_id: uuid::Uuid,
        code: &PermissionCode,
    ) -> AppResult<RolePermissionToggle> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let role_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM roles WHERE id = $1)",
        )
        .bind(role_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?;

        if !role_exists {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        let permission_id = sqlx::query_scalar::<_, uuid::Uuid>(
            "SELECT id FROM permissions WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve permission: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("permission '{code}' was not found")))?;

        let revoked = sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE role_id = $1 AND permission_id = $2
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke permission: {error}")))?
        .rows_affected();

        let toggle = if revoked > 0 {
            RolePermissionToggle::Revoked
        } else {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                VALUES ($1, $2)
                "#,
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to grant permission: {error}")))?;

            RolePermissionToggle::Granted
        };

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(toggle)
    }

    pub(super) async fn reorder_role_impl(
        &self,
        role_id: uuid::Uuid,
        position: i32,
    ) -> AppResult<Vec<RoleDefinition>> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let mut ordered = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM roles
            ORDER BY sort_order, name
            FOR UPDATE
            "#,
        )
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock roles: {error}")))?;

        let current = ordered
            .iter()
            .position(|candidate| *candidate == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        let moved = ordered.remove(current);
        let target = usize::try_from(position.saturating_sub(1))
            .unwrap_or(0)
            .min(ordered.len());
        ordered.insert(target, moved);

        for (index, id) in ordered.iter().enumerate() {
            sqlx::query(
                r#"
                UPDATE roles
                SET sort_order = $2
                WHERE id = $1 AND sort_order <> $2
                "#,
            )
            .bind(id)
            .bind(i32::try_from(index + 1).unwrap_or(i32::MAX))
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to reorder roles: {error}")))?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        self.list_roles_impl(None).await
    }
}
