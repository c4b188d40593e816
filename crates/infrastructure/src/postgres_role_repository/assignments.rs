use super::*;

impl PostgresRoleRepository {
    pub(super) async fn assign_role_to_person_impl(
        &self,
        person_id: PersonId,
        role_id: uuid::Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO person_roles (person_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (person_id, role_id) DO NOTHING
            "#,
        )
        .bind(person_id.as_uuid())
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23503")
            {
                return AppError::NotFound(format!("role '{role_id}' was not found"));
            }

            AppError::Internal(format!("failed to assign role: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn remove_role_from_person_impl(
        &self,
        person_id: PersonId,
        role_id: uuid::Uuid,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM person_roles
            WHERE person_id = $1 AND role_id = $2
            "#,
        )
        .bind(person_id.as_uuid())
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove role assignment: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role assignment '{person_id}:{role_id}' was not found"
            )));
        }

        Ok(())
    }

    pub(super) async fn list_person_roles_impl(
        &self,
        person_id: PersonId,
    ) -> AppResult<Vec<PersonRoleAssignment>> {
        let rows = sqlx::query_as::<_, PersonRoleRow>(
            r#"
            SELECT
                person_roles.person_id,
                person_roles.role_id,
                roles.name AS role_name,
                to_char(person_roles.assigned_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS assigned_at
            FROM person_roles
            INNER JOIN roles
                ON roles.id = person_roles.role_id
            WHERE person_roles.person_id = $1
            ORDER BY roles.sort_order, roles.name
            "#,
        )
        .bind(person_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list person roles: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| PersonRoleAssignment {
                person_id: PersonId::from_uuid(row.person_id),
                role_id: row.role_id.to_string(),
                role_name: row.role_name,
                assigned_at: row.assigned_at,
            })
            .collect())
    }

    pub(super) async fn load_person_grants_impl(
        &self,
        person_id: PersonId,
    ) -> AppResult<Vec<PersonRoleGrants>> {
        let rows = sqlx::query_as::<_, PersonGrantRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                permissions.code,
                permissions.bitfield,
                permissions.is_deprecated
            FROM person_roles
            INNER JOIN roles
                ON roles.id = person_roles.role_id
            LEFT JOIN role_permissions
                ON role_permissions.role_id = roles.id
            LEFT JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE person_roles.person_id = $1
            ORDER BY roles.sort_order, roles.name, permissions.code
            "#,
        )
        .bind(person_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load grants for person '{person_id}': {error}"))
        })?;

        aggregate_grants(rows)
    }

    pub(super) async fn list_role_holders_impl(&self, role_id: uuid::Uuid) -> AppResult<Vec<PersonId>> {
        let holders = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT person_id
            FROM person_roles
            WHERE role_id = $1
            ORDER BY person_id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role holders: {error}")))?;

        Ok(holders.into_iter().map(PersonId::from_uuid).collect())
    }
}
