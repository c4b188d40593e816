use super::*;

use crate::permission_ports::PersonRoleAssignment;

impl RoleAdminService {
    /// Assigns a role to a person and clears the person's cached permissions.
    pub async fn assign_role_to_person(&self, person_id: PersonId, role_id: &str) -> AppResult<()> {
        let role = self.require_role(role_id).await?;

        self.roles.assign_role_to_person(person_id, role_id).await?;
        self.invalidator
            .clear_person_permission_cache(person_id)
            .await?;

        info!(person_id = %person_id, role = %role.name, "role assigned");
        Ok(())
    }

    /// Removes a role from a person and clears the person's cached permissions.
    pub async fn remove_role_from_person(
        &self,
        person_id: PersonId,
        role_id: &str,
    ) -> AppResult<()> {
        let role = self.require_role(role_id).await?;

        self.roles
            .remove_role_from_person(person_id, role_id)
            .await?;
        self.invalidator
            .clear_person_permission_cache(person_id)
            .await?;

        info!(person_id = %person_id, role = %role.name, "role removed");
        Ok(())
    }

    /// Lists the roles assigned to a person.
    pub async fn list_person_roles(
        &self,
        person_id: PersonId,
    ) -> AppResult<Vec<PersonRoleAssignment>> {
        self.roles.list_person_roles(person_id).await
    }
}
