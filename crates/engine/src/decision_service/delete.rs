use super::*;

impl AccessDecisionService {
    /// Authorizes deleting an existing row.
    ///
    /// Deletes carry no payload, so the field gate does not apply; the
    /// entity gate, row visibility, and the system-protection guard do.
    pub async fn authorize_delete(
        &self,
        subject: &Subject,
        entity_key: &str,
        row: Option<&Value>,
    ) -> AppResult<AccessDecision> {
        let descriptor = self.descriptor(entity_key)?;

        if let Some(denied) = self.entity_gate(descriptor, subject, Operation::Delete) {
            return Ok(denied);
        }

        if let Some(denied) = self.rls_gate(descriptor, subject, row).await? {
            return Ok(denied);
        }

        if let Some(denied) = Self::mutation_gate(descriptor, Operation::Delete, row, None) {
            return Ok(denied);
        }

        Ok(AccessDecision::allowed())
    }
}
