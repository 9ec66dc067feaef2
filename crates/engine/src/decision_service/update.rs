use super::*;

impl AccessDecisionService {
    /// Authorizes mutating an existing row with the proposed changes.
    ///
    /// Gate order: entity permission, row visibility, every payload field,
    /// then the immutability and system-protection guard. Any failure is
    /// terminal; there is no partial application.
    pub async fn authorize_update(
        &self,
        subject: &Subject,
        entity_key: &str,
        row: Option<&Value>,
        proposed_changes: &Value,
    ) -> AppResult<AccessDecision> {
        let descriptor = self.descriptor(entity_key)?;

        if let Some(denied) = self.entity_gate(descriptor, subject, Operation::Update) {
            return Ok(denied);
        }

        if let Some(denied) = self.rls_gate(descriptor, subject, row).await? {
            return Ok(denied);
        }

        if let Some(denied) =
            self.payload_gate(descriptor, subject, Operation::Update, proposed_changes)?
        {
            return Ok(denied);
        }

        if let Some(denied) =
            Self::mutation_gate(descriptor, Operation::Update, row, Some(proposed_changes))
        {
            return Ok(denied);
        }

        Ok(AccessDecision::allowed())
    }
}
