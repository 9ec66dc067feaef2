use crate::filter::filter_for_read;

use super::*;

impl AccessDecisionService {
    /// Authorizes reading a row and returns its redacted projection.
    ///
    /// Pass `None` for the row when the fetch found nothing; the resulting
    /// denial is identical to the one for a row hidden by row-level policy.
    /// Field-level read denials remove fields from the projection instead of
    /// failing the read.
    pub async fn authorize_read(
        &self,
        subject: &Subject,
        entity_key: &str,
        row: Option<&Value>,
    ) -> AppResult<AccessDecision> {
        let descriptor = self.descriptor(entity_key)?;

        if let Some(denied) = self.entity_gate(descriptor, subject, Operation::Read) {
            return Ok(denied);
        }

        if let Some(denied) = self.rls_gate(descriptor, subject, row).await? {
            return Ok(denied);
        }

        // rls_gate already rejected the None case.
        let Some(row) = row else {
            return Err(AppError::Internal(
                "read gate passed without a row".to_owned(),
            ));
        };

        let projection = filter_for_read(descriptor, self.registry.hierarchy(), subject, row);
        Ok(AccessDecision::allowed_with_projection(projection))
    }
}
