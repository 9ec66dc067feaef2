use fieldgate_domain::AccessRequirement;

use super::*;

impl AccessDecisionService {
    /// Authorizes inserting a new row from the given payload.
    ///
    /// Gates: entity permission, then every payload field, then the mutation
    /// guard. There is no row yet, so no row-level gate applies.
    pub async fn authorize_create(
        &self,
        subject: &Subject,
        entity_key: &str,
        payload: &Value,
    ) -> AppResult<AccessDecision> {
        let descriptor = self.descriptor(entity_key)?;

        if let Some(denied) = self.entity_gate(descriptor, subject, Operation::Create) {
            return Ok(denied);
        }

        if let Some(denied) = self.payload_gate(descriptor, subject, Operation::Create, payload)? {
            return Ok(denied);
        }

        self.check_required_fields(descriptor, payload)?;

        if let Some(denied) =
            Self::mutation_gate(descriptor, Operation::Create, None, Some(payload))
        {
            return Ok(denied);
        }

        Ok(AccessDecision::allowed())
    }

    /// Required fields must be present on create when they are creatable
    /// through the request path at all. System-managed required fields
    /// (numbers assigned by the storage layer) are exempt.
    fn check_required_fields(
        &self,
        descriptor: &EntityDescriptor,
        payload: &Value,
    ) -> AppResult<()> {
        let object = payload.as_object().ok_or_else(|| {
            AppError::Validation(format!(
                "create payload for '{}' must be a JSON object",
                descriptor.entity_key()
            ))
        })?;

        for (field_name, definition) in descriptor.fields() {
            if !definition.is_required() || definition.default_value().is_some() {
                continue;
            }

            let externally_creatable = descriptor.access_rule(field_name).is_some_and(|rule| {
                matches!(
                    rule.requirement_for(Operation::Create),
                    AccessRequirement::MinimumRole(_)
                )
            });
            if externally_creatable && !object.contains_key(field_name) {
                return Err(AppError::Validation(format!(
                    "required field '{field_name}' missing from '{}' create payload",
                    descriptor.entity_key()
                )));
            }
        }

        Ok(())
    }
}
