// Payload validation - runs before any guard decision or write

use super::errors::GatepassError;
use super::types::{GatepassFields, ItemLine};

fn require(value: &str, field: &str) -> Result<(), GatepassError> {
    if value.trim().is_empty() {
        return Err(GatepassError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Validate the route/content fields of a gatepass
pub fn validate_fields(fields: &GatepassFields) -> Result<(), GatepassError> {
    require(&fields.from_location, "from location")?;
    require(&fields.to_location, "to location")?;
    require(&fields.material_type, "material type")?;
    require(&fields.purpose, "purpose")?;

    if fields
        .from_location
        .trim()
        .eq_ignore_ascii_case(fields.to_location.trim())
    {
        return Err(GatepassError::validation(
            "from and to locations must differ",
        ));
    }

    Ok(())
}

/// Validate the full item set of a gatepass
pub fn validate_items(items: &[ItemLine]) -> Result<(), GatepassError> {
    if items.is_empty() {
        return Err(GatepassError::validation("at least one item is required"));
    }

    for (index, item) in items.iter().enumerate() {
        let line = index + 1;
        if item.item_name.trim().is_empty() {
            return Err(GatepassError::validation(format!(
                "item {line}: name is required"
            )));
        }
        if !item.quantity.is_finite() || item.quantity <= 0.0 {
            return Err(GatepassError::validation(format!(
                "item {line}: quantity must be a positive number"
            )));
        }
        if item.unit.trim().is_empty() {
            return Err(GatepassError::validation(format!(
                "item {line}: unit is required"
            )));
        }
    }

    Ok(())
}

/// A decline must always say why
pub fn validate_decline_reason(reason: &str) -> Result<(), GatepassError> {
    if reason.trim().is_empty() {
        return Err(GatepassError::validation("decline reason required"));
    }
    Ok(())
}

/// Trimmed copies of caller-supplied fields, as they are persisted
pub fn normalize_fields(fields: &GatepassFields) -> GatepassFields {
    GatepassFields {
        from_location: fields.from_location.trim().to_string(),
        to_location: fields.to_location.trim().to_string(),
        material_type: fields.material_type.trim().to_string(),
        purpose: fields.purpose.trim().to_string(),
        requested_for: fields.requested_for,
    }
}

pub fn normalize_items(items: &[ItemLine]) -> Vec<ItemLine> {
    items
        .iter()
        .map(|item| ItemLine {
            item_name: item.item_name.trim().to_string(),
            quantity: item.quantity,
            unit: item.unit.trim().to_string(),
        })
        .collect()
}
