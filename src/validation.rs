use serde_json::Value;

use crate::error::GatewayError;

/// A shape check run on a parsed request body before it is forwarded.
pub type Validator = fn(&Value) -> Result<(), GatewayError>;

fn require_string(body: &Value, field: &str, label: &str) -> Result<(), GatewayError> {
    match body.get(field).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(GatewayError::validation(format!("{label} is required"))),
    }
}

fn require_array(body: &Value, field: &str, label: &str) -> Result<(), GatewayError> {
    match body.get(field).and_then(Value::as_array) {
        Some(items) if !items.is_empty() => Ok(()),
        _ => Err(GatewayError::validation(format!(
            "{label} must contain at least one item"
        ))),
    }
}

fn require_number(body: &Value, field: &str, label: &str) -> Result<(), GatewayError> {
    match body.get(field) {
        Some(Value::Number(_)) => Ok(()),
        _ => Err(GatewayError::validation(format!("{label} must be a number"))),
    }
}

/// Court create and update: every descriptive field plus at least one image.
pub fn court(body: &Value) -> Result<(), GatewayError> {
    require_string(body, "name", "Name")?;
    require_string(body, "address", "Address")?;
    require_string(body, "sportType", "Sport type")?;
    require_array(body, "imgUrls", "Images")
}

pub fn advertisement(body: &Value) -> Result<(), GatewayError> {
    require_string(body, "title", "Title")?;
    require_string(body, "imgUrl", "Image")
}

pub fn advertisement_priority(body: &Value) -> Result<(), GatewayError> {
    require_number(body, "priority", "Priority")
}

pub fn subscription(body: &Value) -> Result<(), GatewayError> {
    require_string(body, "name", "Name")?;
    require_number(body, "price", "Price")
}

pub fn sport_type(body: &Value) -> Result<(), GatewayError> {
    require_string(body, "name", "Name")
}
