//! Declared transformation model of the georeference annotation.

use georef_common::TransformModel;
use serde_json::Value;
use tracing::{debug, warn};

use crate::CanvasDescription;

/// Highest polynomial order honoured from a description.
pub const MAX_DECLARED_ORDER: u32 = 3;

/// Read `body.transformation = {type: "polynomial", options: {order}}`.
///
/// Never fails: a missing field, another transformation type, or an order that
/// is not an integer in `1..=3` all fall back to a first-order polynomial.
pub fn transform_model(desc: &CanvasDescription) -> TransformModel {
    let Some(transformation) = desc
        .georeference_body()
        .and_then(|body| body.get("transformation"))
    else {
        debug!("No transformation declared, using polynomial order 1");
        return TransformModel::default();
    };

    let kind = transformation.get("type").and_then(Value::as_str);
    if kind != Some("polynomial") {
        warn!(kind = ?kind, "Unsupported transformation type, using polynomial order 1");
        return TransformModel::default();
    }

    let order = match transformation.pointer("/options/order") {
        None => 1,
        Some(value) => match declared_order(value) {
            Ok(order) => order,
            Err(reason) => {
                warn!(order = %value, "{}, using polynomial order 1", reason);
                1
            }
        },
    };

    TransformModel::polynomial(order)
}

/// The declared order, or why it was rejected.
fn declared_order(value: &Value) -> Result<u32, String> {
    let order = value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| v.fract() == 0.0 && *v > 0.0).map(|v| v as u64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| format!("Polynomial order {} is not a positive integer", value))?;
    if order == 0 || order > MAX_DECLARED_ORDER as u64 {
        return Err(format!(
            "Polynomial order {} is outside the supported range 1..={}",
            order, MAX_DECLARED_ORDER
        ));
    }
    Ok(order as u32)
}
