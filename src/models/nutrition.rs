use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single recognized food item within an analyzed meal.
///
/// Numeric fields the analysis may omit deserialize to zero; fields this
/// crate never looks at survive round-trips through the flattened map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Macro totals aggregated across the items of one meal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientTotals {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The structured result of food analysis: item list, aggregated totals,
/// free-text summary.
///
/// Stored as an opaque serialized blob; the persistence core only ever reads
/// `total.{calories,protein,carbs,fats}` for aggregation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionPayload {
    #[serde(default)]
    pub items: Vec<FoodItem>,
    #[serde(default)]
    pub total: NutrientTotals,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NutritionPayload {
    /// Convenience constructor for a payload with only macro totals.
    pub fn from_totals(calories: f64, protein: f64, carbs: f64, fats: f64) -> Self {
        Self {
            total: NutrientTotals {
                calories,
                protein,
                carbs,
                fats,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_numerics_default_to_zero() {
        let payload: NutritionPayload = serde_json::from_str(
            r#"{
                "items": [{"name": "Apple"}],
                "total": {"calories": 95},
                "description": "One apple"
            }"#,
        )
        .unwrap();

        assert_eq!(payload.items[0].calories, 0.0);
        assert_eq!(payload.total.calories, 95.0);
        assert_eq!(payload.total.protein, 0.0);
        assert_eq!(payload.total.carbs, 0.0);
        assert_eq!(payload.total.fats, 0.0);
        assert!(payload.total.sugar.is_none());
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let raw = r#"{
            "items": [],
            "total": {"calories": 10, "protein": 1, "carbs": 2, "fats": 0, "vitaminC": 12},
            "description": "",
            "confidence": 0.9
        }"#;
        let payload: NutritionPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.extra.get("confidence"), Some(&Value::from(0.9)));
        assert_eq!(payload.total.extra.get("vitaminC"), Some(&Value::from(12)));

        let json = serde_json::to_string(&payload).unwrap();
        let reparsed: NutritionPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed, payload);
    }

    #[test]
    fn test_full_item_fields() {
        let item: FoodItem = serde_json::from_str(
            r#"{
                "name": "Grilled chicken",
                "quantity": 1,
                "unit": "serving",
                "calories": 250,
                "protein": 40,
                "carbs": 0,
                "fats": 8,
                "sodium": 320,
                "portion": "1 breast"
            }"#,
        )
        .unwrap();
        assert_eq!(item.protein, 40.0);
        assert_eq!(item.sodium, Some(320.0));
        assert_eq!(item.portion.as_deref(), Some("1 breast"));
        assert!(item.sugar.is_none());
    }

    #[test]
    fn test_from_totals() {
        let payload = NutritionPayload::from_totals(500.0, 30.0, 60.0, 20.0);
        assert_eq!(payload.total.calories, 500.0);
        assert_eq!(payload.total.fats, 20.0);
        assert!(payload.items.is_empty());
    }
}
