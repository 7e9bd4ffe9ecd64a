mod meal;
mod meal_type;
mod nutrition;
mod water;

pub use meal::MealRecord;
pub use meal_type::MealType;
pub use nutrition::{FoodItem, NutrientTotals, NutritionPayload};
pub use water::WaterLog;
