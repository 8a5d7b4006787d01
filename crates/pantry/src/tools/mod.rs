//! Tool adapters: argument marshaling on the way in, text rendering on the
//! way out.

mod grocery;
mod health;
mod recipes;
mod store;

pub use grocery::PlaceOrder;
pub use health::{CalculateBmi, ValidateAge, ValidateHeight, ValidateWeight};
pub use recipes::RecipeSearch;
pub use store::{GetItem, STORE_UNAVAILABLE_MESSAGE};
