pub mod recipe;

pub use recipe::{Rating, Recipe, Step, User};
