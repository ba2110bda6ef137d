pub mod entry;
pub mod food;
pub mod plan;
pub mod profile;
pub mod settings;
pub mod slot;

pub use entry::{Entry, EntryOrigin, NewEntry};
pub use food::{Food, NewFood};
pub use plan::{day_iso, parse_day_iso, DailyPlan};
pub use profile::{ActivityLevel, Goal, Sex, UserProfile};
pub use settings::{format_clock, parse_clock, MealTimes, Settings};
pub use slot::{default_meal_slots, MealKey, MealSlot};
