use serde::{Deserialize, Serialize};
use std::fmt;

/// Muscle-group label for an exercise. The five standard groups cover the
/// usual UI choices; anything else is kept verbatim as a custom label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Custom(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Chest => "chest",
            Category::Back => "back",
            Category::Legs => "legs",
            Category::Shoulders => "shoulders",
            Category::Arms => "arms",
            Category::Custom(label) => label,
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "chest" => Category::Chest,
            "back" => Category::Back,
            "legs" => Category::Legs,
            "shoulders" => Category::Shoulders,
            "arms" => Category::Arms,
            other => Category::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Category::from_str(&s))
    }
}

/// Listing shape for the exercise picker.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug)]
pub struct ExerciseSummary {
    pub id: i64,
    pub name: String,
}

/// One recorded set joined with its exercise, as shown in the daily views.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug)]
pub struct RecordRow {
    pub category: String,
    pub name: String,
    pub weight: f64,
    pub reps: i64,
    pub total_load: f64,
}

/// Daily rows for the settings page carry the record id so individual sets
/// can be edited or deleted.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug)]
pub struct SettingRecordRow {
    pub id: i64,
    pub category: String,
    pub exercise: String,
    pub weight: f64,
    pub reps: i64,
    pub total_load: f64,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug)]
pub struct CategoryTotal {
    pub category: String,
    pub total_load: f64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserStats {
    #[serde(rename = "registrationDate")]
    pub registration_date: Option<String>,
    #[serde(rename = "workoutDays")]
    pub workout_days: i64,
}
