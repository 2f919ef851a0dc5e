//! Movie entity model and DTOs.

use marquee_core::runtime::Runtime;
use marquee_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `movies` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Movie {
    pub id: DbId,
    #[serde(skip_serializing)]
    pub created_at: Timestamp,
    pub title: String,
    pub year: i32,
    #[sqlx(try_from = "i32")]
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub version: i32,
}

/// DTO for inserting a movie.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

/// Partial update. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMovie {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl Movie {
    /// Apply the non-`None` fields of `input` in place.
    pub fn apply(&mut self, input: UpdateMovie) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(year) = input.year {
            self.year = year;
        }
        if let Some(runtime) = input.runtime {
            self.runtime = runtime;
        }
        if let Some(genres) = input.genres {
            self.genres = genres;
        }
    }
}
