use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: i32 = 1200;

/// Public profile of an authenticated player
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub player_email_id: String,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub player_id: String,
    #[serde(default = "default_rating")]
    pub player_rating: i32,
}

fn default_rating() -> i32 {
    DEFAULT_RATING
}

impl UserProfile {
    pub fn new(email: &str, name: &str, id: &str) -> Self {
        UserProfile {
            player_email_id: email.to_string(),
            player_name: name.to_string(),
            player_id: id.to_string(),
            player_rating: DEFAULT_RATING,
        }
    }

    /// Shift the rating by `delta`, never below zero
    pub fn adjust_rating(&mut self, delta: i32) {
        self.player_rating = (self.player_rating + delta).max(0);
    }
}
