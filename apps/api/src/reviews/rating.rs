//! Average rating as stored on the user row and used for `reputationScore`.

pub const MIN_REVIEW_RATING: i16 = 1;
pub const MAX_REVIEW_RATING: i16 = 5;

/// Rounds to 2 decimal places, half away from zero.
pub fn round_rating(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of the received ratings, or `None` when there are none yet.
pub fn average_rating(ratings: &[i16]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: f64 = ratings.iter().map(|&r| f64::from(r)).sum();
    Some(round_rating(sum / ratings.len() as f64))
}

pub fn is_valid_rating(rating: i16) -> bool {
    (MIN_REVIEW_RATING..=MAX_REVIEW_RATING).contains(&rating)
}
