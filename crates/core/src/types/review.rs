//! Product reviews.
//!
//! Reviews belong to the content store, attached to a product document. The
//! storefront only validates new submissions and computes the average rating
//! when a product is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted star rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted star rating.
pub const MAX_RATING: i64 = 5;

/// Reasons a review submission is rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewValidationError {
    /// Product id, name, comment or rating is absent.
    #[error("Missing required fields")]
    MissingFields,
    /// Rating is outside 1..=5.
    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange(i64),
}

/// A review as stored on a product document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    /// Submission time, stamped by the server.
    #[serde(default)]
    pub date: DateTime<Utc>,
}

/// A review as submitted by a visitor.
///
/// A missing rating deserializes as 0, which is reported as a missing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewInput {
    pub name: String,
    pub rating: i64,
    pub comment: String,
}

impl ReviewInput {
    /// Validate the submission and stamp it with `date`.
    ///
    /// Name and comment are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewValidationError`] for blank fields or a rating outside
    /// 1..=5.
    pub fn into_review(self, date: DateTime<Utc>) -> Result<Review, ReviewValidationError> {
        let name = self.name.trim();
        let comment = self.comment.trim();

        if name.is_empty() || comment.is_empty() || self.rating == 0 {
            return Err(ReviewValidationError::MissingFields);
        }

        let rating = u8::try_from(self.rating)
            .ok()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(&i64::from(*r)))
            .ok_or(ReviewValidationError::RatingOutOfRange(self.rating))?;

        Ok(Review {
            name: name.to_string(),
            rating,
            comment: comment.to_string(),
            date,
        })
    }
}

/// Arithmetic mean of the ratings, or `None` with no rated reviews.
///
/// Stored ratings outside 1..=5, including a missing rating read as 0, are
/// left out of the mean.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    let rated: Vec<u32> = reviews
        .iter()
        .map(|r| u32::from(r.rating))
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(&i64::from(*r)))
        .collect();
    if rated.is_empty() {
        return None;
    }

    let total: u32 = rated.iter().sum();
    #[allow(clippy::cast_precision_loss)] // Review counts never approach f64 precision limits
    let count = rated.len() as f64;
    Some(f64::from(total) / count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(rating: i64) -> ReviewInput {
        ReviewInput {
            name: "  Sam ".to_string(),
            rating,
            comment: " Great lamp ".to_string(),
        }
    }

    #[test]
    fn test_valid_review_is_trimmed_and_stamped() {
        let now = Utc::now();
        let review = input(4).into_review(now).unwrap();
        assert_eq!(review.name, "Sam");
        assert_eq!(review.comment, "Great lamp");
        assert_eq!(review.rating, 4);
        assert_eq!(review.date, now);
    }

    #[test]
    fn test_rating_zero_is_missing() {
        assert_eq!(
            input(0).into_review(Utc::now()),
            Err(ReviewValidationError::MissingFields)
        );
    }

    #[test]
    fn test_rating_out_of_range() {
        assert_eq!(
            input(6).into_review(Utc::now()),
            Err(ReviewValidationError::RatingOutOfRange(6))
        );
        assert_eq!(
            input(-1).into_review(Utc::now()),
            Err(ReviewValidationError::RatingOutOfRange(-1))
        );
    }

    #[test]
    fn test_bounds_accepted() {
        assert!(input(1).into_review(Utc::now()).is_ok());
        assert!(input(5).into_review(Utc::now()).is_ok());
    }

    #[test]
    fn test_blank_comment_rejected() {
        let review = ReviewInput {
            comment: "   ".to_string(),
            ..input(3)
        };
        assert_eq!(
            review.into_review(Utc::now()),
            Err(ReviewValidationError::MissingFields)
        );
    }

    #[test]
    fn test_average_rating() {
        let now = Utc::now();
        let reviews: Vec<Review> = [5, 4, 3]
            .into_iter()
            .map(|r| input(r).into_review(now).unwrap())
            .collect();
        let avg = average_rating(&reviews).unwrap();
        assert!((avg - 4.0).abs() < f64::EPSILON);
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn test_average_skips_unrated_reviews() {
        let unrated: Review = serde_json::from_str(r#"{"name":"Jo","comment":"hm"}"#).unwrap();
        let mut reviews = vec![unrated.clone(), input(4).into_review(Utc::now()).unwrap()];
        assert_eq!(average_rating(&reviews), Some(4.0));

        reviews.remove(1);
        assert_eq!(average_rating(&reviews), None);

        let wild = Review {
            rating: 9,
            ..unrated
        };
        assert_eq!(average_rating(&[wild]), None);
    }

    #[test]
    fn test_stored_review_tolerates_missing_fields() {
        let review: Review =
            serde_json::from_str(r#"{"_key":"abc","name":"Jo","rating":5}"#).unwrap();
        assert_eq!(review.rating, 5);
        assert!(review.comment.is_empty());
    }
}
