use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::reviews::{CreateReviewRequest, ReviewList, ReviewQuery},
    entity::{
        products::Entity as Products,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
        sellers::Entity as Sellers,
    },
    error::{AppError, AppResult, orm_conflict_on_unique},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    services::review_from_entity,
    state::AppState,
};

/// What a review is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTarget {
    Product(Uuid),
    Seller(Uuid),
}

impl ReviewTarget {
    pub fn from_ids(product_id: Option<Uuid>, seller_id: Option<Uuid>) -> AppResult<Self> {
        match (product_id, seller_id) {
            (Some(id), None) => Ok(ReviewTarget::Product(id)),
            (None, Some(id)) => Ok(ReviewTarget::Seller(id)),
            _ => Err(AppError::bad_request(
                "exactly one of product_id or seller_id is required",
            )),
        }
    }

    fn condition(self) -> Condition {
        match self {
            ReviewTarget::Product(id) => Condition::all().add(ReviewCol::ProductId.eq(id)),
            ReviewTarget::Seller(id) => Condition::all().add(ReviewCol::SellerId.eq(id)),
        }
    }
}

pub fn validate_review(payload: &CreateReviewRequest) -> AppResult<ReviewTarget> {
    let target = ReviewTarget::from_ids(payload.product_id, payload.seller_id)?;
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::bad_request("rating must be between 1 and 5"));
    }
    if payload.comment.trim().is_empty() {
        return Err(AppError::bad_request("comment is required"));
    }
    Ok(target)
}

pub async fn list_reviews(
    state: &AppState,
    query: ReviewQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    let target = ReviewTarget::from_ids(query.product_id, query.seller_id)?;
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Reviews::find()
        .filter(target.condition())
        .order_by_desc(ReviewCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items: Vec<Review> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    let (average,): (Option<f64>,) = match target {
        ReviewTarget::Product(id) => {
            sqlx::query_as("SELECT AVG(rating)::float8 FROM reviews WHERE product_id = $1")
                .bind(id)
                .fetch_one(&state.pool)
                .await?
        }
        ReviewTarget::Seller(id) => {
            sqlx::query_as("SELECT AVG(rating)::float8 FROM reviews WHERE seller_id = $1")
                .bind(id)
                .fetch_one(&state.pool)
                .await?
        }
    };
    let average_rating = average.map(|avg| (avg * 10.0).round() / 10.0);

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList {
            items,
            average_rating,
        },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let target = validate_review(&payload)?;

    let exists = match target {
        ReviewTarget::Product(id) => Products::find_by_id(id).count(&state.orm).await? > 0,
        ReviewTarget::Seller(id) => Sellers::find_by_id(id).count(&state.orm).await? > 0,
    };
    if !exists {
        return Err(match target {
            ReviewTarget::Product(_) => AppError::Missing("Product"),
            ReviewTarget::Seller(_) => AppError::Missing("Seller"),
        });
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        user_name: Set(user.name.clone()),
        rating: Set(payload.rating),
        comment: Set(payload.comment.trim().to_string()),
        product_id: Set(payload.product_id),
        seller_id: Set(payload.seller_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| orm_conflict_on_unique(e, "You have already reviewed this"))?;

    tracing::info!(review_id = %review.id, ?target, rating = review.rating, "review created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review created",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(product: Option<Uuid>, seller: Option<Uuid>, rating: i32) -> CreateReviewRequest {
        CreateReviewRequest {
            product_id: product,
            seller_id: seller,
            rating,
            comment: "Lovely glaze".into(),
        }
    }

    #[test]
    fn requires_exactly_one_target() {
        let id = Some(Uuid::new_v4());
        assert!(validate_review(&request(None, None, 5)).is_err());
        assert!(validate_review(&request(id, id, 5)).is_err());
        assert!(matches!(
            validate_review(&request(id, None, 5)),
            Ok(ReviewTarget::Product(_))
        ));
        assert!(matches!(
            validate_review(&request(None, id, 5)),
            Ok(ReviewTarget::Seller(_))
        ));
    }

    #[test]
    fn rating_must_be_one_to_five() {
        let id = Some(Uuid::new_v4());
        assert!(validate_review(&request(id, None, 0)).is_err());
        assert!(validate_review(&request(id, None, 6)).is_err());
        assert!(validate_review(&request(id, None, 1)).is_ok());
    }

    #[test]
    fn blank_comment_is_rejected() {
        let mut r = request(Some(Uuid::new_v4()), None, 4);
        r.comment = "   ".into();
        assert!(matches!(validate_review(&r), Err(AppError::BadRequest(_))));
    }
}
