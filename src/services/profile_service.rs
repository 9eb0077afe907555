use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    dto::profile::{ContactRequest, CustomerProfile},
    entity::{
        contact_messages::ActiveModel as ContactActive,
        profile_records::{self, Column as RecordCol, Entity as ProfileRecords},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::{ContactMessage, ProfileKind, ProfileRecord, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Replaces `card_number` with its last four digits as `card_last4`.
pub fn mask_payment(mut data: Value) -> Value {
    if let Some(fields) = data.as_object_mut() {
        if let Some(number) = fields.remove("card_number") {
            let raw = match &number {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => String::new(),
            };
            let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
            let last4 = &digits[digits.len().saturating_sub(4)..];
            fields.insert("card_last4".into(), Value::String(last4.to_string()));
        }
        fields.remove("cvv");
    }
    data
}

fn record_from_entity(model: profile_records::Model) -> ProfileRecord {
    ProfileRecord {
        id: model.id,
        user_id: model.user_id,
        kind: model.kind,
        data: model.data,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub async fn get_profile(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CustomerProfile>> {
    let account = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::Missing("User"))?;

    let records = ProfileRecords::find()
        .filter(RecordCol::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?;

    let mut address = None;
    let mut payment = None;
    for record in records.into_iter().map(record_from_entity) {
        match record.kind.as_str() {
            "address" => address = Some(record),
            "payment" => payment = Some(record),
            other => tracing::warn!(kind = other, "unknown profile record kind"),
        }
    }

    Ok(ApiResponse::success(
        "Profile",
        CustomerProfile {
            user: account,
            address,
            payment,
        },
        Some(Meta::empty()),
    ))
}

pub async fn upsert_record(
    state: &AppState,
    user: &AuthUser,
    kind: ProfileKind,
    data: Value,
) -> AppResult<ApiResponse<ProfileRecord>> {
    match data.as_object() {
        Some(fields) if !fields.is_empty() => {}
        _ => return Err(AppError::bad_request(format!("{} must be a non-empty object", kind.as_str()))),
    }
    let data = match kind {
        ProfileKind::Payment => mask_payment(data),
        ProfileKind::Address => data,
    };

    let record = sqlx::query_as::<_, ProfileRecord>(
        r#"
        INSERT INTO profile_records (id, user_id, kind, data)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, kind)
        DO UPDATE SET data = EXCLUDED.data, updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(kind.as_str())
    .bind(&data)
    .fetch_one(&state.pool)
    .await?;

    tracing::debug!(user_id = %user.user_id, kind = kind.as_str(), "profile record saved");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "profile_upsert",
        "profile_records",
        serde_json::json!({ "record_id": record.id, "kind": kind.as_str() }),
    )
    .await;
    Ok(ApiResponse::success("Profile updated", record, Some(Meta::empty())))
}

pub fn validate_contact(payload: &ContactRequest) -> AppResult<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    if !payload.email.contains('@') {
        return Err(AppError::bad_request("a valid email is required"));
    }
    if payload.subject.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(AppError::bad_request("subject and message are required"));
    }
    Ok(())
}

pub async fn submit_contact(
    state: &AppState,
    user: &MaybeAuthUser,
    payload: ContactRequest,
) -> AppResult<ApiResponse<ContactMessage>> {
    validate_contact(&payload)?;

    let saved = ContactActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.0.as_ref().map(|u| u.user_id)),
        name: Set(payload.name.trim().to_string()),
        email: Set(payload.email.trim().to_string()),
        subject: Set(payload.subject.trim().to_string()),
        message: Set(payload.message.trim().to_string()),
        created_at: sea_orm::ActiveValue::NotSet,
    }
    .insert(&state.orm)
    .await?;

    // no mail transport; the notification is only logged
    tracing::info!(
        message_id = %saved.id,
        from = %saved.email,
        subject = %saved.subject,
        "contact notification sent"
    );
    audit::record(
        &state.pool,
        saved.user_id,
        "contact_submit",
        "contact_messages",
        serde_json::json!({ "message_id": saved.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Message received",
        ContactMessage {
            id: saved.id,
            user_id: saved.user_id,
            name: saved.name,
            email: saved.email,
            subject: saved.subject,
            message: saved.message,
            created_at: saved.created_at.with_timezone(&Utc),
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn card_number_is_reduced_to_last_four() {
        let masked = mask_payment(json!({
            "card_holder": "Ada",
            "card_number": "4242 4242 4242 1234",
            "cvv": "123",
        }));
        assert_eq!(masked, json!({ "card_holder": "Ada", "card_last4": "1234" }));
    }

    #[test]
    fn short_or_missing_numbers_are_handled() {
        assert_eq!(
            mask_payment(json!({ "card_number": "12" })),
            json!({ "card_last4": "12" })
        );
        assert_eq!(
            mask_payment(json!({ "method": "paypal" })),
            json!({ "method": "paypal" })
        );
    }

    #[test]
    fn numeric_card_numbers_are_masked_too() {
        assert_eq!(
            mask_payment(json!({ "card_number": 4242424242421234u64, "cvv": 123 })),
            json!({ "card_last4": "1234" })
        );
    }

    #[test]
    fn contact_requires_all_fields() {
        let ok = ContactRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            subject: "Custom order".into(),
            message: "Do you make teapots?".into(),
        };
        assert!(validate_contact(&ok).is_ok());
        assert!(
            validate_contact(&ContactRequest {
                email: "nope".into(),
                ..ok
            })
            .is_err()
        );
    }
}
