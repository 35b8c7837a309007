use axum::{
    Json, async_trait,
    extract::{FromRequest, Request},
};
use axum_valid::{Valid, ValidationRejection};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON and failed rules are both reported as `VALIDATION_ERROR`
/// in the usual error envelope.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Valid::<Json<T>>::from_request(req, state).await {
            Ok(Valid(Json(value))) => Ok(ValidatedJson(value)),
            Err(ValidationRejection::Valid(errors)) => {
                debug!("Request body failed validation: {}", errors);
                Err(ApiError::Validation(errors.to_string()))
            }
            Err(ValidationRejection::Inner(rejection)) => {
                debug!("Unreadable request body: {}", rejection.body_text());
                Err(ApiError::Validation(rejection.body_text()))
            }
        }
    }
}
