use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

use crate::error::RetrievalError;

/// API错误类型
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<RetrievalError>() {
            Some(RetrievalError::Decode(_)) => StatusCode::BAD_REQUEST,
            Some(RetrievalError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(RetrievalError::Format(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(RetrievalError::Conflict(_)) => StatusCode::CONFLICT,
            Some(RetrievalError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Some(RetrievalError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("请求处理失败: {:#}", self.0);
        }
        (status, format!("Something went wrong: {}", self.0)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case(RetrievalError::Decode("x".into()), StatusCode::BAD_REQUEST)]
    #[case(RetrievalError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(RetrievalError::Format("x".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(RetrievalError::Conflict("x".into()), StatusCode::CONFLICT)]
    #[case(RetrievalError::Timeout("x".into()), StatusCode::GATEWAY_TIMEOUT)]
    #[case(RetrievalError::StoreUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE)]
    fn test_status(#[case] err: RetrievalError, #[case] expected: StatusCode) {
        assert_eq!(AppError::from(err).into_response().status(), expected);
    }

    #[test]
    fn test_status_other() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
