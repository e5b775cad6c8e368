use crate::service::error::ServiceError;
use serde::{Deserialize, Serialize};

// ==========================================
// 公共工具：错误映射、响应包装
// ==========================================

/// 错误响应 (返回给调用方)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// HTTP 状态码
    pub status: u16,

    /// 错误消息
    pub message: String,
}

impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        let (code, status) = match &err {
            ServiceError::ValidationError(_) => ("VALIDATION_ERROR", 400),
            ServiceError::Unauthorized(_) => ("UNAUTHORIZED", 401),
            ServiceError::Forbidden(_) => ("FORBIDDEN", 403),
            ServiceError::NotFound(_) => ("NOT_FOUND", 404),
            ServiceError::ConstraintViolation(_) => ("CONSTRAINT_VIOLATION", 409),
            ServiceError::DatabaseError(_) => ("DATABASE_ERROR", 500),
            ServiceError::InternalError(_) => ("INTERNAL_ERROR", 500),
        };

        ErrorResponse {
            code: code.to_string(),
            status,
            message: err.to_string(),
        }
    }
}

/// 将 ServiceError 转换为 ErrorResponse (服务端错误记日志)
pub(crate) fn map_service_error(err: ServiceError) -> ErrorResponse {
    let response = ErrorResponse::from(err);
    if response.status >= 500 {
        tracing::error!("命令执行失败: code={}, message={}", response.code, response.message);
    }
    response
}

/// 成功响应 (状态码 + 响应体)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply<T> {
    pub status: u16,
    pub body: T,
}

impl<T> Reply<T> {
    pub fn ok(body: T) -> Self {
        Self { status: 200, body }
    }

    pub fn created(body: T) -> Self {
        Self { status: 201, body }
    }
}

impl Reply<()> {
    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: (),
        }
    }
}

pub type CommandResult<T> = Result<Reply<T>, ErrorResponse>;

/// 空串 (含纯空白) 视为未提供
pub(super) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy_status_codes() {
        let cases = [
            (ServiceError::validation("x"), 400, "VALIDATION_ERROR"),
            (ServiceError::unauthorized("x"), 401, "UNAUTHORIZED"),
            (ServiceError::forbidden("x"), 403, "FORBIDDEN"),
            (ServiceError::NotFound("x".to_string()), 404, "NOT_FOUND"),
            (
                ServiceError::ConstraintViolation("x".to_string()),
                409,
                "CONSTRAINT_VIOLATION",
            ),
            (ServiceError::DatabaseError("x".to_string()), 500, "DATABASE_ERROR"),
        ];

        for (err, status, code) in cases {
            let resp = map_service_error(err);
            assert_eq!(resp.status, status);
            assert_eq!(resp.code, code);
        }
    }
}
