use super::*;
use rstest::rstest;

#[rstest]
#[case(AppError::NotFound("test".into()), 404, "NOT_FOUND")]
#[case(AppError::Validation("test".into()), 400, "VALIDATION_ERROR")]
#[case(AppError::PayloadTooLarge("test".into()), 413, "PAYLOAD_TOO_LARGE")]
#[case(AppError::NotManaged("test".into()), 400, "NOT_MANAGED")]
#[case(AppError::ExternalService("test".into()), 502, "EXTERNAL_SERVICE_ERROR")]
#[case(AppError::Internal("test".into()), 500, "INTERNAL_ERROR")]
fn test_app_error_status_and_code(
    #[case] error: AppError,
    #[case] status: u16,
    #[case] code: &str,
) {
    assert_eq!(error.status_code(), status);
    assert_eq!(error.error_code(), code);
}

#[test]
fn test_app_error_display() {
    assert_eq!(
        format!("{}", AppError::NotFound("msg".into())),
        "Not found: msg"
    );
    assert_eq!(
        format!("{}", AppError::NotManaged("msg".into())),
        "Not managed: msg"
    );
    assert_eq!(
        format!("{}", AppError::ExternalService("msg".into())),
        "External service error: msg"
    );
}
