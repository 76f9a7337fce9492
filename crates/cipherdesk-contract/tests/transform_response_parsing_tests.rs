//! Integration tests for transform request/response contract handling.

use cipherdesk_contract::{ContractError, TransformRequest, parse_transform_response};
use cipherdesk_core::{AuthorizationCode, Payload, TransformOperation};

#[test]
fn transform_response_parsing_tests_encrypt_reads_data() {
    let parsed = parse_transform_response(TransformOperation::Encrypt, r#"{"data":"cipher"}"#)
        .expect("encrypt response should parse");
    assert_eq!(parsed, "cipher");
}

#[test]
fn transform_response_parsing_tests_rejects_invalid_json_and_wrong_types() {
    let error = parse_transform_response(TransformOperation::Encrypt, "<html>down</html>")
        .expect_err("html body should fail");
    assert!(matches!(error, ContractError::Decode(_)));

    let error = parse_transform_response(TransformOperation::Decrypt, r#"{"decp":42}"#)
        .expect_err("numeric field should fail");
    assert!(matches!(error, ContractError::Decode(_)));
}

#[test]
fn transform_response_parsing_tests_request_body_carries_data_and_code() {
    let request = TransformRequest::new(
        &Payload::typed("plain text"),
        &AuthorizationCode::new("open-sesame"),
    );
    let encoded = request.to_json_bytes().expect("request should encode");
    let value: serde_json::Value = serde_json::from_slice(&encoded).expect("valid json");

    assert_eq!(value["data"], "plain text");
    assert_eq!(value["code"], "open-sesame");
    assert!(!format!("{request:?}").contains("open-sesame"));
}
