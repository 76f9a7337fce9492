//! Validates contract fixtures and client output against frozen JSON schemas.

use cipherdesk_contract::{TransformRequest, parse_transform_response};
use cipherdesk_core::{AuthorizationCode, Payload, TransformOperation};
use jsonschema::JSONSchema;
use serde_json::Value;

fn contract_path(relative: &str) -> String {
    format!("{}/../../contracts/{relative}", env!("CARGO_MANIFEST_DIR"))
}

fn load_json(relative: &str) -> Value {
    let raw =
        std::fs::read_to_string(contract_path(relative)).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema: &str) -> JSONSchema {
    JSONSchema::compile(&load_json(schema)).expect("schema should compile")
}

#[test]
fn request_fixture_and_client_body_match_schema() {
    let validator = compile_validator("transform-request.schema.json");
    assert!(validator.is_valid(&load_json("fixtures/transform-request.valid.json")));

    let request = TransformRequest::new(
        &Payload::typed("Meet me at the usual place.\n"),
        &AuthorizationCode::new("open-sesame"),
    );
    let encoded = request.to_json_bytes().expect("request should encode");
    let body: Value = serde_json::from_slice(&encoded).expect("request should be json");
    assert!(
        validator.is_valid(&body),
        "client request body should validate against schema"
    );
}

#[test]
fn encrypt_fixture_matches_schema_and_parses() {
    let validator = compile_validator("encrypt-response.schema.json");
    let fixture = load_json("fixtures/encrypt-response.valid.json");
    assert!(validator.is_valid(&fixture));

    let parsed = parse_transform_response(TransformOperation::Encrypt, &fixture.to_string())
        .expect("fixture should parse");
    assert_eq!(parsed, "U2FsdGVkX1+3c2VjcmV0");
}

#[test]
fn decrypt_fixture_matches_schema_and_parses() {
    let validator = compile_validator("decrypt-response.schema.json");
    let fixture = load_json("fixtures/decrypt-response.valid.json");
    assert!(validator.is_valid(&fixture));
    assert!(
        !validator.is_valid(&load_json("fixtures/encrypt-response.valid.json")),
        "encrypt body must not satisfy the decrypt contract"
    );

    let parsed = parse_transform_response(TransformOperation::Decrypt, &fixture.to_string())
        .expect("fixture should parse");
    assert_eq!(parsed, "Meet me at the usual place.\n");
}
