use super::*;

#[test]
fn trim_request_accepts_numbers_and_numeric_strings() {
    let from_numbers: TrimFlowerRequest =
        serde_json::from_value(serde_json::json!({ "flower_id": 12, "vase_id": 3 }))
            .expect("numbers");
    assert_eq!((from_numbers.flower_id, from_numbers.vase_id), (12, 3));

    let from_strings: TrimFlowerRequest =
        serde_json::from_value(serde_json::json!({ "flower_id": "12", "vase_id": "3" }))
            .expect("strings");
    assert_eq!((from_strings.flower_id, from_strings.vase_id), (12, 3));
}

#[test]
fn change_water_request_accepts_string_vase() {
    let req: ChangeWaterRequest =
        serde_json::from_value(serde_json::json!({ "vase_id": "2" })).expect("string");
    assert_eq!(req.vase_id, 2);
}

#[test]
fn non_numeric_or_missing_ids_are_rejected() {
    let err = serde_json::from_value::<TrimFlowerRequest>(
        serde_json::json!({ "flower_id": "tulip", "vase_id": 1 }),
    )
    .expect_err("not a number");
    assert!(err.to_string().contains("'tulip' is not a numeric id"));

    assert!(serde_json::from_value::<ChangeWaterRequest>(serde_json::json!({})).is_err());
    assert!(
        serde_json::from_value::<ChangeWaterRequest>(serde_json::json!({ "vase_id": 1.5 }))
            .is_err()
    );
}

#[test]
fn failed_action_serializes_error_without_flower_id() {
    let body = serde_json::to_value(ActionResponse::failed(ApiError::new(
        crate::error::ErrorCode::Validation,
        "bad body",
    )))
    .expect("json");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "validation");
    assert!(body.get("flower_id").is_none());
}
