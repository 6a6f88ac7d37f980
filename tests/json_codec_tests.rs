//! Public-API tests for the JSON codec
//!
//! Unit tests next to each codec module cover the grammar in detail; these
//! check the properties callers rely on.

use docserve::json::{self, JsonError, JsonValue, Limits, Map};

#[test]
fn test_documents_survive_a_round_trip() {
    let docs = [
        r#"{"data":"abcde12345"}"#,
        r#"{"a":[1,2.5,-3e2,true,false,null],"b":{"c":"é\n"}}"#,
        r#"[[],{},"",0,-0.0]"#,
        r#""just a string""#,
        "12345678901234",
        "1e400",
        r#"{"x":[-1E+400,18446744073709551616]}"#,
    ];
    for doc in docs {
        let value = json::decode(doc).unwrap();
        let text = json::encode(&value).unwrap();
        assert_eq!(json::decode(&text).unwrap(), value, "{doc}");
    }
}

#[test]
fn test_malformed_inputs() {
    for bad in [
        "",
        "   ",
        r#"{"a":1"#,
        r#"{"a":1]"#,
        r#""unterminated"#,
        r#""bad \q escape""#,
        "[1,2] extra",
        "{1:2}",
        "tru",
        "01",
    ] {
        let err = json::decode(bad).unwrap_err();
        assert!(err.is_malformed(), "{bad:?} gave {err:?}");
    }
}

#[test]
fn test_depth_limit_guards_the_stack() {
    let deep = format!("{}{}", "[".repeat(2000), "]".repeat(2000));
    assert_eq!(
        json::decode(&deep),
        Err(JsonError::DepthLimitExceeded { limit: 1000 })
    );

    let objects = format!("{}1{}", r#"{"k":"#.repeat(1500), "}".repeat(1500));
    assert!(matches!(
        json::decode(&objects),
        Err(JsonError::DepthLimitExceeded { .. })
    ));

    let shallow = format!("{}{}", "[".repeat(10), "]".repeat(10));
    assert!(json::decode_with_limits(&shallow, Limits::with_max_depth(10)).is_ok());
    assert!(json::decode_with_limits(&shallow, Limits::with_max_depth(9)).is_err());
}

#[test]
fn test_duplicate_keys_last_wins() {
    let value = json::decode(r#"{"k":1,"k":2}"#).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(value.get("k").and_then(|v| v.as_number()).and_then(|n| n.as_i64()), Some(2));
}

#[test]
fn test_serde_json_interop() {
    let ours = json::decode(r#"{"list":[1,"two",null],"flag":true}"#).unwrap();
    let theirs = serde_json::Value::try_from(ours.clone()).unwrap();
    assert_eq!(theirs["list"][1], "two");
    assert_eq!(JsonValue::from(theirs), ours);

    let mut map = Map::new();
    map.insert("x".to_string(), JsonValue::from(f64::NAN));
    assert_eq!(
        serde_json::Value::try_from(JsonValue::Object(map.clone())),
        Err(JsonError::NonFiniteNumber)
    );
    assert_eq!(
        json::encode(&JsonValue::Object(map)),
        Err(JsonError::NonFiniteNumber)
    );
}
