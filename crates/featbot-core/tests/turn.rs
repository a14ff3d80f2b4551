use featbot_core::error::CoreError;
use featbot_core::models::display::{expand_turns, DisplayRole};
use featbot_core::models::turn::{SourceDescriptor, TurnRecord};
use serde_json::json;

fn source(uri: &str) -> SourceDescriptor {
    json!({ "location": uri, "score": 0.82 })
        .as_object()
        .cloned()
        .expect("object literal")
}

#[test]
fn empty_question_is_rejected() {
    let err = TurnRecord::new("  ", "answer").unwrap_err();
    assert!(matches!(err, CoreError::EmptyField("question")));
}

#[test]
fn empty_response_is_rejected() {
    let err = TurnRecord::new("question", "").unwrap_err();
    assert!(matches!(err, CoreError::EmptyField("response")));
}

#[test]
fn empty_source_list_is_stored_as_absent() {
    let record = TurnRecord::new("q", "a").unwrap().with_sources(Some(Vec::new()));
    assert!(record.sources().is_none());

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value, json!({ "question": "q", "response": "a" }));
}

#[test]
fn sources_are_serialized_when_present() {
    let record = TurnRecord::new("q", "a")
        .unwrap()
        .with_sources(Some(vec![source("s3://kb/doc.pdf")]));

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["sources"][0]["location"], "s3://kb/doc.pdf");
}

#[test]
fn deserializing_a_blank_record_fails() {
    let result: Result<TurnRecord, _> =
        serde_json::from_value(json!({ "question": "", "response": "a" }));
    assert!(result.is_err());
}

#[test]
fn each_record_expands_to_user_then_assistant() {
    let records = vec![
        TurnRecord::new("What is X?", "X is Y.").unwrap(),
        TurnRecord::new("And Z?", "Z is W.")
            .unwrap()
            .with_sources(Some(vec![source("s3://kb/z.md")])),
    ];

    let messages = expand_turns(&records);
    assert_eq!(messages.len(), 4);

    for (pair, record) in messages.chunks(2).zip(&records) {
        assert_eq!(pair[0].role, DisplayRole::User);
        assert_eq!(pair[0].text, record.question());
        assert!(pair[0].sources.is_none());

        assert_eq!(pair[1].role, DisplayRole::Assistant);
        assert_eq!(pair[1].text, record.response());
        assert_eq!(pair[1].sources.as_deref(), record.sources());
    }
}
