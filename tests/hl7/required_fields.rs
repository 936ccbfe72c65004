use hl7tools::message::{DelimiterSet, MessageModel};
use hl7tools::schema::{Schema, SchemaDefinition};
use hl7tools::validate::missing_required_fields;
use hl7tools::Session;

#[test]
fn compliant_message_has_no_violations() {
    let text = "MSH|^~\\&|A|B|C|D|20240101||ADT^A01|1|P|2.3\rEVN|A01|20240101\rPID|1||123||Doe^John\rPV1|1|O\r";
    let session = Session::new(text);
    assert_eq!(session.schema().version, "2.3");
    assert!(session.missing_required_fields().is_empty());
}

#[test]
fn violations_are_reported_in_document_order() {
    let text = "MSH|^~\\&|A|B|C|D|20240101||ADT^A01|1|P|2.3\rPID|1\rPV1|1\r";
    let session = Session::new(text);

    let found: Vec<_> = session
        .missing_required_fields()
        .into_iter()
        .map(|v| (v.line_number, v.location))
        .collect();
    assert_eq!(
        found,
        vec![
            (2, "PID-3".to_string()),
            (2, "PID-5".to_string()),
            (3, "PV1-2".to_string()),
        ]
    );
}

#[test]
fn violation_carries_the_field_description() {
    let text = "MSH|^~\\&|A|B|C|D|20240101||ADT^A01||P|2.3\r";
    let violations = Session::new(text).missing_required_fields();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].location, "MSH-10");
    assert_eq!(violations[0].description, "Message Control ID");
}

#[test]
fn undefined_segments_are_skipped() {
    let text = "ZZ1|\rZZ2|||\r";
    let model = MessageModel::parse(text, &DelimiterSet::default());
    assert!(missing_required_fields(&model, &Schema::embedded("2.5").segments).is_empty());
    assert!(missing_required_fields(&model, &SchemaDefinition::default()).is_empty());
}
