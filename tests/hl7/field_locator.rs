use hl7tools::locate::{locate, FieldLocation};
use hl7tools::message::{DelimiterSet, MessageModel};
use hl7tools::schema::Schema;

const ADT: &str = "MSH|^~\\&|REG|HOSP|EMR|HOSP|20240101120000||ADT^A01|MSG0001|P|2.4\r\
EVN|A01|20240101120000\r\
PID|1||12345^^^HOSP^MR~67890^^^STATE^SS||Doe^John^Q||19800101|M\r\
NK1|1|Doe^Jane|SPO\r\
PV1|1|I|WARD^101^A\r";

fn resolve(text: &str, query: &str) -> Vec<String> {
    let delimiters = DelimiterSet::from_text(text);
    let model = MessageModel::parse(text, &delimiters);
    let schema = Schema::embedded("2.4");
    locate(&model, text, &schema.segments, &FieldLocation::parse(query))
        .into_iter()
        .map(|m| m.span.text(text).to_string())
        .collect()
}

#[test]
fn structured_queries_resolve_exact_ranges() {
    assert_eq!(resolve(ADT, "PID-5"), vec!["Doe^John^Q"]);
    assert_eq!(resolve(ADT, "PID-5.1"), vec!["Doe"]);
    assert_eq!(resolve(ADT, "pid-7"), vec!["19800101"]);
    assert_eq!(resolve(ADT, "PV1-3.2"), vec!["101"]);
    assert_eq!(resolve(ADT, "MSH-10"), vec!["MSG0001"]);
}

#[test]
fn component_query_yields_one_range_per_repetition() {
    assert_eq!(resolve(ADT, "PID-3.1"), vec!["12345", "67890"]);
    assert_eq!(resolve(ADT, "PID-3.5"), vec!["MR", "SS"]);
    assert_eq!(resolve(ADT, "PID-3"), vec!["12345^^^HOSP^MR~67890^^^STATE^SS"]);
}

#[test]
fn header_delimiter_fields() {
    assert_eq!(resolve(ADT, "MSH-1"), vec!["|"]);
    assert_eq!(resolve(ADT, "MSH-2"), vec!["^~\\&"]);
    assert_eq!(resolve(ADT, "MSH-3"), vec!["REG"]);
}

#[test]
fn missing_segments_and_fields_contribute_nothing() {
    assert!(resolve(ADT, "OBX-5").is_empty());
    assert!(resolve(ADT, "NK1-40").is_empty());
}

#[test]
fn free_text_searches_field_descriptions() {
    let found = resolve(ADT, "date of birth");
    assert_eq!(found, vec!["19800101"]);

    let patient_class = resolve(ADT, "Patient Class");
    assert_eq!(patient_class, vec!["I"]);
}

#[test]
fn custom_delimiters_are_honoured() {
    let text = "MSH#@*!%#REG#HOSP\nPID#1##111@@@A*222@@@B##Roe@Ann\n";
    assert_eq!(resolve(text, "PID-5.2"), vec!["Ann"]);
    assert_eq!(resolve(text, "PID-3.4"), vec!["A", "B"]);
    assert_eq!(resolve(text, "MSH-1"), vec!["#"]);
}

#[test]
fn line_terminators_do_not_change_results() {
    let crlf = ADT.replace('\r', "\r\n");
    let lf = ADT.replace('\r', "\n");
    for text in [ADT.to_string(), crlf, lf] {
        assert_eq!(resolve(&text, "PID-3.1"), vec!["12345", "67890"]);
        assert_eq!(resolve(&text, "NK1-2.2"), vec!["Jane"]);
    }
}
