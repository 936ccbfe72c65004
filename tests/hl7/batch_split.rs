use hl7tools::extract::{extract_segments, BatchSplitter};
use hl7tools::message::DelimiterSet;

fn batch(messages: usize) -> String {
    let mut text = String::from("FHS|^~\\&|LAB\rBHS|^~\\&|LAB\r");
    for i in 1..=messages {
        text.push_str(&format!("MSH|^~\\&|LAB|H|EMR|H|20240101||ORU^R01|{}|P|2.5\rPID|1||{}\r", i, i));
    }
    text.push_str("BTS|1\rFTS|1\r");
    text
}

#[test]
fn every_message_starts_with_its_header() {
    let split = BatchSplitter::default().split(&batch(3), &DelimiterSet::default());
    assert_eq!(split.count(), 3);
    for (i, message) in split.messages.iter().enumerate() {
        assert!(message.starts_with("MSH|"));
        assert!(message.contains(&format!("|ORU^R01|{}|", i + 1)));
        assert!(!message.contains("FHS|"));
    }
}

#[test]
fn trailers_stay_with_the_last_message() {
    let split = BatchSplitter::default().split(&batch(2), &DelimiterSet::default());
    assert!(split.messages[1].ends_with("BTS|1\rFTS|1\r"));
}

#[test]
fn large_batches_require_confirmation() {
    let splitter = BatchSplitter::default();
    assert!(!splitter.split(&batch(100), &DelimiterSet::default()).requires_confirmation);

    let big = splitter.split(&batch(101), &DelimiterSet::default());
    assert_eq!(big.count(), 101);
    assert!(big.requires_confirmation);
}

#[test]
fn header_token_is_configurable() {
    let splitter = BatchSplitter {
        header_token: "BHS".into(),
        threshold: 100,
    };
    let text = "BHS|^~\\&|A\rMSH|^~\\&|1\rBHS|^~\\&|B\rMSH|^~\\&|2\r";
    let split = splitter.split(text, &DelimiterSet::default());
    assert_eq!(split.messages, vec!["BHS|^~\\&|A\rMSH|^~\\&|1\r", "BHS|^~\\&|B\rMSH|^~\\&|2\r"]);
}

#[test]
fn extract_segments_from_a_batch() {
    let text = batch(3);
    let pids = extract_segments(&text, 3).unwrap();
    assert_eq!(pids, "PID|1||1\rPID|1||2\rPID|1||3\r");
}
