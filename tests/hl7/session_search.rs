use hl7tools::{FindStep, Hl7Error, Session};

const ORU: &str = "MSH|^~\\&|LAB|H|EMR|H|20240101||ORU^R01|7|P|2.5.1\n\
PID|1||555||Roe^Ann\n\
OBR|1|||CBC\n\
OBX|1|NM|WBC||6.1||||||F\n\
OBX|2|NM|RBC||4.7||||||F\n";

#[test]
fn find_then_step_through_all_matches() {
    let mut session = Session::new(ORU);
    let first = session.find("OBX-3").unwrap();
    assert_eq!(first.span.text(session.text()), "WBC");
    assert_eq!(first.line, 3);

    let (second, step) = session.find_next().unwrap();
    assert_eq!(second.span.text(session.text()), "RBC");
    assert_eq!(step, FindStep::Next);

    let (wrapped, step) = session.find_next().unwrap();
    assert_eq!(wrapped.span.text(session.text()), "WBC");
    assert_eq!(step, FindStep::WrappedToStart);
}

#[test]
fn find_replaces_the_previous_search() {
    let mut session = Session::new(ORU);
    session.find("OBX-3").unwrap();
    let m = session.find("PID-5.2").unwrap();
    assert_eq!(m.span.text(session.text()), "Ann");

    let (again, step) = session.find_next().unwrap();
    assert_eq!(again.location, "PID-5.2");
    assert_eq!(step, FindStep::WrappedToStart);
}

#[test]
fn free_text_find() {
    let mut session = Session::new(ORU);
    let m = session.find("observation value").unwrap();
    assert_eq!(m.location, "OBX-5");
    assert_eq!(m.span.text(session.text()), "6.1");
}

#[test]
fn errors_for_missing_search_and_no_match() {
    let mut session = Session::new(ORU);
    assert!(matches!(session.find_next(), Err(Hl7Error::NoSearchDefined)));
    assert!(matches!(session.find("nothing like this"), Err(Hl7Error::NoFieldMatch(_))));
    assert!(matches!(session.find(""), Err(Hl7Error::NoFieldMatch(_))));
}

#[test]
fn edits_between_steps_are_picked_up() {
    let mut session = Session::new(ORU);
    session.find("OBX-3").unwrap();

    let edited = format!("{}OBX|3|NM|HGB||14.2||||||F\n", ORU);
    session.set_text(edited);

    let (m, step) = session.find_next().unwrap();
    assert_eq!((m.span.text(session.text()), step), ("RBC", FindStep::Next));
    let (m, _) = session.find_next().unwrap();
    assert_eq!(m.span.text(session.text()), "HGB");
}

#[test]
fn find_next_after_matches_disappear() {
    let mut session = Session::new(ORU);
    session.find("OBX-3").unwrap();
    session.set_text("MSH|^~\\&|LAB|H|EMR|H|20240101||ORU^R01|7|P|2.5.1\n");
    assert!(matches!(session.find_next(), Err(Hl7Error::NoFieldMatch(_))));
}

#[test]
fn locate_all_and_descriptions() {
    let session = Session::new(ORU);
    assert_eq!(session.locate_all("OBX-5").len(), 2);

    let descriptions = session.field_descriptions(2);
    assert!(descriptions.iter().any(|d| d.location == "PID-5" && d.description == "Patient Name"));
    assert!(descriptions.iter().all(|d| d.line < 2));
}

#[test]
fn two_pid_segments_wrap_once_per_lap() {
    let text = "MSH|^~\\&|A|B|C|D|1||ADT^A01|1|P|2.3\rPID|1||111\rPID|2||222\r";
    let mut session = Session::new(text);
    assert_eq!(session.find("PID-3").unwrap().span.text(text), "111");

    let steps: Vec<_> = (0..4).map(|_| session.find_next().unwrap().1).collect();
    let wraps = steps.iter().filter(|s| **s == FindStep::WrappedToStart).count();
    assert_eq!(wraps, 2);
    assert_eq!(
        steps,
        vec![FindStep::Next, FindStep::WrappedToStart, FindStep::Next, FindStep::WrappedToStart]
    );
}

#[test]
fn configured_description_line_limit() {
    let config = hl7tools::config::Config::from_toml("[schema]\nmax_lines_for_descriptions = 1\n").unwrap();
    let settings = hl7tools::SchemaSettings::from_config(&config.schema).unwrap();
    let session = Session::with_settings(ORU, settings);

    let descriptions = session.field_descriptions(config.schema.max_lines_for_descriptions);
    assert!(!descriptions.is_empty());
    assert!(descriptions.iter().all(|d| d.location.starts_with("MSH-")));
}
