//! Minimal HL7 acknowledgements written back by the listener

use chrono::Local;

const DEFAULT_ENCODING_CHARACTERS: &str = "^~\\&";
const DEFAULT_VERSION: &str = "2.3";

/// Build an `AA` (application accept) acknowledgement payload for `message`.
///
/// Delimiters, version and control id are taken from the message's MSH
/// segment; sending and receiving application/facility are swapped. A payload
/// without an MSH segment still gets a well-formed acknowledgement with
/// default delimiters and an empty control id.
pub fn build_ack(message: &[u8]) -> Vec<u8> {
    build_ack_at(message, &Local::now().format("%Y%m%d%H%M%S").to_string())
}

fn build_ack_at(message: &[u8], timestamp: &str) -> Vec<u8> {
    let text = String::from_utf8_lossy(message);
    let header = text
        .split(['\r', '\n'])
        .find(|line| line.len() > 3 && line.is_char_boundary(3) && line[..3].eq_ignore_ascii_case("MSH"));

    let (f, fields): (char, Vec<&str>) = match header {
        Some(line) => {
            let delimiter = line[3..].chars().next().unwrap_or('|');
            (delimiter, line.split(delimiter).collect())
        }
        None => ('|', Vec::new()),
    };

    // fields[0] is the segment name, fields[n - 1] is MSH-n
    let msh = |n: usize| fields.get(n - 1).copied().unwrap_or_default();
    let encoding = match msh(2) {
        "" => DEFAULT_ENCODING_CHARACTERS,
        chars => chars,
    };
    let version = match msh(12) {
        "" => DEFAULT_VERSION,
        v => v,
    };
    let control_id = msh(10);

    let ack = format!(
        "MSH{f}{encoding}{f}{}{f}{}{f}{}{f}{}{f}{timestamp}{f}{f}ACK{f}{control_id}{f}P{f}{version}\rMSA{f}AA{f}{control_id}\r",
        msh(5),
        msh(6),
        msh(3),
        msh(4),
    );
    ack.into_bytes()
}
