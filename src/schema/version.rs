use crate::error::Hl7Error;
use crate::message::MessageModel;

pub const SUPPORTED_VERSIONS: [&str; 10] = [
    "2.1", "2.2", "2.3", "2.3.1", "2.4", "2.5", "2.5.1", "2.6", "2.7", "2.7.1",
];

pub const DEFAULT_VERSION: &str = "2.7.1";

pub fn is_supported(version: &str) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}

/// The version in MSH-12 (its first component), if the message declares one
pub fn detect_version(model: &MessageModel, text: &str) -> Option<String> {
    let msh = model.segments_named("MSH").next()?;
    let field = msh.field(12)?.text(text);
    let version = field
        .split(model.delimiters().component)
        .next()
        .unwrap_or_default()
        .trim();
    (!version.is_empty()).then(|| version.to_string())
}

/// Pick the schema version to use.
///
/// A detected supported version wins; otherwise `default` is used (or
/// [`DEFAULT_VERSION`] when `default` is itself unsupported) and the returned
/// warning says why.
pub fn resolve_version(detected: Option<&str>, default: &str) -> (String, Option<Hl7Error>) {
    if let Some(version) = detected.filter(|v| is_supported(v)) {
        return (version.to_string(), None);
    }

    let fallback = if is_supported(default) {
        default
    } else {
        DEFAULT_VERSION
    };
    let warning = Hl7Error::UnsupportedSchemaVersion {
        detected: detected.unwrap_or("(none)").to_string(),
        fallback: fallback.to_string(),
    };
    (fallback.to_string(), Some(warning))
}
