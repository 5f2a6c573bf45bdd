use crate::domain::{
    CwdOrigin, SessionMessage, SessionSummary, extract_structural_cwds, extract_text_cwds,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const METADATA_PREFIXES: [&str; 4] = [
    "<environment_context>",
    "<user_instructions>",
    "<developer_instructions>",
    "<system_message>",
];

/// Blank text, or text whose first line opens one of the injected context wrappers.
pub fn is_metadata_text(text: &str) -> bool {
    let trimmed = text.trim();
    let Some(first_line) = trimmed.lines().next() else {
        return true;
    };
    METADATA_PREFIXES
        .iter()
        .any(|prefix| first_line.starts_with(prefix))
}

/// Message-bearing parts of a record, probed in a fixed order: the record itself, then its
/// `payload` object, then its `message` object.
#[derive(Clone, Copy, Debug)]
pub enum RecordShape<'a> {
    Direct(&'a Map<String, Value>),
    PayloadWrapped(&'a Map<String, Value>),
    MessageWrapped(&'a Map<String, Value>),
}

impl<'a> RecordShape<'a> {
    pub fn probe(record: &'a Map<String, Value>) -> Vec<RecordShape<'a>> {
        let mut shapes = vec![RecordShape::Direct(record)];
        if let Some(payload) = record.get("payload").and_then(Value::as_object) {
            shapes.push(RecordShape::PayloadWrapped(payload));
        }
        if let Some(message) = record.get("message").and_then(Value::as_object) {
            shapes.push(RecordShape::MessageWrapped(message));
        }
        shapes
    }

    fn fields(self) -> &'a Map<String, Value> {
        match self {
            Self::Direct(map) | Self::PayloadWrapped(map) | Self::MessageWrapped(map) => map,
        }
    }

    /// Wrapped shapes inherit the outer role only when they carry no `role` key of their own.
    fn role(self, outer_role: Option<&'a str>) -> Option<&'a str> {
        match self {
            Self::Direct(map) => map.get("role").and_then(Value::as_str),
            Self::PayloadWrapped(map) | Self::MessageWrapped(map) => match map.get("role") {
                Some(role) => role.as_str(),
                None => outer_role,
            },
        }
    }
}

/// Every (role, text) pair a record exposes, in probing order.
pub fn extract_record_texts(record: &Map<String, Value>) -> Vec<(Option<&str>, &str)> {
    let outer_role = record.get("role").and_then(Value::as_str);
    let mut out = Vec::new();

    for shape in RecordShape::probe(record) {
        let fields = shape.fields();
        let role = shape.role(outer_role);

        if let Some(content) = fields.get("content").filter(|content| !content.is_null()) {
            let mut chunks = Vec::new();
            collect_content_chunks(content, &mut chunks);
            out.extend(chunks.into_iter().map(|text| (role, text)));
        }

        if let Some(text) = fields.get("text").and_then(Value::as_str) {
            out.push((role, text));
        }
    }

    out
}

fn collect_content_chunks<'a>(content: &'a Value, out: &mut Vec<&'a str>) {
    match content {
        Value::String(text) => out.push(text),
        Value::Object(map) => {
            if let Some(nested) = map.get("content") {
                collect_content_chunks(nested, out);
            }
        }
        Value::Array(chunks) => {
            for chunk in chunks {
                match chunk {
                    Value::String(text) => out.push(text),
                    Value::Object(map) => match map.get("text") {
                        Some(Value::String(text)) => out.push(text),
                        _ => {
                            if let Some(nested) = map.get("content") {
                                collect_content_chunks(nested, out);
                            }
                        }
                    },
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Depth-first scalar traversal. Nulls contribute nothing.
pub fn flatten_scalars(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => out.push(flag.to_string()),
        Value::Number(number) => out.push(number.to_string()),
        Value::String(text) => out.push(text.clone()),
        Value::Array(items) => {
            for item in items {
                flatten_scalars(item, out);
            }
        }
        Value::Object(map) => {
            for nested in map.values() {
                flatten_scalars(nested, out);
            }
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

fn record_session_id(record: &Map<String, Value>) -> Option<&str> {
    non_empty_str(record.get("id")).or_else(|| {
        record
            .get("payload")
            .and_then(Value::as_object)
            .and_then(|payload| non_empty_str(payload.get("id")))
    })
}

/// Folds the records of one log file, in file order, into a [`SessionSummary`].
#[derive(Clone, Debug)]
pub struct SessionFold {
    source_path: PathBuf,
    session_id: Option<String>,
    first_message: Option<SessionMessage>,
    last_message: Option<SessionMessage>,
    working_directories: BTreeSet<String>,
    primary_working_directory: Option<String>,
    corpus_parts: Vec<String>,
}

impl SessionFold {
    pub fn new(source_path: &Path) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            session_id: None,
            first_message: None,
            last_message: None,
            working_directories: BTreeSet::new(),
            primary_working_directory: None,
            corpus_parts: vec![source_path.display().to_string()],
        }
    }

    /// Decodes one raw line. Blank, undecodable and non-object lines are skipped.
    pub fn ingest_line(&mut self, line: &[u8]) {
        let line = line.trim_ascii();
        if line.is_empty() {
            return;
        }
        let Ok(Value::Object(record)) = serde_json::from_slice::<Value>(line) else {
            return;
        };
        self.ingest_record(&record);
    }

    pub fn ingest_record(&mut self, record: &Map<String, Value>) {
        if self.session_id.is_none() {
            self.session_id = record_session_id(record).map(str::to_string);
        }

        let texts = extract_record_texts(record);
        let had_text = !texts.is_empty();
        for (role, text) in texts {
            self.ingest_text(role, text);
        }

        if !had_text {
            for map_value in record.values() {
                flatten_scalars(map_value, &mut self.corpus_parts);
            }
        }

        for cwd in extract_structural_cwds(record) {
            self.offer_cwd(cwd, CwdOrigin::Structural);
        }
    }

    fn ingest_text(&mut self, role: Option<&str>, text: &str) {
        self.corpus_parts.push(text.to_string());

        let trimmed = text.trim();
        if self.first_message.is_none() && !is_metadata_text(text) {
            self.first_message = Some(SessionMessage {
                role: role.map(str::to_string),
                text: trimmed.to_string(),
            });
        }

        if trimmed.is_empty() {
            return;
        }
        self.last_message = Some(SessionMessage {
            role: role.map(str::to_string),
            text: trimmed.to_string(),
        });

        let found = extract_text_cwds(text);
        self.working_directories.extend(found.candidates);
        if let Some(tagged) = found.last_tagged {
            self.offer_cwd(tagged, CwdOrigin::Tagged);
        }
    }

    /// Structural values always take the primary slot; tagged mentions only fill an empty one.
    fn offer_cwd(&mut self, cwd: String, origin: CwdOrigin) {
        let replace = match origin {
            CwdOrigin::Structural => true,
            CwdOrigin::Tagged => self.primary_working_directory.is_none(),
        };
        self.working_directories.insert(cwd.clone());
        if replace {
            self.primary_working_directory = Some(cwd);
        }
    }

    pub fn finish(self, modified_at: SystemTime, file_size_bytes: u64) -> SessionSummary {
        let session_id = self
            .session_id
            .unwrap_or_else(|| fallback_session_id(&self.source_path));
        let search_corpus = self.corpus_parts.join("\n").to_lowercase();

        SessionSummary {
            session_id,
            source_path: self.source_path,
            modified_at,
            file_size_bytes,
            working_directories: self.working_directories,
            primary_working_directory: self.primary_working_directory,
            first_message: self.first_message,
            last_message: self.last_message,
            search_corpus,
        }
    }
}

fn fallback_session_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| path.display().to_string())
}
