//! Profiling log handling
//!
//! The server records slow operations in `system.profile`. This module
//! parses those entries and picks out the slowest queries.

use std::fmt;

use bson::{doc, Bson, Document};

use crate::value::get_i64;

/// Name of the collection the server writes profile entries to
pub const PROFILE_COLLECTION: &str = "system.profile";

/// Commands that read documents through a predicate
const QUERY_COMMANDS: [&str; 4] = ["count", "distinct", "find", "aggregate"];

/// Server profiling level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingLevel {
    /// Profiling disabled
    Off,
    /// Only operations slower than the threshold are recorded
    SlowOnly,
}

impl ProfilingLevel {
    /// Numeric level understood by the `profile` command
    pub fn as_i32(self) -> i32 {
        match self {
            ProfilingLevel::Off => 0,
            ProfilingLevel::SlowOnly => 1,
        }
    }

    /// Build the `profile` command setting this level
    pub fn command(self, slow_ms: Option<i64>) -> Document {
        let mut cmd = doc! { "profile": self.as_i32() };
        if let Some(ms) = slow_ms {
            cmd.insert("slowms", ms);
        }
        cmd
    }
}

/// One operation recorded by the profiler
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEntry {
    /// Operation type (`query`, `command`, `insert`, `getmore`...)
    pub op: String,
    /// Namespace, `<database>.<collection>`
    pub ns: String,
    /// Elapsed time in milliseconds
    pub millis: i64,
    /// Predicate the operation ran with, when it had one
    pub payload: Option<Document>,
    command_name: Option<String>,
}

impl ProfileEntry {
    /// Parse a document read from `system.profile`
    pub fn from_document(doc: &Document) -> Self {
        let op = doc.get_str("op").unwrap_or_default().to_string();
        let ns = doc.get_str("ns").unwrap_or_default().to_string();
        let millis = get_i64(doc, "millis").unwrap_or(0);
        let command = doc.get_document("command").ok();

        let from_command = |key: &str| command.and_then(|c| c.get_document(key).ok()).cloned();
        let payload = match op.as_str() {
            "query" => doc
                .get_document("query")
                .ok()
                .cloned()
                .or_else(|| from_command("filter")),
            "command" => from_command("query")
                .or_else(|| from_command("filter"))
                .or_else(|| command.and_then(leading_match)),
            _ => None,
        };

        // The command name is always the first key of the command document
        let command_name = command.and_then(|c| c.keys().next().cloned());

        ProfileEntry {
            op,
            ns,
            millis,
            payload,
            command_name,
        }
    }

    /// Whether this entry is a read issued through a query predicate
    pub fn is_query(&self) -> bool {
        match self.op.as_str() {
            "query" => true,
            "command" => self
                .command_name
                .as_deref()
                .map(|name| QUERY_COMMANDS.contains(&name))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Collection part of the namespace
    pub fn collection(&self) -> &str {
        self.ns.split_once('.').map(|(_, coll)| coll).unwrap_or(self.ns.as_str())
    }

    /// Payload rendered for display
    pub fn payload_text(&self) -> String {
        match &self.payload {
            Some(p) => Bson::Document(p.clone()).into_relaxed_extjson().to_string(),
            None => "n/a".to_string(),
        }
    }
}

impl fmt::Display for ProfileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time: {}ms, coll: {}, query: {}",
            self.millis,
            self.collection(),
            self.payload_text()
        )
    }
}

/// Filter of an `aggregate` command whose pipeline opens with `$match`.
/// `count_documents` is sent this way.
fn leading_match(command: &Document) -> Option<Document> {
    if !command.contains_key("aggregate") {
        return None;
    }
    match command.get_array("pipeline").ok()?.first()? {
        Bson::Document(stage) => stage.get_document("$match").ok().cloned(),
        _ => None,
    }
}

/// Keep query entries only, slowest first, at most `limit` of them
pub fn slowest(entries: Vec<ProfileEntry>, limit: usize) -> Vec<ProfileEntry> {
    let mut queries: Vec<ProfileEntry> = entries.into_iter().filter(ProfileEntry::is_query).collect();
    queries.sort_by(|a, b| b.millis.cmp(&a.millis));
    queries.truncate(limit);
    queries
}
