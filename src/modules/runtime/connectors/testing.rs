//! Scripted in-memory connector for tests
//!
//! Understands just enough Cypher to exercise the executor, introspector and
//! diagnostics: `RETURN 1 AS ok`, the schema procedures, and creating and
//! matching `Person` nodes by property parameters. Anything else answers with
//! a canned result registered through [`Script::respond`], or an empty one.

use neo4j_mcp_core::{
    ConnectionDescriptor, DriverFailure, GraphValue, QueryCounters, RawResult, ServerComponent,
    ServerInfo, Statement,
};
use neo4j_mcp_types::AccessMode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::traits::{Connector, ConnectorFactory, Session};

static PROPERTY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*\$(\w+)").unwrap());

type Person = BTreeMap<String, GraphValue>;

/// Shared behaviour and observations of the scripted backend
#[derive(Default)]
pub(crate) struct Script {
    latency: Mutex<Duration>,
    connect_latency: Mutex<Duration>,
    connect_failure: Mutex<Option<DriverFailure>>,
    statement_failures: Mutex<Vec<(String, DriverFailure)>>,
    canned: Mutex<HashMap<String, RawResult>>,
    server: Mutex<ServerInfo>,
    statements: Mutex<Vec<(String, Map<String, Value>)>>,
    people: Mutex<Vec<Person>>,
    connects: AtomicUsize,
    live: AtomicUsize,
    peak: AtomicUsize,
    closed: AtomicBool,
}

impl Script {
    pub(crate) fn new() -> Arc<Self> {
        let script = Script::default();
        *script.server.lock().unwrap() = ServerInfo::from_components(vec![ServerComponent {
            name: "Neo4j Kernel".into(),
            versions: vec!["5.20.0".into()],
            edition: "community".into(),
        }]);
        Arc::new(script)
    }

    pub(crate) fn factory(self: &Arc<Self>) -> Arc<dyn ConnectorFactory> {
        Arc::new(ScriptedFactory(self.clone()))
    }

    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Delay building a connector, as a slow DNS lookup or handshake would
    pub(crate) fn set_connect_latency(&self, latency: Duration) {
        *self.connect_latency.lock().unwrap() = latency;
    }

    pub(crate) fn fail_connect(&self, failure: DriverFailure) {
        *self.connect_failure.lock().unwrap() = Some(failure);
    }

    /// Fail every statement whose text contains `needle`
    pub(crate) fn fail_statement(&self, needle: &str, failure: DriverFailure) {
        self.statement_failures
            .lock()
            .unwrap()
            .push((needle.to_string(), failure));
    }

    /// Answer statements with exactly this text with `result`
    pub(crate) fn respond(&self, text: &str, result: RawResult) {
        self.canned.lock().unwrap().insert(text.to_string(), result);
    }

    pub(crate) fn set_server(&self, info: ServerInfo) {
        *self.server.lock().unwrap() = info;
    }

    /// Every statement submitted so far, with its parameters
    pub(crate) fn statements(&self) -> Vec<(String, Map<String, Value>)> {
        self.statements.lock().unwrap().clone()
    }

    /// Committed `Person` nodes
    pub(crate) fn people(&self) -> usize {
        self.people.lock().unwrap().len()
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_sessions(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn single_column(name: &str, values: impl IntoIterator<Item = GraphValue>) -> RawResult {
        RawResult {
            columns: vec![name.to_string()],
            rows: values.into_iter().map(|v| vec![v]).collect(),
            counters: Some(QueryCounters::default()),
        }
    }

    fn properties_from(statement: &Statement) -> Person {
        PROPERTY_PARAM
            .captures_iter(statement.text())
            .filter_map(|caps| {
                statement
                    .parameters()
                    .get(&caps[2])
                    .map(|value| (caps[1].to_string(), GraphValue::from_json(value)))
            })
            .collect()
    }

    fn interpret(&self, statement: &Statement, pending: &mut Vec<Person>) -> RawResult {
        let text = statement.text().trim();
        let people = self.people.lock().unwrap();

        if text == "RETURN 1 AS ok" {
            return Self::single_column("ok", [GraphValue::Integer(1)]);
        }
        if text.starts_with("CALL db.labels()") {
            let labels = (!people.is_empty()).then(|| GraphValue::from("Person"));
            return Self::single_column("label", labels);
        }
        if text.starts_with("CALL db.relationshipTypes()") {
            return Self::single_column("relationshipType", None);
        }
        if text.starts_with("CALL db.propertyKeys()") {
            let keys: BTreeSet<&String> = people.iter().flat_map(|p| p.keys()).collect();
            return Self::single_column(
                "propertyKey",
                keys.into_iter().map(|k| GraphValue::from(k.as_str())),
            );
        }
        if text.starts_with("MATCH (n) UNWIND labels(n)") {
            let mut result = RawResult {
                columns: vec!["label".into(), "count".into()],
                rows: Vec::new(),
                counters: Some(QueryCounters::default()),
            };
            if !people.is_empty() {
                result.rows.push(vec![
                    GraphValue::from("Person"),
                    GraphValue::Integer(people.len() as i64),
                ]);
            }
            return result;
        }
        if text.starts_with("CREATE (") && text.contains(":Person") {
            let person = Self::properties_from(statement);
            let counters = QueryCounters {
                nodes_created: 1,
                labels_added: 1,
                properties_set: person.len() as u64,
                ..Default::default()
            };
            pending.push(person);
            return RawResult {
                columns: Vec::new(),
                rows: Vec::new(),
                counters: Some(counters),
            };
        }
        if text.starts_with("MATCH (p:Person") {
            let wanted = Self::properties_from(statement);
            let names = people
                .iter()
                .filter(|p| wanted.iter().all(|(k, v)| p.get(k) == Some(v)))
                .map(|p| p.get("name").cloned().unwrap_or(GraphValue::Null));
            return Self::single_column("name", names);
        }
        if text.contains("apoc.create.node") {
            return RawResult {
                counters: Some(QueryCounters {
                    nodes_created: 1,
                    ..Default::default()
                }),
                ..Default::default()
            };
        }

        RawResult {
            counters: Some(QueryCounters::default()),
            ..Default::default()
        }
    }
}

struct ScriptedFactory(Arc<Script>);

impl ConnectorFactory for ScriptedFactory {
    fn connect(
        &self,
        _descriptor: &ConnectionDescriptor,
    ) -> Result<Arc<dyn Connector>, DriverFailure> {
        let latency = *self.0.connect_latency.lock().unwrap();
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
        if let Some(failure) = self.0.connect_failure.lock().unwrap().clone() {
            return Err(failure);
        }
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        self.0.closed.store(false, Ordering::SeqCst);
        Ok(Arc::new(ScriptedConnector(self.0.clone())))
    }
}

struct ScriptedConnector(Arc<Script>);

impl Connector for ScriptedConnector {
    fn open_session(
        &self,
        _database: &str,
        _mode: AccessMode,
    ) -> Result<Box<dyn Session>, DriverFailure> {
        if self.0.is_closed() {
            return Err(DriverFailure::ServiceUnavailable("driver closed".into()));
        }
        let live = self.0.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.0.peak.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            script: self.0.clone(),
            pending: Vec::new(),
        }))
    }

    fn verify(&self) -> Result<(), DriverFailure> {
        Ok(())
    }

    fn close(&self) -> Result<(), DriverFailure> {
        self.0.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn connector_type(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedSession {
    script: Arc<Script>,
    pending: Vec<Person>,
}

impl Session for ScriptedSession {
    fn run(&mut self, statement: &Statement) -> Result<RawResult, DriverFailure> {
        self.script.statements.lock().unwrap().push((
            statement.text().to_string(),
            statement.parameters().clone(),
        ));

        let latency = *self.script.latency.lock().unwrap();
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let failure = self
            .script
            .statement_failures
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| statement.text().contains(needle.as_str()))
            .map(|(_, failure)| failure.clone());
        if let Some(failure) = failure {
            return Err(failure);
        }

        if let Some(result) = self.script.canned.lock().unwrap().get(statement.text()) {
            return Ok(result.clone());
        }

        Ok(self.script.interpret(statement, &mut self.pending))
    }

    fn server_info(&mut self) -> Result<ServerInfo, DriverFailure> {
        Ok(self.script.server.lock().unwrap().clone())
    }

    fn finish(mut self: Box<Self>, commit: bool) -> Result<(), DriverFailure> {
        if commit {
            let pending = std::mem::take(&mut self.pending);
            self.script.people.lock().unwrap().extend(pending);
        }
        Ok(())
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.script.live.fetch_sub(1, Ordering::SeqCst);
    }
}
