//! Neo4j connector backed by `neo4rs`

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use neo4j_mcp_core::{
    ConnectionDescriptor, DriverFailure, GraphValue, NodeValue, PathValue, PointValue,
    QueryCounters, RawResult, RelationshipValue, ServerComponent, ServerInfo, Statement,
};
use neo4j_mcp_types::AccessMode;
use neo4rs::summary::Counters;
use neo4rs::{
    query, BoltBoolean, BoltDateTimeZoneId, BoltDuration, BoltFloat, BoltInteger, BoltList,
    BoltMap, BoltNode, BoltNull, BoltString, BoltType, BoltUnboundedRelation, Config,
    ConfigBuilder, Graph, Query, Txn,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::ErrorKind as IoErrorKind;
use std::sync::{Arc, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::traits::{Connector, ConnectorFactory, Session};

const COMPONENTS: &str =
    "CALL dbms.components() YIELD name, versions, edition RETURN name, versions, edition";

/// Records fetched per round trip
const FETCH_SIZE: usize = 500;

/// Local date-times render without an offset; the fraction only when non-zero
const LOCAL_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Builds [`Neo4jConnector`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct Neo4jConnectorFactory;

impl ConnectorFactory for Neo4jConnectorFactory {
    fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Arc<dyn Connector>, DriverFailure> {
        Ok(Arc::new(Neo4jConnector::connect(descriptor)?))
    }
}

/// Neo4j database connector
///
/// Must be created on a thread that can see a Tokio runtime; the blocking
/// methods drive the async driver through that runtime's handle.
pub struct Neo4jConnector {
    graph: RwLock<Option<Graph>>,
    runtime: Handle,
}

impl Neo4jConnector {
    /// Build the driver pool for `descriptor`
    ///
    /// The pool dials lazily; [`Connector::verify`] makes the first round trip.
    pub fn connect(descriptor: &ConnectionDescriptor) -> Result<Self, DriverFailure> {
        let runtime = Handle::try_current().map_err(|e| {
            DriverFailure::Worker(format!("no async runtime for the Neo4j driver: {}", e))
        })?;

        let graph = Graph::connect(driver_config(descriptor)?).map_err(classify)?;

        Ok(Self {
            graph: RwLock::new(Some(graph)),
            runtime,
        })
    }

    fn graph(&self) -> Result<Graph, DriverFailure> {
        self.graph
            .read()
            .map_err(|_| DriverFailure::Worker("connector lock poisoned".into()))?
            .clone()
            .ok_or_else(|| DriverFailure::ServiceUnavailable("connection is closed".into()))
    }
}

/// Driver configuration for `descriptor`, pool limits included
fn driver_config(descriptor: &ConnectionDescriptor) -> Result<Config, DriverFailure> {
    ConfigBuilder::default()
        .uri(descriptor.bolt_uri())
        .user(descriptor.username().unwrap_or_default())
        .password(descriptor.password().unwrap_or_default())
        .db(descriptor.database())
        .max_connections(descriptor.max_pool_size())
        .connection_timeout(descriptor.connection_timeout())
        .max_lifetime(descriptor.max_connection_lifetime())
        .fetch_size(FETCH_SIZE)
        .build()
        .map_err(|e| DriverFailure::InvalidConfiguration(e.to_string()))
}

impl Connector for Neo4jConnector {
    fn open_session(
        &self,
        database: &str,
        mode: AccessMode,
    ) -> Result<Box<dyn Session>, DriverFailure> {
        let graph = self.graph()?;
        let txn = self
            .runtime
            .block_on(graph.start_txn_on(database))
            .map_err(classify)?;
        debug!(database, mode = %mode, "Opened Neo4j transaction");

        Ok(Box::new(Neo4jSession {
            txn,
            runtime: self.runtime.clone(),
        }))
    }

    fn verify(&self) -> Result<(), DriverFailure> {
        let graph = self.graph()?;
        self.runtime
            .block_on(graph.run(query("RETURN 1")))
            .map(|_| ())
            .map_err(classify)
    }

    fn close(&self) -> Result<(), DriverFailure> {
        let mut graph = self
            .graph
            .write()
            .map_err(|_| DriverFailure::Worker("connector lock poisoned".into()))?;
        // Pooled connections are closed when the last handle drops
        graph.take();
        Ok(())
    }

    fn connector_type(&self) -> &'static str {
        "neo4j"
    }
}

/// One explicit transaction
struct Neo4jSession {
    txn: Txn,
    runtime: Handle,
}

type Rows = Vec<BTreeMap<String, BoltType>>;

impl Neo4jSession {
    /// Drain every record, then read the statement's update counters from
    /// its summary
    fn fetch(&mut self, q: Query) -> Result<(Rows, QueryCounters), DriverFailure> {
        let txn = &mut self.txn;
        self.runtime.block_on(async {
            let mut stream = txn.execute(q).await.map_err(classify)?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next(txn.handle()).await.map_err(classify)? {
                let fields = row
                    .to::<BTreeMap<String, BoltType>>()
                    .map_err(|e| DriverFailure::Protocol(e.to_string()))?;
                rows.push(fields);
            }
            let summary = stream.finish(txn.handle()).await.map_err(classify)?;
            Ok((rows, query_counters(summary.stats())))
        })
    }
}

impl Session for Neo4jSession {
    fn run(&mut self, statement: &Statement) -> Result<RawResult, DriverFailure> {
        let q = build_query(statement);
        let (rows, counters) = self.fetch(q)?;

        // Row fields arrive keyed by name, so columns come back sorted.
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        let rows = rows
            .into_iter()
            .map(|row| row.into_values().map(|v| from_bolt(&v)).collect())
            .collect();

        Ok(RawResult {
            columns,
            rows,
            counters: Some(counters),
        })
    }

    fn server_info(&mut self) -> Result<ServerInfo, DriverFailure> {
        let (rows, _) = self.fetch(query(COMPONENTS))?;
        let components = rows
            .into_iter()
            .map(|row| {
                let text = |key: &str| match row.get(key).map(from_bolt) {
                    Some(GraphValue::String(s)) => s,
                    _ => String::new(),
                };
                let versions = match row.get("versions").map(from_bolt) {
                    Some(GraphValue::List(items)) => items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                    _ => Vec::new(),
                };
                ServerComponent {
                    name: text("name"),
                    versions,
                    edition: text("edition"),
                }
            })
            .collect();
        Ok(ServerInfo::from_components(components))
    }

    fn finish(self: Box<Self>, commit: bool) -> Result<(), DriverFailure> {
        let Neo4jSession { txn, runtime } = *self;
        if commit {
            // The returned bookmark is not tracked across sessions
            runtime.block_on(txn.commit()).map(|_| ()).map_err(classify)
        } else {
            runtime.block_on(txn.rollback()).map_err(classify)
        }
    }
}

fn query_counters(stats: &Counters) -> QueryCounters {
    QueryCounters {
        nodes_created: stats.nodes_created,
        nodes_deleted: stats.nodes_deleted,
        relationships_created: stats.relationships_created,
        relationships_deleted: stats.relationships_deleted,
        properties_set: stats.properties_set,
        labels_added: stats.labels_added,
        labels_removed: stats.labels_removed,
        indexes_added: stats.indexes_added,
        indexes_removed: stats.indexes_removed,
        constraints_added: stats.constraints_added,
        constraints_removed: stats.constraints_removed,
    }
}

fn build_query(statement: &Statement) -> Query {
    statement
        .parameters()
        .iter()
        .fold(query(statement.text()), |q, (name, value)| {
            q.param(name, to_bolt(value))
        })
}

/// Map a driver error onto a failure category
fn classify(err: neo4rs::Error) -> DriverFailure {
    use neo4rs::Error;

    let text = err.to_string();
    match err {
        Error::Neo4j(e) => DriverFailure::Server {
            code: e.code().to_string(),
            message: e.message().to_string(),
        },
        Error::AuthenticationError(_) => DriverFailure::AuthenticationFailed(text),
        Error::IOError { detail } => io_failure(detail.kind(), text),
        Error::ConnectionTimedOut => DriverFailure::Timeout(text),
        Error::ConnectionError
        | Error::InvalidDnsName(_)
        | Error::ProtocolMismatch(_)
        | Error::RequestIgnoredError
        | Error::RoutingTableRefreshFailed(_)
        | Error::ServerUnavailableError(_) => DriverFailure::ServiceUnavailable(text),
        Error::RoutingTableError((code, message)) if code.starts_with("Neo.") => {
            DriverFailure::Server { code, message }
        }
        Error::RoutingTableError(_) => DriverFailure::ServiceUnavailable(text),
        Error::ConnectionClosed(_) => DriverFailure::SessionExpired(text),
        Error::UrlParseError(_)
        | Error::UnsupportedScheme(_)
        | Error::InvalidConfig
        | Error::InvalidInteger(..)
        | Error::IntegerOverflow(..) => DriverFailure::InvalidConfiguration(text),
        Error::UnexpectedMessage(message) => unexpected_message(message),
        Error::WriteError(_)
        | Error::ParseError(_)
        | Error::StringTooLong
        | Error::MapTooBig
        | Error::BytesTooBig
        | Error::ListTooLong
        | Error::UnsupportedVersion(..)
        | Error::Ignored(_)
        | Error::UnknownType(_)
        | Error::UnknownMessage(_)
        | Error::InvalidTypeMarker(_)
        | Error::DeserializationError(_)
        | Error::ConversionError => DriverFailure::Protocol(text),
        _ => DriverFailure::Other(text),
    }
}

fn io_failure(kind: IoErrorKind, text: String) -> DriverFailure {
    match kind {
        IoErrorKind::UnexpectedEof
        | IoErrorKind::ConnectionReset
        | IoErrorKind::ConnectionAborted
        | IoErrorKind::BrokenPipe => DriverFailure::SessionExpired(text),
        IoErrorKind::ConnectionRefused | IoErrorKind::NotFound | IoErrorKind::AddrNotAvailable => {
            DriverFailure::ServiceUnavailable(text)
        }
        IoErrorKind::TimedOut => DriverFailure::Timeout(text),
        _ => DriverFailure::Io(text),
    }
}

/// Classify an unexpected reply by what it wraps
///
/// The driver renders the offending response with `Debug`, so a server
/// failure shows up as its status code and a transport error as `IOError`.
fn unexpected_message(text: String) -> DriverFailure {
    if let server @ DriverFailure::Server { .. } = DriverFailure::from_server_text(text.as_str()) {
        return server;
    }
    if text.contains("IOError") {
        let kind = [
            IoErrorKind::UnexpectedEof,
            IoErrorKind::ConnectionReset,
            IoErrorKind::ConnectionAborted,
            IoErrorKind::BrokenPipe,
            IoErrorKind::ConnectionRefused,
            IoErrorKind::TimedOut,
        ]
        .into_iter()
        .find(|kind| text.contains(&format!("{:?}", kind)));
        return match kind {
            Some(kind) => io_failure(kind, text),
            None => DriverFailure::Io(text),
        };
    }
    DriverFailure::Protocol(text)
}

fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => BoltType::String(BoltString::new(s)),
        Value::Array(items) => {
            BoltType::List(BoltList::from(items.iter().map(to_bolt).collect::<Vec<_>>()))
        }
        Value::Object(map) => BoltType::Map(to_bolt_map(map)),
    }
}

fn to_bolt_map(map: &Map<String, Value>) -> BoltMap {
    let mut bolt = BoltMap::new();
    for (key, value) in map {
        bolt.put(BoltString::new(key), to_bolt(value));
    }
    bolt
}

fn from_bolt(value: &BoltType) -> GraphValue {
    match value {
        BoltType::Null(_) => GraphValue::Null,
        BoltType::Boolean(b) => GraphValue::Boolean(b.value),
        BoltType::Integer(i) => GraphValue::Integer(i.value),
        BoltType::Float(f) => GraphValue::Float(f.value),
        BoltType::String(s) => GraphValue::String(s.value.clone()),
        BoltType::Bytes(b) => GraphValue::Bytes(b.value.to_vec()),
        BoltType::List(list) => GraphValue::List(list.value.iter().map(from_bolt).collect()),
        BoltType::Map(map) => GraphValue::Map(properties(map)),
        BoltType::Node(node) => GraphValue::Node(node_value(node)),
        BoltType::Relation(rel) => GraphValue::Relationship(RelationshipValue {
            id: rel.id.value,
            start: rel.start_node_id.value,
            end: rel.end_node_id.value,
            rel_type: rel.typ.value.clone(),
            properties: properties(&rel.properties),
        }),
        BoltType::UnboundedRelation(rel) => {
            GraphValue::Relationship(unbounded_relationship(rel, 0, 0))
        }
        BoltType::Path(path) => GraphValue::Path(path_value(
            &path.nodes.value,
            &path.rels.value,
            &path.indices.value,
        )),
        BoltType::Point2D(point) => GraphValue::Point(PointValue {
            srid: point.sr_id.value,
            x: point.x.value,
            y: point.y.value,
            z: None,
        }),
        BoltType::Point3D(point) => GraphValue::Point(PointValue {
            srid: point.sr_id.value,
            x: point.x.value,
            y: point.y.value,
            z: Some(point.z.value),
        }),
        BoltType::Date(date) => temporal(NaiveDate::try_from(date).map(|d| d.to_string())),
        BoltType::DateTime(datetime) => {
            temporal(DateTime::<FixedOffset>::try_from(datetime).map(|dt| dt.to_rfc3339()))
        }
        BoltType::LocalDateTime(datetime) => temporal(
            NaiveDateTime::try_from(datetime).map(|dt| dt.format(LOCAL_DATETIME).to_string()),
        ),
        BoltType::DateTimeZoneId(datetime) => temporal(zoned_datetime(datetime)),
        BoltType::Time(time) => {
            let (time, offset) = <(NaiveTime, FixedOffset)>::from(time);
            GraphValue::Temporal(format!("{}{}", time, offset))
        }
        BoltType::LocalTime(time) => GraphValue::Temporal(NaiveTime::from(time).to_string()),
        BoltType::Duration(duration) => GraphValue::Temporal(iso_duration(duration)),
    }
}

fn temporal(text: Result<String, neo4rs::Error>) -> GraphValue {
    match text {
        Ok(text) => GraphValue::Temporal(text),
        Err(e) => {
            warn!("Dropping out-of-range temporal value: {}", e);
            GraphValue::Null
        }
    }
}

/// `2024-06-01T12:00:00+02:00[Europe/Stockholm]`, without the offset when
/// the zone id is unknown to the local tz database
fn zoned_datetime(value: &BoltDateTimeZoneId) -> Result<String, neo4rs::Error> {
    match DateTime::<FixedOffset>::try_from(value) {
        Ok(dt) => Ok(format!("{}[{}]", dt.to_rfc3339(), value.tz_id())),
        Err(_) => NaiveDateTime::try_from(value)
            .map(|dt| format!("{}[{}]", dt.format(LOCAL_DATETIME), value.tz_id())),
    }
}

/// ISO-8601 duration such as `P1DT2H30.5S`
///
/// The driver folds months into seconds at an average month length, so the
/// largest unit rendered is days.
fn iso_duration(duration: &BoltDuration) -> String {
    let folded = std::time::Duration::from(duration.clone());
    // Negative second counts wrap through the unsigned conversion
    let seconds = folded.as_secs() as i64;
    let nanos = folded.subsec_nanos();
    let (sign, total, nanos) = if seconds < 0 && nanos > 0 {
        ("-", (seconds + 1).unsigned_abs(), 1_000_000_000 - nanos)
    } else {
        (if seconds < 0 { "-" } else { "" }, seconds.unsigned_abs(), nanos)
    };

    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let secs = total % 60;

    let mut text = format!("{}P", sign);
    if days > 0 {
        text.push_str(&format!("{}D", days));
    }
    if hours == 0 && minutes == 0 && secs == 0 && nanos == 0 {
        if days == 0 {
            text.push_str("T0S");
        }
        return text;
    }
    text.push('T');
    if hours > 0 {
        text.push_str(&format!("{}H", hours));
    }
    if minutes > 0 {
        text.push_str(&format!("{}M", minutes));
    }
    if secs > 0 || nanos > 0 {
        text.push_str(&secs.to_string());
        if nanos > 0 {
            let fraction = format!("{:09}", nanos);
            text.push('.');
            text.push_str(fraction.trim_end_matches('0'));
        }
        text.push('S');
    }
    text
}

fn properties(map: &BoltMap) -> BTreeMap<String, GraphValue> {
    map.value
        .iter()
        .map(|(k, v)| (k.value.clone(), from_bolt(v)))
        .collect()
}

fn node_value(node: &BoltNode) -> NodeValue {
    NodeValue {
        id: node.id.value,
        labels: node
            .labels
            .value
            .iter()
            .filter_map(|label| match label {
                BoltType::String(s) => Some(s.value.clone()),
                _ => None,
            })
            .collect(),
        properties: properties(&node.properties),
    }
}

fn unbounded_relationship(rel: &BoltUnboundedRelation, start: i64, end: i64) -> RelationshipValue {
    RelationshipValue {
        id: rel.id.value,
        start,
        end,
        rel_type: rel.typ.value.clone(),
        properties: properties(&rel.properties),
    }
}

/// Rebuild a path from its packed form
///
/// `indices` holds pairs of (relationship, node) positions. A relationship
/// position is 1-based and negative when traversed against its direction.
fn path_value(nodes: &[BoltType], rels: &[BoltType], indices: &[BoltType]) -> PathValue {
    let nodes: Vec<NodeValue> = nodes
        .iter()
        .filter_map(|n| match n {
            BoltType::Node(node) => Some(node_value(node)),
            _ => None,
        })
        .collect();
    let rels: Vec<&BoltUnboundedRelation> = rels
        .iter()
        .filter_map(|r| match r {
            BoltType::UnboundedRelation(rel) => Some(rel),
            _ => None,
        })
        .collect();

    let positions: Vec<i64> = indices
        .iter()
        .filter_map(|i| match i {
            BoltType::Integer(i) => Some(i.value),
            _ => None,
        })
        .collect();

    let mut relationships = Vec::with_capacity(positions.len() / 2);
    let mut previous = nodes.first().map(|n| n.id);
    for pair in positions.chunks_exact(2) {
        let (rel_pos, node_pos) = (pair[0], pair[1]);
        let rel = (rel_pos.unsigned_abs() as usize)
            .checked_sub(1)
            .and_then(|i| rels.get(i));
        let next = usize::try_from(node_pos).ok().and_then(|i| nodes.get(i));
        if let (Some(rel), Some(from), Some(to)) = (rel, previous, next) {
            let (start, end) = if rel_pos > 0 { (from, to.id) } else { (to.id, from) };
            relationships.push(unbounded_relationship(rel, start, end));
        }
        previous = next.map(|n| n.id);
    }

    PathValue {
        nodes,
        relationships,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo4j_mcp_core::{normalize, ConnectionSettings, ErrorKind, Redactor};
    use neo4rs::{BoltPoint2D, BoltPoint3D};
    use serde_json::json;
    use std::mem::discriminant;

    fn bolt_node(id: i64, label: &str) -> BoltType {
        let mut props = BoltMap::new();
        props.put(BoltString::new("name"), BoltType::String(BoltString::new(label)));
        BoltType::Node(BoltNode::new(
            BoltInteger::new(id),
            BoltList::from(vec![BoltType::String(BoltString::new(label))]),
            props,
        ))
    }

    fn bolt_rel(id: i64) -> BoltType {
        BoltType::UnboundedRelation(BoltUnboundedRelation::new(
            BoltInteger::new(id),
            BoltString::new("KNOWS"),
            BoltMap::new(),
        ))
    }

    fn ints(values: &[i64]) -> Vec<BoltType> {
        values
            .iter()
            .map(|v| BoltType::Integer(BoltInteger::new(*v)))
            .collect()
    }

    #[test]
    fn test_json_parameters_to_bolt() {
        let value = json!({"name": "Alice", "age": 30, "score": 1.5, "tags": ["a"], "x": null});
        let BoltType::Map(map) = to_bolt(&value) else {
            panic!("expected a map");
        };
        assert_eq!(map.value.len(), 5);
        assert!(matches!(
            map.value.get(&BoltString::new("age")),
            Some(BoltType::Integer(i)) if i.value == 30
        ));
        assert!(matches!(
            map.value.get(&BoltString::new("score")),
            Some(BoltType::Float(f)) if f.value == 1.5
        ));
        assert!(matches!(
            map.value.get(&BoltString::new("x")),
            Some(BoltType::Null(_))
        ));
    }

    #[test]
    fn test_node_from_bolt() {
        let GraphValue::Node(node) = from_bolt(&bolt_node(7, "Person")) else {
            panic!("expected a node");
        };
        assert_eq!(node.id, 7);
        assert_eq!(node.labels, vec!["Person"]);
        assert_eq!(node.properties["name"], GraphValue::from("Person"));
    }

    #[test]
    fn test_path_directions() {
        let nodes = vec![bolt_node(1, "A"), bolt_node(2, "B"), bolt_node(3, "C")];
        let rels = vec![bolt_rel(10), bolt_rel(11)];
        // (1)-[10]->(2)<-[11]-(3)
        let path = path_value(&nodes, &rels, &ints(&[1, 1, -2, 2]));

        assert_eq!(path.nodes.len(), 3);
        assert_eq!(path.relationships.len(), 2);
        assert_eq!((path.relationships[0].start, path.relationships[0].end), (1, 2));
        assert_eq!((path.relationships[1].start, path.relationships[1].end), (3, 2));
    }

    fn io_error(kind: IoErrorKind) -> neo4rs::Error {
        neo4rs::Error::IOError {
            detail: kind.into(),
        }
    }

    fn duration(months: i64, days: i64, seconds: i64, nanos: i64) -> BoltDuration {
        BoltDuration::new(
            BoltInteger::new(months),
            BoltInteger::new(days),
            BoltInteger::new(seconds),
            BoltInteger::new(nanos),
        )
    }

    #[test]
    fn test_classify_driver_errors() {
        use neo4rs::Error;
        use ErrorKind::{Authentication, Configuration, Connectivity, QueryError, Unknown};

        let pull_failure = Error::UnexpectedMessage(
            r#"unexpected response for PULL: Failure(Failure { metadata: BoltMap { value: {BoltString { value: "code" }: String(BoltString { value: "Neo.ClientError.Statement.SyntaxError" }), BoltString { value: "message" }: String(BoltString { value: "Invalid input 'RETRN'" })} } })"#
                .to_string(),
        );
        let pull_eof = Error::UnexpectedMessage(format!(
            "unexpected response for PULL: {:?}",
            Err::<(), _>(io_error(IoErrorKind::UnexpectedEof))
        ));
        let overflow = u8::try_from(300u32).unwrap_err();

        let unavailable = DriverFailure::ServiceUnavailable(String::new());
        let expired = DriverFailure::SessionExpired(String::new());
        let timeout = DriverFailure::Timeout(String::new());
        let config = DriverFailure::InvalidConfiguration(String::new());
        let protocol = DriverFailure::Protocol(String::new());
        let server = DriverFailure::Server {
            code: String::new(),
            message: String::new(),
        };

        let cases = vec![
            (io_error(IoErrorKind::ConnectionRefused), unavailable.clone(), Connectivity, true),
            (io_error(IoErrorKind::UnexpectedEof), expired.clone(), Connectivity, true),
            (io_error(IoErrorKind::TimedOut), timeout.clone(), Connectivity, true),
            (
                io_error(IoErrorKind::PermissionDenied),
                DriverFailure::Io(String::new()),
                Connectivity,
                true,
            ),
            (Error::ConnectionError, unavailable.clone(), Connectivity, true),
            (Error::InvalidDnsName("db.invalid".into()), unavailable.clone(), Connectivity, true),
            (Error::ProtocolMismatch(0x4854_5450), unavailable.clone(), Connectivity, true),
            (Error::RequestIgnoredError, unavailable.clone(), Connectivity, true),
            (
                Error::ServerUnavailableError("no writer".into()),
                unavailable.clone(),
                Connectivity,
                true,
            ),
            (
                Error::RoutingTableRefreshFailed("stale".into()),
                unavailable.clone(),
                Connectivity,
                true,
            ),
            (
                Error::RoutingTableError(("unknown".into(), "no route".into())),
                unavailable.clone(),
                Connectivity,
                true,
            ),
            (
                Error::RoutingTableError((
                    "Neo.ClientError.Database.DatabaseNotFound".into(),
                    "Database does not exist".into(),
                )),
                server.clone(),
                QueryError,
                false,
            ),
            (Error::ConnectionTimedOut, timeout.clone(), Connectivity, true),
            (
                Error::UrlParseError(url::ParseError::EmptyHost),
                config.clone(),
                Configuration,
                false,
            ),
            (Error::UnsupportedScheme("http".into()), config.clone(), Configuration, false),
            (Error::InvalidConfig, config.clone(), Configuration, false),
            (Error::InvalidInteger("fetch_size", -2), config.clone(), Configuration, false),
            (
                Error::IntegerOverflow("max_lifetime", overflow),
                config.clone(),
                Configuration,
                false,
            ),
            (
                Error::AuthenticationError("The client is unauthorized".into()),
                DriverFailure::AuthenticationFailed(String::new()),
                Authentication,
                false,
            ),
            (pull_failure, server.clone(), QueryError, false),
            (pull_eof, expired.clone(), Connectivity, true),
            (
                Error::UnexpectedMessage("unexpected response for RESET: Ignored".into()),
                protocol.clone(),
                Unknown,
                false,
            ),
            (Error::StringTooLong, protocol.clone(), Unknown, false),
            (Error::UnsupportedVersion(3, 0), protocol.clone(), Unknown, false),
            (Error::Ignored("PULL"), protocol.clone(), Unknown, false),
            (Error::UnknownType("0xB9".into()), protocol.clone(), Unknown, false),
            (Error::UnknownMessage("unknown message 7F".into()), protocol.clone(), Unknown, false),
            (Error::InvalidTypeMarker("0xC9".into()), protocol.clone(), Unknown, false),
            (Error::ConversionError, protocol.clone(), Unknown, false),
            (Error::NoMoreRows, DriverFailure::Other(String::new()), Unknown, false),
            (Error::NotSingleResult, DriverFailure::Other(String::new()), Unknown, false),
        ];

        let redactor = Redactor::new();
        for (error, expected, kind, retryable) in cases {
            let rendered = error.to_string();
            let failure = classify(error);
            assert_eq!(
                discriminant(&failure),
                discriminant(&expected),
                "{} classified as {:?}",
                rendered,
                failure
            );
            let normalized = normalize(&failure, &redactor);
            assert_eq!(normalized.kind, kind, "{}", rendered);
            assert_eq!(normalized.retryable, retryable, "{}", rendered);
        }
    }

    #[test]
    fn test_classify_keeps_status_code() {
        let failure = unexpected_message(
            r#"unexpected response for PULL: Failure(Failure { metadata: BoltMap { value: {BoltString { value: "code" }: String(BoltString { value: "Neo.TransientError.General.DatabaseUnavailable" })} } })"#
                .to_string(),
        );
        let DriverFailure::Server { code, .. } = &failure else {
            panic!("expected a server failure, got {:?}", failure);
        };
        assert_eq!(code, "Neo.TransientError.General.DatabaseUnavailable");
        let normalized = normalize(&failure, &Redactor::new());
        assert_eq!(normalized.kind, ErrorKind::Connectivity);
        assert!(normalized.retryable);

        let reset = unexpected_message(format!(
            "unexpected response for PULL: {:?}",
            Err::<(), _>(io_error(IoErrorKind::ConnectionReset))
        ));
        assert!(matches!(reset, DriverFailure::SessionExpired(_)));

        let other_io = unexpected_message(format!(
            "unexpected response for PULL: {:?}",
            Err::<(), _>(io_error(IoErrorKind::InvalidData))
        ));
        assert!(matches!(other_io, DriverFailure::Io(_)));
    }

    #[test]
    fn test_query_counters_from_summary() {
        let stats = Counters {
            nodes_created: 2,
            relationships_created: 1,
            properties_set: 4,
            labels_added: 2,
            constraints_added: 1,
            system_updates: 3,
            ..Default::default()
        };
        let counters = query_counters(&stats);
        assert_eq!(counters.nodes_created, 2);
        assert_eq!(counters.relationships_created, 1);
        assert_eq!(counters.properties_set, 4);
        assert_eq!(counters.labels_added, 2);
        assert_eq!(counters.constraints_added, 1);
        assert_eq!(counters.nodes_deleted, 0);
        assert!(counters.contains_updates());

        assert!(!query_counters(&Counters::default()).contains_updates());
    }

    #[test]
    fn test_driver_config_carries_pool_limits() {
        let descriptor = ConnectionDescriptor::new(ConnectionSettings {
            username: Some("neo4j".into()),
            password: Some("secret".into()),
            connection_timeout_secs: Some(5),
            max_connection_lifetime_secs: Some(600),
            ..Default::default()
        })
        .unwrap();

        let rendered = format!("{:?}", driver_config(&descriptor).unwrap());
        assert!(rendered.contains("connection_timeout: 5s"), "{}", rendered);
        assert!(rendered.contains("max_lifetime: Some(600s)"), "{}", rendered);
    }

    #[test]
    fn test_temporal_values_render_iso_8601() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let time = NaiveTime::from_hms_milli_opt(10, 15, 30, 250).unwrap();
        let local = date.and_time(time);
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let zoned = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let cases = vec![
            (BoltType::from(date), "2024-01-02"),
            (BoltType::from(local), "2024-01-02T10:15:30.250"),
            (
                BoltType::from(local.and_local_timezone(offset).unwrap()),
                "2024-01-02T10:15:30.250+02:00",
            ),
            (BoltType::from((time, offset)), "10:15:30.250+02:00"),
            (BoltType::from(time), "10:15:30.250"),
            (
                BoltType::from((zoned, "Europe/Stockholm")),
                "2024-06-01T12:00:00+02:00[Europe/Stockholm]",
            ),
            (
                BoltType::from((zoned, "Mars/Olympus_Mons")),
                "2024-06-01T12:00:00[Mars/Olympus_Mons]",
            ),
        ];
        for (value, expected) in cases {
            assert_eq!(from_bolt(&value), GraphValue::Temporal(expected.to_string()));
        }
    }

    #[test]
    fn test_durations_render_iso_8601() {
        assert_eq!(iso_duration(&duration(0, 0, 0, 0)), "PT0S");
        assert_eq!(iso_duration(&duration(0, 0, 3_723, 0)), "PT1H2M3S");
        assert_eq!(iso_duration(&duration(0, 1, 30, 500_000_000)), "P1DT30.5S");
        assert_eq!(iso_duration(&duration(0, 2, 0, 0)), "P2D");
        assert_eq!(iso_duration(&duration(0, 0, -90, 0)), "-PT1M30S");
        assert_eq!(iso_duration(&duration(0, 0, -2, 500_000_000)), "-PT1.5S");
        // A month folds to 2_629_800 seconds
        assert_eq!(iso_duration(&duration(1, 0, 0, 0)), "P30DT10H30M");
        assert_eq!(
            from_bolt(&BoltType::Duration(duration(0, 0, 45, 0))),
            GraphValue::Temporal("PT45S".to_string())
        );
    }

    #[test]
    fn test_points_from_bolt() {
        let planar = BoltType::Point2D(BoltPoint2D {
            sr_id: BoltInteger::new(7203),
            x: BoltFloat::new(1.5),
            y: BoltFloat::new(-2.0),
        });
        assert_eq!(
            from_bolt(&planar),
            GraphValue::Point(PointValue {
                srid: 7203,
                x: 1.5,
                y: -2.0,
                z: None,
            })
        );

        let geographic = BoltType::Point3D(BoltPoint3D {
            sr_id: BoltInteger::new(4979),
            x: BoltFloat::new(12.5),
            y: BoltFloat::new(55.7),
            z: BoltFloat::new(30.0),
        });
        assert_eq!(
            from_bolt(&geographic),
            GraphValue::Point(PointValue {
                srid: 4979,
                x: 12.5,
                y: 55.7,
                z: Some(30.0),
            })
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ignore] // Requires a running Neo4j instance with neo4j/password credentials
    async fn test_neo4j_connection() {
        let descriptor = ConnectionDescriptor::new(ConnectionSettings {
            username: Some("neo4j".into()),
            password: Some("password".into()),
            ..Default::default()
        })
        .unwrap();

        let report = tokio::task::spawn_blocking(move || {
            let connector = Neo4jConnectorFactory.connect(&descriptor)?;
            connector.verify()?;
            let mut session = connector.open_session(descriptor.database(), AccessMode::Read)?;
            let result = session.run(&Statement::internal("RETURN 1 AS ok"))?;
            let info = session.server_info()?;
            session.finish(false)?;
            connector.close()?;
            Ok::<_, DriverFailure>((result, info))
        })
        .await
        .unwrap();

        let (result, info) = report.unwrap();
        assert_eq!(result.columns, vec!["ok"]);
        assert_eq!(result.rows, vec![vec![GraphValue::Integer(1)]]);
        assert!(info.version.is_some());
    }
}
