//! End-to-end failover scenarios for the managed connection.

use async_trait::async_trait;
use rudder::{
    Connection, DiscoveryConnector, Endpoint, Error, ManagedConnection, Result, SentinelCommands,
    SentinelConfig,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ==================== Mock discovery endpoints ====================

#[derive(Clone)]
enum Sentinel {
    /// Connection refused on dial.
    Refuse,
    /// Reports a master at the given address.
    Master {
        host: &'static str,
        port: u16,
        down: bool,
        run_id: &'static str,
    },
    /// No master registered under any name.
    NoMaster,
    /// Accepts the dial but never answers queries.
    Hang,
}

struct MockConnector {
    sentinels: HashMap<String, Sentinel>,
    dials: Arc<AtomicUsize>,
}

impl MockConnector {
    fn new(sentinels: &[(&str, Sentinel)]) -> Self {
        Self {
            sentinels: sentinels
                .iter()
                .map(|(host, s)| (host.to_string(), s.clone()))
                .collect(),
            dials: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct MockLink {
    sentinel: Sentinel,
}

#[async_trait]
impl DiscoveryConnector for MockConnector {
    type Link = MockLink;

    async fn open(&self, endpoint: &Endpoint) -> Result<MockLink> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        match self.sentinels.get(&endpoint.host) {
            Some(Sentinel::Refuse) | None => Err(Error::Unreachable(format!(
                "connection refused: {endpoint}"
            ))),
            Some(sentinel) => Ok(MockLink {
                sentinel: sentinel.clone(),
            }),
        }
    }
}

#[async_trait]
impl SentinelCommands for MockLink {
    async fn sentinel(&mut self, args: &[&str]) -> Result<Vec<String>> {
        match (&self.sentinel, args[0]) {
            (Sentinel::Hang, _) => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(Error::Unreachable("hung link".into()))
            }
            (Sentinel::NoMaster, "get-master-addr-by-name") => Ok(vec![]),
            (Sentinel::Master { host, port, .. }, "get-master-addr-by-name") => {
                Ok(vec![host.to_string(), port.to_string()])
            }
            (Sentinel::Master { down, run_id, .. }, "is-master-down-by-addr") => Ok(vec![
                if *down { "1" } else { "0" }.to_string(),
                run_id.to_string(),
            ]),
            _ => Err(Error::InvalidReply(format!("unexpected query: {}", args[0]))),
        }
    }
}

// ==================== Mock key-value connection ====================

#[derive(Default)]
struct MockConnection {
    bound: Option<Endpoint>,
    password: Option<String>,
    bind_calls: usize,
    connect_calls: usize,
    /// Refuse this many connects before succeeding.
    refuse_connects: usize,
    connected: bool,
}

#[async_trait]
impl Connection for MockConnection {
    fn bind(&mut self, addr: &Endpoint, password: Option<&str>) {
        self.bound = Some(addr.clone());
        self.password = password.map(|p| p.to_string());
        self.bind_calls += 1;
        self.connected = false;
    }

    fn bound_to(&self) -> Option<&Endpoint> {
        self.bound.as_ref()
    }

    async fn connect(&mut self) -> Result<()> {
        self.connect_calls += 1;
        if self.refuse_connects > 0 {
            self.refuse_connects -= 1;
            return Err(Error::Unreachable("master refused connection".into()));
        }
        self.connected = true;
        Ok(())
    }

    async fn execute(&mut self, cmd: &[&str]) -> Result<Vec<String>> {
        if !self.connected {
            return Err(Error::Unreachable("not connected".into()));
        }
        Ok(vec![format!("OK {}", cmd.join(" "))])
    }
}

// ==================== Helpers ====================

const LIVE_MASTER: Sentinel = Sentinel::Master {
    host: "10.0.0.5",
    port: 6380,
    down: false,
    run_id: "abcdef1234",
};

fn endpoints(hosts: &[&str]) -> Vec<Endpoint> {
    hosts.iter().map(|h| Endpoint::new(*h, 26379)).collect()
}

fn config(hosts: &[&str], timeout: Duration, wait: Duration) -> SentinelConfig {
    SentinelConfig::builder()
        .master_name("mymaster")
        .master_password("secret")
        .endpoints(endpoints(hosts))
        .failover_reconnect_timeout(timeout)
        .failover_reconnect_wait(wait)
        .build()
}

// ==================== Scenarios ====================

#[tokio::test]
async fn test_live_master_resolves_in_one_attempt() {
    let connector = MockConnector::new(&[("s1", LIVE_MASTER)]);
    let dials = connector.dials.clone();
    let cfg = config(&["s1"], Duration::from_secs(5), Duration::from_millis(10));
    let mut conn = ManagedConnection::new(MockConnection::default(), cfg, connector);

    conn.connect().await.unwrap();

    assert_eq!(conn.inner().bound, Some(Endpoint::new("10.0.0.5", 6380)));
    assert_eq!(conn.inner().password.as_deref(), Some("secret"));
    assert!(conn.inner().connected);
    assert_eq!(dials.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rotates_past_refusing_endpoint() {
    let connector = MockConnector::new(&[("a", Sentinel::Refuse), ("b", LIVE_MASTER)]);
    let cfg = config(
        &["a", "b", "c"],
        Duration::from_secs(5),
        Duration::from_millis(10),
    );
    let mut conn = ManagedConnection::new(MockConnection::default(), cfg, connector);

    conn.connect().await.unwrap();

    assert_eq!(conn.inner().bound, Some(Endpoint::new("10.0.0.5", 6380)));

    // Rotation moved only the head: [a, b, c] became [b, c, a].
    let order: Vec<_> = conn
        .failover()
        .unwrap()
        .registry()
        .iter()
        .map(|e| e.host.clone())
        .collect();
    assert_eq!(order, ["b", "c", "a"]);
}

#[tokio::test]
async fn test_down_master_retries_until_deadline() {
    let down = Sentinel::Master {
        host: "10.0.0.5",
        port: 6380,
        down: true,
        run_id: "abcdef1234",
    };
    let connector = MockConnector::new(&[("s1", down)]);
    let deadline = Duration::from_millis(250);
    let wait = Duration::from_millis(25);
    let cfg = config(&["s1"], deadline, wait);
    let mut conn = ManagedConnection::new(MockConnection::default(), cfg, connector);

    let started = Instant::now();
    let err = conn.connect().await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, Error::MasterUnavailable(_)));
    assert!(elapsed >= deadline, "gave up early: {elapsed:?}");
    assert!(
        elapsed <= deadline + wait + Duration::from_millis(150),
        "kept retrying past the deadline: {elapsed:?}"
    );
    // The connection never got rebound to an unconfirmed master.
    assert_eq!(conn.inner().bind_calls, 0);
}

#[tokio::test]
async fn test_no_master_fails_immediately_without_retry() {
    let connector = MockConnector::new(&[("s1", Sentinel::NoMaster)]);
    let dials = connector.dials.clone();
    let cfg = config(&["s1", "s2"], Duration::from_secs(5), Duration::from_millis(10));
    let mut conn = ManagedConnection::new(MockConnection::default(), cfg, connector);

    let err = conn.connect().await.unwrap_err();

    assert!(matches!(err, Error::NoMaster(name) if name == "mymaster"));
    // One dial, no rotation, no sleeps, no rebinding.
    assert_eq!(dials.load(Ordering::SeqCst), 1);
    assert_eq!(conn.inner().bind_calls, 0);
    assert_eq!(conn.inner().connect_calls, 0);
}

#[tokio::test]
async fn test_hung_discovery_surfaces_timeout() {
    let connector = MockConnector::new(&[("s1", Sentinel::Hang)]);
    let cfg = config(&["s1"], Duration::from_millis(100), Duration::from_millis(10));
    let mut conn = ManagedConnection::new(MockConnection::default(), cfg, connector);

    let started = Instant::now();
    let err = conn.connect().await.unwrap_err();

    assert!(matches!(err, Error::Timeout));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_refused_master_connect_reenters_discovery() {
    let connector = MockConnector::new(&[("s1", LIVE_MASTER)]);
    let cfg = config(&["s1"], Duration::from_secs(5), Duration::from_millis(5));
    let inner = MockConnection {
        refuse_connects: 2,
        ..Default::default()
    };
    let mut conn = ManagedConnection::new(inner, cfg, connector);

    conn.connect().await.unwrap();

    assert!(conn.inner().connected);
    assert_eq!(conn.inner().connect_calls, 3);
}

#[tokio::test]
async fn test_rebind_is_idempotent() {
    let connector = MockConnector::new(&[("s1", LIVE_MASTER)]);
    let cfg = config(&["s1"], Duration::from_secs(5), Duration::from_millis(10));
    let mut conn = ManagedConnection::new(MockConnection::default(), cfg, connector);

    conn.resolve_and_rebind().await.unwrap();
    conn.resolve_and_rebind().await.unwrap();

    // Second resolution found the same address and left the binding alone.
    assert_eq!(conn.inner().bind_calls, 1);
    assert_eq!(conn.inner().bound, Some(Endpoint::new("10.0.0.5", 6380)));
}

#[tokio::test]
async fn test_unmanaged_config_bypasses_discovery() {
    let connector = MockConnector::new(&[("s1", LIVE_MASTER)]);
    let dials = connector.dials.clone();
    // No master name: management inactive even with endpoints configured.
    let cfg = SentinelConfig::builder()
        .endpoints(endpoints(&["s1"]))
        .build();
    let mut inner = MockConnection::default();
    inner.bind(&Endpoint::new("direct-host", 6379), None);
    let mut conn = ManagedConnection::new(inner, cfg, connector);

    assert!(!conn.is_sentinel_managed());
    conn.connect().await.unwrap();
    conn.resolve_and_rebind().await.unwrap();

    assert_eq!(dials.load(Ordering::SeqCst), 0);
    assert_eq!(conn.inner().bound, Some(Endpoint::new("direct-host", 6379)));

    let reply = conn.execute(&["PING"]).await.unwrap();
    assert_eq!(reply, ["OK PING"]);
}

#[tokio::test]
async fn test_execute_flows_through_to_inner() {
    let connector = MockConnector::new(&[("s1", LIVE_MASTER)]);
    let cfg = config(&["s1"], Duration::from_secs(5), Duration::from_millis(10));
    let mut conn = ManagedConnection::new(MockConnection::default(), cfg, connector);

    conn.connect().await.unwrap();
    let reply = conn.execute(&["SET", "k", "v"]).await.unwrap();
    assert_eq!(reply, ["OK SET k v"]);
}
