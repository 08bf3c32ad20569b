//! Services hosted by the daemon itself.

use gatelink_connector::{
    BAD_REQUEST, ConnectorMetrics, Context, Reply, Runtime, ServiceDirectory, ServiceRef, Subscription,
    SubscriptionRegistry,
};
use gatelink_core::{Envelope, NodeIdentity, Payload, keys};
use serde_json::{Value, json};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Default service: answers commands and stats, takes any public event.
pub const CONSOLE: &str = "console";
/// Sink for answers to requests issued from the command line.
pub const CLI: &str = "cli";

const COMMANDS: &[(&str, &str)] = &[
    ("help", "list commands"),
    ("echo", "return the request payload"),
    ("uptime", "seconds since the daemon started"),
];

pub struct LocalServices {
    default: String,
    started: Instant,
    metrics: Cell<ConnectorMetrics>,
}

impl LocalServices {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            started: Instant::now(),
            metrics: Cell::new(ConnectorMetrics::default()),
        }
    }

    /// Latest connector counters, served as the `connector` stats.
    pub fn record(&self, metrics: ConnectorMetrics) {
        self.metrics.set(metrics);
    }

    fn uptime(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

fn answer(data: Value) -> Reply {
    let mut payload = Payload::new();
    payload.insert(keys::RESULT.into(), 0.into());
    payload.insert(keys::DATA.into(), data);
    Reply::Ready(payload)
}

fn refuse(comment: String) -> Reply {
    let mut payload = Payload::new();
    payload.insert(keys::RESULT.into(), BAD_REQUEST.into());
    payload.insert(keys::COMMENT.into(), comment.into());
    Reply::Ready(payload)
}

impl ServiceDirectory for LocalServices {
    fn resolve(&self, name: &str) -> Option<ServiceRef> {
        (name == self.default || name == CLI).then(|| ServiceRef::new(name))
    }

    fn is_public(&self, service: &ServiceRef, _event: &str) -> bool {
        service.name() == self.default
    }

    fn command(&self, service: &ServiceRef, command: &str, request: &Envelope) -> Reply {
        if service.name() != self.default {
            return refuse(format!("Service '{service}' takes no commands"));
        }
        match command.split_whitespace().next().unwrap_or_default() {
            "help" => answer(COMMANDS.iter().map(|(name, text)| (name.to_string(), json!(text))).collect()),
            "echo" => {
                let echoed: Payload = request
                    .payload
                    .iter()
                    .filter(|(key, _)| !key.starts_with("__"))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                answer(Value::Object(echoed))
            }
            "uptime" => answer(json!(self.uptime())),
            other => refuse(format!("Unknown command '{other}'")),
        }
    }

    fn stats(&self, service: &ServiceRef, stats: &str, _request: &Envelope) -> Reply {
        if service.name() != self.default {
            return refuse(format!("Service '{service}' has no stats"));
        }
        match stats {
            "connector" => answer(serde_json::to_value(self.metrics.get()).unwrap_or_default()),
            "uptime" => answer(json!(self.uptime())),
            other => refuse(format!("Unknown stats '{other}'")),
        }
    }
}

/// Subscriptions fixed by the configuration file.
pub struct ConfiguredSubscriptions(pub Vec<Subscription>);

impl SubscriptionRegistry for ConfiguredSubscriptions {
    fn subscriptions(&self, _connector: &str) -> Vec<Subscription> {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct LocalRuntime {
    playing: AtomicBool,
}

impl Runtime for LocalRuntime {
    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    fn play(&self) -> i64 {
        self.playing.store(true, Ordering::Relaxed);
        0
    }

    fn pause(&self) -> i64 {
        self.playing.store(false, Ordering::Relaxed);
        0
    }
}

/// Everything a connector is lent while the daemon runs.
pub struct LocalHost {
    pub node: NodeIdentity,
    pub services: LocalServices,
    pub subscriptions: ConfiguredSubscriptions,
    pub runtime: LocalRuntime,
}

impl LocalHost {
    pub fn new(node: NodeIdentity, subscriptions: Vec<Subscription>) -> Self {
        let services = LocalServices::new(node.service.clone());
        Self {
            node,
            services,
            subscriptions: ConfiguredSubscriptions(subscriptions),
            runtime: LocalRuntime::default(),
        }
    }

    pub fn cx(&self) -> Context<'_> {
        Context {
            node: &self.node,
            services: &self.services,
            subscriptions: &self.subscriptions,
            runtime: &self.runtime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(payload: Value) -> Envelope {
        let Value::Object(payload) = payload else {
            panic!("payload must be an object");
        };
        Envelope::new(gatelink_core::events::REMOTE_COMMAND, payload)
    }

    fn ready(reply: Reply) -> Payload {
        match reply {
            Reply::Ready(payload) => payload,
            Reply::Pending => panic!("local services answer immediately"),
        }
    }

    #[test]
    fn resolves_default_and_cli_only() {
        let services = LocalServices::new(CONSOLE);
        assert!(services.resolve(CONSOLE).is_some());
        assert!(services.resolve(CLI).is_some());
        assert!(services.resolve("store").is_none());
    }

    #[test]
    fn echo_strips_reserved_keys() {
        let services = LocalServices::new(CONSOLE);
        let console = ServiceRef::new(CONSOLE);
        let payload = ready(services.command(
            &console,
            "echo",
            &request(json!({"__command__": "echo", "text": "hi"})),
        ));
        assert_eq!(payload[keys::RESULT], 0);
        assert_eq!(payload[keys::DATA], json!({"text": "hi"}));
    }

    #[test]
    fn unknown_command_is_refused() {
        let services = LocalServices::new(CONSOLE);
        let payload = ready(services.command(&ServiceRef::new(CONSOLE), "reboot now", &request(json!({}))));
        assert_eq!(payload[keys::RESULT], BAD_REQUEST);
        assert_eq!(payload[keys::COMMENT], "Unknown command 'reboot'");
    }

    #[test]
    fn help_lists_commands() {
        let services = LocalServices::new(CONSOLE);
        let payload = ready(services.command(&ServiceRef::new(CONSOLE), "help", &request(json!({}))));
        assert!(payload[keys::DATA].get("uptime").is_some());
    }

    #[test]
    fn connector_stats_reflect_recorded_metrics() {
        let services = LocalServices::new(CONSOLE);
        services.record(ConnectorMetrics {
            sessions_opened: 3,
            ..ConnectorMetrics::default()
        });
        let payload = ready(services.stats(&ServiceRef::new(CONSOLE), "connector", &request(json!({}))));
        assert_eq!(payload[keys::DATA]["sessions_opened"], 3);
    }

    #[test]
    fn cli_sink_takes_no_requests() {
        let services = LocalServices::new(CONSOLE);
        let payload = ready(services.command(&ServiceRef::new(CLI), "help", &request(json!({}))));
        assert_eq!(payload[keys::RESULT], BAD_REQUEST);
    }

    #[test]
    fn runtime_toggles() {
        let runtime = LocalRuntime::default();
        assert!(!runtime.is_playing());
        assert_eq!(runtime.play(), 0);
        assert!(runtime.is_playing());
        assert_eq!(runtime.pause(), 0);
        assert!(!runtime.is_playing());
    }
}
