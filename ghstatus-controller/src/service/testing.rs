//! In-memory fakes shared by the service and scheduler tests

use async_trait::async_trait;
use ghstatus_client::{ClientError, Credentials, StatusPublisher, StatusTarget};
use ghstatus_core::domain::pipeline_run::{
    Condition, ObjectMeta, Param, ParamValue, PipelineRun, PipelineRunStatus, PipelineSpec,
    PipelineTask,
};
use ghstatus_core::domain::secret::Secret;
use ghstatus_core::domain::status::CommitStatus;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::repository::{PipelineRunCache, SecretRepository};
use crate::service::publisher::StatusClientFactory;
use crate::service::reconciler::Reconciler;

/// A labelled, fully annotated run `ci/build-42` whose build task recorded `abc123`
pub fn annotated_run(conditions: Vec<Condition>) -> PipelineRun {
    named_run("build-42", conditions)
}

pub fn named_run(name: &str, conditions: Vec<Condition>) -> PipelineRun {
    let annotations = [
        ("github-status-controller/github-base-url", "https://github.com"),
        ("github-status-controller/github-owner", "acme"),
        ("github-status-controller/github-repository", "widgets"),
        (
            "github-status-controller/github-revision-param-name",
            "tasks.build.GIT_REVISION",
        ),
        ("github-status-controller/github-secret-name", "github"),
        ("github-status-controller/github-secret-key", "token"),
    ];

    PipelineRun {
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: "ci".to_string(),
            labels: [("github-status-controller".to_string(), "enabled".to_string())].into(),
            annotations: annotations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            generation: Some(1),
        },
        status: PipelineRunStatus {
            conditions,
            pipeline_spec: Some(PipelineSpec {
                tasks: vec![PipelineTask {
                    name: "build".to_string(),
                    params: vec![Param {
                        name: "GIT_REVISION".to_string(),
                        value: ParamValue::from("abc123"),
                    }],
                }],
            }),
        },
    }
}

pub async fn run_cache(runs: Vec<PipelineRun>) -> Arc<PipelineRunCache> {
    let cache = Arc::new(PipelineRunCache::new());
    for run in runs {
        cache.upsert(run).await;
    }
    cache
}

pub fn reconciler_with(
    cache: Arc<PipelineRunCache>,
    secrets: FakeSecrets,
    factory: &RecordingFactory,
) -> Reconciler {
    Reconciler::new(
        cache,
        Arc::new(secrets),
        Arc::new(factory.clone()),
        &Config::default(),
    )
}

/// Number of lookups a `FakeSecrets` served
#[derive(Clone, Default)]
pub struct LookupCounter(Arc<AtomicUsize>);

impl LookupCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeSecrets {
    secrets: HashMap<(String, String), Secret>,
    lookups: LookupCounter,
}

impl FakeSecrets {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(namespace: &str, secret: Secret) -> Self {
        let mut secrets = HashMap::new();
        secrets.insert((namespace.to_string(), secret.name.clone()), secret);
        Self {
            secrets,
            lookups: LookupCounter::default(),
        }
    }

    pub fn lookups(&self) -> LookupCounter {
        self.lookups.clone()
    }
}

#[async_trait]
impl SecretRepository for FakeSecrets {
    async fn get(&self, namespace: &str, name: &str) -> anyhow::Result<Option<Secret>> {
        self.lookups.0.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

#[derive(Default)]
struct Recorded {
    connects: usize,
    tokens: Vec<String>,
    published: Vec<(StatusTarget, CommitStatus)>,
    attempts: usize,
}

/// Factory whose publishers record instead of calling GitHub
#[derive(Clone, Default)]
pub struct RecordingFactory {
    recorded: Arc<Mutex<Recorded>>,
    fail_at: Option<usize>,
    panic_at_connect: Option<usize>,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish attempt number `attempt` (0-based, across all publishers) fails
    pub fn failing_at(attempt: usize) -> Self {
        Self {
            fail_at: Some(attempt),
            ..Self::default()
        }
    }

    /// Connect number `connect` (0-based) panics
    pub fn panicking_at_connect(connect: usize) -> Self {
        Self {
            panic_at_connect: Some(connect),
            ..Self::default()
        }
    }

    /// Every publish waits for a permit of the returned gate
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let factory = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (factory, gate)
    }

    pub fn connects(&self) -> usize {
        self.recorded.lock().unwrap().connects
    }

    /// Tokens handed to `connect`; app credentials show as `app:<id>/<installation>`
    pub fn tokens(&self) -> Vec<String> {
        self.recorded.lock().unwrap().tokens.clone()
    }

    pub fn published(&self) -> Vec<(StatusTarget, CommitStatus)> {
        self.recorded.lock().unwrap().published.clone()
    }

    /// Publish attempts, failed ones included
    pub fn attempts(&self) -> usize {
        self.recorded.lock().unwrap().attempts
    }
}

#[async_trait]
impl StatusClientFactory for RecordingFactory {
    async fn connect(
        &self,
        target: StatusTarget,
        credentials: Credentials,
    ) -> ghstatus_client::Result<Box<dyn StatusPublisher>> {
        let token = match &credentials {
            Credentials::Token(token) => token.expose_secret().to_string(),
            Credentials::App(app) => format!("app:{}/{}", app.app_id, app.installation_id),
        };

        let connect = {
            let mut recorded = self.recorded.lock().unwrap();
            recorded.connects += 1;
            recorded.tokens.push(token);
            recorded.connects - 1
        };
        if self.panic_at_connect == Some(connect) {
            panic!("connect {} blew up", connect);
        }

        Ok(Box::new(RecordingPublisher {
            target,
            recorded: Arc::clone(&self.recorded),
            fail_at: self.fail_at,
            gate: self.gate.clone(),
        }))
    }
}

struct RecordingPublisher {
    target: StatusTarget,
    recorded: Arc<Mutex<Recorded>>,
    fail_at: Option<usize>,
    gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl StatusPublisher for RecordingPublisher {
    async fn publish(&self, status: &CommitStatus) -> ghstatus_client::Result<()> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let mut recorded = self.recorded.lock().unwrap();
        let attempt = recorded.attempts;
        recorded.attempts += 1;

        if self.fail_at == Some(attempt) {
            return Err(ClientError::api_error(502, "Bad Gateway"));
        }

        recorded.published.push((self.target.clone(), status.clone()));
        Ok(())
    }
}
