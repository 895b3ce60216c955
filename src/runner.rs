use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

type Runner = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send>;

#[derive(Default)]
pub struct RunnerManager {
    runners: Vec<Runner>,
}

impl RunnerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Tasks must return promptly once their token is cancelled.
    pub fn add<F, Fut>(mut self, runner: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.runners.push(Box::new(move |token| runner(token).boxed()));
        self
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    /// Run all registered tasks to completion.
    ///
    /// # Returns
    /// * `Ok(())` if every task finished successfully
    /// * The first task error (a panic counts as one) otherwise
    pub async fn run(self, parent: &CancellationToken) -> anyhow::Result<()> {
        let token = parent.child_token();
        let mut set = JoinSet::new();

        for runner in self.runners {
            set.spawn(runner(token.clone()).in_current_span());
        }

        let mut first_error: Option<anyhow::Error> = None;
        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("runner task panicked: {}", e)),
            };

            let Err(e) = outcome else {
                continue;
            };

            if first_error.is_none() {
                debug!("Runner failed, cancelling remaining runners: {:#}", e);
                token.cancel();
                first_error = Some(e);
            } else {
                warn!("Additional runner error after shutdown began: {:#}", e);
            }
        }

        // Nothing outlives the call, but release the child token either way
        token.cancel();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
