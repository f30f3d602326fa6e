use crate::model::dom::Document;
use crate::model::page::{MutationKind, MutationRecord, MutationSource, ObserveOptions, SubscriptionId};
use crate::ops::reconcile::{ReconcileReport, reconcile_all};
use crate::ops::rules::Rules;

/// Where the coordinator is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Not started
    Idle,
    /// Watching the whole body until every task list container exists
    Seeking { body: SubscriptionId },
    /// Watching each task list container; lasts for the page's lifetime
    Tracking { subscriptions: Vec<SubscriptionId> },
    /// Torn down; notifications are ignored
    Stopped,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub passes: usize,
    pub transitions: usize,
    pub last_report: ReconcileReport,
}

/// Decides when to reconcile the page.
///
/// Starts by watching the body coarsely, hands off to one fine-grained
/// subscription per task list once the lists exist, and runs a
/// reconciliation pass for every relevant structural change after that.
#[derive(Debug)]
pub struct Coordinator {
    rules: Rules,
    phase: Phase,
    stats: CoordinatorStats,
}

enum Route {
    Seek,
    Track,
    Ignore,
}

impl Coordinator {
    pub fn new(rules: Rules) -> Self {
        Coordinator {
            rules,
            phase: Phase::Idle,
            stats: CoordinatorStats::default(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Begin observing. Subscribes to the body, then reconciles once in case
    /// the page finished rendering before we attached.
    ///
    /// When the body cannot be observed the coordinator stays `Idle` and
    /// `start` may be called again later. Once started, further calls have
    /// no effect.
    pub fn start<H: MutationSource>(&mut self, host: &mut H) {
        if self.phase != Phase::Idle {
            tracing::debug!(phase = ?self.phase, "coordinator already started");
            return;
        }

        match host.body() {
            Some(body) => match host.subscribe(&body, ObserveOptions::structural()) {
                Ok(id) => {
                    tracing::debug!(subscription = %id, "seeking task lists");
                    self.phase = Phase::Seeking { body: id };
                }
                Err(e) => tracing::warn!(error = %e, "could not observe page body; still idle"),
            },
            None => tracing::info!("page has no body yet; still idle"),
        }

        self.run_pass(host);

        // Lists already on screen will not announce themselves
        self.try_handoff(host);
    }

    /// Deliver a batch of records for one subscription
    pub fn notify<H: MutationSource>(
        &mut self,
        host: &mut H,
        subscription: SubscriptionId,
        records: &[MutationRecord<H::Node>],
    ) {
        let route = match &self.phase {
            Phase::Seeking { body } if *body == subscription => Route::Seek,
            Phase::Tracking { subscriptions } if subscriptions.contains(&subscription) => {
                Route::Track
            }
            _ => Route::Ignore,
        };

        match route {
            Route::Seek => {
                if records.iter().any(|r| r.targets_element()) {
                    self.try_handoff(host);
                }
            }
            Route::Track => {
                // One pass per list change; passes are idempotent so no batching
                for record in records {
                    if record.kind == MutationKind::ChildList && record.targets_element() {
                        self.run_pass(host);
                    }
                }
            }
            Route::Ignore => {
                tracing::trace!(%subscription, "ignoring notification for stale subscription");
            }
        }
    }

    /// Dispose every live subscription. Notifications arriving afterwards are ignored.
    pub fn stop<H: MutationSource>(&mut self, host: &mut H) {
        match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Seeking { body } => host.dispose(body),
            Phase::Tracking { subscriptions } => {
                for id in subscriptions {
                    host.dispose(id);
                }
            }
            Phase::Idle | Phase::Stopped => {}
        }
        tracing::debug!("coordinator stopped");
    }

    /// Switch to per-list tracking if every list container is present.
    /// Returns whether the switch happened.
    fn try_handoff<H: MutationSource>(&mut self, host: &mut H) -> bool {
        if !matches!(self.phase, Phase::Idle | Phase::Seeking { .. }) {
            return false;
        }

        let containers: Option<Vec<H::Node>> = self
            .rules
            .categories
            .iter()
            .map(|c| host.query_first(&c.container))
            .collect();
        let Some(containers) = containers else {
            tracing::info!("task list containers not rendered yet");
            return false;
        };

        let mut subscriptions = Vec::with_capacity(containers.len());
        for (category, container) in self.rules.categories.iter().zip(&containers) {
            match host.subscribe(container, ObserveOptions::structural()) {
                Ok(id) => {
                    tracing::debug!(category = %category.name, subscription = %id, "tracking task list");
                    subscriptions.push(id);
                }
                Err(e) => {
                    tracing::warn!(category = %category.name, error = %e, "could not observe task list");
                }
            }
        }

        if subscriptions.is_empty() {
            tracing::warn!("no task list could be observed; still seeking");
            return false;
        }

        if let Phase::Seeking { body } = self.phase {
            host.dispose(body);
        }
        self.phase = Phase::Tracking { subscriptions };
        self.stats.transitions += 1;

        // Tasks may have rendered between the last pass and subscribing
        self.run_pass(host);
        true
    }

    fn run_pass<H: MutationSource>(&mut self, host: &mut H) {
        let report = reconcile_all(host, &self.rules);
        self.stats.passes += 1;
        self.stats.last_report = report;
    }
}

/// Deliver queued notifications from an in-memory document until none are
/// left. Returns the number of notifications delivered.
pub fn pump(doc: &mut Document, coordinator: &mut Coordinator) -> usize {
    let mut delivered = 0;
    loop {
        let batch = doc.take_notifications();
        if batch.is_empty() {
            return delivered;
        }
        for notification in batch {
            coordinator.notify(doc, notification.subscription, &notification.records);
            delivered += 1;
        }
    }
}
