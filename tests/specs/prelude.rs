//! Shared harnesses for the behavioral specs.

use libops_adapters::{FakeAdminAdapter, FakeDeployAdapter, FakeFilterAdapter, FakePublishAdapter, FakeUsersAdapter};
use libops_controller::{ApplySettings, HostDeps, Reconciler};
use libops_core::test_support::new_event;
use libops_core::{EventStatus, FakeClock, ScopeIds};
use libops_dispatcher::{Dispatcher, Tuning};
use libops_storage::{EventQueue, QueuePaths};
use parking_lot::Mutex;
use std::sync::Arc;

pub use libops_core::RequestType;

/// The central half: queue + dispatcher over fake bus and directory.
pub struct PipelineHarness {
    pub dispatcher: Dispatcher<FakePublishAdapter, FakeAdminAdapter, FakeClock>,
    pub queue: Arc<Mutex<EventQueue<FakeClock>>>,
    pub publisher: FakePublishAdapter,
    pub admin: FakeAdminAdapter,
    pub clock: FakeClock,
    // NOTE(lifetime): tempdir removed on drop
    #[allow(dead_code)]
    dir: tempfile::TempDir,
}

impl PipelineHarness {
    /// A harness with one org(1) → project(2) → site(3) chain registered.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let clock = FakeClock::new();
        clock.set_epoch_ms(1_000_000);
        let queue = Arc::new(Mutex::new(
            EventQueue::open(&QueuePaths::under(dir.path()), clock.clone()).unwrap(),
        ));
        let publisher = FakePublishAdapter::new();
        let admin = FakeAdminAdapter::new();
        admin.insert_chain(1, 2, 3);

        let dispatcher = Dispatcher::new(
            Arc::clone(&queue),
            publisher.clone(),
            admin.clone(),
            clock.clone(),
            Tuning::default(),
        );
        Self { dispatcher, queue, publisher, admin, clock, dir }
    }

    pub fn enqueue(&self, event_type: &str, scope: ScopeIds) -> u64 {
        self.queue.lock().enqueue(new_event(event_type, scope)).unwrap()
    }

    /// Run the poll loop for `total_ms` of simulated time, ticking every
    /// `step_ms` like the real 5s poll would.
    pub async fn settle(&mut self, total_ms: u64, step_ms: u64) {
        let mut elapsed = 0;
        self.dispatcher.tick().await.unwrap();
        while elapsed < total_ms {
            self.clock.advance_ms(step_ms);
            elapsed += step_ms;
            self.dispatcher.tick().await.unwrap();
        }
    }

    pub fn status_of(&self, row: u64) -> EventStatus {
        self.queue.lock().get(row).unwrap().status
    }
}

/// The site half: a reconciler over fake host adapters and a tempdir.
pub struct SiteHarness {
    pub reconciler: Reconciler<
        FakeAdminAdapter,
        FakeUsersAdapter,
        FakeFilterAdapter,
        FakeDeployAdapter,
        FakeClock,
    >,
    pub admin: FakeAdminAdapter,
    pub users: FakeUsersAdapter,
    pub filter: FakeFilterAdapter,
    pub deploy: FakeDeployAdapter,
    pub dir: tempfile::TempDir,
}

pub const SITE_ID: i64 = 3;

impl SiteHarness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let admin = FakeAdminAdapter::new();
        admin.insert_chain(1, 2, SITE_ID);
        let users = FakeUsersAdapter::new();
        let filter = FakeFilterAdapter::new();
        let deploy = FakeDeployAdapter::new();

        let settings = ApplySettings {
            home_root: dir.path().join("home"),
            exec_group: "docker".to_string(),
            secrets_path: dir.path().join("libops").join("secrets.env"),
            firewall_chain: "LIBOPS-FIREWALL".to_string(),
        };
        let reconciler = Reconciler::new(
            SITE_ID,
            admin.clone(),
            HostDeps { users: users.clone(), filter: filter.clone(), deploy: deploy.clone() },
            settings,
            FakeClock::new(),
        );
        Self { reconciler, admin, users, filter, deploy, dir }
    }

    pub fn home_root(&self) -> std::path::PathBuf {
        self.dir.path().join("home")
    }

    pub fn secrets_path(&self) -> std::path::PathBuf {
        self.dir.path().join("libops").join("secrets.env")
    }
}
