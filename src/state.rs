// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::broker::TransactionBroker;
use crate::custody::KeyCustodyManager;
use crate::messaging::Messenger;

#[derive(Clone)]
pub struct AppState {
    pub custody: Arc<KeyCustodyManager>,
    pub broker: Arc<TransactionBroker>,
    /// `None` when no messaging gateway is configured; invites are refused.
    pub messenger: Option<Arc<dyn Messenger>>,
}

impl AppState {
    pub fn new(
        custody: Arc<KeyCustodyManager>,
        broker: Arc<TransactionBroker>,
        messenger: Option<Arc<dyn Messenger>>,
    ) -> Self {
        Self {
            custody,
            broker,
            messenger,
        }
    }
}

#[cfg(test)]
pub mod test_support {
    //! Fully wired state over a temporary database and the mock ledger.

    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::blockchain::mock::MockLedger;
    use crate::crypto::MasterKey;
    use crate::messaging::recording::RecordingMessenger;
    use crate::storage::IdentityDatabase;

    pub struct TestContext {
        pub _dir: TempDir,
        pub state: AppState,
        pub ledger: Arc<MockLedger>,
        pub messenger: Arc<RecordingMessenger>,
    }

    pub fn test_context() -> TestContext {
        build(Arc::new(RecordingMessenger::default()), true)
    }

    /// Context without a messaging gateway.
    pub fn test_context_without_messenger() -> TestContext {
        build(Arc::new(RecordingMessenger::default()), false)
    }

    pub fn test_context_with_messenger(messenger: RecordingMessenger) -> TestContext {
        build(Arc::new(messenger), true)
    }

    fn build(messenger: Arc<RecordingMessenger>, with_messenger: bool) -> TestContext {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(IdentityDatabase::open(&dir.path().join("identities.redb")).unwrap());
        let custody = Arc::new(KeyCustodyManager::new(db, MasterKey::generate()));
        let ledger = Arc::new(MockLedger::default());
        let broker = Arc::new(TransactionBroker::new(
            custody.clone(),
            ledger.clone(),
            Duration::from_millis(50),
        ));
        let gateway: Option<Arc<dyn Messenger>> = if with_messenger {
            Some(messenger.clone() as Arc<dyn Messenger>)
        } else {
            None
        };

        TestContext {
            _dir: dir,
            state: AppState::new(custody, broker, gateway),
            ledger,
            messenger,
        }
    }
}
