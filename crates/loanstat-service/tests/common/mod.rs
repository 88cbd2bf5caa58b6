//! Shared fixtures for the service integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing_subscriber::fmt::MakeWriter;

use loanstat_core::error::{LoanstatError, Result};
use loanstat_service::app_state::AppState;
use loanstat_service::db::{Database, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeMode {
    Up,
    ConnectFails,
    QueryFails,
}

/// In-memory stand-in for the database. Tracks how many sessions are open so
/// tests can assert every session was released.
pub struct FakeDatabase {
    mode: FakeMode,
    open: Arc<AtomicUsize>,
    opened_total: AtomicUsize,
}

impl FakeDatabase {
    pub fn new(mode: FakeMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            open: Arc::new(AtomicUsize::new(0)),
            opened_total: AtomicUsize::new(0),
        })
    }

    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn opened_total(&self) -> usize {
        self.opened_total.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    fail: bool,
    open: Arc<AtomicUsize>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn execute_probe(&mut self) -> Result<()> {
        if self.fail {
            Err(LoanstatError::Unavailable("relation check failed: server closed the connection".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn open_session(&self) -> Result<Box<dyn Session>> {
        if self.mode == FakeMode::ConnectFails {
            return Err(LoanstatError::Unavailable("connection refused".into()));
        }
        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened_total.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            fail: self.mode == FakeMode::QueryFails,
            open: Arc::clone(&self.open),
        }))
    }
}

pub fn state_with(mode: FakeMode) -> (AppState, Arc<FakeDatabase>) {
    let db = FakeDatabase::new(mode);
    let state = AppState::new(db.clone());
    (state, db)
}

/// Log sink that keeps everything written to it.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
    }
}

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuf {
    type Writer = SharedBuf;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
