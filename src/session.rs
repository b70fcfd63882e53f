//! Backend session management.
//!
//! Wraps a stratadb `Session` and exposes the handful of catalogue commands the
//! document facade needs. Databases map onto stratadb branches and collections
//! onto spaces within a branch.

use stratadb::{BranchId, Command, OpenOptions, Output, Session, Strata, TxnOptions};

use crate::error::{McpError, Result};

/// Session over the embedded document engine.
pub struct StoreSession {
    /// Kept alive for the lifetime of the session
    #[allow(dead_code)]
    strata: Strata,
    /// Session for command execution
    session: Session,
}

impl StoreSession {
    /// Create a new session from a Strata database.
    pub fn new(strata: Strata) -> Self {
        let session = strata.session();
        Self { strata, session }
    }

    /// Open an in-memory store. Data does not outlive the process.
    pub fn cache() -> Result<Self> {
        Ok(Self::new(Strata::cache()?))
    }

    /// Open (or create) a persistent store at `path`.
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self::new(Strata::open_with(path, OpenOptions::new())?))
    }

    /// Execute a command via the session.
    pub fn execute(&mut self, cmd: Command) -> Result<Output> {
        Ok(self.session.execute(cmd)?)
    }

    /// Names of every database (branch) in the store.
    pub fn list_databases(&mut self) -> Result<Vec<String>> {
        let output = self.execute(Command::BranchList {
            state: None,
            limit: None,
            offset: None,
        })?;
        match output {
            Output::BranchInfoList(branches) => Ok(branches
                .into_iter()
                .map(|bi| bi.info.id.as_str().to_string())
                .collect()),
            _ => Err(unexpected("BranchList")),
        }
    }

    /// Whether a database exists.
    pub fn database_exists(&mut self, database: &str) -> Result<bool> {
        match self.execute(Command::BranchExists {
            branch: BranchId::from(database.to_string()),
        })? {
            Output::Bool(b) => Ok(b),
            _ => Err(unexpected("BranchExists")),
        }
    }

    /// Names of every collection (space) in `database`.
    pub fn list_collections(&mut self, database: &str) -> Result<Vec<String>> {
        let output = self.execute(Command::SpaceList {
            branch: Some(BranchId::from(database.to_string())),
        })?;
        match output {
            Output::SpaceList(spaces) => Ok(spaces),
            _ => Err(unexpected("SpaceList")),
        }
    }

    /// Whether `collection` exists in `database`. A missing database has no collections.
    pub fn collection_exists(&mut self, database: &str, collection: &str) -> Result<bool> {
        if !self.database_exists(database)? {
            return Ok(false);
        }
        Ok(self
            .list_collections(database)?
            .iter()
            .any(|name| name == collection))
    }

    /// Create the database and collection if either is missing.
    pub fn ensure_collection(&mut self, database: &str, collection: &str) -> Result<()> {
        if !self.database_exists(database)? {
            tracing::debug!(database, "creating database");
            self.execute(Command::BranchCreate {
                branch_id: Some(database.to_string()),
                metadata: None,
            })?;
        }
        if !self
            .list_collections(database)?
            .iter()
            .any(|name| name == collection)
        {
            tracing::debug!(database, collection, "creating collection");
            self.execute(Command::SpaceCreate {
                branch: Some(BranchId::from(database.to_string())),
                space: collection.to_string(),
            })?;
        }
        Ok(())
    }

    /// Run `f` inside a read-write transaction on `database`.
    ///
    /// Commits when `f` succeeds and rolls back when it fails, so either every
    /// write made by `f` lands or none does.
    pub fn transaction<T>(
        &mut self,
        database: &str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.execute(Command::TxnBegin {
            branch: Some(BranchId::from(database.to_string())),
            options: Some(TxnOptions { read_only: false }),
        })?;

        match f(self) {
            Ok(value) => {
                self.execute(Command::TxnCommit)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.execute(Command::TxnRollback) {
                    tracing::warn!(database, error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

fn unexpected(command: &str) -> McpError {
    McpError::Internal(format!("Unexpected output for {}", command))
}
