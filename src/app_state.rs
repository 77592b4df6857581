//! Implements a struct that holds the state of the web server.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;

use crate::{Error, db::initialize};

/// The state of the web server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection.
    ///
    /// Every handler holds the lock for the whole of its operation, which
    /// serializes writers.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The directory that exported statements and CSV files are written to.
    pub export_dir: PathBuf,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by creating or upgrading
    /// the transactions table.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, export_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            export_dir: export_dir.into(),
        })
    }
}
