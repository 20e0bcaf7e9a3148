#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use clipfind_core::model::QueryResult;
use clipfind_core::notifier::Notifier;
use clipfind_core::sound::SoundPlayer;
use rusqlite::Connection;

/// Writes a small file catalog: `rows` are (file name, size, directory id).
pub fn write_catalog(dir: &Path, file_name: &str, rows: &[(&str, i64, i64)]) -> PathBuf {
    let path = dir.join(file_name);
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE PATHS (PATH_ID INTEGER PRIMARY KEY, FATHER_ID INTEGER, PATH_NAME TEXT NOT NULL);
         CREATE TABLE FILES (FILE_ID INTEGER PRIMARY KEY, FILE_NAME TEXT NOT NULL,
                             FILE_SIZE INTEGER NOT NULL, PATH_ID INTEGER NOT NULL);
         INSERT INTO PATHS VALUES (1, NULL, 'Drive'), (5, 1, 'photos'), (7, 5, 'holiday');",
    )
    .unwrap();
    for (name, size, directory) in rows {
        conn.execute(
            "INSERT INTO FILES (FILE_NAME, FILE_SIZE, PATH_ID) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, size, directory],
        )
        .unwrap();
    }
    path
}

pub fn sunset_rows() -> Vec<(&'static str, i64, i64)> {
    vec![
        ("sunset_beach.jpg", 2048, 7),
        ("Sunset.png", 1_572_864, 5),
        ("moonrise.jpg", 10, 5),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Message(String),
    Result { catalog: String, count: usize },
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub notices: Rc<RefCell<Vec<Notice>>>,
}

impl Notifier for RecordingNotifier {
    fn simple_notify(&mut self, message: &str, _timeout: Duration) {
        self.notices
            .borrow_mut()
            .push(Notice::Message(message.to_string()));
    }

    fn deliver(&mut self, result: &QueryResult) {
        self.notices.borrow_mut().push(Notice::Result {
            catalog: result.catalog_name.clone(),
            count: result.count,
        });
    }
}

#[derive(Clone, Default)]
pub struct RecordingPlayer {
    pub played: Rc<RefCell<Vec<PathBuf>>>,
}

impl SoundPlayer for RecordingPlayer {
    fn play(&mut self, clip: &Path) {
        self.played.borrow_mut().push(clip.to_path_buf());
    }
}
