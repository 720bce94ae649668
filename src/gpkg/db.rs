//! Read-only SQLite access for GeoPackage files.
//!
//! `rusqlite` handles the scoped-acquisition discipline: connections and
//! prepared statements are finalized on drop, on every exit path, including
//! an error unwinding mid-iteration.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, Row};

use crate::error::Error;

/// A GeoPackage database opened read-only.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the database at `path` read-only.
    ///
    /// Fails with [`Error::DatabaseOpen`] if the file is absent, cannot be
    /// opened, or does not hold a SQLite database.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        fn open_err(path: &Path, source: rusqlite::Error) -> Error {
            Error::DatabaseOpen {
                path: path.to_path_buf(),
                source,
            }
        }

        let conn =
            Connection::open_with_flags(path, flags).map_err(|e| open_err(path, e))?;

        // SQLite validates the file header lazily; force it now so that a
        // non-database file fails at open rather than at the first query.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(|e| open_err(path, e))?;

        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Text column with SQLite NULL mapped to the empty string.
pub(crate) fn text_or_empty(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

/// Blob column with SQLite NULL mapped to an empty byte vector.
pub(crate) fn blob_or_empty(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<u8>> {
    Ok(row.get::<_, Option<Vec<u8>>>(idx)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = Database::open(&dir.path().join("nope.gpkg")).unwrap_err();
        assert!(matches!(err, Error::DatabaseOpen { .. }));
    }

    #[test]
    fn open_non_sqlite_file_fails() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("garbage.gpkg");
        let mut file = std::fs::File::create(&path).expect("create file");
        file.write_all(b"this is not a sqlite database, not even close")
            .expect("write file");
        drop(file);

        let err = Database::open(&path).unwrap_err();
        assert!(matches!(err, Error::DatabaseOpen { .. }));
    }

    #[test]
    fn open_valid_database() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("valid.gpkg");
        let conn = Connection::open(&path).expect("create db");
        conn.execute_batch("CREATE TABLE t (x TEXT);")
            .expect("create table");
        drop(conn);

        let db = Database::open(&path).expect("open read-only");
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn null_columns_decode_to_empty() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch(
            "CREATE TABLE t (name TEXT, data BLOB);
             INSERT INTO t (name, data) VALUES (NULL, NULL);
             INSERT INTO t (name, data) VALUES ('abc', X'010203');",
        )
        .expect("seed db");

        let mut stmt = conn
            .prepare("SELECT name, data FROM t ORDER BY rowid")
            .expect("prepare");
        let mut rows = stmt.query([]).expect("query");

        let row = rows.next().expect("step").expect("first row");
        assert_eq!(text_or_empty(row, 0).expect("text"), "");
        assert_eq!(blob_or_empty(row, 1).expect("blob"), Vec::<u8>::new());

        let row = rows.next().expect("step").expect("second row");
        assert_eq!(text_or_empty(row, 0).expect("text"), "abc");
        assert_eq!(blob_or_empty(row, 1).expect("blob"), vec![1, 2, 3]);

        assert!(rows.next().expect("step").is_none());
    }
}
