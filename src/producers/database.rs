//! Database dump commands
//!
//! Each engine's dump tool writes into a scratch directory; the dump is then
//! archived like any other entry.

use std::path::Path;
use std::process::Command;

use crate::config::{DatabaseKind, DbUser};

/// A dump command and the entry it leaves in the scratch directory
#[derive(Debug)]
pub struct DumpPlan {
    /// Name of the tool, for error messages
    pub tool: &'static str,
    /// Prepared command
    pub command: Command,
    /// File or directory name the dump is written to
    pub entry: &'static str,
}

/// Prepare the dump command for a database
pub fn dump_plan(kind: DatabaseKind, database: &str, user: &DbUser, work_dir: &Path) -> DumpPlan {
    let port = user.port.unwrap_or_else(|| kind.default_port()).to_string();

    match kind {
        DatabaseKind::Postgres => {
            let entry = "dump.tar";
            let mut cmd = Command::new("pg_dump");
            cmd.args(["-h", &user.host, "-p", &port, "-U", &user.user, "-F", "t", "-f"])
                .arg(work_dir.join(entry))
                .arg(database);
            if !user.password.is_empty() {
                cmd.env("PGPASSWORD", user.password.expose());
            }
            DumpPlan {
                tool: "pg_dump",
                command: cmd,
                entry,
            }
        }
        DatabaseKind::Mysql => {
            let entry = "dump.sql";
            let mut cmd = Command::new("mysqldump");
            cmd.args(["-h", &user.host, "-P", &port, "-u", &user.user])
                .arg("--result-file")
                .arg(work_dir.join(entry))
                .arg(database);
            if !user.password.is_empty() {
                cmd.env("MYSQL_PWD", user.password.expose());
            }
            DumpPlan {
                tool: "mysqldump",
                command: cmd,
                entry,
            }
        }
        DatabaseKind::Mongo => {
            let entry = "dump";
            let mut cmd = Command::new("mongodump");
            cmd.arg("--host")
                .arg(format!("{}:{}", user.host, port))
                .args(["--db", database])
                .arg("--out")
                .arg(work_dir.join(entry));
            if !user.user.is_empty() {
                cmd.args(["--username", &user.user]);
                if !user.password.is_empty() {
                    cmd.args(["--password", user.password.expose()]);
                }
            }
            DumpPlan {
                tool: "mongodump",
                command: cmd,
                entry,
            }
        }
    }
}
