//! Database families and dialects.
//!
//! Several products share one wire protocol (CockroachDB and YugabyteDB speak
//! the PostgreSQL protocol, TiDB and MariaDB speak MySQL's). The scheme of a
//! connection URL only names the protocol; the dialect is found by probing
//! the server version once the pool is up.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Known database families and dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
    MsSql,
    Oracle,
    Cockroach,
    Yugabyte,
    TiDb,
    MariaDb,
}

impl Dialect {
    /// Every known dialect.
    pub const ALL: [Dialect; 9] = [
        Self::Postgres,
        Self::MySql,
        Self::Sqlite,
        Self::MsSql,
        Self::Oracle,
        Self::Cockroach,
        Self::Yugabyte,
        Self::TiDb,
        Self::MariaDb,
    ];

    /// The tag reported to callers, e.g. `"cockroach"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::MsSql => "mssql",
            Self::Oracle => "oracle",
            Self::Cockroach => "cockroach",
            Self::Yugabyte => "yugabyte",
            Self::TiDb => "tidb",
            Self::MariaDb => "mariadb",
        }
    }

    /// Get the display name for this dialect.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Postgres => "PostgreSQL",
            Self::MySql => "MySQL",
            Self::Sqlite => "SQLite",
            Self::MsSql => "Microsoft SQL Server",
            Self::Oracle => "Oracle",
            Self::Cockroach => "CockroachDB",
            Self::Yugabyte => "YugabyteDB",
            Self::TiDb => "TiDB",
            Self::MariaDb => "MariaDB",
        }
    }

    /// The reference family whose wire protocol this dialect speaks.
    pub fn wire_protocol(&self) -> Dialect {
        match self {
            Self::Cockroach | Self::Yugabyte => Self::Postgres,
            Self::TiDb | Self::MariaDb => Self::MySql,
            other => *other,
        }
    }

    /// Detect a PostgreSQL-protocol dialect from `SELECT version()` output.
    ///
    /// Markers are matched case-sensitively: CockroachDB first, then
    /// YugabyteDB (`-YB-` in its version string), then plain PostgreSQL.
    pub fn detect_postgres(version: &str) -> Self {
        if version.contains("CockroachDB") {
            Self::Cockroach
        } else if version.contains("-YB-") {
            Self::Yugabyte
        } else {
            Self::Postgres
        }
    }

    /// Narrower PostgreSQL probe that only tells CockroachDB apart.
    pub fn detect_cockroach_only(version: &str) -> Self {
        if version.contains("CockroachDB") {
            Self::Cockroach
        } else {
            Self::Postgres
        }
    }

    /// Detect a MySQL-protocol dialect from `SELECT version()` output.
    ///
    /// TiDB reports e.g. `5.7.25-TiDB-v7.5.0`, MariaDB `10.11.6-MariaDB`.
    pub fn detect_mysql(version: &str) -> Self {
        if version.contains("TiDB") {
            Self::TiDb
        } else if version.contains("MariaDB") {
            Self::MariaDb
        } else {
            Self::MySql
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown dialect: {s}"))
    }
}
