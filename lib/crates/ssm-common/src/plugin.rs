/// Monitored domain names, as they appear in service types and unit names.
pub mod names {
    pub const LINUX: &str = "linux";
    pub const MYSQL: &str = "mysql";
    pub const MONGODB: &str = "mongodb";
    pub const POSTGRESQL: &str = "postgresql";
    pub const PROXYSQL: &str = "proxysql";
}

/// Exporter executables shipped under the SSM base directory.
///
/// Each exporter keeps its configuration in `<base>/<executable>.conf`.
pub mod exporters {
    pub const NODE: &str = "node_exporter";
    pub const MYSQLD: &str = "mysqld_exporter";
    pub const MONGODB: &str = "mongodb_exporter";
    pub const POSTGRES: &str = "postgres_exporter";
    pub const PROXYSQL: &str = "proxysql_exporter";
    pub const QAN_AGENT: &str = "qan-agent";

    /// Every exporter with a migratable config file, in migration order.
    pub const ALL: [&str; 5] = [NODE, MYSQLD, MONGODB, POSTGRES, PROXYSQL];
}

/// Capability names.
pub mod capabilities {
    pub const METRICS: &str = "metrics";
    pub const QUERIES: &str = "queries";
}

/// Registry tag prefixes.
pub mod tags {
    pub const ALIAS: &str = "alias_";
    pub const SCHEME_HTTP: &str = "scheme_http";
    pub const SCHEME_HTTPS: &str = "scheme_https";
    pub const DISTRO: &str = "distro_";
    pub const VERSION: &str = "version_";
    pub const CLUSTER: &str = "cluster_";
}
