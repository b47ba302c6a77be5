//! Built-in exporter adapter driven by the exporter's own config file.
//!
//! Metrics exporters keep their settings in `<base>/<executable>.conf`, with
//! the listen address under `[web]`. Query agents have no such file and
//! listen on no port.

use std::path::PathBuf;

use anyhow::Result;
use sysinfo::System;
use tracing::debug;

use ssm_common::{Domain, ExporterInfo, ServiceType};

use crate::application::ports::{ExporterInit, ExporterPlugin, LocalFs};
use crate::domain::ini::IniDocument;
use crate::domain::{ConfigurationError, Layout};

const WEB: &str = "web";
const LISTEN_ADDRESS: &str = "listen-address";
const SSL_KEY_FILE: &str = "ssl-key-file";
const SSL_CERT_FILE: &str = "ssl-cert-file";

/// Port of a `host:port` listen address. `None` unless the port is positive.
#[must_use]
pub fn listen_port(value: &str) -> Option<u16> {
    let (_, port) = value.rsplit_once(':')?;
    port.parse::<u16>().ok().filter(|p| *p > 0)
}

/// Facts about this host.
#[must_use]
pub fn host_info() -> ExporterInfo {
    ExporterInfo {
        distro: System::name().unwrap_or_default(),
        version: System::kernel_version().unwrap_or_default(),
        hostname: System::host_name().unwrap_or_default(),
        ..ExporterInfo::default()
    }
}

/// `ExporterPlugin` that edits the exporter's config file in place.
pub struct ConfigFileExporter<'a, F> {
    fs: &'a F,
    service_type: ServiceType,
    config_file: PathBuf,
    port: u16,
}

impl<'a, F: LocalFs> ConfigFileExporter<'a, F> {
    #[must_use]
    pub fn new(fs: &'a F, layout: &Layout, service_type: ServiceType) -> Self {
        Self {
            fs,
            service_type,
            config_file: layout.exporter_config(service_type.executable()),
            port: 0,
        }
    }

    /// Rewrite the listen address and TLS files; return the listen port.
    fn configure(&self, params: &ExporterInit<'_>) -> Result<u16> {
        let text = self.fs.read_to_string(&self.config_file)?;
        let mut doc = IniDocument::parse(&text);
        let current = doc.get(Some(WEB), LISTEN_ADDRESS).unwrap_or_default();
        let port = listen_port(current).ok_or_else(|| ConfigurationError::InvalidListenAddress {
            file: self.config_file.display().to_string(),
            value: current.to_string(),
        })?;

        doc.set(
            Some(WEB),
            LISTEN_ADDRESS,
            &format!("{}:{port}", params.bind_address),
        );
        if let Some(key) = params.tls_key_file {
            doc.set(Some(WEB), SSL_KEY_FILE, &key.display().to_string());
        }
        if let Some(cert) = params.tls_cert_file {
            doc.set(Some(WEB), SSL_CERT_FILE, &cert.display().to_string());
        }
        self.fs.write(&self.config_file, &doc.render())?;
        debug!(file = %self.config_file.display(), port, "exporter configured");
        Ok(port)
    }
}

impl<F: LocalFs> ExporterPlugin for ConfigFileExporter<'_, F> {
    async fn init(&mut self, params: &ExporterInit<'_>) -> Result<ExporterInfo> {
        if !self.service_type.is_queries() {
            self.port = self.configure(params)?;
        }
        Ok(host_info())
    }

    fn name(&self) -> Domain {
        self.service_type.domain
    }

    fn listen_port(&self) -> u16 {
        self.port
    }

    fn executable_name(&self) -> &str {
        self.service_type.executable()
    }

    fn extra_key_values(&self) -> Vec<(String, Vec<u8>)> {
        Vec::new()
    }

    fn cluster_name(&self) -> Option<String> {
        None
    }
}
