//! Report sinks for periodic telemetry snapshots
//!
//! The report format is a presentation concern; the world only decides when
//! a snapshot is due and hands it to a [`ReportSink`].

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use super::telemetry::Telemetry;

/// Receives telemetry snapshots from [`SimWorld::run`][crate::simulation::SimWorld::run].
///
/// Only `report` is required; the tick and end callbacks default to no-ops.
pub trait ReportSink {
    /// Called with a snapshot at every report interval and once at the end
    fn report(&mut self, telemetry: &Telemetry) -> Result<()>;

    /// Called after every tick
    fn on_tick(&mut self, _telemetry: &Telemetry) {}

    /// Called once after the final report
    fn on_sim_end(&mut self, _telemetry: &Telemetry) {}
}

/// A sink that discards everything
pub struct NoopReport;

impl ReportSink for NoopReport {
    fn report(&mut self, _telemetry: &Telemetry) -> Result<()> {
        Ok(())
    }
}

/// Logs each report at info level
pub struct LogReport;

impl ReportSink for LogReport {
    fn report(&mut self, telemetry: &Telemetry) -> Result<()> {
        info!("Report at {}s:\n{}", telemetry.elapsed, telemetry);
        Ok(())
    }
}

/// Appends each report to a text file
pub struct TextFileReport {
    path: PathBuf,
    file: File,
}

impl TextFileReport {
    /// Open (or create) `path` for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open report file {}", path.display()))?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for TextFileReport {
    fn report(&mut self, telemetry: &Telemetry) -> Result<()> {
        writeln!(self.file, "{}", telemetry)
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        self.file.flush().context("Failed to flush report file")
    }
}

/// Collects every report in memory
#[derive(Default)]
pub struct MemoryReport {
    pub reports: Vec<Telemetry>,
}

impl ReportSink for MemoryReport {
    fn report(&mut self, telemetry: &Telemetry) -> Result<()> {
        self.reports.push(telemetry.clone());
        Ok(())
    }
}
