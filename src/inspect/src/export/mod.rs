//! Export of a TSM file as line protocol.
//!
//! The output starts with a header naming the database and retention policy, followed by
//! one line per stored value:
//!
//! ```text
//! # DML
//! # CONTEXT-DATABASE:telegraf
//! # CONTEXT-RETENTION-POLICY:default
//! cpu,host=a usage_idle=98.5 1600000000000000000
//! ```

pub mod line;

use async_compression::tokio::write::GzipEncoder;
use common_base::escape;
use common_base::point::series_and_field_from_composite_key;
use influxdb_storage::mmap::MmapReadableFile;
use influxdb_tsdb::engine::tsm1::file_store::reader::tsm_reader::{DefaultTSMReader, TSMReader};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{info, warn};

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::export::line::append_values;

const OUTPUT_BUFFER_SIZE: usize = 1024 * 1024;

/// Counters of a finished export.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    /// keys whose values were written
    pub keys: usize,
    /// data lines written, the header excluded
    pub lines: usize,
    /// keys that could not be read or rendered
    pub skipped: usize,
}

pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// export writes the file named by the config to out through a 1 MiB buffer, gzipped
    /// when compression is enabled. The stream is finished and flushed before returning.
    pub async fn export<W>(&self, out: &mut W) -> Result<ExportStats, ExportError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        info!(path = %self.config.path, compress = self.config.compress, "exporting tsm file");

        let mut bw = BufWriter::with_capacity(OUTPUT_BUFFER_SIZE, out);
        let stats = if self.config.compress {
            let mut gz = GzipEncoder::new(&mut bw);
            let stats = self.write_tsm_file(&mut gz).await?;
            gz.shutdown().await?;
            stats
        } else {
            self.write_tsm_file(&mut bw).await?
        };
        bw.flush().await?;

        info!(
            keys = stats.keys,
            lines = stats.lines,
            skipped = stats.skipped,
            "export complete"
        );
        Ok(stats)
    }

    /// write_tsm_file writes the header and the values of the file. A file that opens but
    /// cannot be read as TSM yields the header alone.
    pub async fn write_tsm_file<W>(&self, w: &mut W) -> Result<ExportStats, ExportError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let path = &self.config.path;
        let file = MmapReadableFile::open(path)
            .await
            .map_err(|source| ExportError::Open {
                path: path.clone(),
                source,
            })?;

        self.write_header(w).await?;

        let reader = match DefaultTSMReader::new(file).await {
            Ok(reader) => reader,
            Err(e) => {
                warn!("unable to read {}, skipping: {}", path, e);
                return Ok(ExportStats::default());
            }
        };

        let stats = self.write_keys(&reader, w).await;
        if let Err(e) = reader.close().await {
            warn!("unable to close {}: {}", path, e);
        }
        stats
    }

    async fn write_header<W>(&self, w: &mut W) -> Result<(), ExportError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let header = format!(
            "# DML\n# CONTEXT-DATABASE:{}\n# CONTEXT-RETENTION-POLICY:{}\n",
            self.config.database, self.config.retention_policy
        );
        w.write_all(header.as_bytes()).await?;
        Ok(())
    }

    /// write_keys writes the keys at index 0 through limit. Keys that fail to read or
    /// render are logged and skipped, write errors end the export.
    pub async fn write_keys<R, W>(&self, reader: &R, w: &mut W) -> Result<ExportStats, ExportError>
    where
        R: TSMReader,
        W: AsyncWrite + Unpin + Send,
    {
        let path = &self.config.path;
        let mut stats = ExportStats::default();
        let mut buf = Vec::new();

        for i in 0..reader.key_count() {
            if i > self.config.limit {
                break;
            }
            let key = match reader.key_at(i) {
                Some((key, _)) => key,
                None => break,
            };

            let values = match reader.read_all(key).await {
                Ok(values) => values,
                Err(e) => {
                    warn!(
                        "unable to read key {:?} in {}, skipping: {}",
                        String::from_utf8_lossy(key),
                        path,
                        e
                    );
                    stats.skipped += 1;
                    continue;
                }
            };

            let (series, field) = series_and_field_from_composite_key(key);
            let field = escape::bytes(field);

            buf.clear();
            let n = match append_values(&mut buf, key, series, &field, &values) {
                Ok(n) => n,
                Err(e @ ExportError::UnsupportedBlockType { .. }) => {
                    warn!("{} in {}, skipping", e, path);
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            w.write_all(&buf).await?;
            stats.keys += 1;
            stats.lines += n;
        }

        Ok(stats)
    }
}

/// export writes the file named by config to standard output.
pub async fn export(config: ExportConfig) -> Result<ExportStats, ExportError> {
    let mut stdout = tokio::io::stdout();
    Exporter::new(config).export(&mut stdout).await
}
