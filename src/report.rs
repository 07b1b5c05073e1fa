//! Text report written to stdout: `#`-prefixed header and footer lines
//! around one tab-separated line per list size.

use std::io::{self, Write};

use chrono::Local;

use crate::bench::{BenchConfig, SizeReport};
use crate::list::Node;

const TIMESTAMP_FORMAT: &str = "%FT%H:%M:%S%z";

/// Local time in ISO-8601 form with a numeric offset, e.g.
/// `2024-03-01T12:00:00+0100`.
#[must_use]
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Name of this host, or `"unknown"` when it cannot be read.
#[must_use]
pub fn hostname() -> String {
    os_hostname().unwrap_or_else(|| "unknown".to_string())
}

#[cfg(unix)]
fn os_hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // Safety: buf is valid for writes of buf.len() bytes.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return None;
    }
    // Truncated names may lack the terminator.
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..len]).into_owned();
    (!name.is_empty()).then_some(name)
}

#[cfg(not(unix))]
fn os_hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok().filter(|name| !name.is_empty())
}

/// Write the run header.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn write_header<W: Write>(
    out: &mut W,
    config: &BenchConfig,
    started: &str,
    host: &str,
) -> io::Result<()> {
    writeln!(out, "# {started} on {host}")?;
    writeln!(
        out,
        "# Start at {} nodes, end before {} nodes, increment {}",
        config.begin, config.until, config.increment
    )?;
    writeln!(
        out,
        "# {} allocation, {} data values",
        config.mode.describe(),
        config.shape.describe()
    )?;
    if config.reuse_list {
        writeln!(out, "# one list per size, re-randomized between trials")?;
    }
    writeln!(out, "# nodes {} bytes in size", size_of::<Node>())
}

/// Write one `nodes\tavg\tmin\tmax` line, times in seconds, and flush it.
///
/// # Errors
///
/// Propagates write errors from `out`.
pub fn write_size_line<W: Write>(out: &mut W, report: &SizeReport) -> io::Result<()> {
    writeln!(
        out,
        "{}\t{:.4}\t{:.4}\t{:.4}",
        report.nodes,
        report.times.average().as_secs_f64(),
        report.times.min.as_secs_f64(),
        report.times.max.as_secs_f64()
    )?;
    out.flush()
}

/// # Errors
///
/// Propagates write errors from `out`.
pub fn write_footer<W: Write>(out: &mut W, ended: &str, host: &str) -> io::Result<()> {
    writeln!(out, "# ending at {ended} on {host}")?;
    out.flush()
}
