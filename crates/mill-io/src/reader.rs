//! Instance file reader and writer.

use anyhow::{anyhow, bail, Context, Result};
use mill_core::Instance;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::SplitWhitespace;

/// How the facility rows of a file are split and clipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Fraction of the kept facilities that belong to the leader (rounded down)
    pub leader_share: f64,
    /// Keep only the first rows of the cost matrix
    pub facility_limit: Option<usize>,
    /// Keep only the first columns of the cost matrix
    pub client_limit: Option<usize>,
    /// Take the leader facility count from the third header value instead of
    /// `leader_share`
    pub leaders_from_header: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            leader_share: 0.5,
            facility_limit: None,
            client_limit: None,
            leaders_from_header: false,
        }
    }
}

impl ReadOptions {
    /// Clipping used for benchmark batches: 10 facilities, 30 clients.
    pub fn benchmark() -> Self {
        Self {
            leader_share: 0.5,
            facility_limit: Some(10),
            client_limit: Some(30),
            leaders_from_header: false,
        }
    }

    /// Split as written by [`write_instance`]: the header names the leader count.
    pub fn from_header() -> Self {
        Self {
            leaders_from_header: true,
            ..Self::default()
        }
    }

    pub fn with_leader_share(mut self, share: f64) -> Self {
        self.leader_share = share;
        self
    }

    pub fn with_facility_limit(mut self, limit: usize) -> Self {
        self.facility_limit = Some(limit);
        self
    }

    pub fn with_client_limit(mut self, limit: usize) -> Self {
        self.client_limit = Some(limit);
        self
    }
}

/// Integer tokens with their 1-based position for error messages.
struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
            position: 0,
        }
    }

    fn next_int(&mut self, what: &str) -> Result<i64> {
        self.position += 1;
        let token = self.inner.next().ok_or_else(|| {
            anyhow!("unexpected end of input at token {} ({})", self.position, what)
        })?;
        token.parse::<i64>().with_context(|| {
            format!(
                "token {} ({}) is not an integer: '{}'",
                self.position, what, token
            )
        })
    }

    fn next_count(&mut self, what: &str) -> Result<usize> {
        let value = self.next_int(what)?;
        usize::try_from(value).map_err(|_| anyhow!("{} must be non-negative, got {}", what, value))
    }

    fn skip(&mut self, count: usize, what: &str) -> Result<()> {
        for _ in 0..count {
            self.next_int(what)?;
        }
        Ok(())
    }
}

/// Parse instance text, applying the clipping and leader split in `options`.
///
/// The first `min(m, facility_limit)` rows are kept; the first
/// `floor(kept * leader_share)` of those go to the leader and the rest to the
/// follower. With `leaders_from_header` the third header value gives the
/// leader count instead, capped at the kept rows. Columns beyond
/// `client_limit` are read and discarded, as are the rows beyond the facility
/// limit. Tokens after the budgets are ignored.
pub fn parse_instance(text: &str, options: &ReadOptions) -> Result<Instance> {
    if !(0.0..=1.0).contains(&options.leader_share) {
        bail!(
            "leader share must lie in [0, 1], got {}",
            options.leader_share
        );
    }

    let mut tokens = Tokens::new(text);
    let facilities = tokens.next_count("facility count")?;
    let clients = tokens.next_count("client count")?;
    let header_leaders = tokens.next_int("leader count")?;

    let kept_facilities = options
        .facility_limit
        .map_or(facilities, |limit| limit.min(facilities));
    let kept_clients = options
        .client_limit
        .map_or(clients, |limit| limit.min(clients));
    let leaders = if options.leaders_from_header {
        usize::try_from(header_leaders)
            .map_err(|_| anyhow!("leader count must be non-negative, got {}", header_leaders))?
    } else {
        (kept_facilities as f64 * options.leader_share).floor() as usize
    };
    let leaders = leaders.min(kept_facilities);
    let clipped_rows = (facilities - kept_facilities)
        .checked_mul(clients)
        .ok_or_else(|| anyhow!("header {} x {} is too large", facilities, clients))?;

    // Header counts are untrusted; rows grow as tokens arrive.
    let mut rows = Vec::new();
    for _ in 0..kept_facilities {
        let row = (0..kept_clients)
            .map(|_| tokens.next_int("cost"))
            .collect::<Result<Vec<_>>>()?;
        tokens.skip(clients - kept_clients, "clipped cost")?;
        rows.push(row);
    }
    tokens.skip(clipped_rows, "clipped cost")?;

    let budgets = (0..kept_clients)
        .map(|_| tokens.next_int("budget"))
        .collect::<Result<Vec<_>>>()?;

    let costs_follower = rows.split_off(leaders);
    Instance::new(rows, costs_follower, budgets).context("invalid instance data")
}

/// Read and parse an instance file.
pub fn read_instance(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Instance> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading instance file: {}", path.display()))?;
    parse_instance(&text, options)
        .with_context(|| format!("parsing instance file: {}", path.display()))
}

/// Render an instance in the file format, leader rows first.
///
/// The third header value is the leader facility count; read the text back
/// with [`ReadOptions::from_header`] to keep the split.
pub fn render_instance(instance: &Instance) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} {}",
        instance.leader_facility_count() + instance.follower_facility_count(),
        instance.clients_count(),
        instance.leader_facility_count()
    );
    for row in instance
        .costs_leader()
        .iter()
        .chain(instance.costs_follower())
    {
        out.push_str(&join(row));
        out.push('\n');
    }
    out.push_str(&join(instance.budgets()));
    out.push('\n');
    out
}

fn join(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn write_instance(path: impl AsRef<Path>, instance: &Instance) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, render_instance(instance))
        .with_context(|| format!("writing instance file: {}", path.display()))
}
