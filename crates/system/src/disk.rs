use diskicon_core::{Error, MetricSource, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Physical-disk activity read from the kernel's `/proc/diskstats` interface.
///
/// Each device line carries an `io_ticks` counter: total milliseconds the
/// device spent with I/O in flight. Sampling twice and dividing the counter
/// delta by the elapsed wall time gives the fraction of time the disk was
/// busy. The reported value is the busiest whole disk's percentage, so one
/// saturated drive reads as 100% even on multi-disk machines.
pub struct DiskActivity {
    path: PathBuf,
    /// `io_ticks` (ms) per device at the previous read.
    last: HashMap<String, u64>,
    read_at: Instant,
}

const DISKSTATS: &str = "/proc/diskstats";

impl DiskActivity {
    /// Open the counter source and seed baseline readings.
    ///
    /// Fails if `/proc/diskstats` cannot be read — callers treat that as a
    /// fatal startup condition.
    pub fn open() -> Result<Self> {
        Self::open_at(DISKSTATS)
    }

    fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let last = read_io_ticks(&path)?;
        if last.is_empty() {
            tracing::warn!(
                "No physical disks found in '{}'; activity will read 0%",
                path.display()
            );
        }
        Ok(Self {
            path,
            last,
            read_at: Instant::now(),
        })
    }
}

impl MetricSource for DiskActivity {
    /// Busy-time percentage of the busiest disk since the previous call.
    fn sample(&mut self) -> Result<f32> {
        let now = Instant::now();
        let current = read_io_ticks(&self.path)?;
        let elapsed_ms = now.duration_since(self.read_at).as_millis() as u64;

        let percent = busiest_percent(&self.last, &current, elapsed_ms);

        self.last = current;
        self.read_at = now;
        Ok(percent)
    }
}

/// Parse the `io_ticks` column for every whole physical disk in the file.
fn read_io_ticks(path: &Path) -> Result<HashMap<String, u64>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Metric(format!("cannot read '{}': {e}", path.display())))?;

    Ok(raw
        .lines()
        .filter_map(parse_line)
        .filter(|(name, _)| is_physical_disk(name))
        .collect())
}

/// Extract `(device name, io_ticks ms)` from one `/proc/diskstats` line.
///
/// Layout: `major minor name` followed by the I/O counters; `io_ticks` is
/// the tenth counter. Malformed lines are skipped.
fn parse_line(line: &str) -> Option<(String, u64)> {
    let mut fields = line.split_whitespace();
    let _major = fields.next()?;
    let _minor = fields.next()?;
    let name = fields.next()?.to_string();
    let io_ticks = fields.nth(9)?.parse().ok()?;
    Some((name, io_ticks))
}

/// Whole physical disks only — partitions and virtual devices are excluded
/// so a busy loop device or ramdisk doesn't show up as disk activity.
fn is_physical_disk(name: &str) -> bool {
    const VIRTUAL: [&str; 7] = ["loop", "ram", "zram", "sr", "fd", "dm-", "md"];
    if VIRTUAL.iter().any(|p| name.starts_with(p)) {
        return false;
    }
    // nvme0n1 / mmcblk0 are disks; a 'p' suffix marks a partition.
    if let Some(rest) = name.strip_prefix("nvme") {
        return !rest.is_empty() && !rest.contains('p');
    }
    if let Some(rest) = name.strip_prefix("mmcblk") {
        return !rest.is_empty() && !rest.contains('p');
    }
    // sda is a disk, sda1 a partition.
    for prefix in ["xvd", "sd", "hd", "vd"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            return !rest.is_empty() && rest.chars().all(|c| c.is_ascii_lowercase());
        }
    }
    false
}

/// Busiest device's busy-time percentage across two counter snapshots.
///
/// Devices that appear or vanish between reads (hotplug) are ignored for
/// this interval. Counter wrap shows up as a huge delta; the clamp keeps
/// the result inside `0..=100`.
fn busiest_percent(
    previous: &HashMap<String, u64>,
    current: &HashMap<String, u64>,
    elapsed_ms: u64,
) -> f32 {
    if elapsed_ms == 0 {
        return 0.0;
    }

    current
        .iter()
        .filter_map(|(name, ticks)| {
            let prev = previous.get(name)?;
            Some(ticks.saturating_sub(*prev))
        })
        .map(|delta| (delta as f32 / elapsed_ms as f32 * 100.0).clamp(0.0, 100.0))
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
   8       0 sda 98580 23621 4167604 17527 205701 88034 5645346 437838 0 89880 455366 0 0 0 0
   8       1 sda1 98300 23621 4160000 17500 205000 88000 5640000 437000 0 89000 454000 0 0 0 0
 259       0 nvme0n1 1000 0 8000 100 2000 0 16000 200 0 1500 300 0 0 0 0
 259       1 nvme0n1p1 900 0 7000 90 1800 0 15000 180 0 1400 270 0 0 0 0
   7       0 loop0 50 0 400 5 0 0 0 0 0 40 5 0 0 0 0";

    fn ticks_of(raw: &str) -> HashMap<String, u64> {
        raw.lines()
            .filter_map(parse_line)
            .filter(|(name, _)| is_physical_disk(name))
            .collect()
    }

    #[test]
    fn parses_io_ticks_column() {
        let (name, ticks) = parse_line(SAMPLE.lines().next().unwrap()).unwrap();
        assert_eq!(name, "sda");
        assert_eq!(ticks, 89880);
    }

    #[test]
    fn skips_malformed_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("8 0 sda 1 2 3"), None);
    }

    #[test]
    fn filters_partitions_and_virtual_devices() {
        let ticks = ticks_of(SAMPLE);
        assert_eq!(ticks.len(), 2);
        assert!(ticks.contains_key("sda"));
        assert!(ticks.contains_key("nvme0n1"));
    }

    #[test]
    fn disk_name_filter() {
        for disk in ["sda", "sdz", "hdb", "vda", "xvdc", "nvme1n1", "mmcblk0"] {
            assert!(is_physical_disk(disk), "{disk} should count as a disk");
        }
        for other in [
            "sda2", "nvme0n1p3", "mmcblk0p1", "loop7", "ram0", "zram0", "sr0", "dm-1", "md127",
            "sd", "nvme",
        ] {
            assert!(!is_physical_disk(other), "{other} should be excluded");
        }
    }

    #[test]
    fn busiest_device_wins() {
        let prev = HashMap::from([("sda".into(), 1_000), ("sdb".into(), 1_000)]);
        let cur = HashMap::from([("sda".into(), 1_100), ("sdb".into(), 1_900)]);
        // sda busy 10%, sdb busy 90% over a 1s interval.
        assert_eq!(busiest_percent(&prev, &cur, 1_000), 90.0);
    }

    #[test]
    fn clamps_to_hundred_percent() {
        let prev = HashMap::from([("sda".into(), 0)]);
        let cur = HashMap::from([("sda".into(), 5_000)]);
        assert_eq!(busiest_percent(&prev, &cur, 1_000), 100.0);
    }

    #[test]
    fn zero_elapsed_reads_zero() {
        let prev = HashMap::from([("sda".into(), 0)]);
        let cur = HashMap::from([("sda".into(), 100)]);
        assert_eq!(busiest_percent(&prev, &cur, 0), 0.0);
    }

    #[test]
    fn counter_reset_does_not_underflow() {
        let prev = HashMap::from([("sda".into(), 9_999)]);
        let cur = HashMap::from([("sda".into(), 100)]);
        assert_eq!(busiest_percent(&prev, &cur, 1_000), 0.0);
    }

    #[test]
    fn hotplugged_device_is_ignored_for_one_interval() {
        let prev = HashMap::from([("sda".into(), 1_000)]);
        let cur = HashMap::from([("sda".into(), 1_200), ("sdb".into(), 50_000)]);
        assert_eq!(busiest_percent(&prev, &cur, 1_000), 20.0);
    }
}
