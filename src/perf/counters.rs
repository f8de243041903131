//! Hardware performance counters via `perf_event_open(2)`
//!
//! Counters are opened disabled, user-space only, and inherited by threads created after
//! opening, so they must be opened before the worker pool is spawned. Events the CPU or
//! kernel refuses are skipped with a warning; an empty counter set is a valid result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use tracing::{debug, warn};

/// Counter namespace understood by the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Generic hardware event (`PERF_TYPE_HARDWARE`)
    Hardware,
    /// Generic cache event (`PERF_TYPE_HW_CACHE`)
    HwCache,
    /// Model-specific raw event code (`PERF_TYPE_RAW`)
    Raw,
}

impl EventKind {
    /// `perf_event_attr.type` value
    #[must_use]
    pub const fn type_id(self) -> u32 {
        match self {
            Self::Hardware => 0,
            Self::HwCache => 3,
            Self::Raw => 4,
        }
    }
}

/// One event to count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpec {
    /// Name used in readings and reports
    pub name: &'static str,
    /// Event namespace
    pub kind: EventKind,
    /// `perf_event_attr.config` value
    pub config: u64,
}

impl EventSpec {
    const fn new(name: &'static str, kind: EventKind, config: u64) -> Self {
        Self { name, kind, config }
    }
}

/// `cycles`
pub const CYCLES: &str = "cycles";
/// `instructions`
pub const INSTRUCTIONS: &str = "instructions";
/// Sum over cycles of outstanding L1D misses
pub const L1D_PEND_MISS: &str = "l1d_pend_miss.pending";
/// Cycles with at least one outstanding L1D miss
pub const L1D_PEND_MISS_CYCLES: &str = "l1d_pend_miss.pending_cycles";
/// L1D load misses
pub const L1D_LOAD_MISSES: &str = "L1-dcache-load-misses";
/// Last-level cache load misses
pub const LLC_LOAD_MISSES: &str = "LLC-load-misses";
/// Cycles stalled on the memory subsystem
pub const STALLS_MEM_ANY: &str = "cycle_activity.stalls_mem_any";
/// Retired loads
pub const ALL_LOADS: &str = "mem_inst_retired.all_loads";
/// Retired loads that missed L3
pub const L3_MISS_LOADS: &str = "mem_load_retired.l3_miss";
/// LLC misses including prefetches
pub const LONGEST_LAT_CACHE_MISS: &str = "longest_lat_cache.miss";

// Raw codes are Intel Cascade Lake encodings: umask << 8 | event, cmask in bits 24..32
const CMASK_SHIFT: u32 = 24;

/// Event table measured by the drivers
pub const DEFAULT_EVENTS: [EventSpec; 10] = [
    EventSpec::new(CYCLES, EventKind::Hardware, 0),
    EventSpec::new(INSTRUCTIONS, EventKind::Hardware, 1),
    EventSpec::new(L1D_PEND_MISS, EventKind::Raw, 0x0148),
    EventSpec::new(L1D_PEND_MISS_CYCLES, EventKind::Raw, 0x0148 | (1 << CMASK_SHIFT)),
    // cache id | op read << 8 | result miss << 16
    EventSpec::new(L1D_LOAD_MISSES, EventKind::HwCache, 1 << 16),
    EventSpec::new(LLC_LOAD_MISSES, EventKind::HwCache, 2 | (1 << 16)),
    EventSpec::new(STALLS_MEM_ANY, EventKind::Raw, 0x14a3 | (0x14 << CMASK_SHIFT)),
    EventSpec::new(ALL_LOADS, EventKind::Raw, 0x81d0),
    EventSpec::new(L3_MISS_LOADS, EventKind::Raw, 0x20d1),
    EventSpec::new(LONGEST_LAT_CACHE_MISS, EventKind::Raw, 0x412e),
];

/// Counter values by event name, in table order of names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterReadings(BTreeMap<String, u64>);

impl CounterReadings {
    /// Empty readings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value
    pub fn insert(&mut self, name: impl Into<String>, value: u64) {
        self.0.insert(name.into(), value);
    }

    /// Value of `name`, if that counter was read
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.0.get(name).copied()
    }

    /// Number of counters read
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no counter was read
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(name, value)` pairs sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for CounterReadings {
    fn from_iter<T: IntoIterator<Item = (S, u64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug)]
struct Counter {
    name: &'static str,
    file: File,
}

/// Set of open counters; closed on drop
#[derive(Debug, Default)]
pub struct PerfCounters {
    counters: Vec<Counter>,
}

impl PerfCounters {
    /// Open every event in `events`, skipping the ones that fail
    #[must_use]
    pub fn open(events: &[EventSpec]) -> Self {
        let mut counters = Vec::with_capacity(events.len());
        for spec in events {
            match sys::open(spec) {
                Ok(file) => counters.push(Counter {
                    name: spec.name,
                    file,
                }),
                Err(e) => warn!(event = spec.name, error = %e, "Failed to open perf event"),
            }
        }
        debug!(opened = counters.len(), requested = events.len(), "perf counters initialised");
        Self { counters }
    }

    /// Open the default event table
    #[must_use]
    pub fn open_default() -> Self {
        Self::open(&DEFAULT_EVENTS)
    }

    /// A set with no counters
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Number of open counters
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// True when no counter could be opened
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Names of the open counters
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.counters.iter().map(|c| c.name)
    }

    /// Reset and enable every counter
    pub fn start(&self) {
        for c in &self.counters {
            if let Err(e) = sys::reset(&c.file).and_then(|()| sys::enable(&c.file)) {
                warn!(event = c.name, error = %e, "Failed to start perf counter");
            }
        }
    }

    /// Disable every counter
    pub fn stop(&self) {
        for c in &self.counters {
            if let Err(e) = sys::disable(&c.file) {
                warn!(event = c.name, error = %e, "Failed to stop perf counter");
            }
        }
    }

    /// Current value of every counter that can be read
    #[must_use]
    pub fn read(&self) -> CounterReadings {
        let mut readings = CounterReadings::new();
        for c in &self.counters {
            match sys::read_value(&c.file) {
                Ok(value) => readings.insert(c.name, value),
                Err(e) => warn!(event = c.name, error = %e, "Failed to read perf counter"),
            }
        }
        readings
    }
}

#[cfg(target_os = "linux")]
mod sys {
    use super::EventSpec;
    use std::fs::File;
    use std::io::{self, Read};
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

    const FLAG_DISABLED: u64 = 1 << 0;
    const FLAG_INHERIT: u64 = 1 << 1;
    const FLAG_EXCLUDE_KERNEL: u64 = 1 << 5;
    const FLAG_EXCLUDE_HV: u64 = 1 << 6;

    const IOC_ENABLE: u64 = 0x2400;
    const IOC_DISABLE: u64 = 0x2401;
    const IOC_RESET: u64 = 0x2403;

    /// First published layout of `struct perf_event_attr` (`PERF_ATTR_SIZE_VER0`)
    #[repr(C)]
    #[derive(Debug, Default)]
    struct PerfEventAttr {
        kind: u32,
        size: u32,
        config: u64,
        sample_period: u64,
        sample_type: u64,
        read_format: u64,
        flags: u64,
        wakeup_events: u32,
        bp_type: u32,
        config1: u64,
    }

    pub(super) fn open(spec: &EventSpec) -> io::Result<File> {
        #[allow(clippy::cast_possible_truncation)] // 64 bytes
        let attr = PerfEventAttr {
            kind: spec.kind.type_id(),
            size: std::mem::size_of::<PerfEventAttr>() as u32,
            config: spec.config,
            flags: FLAG_DISABLED | FLAG_INHERIT | FLAG_EXCLUDE_KERNEL | FLAG_EXCLUDE_HV,
            ..PerfEventAttr::default()
        };

        // pid 0 = calling process, cpu -1 = any, no group, no flags
        let ret = unsafe {
            libc::syscall(
                libc::SYS_perf_event_open,
                std::ptr::addr_of!(attr),
                0 as libc::pid_t,
                -1 as libc::c_int,
                -1 as libc::c_int,
                0 as libc::c_ulong,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        let fd = RawFd::try_from(ret).map_err(|_| io::Error::other("fd out of range"))?;
        // SAFETY: the kernel just handed us this descriptor and nothing else owns it
        let owned = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(File::from(owned))
    }

    fn ioctl(file: &File, request: u64) -> io::Result<()> {
        #[allow(clippy::cast_possible_truncation)] // request codes fit every libc's type
        let ret = unsafe { libc::ioctl(file.as_raw_fd(), request as _, 0) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    pub(super) fn enable(file: &File) -> io::Result<()> {
        ioctl(file, IOC_ENABLE)
    }

    pub(super) fn disable(file: &File) -> io::Result<()> {
        ioctl(file, IOC_DISABLE)
    }

    pub(super) fn reset(file: &File) -> io::Result<()> {
        ioctl(file, IOC_RESET)
    }

    pub(super) fn read_value(mut file: &File) -> io::Result<u64> {
        let mut buf = [0_u8; 8];
        file.read_exact(&mut buf)?;
        Ok(u64::from_ne_bytes(buf))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_attr_matches_ver0_layout() {
            assert_eq!(std::mem::size_of::<PerfEventAttr>(), 64);
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    use super::EventSpec;
    use std::fs::File;
    use std::io;

    fn unsupported() -> io::Error {
        io::Error::new(io::ErrorKind::Unsupported, "perf events need Linux")
    }

    pub(super) fn open(_spec: &EventSpec) -> io::Result<File> {
        Err(unsupported())
    }

    pub(super) fn enable(_file: &File) -> io::Result<()> {
        Err(unsupported())
    }

    pub(super) fn disable(_file: &File) -> io::Result<()> {
        Err(unsupported())
    }

    pub(super) fn reset(_file: &File) -> io::Result<()> {
        Err(unsupported())
    }

    pub(super) fn read_value(_file: &File) -> io::Result<u64> {
        Err(unsupported())
    }
}
