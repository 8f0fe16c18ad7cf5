//src/resource.rs

use std::mem::MaybeUninit;
use std::time::Instant;

/// Scoped process-resource sampler: start it when a run begins, finish it
/// when the run ends, and pass the report out with the run's stats instead of
/// keeping any ambient global state.
pub struct ResourceMonitor {
    started: Instant,
    cpu_at_start: f64,
}

/// One scalar per collaborator interface: CPU seconds consumed during the
/// scope and the process peak RSS observed at its end.
#[derive(Debug, Clone)]
pub struct ResourceReport {
    pub wall_seconds: f64,
    pub cpu_seconds: f64,
    pub peak_rss_mb: f64,
}

impl ResourceMonitor {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            cpu_at_start: cpu_seconds(),
        }
    }

    pub fn finish(self) -> ResourceReport {
        ResourceReport {
            wall_seconds: self.started.elapsed().as_secs_f64(),
            cpu_seconds: cpu_seconds() - self.cpu_at_start,
            peak_rss_mb: peak_rss_mb(),
        }
    }
}

fn rusage_self() -> libc::rusage {
    let mut usage = MaybeUninit::<libc::rusage>::zeroed();
    // getrusage(RUSAGE_SELF) cannot fail with a valid pointer
    unsafe {
        libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr());
        usage.assume_init()
    }
}

fn timeval_seconds(tv: libc::timeval) -> f64 {
    tv.tv_sec as f64 + tv.tv_usec as f64 / 1e6
}

/// User + system CPU time of the whole process.
fn cpu_seconds() -> f64 {
    let usage = rusage_self();
    timeval_seconds(usage.ru_utime) + timeval_seconds(usage.ru_stime)
}

/// Peak resident set size. `ru_maxrss` is kilobytes on Linux, bytes on macOS.
fn peak_rss_mb() -> f64 {
    let usage = rusage_self();
    if cfg!(target_os = "macos") {
        usage.ru_maxrss as f64 / (1024.0 * 1024.0)
    } else {
        usage.ru_maxrss as f64 / 1024.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_is_monotone_and_positive() {
        let monitor = ResourceMonitor::start();
        // burn a little CPU so the counters move
        let mut acc = 0u64;
        for i in 0..200_000u64 {
            acc = acc.wrapping_add(i * i);
        }
        assert!(acc > 0);
        let report = monitor.finish();
        assert!(report.wall_seconds >= 0.0);
        assert!(report.cpu_seconds >= 0.0);
        assert!(report.peak_rss_mb > 0.0);
    }
}
