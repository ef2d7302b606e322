//! Chrome Trace ("flame style") profiling.
//!
//! Feature-gated with `--features profiling`.
//!
//! Usage:
//!   archetype_engine::profiling::profiler::init("profile/trace.json");
//!   {
//!     let _g = archetype_engine::profiling::profiler::span("Database::add_components");
//!     // mutate...
//!   }
//!   archetype_engine::profiling::profiler::shutdown();

#[cfg(not(feature = "profiling"))]
use std::path::Path;

#[cfg(feature = "profiling")]
mod enabled {
    use std::fs::File;
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, OnceLock};
    use std::time::Instant;

    struct TraceEvent {
        name: &'static str,
        ts_us: u64,
        dur_us: u64,
    }

    struct ProfilerState {
        start: Instant,
        out_path: PathBuf,
        is_on: AtomicBool,
        events: Mutex<Vec<TraceEvent>>,
    }

    static STATE: OnceLock<ProfilerState> = OnceLock::new();

    fn now_us(state: &ProfilerState) -> u64 {
        state.start.elapsed().as_micros() as u64
    }

    /// Initialize the profiler and set the output path.
    pub fn init<P: AsRef<Path>>(path: P) {
        let _ = STATE.set(ProfilerState {
            start: Instant::now(),
            out_path: path.as_ref().to_path_buf(),
            is_on: AtomicBool::new(true),
            events: Mutex::new(Vec::new()),
        });
    }

    /// Shut down the profiler and write the Chrome Trace JSON.
    pub fn shutdown() {
        if let Some(state) = STATE.get() {
            state.is_on.store(false, Ordering::Release);
            if let Err(error) = write_trace_file(state) {
                eprintln!("profiler::shutdown failed to write trace: {error}");
            }
        }
    }

    fn write_trace_file(state: &ProfilerState) -> std::io::Result<()> {
        let events = {
            let mut guard = state.events.lock().unwrap();
            std::mem::take(&mut *guard)
        };

        if let Some(parent) = state.out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&state.out_path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "{{\"traceEvents\":[")?;
        let mut first = true;
        for event in events {
            if !first {
                write!(writer, ",")?;
            }
            first = false;
            write!(
                writer,
                "{{\"name\":\"{}\",\"cat\":\"engine\",\"ph\":\"X\",\"ts\":{},\"dur\":{},\"pid\":1,\"tid\":1}}",
                event.name, event.ts_us, event.dur_us
            )?;
        }
        write!(writer, "]}}")?;
        writer.flush()
    }

    /// Records one complete event for the lifetime of the guard.
    pub struct SpanGuard {
        name: &'static str,
        begin_us: u64,
    }

    /// Open a span; the event is recorded when the guard drops.
    pub fn span(name: &'static str) -> SpanGuard {
        let begin_us = match STATE.get() {
            Some(state) if state.is_on.load(Ordering::Acquire) => now_us(state),
            _ => 0,
        };
        SpanGuard { name, begin_us }
    }

    impl Drop for SpanGuard {
        fn drop(&mut self) {
            let Some(state) = STATE.get() else { return };
            if !state.is_on.load(Ordering::Acquire) {
                return;
            }
            let end_us = now_us(state);
            if let Ok(mut events) = state.events.lock() {
                events.push(TraceEvent {
                    name: self.name,
                    ts_us: self.begin_us,
                    dur_us: end_us.saturating_sub(self.begin_us),
                });
            }
        }
    }
}

#[cfg(feature = "profiling")]
pub use enabled::{init, shutdown, span, SpanGuard};

/// Span guard; records nothing when profiling is disabled.
#[cfg(not(feature = "profiling"))]
pub struct SpanGuard;

/// No-op when profiling is disabled.
#[cfg(not(feature = "profiling"))]
#[inline]
pub fn init<P: AsRef<Path>>(_path: P) {}

/// No-op when profiling is disabled.
#[cfg(not(feature = "profiling"))]
#[inline]
pub fn shutdown() {}

/// No-op when profiling is disabled.
#[cfg(not(feature = "profiling"))]
#[inline]
pub fn span(_name: &'static str) -> SpanGuard {
    SpanGuard
}
