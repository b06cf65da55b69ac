//! Simple profiling macros using thread-local storage
//!
//! Lightweight timing of the evaluation hot paths without changing function
//! signatures. Enable with environment variable: LIGHTCYCLE_PROFILE=1

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Instrumented sections of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Score,
    FloodFill,
    LongestPath,
    Territory,
}

impl Category {
    const COUNT: usize = 4;

    const ALL: [Category; Category::COUNT] = [
        Category::Score,
        Category::FloodFill,
        Category::LongestPath,
        Category::Territory,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            Category::Score => "Score (per candidate)",
            Category::FloodFill => "Flood Fill",
            Category::LongestPath => "Longest Safe Path",
            Category::Territory => "Territory Threat",
        }
    }
}

thread_local! {
    static LOCAL_TIME: RefCell<[u64; Category::COUNT]> = const { RefCell::new([0; Category::COUNT]) };
    static LOCAL_COUNT: RefCell<[usize; Category::COUNT]> = const { RefCell::new([0; Category::COUNT]) };
    static CACHE_LOOKUPS: RefCell<usize> = const { RefCell::new(0) };
    static CACHE_HITS: RefCell<usize> = const { RefCell::new(0) };
}

// Global aggregators
static GLOBAL_TIME: [AtomicU64; Category::COUNT] = [
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
];
static GLOBAL_COUNT: [AtomicUsize; Category::COUNT] = [
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
];
static GLOBAL_CACHE_LOOKUPS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_CACHE_HITS: AtomicUsize = AtomicUsize::new(0);

#[inline]
pub fn is_profiling_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("LIGHTCYCLE_PROFILE").is_ok())
}

pub struct ProfileGuard {
    start: Instant,
    category: Category,
}

impl ProfileGuard {
    pub fn new(category: Category) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;
        let slot = self.category.slot();
        LOCAL_TIME.with(|t| t.borrow_mut()[slot] += elapsed_ns);
        LOCAL_COUNT.with(|c| c.borrow_mut()[slot] += 1);
    }
}

#[inline]
pub fn record_cache_lookup(hit: bool) {
    if is_profiling_enabled() {
        CACHE_LOOKUPS.with(|c| *c.borrow_mut() += 1);
        if hit {
            CACHE_HITS.with(|c| *c.borrow_mut() += 1);
        }
    }
}

/// Folds the calling thread's counters into the global aggregators
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    LOCAL_TIME.with(|t| {
        for (global, local) in GLOBAL_TIME.iter().zip(t.borrow_mut().iter_mut()) {
            global.fetch_add(*local, Ordering::Relaxed);
            *local = 0;
        }
    });
    LOCAL_COUNT.with(|c| {
        for (global, local) in GLOBAL_COUNT.iter().zip(c.borrow_mut().iter_mut()) {
            global.fetch_add(*local, Ordering::Relaxed);
            *local = 0;
        }
    });
    CACHE_LOOKUPS.with(|c| {
        GLOBAL_CACHE_LOOKUPS.fetch_add(*c.borrow(), Ordering::Relaxed);
        *c.borrow_mut() = 0;
    });
    CACHE_HITS.with(|c| {
        GLOBAL_CACHE_HITS.fetch_add(*c.borrow(), Ordering::Relaxed);
        *c.borrow_mut() = 0;
    });
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    for category in Category::ALL {
        let time = GLOBAL_TIME[category.slot()].load(Ordering::Relaxed);
        let count = GLOBAL_COUNT[category.slot()].load(Ordering::Relaxed);
        let ms = time as f64 / 1_000_000.0;
        let pct = if total_ns > 0 { 100.0 * time as f64 / total_ns as f64 } else { 0.0 };
        let avg_us = if count > 0 { time as f64 / (count * 1000) as f64 } else { 0.0 };

        eprintln!("{}:", category.label());
        eprintln!("  Time:     {:.2}ms ({:.1}%)", ms, pct);
        eprintln!("  Calls:    {}", count);
        eprintln!("  Avg:      {:.2}µs/call\n", avg_us);
    }

    let lookups = GLOBAL_CACHE_LOOKUPS.load(Ordering::Relaxed);
    let hits = GLOBAL_CACHE_HITS.load(Ordering::Relaxed);
    let hit_rate = if lookups > 0 { 100.0 * hits as f64 / lookups as f64 } else { 0.0 };

    eprintln!("Flood Fill Cache:");
    eprintln!("  Lookups:    {}", lookups);
    eprintln!("  Hits:       {} ({:.1}%)\n", hits, hit_rate);

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}
