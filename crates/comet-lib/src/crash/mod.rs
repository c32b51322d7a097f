/// Crash detection over captured child-process output.
///
/// Detection is a plain substring scan for a fixed marker; categorization is
/// an ordered, first-match-wins rule table. Extend by appending rules.
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Literal substring a crashed run always prints.
pub const CRASH_MARKER: &str = "Game crashed!";

/// Failure category assigned from the captured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashCategory {
    HeapExhausted,
    MetaspaceExhausted,
    GcOverhead,
    MissingClass,
    ClassVersionMismatch,
    ModCrash,
    TickingEntity,
    CorruptedWorld,
    PixelFormat,
    OpenGl,
    Unknown,
}

impl CrashCategory {
    /// Human-readable reason shown to the user.
    pub fn reason(&self) -> &'static str {
        match self {
            CrashCategory::HeapExhausted => "it has too little heap memory",
            CrashCategory::MetaspaceExhausted => "it ran out of memory for loading classes",
            CrashCategory::GcOverhead => {
                "the garbage collector is spending too much time collecting garbage"
            }
            CrashCategory::MissingClass => "some required classes or libraries are missing",
            CrashCategory::ClassVersionMismatch => {
                "it was compiled with a different Java version"
            }
            CrashCategory::ModCrash => "a mod caused a crash",
            CrashCategory::TickingEntity => {
                "an entity is causing issues (often a mod-related problem)"
            }
            CrashCategory::CorruptedWorld => "your world data might be corrupted",
            CrashCategory::PixelFormat => {
                "there might be an issue with your graphics card or drivers"
            }
            CrashCategory::OpenGl => "an OpenGL error occurred, often graphics driver related",
            CrashCategory::Unknown => "of an unknown reason, please attach the full log file",
        }
    }
}

/// Ordered substring -> category rules. Order matters: the first hit wins.
const RULES: &[(&str, CrashCategory)] = &[
    // Memory
    (
        "java.lang.OutOfMemoryError: Java heap space",
        CrashCategory::HeapExhausted,
    ),
    (
        "java.lang.OutOfMemoryError: Metaspace",
        CrashCategory::MetaspaceExhausted,
    ),
    (
        "java.lang.OutOfMemoryError: GC overhead limit exceeded",
        CrashCategory::GcOverhead,
    ),
    // Classes and libraries
    ("java.lang.NoClassDefFoundError", CrashCategory::MissingClass),
    (
        "java.lang.UnsupportedClassVersionError",
        CrashCategory::ClassVersionMismatch,
    ),
    // Mods
    ("LoaderExceptionModCrash", CrashCategory::ModCrash),
    (" ticking entity", CrashCategory::TickingEntity),
    // World state
    ("Failed to load level", CrashCategory::CorruptedWorld),
    // Graphics
    ("Pixel format not accelerated", CrashCategory::PixelFormat),
    ("OpenGL error", CrashCategory::OpenGl),
];

/// The outcome of classifying one run's output.
#[derive(Debug)]
pub struct CrashVerdict {
    pub category: CrashCategory,
    /// Report file written for this crash.
    pub report_path: PathBuf,
}

/// Scans captured output for the crash marker and writes crash reports.
pub struct LogClassifier {
    reports_dir: PathBuf,
}

impl LogClassifier {
    /// `reports_dir` is conventionally the `crash_logs` sibling of the cache
    /// root; it is created on first report.
    pub fn new(reports_dir: PathBuf) -> Self {
        Self { reports_dir }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Classify one run's full output. Returns `None` when no crash marker
    /// is present; otherwise writes a report file and assigns a category.
    pub fn classify(&self, full_text: &str, target_name: &str) -> Result<Option<CrashVerdict>> {
        log::debug!("Checking log");

        if !full_text.contains(CRASH_MARKER) {
            log::debug!("No crashes detected, all good!");
            return Ok(None);
        }

        log::error!("Game crashed!");
        let report_path = self.write_report(full_text, target_name)?;

        let category = RULES
            .iter()
            .find(|(needle, _)| full_text.contains(needle))
            .map(|(_, category)| *category)
            .unwrap_or(CrashCategory::Unknown);

        log::info!("Game crashed because {}", category.reason());
        Ok(Some(CrashVerdict {
            category,
            report_path,
        }))
    }

    /// Write the full captured text to a per-crash report file, named by
    /// target and second-resolution timestamp.
    fn write_report(&self, full_text: &str, target_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.reports_dir)
            .with_context(|| format!("Failed to create reports dir {:?}", self.reports_dir))?;

        let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = self
            .reports_dir
            .join(format!("{}_{}.txt", sanitize(target_name), stamp));

        fs::write(&path, full_text)
            .with_context(|| format!("Failed to write crash report {:?}", path))?;

        log::info!("Crash report saved to {:?}", path);
        Ok(path)
    }
}

/// Target names come from the catalog and may carry decorations that are
/// not valid in filenames.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
