/// Console implementations of the core's progress and title surfaces.
use comet_lib::progress::{ProgressSink, TitleHook};
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicU64, Ordering};

/// Prints download progress and child output to the terminal.
pub struct ConsoleSink {
    last_percent: AtomicU64,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            last_percent: AtomicU64::new(u64::MAX),
        }
    }
}

impl ProgressSink for ConsoleSink {
    fn task_started(&self, name: &str) {
        self.last_percent.store(u64::MAX, Ordering::Relaxed);
        println!("> {}", name);
    }

    fn bytes_transferred(&self, transferred: u64, total: Option<u64>) {
        // Only repaint on whole-percent changes to keep the terminal calm.
        if let Some(total) = total.filter(|t| *t > 0) {
            let percent = transferred * 100 / total;
            if self.last_percent.swap(percent, Ordering::Relaxed) != percent {
                print!("\r  {:>3}% ({} / {} bytes)", percent, transferred, total);
                let _ = std::io::stdout().flush();
            }
        }
    }

    fn task_finished(&self, _name: &str) {
        if self.last_percent.load(Ordering::Relaxed) != u64::MAX {
            println!();
        }
    }

    fn child_line(&self, line: &str) {
        println!("{}", line);
    }

    fn elapsed(&self, seconds: u64) {
        // Fire-and-forget display cell; kept out of stdout so it never
        // interleaves with streamed child output.
        log::trace!("Session time: {}s", seconds);
    }

    fn notice(&self, message: &str) {
        println!("{}", message);
    }

    fn await_acknowledgment(&self) {
        print!("Press Enter to continue...");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    }
}

/// Sets the terminal title through the standard OSC escape sequence.
pub struct ConsoleTitle;

impl TitleHook for ConsoleTitle {
    fn set_title(&self, title: &str) {
        print!("\x1b]0;{}\x07", title);
        let _ = std::io::stdout().flush();
    }

    fn reset_title(&self) {
        self.set_title(&format!("Comet ({})", env!("CARGO_PKG_VERSION")));
    }
}
