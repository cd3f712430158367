//! Tracing setup for the binary.
//!
//! Logs go to stderr. Stdout is reserved for the JSON lines the walker emits
//! when no output file is given, so the two streams never interleave.

use std::io::{self, IsTerminal};

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::util::SubscriberInitExt;

/// Build the formatting subscriber used by the binary.
///
/// # Arguments
///
/// * `filter` - Which spans and events to keep
/// * `writer` - Where formatted lines are written
/// * `ansi` - Whether to colour the output
///
/// # Returns
///
/// A subscriber ready to be installed globally or scoped with
/// [`tracing::subscriber::with_default`].
pub fn subscriber<W>(filter: EnvFilter, writer: W, ansi: bool) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339())
        .finish()
}

/// Install the global subscriber, writing to stderr.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Colour is only
/// used when stderr is a terminal.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = io::stderr().is_terminal();
    subscriber(filter, io::stderr, ansi).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::{debug, info};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'w> MakeWriter<'w> for Captured {
        type Writer = Captured;

        fn make_writer(&'w self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_events_go_to_the_given_writer_without_colour() {
        let captured = Captured::default();
        let subscriber = subscriber(EnvFilter::new("info"), captured.clone(), false);

        tracing::subscriber::with_default(subscriber, || {
            info!(emitted = 3, "Execution complete");
            debug!("filtered out");
        });

        let logged = captured.contents();
        assert!(logged.contains("INFO"));
        assert!(logged.contains("Execution complete"));
        assert!(logged.contains("emitted=3"));
        assert!(!logged.contains("filtered out"));
        assert!(!logged.contains('\u{1b}'));
    }
}
