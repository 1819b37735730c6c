//! Output sinks: where a channel-tagged output token actually goes.
//! The `Sink` trait is the seam; `StandardSink` is the default
//! emoji-tagged formatting, kept out of the evaluator proper so it can
//! be swapped per thread.

use crate::interpreter::Channel;

/// `Send + Sync` so a sink can be installed per-thread (see
/// `crate::builtins::set_sink_storage`) and handed to a spawned
/// process's thread (`crate::process`).
pub trait Sink: Send + Sync {
    fn emit(&self, channel: Channel, text: &str);
}

/// Prefixes every line with a small emoji tag and routes `Warn`/`Error`
/// to stderr, everything else to stdout — the REPL and file-mode default.
pub struct StandardSink;

impl StandardSink {
    fn tag(channel: Channel) -> &'static str {
        match channel {
            Channel::Stdout => "🆗",
            Channel::Info => "🌈",
            Channel::Warn => "⚡",
            Channel::Error => "💩",
            Channel::Debug => "🔍",
        }
    }
}

impl Sink for StandardSink {
    fn emit(&self, channel: Channel, text: &str) {
        let line = format!("{} {}", Self::tag(channel), text);
        match channel {
            Channel::Warn | Channel::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}

/// Drops everything but `Error` — used for spawned processes, so a
/// child's ordinary output never interleaves with the parent's REPL.
pub struct SilentSink;

impl Sink for SilentSink {
    fn emit(&self, channel: Channel, text: &str) {
        if channel == Channel::Error {
            eprintln!("{}", text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_sink_tags_every_channel() {
        for channel in [
            Channel::Stdout,
            Channel::Info,
            Channel::Warn,
            Channel::Error,
            Channel::Debug,
        ] {
            assert!(!StandardSink::tag(channel).is_empty());
        }
    }
}
