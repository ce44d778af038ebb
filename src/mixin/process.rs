//! Mixin subprocess runner.
//!
//! Runs `<command> <action> --runtime` with the step envelope on stdin,
//! streams stdout/stderr line by line through the redacting console and fails
//! on a non-zero exit.

use super::{CommandOptions, MixinError, MixinRunner};
use crate::config::{Config, MixinSettings};
use crate::console::Console;
use crate::manifest::ProducedOutputs;
use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::debug;

/// Runs installed mixins as child processes.
#[derive(Debug, Clone)]
pub struct ProcessMixinRunner {
    mixins_dir: PathBuf,
    settings: BTreeMap<String, MixinSettings>,
}

impl ProcessMixinRunner {
    pub fn new(mixins_dir: impl Into<PathBuf>) -> Self {
        Self {
            mixins_dir: mixins_dir.into(),
            settings: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            mixins_dir: config.resolved_mixins_dir(),
            settings: config.mixins.clone(),
        }
    }

    /// Program and leading arguments for `mixin`.
    ///
    /// A configured command override is parsed with shell-words; otherwise the
    /// mixin binary is `<mixins_dir>/<name>/<name>`.
    fn command_for(&self, mixin: &str) -> Result<Vec<String>, MixinError> {
        let command = self.settings.get(mixin).and_then(|s| s.command.as_deref());

        let Some(command) = command else {
            let binary = self.mixins_dir.join(mixin).join(mixin);
            return Ok(vec![binary.to_string_lossy().to_string()]);
        };

        let args = shell_words::split(command).map_err(|e| MixinError::Command {
            mixin: mixin.to_string(),
            message: format!("failed to parse '{}': {}", command, e),
        })?;
        if args.is_empty() {
            return Err(MixinError::Command {
                mixin: mixin.to_string(),
                message: "command is empty after parsing".to_string(),
            });
        }
        Ok(args)
    }
}

impl MixinRunner for ProcessMixinRunner {
    fn run(
        &mut self,
        mixin: &str,
        options: &CommandOptions,
        console: &mut Console,
    ) -> Result<ProducedOutputs, MixinError> {
        let args = self.command_for(mixin)?;
        let program = &args[0];

        let mut command = Command::new(program);
        command
            .args(&args[1..])
            .arg(&options.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if options.runtime {
            command.arg("--runtime");
        }
        if let Some(settings) = self.settings.get(mixin) {
            for (key, value) in &settings.environment {
                command.env(key, value);
            }
        }

        let start_time = Instant::now();
        let mut child = command.spawn().map_err(|e| MixinError::Spawn {
            program: program.clone(),
            message: e.to_string(),
        })?;

        // Feed stdin from a separate thread so a mixin that writes before it
        // finishes reading cannot deadlock on a full pipe.
        let stdin = child.stdin.take();
        let input = options.input.clone();
        let writer = thread::spawn(move || -> io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input.as_bytes())?;
            }
            Ok(())
        });

        let (sender, receiver) = mpsc::channel();
        let readers = [
            forward_lines(child.stdout.take(), Stream::Out, sender.clone()),
            forward_lines(child.stderr.take(), Stream::Err, sender),
        ];

        // Lines arrive as the mixin prints them; each is redacted whole.
        for (stream, line) in receiver {
            match stream {
                Stream::Out => console.write_out(&line),
                Stream::Err => console.write_err(&line),
            }
        }

        let read_results: Vec<_> = readers.into_iter().map(JoinHandle::join).collect();
        let status = child.wait().map_err(|e| MixinError::Io(e.to_string()))?;
        for result in read_results {
            result
                .map_err(|_| MixinError::Io("output reader panicked".to_string()))?
                .map_err(|e| MixinError::Io(e.to_string()))?;
        }
        let stdin_result = writer
            .join()
            .map_err(|_| MixinError::Io("stdin writer panicked".to_string()))?;

        debug!(
            mixin,
            exit_code = ?status.code(),
            duration_ms = start_time.elapsed().as_millis() as u64,
            "mixin finished"
        );

        if !status.success() {
            return Err(MixinError::Exit {
                code: status.code(),
            });
        }
        // A mixin may legitimately exit without reading its input.
        if let Err(e) = stdin_result
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            return Err(MixinError::Io(e.to_string()));
        }

        Ok(ProducedOutputs::new())
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Out,
    Err,
}

/// Read `pipe` line by line on a background thread, sending each line
/// (newline included) tagged with its stream.
fn forward_lines<R: Read + Send + 'static>(
    pipe: Option<R>,
    stream: Stream,
    sender: Sender<(Stream, Vec<u8>)>,
) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || {
        let Some(pipe) = pipe else {
            return Ok(());
        };
        let mut reader = BufReader::new(pipe);
        loop {
            let mut line = Vec::new();
            if reader.read_until(b'\n', &mut line)? == 0 {
                return Ok(());
            }
            if sender.send((stream, line)).is_err() {
                return Ok(());
            }
        }
    })
}
