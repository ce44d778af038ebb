use crate::console::{Console, DEFAULT_MASK};
use crate::context::RuntimePaths;
use crate::manifest::ProducedOutputs;
use crate::mixin::{CommandOptions, MixinError, MixinRunner};
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// In-memory sink that stays readable after being boxed into a [`Console`].
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|poison| poison.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.0.lock().unwrap_or_else(|poison| poison.into_inner());
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Console writing into two buffers: (console, stdout, stderr).
pub(crate) fn test_console() -> (Console, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let console = Console::with_writers(Box::new(out.clone()), Box::new(err.clone()), DEFAULT_MASK);
    (console, out, err)
}

/// A bundle filesystem layout rooted in a temp dir, with a bundle.json.
pub(crate) fn create_test_layout() -> (TempDir, RuntimePaths) {
    create_test_layout_with_bundle(
        r#"{
  "name": "mysql",
  "version": "0.1.0",
  "images": {
    "db": {
      "image": "docker.io/library/mysql:8",
      "imageType": "docker",
      "contentDigest": "sha256:abc123"
    }
  },
  "invocationImages": []
}"#,
    )
}

pub(crate) fn create_test_layout_with_bundle(bundle_json: &str) -> (TempDir, RuntimePaths) {
    let temp_dir = TempDir::new().unwrap();
    let paths = RuntimePaths::rooted_at(temp_dir.path());
    std::fs::create_dir_all(paths.root.join("app")).unwrap();
    std::fs::write(&paths.bundle_file, bundle_json).unwrap();
    (temp_dir, paths)
}

/// What a [`FakeMixinRunner`] does on one call.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeStep {
    channel_files: Vec<(OsString, Vec<u8>)>,
    returned: ProducedOutputs,
    stdout: Option<String>,
    failure: Option<String>,
}

impl FakeStep {
    pub(crate) fn ok() -> Self {
        Self::default()
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Write `name` into the output channel, as an out-of-process mixin would.
    pub(crate) fn writes(mut self, name: &str, value: &str) -> Self {
        self.writes_raw(OsStr::new(name), value.as_bytes())
    }

    /// Write arbitrary bytes under an arbitrary file name into the channel.
    pub(crate) fn writes_raw(mut self, name: &OsStr, value: &[u8]) -> Self {
        self.channel_files.push((name.to_os_string(), value.to_vec()));
        self
    }

    /// Return `name` directly from `run`.
    pub(crate) fn returns(mut self, name: &str, value: &str) -> Self {
        self.returned.insert(name.to_string(), value.as_bytes().to_vec());
        self
    }

    pub(crate) fn prints(mut self, text: &str) -> Self {
        self.stdout = Some(text.to_string());
        self
    }
}

/// One recorded call to a [`FakeMixinRunner`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) mixin: String,
    pub(crate) options: CommandOptions,
}

pub(crate) type CallLog = Arc<Mutex<Vec<RecordedCall>>>;

/// Scripted mixin runner. Calls past the end of the script succeed silently.
#[derive(Debug)]
pub(crate) struct FakeMixinRunner {
    channel_dir: PathBuf,
    script: Vec<FakeStep>,
    calls: CallLog,
}

impl FakeMixinRunner {
    pub(crate) fn new(paths: &RuntimePaths, script: Vec<FakeStep>) -> (Self, CallLog) {
        let calls = CallLog::default();
        let runner = Self {
            channel_dir: paths.mixin_outputs_dir.clone(),
            script,
            calls: Arc::clone(&calls),
        };
        (runner, calls)
    }
}

impl MixinRunner for FakeMixinRunner {
    fn run(
        &mut self,
        mixin: &str,
        options: &CommandOptions,
        console: &mut Console,
    ) -> Result<ProducedOutputs, MixinError> {
        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(|poison| poison.into_inner());
            calls.push(RecordedCall {
                mixin: mixin.to_string(),
                options: options.clone(),
            });
            calls.len() - 1
        };
        let step = self.script.get(index).cloned().unwrap_or_default();

        if let Some(text) = &step.stdout {
            console.write_out(text.as_bytes());
        }
        for (name, value) in &step.channel_files {
            std::fs::write(self.channel_dir.join(name), value)
                .map_err(|e| MixinError::Io(e.to_string()))?;
        }
        if let Some(message) = step.failure {
            return Err(MixinError::Failed(message));
        }
        Ok(step.returned)
    }
}

pub(crate) fn recorded_calls(calls: &CallLog) -> Vec<RecordedCall> {
    calls
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
        .clone()
}
