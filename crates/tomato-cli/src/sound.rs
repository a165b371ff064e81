//! Phase-boundary sound playback.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, Sink};

/// Start playing `path` on a background thread.
///
/// The file is opened and decoded before returning, so `false` means it is
/// missing or not a supported audio format and the caller should fall back
/// to the terminal bell. Output device errors are only logged.
pub fn play(path: &Path) -> bool {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "cannot open sound file");
            return false;
        }
    };
    let source = match Decoder::new(BufReader::new(file)) {
        Ok(source) => source,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "cannot decode sound file");
            return false;
        }
    };

    std::thread::spawn(move || {
        let Ok((_stream, stream_handle)) = OutputStream::try_default() else {
            tracing::warn!("no audio output device");
            return;
        };
        let Ok(sink) = Sink::try_new(&stream_handle) else {
            tracing::warn!("cannot open audio sink");
            return;
        };
        sink.append(source);
        sink.sleep_until_end();
    });
    true
}
