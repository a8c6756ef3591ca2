#![no_main]

use std::sync::OnceLock;

use lantern_config::TransportConfig;
use lantern_debugger::transport::{FrameReader, TransportError};
use libfuzzer_sys::fuzz_target;

mod utils;

fn runtime() -> &'static tokio::runtime::Runtime {
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("build fuzz runtime")
    })
}

fuzz_target!(|data: &[u8]| {
    let data = &data[..data.len().min(utils::MAX_INPUT_SIZE)];
    let limits = TransportConfig {
        max_message_bytes: 64 * 1024,
        max_header_line_bytes: 1024,
    };

    // Arbitrary bytes must never panic or allocate past the configured limits.
    runtime().block_on(async {
        let mut reader = FrameReader::new(data, limits);
        loop {
            match reader.read_value().await {
                Ok(Some(_)) | Err(TransportError::Json(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }
    });
});
