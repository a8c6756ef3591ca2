#![no_main]

use lantern_debugger::protocol::Request;
use libfuzzer_sys::fuzz_target;

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };

    let request = Request::from_value(value);
    if let Ok(command) = request.command {
        let _ = command.name();
        let _ = command.expects_reply();
    }
});
