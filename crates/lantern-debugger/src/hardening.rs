use std::sync::Once;

use lantern_config::LanternConfig;

static PANIC_HOOK: Once = Once::new();

/// Initialize structured logging and install a process-wide panic hook.
///
/// The hook records the panic through `tracing` (so it lands in the configured
/// log sinks) and then defers to the previously installed hook.
pub fn init(config: &LanternConfig) {
    lantern_config::init_tracing(&config.logging);
    install_panic_hook();
}

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "<unknown>".to_string());
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<non-string panic payload>".to_string());
            tracing::error!(
                target: "lantern.debugger",
                location = %location,
                message = %message,
                "panic"
            );
            previous(info);
        }));
    });
}
