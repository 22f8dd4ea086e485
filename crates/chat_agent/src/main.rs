use std::process::ExitCode;

use chat_agent::config::AppConfig;
use chat_agent::logging;
use chat_agent::providers;
use chat_agent::session::SessionController;
use chat_agent::transcript::Transcript;
use chat_agent::tui::TerminalUi;
use chat_agent::ui::ChatUi;
use chatlog_console::{Color, Palette, RenderConfig, Style};
use session_store::{CacheOptions, LogCacheManager};
use tracing::error;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init();

    let render = RenderConfig::from_env();
    match run(render.clone()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            let label = Palette::new(render.color).paint(Style::new().fg(Color::Red).bold(), "Error:");
            eprintln!("{label} {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(render: RenderConfig) -> Result<(), String> {
    let config = AppConfig::from_env().map_err(|error| error.to_string())?;

    let cache = LogCacheManager::initialize(
        &config.cache_dir,
        CacheOptions::default().with_max_cached_files(config.max_cached_files),
    )
    .map_err(|error| error.to_string())?;

    let provider = providers::provider_from_config(&config).map_err(|error| error.to_string())?;
    let transcript = Transcript::with_system_directive(config.max_history, &config.system_prompt);

    let mut ui = TerminalUi::stdio(render);
    let mut session = SessionController::new(transcript, cache, provider, &config.model)
        .with_save_dir(config.save_dir.clone());

    if let Some(identifier) = config.resume.as_deref() {
        session.resume(identifier, &mut ui);
    }

    session.run(&mut ui).map_err(|io_error| {
        error!(%io_error, "terminal I/O failed");
        ui.error(&format!("terminal I/O failed: {io_error}"));
        io_error.to_string()
    })
}
