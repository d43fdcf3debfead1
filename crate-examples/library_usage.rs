// Example of using Powerjet as a library

use powerjet::{PowerjetConfig, PlaybookRunner, TerminalOutputHandler, OutputHandler, LogLevel, RecapData};
use powerjet::output::NullOutputHandler;
use std::sync::Arc;

fn main() -> powerjet::Result<()> {
    // Example 1: Simple playbook run with default settings
    simple_example()?;

    // Example 2: Check mode against a named array
    check_mode_example()?;

    // Example 3: Custom output handler
    custom_output_example()?;

    // Example 4: Using the builder API
    builder_example()?;

    Ok(())
}

fn simple_example() -> powerjet::Result<()> {
    println!("=== Simple Example ===");

    // Create configuration; plays carry their own array: block
    let config = PowerjetConfig::new()
        .playbook("./playbook.yml");

    // Create runner with terminal output
    let output = Arc::new(TerminalOutputHandler::new(1));
    let runner = PlaybookRunner::new(config)
        .with_output_handler(output);

    // Run the playbook
    let result = runner.run()?;
    println!("Playbook completed. Success: {}", result.success);

    Ok(())
}

fn check_mode_example() -> powerjet::Result<()> {
    println!("\n=== Check Mode Example ===");

    // Report what would change without touching the array
    let config = PowerjetConfig::new()
        .playbook("./site.yml")
        .array(powerjet::ArrayConnection {
            endpoint: "10.1.1.10".to_string(),
            user: "admin".to_string(),
            password: std::env::var("POWERJET_PASSWORD").unwrap_or_default(),
            verify_certs: Some(false),
            timeout: None,
        })
        .check_mode(true);

    // Run with minimal output
    let runner = PlaybookRunner::new(config)
        .with_output_handler(Arc::new(NullOutputHandler));
    let result = runner.run()?;

    println!("Check mode run completed. Would change: {}", result.changed);

    Ok(())
}

fn custom_output_example() -> powerjet::Result<()> {
    println!("\n=== Custom Output Handler Example ===");

    // Define a custom output handler
    struct JsonOutputHandler;

    impl OutputHandler for JsonOutputHandler {
        fn on_playbook_start(&self, playbook_path: &str) {
            println!(r#"{{"event": "playbook_start", "path": "{}"}}"#, playbook_path);
        }

        fn on_playbook_end(&self, playbook_path: &str, success: bool) {
            println!(r#"{{"event": "playbook_end", "path": "{}", "success": {}}}"#,
                playbook_path, success);
        }

        fn on_play_start(&self, play_name: &str, array: &str) {
            println!(r#"{{"event": "play_start", "name": "{}", "array": "{}"}}"#,
                play_name, array);
        }

        fn on_play_end(&self, play_name: &str) {
            println!(r#"{{"event": "play_end", "name": "{}"}}"#, play_name);
        }

        fn on_task_start(&self, task_name: &str) {
            println!(r#"{{"event": "task_start", "name": "{}"}}"#, task_name);
        }

        fn on_task_result(&self, array: &str,
                          _task: &powerjet::tasks::request::TaskRequest,
                          response: &powerjet::tasks::response::TaskResponse) {
            let status = if response.is_failed() {
                "failed"
            } else if response.is_changed() || response.needs_changes() {
                "changed"
            } else {
                "ok"
            };

            println!(r#"{{"event": "task_result", "array": "{}", "status": "{}"}}"#,
                array, status);
        }

        fn on_task_end(&self, task_name: &str) {
            println!(r#"{{"event": "task_end", "name": "{}"}}"#, task_name);
        }

        fn on_recap(&self, recap: RecapData) {
            println!(r#"{{"event": "recap", "array": "{}", "ok": {}, "changed": {}, "failed": {}}}"#,
                recap.array, recap.ok, recap.changed, recap.failed);
        }

        fn log(&self, level: LogLevel, message: &str) {
            let level_str = match level {
                LogLevel::Debug => "debug",
                LogLevel::Info => "info",
                LogLevel::Warning => "warning",
                LogLevel::Error => "error",
            };
            println!(r#"{{"event": "log", "level": "{}", "message": "{}"}}"#,
                level_str, message);
        }
    }

    // Use the custom handler
    let config = PowerjetConfig::new()
        .playbook("./test.yml");

    let runner = PlaybookRunner::new(config)
        .with_output_handler(Arc::new(JsonOutputHandler));

    runner.run()?;

    Ok(())
}

fn builder_example() -> powerjet::Result<()> {
    println!("\n=== Builder API Example ===");

    // Use the convenient builder API
    let result = powerjet::run_playbook("./site.yml")
        .array("10.1.1.10", "admin", "secret")
        .verbosity(2)
        .check_mode()
        .run()?;

    println!("ok={} changed={} failed={} skipped={}",
        result.ok, result.changed, result.failed, result.skipped);

    Ok(())
}
