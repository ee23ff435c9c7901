use sevlog::{Logger, Severity};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = Logger::console(Severity::Info)?;

    logger.log(Severity::Info, "This is some log output");
    logger.log(Severity::Info, format!("Formatted output for {}", logger.name()));

    for level in 1..=8 {
        match logger.set_severity_level(level) {
            Ok(()) => logger.log(Severity::Info, format!("threshold is now {}", level)),
            Err(e) => logger.log(Severity::High, format!("ERROR: {}", e)),
        }
    }

    Ok(())
}
