use sevlog::{Severity, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let base = temp_dir.path().join("TestLog");

    let logger = sevlog::builder()
        .with_base_path(&base)
        .with_severity(Severity::Info)
        .with_max_file_size(1024) // 1KB per file
        .with_max_file_count(3)
        .with_console(true)
        .init()?;

    init_tracing(logger.clone())?;

    for i in 0..100 {
        tracing::info!("Log message number {}", i);
    }
    logger.drain_buffer();

    println!("Files kept (max 3):");
    for file in logger.known_files() {
        println!("  {}", file.display());
    }

    sevlog::registry::shutdown();
    Ok(())
}
