use file_tail::{EventKind, Tail, TailEvent, TailOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== File Tail Comprehensive Example ===\n");

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("demo.log");
    std::fs::write(&path, b"")?;

    // Example 1: callback registration per event kind
    println!("1. Callback API - chunked delivery with a 16 byte chunk size:");
    callback_usage(&path).await?;

    println!("\n{}\n", "=".repeat(50));

    // Example 2: truncation handling
    println!("2. Truncation - the baseline snaps down and tailing continues:");
    truncation_usage(&path).await?;

    Ok(())
}

fn append(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
    file.write_all(content.as_bytes())
}

async fn callback_usage(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let options = TailOptions {
        chunk_size: 16,
        poll_interval: Duration::from_millis(100),
        ..TailOptions::default()
    };
    let tail = Tail::with_options(path, options)?;

    tail.on(
        EventKind::Open,
        Arc::new(|event: &TailEvent| {
            if let TailEvent::Open(path) = event {
                println!("  opened {}", path.display());
            }
        }),
    )
    .on(
        EventKind::Change,
        Arc::new(|_event: &TailEvent| println!("  change detected")),
    )
    .on(
        EventKind::Data,
        Arc::new(|event: &TailEvent| {
            if let TailEvent::Data { text, bytes } = event {
                println!("  {:>2} byte chunk: {:?}", bytes, text);
            }
        }),
    )
    .on(
        EventKind::End,
        Arc::new(|_event: &TailEvent| println!("  session ended")),
    )
    .open();

    // Give the poller a moment to arm before appending.
    tokio::time::sleep(Duration::from_millis(400)).await;
    append(path, "a forty byte long line of demo content\n")?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    tail.close();
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}

async fn truncation_usage(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let options = TailOptions {
        poll_interval: Duration::from_millis(100),
        ..TailOptions::default()
    };
    let tail = Tail::with_options(path, options)?;

    tail.on(
        EventKind::Data,
        Arc::new(|event: &TailEvent| {
            if let TailEvent::Data { text, bytes } = event {
                println!("  {} bytes after truncation: {:?}", bytes, text);
            }
        }),
    )
    .open();

    tokio::time::sleep(Duration::from_millis(400)).await;
    println!("  baseline: {} bytes", tail.consumed_bytes());

    // Truncate, wait a poll cycle, then append fresh content.
    std::fs::File::create(path)?;
    tokio::time::sleep(Duration::from_millis(400)).await;
    append(path, "fresh\n")?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("  baseline now: {} bytes", tail.consumed_bytes());
    tail.close();
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
